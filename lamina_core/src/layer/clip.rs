// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip shapes and rect helpers shared by inputs and squashing geometry.

use kurbo::{Rect, RoundedRect};

/// A shape clipping a layer's descendants, in absolute coordinates.
///
/// A layer with a clip is the *clipping container* of every descendant up to
/// the next clipping layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClipShape {
    /// An axis-aligned rectangle.
    Rect(Rect),
    /// A rectangle with rounded corners.
    RoundedRect(RoundedRect),
}

impl ClipShape {
    /// Returns the axis-aligned bounds of the clip.
    ///
    /// Rounded corners are ignored, so the result is conservative.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Rect(r) => *r,
            Self::RoundedRect(rr) => rr.rect(),
        }
    }
}

/// Returns `true` if `r` has no area.
#[inline]
#[must_use]
pub fn is_empty(r: Rect) -> bool {
    r.width() <= 0.0 || r.height() <= 0.0
}

/// Unites two rects, treating an empty rect as the identity.
///
/// `kurbo::Rect::union` would stretch the result to include an empty rect's
/// origin, which breaks running bounding boxes that start out empty.
#[must_use]
pub fn unite(a: Rect, b: Rect) -> Rect {
    if is_empty(b) {
        a
    } else if is_empty(a) {
        b
    } else {
        a.union(b)
    }
}

/// Returns the area of `r`, or zero if it is empty.
#[inline]
#[must_use]
pub fn area(r: Rect) -> f64 {
    if is_empty(r) { 0.0 } else { r.area() }
}
