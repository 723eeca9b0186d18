// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositing reasons.
//!
//! Every render layer carries a [`CompositingReasons`] set describing *why*
//! it might need a composited backing. Reasons fall into three groups:
//!
//! - **Direct** reasons (3D transforms, video, animations, ...) that require a
//!   dedicated backing.
//! - **Squashable** reasons ([`OVERLAP`], [`ASSUMED_OVERLAP`],
//!   [`OVERFLOW_SCROLLING_PARENT`]) that only require the layer to paint
//!   *above* some composited content, which sharing a neighbor's squashing
//!   layer satisfies.
//! - **Squashing-disallowed** reasons, merged in by the layer assigner when a
//!   squash request is rejected. They are not squashable, so a layer that
//!   picks one up is composited on its own instead.
//!
//! Reasons are only ever added by the assigner (set union); nothing it
//! records erases a reason supplied by the caller.
//!
//! [`OVERLAP`]: CompositingReasons::OVERLAP
//! [`ASSUMED_OVERLAP`]: CompositingReasons::ASSUMED_OVERLAP
//! [`OVERFLOW_SCROLLING_PARENT`]: CompositingReasons::OVERFLOW_SCROLLING_PARENT

use core::fmt;

use bitflags::bitflags;

bitflags! {
    /// Set of reasons a render layer may need compositing.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CompositingReasons: u64 {
        /// 3D transform.
        const TRANSFORM_3D = 1 << 0;
        /// Video content.
        const VIDEO = 1 << 1;
        /// Accelerated canvas.
        const CANVAS = 1 << 2;
        /// Plugin content.
        const PLUGIN = 1 << 3;
        /// Nested browsing context (iframe).
        const IFRAME = 1 << 4;
        /// Backface visibility hidden.
        const BACKFACE_VISIBILITY_HIDDEN = 1 << 5;
        /// Running or pending accelerated animation.
        const ACTIVE_ANIMATION = 1 << 6;
        /// `will-change` hint for a compositable property.
        const WILL_CHANGE = 1 << 7;
        /// Fixed position content that scrolls separately.
        const POSITION_FIXED = 1 << 8;
        /// Sticky position content.
        const POSITION_STICKY = 1 << 9;
        /// Accelerated overflow scrolling.
        const OVERFLOW_SCROLLING_TOUCH = 1 << 10;
        /// Root of the layer tree.
        const ROOT = 1 << 11;
        /// Reflection of a composited layer.
        const REFLECTION_OF_COMPOSITED_PARENT = 1 << 12;
        /// Clips composited descendants.
        const CLIPS_COMPOSITING_DESCENDANTS = 1 << 13;
        /// Needs to be composited to preserve a 3D rendering context.
        const PRESERVE_3D = 1 << 14;

        /// Overlaps composited content that paints below it.
        const OVERLAP = 1 << 20;
        /// May overlap composited content whose bounds are not known.
        const ASSUMED_OVERLAP = 1 << 21;
        /// Scroll child of an accelerated overflow scroller.
        const OVERFLOW_SCROLLING_PARENT = 1 << 22;

        /// The squashing host's subtree has not been fully assigned yet.
        const SQUASHING_WOULD_BREAK_PAINT_ORDER = 1 << 32;
        /// Video cannot share a backing.
        const SQUASHING_VIDEO_IS_DISALLOWED = 1 << 33;
        /// Frames and plugins cannot share a backing.
        const SQUASHING_RENDER_PART_IS_DISALLOWED = 1 << 34;
        /// Layers with reflections cannot be squashed.
        const SQUASHING_REFLECTION_IS_DISALLOWED = 1 << 35;
        /// Squashing would leave too much empty area in the squashing layer.
        const SQUASHING_SPARSITY_EXCEEDED = 1 << 36;
        /// Non-default blend modes cannot be squashed.
        const SQUASHING_BLENDING_IS_DISALLOWED = 1 << 37;
        /// Clipping container differs from the squashing host's.
        const SQUASHING_CLIPPING_CONTAINER_MISMATCH = 1 << 38;
        /// The layer clips composited descendants of its own.
        const SQUASHED_LAYER_CLIPS_COMPOSITING_DESCENDANTS = 1 << 39;
        /// The layer scrolls relative to the squashing host.
        const SCROLLS_WITH_RESPECT_TO_SQUASHING_LAYER = 1 << 40;
        /// Nearest opacity ancestor differs from the squashing host's.
        const SQUASHING_OPACITY_ANCESTOR_MISMATCH = 1 << 41;
        /// Nearest transform ancestor differs from the squashing host's.
        const SQUASHING_TRANSFORM_ANCESTOR_MISMATCH = 1 << 42;
        /// Filter or nearest filter ancestor differs from the squashing host's.
        const SQUASHING_FILTER_MISMATCH = 1 << 43;
    }
}

impl CompositingReasons {
    /// Reasons that can be satisfied by squashing into a shared backing.
    pub const SQUASHABLE: Self = Self::OVERLAP
        .union(Self::ASSUMED_OVERLAP)
        .union(Self::OVERFLOW_SCROLLING_PARENT);

    /// Reasons the layer assigner records when it rejects a squash request.
    pub const SQUASHING_DISALLOWED: Self = Self::SQUASHING_WOULD_BREAK_PAINT_ORDER
        .union(Self::SQUASHING_VIDEO_IS_DISALLOWED)
        .union(Self::SQUASHING_RENDER_PART_IS_DISALLOWED)
        .union(Self::SQUASHING_REFLECTION_IS_DISALLOWED)
        .union(Self::SQUASHING_SPARSITY_EXCEEDED)
        .union(Self::SQUASHING_BLENDING_IS_DISALLOWED)
        .union(Self::SQUASHING_CLIPPING_CONTAINER_MISMATCH)
        .union(Self::SQUASHED_LAYER_CLIPS_COMPOSITING_DESCENDANTS)
        .union(Self::SCROLLS_WITH_RESPECT_TO_SQUASHING_LAYER)
        .union(Self::SQUASHING_OPACITY_ANCESTOR_MISMATCH)
        .union(Self::SQUASHING_TRANSFORM_ANCESTOR_MISMATCH)
        .union(Self::SQUASHING_FILTER_MISMATCH);

    /// Returns `true` if any reason demands a dedicated backing.
    #[inline]
    #[must_use]
    pub const fn requires_compositing(self) -> bool {
        self.difference(Self::SQUASHABLE).bits() != 0
    }

    /// Returns `true` if the layer needs compositing but can share a
    /// squashing layer to get it.
    #[inline]
    #[must_use]
    pub const fn requires_squashing(self) -> bool {
        !self.requires_compositing() && self.intersects(Self::SQUASHABLE)
    }
}

impl fmt::Display for CompositingReasons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}
