// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial damage tracking for partial re-rendering.

use alloc::vec::Vec;

use kurbo::Rect;
use lamina_core::layer::{LayerId, LayerStore, is_empty, unite};

/// A region of the output that needs re-rendering.
///
/// Backends can use this to redraw only the areas whose composited
/// ownership changed during layer assignment.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DamageRegion {
    /// The entire output needs redrawing.
    #[default]
    Full,
    /// A list of axis-aligned rectangles that need redrawing, in the same
    /// space as layer bounds.
    Rects(Vec<Rect>),
    /// Nothing changed; the previous frame can be reused.
    None,
}

impl DamageRegion {
    /// Damage covering the clipped bounds of every layer in `invalidated`.
    ///
    /// Destroyed layers and layers with empty bounds contribute nothing.
    #[must_use]
    pub fn from_invalidations(layers: &LayerStore, invalidated: &[LayerId]) -> Self {
        let rects: Vec<Rect> = invalidated
            .iter()
            .filter(|&&id| layers.is_alive(id))
            .map(|&id| layers.clipped_bounds(id))
            .filter(|&r| !is_empty(r))
            .collect();
        if rects.is_empty() {
            Self::None
        } else {
            Self::Rects(rects)
        }
    }

    /// Returns `true` if no region needs redrawing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// The smallest rectangle covering the damage, or `None` for full or
    /// empty damage.
    #[must_use]
    pub fn bounding_rect(&self) -> Option<Rect> {
        match self {
            Self::Rects(rects) => rects.iter().copied().reduce(unite),
            Self::Full | Self::None => None,
        }
    }

    /// Merges another damage region into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&*self, other) {
            (Self::Full, _) | (_, Self::Full) => *self = Self::Full,
            (Self::None, _) => *self = other.clone(),
            (_, Self::None) => {}
            (Self::Rects(a), Self::Rects(b)) => {
                let mut merged = a.clone();
                merged.extend_from_slice(b);
                *self = Self::Rects(merged);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn store_with(bounds: &[Rect]) -> (LayerStore, Vec<LayerId>) {
        let mut layers = LayerStore::new();
        let ids = bounds
            .iter()
            .map(|&b| {
                let id = layers.create_layer();
                layers.set_bounds(id, b);
                id
            })
            .collect();
        let _ = layers.update_inputs();
        (layers, ids)
    }

    #[test]
    fn invalidations_become_rects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 30.0, 40.0);
        let (layers, ids) = store_with(&[a, b]);

        let damage = DamageRegion::from_invalidations(&layers, &ids);
        assert_eq!(damage, DamageRegion::Rects(vec![a, b]));
        assert_eq!(damage.bounding_rect(), Some(Rect::new(0.0, 0.0, 30.0, 40.0)));
    }

    #[test]
    fn no_invalidations_is_no_damage() {
        let (layers, _) = store_with(&[Rect::new(0.0, 0.0, 10.0, 10.0)]);
        let damage = DamageRegion::from_invalidations(&layers, &[]);
        assert!(damage.is_empty());
        assert_eq!(damage.bounding_rect(), None);
    }

    #[test]
    fn empty_and_destroyed_layers_are_skipped() {
        let (mut layers, ids) = store_with(&[Rect::ZERO, Rect::new(0.0, 0.0, 5.0, 5.0)]);
        layers.destroy_layer(ids[1]);
        let damage = DamageRegion::from_invalidations(&layers, &ids);
        assert!(damage.is_empty());
    }

    #[test]
    fn merge_rules() {
        let r = DamageRegion::Rects(vec![Rect::new(0.0, 0.0, 1.0, 1.0)]);

        let mut none = DamageRegion::None;
        none.merge(&r);
        assert_eq!(none, r);

        let mut rects = r.clone();
        rects.merge(&DamageRegion::None);
        assert_eq!(rects, r);

        rects.merge(&r);
        assert!(matches!(&rects, DamageRegion::Rects(v) if v.len() == 2));

        rects.merge(&DamageRegion::Full);
        assert_eq!(rects, DamageRegion::Full);
    }
}
