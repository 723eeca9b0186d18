// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositing plan: the composited backings of a layer tree in assignment
//! visit order.

use alloc::vec;
use alloc::vec::Vec;

use kurbo::Rect;
use lamina_core::backing::BackingStore;
use lamina_core::layer::{BackingId, BlendMode, ChildGroups, LayerId, LayerStore, area, unite};

/// One composited backing in the plan.
///
/// Items are produced in the order their owners are visited by layer
/// assignment.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanItem {
    /// The layer that owns the backing.
    pub layer: LayerId,
    /// The backing itself.
    pub backing: BackingId,
    /// The owner's clipped bounds.
    pub bounds: Rect,
    /// Layers squashed into this backing, in slot order.
    pub squashed: Vec<LayerId>,
    /// Union of the squashed layers' clipped bounds, if any were squashed.
    pub squashing_bounds: Option<Rect>,
    /// The owner's blend mode.
    pub blend_mode: BlendMode,
    /// The owner's own opacity.
    pub opacity: f32,
}

impl PlanItem {
    /// Total area painted into this backing's squashing layer.
    #[must_use]
    pub fn squashed_area(&self) -> f64 {
        self.squashing_bounds.map_or(0.0, area)
    }
}

/// Every composited backing under a root, in assignment visit order.
///
/// A layer comes before its children, so negative z-order children follow
/// the parent they paint beneath.
#[derive(Clone, Debug, Default)]
pub struct CompositingPlan {
    /// Backings in assignment visit order.
    pub items: Vec<PlanItem>,
}

impl CompositingPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the plan for `root`'s subtree.
    ///
    /// Reflections are listed directly after the layer they reflect.
    #[must_use]
    pub fn build(layers: &LayerStore, backings: &BackingStore, root: LayerId) -> Self {
        let mut plan = Self::new();
        plan.rebuild(layers, backings, root);
        plan
    }

    /// Rebuilds the plan in place, reusing its allocation.
    pub fn rebuild(&mut self, layers: &LayerStore, backings: &BackingStore, root: LayerId) {
        self.items.clear();
        let mut stack = vec![root];
        while let Some(layer) = stack.pop() {
            self.push_item(layers, backings, layer);
            if let Some(reflection) = layers.reflection(layer) {
                self.push_item(layers, backings, reflection);
            }
            // Negative z-order children precede the rest, which matches the
            // assignment walk.
            let children = layers.paint_order_children(layer, ChildGroups::ALL);
            stack.extend(children.into_iter().rev());
        }
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of composited backings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing is composited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Finds the item that paints `layer`, either as owner or as a squashed
    /// member.
    #[must_use]
    pub fn item_for(&self, layer: LayerId) -> Option<&PlanItem> {
        self.items
            .iter()
            .find(|item| item.layer == layer || item.squashed.contains(&layer))
    }

    fn push_item(&mut self, layers: &LayerStore, backings: &BackingStore, layer: LayerId) {
        let Some(backing) = layers.backing(layer) else {
            return;
        };
        let squashed: Vec<LayerId> = backings
            .squashed_layers(backing)
            .iter()
            .map(|s| s.layer)
            .collect();
        let squashing_bounds = squashed
            .iter()
            .map(|&l| layers.clipped_bounds(l))
            .reduce(unite);
        self.items.push(PlanItem {
            layer,
            backing,
            bounds: layers.clipped_bounds(layer),
            squashed,
            squashing_bounds,
            blend_mode: layers.blend_mode(layer),
            opacity: layers.opacity(layer),
        });
    }
}
