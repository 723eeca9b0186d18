// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Squashing host bookkeeping and eligibility.

use kurbo::Rect;

use crate::backing::BackingStore;
use crate::compositor::Compositor;
use crate::layer::{BackingId, BlendMode, ContentKind, LayerId, LayerStore, area, unite};
use crate::reasons::CompositingReasons;

/// Maximum ratio between a squashing layer's bounding box and the summed
/// areas of its members.
pub const SPARSITY_TOLERANCE: f64 = 6.0;

/// The current squashing host of an assignment walk.
///
/// Threaded through the whole walk in paint order. Layers that ask to be
/// squashed join the most recent backing, subject to
/// [`reasons_preventing_squashing`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SquashingState {
    /// The most recent backing in paint order, if any.
    pub most_recent_mapping: Option<BackingId>,
    /// Slot the next squashed layer takes in the host.
    pub next_squashed_layer_index: usize,
    /// Union of the clipped bounds of the host's squashed members. The
    /// host's own bounds are not included.
    pub bounding_rect: Rect,
    /// Sum of the areas of the host's squashed members.
    pub total_area_of_squashed_rects: f64,
    /// Whether the host owner's whole subtree has been walked. Until then
    /// nothing may squash into it without breaking paint order.
    pub have_assigned_backings_to_entire_squashing_layer_subtree: bool,
}

impl Default for SquashingState {
    fn default() -> Self {
        Self {
            most_recent_mapping: None,
            next_squashed_layer_index: 0,
            bounding_rect: Rect::ZERO,
            total_area_of_squashed_rects: 0.0,
            have_assigned_backings_to_entire_squashing_layer_subtree: false,
        }
    }
}

impl SquashingState {
    /// Makes `new_mapping` the current host.
    ///
    /// The previous host stops accumulating: members it did not receive this
    /// pass are dropped. Returns the previous host and how many members it
    /// ended up with.
    pub fn update_for_new_mapping(
        &mut self,
        new_mapping: BackingId,
        backings: &mut BackingStore,
    ) -> Option<(BackingId, usize)> {
        let finished = self.finish(backings);
        *self = Self {
            most_recent_mapping: Some(new_mapping),
            ..Self::default()
        };
        finished
    }

    /// Closes the current host, if any, without opening a new one.
    pub fn finish(&mut self, backings: &mut BackingStore) -> Option<(BackingId, usize)> {
        let host = self.most_recent_mapping.take()?;
        backings.finish_accumulating_squashing_layers(host, self.next_squashed_layer_index);
        Some((host, self.next_squashed_layer_index))
    }

    /// Accounts for `bounds` joining the current host.
    pub fn add_squashed(&mut self, bounds: Rect) {
        self.next_squashed_layer_index += 1;
        self.total_area_of_squashed_rects += area(bounds);
        self.bounding_rect = unite(self.bounding_rect, bounds);
    }

    /// Returns `true` if adding `bounds` would leave the squashing layer
    /// mostly empty.
    #[must_use]
    pub fn would_exceed_sparsity_tolerance(&self, bounds: Rect) -> bool {
        let new_bounding_area = area(unite(self.bounding_rect, bounds));
        let new_squashed_area = self.total_area_of_squashed_rects + area(bounds);
        new_bounding_area > SPARSITY_TOLERANCE * new_squashed_area
    }
}

/// Returns the first reason `layer` may not squash into the current host, or
/// an empty set if it may.
///
/// Checks run in a fixed order and stop at the first match, so the result
/// holds at most one reason.
#[must_use]
pub fn reasons_preventing_squashing(
    layers: &LayerStore,
    compositor: &dyn Compositor,
    layer: LayerId,
    state: &SquashingState,
) -> CompositingReasons {
    use CompositingReasons as R;

    if !state.have_assigned_backings_to_entire_squashing_layer_subtree {
        return R::SQUASHING_WOULD_BREAK_PAINT_ORDER;
    }
    let Some(host) = state.most_recent_mapping else {
        return R::SQUASHING_WOULD_BREAK_PAINT_ORDER;
    };
    let backings = compositor.backings();
    let host_layer = backings.owner(host);

    let content = layers.content(layer);
    let host_content = layers.content(host_layer);
    if content == ContentKind::Video || host_content == ContentKind::Video {
        return R::SQUASHING_VIDEO_IS_DISALLOWED;
    }
    if content == ContentKind::Part || host_content == ContentKind::Part {
        return R::SQUASHING_RENDER_PART_IS_DISALLOWED;
    }
    if layers.reflection(layer).is_some() {
        return R::SQUASHING_REFLECTION_IS_DISALLOWED;
    }
    if state.would_exceed_sparsity_tolerance(layers.clipped_bounds(layer)) {
        return R::SQUASHING_SPARSITY_EXCEEDED;
    }
    if layers.blend_mode(layer) != BlendMode::Normal {
        return R::SQUASHING_BLENDING_IS_DISALLOWED;
    }

    let inputs = layers.inputs(layer);
    let host_inputs = layers.inputs(host_layer);
    if inputs.clipping_container != host_inputs.clipping_container
        && backings
            .containing_squashed_layer(
                host,
                layers,
                inputs.clipping_container,
                state.next_squashed_layer_index,
            )
            .is_none()
    {
        return R::SQUASHING_CLIPPING_CONTAINER_MISMATCH;
    }
    if compositor.clips_compositing_descendants(layers, layer) {
        return R::SQUASHED_LAYER_CLIPS_COMPOSITING_DESCENDANTS;
    }
    if layers.scrolls_with_respect_to(layer, host_layer) {
        return R::SCROLLS_WITH_RESPECT_TO_SQUASHING_LAYER;
    }
    if inputs.opacity_ancestor != host_inputs.opacity_ancestor {
        return R::SQUASHING_OPACITY_ANCESTOR_MISMATCH;
    }
    if inputs.transform_ancestor != host_inputs.transform_ancestor {
        return R::SQUASHING_TRANSFORM_ANCESTOR_MISMATCH;
    }
    if layers.flags(layer).has_filter || inputs.filter_ancestor != host_inputs.filter_ancestor {
        return R::SQUASHING_FILTER_MISMATCH;
    }
    R::empty()
}
