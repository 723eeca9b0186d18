// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor contract for layer assignment.
//!
//! The [`LayerAssigner`](crate::assign::LayerAssigner) decides *what* each
//! render layer's compositing state should be; a [`Compositor`] owns the
//! backings and carries out those decisions. Splitting the two keeps the
//! assignment walk a pure decision procedure and lets hosts substitute their
//! own backing management (or a test double).
//!
//! [`StandardCompositor`] is the in-crate implementation used by default.
//!
//! # Assignment loop pseudocode
//!
//! ```rust,ignore
//! fn update_compositing(layers: &mut LayerStore, compositor: &mut StandardCompositor) {
//!     // Recompute ancestor inputs and clipped bounds.
//!     let _ = layers.update_inputs();
//!
//!     // Decide and apply backings.
//!     let assignment = assigner.assign(layers, compositor, root, &mut tracer);
//!
//!     // Hand the invalidations to the paint scheduler.
//!     let damage = DamageRegion::from_invalidations(layers, &assignment.layers_needing_paint_invalidation);
//!     if assignment.layers_changed {
//!         schedule_geometry_update();
//!     }
//! }
//! ```

use alloc::vec::Vec;

use crate::assign::CompositingStateTransition;
use crate::backing::{BackingStore, GraphicsLayerUpdate};
use crate::layer::{BackingId, LayerId, LayerStore};
use crate::reasons::CompositingReasons;

/// Owns composited backings and answers eligibility queries for the layer
/// assigner.
pub trait Compositor {
    /// The backing table.
    fn backings(&self) -> &BackingStore;

    /// The backing table, mutably.
    fn backings_mut(&mut self) -> &mut BackingStore;

    /// Returns `true` if `layer` could ever be composited.
    fn can_be_composited(&self, layers: &LayerStore, layer: LayerId) -> bool;

    /// Returns `true` if the compositor was in compositing mode as of the
    /// last update.
    fn stale_in_compositing_mode(&self) -> bool;

    /// Returns `true` if `layer` clips composited descendants.
    fn clips_compositing_descendants(&self, layers: &LayerStore, layer: LayerId) -> bool;

    /// Allocates or frees the dedicated backing of `layer` as `transition`
    /// requires. Returns `true` if the layer's backing changed.
    fn allocate_or_clear_backing(
        &mut self,
        layers: &mut LayerStore,
        layer: LayerId,
        transition: CompositingStateTransition,
    ) -> bool;

    /// Invalidates whatever `layer` currently paints into, before its
    /// compositing state changes.
    fn paint_invalidation_on_compositing_change(&mut self, layers: &LayerStore, layer: LayerId);

    /// Refreshes the reasons of `layer` that depend on other layers'
    /// compositing state.
    fn update_direct_reasons(&mut self, layers: &mut LayerStore, layer: LayerId);

    /// Refreshes the configuration of `layer`'s backing.
    fn update_backing_configuration(&mut self, layers: &LayerStore, layer: LayerId);
}

/// Configuration for [`StandardCompositor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositorConfig {
    /// Whether any layer may be composited at all.
    pub accelerated_compositing: bool,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            accelerated_compositing: true,
        }
    }
}

/// A paint invalidation issued before a compositing-state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PaintInvalidation {
    /// The layer whose painted output moves.
    pub layer: LayerId,
    /// The backing the layer painted into before the change, or `None` if
    /// nothing above it was composited.
    pub target: Option<BackingId>,
}

/// The default [`Compositor`].
#[derive(Debug)]
pub struct StandardCompositor {
    config: CompositorConfig,
    backings: BackingStore,
    compositing_mode: bool,
    invalidations: Vec<PaintInvalidation>,
}

impl StandardCompositor {
    /// Creates a compositor with no backings, outside compositing mode.
    #[must_use]
    pub fn new(config: CompositorConfig) -> Self {
        Self {
            config,
            backings: BackingStore::new(),
            compositing_mode: false,
            invalidations: Vec::new(),
        }
    }

    /// The compositor's configuration.
    #[must_use]
    pub fn config(&self) -> CompositorConfig {
        self.config
    }

    /// Returns `true` if the compositor is in compositing mode.
    #[must_use]
    pub fn compositing_mode(&self) -> bool {
        self.compositing_mode
    }

    /// Enters or leaves compositing mode.
    pub fn set_compositing_mode(&mut self, enabled: bool) {
        self.compositing_mode = enabled;
    }

    /// Paint invalidations issued since the last call to
    /// [`take_invalidations`](Self::take_invalidations).
    #[must_use]
    pub fn invalidations(&self) -> &[PaintInvalidation] {
        &self.invalidations
    }

    /// Returns and clears the issued paint invalidations.
    pub fn take_invalidations(&mut self) -> Vec<PaintInvalidation> {
        core::mem::take(&mut self.invalidations)
    }

    /// Frees the dedicated backing of `layer`, if any.
    ///
    /// Every squashed member still grouped into the backing loses its
    /// grouped mapping and is flagged so the next assignment pass removes it
    /// from squashing. Returns `true` if a backing was freed.
    pub fn clear_backing(&mut self, layers: &mut LayerStore, layer: LayerId) -> bool {
        let Some(id) = layers.backing(layer) else {
            return false;
        };
        layers.set_backing(layer, None);
        let freed = self.backings.destroy(id);
        for member in freed.squashed_layers() {
            if layers.is_alive(member.layer) && layers.grouped_mapping(member.layer) == Some(id) {
                layers.set_grouped_mapping(member.layer, None);
                layers.set_lost_grouped_mapping(member.layer, true);
            }
        }
        true
    }

    /// The backing `layer` paints into: its own, its squashing host's, or
    /// the nearest composited ancestor's.
    fn paint_target(&self, layers: &LayerStore, layer: LayerId) -> Option<BackingId> {
        let mut cur = Some(layer);
        while let Some(id) = cur {
            if let Some(b) = layers.backing(id).or(layers.grouped_mapping(id)) {
                return Some(b);
            }
            cur = layers.parent(id);
        }
        None
    }
}

impl Default for StandardCompositor {
    fn default() -> Self {
        Self::new(CompositorConfig::default())
    }
}

impl Compositor for StandardCompositor {
    fn backings(&self) -> &BackingStore {
        &self.backings
    }

    fn backings_mut(&mut self) -> &mut BackingStore {
        &mut self.backings
    }

    fn can_be_composited(&self, layers: &LayerStore, layer: LayerId) -> bool {
        let flags = layers.flags(layer);
        self.config.accelerated_compositing && flags.self_painting && !flags.subtree_invisible
    }

    fn stale_in_compositing_mode(&self) -> bool {
        self.compositing_mode
    }

    fn clips_compositing_descendants(&self, layers: &LayerStore, layer: LayerId) -> bool {
        layers.flags(layer).has_compositing_descendant && layers.clip(layer).is_some()
    }

    fn allocate_or_clear_backing(
        &mut self,
        layers: &mut LayerStore,
        layer: LayerId,
        transition: CompositingStateTransition,
    ) -> bool {
        use CompositingStateTransition as T;

        match transition {
            T::AllocateOwnBacking => {
                assert!(
                    layers.backing(layer).is_none(),
                    "layer already owns a backing"
                );
                self.compositing_mode = true;
                // Invalidate against the pre-allocation state, then drop the
                // squashing reference so the new state reads correctly.
                self.paint_invalidation_on_compositing_change(layers, layer);
                layers.set_lost_grouped_mapping(layer, false);
                layers.set_grouped_mapping(layer, None);
                let id = self.backings.allocate(layer);
                layers.set_backing(layer, Some(id));
                true
            }
            T::RemoveOwnBacking | T::PutInSquashingLayer => self.clear_backing(layers, layer),
            T::RemoveFromSquashingLayer | T::NoChange => false,
        }
    }

    fn paint_invalidation_on_compositing_change(&mut self, layers: &LayerStore, layer: LayerId) {
        let target = self.paint_target(layers, layer);
        self.invalidations.push(PaintInvalidation { layer, target });
    }

    fn update_direct_reasons(&mut self, layers: &mut LayerStore, layer: LayerId) {
        let Some(owner) = layers.reflection_owner(layer) else {
            return;
        };
        let mut reasons = layers.reasons(layer);
        reasons.set(
            CompositingReasons::REFLECTION_OF_COMPOSITED_PARENT,
            layers.backing(owner).is_some(),
        );
        layers.set_reasons(layer, reasons);
    }

    fn update_backing_configuration(&mut self, layers: &LayerStore, layer: LayerId) {
        if let Some(id) = layers.backing(layer) {
            self.backings.bump_configuration(id);
            self.backings
                .set_needs_graphics_layer_update(id, GraphicsLayerUpdate::Local);
        }
    }
}
