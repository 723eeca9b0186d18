// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-layer compositing-state transitions.

use core::fmt;

use super::AssignerConfig;
use crate::compositor::Compositor;
use crate::layer::{LayerId, LayerStore};

/// The change to a layer's compositing state decided for one assignment
/// pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompositingStateTransition {
    /// Nothing to do.
    NoChange,
    /// The layer needs a dedicated backing and has none.
    AllocateOwnBacking,
    /// The layer has a dedicated backing it no longer needs.
    RemoveOwnBacking,
    /// The layer should paint into the current squashing host.
    PutInSquashingLayer,
    /// The layer should stop painting into its squashing host.
    RemoveFromSquashingLayer,
}

impl CompositingStateTransition {
    /// Short stable name, used by trace sinks.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoChange => "NoChange",
            Self::AllocateOwnBacking => "AllocateOwnBacking",
            Self::RemoveOwnBacking => "RemoveOwnBacking",
            Self::PutInSquashingLayer => "PutInSquashingLayer",
            Self::RemoveFromSquashingLayer => "RemoveFromSquashingLayer",
        }
    }
}

impl fmt::Display for CompositingStateTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns `true` if `layer` needs a dedicated backing.
///
/// That is the case when the compositor can composite it at all and one of
/// the following holds: a reason requires compositing outright, squashing is
/// disabled and a reason asks for squashing, or the layer is the root while
/// the compositor is in compositing mode.
#[must_use]
pub fn needs_own_backing(
    config: AssignerConfig,
    layers: &LayerStore,
    compositor: &dyn Compositor,
    layer: LayerId,
    is_root: bool,
) -> bool {
    if !compositor.can_be_composited(layers, layer) {
        return false;
    }
    let reasons = layers.reasons(layer);
    reasons.requires_compositing()
        || (!config.squashing_enabled && reasons.requires_squashing())
        || (is_root && compositor.stale_in_compositing_mode())
}

/// Decides the compositing-state transition of `layer`.
///
/// Dedicated backings are decided first; squashing is only considered for
/// layers that do not need a backing of their own and, when squashing is
/// enabled, decides between joining the current host and leaving a previous
/// one. A layer that gives up its backing to be squashed reports
/// [`PutInSquashingLayer`](CompositingStateTransition::PutInSquashingLayer).
#[must_use]
pub fn compute_transition(
    config: AssignerConfig,
    layers: &LayerStore,
    compositor: &dyn Compositor,
    layer: LayerId,
    is_root: bool,
) -> CompositingStateTransition {
    use CompositingStateTransition as T;

    let has_backing = layers.backing(layer).is_some();
    if needs_own_backing(config, layers, compositor, layer, is_root) {
        return if has_backing {
            T::NoChange
        } else {
            T::AllocateOwnBacking
        };
    }
    let fallback = if has_backing {
        T::RemoveOwnBacking
    } else {
        T::NoChange
    };
    if config.squashing_enabled {
        // A freed backing goes straight into the squashing layer; the
        // compositor frees it before the layer is placed.
        if !layers.flags(layer).subtree_invisible && layers.reasons(layer).requires_squashing() {
            return T::PutInSquashingLayer;
        }
        if !has_backing
            && (layers.grouped_mapping(layer).is_some() || layers.lost_grouped_mapping(layer))
        {
            return T::RemoveFromSquashingLayer;
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::{CompositorConfig, StandardCompositor};
    use crate::layer::LayerFlags;
    use crate::reasons::CompositingReasons;

    use CompositingStateTransition as T;

    fn setup() -> (LayerStore, StandardCompositor, LayerId) {
        let mut layers = LayerStore::new();
        let id = layers.create_layer();
        (layers, StandardCompositor::new(CompositorConfig::default()), id)
    }

    const ON: AssignerConfig = AssignerConfig {
        squashing_enabled: true,
    };
    const OFF: AssignerConfig = AssignerConfig {
        squashing_enabled: false,
    };

    #[test]
    fn direct_reason_allocates() {
        let (mut layers, comp, id) = setup();
        layers.set_reasons(id, CompositingReasons::WILL_CHANGE);
        assert_eq!(compute_transition(ON, &layers, &comp, id, false), T::AllocateOwnBacking);
    }

    #[test]
    fn squashable_reason_puts_when_enabled() {
        let (mut layers, comp, id) = setup();
        layers.set_reasons(id, CompositingReasons::OVERLAP);
        assert_eq!(compute_transition(ON, &layers, &comp, id, false), T::PutInSquashingLayer);
    }

    #[test]
    fn squashing_disabled_degrades_to_own_backing() {
        let (mut layers, comp, id) = setup();
        layers.set_reasons(id, CompositingReasons::OVERLAP);
        assert_eq!(compute_transition(OFF, &layers, &comp, id, false), T::AllocateOwnBacking);
    }

    #[test]
    fn invisible_subtree_is_never_put() {
        let (mut layers, comp, id) = setup();
        layers.set_reasons(id, CompositingReasons::OVERLAP);
        layers.set_flags(
            id,
            LayerFlags {
                subtree_invisible: true,
                ..LayerFlags::DEFAULT
            },
        );
        assert_eq!(compute_transition(ON, &layers, &comp, id, false), T::NoChange);
    }

    #[test]
    fn lost_mapping_is_removed() {
        let (mut layers, comp, id) = setup();
        layers.set_lost_grouped_mapping(id, true);
        assert_eq!(
            compute_transition(ON, &layers, &comp, id, false),
            T::RemoveFromSquashingLayer
        );
        // Squashing bookkeeping is skipped entirely when disabled.
        assert_eq!(compute_transition(OFF, &layers, &comp, id, false), T::NoChange);
    }

    #[test]
    fn root_follows_compositing_mode() {
        let (layers, mut comp, id) = setup();
        assert_eq!(compute_transition(ON, &layers, &comp, id, true), T::NoChange);
        comp.set_compositing_mode(true);
        assert_eq!(compute_transition(ON, &layers, &comp, id, true), T::AllocateOwnBacking);
        assert_eq!(compute_transition(ON, &layers, &comp, id, false), T::NoChange);
    }

    #[test]
    fn backed_layer_moves_straight_into_squashing() {
        let (mut layers, mut comp, id) = setup();
        layers.set_reasons(id, CompositingReasons::WILL_CHANGE);
        assert!(comp.allocate_or_clear_backing(&mut layers, id, T::AllocateOwnBacking));

        layers.set_reasons(id, CompositingReasons::OVERLAP);
        assert_eq!(compute_transition(ON, &layers, &comp, id, false), T::PutInSquashingLayer);
        assert_eq!(compute_transition(OFF, &layers, &comp, id, false), T::NoChange);

        layers.set_reasons(id, CompositingReasons::empty());
        assert_eq!(compute_transition(ON, &layers, &comp, id, false), T::RemoveOwnBacking);
    }

    #[test]
    fn ineligible_layer_drops_its_backing() {
        let (mut layers, mut comp, id) = setup();
        layers.set_reasons(id, CompositingReasons::VIDEO);
        assert!(comp.allocate_or_clear_backing(&mut layers, id, T::AllocateOwnBacking));
        layers.set_flags(
            id,
            LayerFlags {
                self_painting: false,
                ..LayerFlags::DEFAULT
            },
        );
        assert_eq!(compute_transition(ON, &layers, &comp, id, false), T::RemoveOwnBacking);
    }
}
