// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer assignment: deciding which render layers get composited backings.
//!
//! [`LayerAssigner::assign`] walks the render-layer tree in paint order and,
//! for every layer:
//!
//! 1. If the layer asks to be squashed, records the first reason it may not
//!    join the current squashing host ([`reasons_preventing_squashing`]).
//!    The reason is merged into the layer's compositing reasons *before* its
//!    transition is computed, so a rejected squash turns into a dedicated
//!    backing on the same pass.
//! 2. Computes its [`CompositingStateTransition`] and lets the
//!    [`Compositor`] allocate or free the dedicated backing.
//! 3. Assigns its reflection, if any.
//! 4. Places it into, or removes it from, the current squashing host.
//! 5. Walks negative z-order children, then promotes its own backing (if
//!    any) to the current squashing host, then walks normal-flow and
//!    positive z-order children.
//!
//! A host only accepts squashed layers once its owner's entire subtree has
//! been walked, which keeps squashed content painting after everything the
//! host paints.
//!
//! The walk keeps an explicit frame stack, so tree depth is bounded by
//! memory rather than by the call stack.

mod squashing;
mod transition;

pub use squashing::{SPARSITY_TOLERANCE, SquashingState, reasons_preventing_squashing};
pub use transition::{CompositingStateTransition, compute_transition, needs_own_backing};

use alloc::vec::Vec;

use crate::backing::GraphicsLayerUpdate;
use crate::compositor::Compositor;
use crate::layer::{BackingId, ChildGroups, LayerId, LayerStore};
use crate::trace::{
    AssignBeginEvent, AssignSummary, InvalidationKind, SquashingHostEvent,
    SquashingHostFinishedEvent, Tracer,
};
#[cfg(feature = "trace-rich")]
use crate::trace::{PaintInvalidationEvent, SquashedEvent, SquashingDisallowedEvent, TransitionEvent};

/// Configuration for [`LayerAssigner`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssignerConfig {
    /// Whether layers may share a squashing layer. When disabled, layers
    /// asking to be squashed get dedicated backings instead.
    pub squashing_enabled: bool,
}

impl Default for AssignerConfig {
    fn default() -> Self {
        Self {
            squashing_enabled: true,
        }
    }
}

/// The outcome of one [`LayerAssigner::assign`] pass.
#[derive(Clone, Debug, Default)]
pub struct Assignment {
    /// Layers whose painted output moved between backings, in visit order.
    pub layers_needing_paint_invalidation: Vec<LayerId>,
    /// Whether any backing or squashing membership changed.
    pub layers_changed: bool,
    /// The transition decided for every visited layer, in visit order.
    pub transitions: Vec<(LayerId, CompositingStateTransition)>,
    /// Per-pass counters.
    pub summary: AssignSummary,
}

/// Assigns render layers to composited backings.
#[derive(Debug, Default)]
pub struct LayerAssigner {
    config: AssignerConfig,
    pass_index: u64,
}

impl LayerAssigner {
    /// Creates an assigner with the given configuration.
    #[must_use]
    pub fn new(config: AssignerConfig) -> Self {
        Self {
            config,
            pass_index: 0,
        }
    }

    /// The assigner's configuration.
    #[must_use]
    pub fn config(&self) -> AssignerConfig {
        self.config
    }

    /// Number of completed assignment passes.
    #[must_use]
    pub fn pass_index(&self) -> u64 {
        self.pass_index
    }

    /// Assigns every layer in `root`'s subtree to a backing.
    ///
    /// Ancestor inputs must be current
    /// ([`LayerStore::update_inputs`](crate::layer::LayerStore::update_inputs)).
    ///
    /// # Panics
    ///
    /// Panics if `root` is stale. In debug builds, also panics if a visited
    /// layer ends up both owning a backing and painting into a squashing
    /// layer.
    pub fn assign(
        &mut self,
        layers: &mut LayerStore,
        compositor: &mut dyn Compositor,
        root: LayerId,
        tracer: &mut Tracer<'_>,
    ) -> Assignment {
        assert!(layers.is_alive(root), "stale LayerId: {root:?}");
        self.pass_index += 1;

        tracer.assign_begin(&AssignBeginEvent {
            pass_index: self.pass_index,
            root,
            squashing_enabled: self.config.squashing_enabled,
        });

        let mut walk = Walk {
            config: self.config,
            pass_index: self.pass_index,
            root,
            layers,
            compositor,
            tracer,
            state: SquashingState::default(),
            out: Assignment::default(),
        };
        walk.run();
        let Walk {
            mut out,
            layers,
            tracer,
            ..
        } = walk;

        let mut squashed = 0;
        for &(layer, _) in &out.transitions {
            debug_assert!(
                layers.backing(layer).is_none() || layers.grouped_mapping(layer).is_none(),
                "{layer:?} owns a backing and paints into a squashing layer"
            );
            if layers.grouped_mapping(layer).is_some() {
                squashed += 1;
            }
        }
        out.summary.pass_index = self.pass_index;
        out.summary.squashed = squashed;
        out.summary.changed = out.layers_changed;
        tracer.assign_summary(&out.summary);
        out
    }
}

enum Frame {
    Enter(LayerId),
    AfterNegativeZ(LayerId),
    Exit(LayerId),
}

struct Walk<'w, 't> {
    config: AssignerConfig,
    pass_index: u64,
    root: LayerId,
    layers: &'w mut LayerStore,
    compositor: &'w mut dyn Compositor,
    tracer: &'w mut Tracer<'t>,
    state: SquashingState,
    out: Assignment,
}

impl Walk<'_, '_> {
    fn run(&mut self) {
        let mut stack = alloc::vec![Frame::Enter(self.root)];
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(layer) => {
                    self.visit(layer);
                    stack.push(Frame::AfterNegativeZ(layer));
                    self.push_children(&mut stack, layer, ChildGroups::NEGATIVE_Z);
                }
                Frame::AfterNegativeZ(layer) => {
                    self.after_negative_z(layer);
                    stack.push(Frame::Exit(layer));
                    self.push_children(
                        &mut stack,
                        layer,
                        ChildGroups::NORMAL_FLOW | ChildGroups::POSITIVE_Z,
                    );
                }
                Frame::Exit(layer) => {
                    let owns_host = self
                        .state
                        .most_recent_mapping
                        .is_some_and(|host| self.compositor.backings().owner(host) == layer);
                    if owns_host {
                        self.state
                            .have_assigned_backings_to_entire_squashing_layer_subtree = true;
                    }
                }
            }
        }

        if let Some((backing, members)) = self.state.finish(self.compositor.backings_mut()) {
            self.host_finished(backing, members);
        }
    }

    fn push_children(&self, stack: &mut Vec<Frame>, layer: LayerId, groups: ChildGroups) {
        let children = self.layers.paint_order_children(layer, groups);
        stack.extend(children.into_iter().rev().map(Frame::Enter));
    }

    /// Everything that happens to `layer` before its children are walked.
    fn visit(&mut self, layer: LayerId) {
        self.out.summary.visited += 1;

        if self.config.squashing_enabled && self.layers.reasons(layer).requires_squashing() {
            let prevented = reasons_preventing_squashing(
                self.layers,
                &*self.compositor,
                layer,
                &self.state,
            );
            if !prevented.is_empty() {
                self.layers.add_reasons(layer, prevented);
                self.out.summary.disqualified += 1;
                #[cfg(feature = "trace-rich")]
                self.tracer.squashing_disallowed(&SquashingDisallowedEvent {
                    pass_index: self.pass_index,
                    layer,
                    reason: prevented,
                });
            }
        }

        let transition = self.transition_for(layer);
        self.record_transition(layer, transition);

        if self
            .compositor
            .allocate_or_clear_backing(self.layers, layer, transition)
        {
            self.count_backing_change(transition);
            self.invalidate(layer, InvalidationKind::NewCompositedLayer);
            self.out.layers_changed = true;
        }

        if let Some(reflection) = self.layers.reflection(layer) {
            self.assign_reflection(reflection);
        }

        if self.config.squashing_enabled {
            self.update_squashing_assignment(layer, transition);

            let is_squashed = transition == CompositingStateTransition::PutInSquashingLayer
                || (transition == CompositingStateTransition::NoChange
                    && self.layers.grouped_mapping(layer).is_some());
            if is_squashed {
                #[cfg(feature = "trace-rich")]
                if let Some(backing) = self.state.most_recent_mapping {
                    self.tracer.squashed(&SquashedEvent {
                        pass_index: self.pass_index,
                        layer,
                        backing,
                        index: u32::try_from(self.state.next_squashed_layer_index)
                            .unwrap_or(u32::MAX),
                    });
                }
                let bounds = self.layers.clipped_bounds(layer);
                self.state.add_squashed(bounds);
            }
        }
    }

    /// The transition of `layer`, with a squash into the slot the layer
    /// already occupies reported as no change.
    fn transition_for(&self, layer: LayerId) -> CompositingStateTransition {
        let transition = compute_transition(
            self.config,
            self.layers,
            &*self.compositor,
            layer,
            self.layers.parent(layer).is_none(),
        );
        if transition == CompositingStateTransition::PutInSquashingLayer
            && self.already_in_current_slot(layer)
        {
            return CompositingStateTransition::NoChange;
        }
        transition
    }

    fn already_in_current_slot(&self, layer: LayerId) -> bool {
        let Some(host) = self.state.most_recent_mapping else {
            return false;
        };
        self.layers.grouped_mapping(layer) == Some(host)
            && self
                .compositor
                .backings()
                .squashed_layers(host)
                .get(self.state.next_squashed_layer_index)
                .is_some_and(|s| s.layer == layer)
    }

    fn assign_reflection(&mut self, reflection: LayerId) {
        self.out.summary.visited += 1;
        let transition = compute_transition(
            self.config,
            self.layers,
            &*self.compositor,
            reflection,
            false,
        );
        self.record_transition(reflection, transition);
        if transition != CompositingStateTransition::NoChange {
            self.invalidate(reflection, InvalidationKind::ReflectionLayerChanged);
            self.out.layers_changed = true;
            if self
                .compositor
                .allocate_or_clear_backing(self.layers, reflection, transition)
            {
                self.count_backing_change(transition);
            }
        }
        self.compositor.update_direct_reasons(self.layers, reflection);
        if self.layers.backing(reflection).is_some() {
            self.compositor
                .update_backing_configuration(self.layers, reflection);
        }
    }

    fn update_squashing_assignment(&mut self, layer: LayerId, transition: CompositingStateTransition) {
        debug_assert!(self.config.squashing_enabled, "squashing is disabled");
        match transition {
            CompositingStateTransition::PutInSquashingLayer => {
                assert!(
                    self.layers.backing(layer).is_none(),
                    "squashed layer owns a backing"
                );
                let Some(host) = self.state.most_recent_mapping else {
                    // Unreachable in practice: without a host the layer was
                    // disqualified and composited on its own.
                    return;
                };
                let index = self.state.next_squashed_layer_index;
                let occupant = self
                    .compositor
                    .backings()
                    .squashed_layers(host)
                    .get(index)
                    .map(|s| s.layer);
                if occupant != Some(layer) {
                    self.compositor
                        .paint_invalidation_on_compositing_change(self.layers, layer);
                }
                let changed = self
                    .compositor
                    .backings_mut()
                    .update_squashing_layer_assignment(host, layer, index);
                self.layers.set_grouped_mapping(layer, Some(host));
                self.layers.set_lost_grouped_mapping(layer, false);
                if changed {
                    self.compositor
                        .backings_mut()
                        .set_needs_graphics_layer_update(host, GraphicsLayerUpdate::Subtree);
                    self.layers.invalidate_clip_rects(layer);
                    self.invalidate(layer, InvalidationKind::AddedToSquashingLayer);
                    self.out.layers_changed = true;
                }
            }
            CompositingStateTransition::RemoveFromSquashingLayer => {
                if let Some(old) = self.layers.grouped_mapping(layer) {
                    self.compositor
                        .paint_invalidation_on_compositing_change(self.layers, layer);
                    if self.compositor.backings().is_alive(old) {
                        self.compositor
                            .backings_mut()
                            .set_needs_graphics_layer_update(old, GraphicsLayerUpdate::Subtree);
                    }
                    self.layers.set_grouped_mapping(layer, None);
                }
                self.invalidate(layer, InvalidationKind::RemovedFromSquashingLayer);
                self.out.layers_changed = true;
                self.layers.set_lost_grouped_mapping(layer, false);
            }
            _ => {}
        }
    }

    /// Between negative z-order children and the rest: open a new squashing
    /// host if `layer` owns a backing, then scroll bookkeeping.
    fn after_negative_z(&mut self, layer: LayerId) {
        if self.config.squashing_enabled {
            if let Some(backing) = self.layers.backing(layer) {
                debug_assert!(
                    !self.layers.reasons(layer).requires_squashing(),
                    "squashing host asks to be squashed"
                );
                let finished = self
                    .state
                    .update_for_new_mapping(backing, self.compositor.backings_mut());
                if let Some((old, members)) = finished {
                    self.host_finished(old, members);
                }
                self.tracer.squashing_host(&SquashingHostEvent {
                    pass_index: self.pass_index,
                    owner: layer,
                    backing,
                });
            }
        }

        if let Some(scroll_parent) = self.layers.scroll_parent(layer) {
            self.layers.set_topmost_scroll_child(scroll_parent, Some(layer));
        }
        if self.layers.flags(layer).needs_composited_scrolling {
            self.layers.set_topmost_scroll_child(layer, None);
        }
    }

    fn host_finished(&mut self, backing: BackingId, members: usize) {
        self.tracer
            .squashing_host_finished(&SquashingHostFinishedEvent {
                pass_index: self.pass_index,
                backing,
                members: u32::try_from(members).unwrap_or(u32::MAX),
            });
    }

    fn record_transition(&mut self, layer: LayerId, transition: CompositingStateTransition) {
        self.out.transitions.push((layer, transition));
        #[cfg(feature = "trace-rich")]
        if transition != CompositingStateTransition::NoChange {
            self.tracer.transition(&TransitionEvent {
                pass_index: self.pass_index,
                layer,
                transition,
            });
        }
    }

    fn count_backing_change(&mut self, transition: CompositingStateTransition) {
        if transition == CompositingStateTransition::AllocateOwnBacking {
            self.out.summary.allocated += 1;
        } else {
            self.out.summary.freed += 1;
        }
    }

    fn invalidate(&mut self, layer: LayerId, kind: InvalidationKind) {
        self.out.layers_needing_paint_invalidation.push(layer);
        self.out.summary.invalidations += 1;
        #[cfg(feature = "trace-rich")]
        self.tracer.paint_invalidation(&PaintInvalidationEvent {
            pass_index: self.pass_index,
            layer,
            kind,
        });
        #[cfg(not(feature = "trace-rich"))]
        {
            _ = kind;
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::Rect;

    use super::*;
    use crate::compositor::StandardCompositor;
    use crate::layer::{ClipShape, ContentKind, LayerFlags};
    use crate::reasons::CompositingReasons as R;

    use CompositingStateTransition as T;

    struct Harness {
        layers: LayerStore,
        comp: StandardCompositor,
        assigner: LayerAssigner,
        root: LayerId,
    }

    impl Harness {
        fn new(config: AssignerConfig) -> Self {
            let mut layers = LayerStore::new();
            let root = layers.create_layer();
            layers.set_reasons(root, R::ROOT);
            layers.set_bounds(root, Rect::new(0.0, 0.0, 800.0, 600.0));
            layers.set_flags(
                root,
                LayerFlags {
                    stacking_context: true,
                    ..LayerFlags::DEFAULT
                },
            );
            Self {
                layers,
                comp: StandardCompositor::default(),
                assigner: LayerAssigner::new(config),
                root,
            }
        }

        /// Adds a child of `parent` with the given reasons, covering
        /// `x0..x0+100` by `0..100`.
        fn child(&mut self, parent: LayerId, reasons: R, x0: f64) -> LayerId {
            let id = self.layers.create_layer();
            self.layers.add_child(parent, id);
            self.layers.set_reasons(id, reasons);
            self.layers
                .set_bounds(id, Rect::new(x0, 0.0, x0 + 100.0, 100.0));
            id
        }

        fn run(&mut self) -> Assignment {
            let _ = self.layers.update_inputs();
            self.assigner.assign(
                &mut self.layers,
                &mut self.comp,
                self.root,
                &mut Tracer::none(),
            )
        }

        fn squashed_into(&self, host: LayerId) -> Vec<LayerId> {
            let Some(backing) = self.layers.backing(host) else {
                return Vec::new();
            };
            self.comp
                .backings()
                .squashed_layers(backing)
                .iter()
                .map(|s| s.layer)
                .collect()
        }

        fn assert_mutually_exclusive(&self) {
            for (_, backing) in self.comp.backings().iter() {
                let owner = backing.owner();
                assert_eq!(self.layers.grouped_mapping(owner), None, "{owner:?}");
            }
        }
    }

    /// Root, a composited host, then `n` squash candidates side by side.
    fn squash_row(n: u32) -> (Harness, LayerId, Vec<LayerId>) {
        let mut h = Harness::new(AssignerConfig::default());
        let host = h.child(h.root, R::WILL_CHANGE, 0.0);
        let mut members = Vec::new();
        for i in 1..=n {
            members.push(h.child(h.root, R::OVERLAP, 100.0 * f64::from(i)));
        }
        (h, host, members)
    }

    #[test]
    fn siblings_squash_into_preceding_host() {
        let (mut h, host, members) = squash_row(3);
        let out = h.run();

        let host_backing = h.layers.backing(host);
        assert!(host_backing.is_some());
        for &m in &members {
            assert_eq!(h.layers.grouped_mapping(m), host_backing);
            assert_eq!(h.layers.backing(m), None);
        }
        assert_eq!(h.squashed_into(host), members);
        assert!(out.layers_changed);
        assert_eq!(out.summary.squashed, 3);
        h.assert_mutually_exclusive();
    }

    #[test]
    fn squashed_indices_are_dense_in_paint_order() {
        let (mut h, host, members) = squash_row(5);
        let _ = h.run();
        // Slot i holds the i-th candidate in visit order.
        assert_eq!(h.squashed_into(host), members);
        assert_eq!(h.squashed_into(host).len(), 5);
    }

    #[test]
    fn video_sibling_gets_own_backing() {
        let mut h = Harness::new(AssignerConfig::default());
        let host = h.child(h.root, R::WILL_CHANGE, 0.0);
        let a = h.child(h.root, R::OVERLAP, 100.0);
        let video = h.child(h.root, R::OVERLAP, 200.0);
        h.layers.set_content(video, ContentKind::Video);
        let c = h.child(h.root, R::OVERLAP, 300.0);
        let _ = h.run();

        assert!(h.layers.reasons(video).contains(R::SQUASHING_VIDEO_IS_DISALLOWED));
        assert!(h.layers.backing(video).is_some());
        assert_eq!(h.layers.grouped_mapping(video), None);
        assert_eq!(h.squashed_into(host), vec![a]);
        // The video's backing became the host, and videos do not host either.
        assert!(h.layers.reasons(c).contains(R::SQUASHING_VIDEO_IS_DISALLOWED));
        assert!(h.layers.backing(c).is_some());
        h.assert_mutually_exclusive();
    }

    #[test]
    fn squashing_disabled_allocates_own_backing() {
        let mut h = Harness::new(AssignerConfig {
            squashing_enabled: false,
        });
        let host = h.child(h.root, R::WILL_CHANGE, 0.0);
        let candidate = h.child(h.root, R::OVERLAP, 100.0);
        let out = h.run();

        assert!(out.transitions.contains(&(candidate, T::AllocateOwnBacking)));
        assert!(h.layers.backing(candidate).is_some());
        assert_eq!(h.layers.grouped_mapping(candidate), None);
        assert!(h.squashed_into(host).is_empty());
        // No disallowed reason is recorded when squashing is off.
        assert_eq!(h.layers.reasons(candidate), R::OVERLAP);
    }

    #[test]
    fn losing_host_removes_members_from_squashing() {
        let (mut h, host, members) = squash_row(2);
        let _ = h.run();

        h.layers.set_reasons(host, R::empty());
        h.layers.set_reasons(members[0], R::empty());
        let out = h.run();

        assert!(out.transitions.contains(&(host, T::RemoveOwnBacking)));
        assert!(
            out.transitions
                .contains(&(members[0], T::RemoveFromSquashingLayer))
        );
        assert!(out.layers_needing_paint_invalidation.contains(&members[0]));
        assert_eq!(h.layers.grouped_mapping(members[0]), None);
        assert!(!h.layers.lost_grouped_mapping(members[0]));
        h.assert_mutually_exclusive();
    }

    #[test]
    fn leaving_a_live_host_compacts_its_slots() {
        let (mut h, host, members) = squash_row(3);
        let _ = h.run();
        let _ = h.comp.take_invalidations();

        h.layers.set_reasons(members[1], R::empty());
        let out = h.run();

        assert!(
            out.transitions
                .contains(&(members[1], T::RemoveFromSquashingLayer))
        );
        assert_eq!(h.layers.grouped_mapping(members[1]), None);
        // The last member moved into the freed slot.
        assert!(out.transitions.contains(&(members[2], T::PutInSquashingLayer)));
        assert_eq!(h.squashed_into(host), vec![members[0], members[2]]);
        // The departing layer was invalidated against the host it left.
        let host_backing = h.layers.backing(host);
        assert!(
            h.comp
                .invalidations()
                .iter()
                .any(|i| i.layer == members[1] && i.target == host_backing)
        );
    }

    #[test]
    fn backed_layer_is_squashed_in_the_same_pass() {
        let mut h = Harness::new(AssignerConfig::default());
        let host = h.child(h.root, R::WILL_CHANGE, 0.0);
        let m = h.child(h.root, R::WILL_CHANGE, 100.0);
        let _ = h.run();
        assert!(h.layers.backing(m).is_some());

        h.layers.set_reasons(m, R::OVERLAP);
        let out = h.run();

        assert!(out.transitions.contains(&(m, T::PutInSquashingLayer)));
        assert_eq!(h.layers.backing(m), None);
        assert_eq!(h.layers.grouped_mapping(m), h.layers.backing(host));
        assert_eq!(h.squashed_into(host), vec![m]);
        assert_eq!(out.summary.freed, 1);
        h.assert_mutually_exclusive();

        let settled = h.run();
        assert!(settled.transitions.contains(&(m, T::NoChange)));
        assert!(!settled.layers_changed);
    }

    #[test]
    fn squashing_before_existing_members_only_invalidates_the_newcomer() {
        let mut h = Harness::new(AssignerConfig::default());
        let host = h.child(h.root, R::WILL_CHANGE, 0.0);
        let x = h.child(h.root, R::empty(), 100.0);
        let m1 = h.child(h.root, R::OVERLAP, 200.0);
        let m2 = h.child(h.root, R::OVERLAP, 300.0);
        let _ = h.run();
        assert_eq!(h.squashed_into(host), vec![m1, m2]);
        let _ = h.comp.take_invalidations();

        h.layers.set_reasons(x, R::OVERLAP);
        let out = h.run();

        assert_eq!(out.layers_needing_paint_invalidation, vec![x]);
        assert!(out.transitions.contains(&(x, T::PutInSquashingLayer)));
        assert!(out.transitions.contains(&(m1, T::NoChange)));
        assert!(out.transitions.contains(&(m2, T::NoChange)));
        assert_eq!(h.squashed_into(host), vec![x, m1, m2]);
        assert!(h.comp.invalidations().iter().all(|i| i.layer == x));
    }

    #[test]
    fn subtree_top_is_not_treated_as_the_root() {
        let mut h = Harness::new(AssignerConfig::default());
        let sub = h.child(h.root, R::empty(), 0.0);
        let _ = h.run();
        assert!(h.comp.compositing_mode());

        let _ = h.layers.update_inputs();
        let out = h.assigner.assign(
            &mut h.layers,
            &mut h.comp,
            sub,
            &mut Tracer::none(),
        );
        assert_eq!(out.transitions, vec![(sub, T::NoChange)]);
        assert_eq!(h.layers.backing(sub), None);
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let (mut h, _, _) = squash_row(3);
        let _ = h.run();
        let out = h.run();

        assert!(out.transitions.iter().all(|&(_, t)| t == T::NoChange));
        assert!(out.layers_needing_paint_invalidation.is_empty());
        assert!(!out.layers_changed);
        assert_eq!(out.summary.squashed, 3);
    }

    #[test]
    fn open_host_subtree_is_not_squashed_into() {
        let mut h = Harness::new(AssignerConfig::default());
        let host = h.child(h.root, R::WILL_CHANGE, 0.0);
        let inner = h.child(host, R::OVERLAP, 0.0);
        let later = h.child(h.root, R::OVERLAP, 100.0);
        let _ = h.run();

        assert!(
            h.layers
                .reasons(inner)
                .contains(R::SQUASHING_WOULD_BREAK_PAINT_ORDER)
        );
        assert!(h.layers.backing(inner).is_some());
        // Once the inner layer's subtree closes, its backing hosts `later`.
        assert_eq!(h.layers.grouped_mapping(later), h.layers.backing(inner));
        assert!(h.squashed_into(host).is_empty());
    }

    #[test]
    fn first_disallowed_reason_is_recorded_alone() {
        let mut h = Harness::new(AssignerConfig::default());
        let _host = h.child(h.root, R::WILL_CHANGE, 0.0);
        let clipper = h.child(h.root, R::empty(), 100.0);
        h.layers.set_clip(
            clipper,
            Some(ClipShape::Rect(Rect::new(100.0, 0.0, 300.0, 100.0))),
        );
        let video = h.child(clipper, R::OVERLAP, 100.0);
        h.layers.set_content(video, ContentKind::Video);
        let _ = h.run();

        assert_eq!(
            h.layers.reasons(video) & R::SQUASHING_DISALLOWED,
            R::SQUASHING_VIDEO_IS_DISALLOWED
        );
    }

    #[test]
    fn sparse_candidate_is_composited_alone() {
        let mut h = Harness::new(AssignerConfig::default());
        let host = h.child(h.root, R::WILL_CHANGE, 0.0);
        let near = h.child(h.root, R::OVERLAP, 100.0);
        let far = h.child(h.root, R::OVERLAP, 0.0);
        h.layers
            .set_bounds(far, Rect::new(700.0, 500.0, 710.0, 510.0));
        let _ = h.run();

        assert_eq!(h.squashed_into(host), vec![near]);
        assert!(h.layers.reasons(far).contains(R::SQUASHING_SPARSITY_EXCEEDED));
        assert!(h.layers.backing(far).is_some());
    }

    #[test]
    fn squashed_bounds_respect_sparsity_tolerance() {
        let (mut h, host, members) = squash_row(4);
        let _ = h.run();
        let mut union = Rect::ZERO;
        let mut total = 0.0;
        for m in h.squashed_into(host) {
            let b = h.layers.clipped_bounds(m);
            union = crate::layer::unite(union, b);
            total += crate::layer::area(b);
        }
        assert_eq!(h.squashed_into(host), members);
        assert!(crate::layer::area(union) <= SPARSITY_TOLERANCE * total);
    }

    #[test]
    fn negative_z_children_are_visited_first() {
        let mut h = Harness::new(AssignerConfig::default());
        let flow = h.child(h.root, R::empty(), 0.0);
        let neg = h.child(h.root, R::WILL_CHANGE, 100.0);
        h.layers.set_z_index(neg, Some(-1));
        let out = h.run();

        let order: Vec<_> = out.transitions.iter().map(|&(l, _)| l).collect();
        assert_eq!(order, vec![h.root, neg, flow]);
    }

    #[test]
    fn reflection_follows_composited_owner() {
        let mut h = Harness::new(AssignerConfig::default());
        let owner = h.child(h.root, R::WILL_CHANGE, 0.0);
        let reflection = h.layers.create_layer();
        h.layers.set_reflection(owner, Some(reflection));

        let first = h.run();
        assert!(first.transitions.contains(&(reflection, T::NoChange)));
        assert!(
            h.layers
                .reasons(reflection)
                .contains(R::REFLECTION_OF_COMPOSITED_PARENT)
        );

        let second = h.run();
        assert!(second.transitions.contains(&(reflection, T::AllocateOwnBacking)));
        assert!(second.layers_needing_paint_invalidation.contains(&reflection));
        let Some(backing) = h.layers.backing(reflection) else {
            panic!("reflection has no backing");
        };
        assert_eq!(h.comp.backings().get(backing).configuration_epoch(), 1);

        let third = h.run();
        assert!(!third.layers_changed);
    }

    #[test]
    fn reflection_owner_is_not_squashed() {
        let mut h = Harness::new(AssignerConfig::default());
        let _host = h.child(h.root, R::WILL_CHANGE, 0.0);
        let owner = h.child(h.root, R::OVERLAP, 100.0);
        let reflection = h.layers.create_layer();
        h.layers.set_reflection(owner, Some(reflection));
        let _ = h.run();

        assert!(
            h.layers
                .reasons(owner)
                .contains(R::SQUASHING_REFLECTION_IS_DISALLOWED)
        );
        assert!(h.layers.backing(owner).is_some());
    }

    #[test]
    fn scroll_children_are_recorded_on_their_scroll_parent() {
        let mut h = Harness::new(AssignerConfig::default());
        let scroller = h.child(h.root, R::OVERFLOW_SCROLLING_TOUCH, 0.0);
        h.layers.set_flags(
            scroller,
            LayerFlags {
                scrolls_overflow: true,
                needs_composited_scrolling: true,
                ..LayerFlags::DEFAULT
            },
        );
        h.layers.set_topmost_scroll_child(scroller, Some(h.root));
        let a = h.child(h.root, R::empty(), 100.0);
        let b = h.child(h.root, R::empty(), 200.0);
        h.layers.set_scroll_parent(a, Some(scroller));
        h.layers.set_scroll_parent(b, Some(scroller));
        let _ = h.run();

        assert_eq!(h.layers.topmost_scroll_child(scroller), Some(b));
    }

    #[test]
    fn summary_counts_pass_outcomes() {
        let (mut h, host, _) = squash_row(2);
        let first = h.run();
        assert_eq!(first.summary.pass_index, 1);
        assert_eq!(first.summary.visited, 4);
        // Root and host.
        assert_eq!(first.summary.allocated, 2);
        assert_eq!(first.summary.squashed, 2);
        assert!(first.summary.changed);

        h.layers.set_reasons(host, R::empty());
        let second = h.run();
        assert_eq!(second.summary.pass_index, 2);
        assert_eq!(second.summary.freed, 1);
        assert_eq!(h.assigner.pass_index(), 2);
    }

    #[test]
    fn deep_chains_are_walked_in_order() {
        let mut h = Harness::new(AssignerConfig::default());
        let mut chain = vec![h.root];
        for _ in 0..2_000 {
            let parent = chain[chain.len() - 1];
            chain.push(h.child(parent, R::empty(), 0.0));
        }
        let out = h.run();
        let order: Vec<_> = out.transitions.iter().map(|&(l, _)| l).collect();
        assert_eq!(order, chain);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_sees_hosts_and_summary() {
        use crate::trace::TraceSink;

        #[derive(Default)]
        struct Sink {
            hosts: Vec<LayerId>,
            finished: Vec<u32>,
            summaries: u32,
        }
        impl TraceSink for Sink {
            fn on_squashing_host(&mut self, e: &SquashingHostEvent) {
                self.hosts.push(e.owner);
            }
            fn on_squashing_host_finished(&mut self, e: &SquashingHostFinishedEvent) {
                self.finished.push(e.members);
            }
            fn on_assign_summary(&mut self, _: &AssignSummary) {
                self.summaries += 1;
            }
        }

        let (mut h, host, _) = squash_row(2);
        let _ = h.layers.update_inputs();
        let mut sink = Sink::default();
        let mut tracer = Tracer::new(&mut sink);
        let _ = h
            .assigner
            .assign(&mut h.layers, &mut h.comp, h.root, &mut tracer);
        drop(tracer);

        assert_eq!(sink.hosts, vec![h.root, host]);
        assert_eq!(sink.finished, vec![0, 2]);
        assert_eq!(sink.summaries, 1);
    }
}
