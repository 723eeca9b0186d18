// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositing-input update and change tracking.
//!
//! Input update follows a drain-recompute pattern for each dirty channel:
//!
//! 1. **INPUTS**: drain dirty indices in parent-before-child order and
//!    recompute each layer's [`AncestorInputs`] from its parent's inputs and
//!    the parent's own effects.
//! 2. **CLIP_RECTS**: drain dirty indices in the same order, recompute the
//!    accumulated ancestor clip rect, and re-clip the layer's bounds.
//! 3. **BOUNDS**: re-clip bounds of layers whose own bounding box changed.
//! 4. **TOPOLOGY**: drain and report whether anything structural changed.
//!
//! Like the rest of the store's bulk APIs, [`InputChanges`] reports raw slot
//! indices rather than [`LayerId`](super::LayerId) handles.

use alloc::vec::Vec;

use kurbo::{Affine, Rect};

use super::id::INVALID;
use super::props::AncestorInputs;
use super::store::LayerStore;
use crate::dirty;

/// The set of changes produced by a single [`LayerStore::update_inputs`]
/// call.
#[derive(Clone, Debug, Default)]
pub struct InputChanges {
    /// Layers whose ancestor inputs were recomputed.
    pub inputs: Vec<u32>,
    /// Layers whose ancestor clip rect was recomputed.
    pub clip_rects: Vec<u32>,
    /// Layers whose clipped bounds were recomputed because their own bounds
    /// changed.
    pub bounds: Vec<u32>,
    /// Whether the tree topology changed.
    pub topology_changed: bool,
}

impl InputChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.inputs.clear();
        self.clip_rects.clear();
        self.bounds.clear();
        self.topology_changed = false;
    }

    /// Returns `true` if nothing was recomputed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
            && self.clip_rects.is_empty()
            && self.bounds.is_empty()
            && !self.topology_changed
    }
}

impl LayerStore {
    /// Recomputes dirty compositing inputs and returns what changed.
    ///
    /// Must run before layer assignment whenever the tree or any inherited
    /// property changed; the assigner reads ancestor inputs and clipped
    /// bounds without recomputing them.
    pub fn update_inputs(&mut self) -> InputChanges {
        let mut changes = InputChanges::default();
        self.update_inputs_into(&mut changes);
        changes
    }

    /// Like [`update_inputs`](Self::update_inputs), but reuses a
    /// caller-provided buffer.
    pub fn update_inputs_into(&mut self, changes: &mut InputChanges) {
        changes.clear();

        let dirty_inputs: Vec<u32> = self
            .dirty
            .drain(dirty::INPUTS)
            .affected()
            .deterministic()
            .run()
            .collect();
        for &idx in &dirty_inputs {
            if self.free_list.contains(&idx) {
                continue;
            }
            let p = self.parent[idx as usize];
            self.inputs[idx as usize] = if p == INVALID {
                AncestorInputs::default()
            } else {
                self.inputs_inherited_from(p)
            };
            changes.inputs.push(idx);
        }

        let dirty_clips: Vec<u32> = self
            .dirty
            .drain(dirty::CLIP_RECTS)
            .affected()
            .deterministic()
            .run()
            .collect();
        for &idx in &dirty_clips {
            if self.free_list.contains(&idx) {
                continue;
            }
            let p = self.parent[idx as usize];
            self.clip_rect[idx as usize] = if p == INVALID {
                None
            } else {
                let own = self.clip[p as usize].map(|c| c.bounds());
                match (self.clip_rect[p as usize], own) {
                    (Some(a), Some(b)) => Some(a.intersect(b)),
                    (a, b) => a.or(b),
                }
            };
            self.reclip_bounds(idx);
            changes.clip_rects.push(idx);
        }

        let dirty_bounds: Vec<u32> = self
            .dirty
            .drain(dirty::BOUNDS)
            .deterministic()
            .run()
            .collect();
        for &idx in &dirty_bounds {
            if self.free_list.contains(&idx) {
                continue;
            }
            self.reclip_bounds(idx);
            changes.bounds.push(idx);
        }

        let topology: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
        changes.topology_changed = !topology.is_empty();
    }

    /// Inputs a child of slot `p` inherits.
    fn inputs_inherited_from(&self, p: u32) -> AncestorInputs {
        let pi = p as usize;
        let parent = self.id_at(p);
        let from_parent = self.inputs[pi];
        let flags = self.flags[pi];
        AncestorInputs {
            opacity_ancestor: if self.opacity[pi] < 1.0 {
                Some(parent)
            } else {
                from_parent.opacity_ancestor
            },
            transform_ancestor: if self.transform[pi] != Affine::IDENTITY {
                Some(parent)
            } else {
                from_parent.transform_ancestor
            },
            filter_ancestor: if flags.has_filter {
                Some(parent)
            } else {
                from_parent.filter_ancestor
            },
            clipping_container: if self.clip[pi].is_some() {
                Some(parent)
            } else {
                from_parent.clipping_container
            },
            scrolling_ancestor: if flags.scrolls_overflow {
                Some(parent)
            } else {
                from_parent.scrolling_ancestor
            },
        }
    }

    fn reclip_bounds(&mut self, idx: u32) {
        let i = idx as usize;
        let bounds: Rect = self.bounds[i];
        self.clipped_bounds[i] = match self.clip_rect[i] {
            Some(clip) => bounds.intersect(clip),
            None => bounds,
        };
    }
}
