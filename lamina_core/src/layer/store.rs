// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays render-layer storage with allocation, topology, and
//! property management.

use alloc::vec::Vec;

use kurbo::{Affine, Rect};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::clip::ClipShape;
use super::id::{BackingId, INVALID, LayerId};
use super::props::{AncestorInputs, BlendMode, CompositingState, ContentKind, LayerFlags};
use super::traverse::Children;
use crate::dirty;
use crate::reasons::CompositingReasons;

/// Struct-of-arrays storage for all render layers.
///
/// Layers are addressed by [`LayerId`] handles. Internally, each layer
/// occupies a slot in parallel arrays. Destroyed layers are recycled via a
/// free list, and generation counters prevent stale handle access.
#[derive(Debug)]
pub struct LayerStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,
    pub(crate) z_index: Vec<Option<i32>>,

    // -- Local inputs (set by callers) --
    pub(crate) reasons: Vec<CompositingReasons>,
    pub(crate) bounds: Vec<Rect>,
    pub(crate) opacity: Vec<f32>,
    pub(crate) transform: Vec<Affine>,
    pub(crate) clip: Vec<Option<ClipShape>>,
    pub(crate) content: Vec<ContentKind>,
    pub(crate) blend_mode: Vec<BlendMode>,
    pub(crate) flags: Vec<LayerFlags>,
    pub(crate) reflection: Vec<u32>,
    pub(crate) reflection_owner: Vec<u32>,
    pub(crate) scroll_parent: Vec<u32>,

    // -- Computed inputs (written by update_inputs) --
    pub(crate) inputs: Vec<AncestorInputs>,
    pub(crate) clip_rect: Vec<Option<Rect>>,
    pub(crate) clipped_bounds: Vec<Rect>,

    // -- Compositing state (written by the compositor and assigner) --
    pub(crate) backing: Vec<Option<BackingId>>,
    pub(crate) grouped_mapping: Vec<Option<BackingId>>,
    pub(crate) lost_grouped_mapping: Vec<bool>,
    pub(crate) topmost_scroll_child: Vec<u32>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerStore {
    /// Creates an empty layer store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            z_index: Vec::new(),
            reasons: Vec::new(),
            bounds: Vec::new(),
            opacity: Vec::new(),
            transform: Vec::new(),
            clip: Vec::new(),
            content: Vec::new(),
            blend_mode: Vec::new(),
            flags: Vec::new(),
            reflection: Vec::new(),
            reflection_owner: Vec::new(),
            scroll_parent: Vec::new(),
            inputs: Vec::new(),
            clip_rect: Vec::new(),
            clipped_bounds: Vec::new(),
            backing: Vec::new(),
            grouped_mapping: Vec::new(),
            lost_grouped_mapping: Vec::new(),
            topmost_scroll_child: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
        }
    }

    // -- Allocation API --

    /// Creates a new layer and returns its handle.
    ///
    /// The layer starts detached, in normal flow, with no compositing
    /// reasons, empty bounds, full opacity, an identity transform, no clip,
    /// box content, normal blending, and [`LayerFlags::DEFAULT`].
    pub fn create_layer(&mut self) -> LayerId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.z_index[i] = None;
            self.reasons[i] = CompositingReasons::empty();
            self.bounds[i] = Rect::ZERO;
            self.opacity[i] = 1.0;
            self.transform[i] = Affine::IDENTITY;
            self.clip[i] = None;
            self.content[i] = ContentKind::Box;
            self.blend_mode[i] = BlendMode::Normal;
            self.flags[i] = LayerFlags::DEFAULT;
            self.reflection[i] = INVALID;
            self.reflection_owner[i] = INVALID;
            self.scroll_parent[i] = INVALID;
            self.inputs[i] = AncestorInputs::default();
            self.clip_rect[i] = None;
            self.clipped_bounds[i] = Rect::ZERO;
            self.backing[i] = None;
            self.grouped_mapping[i] = None;
            self.lost_grouped_mapping[i] = false;
            self.topmost_scroll_child[i] = INVALID;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.z_index.push(None);
            self.reasons.push(CompositingReasons::empty());
            self.bounds.push(Rect::ZERO);
            self.opacity.push(1.0);
            self.transform.push(Affine::IDENTITY);
            self.clip.push(None);
            self.content.push(ContentKind::Box);
            self.blend_mode.push(BlendMode::Normal);
            self.flags.push(LayerFlags::DEFAULT);
            self.reflection.push(INVALID);
            self.reflection_owner.push(INVALID);
            self.scroll_parent.push(INVALID);
            self.inputs.push(AncestorInputs::default());
            self.clip_rect.push(None);
            self.clipped_bounds.push(Rect::ZERO);
            self.backing.push(None);
            self.grouped_mapping.push(None);
            self.lost_grouped_mapping.push(false);
            self.topmost_scroll_child.push(INVALID);
            self.generation.push(0);
            idx
        };

        self.dirty.mark(idx, dirty::TOPOLOGY);
        self.dirty.mark_with(idx, dirty::INPUTS, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::CLIP_RECTS, &EagerPolicy);

        self.id_at(idx)
    }

    /// Destroys a layer, freeing its slot for reuse.
    ///
    /// Reflection links to and from the layer are dropped.
    ///
    /// # Panics
    ///
    /// Panics if the layer has children, still owns a backing or paints into
    /// one (the compositor must release it first), or if the handle is stale.
    pub fn destroy_layer(&mut self, id: LayerId) {
        self.validate(id);
        let i = id.idx as usize;
        assert!(
            self.first_child[i] == INVALID,
            "cannot destroy layer with children"
        );
        assert!(
            self.backing[i].is_none() && self.grouped_mapping[i].is_none(),
            "cannot destroy layer that still references a backing"
        );

        if self.parent[i] != INVALID {
            self.unlink_from_parent(id.idx);
        }
        if self.reflection[i] != INVALID {
            self.reflection_owner[self.reflection[i] as usize] = INVALID;
        }
        if self.reflection_owner[i] != INVALID {
            self.reflection[self.reflection_owner[i] as usize] = INVALID;
        }

        self.dirty.remove_key(id.idx);
        self.generation[i] += 1;
        self.free_list.push(id.idx);
        self.dirty.mark(id.idx, dirty::TOPOLOGY);
    }

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: LayerId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// Marks the inherited channels for `child`'s subtree so its ancestor
    /// inputs and clip rects are recomputed under the new ancestry.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `child` already has a parent.
    pub fn add_child(&mut self, parent: LayerId, child: LayerId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );

        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        self.link_dirty_dependencies(c, p);
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, or `sibling`
    /// has no parent.
    pub fn insert_before(&mut self, child: LayerId, sibling: LayerId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        self.link_dirty_dependencies(c, p);
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Removes `child` from its current parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer has no parent.
    pub fn remove_from_parent(&mut self, child: LayerId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "layer has no parent");

        let p = self.parent[c as usize];
        self.unlink_from_parent(c);

        self.dirty.remove_dependency(c, p, dirty::INPUTS);
        self.dirty.remove_dependency(c, p, dirty::CLIP_RECTS);
        self.mark_subtree_inherited_dirty(c);
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Returns the parent of a layer, if any.
    #[must_use]
    pub fn parent(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        self.opt_id(self.parent[id.idx as usize])
    }

    /// Returns an iterator over the direct children of a layer, in tree
    /// order.
    ///
    /// Use [`paint_order_children`](Self::paint_order_children) for the
    /// order in which children paint.
    #[must_use]
    pub fn children(&self, id: LayerId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the handles of root layers (those with no parent).
    ///
    /// Detached reflection layers are roots too.
    #[must_use]
    pub fn roots(&self) -> Vec<LayerId> {
        let mut roots = Vec::new();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx) {
                roots.push(self.id_at(idx));
            }
        }
        roots
    }

    /// Returns `true` if `id` is `ancestor` or lies in its subtree.
    #[must_use]
    pub fn is_inclusive_descendant_of(&self, id: LayerId, ancestor: LayerId) -> bool {
        self.validate(id);
        self.validate(ancestor);
        let mut cur = id.idx;
        while cur != INVALID {
            if cur == ancestor.idx {
                return true;
            }
            cur = self.parent[cur as usize];
        }
        false
    }

    // -- Input getters --

    /// Returns the layer's compositing reasons.
    #[must_use]
    pub fn reasons(&self, id: LayerId) -> CompositingReasons {
        self.validate(id);
        self.reasons[id.idx as usize]
    }

    /// Returns the layer's z-index, or `None` for normal-flow layers.
    #[must_use]
    pub fn z_index(&self, id: LayerId) -> Option<i32> {
        self.validate(id);
        self.z_index[id.idx as usize]
    }

    /// Returns the layer's absolute bounding box.
    #[must_use]
    pub fn bounds(&self, id: LayerId) -> Rect {
        self.validate(id);
        self.bounds[id.idx as usize]
    }

    /// Returns the layer's local opacity.
    #[must_use]
    pub fn opacity(&self, id: LayerId) -> f32 {
        self.validate(id);
        self.opacity[id.idx as usize]
    }

    /// Returns the layer's local transform.
    #[must_use]
    pub fn transform(&self, id: LayerId) -> Affine {
        self.validate(id);
        self.transform[id.idx as usize]
    }

    /// Returns the layer's clip shape.
    #[must_use]
    pub fn clip(&self, id: LayerId) -> Option<ClipShape> {
        self.validate(id);
        self.clip[id.idx as usize]
    }

    /// Returns what the layer paints.
    #[must_use]
    pub fn content(&self, id: LayerId) -> ContentKind {
        self.validate(id);
        self.content[id.idx as usize]
    }

    /// Returns the layer's blend mode.
    #[must_use]
    pub fn blend_mode(&self, id: LayerId) -> BlendMode {
        self.validate(id);
        self.blend_mode[id.idx as usize]
    }

    /// Returns the layer's flags.
    #[must_use]
    pub fn flags(&self, id: LayerId) -> LayerFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Returns the reflection layer attached to `id`, if any.
    #[must_use]
    pub fn reflection(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        self.opt_id(self.reflection[id.idx as usize])
    }

    /// Returns the layer whose reflection `id` is, if any.
    #[must_use]
    pub fn reflection_owner(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        self.opt_id(self.reflection_owner[id.idx as usize])
    }

    /// Returns the layer's scroll parent, if any.
    #[must_use]
    pub fn scroll_parent(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        self.opt_id(self.scroll_parent[id.idx as usize])
    }

    /// Returns the ancestor-dependent inputs of a layer.
    ///
    /// Only valid after [`update_inputs`](Self::update_inputs).
    #[must_use]
    pub fn inputs(&self, id: LayerId) -> AncestorInputs {
        self.validate(id);
        self.inputs[id.idx as usize]
    }

    /// Returns the intersection of all ancestor clips, if any ancestor clips.
    ///
    /// Only valid after [`update_inputs`](Self::update_inputs).
    #[must_use]
    pub fn ancestor_clip_rect(&self, id: LayerId) -> Option<Rect> {
        self.validate(id);
        self.clip_rect[id.idx as usize]
    }

    /// Returns the layer's bounding box clipped by its ancestors' clips.
    ///
    /// Only valid after [`update_inputs`](Self::update_inputs).
    #[must_use]
    pub fn clipped_bounds(&self, id: LayerId) -> Rect {
        self.validate(id);
        self.clipped_bounds[id.idx as usize]
    }

    /// Returns `true` if the layer scrolls relative to `other`, i.e. the two
    /// have different scrolling ancestors.
    #[must_use]
    pub fn scrolls_with_respect_to(&self, id: LayerId, other: LayerId) -> bool {
        self.validate(id);
        self.validate(other);
        self.inputs[id.idx as usize].scrolling_ancestor
            != self.inputs[other.idx as usize].scrolling_ancestor
    }

    // -- Input mutation API (auto-marks dirty) --

    /// Replaces the layer's compositing reasons.
    pub fn set_reasons(&mut self, id: LayerId, reasons: CompositingReasons) {
        self.validate(id);
        self.reasons[id.idx as usize] = reasons;
    }

    /// Adds `reasons` to the layer's compositing reasons.
    pub fn add_reasons(&mut self, id: LayerId, reasons: CompositingReasons) {
        self.validate(id);
        self.reasons[id.idx as usize] |= reasons;
    }

    /// Sets the layer's z-index; `None` places it in normal flow.
    pub fn set_z_index(&mut self, id: LayerId, z_index: Option<i32>) {
        self.validate(id);
        self.z_index[id.idx as usize] = z_index;
        self.dirty.mark(id.idx, dirty::TOPOLOGY);
    }

    /// Sets the layer's absolute bounding box.
    pub fn set_bounds(&mut self, id: LayerId, bounds: Rect) {
        self.validate(id);
        self.bounds[id.idx as usize] = bounds;
        self.dirty.mark(id.idx, dirty::BOUNDS);
    }

    /// Sets the layer's opacity.
    ///
    /// Marks INPUTS for the subtree: descendants may gain or lose this layer
    /// as their opacity ancestor.
    pub fn set_opacity(&mut self, id: LayerId, opacity: f32) {
        self.validate(id);
        self.opacity[id.idx as usize] = opacity;
        self.dirty.mark_with(id.idx, dirty::INPUTS, &EagerPolicy);
    }

    /// Sets the layer's transform.
    pub fn set_transform(&mut self, id: LayerId, transform: Affine) {
        self.validate(id);
        self.transform[id.idx as usize] = transform;
        self.dirty.mark_with(id.idx, dirty::INPUTS, &EagerPolicy);
    }

    /// Sets the layer's clip.
    ///
    /// Marks both INPUTS (clipping container) and CLIP_RECTS for the subtree.
    pub fn set_clip(&mut self, id: LayerId, clip: Option<ClipShape>) {
        self.validate(id);
        self.clip[id.idx as usize] = clip;
        self.dirty.mark_with(id.idx, dirty::INPUTS, &EagerPolicy);
        self.dirty.mark_with(id.idx, dirty::CLIP_RECTS, &EagerPolicy);
    }

    /// Sets what the layer paints.
    pub fn set_content(&mut self, id: LayerId, content: ContentKind) {
        self.validate(id);
        self.content[id.idx as usize] = content;
    }

    /// Sets the layer's blend mode.
    pub fn set_blend_mode(&mut self, id: LayerId, blend_mode: BlendMode) {
        self.validate(id);
        self.blend_mode[id.idx as usize] = blend_mode;
    }

    /// Sets the layer's flags.
    pub fn set_flags(&mut self, id: LayerId, flags: LayerFlags) {
        self.validate(id);
        self.flags[id.idx as usize] = flags;
        // Filter and scroller flags are inherited as ancestor inputs; the
        // stacking-context flag changes paint order.
        self.dirty.mark_with(id.idx, dirty::INPUTS, &EagerPolicy);
        self.dirty.mark(id.idx, dirty::TOPOLOGY);
    }

    /// Attaches `reflection` as the reflection layer of `owner`, or detaches
    /// the current one with `None`.
    ///
    /// Reflection layers are not part of the child lists; the assigner
    /// visits them together with their owner.
    ///
    /// # Panics
    ///
    /// Panics if a handle is stale, or if `reflection` has a parent or is
    /// already the reflection of another layer.
    pub fn set_reflection(&mut self, owner: LayerId, reflection: Option<LayerId>) {
        self.validate(owner);
        let o = owner.idx as usize;
        if self.reflection[o] != INVALID {
            self.reflection_owner[self.reflection[o] as usize] = INVALID;
            self.reflection[o] = INVALID;
        }
        if let Some(r) = reflection {
            self.validate(r);
            assert!(
                self.parent[r.idx as usize] == INVALID,
                "reflection layer must not have a parent"
            );
            assert!(
                self.reflection_owner[r.idx as usize] == INVALID,
                "layer is already a reflection"
            );
            self.reflection[o] = r.idx;
            self.reflection_owner[r.idx as usize] = owner.idx;
        }
    }

    /// Sets the layer's scroll parent.
    pub fn set_scroll_parent(&mut self, id: LayerId, scroll_parent: Option<LayerId>) {
        self.validate(id);
        if let Some(p) = scroll_parent {
            self.validate(p);
        }
        self.scroll_parent[id.idx as usize] = scroll_parent.map_or(INVALID, |p| p.idx);
    }

    /// Marks the layer's cached clip rects, and those of all its
    /// descendants, for recomputation.
    pub fn invalidate_clip_rects(&mut self, id: LayerId) {
        self.validate(id);
        self.dirty.mark_with(id.idx, dirty::CLIP_RECTS, &EagerPolicy);
    }

    // -- Compositing state --

    /// Returns the layer's dedicated backing, if any.
    #[must_use]
    pub fn backing(&self, id: LayerId) -> Option<BackingId> {
        self.validate(id);
        self.backing[id.idx as usize]
    }

    /// Returns the backing whose squashing layer the layer paints into, if
    /// any.
    #[must_use]
    pub fn grouped_mapping(&self, id: LayerId) -> Option<BackingId> {
        self.validate(id);
        self.grouped_mapping[id.idx as usize]
    }

    /// Returns `true` if the layer's squashing backing was freed under it
    /// since the last assignment.
    #[must_use]
    pub fn lost_grouped_mapping(&self, id: LayerId) -> bool {
        self.validate(id);
        self.lost_grouped_mapping[id.idx as usize]
    }

    /// Returns the topmost scroll child recorded for a scrolling layer.
    #[must_use]
    pub fn topmost_scroll_child(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        self.opt_id(self.topmost_scroll_child[id.idx as usize])
    }

    /// Returns how the layer reaches the screen.
    #[must_use]
    pub fn compositing_state(&self, id: LayerId) -> CompositingState {
        self.validate(id);
        let i = id.idx as usize;
        if self.backing[i].is_some() {
            CompositingState::PaintsIntoOwnBacking
        } else if self.grouped_mapping[i].is_some() {
            CompositingState::PaintsIntoGroupedBacking
        } else {
            CompositingState::NotComposited
        }
    }

    /// Sets the layer's dedicated backing.
    ///
    /// For [`Compositor`](crate::compositor::Compositor) implementations.
    pub fn set_backing(&mut self, id: LayerId, backing: Option<BackingId>) {
        self.validate(id);
        self.backing[id.idx as usize] = backing;
    }

    /// Sets the backing whose squashing layer the layer paints into.
    ///
    /// For [`Compositor`](crate::compositor::Compositor) implementations and
    /// the layer assigner.
    pub fn set_grouped_mapping(&mut self, id: LayerId, backing: Option<BackingId>) {
        self.validate(id);
        self.grouped_mapping[id.idx as usize] = backing;
    }

    /// Sets or clears the lost-grouped-mapping flag.
    pub fn set_lost_grouped_mapping(&mut self, id: LayerId, lost: bool) {
        self.validate(id);
        self.lost_grouped_mapping[id.idx as usize] = lost;
    }

    /// Records `child` as the topmost scroll child of the scrolling layer
    /// `id`.
    pub fn set_topmost_scroll_child(&mut self, id: LayerId, child: Option<LayerId>) {
        self.validate(id);
        self.topmost_scroll_child[id.idx as usize] = child.map_or(INVALID, |c| c.idx);
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: LayerId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale LayerId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Builds the current handle for a live slot.
    #[inline]
    pub(crate) fn id_at(&self, idx: u32) -> LayerId {
        LayerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    #[inline]
    fn opt_id(&self, idx: u32) -> Option<LayerId> {
        (idx != INVALID).then(|| self.id_at(idx))
    }

    /// Removes `idx` from its parent's child list without touching dirty
    /// state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Adds child-to-parent dependency edges for the inherited channels and
    /// marks the child's subtree.
    fn link_dirty_dependencies(&mut self, c: u32, p: u32) {
        let _ = self.dirty.add_dependency(c, p, dirty::INPUTS);
        let _ = self.dirty.add_dependency(c, p, dirty::CLIP_RECTS);
        self.mark_subtree_inherited_dirty(c);
    }

    fn mark_subtree_inherited_dirty(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::INPUTS, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::CLIP_RECTS, &EagerPolicy);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn create_and_destroy() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        assert!(store.is_alive(id));
        store.destroy_layer(id);
        assert!(!store.is_alive(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = LayerStore::new();
        let id1 = store.create_layer();
        store.destroy_layer(id1);
        let id2 = store.create_layer();
        assert!(!store.is_alive(id1));
        assert!(store.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn reused_slot_starts_fresh() {
        let mut store = LayerStore::new();
        let id1 = store.create_layer();
        store.set_reasons(id1, CompositingReasons::VIDEO);
        store.set_content(id1, ContentKind::Video);
        store.destroy_layer(id1);

        let id2 = store.create_layer();
        assert!(store.reasons(id2).is_empty());
        assert_eq!(store.content(id2), ContentKind::Box);
        assert_eq!(store.flags(id2), LayerFlags::DEFAULT);
    }

    #[test]
    fn add_child_and_query() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child1 = store.create_layer();
        let child2 = store.create_layer();

        store.add_child(parent, child1);
        store.add_child(parent, child2);

        assert_eq!(store.parent(child1), Some(parent));
        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![child1, child2]);
    }

    #[test]
    fn insert_before_and_remove() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let a = store.create_layer();
        let b = store.create_layer();
        let c = store.create_layer();

        store.add_child(parent, a);
        store.add_child(parent, c);
        store.insert_before(b, c);
        assert_eq!(store.children(parent).collect::<Vec<_>>(), vec![a, b, c]);

        store.remove_from_parent(b);
        assert_eq!(store.parent(b), None);
        assert_eq!(store.children(parent).collect::<Vec<_>>(), vec![a, c]);
    }

    #[test]
    fn roots_returns_parentless_layers() {
        let mut store = LayerStore::new();
        let a = store.create_layer();
        let b = store.create_layer();
        let c = store.create_layer();
        store.add_child(a, c);

        let roots = store.roots();
        assert!(roots.contains(&a));
        assert!(roots.contains(&b));
        assert!(!roots.contains(&c));
    }

    #[test]
    fn inclusive_descendant() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        let mid = store.create_layer();
        let leaf = store.create_layer();
        let other = store.create_layer();
        store.add_child(root, mid);
        store.add_child(mid, leaf);
        store.add_child(root, other);

        assert!(store.is_inclusive_descendant_of(leaf, root));
        assert!(store.is_inclusive_descendant_of(leaf, leaf));
        assert!(!store.is_inclusive_descendant_of(leaf, other));
        assert!(!store.is_inclusive_descendant_of(root, leaf));
    }

    #[test]
    fn add_reasons_is_a_union() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        store.set_reasons(id, CompositingReasons::OVERLAP);
        store.add_reasons(id, CompositingReasons::SQUASHING_VIDEO_IS_DISALLOWED);
        assert_eq!(
            store.reasons(id),
            CompositingReasons::OVERLAP | CompositingReasons::SQUASHING_VIDEO_IS_DISALLOWED
        );
    }

    #[test]
    fn reflection_links_are_symmetric() {
        let mut store = LayerStore::new();
        let owner = store.create_layer();
        let reflection = store.create_layer();
        store.set_reflection(owner, Some(reflection));
        assert_eq!(store.reflection(owner), Some(reflection));
        assert_eq!(store.reflection_owner(reflection), Some(owner));

        store.set_reflection(owner, None);
        assert_eq!(store.reflection(owner), None);
        assert_eq!(store.reflection_owner(reflection), None);
    }

    #[test]
    fn destroying_reflection_unlinks_owner() {
        let mut store = LayerStore::new();
        let owner = store.create_layer();
        let reflection = store.create_layer();
        store.set_reflection(owner, Some(reflection));
        store.destroy_layer(reflection);
        assert_eq!(store.reflection(owner), None);
    }

    #[test]
    fn compositing_state_follows_references() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        assert_eq!(store.compositing_state(id), CompositingState::NotComposited);

        let backing = BackingId::from_raw_parts(0, 0);
        store.set_grouped_mapping(id, Some(backing));
        assert_eq!(
            store.compositing_state(id),
            CompositingState::PaintsIntoGroupedBacking
        );

        store.set_grouped_mapping(id, None);
        store.set_backing(id, Some(backing));
        assert_eq!(
            store.compositing_state(id),
            CompositingState::PaintsIntoOwnBacking
        );
    }

    #[test]
    #[should_panic(expected = "cannot destroy layer with children")]
    fn destroy_with_children_panics() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();
        store.add_child(parent, child);
        store.destroy_layer(parent);
    }

    #[test]
    #[should_panic(expected = "cannot destroy layer that still references a backing")]
    fn destroy_with_backing_panics() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        store.set_backing(id, Some(BackingId::from_raw_parts(0, 0)));
        store.destroy_layer(id);
    }

    #[test]
    #[should_panic(expected = "stale LayerId")]
    fn destroyed_handle_panics_on_set_reasons() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        store.destroy_layer(id);
        store.set_reasons(id, CompositingReasons::VIDEO);
    }

    #[test]
    #[should_panic(expected = "reflection layer must not have a parent")]
    fn attached_reflection_panics() {
        let mut store = LayerStore::new();
        let owner = store.create_layer();
        let child = store.create_layer();
        store.add_child(owner, child);
        store.set_reflection(owner, Some(child));
    }
}
