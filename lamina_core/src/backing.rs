// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composited backings and their squashing layers.
//!
//! A [`Backing`] is a composited surface owned by exactly one render layer.
//! Besides its owner's content, a backing may host a *squashing layer*: an
//! ordered list of [`SquashedLayer`]s that paint into the same surface
//! instead of getting backings of their own. Slot indices in that list follow
//! paint order and are rebuilt on every assignment pass, starting from zero.
//!
//! Backings live in a [`BackingStore`] and are addressed by generational
//! [`BackingId`] handles, mirroring the layer store.

use alloc::vec::Vec;

use crate::layer::{BackingId, LayerId, LayerStore};

/// How much of a backing's graphics-layer geometry must be recomputed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GraphicsLayerUpdate {
    /// Geometry is up to date.
    #[default]
    None,
    /// Only the backing's own graphics layers.
    Local,
    /// The backing and everything composited beneath it.
    Subtree,
}

/// One member of a backing's squashing layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SquashedLayer {
    /// The render layer painting into the squashing layer.
    pub layer: LayerId,
}

/// A composited backing.
#[derive(Clone, Debug)]
pub struct Backing {
    owner: LayerId,
    squashed: Vec<SquashedLayer>,
    geometry_update: GraphicsLayerUpdate,
    configuration_epoch: u64,
}

impl Backing {
    /// The layer that owns this backing.
    #[must_use]
    pub fn owner(&self) -> LayerId {
        self.owner
    }

    /// Members of the squashing layer, in slot order.
    #[must_use]
    pub fn squashed_layers(&self) -> &[SquashedLayer] {
        &self.squashed
    }

    /// Pending geometry update.
    #[must_use]
    pub fn geometry_update(&self) -> GraphicsLayerUpdate {
        self.geometry_update
    }

    /// Number of times the backing's configuration was refreshed.
    #[must_use]
    pub fn configuration_epoch(&self) -> u64 {
        self.configuration_epoch
    }
}

/// Generational table of backings.
#[derive(Debug, Default)]
pub struct BackingStore {
    slots: Vec<Option<Backing>>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
}

impl BackingStore {
    /// Creates an empty backing store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh backing owned by `owner`.
    ///
    /// The new backing starts with an empty squashing layer and a pending
    /// subtree geometry update.
    pub fn allocate(&mut self, owner: LayerId) -> BackingId {
        let backing = Backing {
            owner,
            squashed: Vec::new(),
            geometry_update: GraphicsLayerUpdate::Subtree,
            configuration_epoch: 0,
        };
        if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.slots[i] = Some(backing);
            BackingId::from_raw_parts(idx, self.generation[i])
        } else {
            #[expect(clippy::cast_possible_truncation, reason = "slot count fits in u32")]
            let idx = self.slots.len() as u32;
            self.slots.push(Some(backing));
            self.generation.push(0);
            BackingId::from_raw_parts(idx, 0)
        }
    }

    /// Frees a backing and returns it.
    ///
    /// The caller is responsible for clearing the owner's and squashed
    /// members' references to `id` before or after the call.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy(&mut self, id: BackingId) -> Backing {
        if !self.is_alive(id) {
            stale(id);
        }
        self.free_list.push(id.index());
        self.slots[id.index() as usize]
            .take()
            .unwrap_or_else(|| stale(id))
    }

    /// Returns `true` if `id` refers to a live backing.
    #[must_use]
    pub fn is_alive(&self, id: BackingId) -> bool {
        let i = id.index() as usize;
        i < self.slots.len() && self.generation[i] == id.generation() && self.slots[i].is_some()
    }

    /// Returns the backing for `id`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn get(&self, id: BackingId) -> &Backing {
        let i = id.index() as usize;
        match self.slots.get(i) {
            Some(Some(b)) if self.generation[i] == id.generation() => b,
            _ => stale(id),
        }
    }

    fn get_mut(&mut self, id: BackingId) -> &mut Backing {
        let i = id.index() as usize;
        match self.slots.get_mut(i) {
            Some(Some(b)) if self.generation[i] == id.generation() => b,
            _ => stale(id),
        }
    }

    /// Returns the layer owning `id`.
    #[must_use]
    pub fn owner(&self, id: BackingId) -> LayerId {
        self.get(id).owner
    }

    /// Returns the squashing-layer members of `id`, in slot order.
    #[must_use]
    pub fn squashed_layers(&self, id: BackingId) -> &[SquashedLayer] {
        &self.get(id).squashed
    }

    /// Number of live backings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Returns `true` if no backing is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over live backings in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (BackingId, &Backing)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.as_ref().map(|b| {
                #[expect(clippy::cast_possible_truncation, reason = "slot count fits in u32")]
                let idx = i as u32;
                (BackingId::from_raw_parts(idx, self.generation[i]), b)
            })
        })
    }

    /// Places `layer` at slot `index` of `id`'s squashing layer.
    ///
    /// Inserts before the member at `index` if it is a different layer, or
    /// appends when `index` is one past the end. Later members shift down a
    /// slot; stale ones are trimmed by
    /// [`finish_accumulating_squashing_layers`](Self::finish_accumulating_squashing_layers).
    /// A later copy of `layer` is dropped, so each layer holds one slot.
    /// Returns `true` if membership changed.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or `index` would leave a gap.
    pub fn update_squashing_layer_assignment(
        &mut self,
        id: BackingId,
        layer: LayerId,
        index: usize,
    ) -> bool {
        let backing = self.get_mut(id);
        let entry = SquashedLayer { layer };
        if index < backing.squashed.len() {
            if backing.squashed[index] == entry {
                return false;
            }
            backing.squashed.insert(index, entry);
            if let Some(dup) = backing.squashed[index + 1..]
                .iter()
                .position(|s| *s == entry)
            {
                backing.squashed.remove(index + 1 + dup);
            }
        } else {
            assert!(
                index == backing.squashed.len(),
                "squashed layer index {index} skips slots (len {})",
                backing.squashed.len()
            );
            backing.squashed.push(entry);
        }
        true
    }

    /// Drops members at slot `next_index` and beyond; they were not
    /// reassigned during the pass that just closed this backing.
    pub fn finish_accumulating_squashing_layers(&mut self, id: BackingId, next_index: usize) {
        let backing = self.get_mut(id);
        if next_index < backing.squashed.len() {
            backing.squashed.truncate(next_index);
            backing.geometry_update = GraphicsLayerUpdate::Subtree;
        }
    }

    /// Returns the first of the leading `max_index` squashed members of `id`
    /// that `container` is an inclusive descendant of.
    ///
    /// A squash candidate whose clipping container lies inside an already
    /// squashed member shares that member's clip and may join the backing.
    #[must_use]
    pub fn containing_squashed_layer(
        &self,
        id: BackingId,
        layers: &LayerStore,
        container: Option<LayerId>,
        max_index: usize,
    ) -> Option<LayerId> {
        let container = container?;
        self.get(id)
            .squashed
            .iter()
            .take(max_index)
            .map(|s| s.layer)
            .find(|&member| {
                layers.is_alive(member) && layers.is_inclusive_descendant_of(container, member)
            })
    }

    /// Raises the pending geometry update of `id` to at least `update`.
    pub fn set_needs_graphics_layer_update(&mut self, id: BackingId, update: GraphicsLayerUpdate) {
        let backing = self.get_mut(id);
        backing.geometry_update = backing.geometry_update.max(update);
    }

    /// Returns and clears the pending geometry update of `id`.
    pub fn take_graphics_layer_update(&mut self, id: BackingId) -> GraphicsLayerUpdate {
        core::mem::take(&mut self.get_mut(id).geometry_update)
    }

    /// Records a configuration refresh of `id`.
    pub fn bump_configuration(&mut self, id: BackingId) {
        self.get_mut(id).configuration_epoch += 1;
    }

}

#[cold]
#[track_caller]
fn stale(id: BackingId) -> ! {
    panic!("stale BackingId: {id:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layers_with(n: usize) -> (LayerStore, Vec<LayerId>) {
        let mut layers = LayerStore::new();
        let ids = (0..n).map(|_| layers.create_layer()).collect();
        (layers, ids)
    }

    #[test]
    fn allocate_and_destroy_recycles_slot() {
        let (_, ids) = layers_with(1);
        let mut store = BackingStore::new();
        let a = store.allocate(ids[0]);
        assert_eq!(store.owner(a), ids[0]);
        assert_eq!(store.len(), 1);

        let freed = store.destroy(a);
        assert_eq!(freed.owner(), ids[0]);
        assert!(!store.is_alive(a));
        assert!(store.is_empty());

        let b = store.allocate(ids[0]);
        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
    }

    #[test]
    fn squashing_assignment_reports_membership_changes() {
        let (_, ids) = layers_with(4);
        let mut store = BackingStore::new();
        let host = store.allocate(ids[0]);

        assert!(store.update_squashing_layer_assignment(host, ids[1], 0));
        assert!(store.update_squashing_layer_assignment(host, ids[2], 1));
        // Same layer in the same slot is not a change.
        assert!(!store.update_squashing_layer_assignment(host, ids[1], 0));
        // A new layer in an occupied slot pushes the occupant down.
        assert!(store.update_squashing_layer_assignment(host, ids[3], 1));

        let members: Vec<_> = store.squashed_layers(host).iter().map(|s| s.layer).collect();
        assert_eq!(members, alloc::vec![ids[1], ids[3], ids[2]]);
    }

    #[test]
    fn moving_a_member_earlier_keeps_one_slot() {
        let (_, ids) = layers_with(4);
        let mut store = BackingStore::new();
        let host = store.allocate(ids[0]);
        store.update_squashing_layer_assignment(host, ids[1], 0);
        store.update_squashing_layer_assignment(host, ids[2], 1);
        store.update_squashing_layer_assignment(host, ids[3], 2);

        assert!(store.update_squashing_layer_assignment(host, ids[3], 0));
        let members: Vec<_> = store.squashed_layers(host).iter().map(|s| s.layer).collect();
        assert_eq!(members, alloc::vec![ids[3], ids[1], ids[2]]);
    }

    #[test]
    fn finish_truncates_stale_members() {
        let (_, ids) = layers_with(3);
        let mut store = BackingStore::new();
        let host = store.allocate(ids[0]);
        store.update_squashing_layer_assignment(host, ids[1], 0);
        store.update_squashing_layer_assignment(host, ids[2], 1);
        let _ = store.take_graphics_layer_update(host);

        store.finish_accumulating_squashing_layers(host, 1);
        assert_eq!(store.squashed_layers(host).len(), 1);
        assert_eq!(
            store.take_graphics_layer_update(host),
            GraphicsLayerUpdate::Subtree
        );

        // Nothing stale: no update requested.
        store.finish_accumulating_squashing_layers(host, 1);
        assert_eq!(
            store.take_graphics_layer_update(host),
            GraphicsLayerUpdate::None
        );
    }

    #[test]
    fn containing_squashed_layer_is_inclusive_and_bounded() {
        let (mut layers, ids) = layers_with(4);
        let (host_owner, member, inner, late) = (ids[0], ids[1], ids[2], ids[3]);
        layers.add_child(member, inner);

        let mut store = BackingStore::new();
        let host = store.allocate(host_owner);
        store.update_squashing_layer_assignment(host, member, 0);
        store.update_squashing_layer_assignment(host, late, 1);

        assert_eq!(
            store.containing_squashed_layer(host, &layers, Some(inner), 1),
            Some(member)
        );
        assert_eq!(
            store.containing_squashed_layer(host, &layers, Some(member), 1),
            Some(member)
        );
        // Only the first `max_index` members are considered.
        assert_eq!(
            store.containing_squashed_layer(host, &layers, Some(late), 1),
            None
        );
        assert_eq!(store.containing_squashed_layer(host, &layers, None, 2), None);
    }

    #[test]
    fn geometry_update_only_rises() {
        let (_, ids) = layers_with(1);
        let mut store = BackingStore::new();
        let id = store.allocate(ids[0]);
        assert_eq!(
            store.take_graphics_layer_update(id),
            GraphicsLayerUpdate::Subtree
        );
        store.set_needs_graphics_layer_update(id, GraphicsLayerUpdate::Subtree);
        store.set_needs_graphics_layer_update(id, GraphicsLayerUpdate::Local);
        assert_eq!(store.get(id).geometry_update(), GraphicsLayerUpdate::Subtree);
    }

    #[test]
    #[should_panic(expected = "stale BackingId")]
    fn destroyed_backing_panics_on_access() {
        let (_, ids) = layers_with(1);
        let mut store = BackingStore::new();
        let id = store.allocate(ids[0]);
        store.destroy(id);
        let _ = store.owner(id);
    }

    #[test]
    #[should_panic(expected = "skips slots")]
    fn gap_in_squashed_indices_panics() {
        let (_, ids) = layers_with(2);
        let mut store = BackingStore::new();
        let id = store.allocate(ids[0]);
        store.update_squashing_layer_assignment(id, ids[1], 1);
    }
}
