// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use alloc::vec::Vec;

use bitflags::bitflags;

use super::id::{INVALID, LayerId};
use super::store::LayerStore;

/// An iterator over the direct children of a layer, in tree order.
///
/// Created by [`LayerStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a LayerStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a LayerStore, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = LayerId;

    fn next(&mut self) -> Option<LayerId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.next_sibling[idx as usize];
        Some(self.store.id_at(idx))
    }
}

bitflags! {
    /// Paint-order groups of a layer's children.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ChildGroups: u8 {
        /// Z-indexed children with a negative z-index; they paint below the
        /// parent's own content.
        const NEGATIVE_Z = 1 << 0;
        /// Children without a z-index, in tree order.
        const NORMAL_FLOW = 1 << 1;
        /// Z-indexed children with a z-index of zero or more.
        const POSITIVE_Z = 1 << 2;
        /// Every child.
        const ALL = Self::NEGATIVE_Z.bits() | Self::NORMAL_FLOW.bits() | Self::POSITIVE_Z.bits();
    }
}

impl LayerStore {
    /// Returns the children of `id` in the requested groups, in paint order.
    ///
    /// Only stacking contexts sort their children by z-index: negative-z
    /// children first (ascending, ties in tree order), then normal flow, then
    /// positive-z children. Children of a layer that is not a stacking
    /// context are all treated as normal flow.
    #[must_use]
    pub fn paint_order_children(&self, id: LayerId, groups: ChildGroups) -> Vec<LayerId> {
        self.validate(id);
        let stacking = self.flags[id.idx as usize].stacking_context;

        let mut negative = Vec::new();
        let mut normal = Vec::new();
        let mut positive = Vec::new();
        for child in self.children(id) {
            match self.z_index[child.idx as usize] {
                Some(z) if stacking && z < 0 => negative.push((z, child)),
                Some(z) if stacking => positive.push((z, child)),
                _ => normal.push(child),
            }
        }
        // Stable sorts keep tree order between equal z-indices.
        negative.sort_by_key(|&(z, _)| z);
        positive.sort_by_key(|&(z, _)| z);

        let mut out = Vec::new();
        if groups.contains(ChildGroups::NEGATIVE_Z) {
            out.extend(negative.into_iter().map(|(_, c)| c));
        }
        if groups.contains(ChildGroups::NORMAL_FLOW) {
            out.extend(normal);
        }
        if groups.contains(ChildGroups::POSITIVE_Z) {
            out.extend(positive.into_iter().map(|(_, c)| c));
        }
        out
    }
}
