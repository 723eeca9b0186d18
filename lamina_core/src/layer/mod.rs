// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-layer tree data model.
//!
//! A *render layer* is a node in the paint tree that may need its own
//! compositing backing. Each layer has:
//!
//! - An identity ([`LayerId`]), a generational handle that becomes stale
//!   when the layer is destroyed.
//! - Topology: parent, first-child, and sibling links forming an ordered
//!   tree, plus an optional z-index that places the layer in its stacking
//!   context's negative or positive z list.
//! - **Local inputs** set by the caller: compositing
//!   [`reasons`](LayerStore::set_reasons), [`bounds`](LayerStore::set_bounds),
//!   [`opacity`](LayerStore::set_opacity),
//!   [`transform`](LayerStore::set_transform), [`clip`](LayerStore::set_clip),
//!   [`content`](LayerStore::set_content),
//!   [`blend mode`](LayerStore::set_blend_mode), and
//!   [`flags`](LayerStore::set_flags).
//! - **Computed inputs** produced by
//!   [`update_inputs`](LayerStore::update_inputs): nearest effect ancestors
//!   ([`AncestorInputs`]) and bounds clipped by ancestor clips.
//! - **Compositing state** written during layer assignment: an owned
//!   backing, a grouped (squashing) backing, and scroll bookkeeping.
//!
//! Layers are stored in struct-of-arrays layout with index-based handles.
//!
//! # Dirty tracking
//!
//! Input mutations mark the corresponding dirty channel (see
//! [`dirty`](crate::dirty)); `update_inputs` drains them.

mod clip;
mod id;
mod inputs;
mod props;
mod store;
mod traverse;

pub use clip::{ClipShape, area, is_empty, unite};
pub use id::{BackingId, INVALID, LayerId};
pub use inputs::InputChanges;
pub use props::{AncestorInputs, BlendMode, CompositingState, ContentKind, LayerFlags};
pub use store::LayerStore;
pub use traverse::{ChildGroups, Children};
