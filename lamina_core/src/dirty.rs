// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Lamina uses multi-channel dirty tracking (via [`understory_dirty`]) to
//! decide which layers need their compositing inputs recomputed before the
//! next layer assignment. Each channel represents an independent category of
//! change.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`INPUTS`] and [`CLIP_RECTS`] use
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and have dependency
//!   edges from child to parent. The nearest opacity, transform, filter,
//!   clipping, and scrolling ancestors are inherited, and so is the
//!   accumulated ancestor clip rect, so marking a layer marks its whole
//!   subtree.
//!
//! - **Local-only**: [`BOUNDS`] is marked when a layer's own bounding box
//!   changes. Only that layer's clipped bounds are recomputed.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on topology mutations
//!   (add/remove child, create/destroy layer).
//!
//! # Consumption
//!
//! [`LayerStore::update_inputs`](crate::layer::LayerStore::update_inputs)
//! drains every channel and reports what it recomputed as
//! [`InputChanges`](crate::layer::InputChanges).

use understory_dirty::Channel;

/// Ancestor-dependent compositing inputs changed for this subtree.
pub const INPUTS: Channel = Channel::new(0);

/// Cached clip rects were cleared for this subtree.
pub const CLIP_RECTS: Channel = Channel::new(1);

/// The layer's own bounding box changed.
pub const BOUNDS: Channel = Channel::new(2);

/// Tree topology changed.
pub const TOPOLOGY: Channel = Channel::new(3);
