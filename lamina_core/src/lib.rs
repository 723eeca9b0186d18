// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-layer tree and compositing layer assignment.
//!
//! `lamina_core` decides which render layers of a page get a composited
//! backing of their own, which ones share a *squashing layer* with earlier
//! siblings, and which ones paint into an ancestor. It is `no_std`
//! compatible (with `alloc`) and stores the layer tree as struct-of-arrays
//! with generational index handles.
//!
//! # Architecture
//!
//! One update runs in two steps:
//!
//! ```text
//!   caller mutations (reasons, bounds, clips, topology)
//!       │
//!       ▼
//!   LayerStore::update_inputs() ──► InputChanges
//!       │
//!       ▼
//!   LayerAssigner::assign(layers, compositor, root) ──► Assignment
//!       │
//!       ▼
//!   Compositor (backings, paint invalidations)
//! ```
//!
//! **[`layer`]**: Struct-of-arrays layer tree with generational handles.
//! Per-layer inputs (compositing reasons, bounds, clip, opacity, blend mode)
//! are set by the caller; nearest-ancestor inputs and clip rects are computed
//! incrementally by [`LayerStore::update_inputs`](layer::LayerStore::update_inputs).
//!
//! **[`dirty`]**: Multi-channel dirty tracking via `understory_dirty`.
//! Ancestor-derived inputs and clip rects propagate to descendants; bounds
//! are local; topology changes are reported as a single flag.
//!
//! **[`reasons`]**: The [`CompositingReasons`](reasons::CompositingReasons)
//! bitset, including the reasons recorded when a squash is rejected.
//!
//! **[`backing`]**: Composited backings and their ordered squashed-layer
//! lists.
//!
//! **[`compositor`]**: The [`Compositor`](compositor::Compositor) trait the
//! assigner drives, and a [`StandardCompositor`](compositor::StandardCompositor)
//! that owns the backings and records paint invalidations.
//!
//! **[`assign`]**: The paint-order walk that computes each layer's
//! compositing-state transition and squashing assignment.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! assignment instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-layer
//!   transition, squash and invalidation events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod assign;
pub mod backing;
pub mod compositor;
pub mod dirty;
pub mod layer;
pub mod reasons;
pub mod trace;
