// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for layer assignment.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [`LayerAssigner`](crate::assign::LayerAssigner) calls as it walks the
//! tree. All method bodies default to no-ops, so implementing only the events
//! you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Every event carries the `pass_index` of the assignment call that produced
//! it, so sinks can group events by pass.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) gates the per-layer events
//!   ([`TransitionEvent`], [`SquashingDisallowedEvent`], [`SquashedEvent`],
//!   [`PaintInvalidationEvent`]) plus the corresponding `TraceSink` methods.

use crate::layer::{BackingId, LayerId};
#[cfg(feature = "trace-rich")]
use crate::{assign::CompositingStateTransition, reasons::CompositingReasons};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why the assigner recorded a layer for paint invalidation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvalidationKind {
    /// The layer gained or lost a dedicated backing.
    NewCompositedLayer,
    /// The layer joined a squashing layer or moved to a different slot.
    AddedToSquashingLayer,
    /// The layer left its squashing layer.
    RemovedFromSquashingLayer,
    /// The layer's reflection gained or lost a dedicated backing.
    ReflectionLayerChanged,
}

impl InvalidationKind {
    /// Short stable name, used by trace sinks.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NewCompositedLayer => "NewCompositedLayer",
            Self::AddedToSquashingLayer => "AddedToSquashingLayer",
            Self::RemovedFromSquashingLayer => "RemovedFromSquashingLayer",
            Self::ReflectionLayerChanged => "ReflectionLayerChanged",
        }
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when an assignment pass starts.
#[derive(Clone, Copy, Debug)]
pub struct AssignBeginEvent {
    /// Monotonic pass counter of the assigner.
    pub pass_index: u64,
    /// Root of the walk.
    pub root: LayerId,
    /// Whether squashing is enabled for this pass.
    pub squashing_enabled: bool,
}

/// Emitted when a layer's backing becomes the current squashing host.
#[derive(Clone, Copy, Debug)]
pub struct SquashingHostEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Layer owning the backing.
    pub owner: LayerId,
    /// The new host backing.
    pub backing: BackingId,
}

/// Emitted when a squashing host is closed and its member list trimmed.
#[derive(Clone, Copy, Debug)]
pub struct SquashingHostFinishedEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// The closed host backing.
    pub backing: BackingId,
    /// Number of layers squashed into it during this pass.
    pub members: u32,
}

/// Per-pass counters, emitted when an assignment pass ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssignSummary {
    /// Pass counter.
    pub pass_index: u64,
    /// Layers visited, reflections included.
    pub visited: u32,
    /// Dedicated backings allocated.
    pub allocated: u32,
    /// Dedicated backings freed.
    pub freed: u32,
    /// Layers painting into a squashing layer at the end of the pass.
    pub squashed: u32,
    /// Squash requests rejected with a disallowed reason.
    pub disqualified: u32,
    /// Layers recorded for paint invalidation.
    pub invalidations: u32,
    /// Whether the pass changed the layer tree.
    pub changed: bool,
}

/// A layer's compositing-state transition (requires `trace-rich`).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct TransitionEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// The layer.
    pub layer: LayerId,
    /// The decided transition.
    pub transition: CompositingStateTransition,
}

/// A rejected squash request (requires `trace-rich`).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct SquashingDisallowedEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// The layer that asked to be squashed.
    pub layer: LayerId,
    /// The single disallowed reason recorded on the layer.
    pub reason: CompositingReasons,
}

/// A layer assigned to a squashing slot (requires `trace-rich`).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct SquashedEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// The squashed layer.
    pub layer: LayerId,
    /// The host backing.
    pub backing: BackingId,
    /// Slot index within the host's squashing layer.
    pub index: u32,
}

/// A layer recorded for paint invalidation (requires `trace-rich`).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct PaintInvalidationEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// The invalidated layer.
    pub layer: LayerId,
    /// Why it was invalidated.
    pub kind: InvalidationKind,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from layer assignment.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when an assignment pass starts.
    fn on_assign_begin(&mut self, e: &AssignBeginEvent) {
        _ = e;
    }

    /// Called when a new squashing host is opened.
    fn on_squashing_host(&mut self, e: &SquashingHostEvent) {
        _ = e;
    }

    /// Called when a squashing host is closed.
    fn on_squashing_host_finished(&mut self, e: &SquashingHostFinishedEvent) {
        _ = e;
    }

    /// Called with the per-pass summary when an assignment pass ends.
    fn on_assign_summary(&mut self, s: &AssignSummary) {
        _ = s;
    }

    /// Called for every non-trivial transition (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_transition(&mut self, e: &TransitionEvent) {
        _ = e;
    }

    /// Called when a squash request is rejected (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_squashing_disallowed(&mut self, e: &SquashingDisallowedEvent) {
        _ = e;
    }

    /// Called when a layer ends up in a squashing slot (requires
    /// `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_squashed(&mut self, e: &SquashedEvent) {
        _ = e;
    }

    /// Called when a layer is recorded for paint invalidation (requires
    /// `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_paint_invalidation(&mut self, e: &PaintInvalidationEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits an [`AssignBeginEvent`].
    #[inline]
    pub fn assign_begin(&mut self, e: &AssignBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_assign_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SquashingHostEvent`].
    #[inline]
    pub fn squashing_host(&mut self, e: &SquashingHostEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_squashing_host(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SquashingHostFinishedEvent`].
    #[inline]
    pub fn squashing_host_finished(&mut self, e: &SquashingHostFinishedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_squashing_host_finished(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`AssignSummary`].
    #[inline]
    pub fn assign_summary(&mut self, s: &AssignSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_assign_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits a [`TransitionEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn transition(&mut self, e: &TransitionEvent) {
        if let Some(s) = &mut self.sink {
            s.on_transition(e);
        }
    }

    /// Emits a [`SquashingDisallowedEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn squashing_disallowed(&mut self, e: &SquashingDisallowedEvent) {
        if let Some(s) = &mut self.sink {
            s.on_squashing_disallowed(e);
        }
    }

    /// Emits a [`SquashedEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn squashed(&mut self, e: &SquashedEvent) {
        if let Some(s) = &mut self.sink {
            s.on_squashed(e);
        }
    }

    /// Emits a [`PaintInvalidationEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn paint_invalidation(&mut self, e: &PaintInvalidationEvent) {
        if let Some(s) = &mut self.sink {
            s.on_paint_invalidation(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
