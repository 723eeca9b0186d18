// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Layer and backing handles are stored as `(index, generation)` pairs, so a
//! decoded recording can be matched against the live store it came from.

use lamina_core::assign::CompositingStateTransition;
use lamina_core::layer::{BackingId, LayerId};
use lamina_core::reasons::CompositingReasons;
use lamina_core::trace::{
    AssignBeginEvent, AssignSummary, InvalidationKind, PaintInvalidationEvent, SquashedEvent,
    SquashingDisallowedEvent, SquashingHostEvent, SquashingHostFinishedEvent, TraceSink,
    TransitionEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_ASSIGN_BEGIN: u8 = 1;
const TAG_SQUASHING_HOST: u8 = 2;
const TAG_SQUASHING_HOST_FINISHED: u8 = 3;
const TAG_ASSIGN_SUMMARY: u8 = 4;
const TAG_TRANSITION: u8 = 5;
const TAG_SQUASHING_DISALLOWED: u8 = 6;
const TAG_SQUASHED: u8 = 7;
const TAG_PAINT_INVALIDATION: u8 = 8;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_layer(&mut self, id: LayerId) {
        self.write_u32(id.index());
        self.write_u32(id.generation());
    }

    fn write_backing(&mut self, id: BackingId) {
        self.write_u32(id.index());
        self.write_u32(id.generation());
    }

    fn write_transition(&mut self, t: CompositingStateTransition) {
        use CompositingStateTransition as T;
        self.write_u8(match t {
            T::NoChange => 0,
            T::AllocateOwnBacking => 1,
            T::RemoveOwnBacking => 2,
            T::PutInSquashingLayer => 3,
            T::RemoveFromSquashingLayer => 4,
        });
    }

    fn write_invalidation_kind(&mut self, k: InvalidationKind) {
        self.write_u8(match k {
            InvalidationKind::NewCompositedLayer => 0,
            InvalidationKind::AddedToSquashingLayer => 1,
            InvalidationKind::RemovedFromSquashingLayer => 2,
            InvalidationKind::ReflectionLayerChanged => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_assign_begin(&mut self, e: &AssignBeginEvent) {
        self.write_u8(TAG_ASSIGN_BEGIN);
        self.write_u64(e.pass_index);
        self.write_layer(e.root);
        self.write_bool(e.squashing_enabled);
    }

    fn on_squashing_host(&mut self, e: &SquashingHostEvent) {
        self.write_u8(TAG_SQUASHING_HOST);
        self.write_u64(e.pass_index);
        self.write_layer(e.owner);
        self.write_backing(e.backing);
    }

    fn on_squashing_host_finished(&mut self, e: &SquashingHostFinishedEvent) {
        self.write_u8(TAG_SQUASHING_HOST_FINISHED);
        self.write_u64(e.pass_index);
        self.write_backing(e.backing);
        self.write_u32(e.members);
    }

    fn on_assign_summary(&mut self, s: &AssignSummary) {
        self.write_u8(TAG_ASSIGN_SUMMARY);
        self.write_u64(s.pass_index);
        self.write_u32(s.visited);
        self.write_u32(s.allocated);
        self.write_u32(s.freed);
        self.write_u32(s.squashed);
        self.write_u32(s.disqualified);
        self.write_u32(s.invalidations);
        self.write_bool(s.changed);
    }

    fn on_transition(&mut self, e: &TransitionEvent) {
        self.write_u8(TAG_TRANSITION);
        self.write_u64(e.pass_index);
        self.write_layer(e.layer);
        self.write_transition(e.transition);
    }

    fn on_squashing_disallowed(&mut self, e: &SquashingDisallowedEvent) {
        self.write_u8(TAG_SQUASHING_DISALLOWED);
        self.write_u64(e.pass_index);
        self.write_layer(e.layer);
        self.write_u64(e.reason.bits());
    }

    fn on_squashed(&mut self, e: &SquashedEvent) {
        self.write_u8(TAG_SQUASHED);
        self.write_u64(e.pass_index);
        self.write_layer(e.layer);
        self.write_backing(e.backing);
        self.write_u32(e.index);
    }

    fn on_paint_invalidation(&mut self, e: &PaintInvalidationEvent) {
        self.write_u8(TAG_PAINT_INVALIDATION);
        self.write_u64(e.pass_index);
        self.write_layer(e.layer);
        self.write_invalidation_kind(e.kind);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// An [`AssignBeginEvent`].
    AssignBegin(AssignBeginEvent),
    /// A [`SquashingHostEvent`].
    SquashingHost(SquashingHostEvent),
    /// A [`SquashingHostFinishedEvent`].
    SquashingHostFinished(SquashingHostFinishedEvent),
    /// An [`AssignSummary`].
    AssignSummary(AssignSummary),
    /// A [`TransitionEvent`].
    Transition(TransitionEvent),
    /// A [`SquashingDisallowedEvent`].
    SquashingDisallowed(SquashingDisallowedEvent),
    /// A [`SquashedEvent`].
    Squashed(SquashedEvent),
    /// A [`PaintInvalidationEvent`].
    PaintInvalidation(PaintInvalidationEvent),
}

impl RecordedEvent {
    /// The assignment pass the event belongs to.
    #[must_use]
    pub fn pass_index(&self) -> u64 {
        match self {
            Self::AssignBegin(e) => e.pass_index,
            Self::SquashingHost(e) => e.pass_index,
            Self::SquashingHostFinished(e) => e.pass_index,
            Self::AssignSummary(s) => s.pass_index,
            Self::Transition(e) => e.pass_index,
            Self::SquashingDisallowed(e) => e.pass_index,
            Self::Squashed(e) => e.pass_index,
            Self::PaintInvalidation(e) => e.pass_index,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
///
/// Iteration stops at the first unknown tag or truncated record.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_layer(&mut self) -> Option<LayerId> {
        Some(LayerId::from_raw_parts(self.read_u32()?, self.read_u32()?))
    }

    fn read_backing(&mut self) -> Option<BackingId> {
        Some(BackingId::from_raw_parts(self.read_u32()?, self.read_u32()?))
    }

    fn read_transition(&mut self) -> Option<CompositingStateTransition> {
        use CompositingStateTransition as T;
        Some(match self.read_u8()? {
            0 => T::NoChange,
            1 => T::AllocateOwnBacking,
            2 => T::RemoveOwnBacking,
            3 => T::PutInSquashingLayer,
            4 => T::RemoveFromSquashingLayer,
            _ => return None,
        })
    }

    fn read_invalidation_kind(&mut self) -> Option<InvalidationKind> {
        Some(match self.read_u8()? {
            0 => InvalidationKind::NewCompositedLayer,
            1 => InvalidationKind::AddedToSquashingLayer,
            2 => InvalidationKind::RemovedFromSquashingLayer,
            3 => InvalidationKind::ReflectionLayerChanged,
            _ => return None,
        })
    }

    fn decode_assign_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::AssignBegin(AssignBeginEvent {
            pass_index: self.read_u64()?,
            root: self.read_layer()?,
            squashing_enabled: self.read_bool()?,
        }))
    }

    fn decode_squashing_host(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SquashingHost(SquashingHostEvent {
            pass_index: self.read_u64()?,
            owner: self.read_layer()?,
            backing: self.read_backing()?,
        }))
    }

    fn decode_squashing_host_finished(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SquashingHostFinished(
            SquashingHostFinishedEvent {
                pass_index: self.read_u64()?,
                backing: self.read_backing()?,
                members: self.read_u32()?,
            },
        ))
    }

    fn decode_assign_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::AssignSummary(AssignSummary {
            pass_index: self.read_u64()?,
            visited: self.read_u32()?,
            allocated: self.read_u32()?,
            freed: self.read_u32()?,
            squashed: self.read_u32()?,
            disqualified: self.read_u32()?,
            invalidations: self.read_u32()?,
            changed: self.read_bool()?,
        }))
    }

    fn decode_transition(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Transition(TransitionEvent {
            pass_index: self.read_u64()?,
            layer: self.read_layer()?,
            transition: self.read_transition()?,
        }))
    }

    fn decode_squashing_disallowed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SquashingDisallowed(SquashingDisallowedEvent {
            pass_index: self.read_u64()?,
            layer: self.read_layer()?,
            reason: CompositingReasons::from_bits_retain(self.read_u64()?),
        }))
    }

    fn decode_squashed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Squashed(SquashedEvent {
            pass_index: self.read_u64()?,
            layer: self.read_layer()?,
            backing: self.read_backing()?,
            index: self.read_u32()?,
        }))
    }

    fn decode_paint_invalidation(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PaintInvalidation(PaintInvalidationEvent {
            pass_index: self.read_u64()?,
            layer: self.read_layer()?,
            kind: self.read_invalidation_kind()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_ASSIGN_BEGIN => self.decode_assign_begin(),
            TAG_SQUASHING_HOST => self.decode_squashing_host(),
            TAG_SQUASHING_HOST_FINISHED => self.decode_squashing_host_finished(),
            TAG_ASSIGN_SUMMARY => self.decode_assign_summary(),
            TAG_TRANSITION => self.decode_transition(),
            TAG_SQUASHING_DISALLOWED => self.decode_squashing_disallowed(),
            TAG_SQUASHED => self.decode_squashed(),
            TAG_PAINT_INVALIDATION => self.decode_paint_invalidation(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
