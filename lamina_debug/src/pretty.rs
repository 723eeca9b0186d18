// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use lamina_core::trace::{
    AssignBeginEvent, AssignSummary, PaintInvalidationEvent, SquashedEvent,
    SquashingDisallowedEvent, SquashingHostEvent, SquashingHostFinishedEvent, TraceSink,
    TransitionEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_assign_begin(&mut self, e: &AssignBeginEvent) {
        let squashing = if e.squashing_enabled { "on" } else { "off" };
        let _ = writeln!(
            self.writer,
            "[assign] pass={} root={:?} squashing={squashing}",
            e.pass_index, e.root,
        );
    }

    fn on_squashing_host(&mut self, e: &SquashingHostEvent) {
        let _ = writeln!(
            self.writer,
            "[host] pass={} owner={:?} backing={:?}",
            e.pass_index, e.owner, e.backing,
        );
    }

    fn on_squashing_host_finished(&mut self, e: &SquashingHostFinishedEvent) {
        let _ = writeln!(
            self.writer,
            "[host:done] pass={} backing={:?} members={}",
            e.pass_index, e.backing, e.members,
        );
    }

    fn on_assign_summary(&mut self, s: &AssignSummary) {
        let changed = if s.changed { "changed" } else { "clean" };
        let _ = writeln!(
            self.writer,
            "[summary] pass={} visited={} allocated={} freed={} squashed={} \
             disqualified={} invalidations={} {changed}",
            s.pass_index,
            s.visited,
            s.allocated,
            s.freed,
            s.squashed,
            s.disqualified,
            s.invalidations,
        );
    }

    fn on_transition(&mut self, e: &TransitionEvent) {
        let _ = writeln!(
            self.writer,
            "[transition] pass={} layer={:?} {}",
            e.pass_index, e.layer, e.transition,
        );
    }

    fn on_squashing_disallowed(&mut self, e: &SquashingDisallowedEvent) {
        let _ = writeln!(
            self.writer,
            "[disallowed] pass={} layer={:?} reason={}",
            e.pass_index, e.layer, e.reason,
        );
    }

    fn on_squashed(&mut self, e: &SquashedEvent) {
        let _ = writeln!(
            self.writer,
            "[squashed] pass={} layer={:?} backing={:?} index={}",
            e.pass_index, e.layer, e.backing, e.index,
        );
    }

    fn on_paint_invalidation(&mut self, e: &PaintInvalidationEvent) {
        let _ = writeln!(
            self.writer,
            "[invalidate] pass={} layer={:?} {}",
            e.pass_index,
            e.layer,
            e.kind.name(),
        );
    }
}

#[cfg(test)]
mod tests {
    use lamina_core::layer::LayerId;
    use lamina_core::reasons::CompositingReasons;

    use super::*;

    #[test]
    fn pretty_print_begin() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_assign_begin(&AssignBeginEvent {
            pass_index: 1,
            root: LayerId::from_raw_parts(0, 0),
            squashing_enabled: true,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[assign]"), "got: {output}");
        assert!(output.contains("pass=1"), "got: {output}");
        assert!(output.contains("squashing=on"), "got: {output}");
    }

    #[test]
    fn pretty_print_disallowed_reason() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_squashing_disallowed(&SquashingDisallowedEvent {
            pass_index: 2,
            layer: LayerId::from_raw_parts(4, 0),
            reason: CompositingReasons::SQUASHING_VIDEO_IS_DISALLOWED,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.starts_with("[disallowed] pass=2"), "got: {output}");
        assert!(
            output.contains(&CompositingReasons::SQUASHING_VIDEO_IS_DISALLOWED.to_string()),
            "got: {output}"
        );
    }
}
