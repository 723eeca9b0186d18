// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Layer assignment carries no wall-clock time, so events are laid out on a
//! synthetic timeline: each recorded event advances the clock by one
//! microsecond, and each assignment pass becomes one `Assign` slice on its
//! own thread track.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for (ts, recorded) in (0_u64..).zip(decode(bytes)) {
        let tid = recorded.pass_index();
        match recorded {
            RecordedEvent::AssignBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": "Assign",
                    "cat": "Assign",
                    "ts": ts,
                    "pid": 0,
                    "tid": tid,
                    "args": {
                        "root": format!("{:?}", e.root),
                        "squashing_enabled": e.squashing_enabled,
                    }
                }));
            }
            RecordedEvent::AssignSummary(s) => {
                events.push(json!({
                    "ph": "E",
                    "name": "Assign",
                    "cat": "Assign",
                    "ts": ts,
                    "pid": 0,
                    "tid": tid,
                    "args": {
                        "visited": s.visited,
                        "allocated": s.allocated,
                        "freed": s.freed,
                        "squashed": s.squashed,
                        "disqualified": s.disqualified,
                        "invalidations": s.invalidations,
                        "changed": s.changed,
                    }
                }));
            }
            RecordedEvent::SquashingHost(e) => {
                events.push(instant(ts, tid, "SquashingHost", "Squashing", json!({
                    "owner": format!("{:?}", e.owner),
                    "backing": format!("{:?}", e.backing),
                })));
            }
            RecordedEvent::SquashingHostFinished(e) => {
                events.push(instant(ts, tid, "SquashingHostFinished", "Squashing", json!({
                    "backing": format!("{:?}", e.backing),
                    "members": e.members,
                })));
            }
            RecordedEvent::Transition(e) => {
                events.push(instant(ts, tid, e.transition.name(), "Transition", json!({
                    "layer": format!("{:?}", e.layer),
                })));
            }
            RecordedEvent::SquashingDisallowed(e) => {
                events.push(instant(ts, tid, "SquashingDisallowed", "Squashing", json!({
                    "layer": format!("{:?}", e.layer),
                    "reason": e.reason.to_string(),
                })));
            }
            RecordedEvent::Squashed(e) => {
                events.push(instant(ts, tid, "Squashed", "Squashing", json!({
                    "layer": format!("{:?}", e.layer),
                    "backing": format!("{:?}", e.backing),
                    "index": e.index,
                })));
            }
            RecordedEvent::PaintInvalidation(e) => {
                events.push(instant(ts, tid, e.kind.name(), "Invalidation", json!({
                    "layer": format!("{:?}", e.layer),
                })));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn instant(ts: u64, tid: u64, name: &str, cat: &str, args: Value) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": cat,
        "ts": ts,
        "pid": 0,
        "tid": tid,
        "s": "t",
        "args": args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use lamina_core::assign::CompositingStateTransition;
    use lamina_core::layer::LayerId;
    use lamina_core::trace::{AssignBeginEvent, AssignSummary, TraceSink, TransitionEvent};

    #[test]
    fn export_produces_valid_json() {
        let root = LayerId::from_raw_parts(0, 0);
        let mut rec = RecorderSink::new();
        rec.on_assign_begin(&AssignBeginEvent {
            pass_index: 3,
            root,
            squashing_enabled: true,
        });
        rec.on_transition(&TransitionEvent {
            pass_index: 3,
            layer: root,
            transition: CompositingStateTransition::AllocateOwnBacking,
        });
        rec.on_assign_summary(&AssignSummary {
            pass_index: 3,
            visited: 1,
            allocated: 1,
            changed: true,
            ..AssignSummary::default()
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        // Should parse as a JSON array.
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "Assign");
        assert_eq!(parsed[0]["tid"], 3);

        assert_eq!(parsed[1]["ph"], "i");
        assert_eq!(parsed[1]["name"], "AllocateOwnBacking");
        assert_eq!(parsed[1]["ts"], 1);

        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[2]["args"]["allocated"], 1);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
