// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads events from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Frame events carry no timestamp of their own. Each frame is emitted as a
//! complete event anchored at the most recent tick before it (or zero when no
//! tick was recorded), on its own track so it does not overlap tick markers.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use easel_core::dirty::RedrawRegion;
use easel_core::time::Timebase;

use crate::recorder::RecordedEvent;

const TID_SCHEDULER: u32 = 0;
const TID_FRAMES: u32 = 1;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
pub fn export(
    recorded: &[RecordedEvent],
    timebase: Timebase,
    writer: &mut dyn Write,
) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut anchor = 0.0;

    for event in recorded {
        match event {
            RecordedEvent::Tick(e) => {
                anchor = ticks_to_us(e.now.ticks(), timebase);
                events.push(json!({
                    "ph": "i",
                    "name": "Tick",
                    "cat": "Scheduler",
                    "ts": anchor,
                    "pid": 0,
                    "tid": TID_SCHEDULER,
                    "s": "t",
                    "args": {
                        "tick_index": e.tick_index,
                        "delta_us": ticks_to_us(e.delta.ticks(), timebase),
                        "elapsed_us": ticks_to_us(e.elapsed.ticks(), timebase),
                    }
                }));
            }
            RecordedEvent::SchedulerTransition(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}->{:?}", e.from, e.to),
                    "cat": "Scheduler",
                    "ts": anchor,
                    "pid": 0,
                    "tid": TID_SCHEDULER,
                    "s": "g",
                    "args": {
                        "session": e.session,
                        "tick_index": e.tick_index,
                    }
                }));
            }
            RecordedEvent::TickFailure {
                tick_index,
                now,
                error,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "TickFailure",
                    "cat": "Error",
                    "ts": ticks_to_us(now.ticks(), timebase),
                    "pid": 0,
                    "tid": TID_SCHEDULER,
                    "s": "t",
                    "args": {
                        "tick_index": tick_index,
                        "error": error,
                    }
                }));
            }
            // Folded into the FrameEnd complete event.
            RecordedEvent::FrameBegin(_) => {}
            RecordedEvent::FrameSkipped { frame_index } => {
                events.push(json!({
                    "ph": "i",
                    "name": "FrameSkipped",
                    "cat": "Frame",
                    "ts": anchor,
                    "pid": 0,
                    "tid": TID_FRAMES,
                    "s": "t",
                    "args": {
                        "frame_index": frame_index,
                    }
                }));
            }
            RecordedEvent::FrameEnd(r) if r.skipped => {}
            RecordedEvent::FrameEnd(r) => {
                events.push(json!({
                    "ph": "X",
                    "name": "Frame",
                    "cat": "Frame",
                    "ts": anchor,
                    "dur": 0,
                    "pid": 0,
                    "tid": TID_FRAMES,
                    "args": {
                        "frame_index": r.frame_index,
                        "region": region_name(&r.region),
                        "full_clear": r.full_clear,
                        "painted": r.painted,
                        "blitted": r.blitted,
                        "culled": r.culled,
                        "hidden": r.hidden,
                        "failed": r.failed,
                    }
                }));
            }
            RecordedEvent::PaintFailure {
                frame_index,
                drawable,
                error,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "PaintFailure",
                    "cat": "Error",
                    "ts": anchor,
                    "pid": 0,
                    "tid": TID_FRAMES,
                    "s": "t",
                    "args": {
                        "frame_index": frame_index,
                        "drawable": format!("{drawable:?}"),
                        "error": error,
                    }
                }));
            }
            RecordedEvent::DrawableChangesCount { frame_index, count } => {
                events.push(json!({
                    "ph": "i",
                    "name": "DrawableChanges",
                    "cat": "Rich",
                    "ts": anchor,
                    "pid": 0,
                    "tid": TID_FRAMES,
                    "s": "p",
                    "args": {
                        "frame_index": frame_index,
                        "count": count,
                    }
                }));
            }
            RecordedEvent::Cache(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("Cache{:?}", e.kind),
                    "cat": "Rich",
                    "ts": anchor,
                    "pid": 0,
                    "tid": TID_FRAMES,
                    "s": "p",
                    "args": {
                        "frame_index": e.frame_index,
                        "drawable": format!("{:?}", e.drawable),
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn region_name(region: &RedrawRegion) -> Value {
    match region {
        RedrawRegion::Full => json!("full"),
        RedrawRegion::Partial(r) => json!([r.x0, r.y0, r.x1, r.y1]),
        RedrawRegion::Empty => json!("empty"),
    }
}

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}
