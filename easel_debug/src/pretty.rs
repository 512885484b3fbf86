// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to milliseconds using a [`Timebase`].

use std::io::Write;

use easel_core::dirty::{DrawableChanges, RedrawRegion};
use easel_core::frame::FrameReport;
use easel_core::time::{HostTime, Timebase};
use easel_core::trace::{
    CacheEvent, FrameBeginEvent, PaintFailureEvent, SchedulerTransitionEvent, TickEvent,
    TickFailureEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            timebase,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    /// Consumes the sink, returning the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn ms(&self, ticks: u64) -> f64 {
        self.timebase.ticks_to_nanos(ticks) as f64 / 1_000_000.0
    }

    fn host_ms(&self, t: HostTime) -> f64 {
        self.ms(t.ticks())
    }
}

fn region(r: &RedrawRegion) -> String {
    match r {
        RedrawRegion::Full => "full".into(),
        RedrawRegion::Partial(rect) => format!(
            "({:.1},{:.1})-({:.1},{:.1})",
            rect.x0, rect.y0, rect.x1, rect.y1
        ),
        RedrawRegion::Empty => "empty".into(),
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_tick(&mut self, e: &TickEvent) {
        let _ = writeln!(
            self.writer,
            "[tick] #{} now={:.3}ms delta={:.3}ms elapsed={:.3}ms",
            e.tick_index,
            self.host_ms(e.now),
            self.ms(e.delta.ticks()),
            self.ms(e.elapsed.ticks()),
        );
    }

    fn on_scheduler_transition(&mut self, e: &SchedulerTransitionEvent) {
        let _ = writeln!(
            self.writer,
            "[scheduler] {:?} -> {:?} session={} ticks={}",
            e.from, e.to, e.session, e.tick_index,
        );
    }

    fn on_tick_failure(&mut self, e: &TickFailureEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[tick:FAILED] #{} at {:.3}ms: {}",
            e.tick_index,
            self.host_ms(e.now),
            e.error,
        );
    }

    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[frame:begin] frame={} region={} clear={}",
            e.frame_index,
            region(&e.region),
            if e.full_clear { "full" } else { "partial" },
        );
    }

    fn on_frame_skipped(&mut self, frame_index: u64) {
        let _ = writeln!(self.writer, "[frame:skip] frame={frame_index}");
    }

    fn on_frame_end(&mut self, r: &FrameReport) {
        if r.skipped {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[frame:end] frame={} painted={} blitted={} culled={} hidden={} failed={}",
            r.frame_index, r.painted, r.blitted, r.culled, r.hidden, r.failed,
        );
    }

    fn on_paint_failure(&mut self, e: &PaintFailureEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[paint:FAILED] frame={} drawable={:?}: {}",
            e.frame_index, e.drawable, e.error,
        );
    }

    fn on_drawable_changes(&mut self, frame_index: u64, changes: &DrawableChanges) {
        if changes.is_empty() {
            return;
        }
        let _ = writeln!(
            self.writer,
            "  [changes] frame={} painted={:?} moved={:?} reordered={:?} membership={:?}",
            frame_index, changes.painted, changes.moved, changes.reordered, changes.membership,
        );
    }

    fn on_cache_event(&mut self, e: &CacheEvent) {
        let _ = writeln!(
            self.writer,
            "  [cache] frame={} drawable={:?} {:?}",
            e.frame_index, e.drawable, e.kind,
        );
    }
}
