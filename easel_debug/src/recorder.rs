// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and keeps every event as an
//! owned [`RecordedEvent`]. Failure events borrow their error, so the
//! recorder stores its message instead. Per-drawable change lists are
//! reduced to a count.

use easel_core::dirty::DrawableChanges;
use easel_core::frame::FrameReport;
use easel_core::registry::DrawableId;
use easel_core::time::HostTime;
use easel_core::trace::{
    CacheEvent, FrameBeginEvent, PaintFailureEvent, SchedulerTransitionEvent, TickEvent,
    TickFailureEvent, TraceSink,
};

/// A recorded trace event.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A tick was delivered.
    Tick(TickEvent),
    /// The scheduler changed state.
    SchedulerTransition(SchedulerTransitionEvent),
    /// A tick callback failed.
    TickFailure {
        /// Index of the failed tick.
        tick_index: u64,
        /// Host time of the tick.
        now: HostTime,
        /// Rendered error message.
        error: String,
    },
    /// A frame started executing.
    FrameBegin(FrameBeginEvent),
    /// A frame was skipped because nothing was dirty.
    FrameSkipped {
        /// Frame counter.
        frame_index: u64,
    },
    /// A frame finished.
    FrameEnd(FrameReport),
    /// A drawable failed to paint.
    PaintFailure {
        /// Frame counter.
        frame_index: u64,
        /// The drawable that failed.
        drawable: DrawableId,
        /// Rendered error message.
        error: String,
    },
    /// Number of drawables that changed before a frame.
    DrawableChangesCount {
        /// Frame counter.
        frame_index: u64,
        /// Total entries across all change channels.
        count: usize,
    },
    /// A cache entry was stored, blitted or discarded.
    Cache(CacheEvent),
}

/// A [`TraceSink`] that stores events in memory.
#[derive(Debug, Default)]
pub struct RecorderSink {
    events: Vec<RecordedEvent>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Consumes the recorder and returns the events.
    #[must_use]
    pub fn into_events(self) -> Vec<RecordedEvent> {
        self.events
    }

    /// Discards everything recorded so far.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Counts recorded failures (paint and tick).
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    RecordedEvent::PaintFailure { .. } | RecordedEvent::TickFailure { .. }
                )
            })
            .count()
    }
}

impl TraceSink for RecorderSink {
    fn on_tick(&mut self, e: &TickEvent) {
        self.events.push(RecordedEvent::Tick(*e));
    }

    fn on_scheduler_transition(&mut self, e: &SchedulerTransitionEvent) {
        self.events.push(RecordedEvent::SchedulerTransition(*e));
    }

    fn on_tick_failure(&mut self, e: &TickFailureEvent<'_>) {
        self.events.push(RecordedEvent::TickFailure {
            tick_index: e.tick_index,
            now: e.now,
            error: e.error.to_string(),
        });
    }

    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.events.push(RecordedEvent::FrameBegin(*e));
    }

    fn on_frame_skipped(&mut self, frame_index: u64) {
        self.events.push(RecordedEvent::FrameSkipped { frame_index });
    }

    fn on_frame_end(&mut self, report: &FrameReport) {
        self.events.push(RecordedEvent::FrameEnd(report.clone()));
    }

    fn on_paint_failure(&mut self, e: &PaintFailureEvent<'_>) {
        self.events.push(RecordedEvent::PaintFailure {
            frame_index: e.frame_index,
            drawable: e.drawable,
            error: e.error.to_string(),
        });
    }

    fn on_drawable_changes(&mut self, frame_index: u64, changes: &DrawableChanges) {
        let count = changes.painted.len()
            + changes.moved.len()
            + changes.reordered.len()
            + changes.membership.len();
        self.events
            .push(RecordedEvent::DrawableChangesCount { frame_index, count });
    }

    fn on_cache_event(&mut self, e: &CacheEvent) {
        self.events.push(RecordedEvent::Cache(*e));
    }
}
