// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the tick and frame loops.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [`Scheduler`](crate::scheduler::Scheduler) and
//! [`Renderer`](crate::frame::Renderer) call at each stage. All method bodies
//! default to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. Two classes of event go
//! through it:
//!
//! - **Informational** (ticks, transitions, frame begin/skip/end). When the
//!   `trace` feature is **off**, these methods compile to nothing. When **on**,
//!   each performs a single `Option` branch before dispatching.
//! - **Failures** ([`PaintFailureEvent`], [`TickFailureEvent`]). These are the
//!   error-reporting channel for recovered runtime failures and are dispatched
//!   regardless of features.
//!
//! # Crate features
//!
//! - `trace`: enables the informational `Tracer` method bodies.
//! - `trace-rich` (implies `trace`): adds per-frame [`DrawableChanges`] and
//!   [`CacheEvent`]s plus the corresponding `TraceSink` methods.

use crate::dirty::RedrawRegion;
#[cfg(feature = "trace-rich")]
use crate::dirty::DrawableChanges;
use crate::error::Error;
use crate::frame::FrameReport;
use crate::registry::DrawableId;
use crate::scheduler::{SchedulerState, TickInfo};
use crate::time::{Duration, HostTime};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when the scheduler delivers a tick, before the callback runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickEvent {
    /// Zero-based index within the session.
    pub tick_index: u64,
    /// Host time of the tick.
    pub now: HostTime,
    /// Delta passed to the callback.
    pub delta: Duration,
    /// Elapsed session time.
    pub elapsed: Duration,
}

impl From<&TickInfo> for TickEvent {
    fn from(info: &TickInfo) -> Self {
        Self {
            tick_index: info.tick_index,
            now: info.now,
            delta: info.delta,
            elapsed: info.elapsed,
        }
    }
}

/// Emitted on every scheduler state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerTransitionEvent {
    /// Previous state.
    pub from: SchedulerState,
    /// New state.
    pub to: SchedulerState,
    /// Session number (see [`TickToken`](crate::scheduler::TickToken)).
    pub session: u64,
    /// Ticks delivered in the session so far.
    pub tick_index: u64,
}

/// Emitted when a frame starts executing (after the dirty check).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Region consumed from the dirty tracker.
    pub region: RedrawRegion,
    /// Whether the full surface is cleared.
    pub full_clear: bool,
}

/// Emitted when a drawable's paint call fails.
#[derive(Clone, Copy, Debug)]
pub struct PaintFailureEvent<'a> {
    /// Frame counter.
    pub frame_index: u64,
    /// The drawable that failed.
    pub drawable: DrawableId,
    /// The error it returned.
    pub error: &'a Error,
}

/// Emitted when a tick callback fails.
#[derive(Clone, Copy, Debug)]
pub struct TickFailureEvent<'a> {
    /// Index of the failed tick.
    pub tick_index: u64,
    /// Host time of the tick.
    pub now: HostTime,
    /// The error the callback returned.
    pub error: &'a Error,
}

/// What happened to a cache entry.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheEventKind {
    /// A bitmap was painted and stored.
    Stored,
    /// A cached bitmap was blitted instead of repainting.
    Blitted,
    /// An entry was discarded (stale, removed, or explicit).
    Discarded,
}

/// A per-frame cache event.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheEvent {
    /// Frame counter (the next frame to execute, for entries touched between
    /// frames).
    pub frame_index: u64,
    /// The drawable.
    pub drawable: DrawableId,
    /// What happened.
    pub kind: CacheEventKind,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the tick and frame loops.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a tick is delivered.
    fn on_tick(&mut self, e: &TickEvent) {
        _ = e;
    }

    /// Called when the scheduler changes state.
    fn on_scheduler_transition(&mut self, e: &SchedulerTransitionEvent) {
        _ = e;
    }

    /// Called when a tick callback fails.
    fn on_tick_failure(&mut self, e: &TickFailureEvent<'_>) {
        _ = e;
    }

    /// Called when a frame starts executing.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called when `render()` finds nothing dirty.
    fn on_frame_skipped(&mut self, frame_index: u64) {
        _ = frame_index;
    }

    /// Called when a frame finishes.
    fn on_frame_end(&mut self, report: &FrameReport) {
        _ = report;
    }

    /// Called when a drawable fails to paint.
    fn on_paint_failure(&mut self, e: &PaintFailureEvent<'_>) {
        _ = e;
    }

    /// Called with the drawables that changed since the previous frame
    /// (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_drawable_changes(&mut self, frame_index: u64, changes: &DrawableChanges) {
        _ = (frame_index, changes);
    }

    /// Called when a cache entry is stored, blitted or discarded (requires
    /// `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_cache_event(&mut self, e: &CacheEvent) {
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
/// Informational methods compile to nothing without the `trace` feature.
/// Failure methods always dispatch.
pub struct Tracer<'a> {
    sink: Option<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer")
            .field("attached", &self.sink.is_some())
            .finish()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        Self { sink: Some(sink) }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self { sink: None }
    }

    /// Emits a [`TickEvent`].
    #[inline]
    pub fn tick(&mut self, e: &TickEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_tick(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SchedulerTransitionEvent`].
    #[inline]
    pub fn scheduler_transition(&mut self, e: &SchedulerTransitionEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_scheduler_transition(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameBeginEvent`].
    #[inline]
    pub fn frame_begin(&mut self, e: &FrameBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a skipped-frame event.
    #[inline]
    pub fn frame_skipped(&mut self, frame_index: u64) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_skipped(frame_index);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = frame_index;
        }
    }

    /// Emits a frame-end event.
    #[inline]
    pub fn frame_end(&mut self, report: &FrameReport) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_end(report);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = report;
        }
    }

    /// Reports a [`PaintFailureEvent`]. Always dispatched.
    #[inline]
    pub fn paint_failure(&mut self, e: &PaintFailureEvent<'_>) {
        if let Some(s) = &mut self.sink {
            s.on_paint_failure(e);
        }
    }

    /// Reports a [`TickFailureEvent`]. Always dispatched.
    #[inline]
    pub fn tick_failure(&mut self, e: &TickFailureEvent<'_>) {
        if let Some(s) = &mut self.sink {
            s.on_tick_failure(e);
        }
    }

    /// Emits per-frame drawable changes (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn drawable_changes(&mut self, frame_index: u64, changes: &DrawableChanges) {
        if let Some(s) = &mut self.sink {
            s.on_drawable_changes(frame_index, changes);
        }
    }

    /// Emits a [`CacheEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn cache_event(&mut self, e: &CacheEvent) {
        if let Some(s) = &mut self.sink {
            s.on_cache_event(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
