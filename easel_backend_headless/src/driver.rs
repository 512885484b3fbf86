// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Blocking tick driver.
//!
//! [`run_ticks`] offers ticks to a [`Scheduler`] on the calling thread,
//! sleeping between them according to the scheduler's [`TimingStrategy`]:
//! fixed-interval sessions wake on the scheduler's deadline grid, and
//! frame-synced sessions use a nominal 60 Hz period. The loop ends when the
//! tick budget is spent or the session stops being live (stopped, paused, or
//! cancelled through a [`StopHandle`](easel_core::scheduler::StopHandle)).

use std::panic::{self, AssertUnwindSafe};

use easel_core::Error;
use easel_core::scheduler::{Scheduler, TickCallback, TickInfo, TickOutcome, TimingStrategy};
use easel_core::time::{Duration, HostTime};
use easel_core::trace::Tracer;

/// Period used for [`TimingStrategy::FrameSynced`] sessions, in nanoseconds.
pub const NOMINAL_FRAME_NANOS: u64 = 16_666_667;

/// What happened during a [`run_ticks`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks whose callback succeeded.
    pub delivered: u64,
    /// Ticks whose callback returned an error.
    pub failed: u64,
    /// Ticks the scheduler dropped.
    pub discarded: u64,
}

impl RunSummary {
    /// Total ticks offered.
    #[must_use]
    pub const fn offered(&self) -> u64 {
        self.delivered + self.failed + self.discarded
    }
}

/// Drives `scheduler` with the wall clock for at most `max_ticks` ticks.
pub fn run_ticks(scheduler: &mut Scheduler, max_ticks: u64) -> RunSummary {
    run_ticks_with(
        scheduler,
        max_ticks,
        crate::now,
        |d| std::thread::sleep(std::time::Duration::from_nanos(d.ticks())),
        &mut Tracer::none(),
    )
}

/// Like [`run_ticks`], with an injectable clock and sleep, reporting to
/// `tracer`.
///
/// `now` and `sleep` must share a nanosecond timebase.
pub fn run_ticks_with(
    scheduler: &mut Scheduler,
    max_ticks: u64,
    mut now: impl FnMut() -> HostTime,
    mut sleep: impl FnMut(Duration),
    tracer: &mut Tracer<'_>,
) -> RunSummary {
    let token = scheduler.token();
    let mut summary = RunSummary::default();

    while summary.offered() < max_ticks && scheduler.is_running() {
        match scheduler.tick_traced(token, now(), tracer) {
            TickOutcome::Delivered => summary.delivered += 1,
            TickOutcome::Failed => summary.failed += 1,
            TickOutcome::Discarded => summary.discarded += 1,
        }
        if summary.offered() >= max_ticks || !scheduler.is_running() {
            break;
        }

        let wait = match scheduler.timing() {
            TimingStrategy::FixedInterval(_) => {
                let t = now();
                scheduler
                    .next_tick_at(t)
                    .map_or(Duration::ZERO, |deadline| {
                        deadline.saturating_duration_since(t)
                    })
            }
            TimingStrategy::FrameSynced => Duration(NOMINAL_FRAME_NANOS),
        };
        if !wait.is_zero() {
            sleep(wait);
        }
    }

    tracing::debug!(
        delivered = summary.delivered,
        failed = summary.failed,
        discarded = summary.discarded,
        "tick run finished"
    );
    summary
}

/// Wraps a callback so that a panic inside it becomes a
/// [`TickFailure`](Error::TickFailure) instead of unwinding through the
/// scheduler.
pub fn catch_panics(
    mut callback: impl FnMut(&TickInfo) -> easel_core::Result<()> + 'static,
) -> TickCallback {
    Box::new(
        move |info| match panic::catch_unwind(AssertUnwindSafe(|| callback(info))) {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_owned());
                tracing::warn!(tick = info.tick_index, %message, "tick callback panicked");
                Err(Error::tick(format!("panicked: {message}")))
            }
        },
    )
}
