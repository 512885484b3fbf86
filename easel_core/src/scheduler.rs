// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tick scheduling state machine.
//!
//! The [`Scheduler`] turns host timing callbacks into serialized tick
//! deliveries with monotonic deltas. It knows nothing about drawables and
//! never reads a clock: hosts pass the current [`HostTime`] into every call,
//! and choose *when* to call [`tick`](Scheduler::tick) according to the
//! injected [`TimingStrategy`].
//!
//! ```text
//!            start()              pause()
//!   Idle ──────────────► Running ─────────► Paused
//!    ▲                    │   ▲               │
//!    │       stop()       │   └── resume() ───┘
//!    └────────────────────┴───────────────────┘
//! ```
//!
//! # Cancellation
//!
//! Each session is identified by a [`TickToken`]. A host captures the token
//! when it starts the scheduler and hands it back with every tick. `stop()`
//! retires the token, so a tick that was already queued in the host's timer
//! or frame-callback machinery is [`Discarded`](TickOutcome::Discarded) on
//! arrival. No callback runs after `stop()` returns.
//!
//! The tick callback cannot reach the scheduler (it is mutably borrowed during
//! delivery); a [`StopHandle`] cancels the session from inside the callback or
//! from another thread. The epoch is checked again immediately before the
//! callback runs, so no tick *starts* after a handle's `stop()` returns. A
//! callback that had already started when another thread stopped the handle
//! finishes, and the session ends as soon as it returns.
//!
//! # Failures
//!
//! A callback returning an error is logged, reported to the trace sink as a
//! [`TickFailureEvent`], and counted. The session keeps running.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::time::{Duration, HostTime};
use crate::trace::{SchedulerTransitionEvent, TickEvent, TickFailureEvent, Tracer};

/// How a host paces ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimingStrategy {
    /// Tick once per display frame (`requestAnimationFrame` or an equivalent
    /// vsync signal; headless hosts use a nominal 60 Hz).
    FrameSynced,
    /// Tick at a fixed interval.
    FixedInterval(Duration),
}

/// Configuration for the [`Scheduler`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulerConfig {
    /// Tick pacing.
    pub timing: TimingStrategy,
    /// Upper bound on a single tick's delta, or `None` for no clamp.
    ///
    /// Long gaps (a backgrounded tab, a debugger pause) otherwise arrive as one
    /// huge step.
    pub max_delta: Option<Duration>,
    /// EMA factor for [`TickInfo::smoothed_delta`], in `(0, 1]`. Smaller
    /// values smooth more.
    pub smoothing: f32,
}

impl SchedulerConfig {
    /// Frame-synced pacing with no delta clamp.
    #[must_use]
    pub const fn frame_synced() -> Self {
        Self {
            timing: TimingStrategy::FrameSynced,
            max_delta: None,
            smoothing: 0.1,
        }
    }

    /// Fixed-interval pacing with no delta clamp.
    #[must_use]
    pub const fn fixed_interval(interval: Duration) -> Self {
        Self {
            timing: TimingStrategy::FixedInterval(interval),
            max_delta: None,
            smoothing: 0.1,
        }
    }

    /// Sets [`max_delta`](Self::max_delta).
    #[must_use]
    pub const fn with_max_delta(mut self, max_delta: Duration) -> Self {
        self.max_delta = Some(max_delta);
        self
    }

    /// Sets [`smoothing`](Self::smoothing).
    #[must_use]
    pub const fn with_smoothing(mut self, smoothing: f32) -> Self {
        self.smoothing = smoothing;
        self
    }

    /// Checks the configuration.
    ///
    /// Rejects a zero fixed interval, a zero `max_delta`, and a smoothing
    /// factor outside `(0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if let TimingStrategy::FixedInterval(interval) = self.timing
            && interval.is_zero()
        {
            return Err(Error::invalid("fixed tick interval must be positive"));
        }
        if self.max_delta.is_some_and(Duration::is_zero) {
            return Err(Error::invalid("max_delta must be positive"));
        }
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(Error::invalid(alloc::format!(
                "smoothing factor {} is outside (0, 1]",
                self.smoothing
            )));
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::frame_synced()
    }
}

/// Scheduler lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    /// Not started, or stopped.
    Idle,
    /// Delivering ticks.
    Running,
    /// Started but suspended; ticks are discarded and paused time is not
    /// counted.
    Paused,
}

/// What a tick callback receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickInfo {
    /// Zero-based index of this delivery within the session.
    pub tick_index: u64,
    /// Host time passed to [`Scheduler::tick`].
    pub now: HostTime,
    /// Time since the previous tick (or since start/resume), never negative,
    /// clamped to [`SchedulerConfig::max_delta`].
    pub delta: Duration,
    /// Sum of all deltas in the session (paused time excluded).
    pub elapsed: Duration,
    /// Exponential moving average of `delta`.
    pub smoothed_delta: Duration,
}

/// Result of offering a tick to the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickOutcome {
    /// The callback ran and succeeded.
    Delivered,
    /// The callback ran and returned an error (already reported).
    Failed,
    /// The tick was dropped: stale token, stopped, or paused.
    Discarded,
}

impl TickOutcome {
    /// Returns `true` if the callback ran.
    #[must_use]
    pub const fn ran(self) -> bool {
        matches!(self, Self::Delivered | Self::Failed)
    }
}

/// Identifies a scheduler session. Retired by `stop()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickToken(u64);

impl TickToken {
    /// The raw session number.
    #[must_use]
    pub const fn session(self) -> u64 {
        self.0
    }
}

/// Cancels one scheduler session from anywhere.
///
/// Cloneable, `Send` and `Sync`. Stopping through a handle whose session has
/// already ended does nothing.
#[derive(Clone, Debug)]
pub struct StopHandle {
    epoch: Arc<AtomicU64>,
    session: u64,
}

impl StopHandle {
    /// Ends the session. Once this returns, no further callback starts. A
    /// callback already running on another thread completes first.
    pub fn stop(&self) {
        _ = self.epoch.compare_exchange(
            self.session,
            self.session.wrapping_add(1),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Returns `true` once the session has ended.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.epoch.load(Ordering::Acquire) != self.session
    }
}

/// Exponential moving average tracker.
#[derive(Clone, Copy, Debug)]
struct Ema {
    value: f32,
    alpha: f32,
    initialized: bool,
}

impl Ema {
    const fn new(alpha: f32) -> Self {
        Self {
            value: 0.0,
            alpha,
            initialized: false,
        }
    }

    fn update(&mut self, sample: f32) {
        if self.initialized {
            self.value = self.alpha * sample + (1.0 - self.alpha) * self.value;
        } else {
            self.value = sample;
            self.initialized = true;
        }
    }

    const fn get(&self) -> f32 {
        self.value
    }
}

/// The tick callback type.
pub type TickCallback = Box<dyn FnMut(&TickInfo) -> Result<()>>;

/// Host-agnostic tick scheduler.
///
/// # Usage
///
/// ```rust,ignore
/// let mut scheduler = Scheduler::new(SchedulerConfig::frame_synced())?;
/// let token = scheduler.start(Box::new(|tick| step(tick.delta)), now());
/// // In the host's frame callback:
/// scheduler.tick(token, now());
/// ```
pub struct Scheduler {
    config: SchedulerConfig,
    state: SchedulerState,
    callback: Option<TickCallback>,
    epoch: Arc<AtomicU64>,
    session: u64,

    // -- Timing --
    baseline: HostTime,
    last_tick: HostTime,
    paused_at: HostTime,
    elapsed: Duration,
    smoothed: Ema,

    // -- Counters --
    tick_index: u64,
    failures: u64,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("session", &self.session)
            .field("last_tick", &self.last_tick)
            .field("elapsed", &self.elapsed)
            .field("tick_index", &self.tick_index)
            .field("failures", &self.failures)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Creates an idle scheduler. Fails with [`Error::InvalidArgument`] if the
    /// configuration does not [validate](SchedulerConfig::validate).
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: SchedulerState::Idle,
            callback: None,
            epoch: Arc::new(AtomicU64::new(0)),
            session: 0,
            baseline: HostTime(0),
            last_tick: HostTime(0),
            paused_at: HostTime(0),
            elapsed: Duration::ZERO,
            smoothed: Ema::new(config.smoothing),
            tick_index: 0,
            failures: 0,
        })
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The tick pacing hosts should follow.
    #[must_use]
    pub fn timing(&self) -> TimingStrategy {
        self.config.timing
    }

    /// The current state, accounting for stops requested through a
    /// [`StopHandle`].
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        if self.remote_stopped() {
            SchedulerState::Idle
        } else {
            self.state
        }
    }

    /// Returns `true` while running (not paused).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    /// The current session token. Only meaningful while not idle.
    #[must_use]
    pub fn token(&self) -> TickToken {
        TickToken(self.session)
    }

    /// Returns a handle that stops the current (or next) session.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            epoch: Arc::clone(&self.epoch),
            session: self.epoch.load(Ordering::Acquire),
        }
    }

    /// Number of ticks delivered in the current session.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_index
    }

    /// Number of failed callbacks since construction.
    #[must_use]
    pub fn failure_count(&self) -> u64 {
        self.failures
    }

    /// Time accumulated in the current session, paused time excluded.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Starts a session. See [`start_traced`](Self::start_traced).
    pub fn start(&mut self, callback: TickCallback, now: HostTime) -> TickToken {
        self.start_traced(callback, now, &mut Tracer::none())
    }

    /// Starts a session with `now` as its baseline and returns its token.
    ///
    /// The host should deliver the first tick right away. Starting a
    /// scheduler that is already running or paused does nothing and returns
    /// the current token; `callback` is dropped.
    pub fn start_traced(
        &mut self,
        callback: TickCallback,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> TickToken {
        self.observe_remote_stop(tracer);
        if self.state != SchedulerState::Idle {
            tracing::debug!(session = self.session, "scheduler already started");
            return self.token();
        }
        self.session = self.epoch.load(Ordering::Acquire);
        self.callback = Some(callback);
        self.baseline = now;
        self.last_tick = now;
        self.elapsed = Duration::ZERO;
        self.smoothed = Ema::new(self.config.smoothing);
        self.tick_index = 0;
        self.transition(SchedulerState::Running, tracer);
        self.token()
    }

    /// Stops the session. See [`stop_traced`](Self::stop_traced).
    pub fn stop(&mut self) {
        self.stop_traced(&mut Tracer::none());
    }

    /// Stops the session and retires its token.
    ///
    /// Once this returns no callback runs for the session, even for ticks the
    /// host had already queued. Stopping an idle scheduler does nothing.
    pub fn stop_traced(&mut self, tracer: &mut Tracer<'_>) {
        self.observe_remote_stop(tracer);
        if self.state == SchedulerState::Idle {
            return;
        }
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.end_session(tracer);
    }

    /// Suspends delivery. See [`pause_traced`](Self::pause_traced).
    pub fn pause(&mut self, now: HostTime) {
        self.pause_traced(now, &mut Tracer::none());
    }

    /// Suspends delivery. Time from `now` until [`resume`](Self::resume) is not
    /// counted in any delta. Only valid while running; otherwise does nothing.
    pub fn pause_traced(&mut self, now: HostTime, tracer: &mut Tracer<'_>) {
        self.observe_remote_stop(tracer);
        if self.state != SchedulerState::Running {
            return;
        }
        self.paused_at = now;
        self.transition(SchedulerState::Paused, tracer);
    }

    /// Resumes delivery. See [`resume_traced`](Self::resume_traced).
    pub fn resume(&mut self, now: HostTime) {
        self.resume_traced(now, &mut Tracer::none());
    }

    /// Resumes delivery, rebasing the timeline by the paused span. Only valid
    /// while paused; otherwise does nothing.
    pub fn resume_traced(&mut self, now: HostTime, tracer: &mut Tracer<'_>) {
        self.observe_remote_stop(tracer);
        if self.state != SchedulerState::Paused {
            return;
        }
        let paused = now.saturating_duration_since(self.paused_at);
        self.last_tick = self.last_tick.saturating_add(paused);
        self.baseline = self.baseline.saturating_add(paused);
        self.transition(SchedulerState::Running, tracer);
    }

    /// Offers a tick. See [`tick_traced`](Self::tick_traced).
    pub fn tick(&mut self, token: TickToken, now: HostTime) -> TickOutcome {
        self.tick_traced(token, now, &mut Tracer::none())
    }

    /// Offers a tick at host time `now`.
    ///
    /// Discarded unless `token` is the live session and the scheduler is
    /// running. Otherwise computes the delta since the previous tick (zero if
    /// the host clock went backwards, clamped to `max_delta`) and runs the
    /// callback. Ticks are serialized by construction: this takes `&mut self`.
    pub fn tick_traced(
        &mut self,
        token: TickToken,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> TickOutcome {
        self.observe_remote_stop(tracer);
        if self.state != SchedulerState::Running || token.0 != self.session {
            return TickOutcome::Discarded;
        }

        let raw = now.saturating_duration_since(self.last_tick);
        let delta = match self.config.max_delta {
            Some(max) if raw > max => max,
            _ => raw,
        };
        let mut smoothed = self.smoothed;
        smoothed.update(delta.ticks() as f32);
        let info = TickInfo {
            tick_index: self.tick_index,
            now,
            delta,
            elapsed: self.elapsed.saturating_add(delta),
            smoothed_delta: Duration(ema_ticks(smoothed.get())),
        };

        // Last chance for a StopHandle on another thread; nothing is
        // committed yet.
        self.observe_remote_stop(tracer);
        if self.state != SchedulerState::Running {
            return TickOutcome::Discarded;
        }
        let Some(callback) = self.callback.as_mut() else {
            return TickOutcome::Discarded;
        };

        if now > self.last_tick {
            self.last_tick = now;
        }
        self.elapsed = info.elapsed;
        self.smoothed = smoothed;
        self.tick_index += 1;
        tracer.tick(&TickEvent::from(&info));
        let outcome = match callback(&info) {
            Ok(()) => TickOutcome::Delivered,
            Err(err) => {
                self.failures += 1;
                tracing::warn!(tick = info.tick_index, %err, "tick callback failed");
                tracer.tick_failure(&TickFailureEvent {
                    tick_index: info.tick_index,
                    now,
                    error: &err,
                });
                TickOutcome::Failed
            }
        };

        // The callback may have stopped the session through a StopHandle.
        self.observe_remote_stop(tracer);
        outcome
    }

    /// The deadline for the next fixed-interval tick strictly after `now`.
    ///
    /// Deadlines sit on the grid `baseline + n * interval`, so lateness never
    /// accumulates; a host that overslept skips the missed slots. Returns
    /// `None` for frame-synced pacing or when not running.
    #[must_use]
    pub fn next_tick_at(&self, now: HostTime) -> Option<HostTime> {
        let TimingStrategy::FixedInterval(interval) = self.config.timing else {
            return None;
        };
        if self.state() != SchedulerState::Running || interval.is_zero() {
            return None;
        }
        let since = now.saturating_duration_since(self.baseline).ticks();
        let slots = since / interval.ticks() + 1;
        self.baseline
            .checked_add(Duration(slots.saturating_mul(interval.ticks())))
    }

    // -- Internals --

    fn remote_stopped(&self) -> bool {
        self.state != SchedulerState::Idle && self.epoch.load(Ordering::Acquire) != self.session
    }

    fn observe_remote_stop(&mut self, tracer: &mut Tracer<'_>) {
        if self.remote_stopped() {
            self.end_session(tracer);
        }
    }

    fn end_session(&mut self, tracer: &mut Tracer<'_>) {
        self.callback = None;
        self.transition(SchedulerState::Idle, tracer);
    }

    fn transition(&mut self, to: SchedulerState, tracer: &mut Tracer<'_>) {
        let from = self.state;
        self.state = to;
        tracing::debug!(?from, ?to, session = self.session, "scheduler transition");
        tracer.scheduler_transition(&SchedulerTransitionEvent {
            from,
            to,
            session: self.session,
            tick_index: self.tick_index,
        });
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "float-to-int casts saturate; the average of u64 samples fits"
)]
fn ema_ticks(value: f32) -> u64 {
    if value <= 0.0 { 0 } else { value as u64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    fn recorder() -> (Rc<RefCell<Vec<TickInfo>>>, TickCallback) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let cb: TickCallback = Box::new(move |info| {
            sink.borrow_mut().push(*info);
            Ok(())
        });
        (log, cb)
    }

    fn scheduler() -> Scheduler {
        Scheduler::new(SchedulerConfig::frame_synced()).unwrap()
    }

    #[test]
    fn config_validation() {
        assert!(SchedulerConfig::frame_synced().validate().is_ok());
        assert!(matches!(
            Scheduler::new(SchedulerConfig::fixed_interval(Duration::ZERO)),
            Err(Error::InvalidArgument(_))
        ));
        assert!(
            SchedulerConfig::frame_synced()
                .with_max_delta(Duration::ZERO)
                .validate()
                .is_err()
        );
        assert!(
            SchedulerConfig::frame_synced()
                .with_smoothing(0.0)
                .validate()
                .is_err()
        );
        assert!(
            SchedulerConfig::frame_synced()
                .with_smoothing(f32::NAN)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn no_ticks_before_start() {
        let mut s = scheduler();
        assert_eq!(s.state(), SchedulerState::Idle);
        assert_eq!(s.tick(s.token(), HostTime(10)), TickOutcome::Discarded);
    }

    #[test]
    fn deltas_and_elapsed() {
        let mut s = scheduler();
        let (log, cb) = recorder();
        let token = s.start(cb, HostTime(1000));
        assert_eq!(s.tick(token, HostTime(1000)), TickOutcome::Delivered);
        assert_eq!(s.tick(token, HostTime(1016)), TickOutcome::Delivered);
        assert_eq!(s.tick(token, HostTime(1050)), TickOutcome::Delivered);
        let log = log.borrow();
        let deltas: Vec<u64> = log.iter().map(|t| t.delta.ticks()).collect();
        assert_eq!(deltas, &[0, 16, 34]);
        assert_eq!(log[2].elapsed, Duration(50));
        assert_eq!(log[2].tick_index, 2);
    }

    #[test]
    fn clock_going_backwards_yields_zero_delta() {
        let mut s = scheduler();
        let (log, cb) = recorder();
        let token = s.start(cb, HostTime(1000));
        s.tick(token, HostTime(1100));
        s.tick(token, HostTime(900));
        s.tick(token, HostTime(1150));
        let deltas: Vec<u64> = log.borrow().iter().map(|t| t.delta.ticks()).collect();
        assert_eq!(deltas, &[100, 0, 50], "last tick never moves backwards");
    }

    #[test]
    fn max_delta_clamps_gaps() {
        let config = SchedulerConfig::frame_synced().with_max_delta(Duration(100));
        let mut s = Scheduler::new(config).unwrap();
        let (log, cb) = recorder();
        let token = s.start(cb, HostTime(0));
        s.tick(token, HostTime(5000));
        assert_eq!(log.borrow()[0].delta, Duration(100));
        assert_eq!(s.elapsed(), Duration(100));
    }

    #[test]
    fn stop_discards_in_flight_ticks() {
        let mut s = scheduler();
        let (log, cb) = recorder();
        let token = s.start(cb, HostTime(0));
        s.tick(token, HostTime(16));
        s.stop();
        assert_eq!(s.state(), SchedulerState::Idle);
        // Ticks the host had already queued arrive after stop.
        assert_eq!(s.tick(token, HostTime(32)), TickOutcome::Discarded);
        assert_eq!(s.tick(token, HostTime(48)), TickOutcome::Discarded);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn old_token_is_rejected_after_restart() {
        let mut s = scheduler();
        let (log, cb) = recorder();
        let old = s.start(cb, HostTime(0));
        s.stop();
        let (_, cb2) = recorder();
        let new = s.start(cb2, HostTime(100));
        assert_ne!(old, new);
        assert_eq!(s.tick(old, HostTime(116)), TickOutcome::Discarded);
        assert_eq!(s.tick(new, HostTime(116)), TickOutcome::Delivered);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn start_while_running_is_noop() {
        let mut s = scheduler();
        let (log, cb) = recorder();
        let token = s.start(cb, HostTime(0));
        let (other_log, other) = recorder();
        assert_eq!(s.start(other, HostTime(50)), token);
        s.tick(token, HostTime(60));
        assert_eq!(log.borrow().len(), 1);
        assert!(other_log.borrow().is_empty(), "second callback was dropped");
        assert_eq!(log.borrow()[0].delta, Duration(60), "baseline unchanged");
    }

    #[test]
    fn failures_do_not_stop_the_loop() {
        let mut s = scheduler();
        let calls = Rc::new(RefCell::new(0_u32));
        let c = Rc::clone(&calls);
        let token = s.start(
            Box::new(move |info| {
                *c.borrow_mut() += 1;
                if info.tick_index == 1 {
                    Err(Error::tick("boom"))
                } else {
                    Ok(())
                }
            }),
            HostTime(0),
        );
        assert_eq!(s.tick(token, HostTime(1)), TickOutcome::Delivered);
        assert_eq!(s.tick(token, HostTime(2)), TickOutcome::Failed);
        assert_eq!(s.tick(token, HostTime(3)), TickOutcome::Delivered);
        assert_eq!(*calls.borrow(), 3);
        assert_eq!(s.failure_count(), 1);
        assert!(s.is_running());
    }

    #[test]
    fn stop_handle_from_inside_callback() {
        let mut s = scheduler();
        let handle = s.stop_handle();
        let count = Rc::new(RefCell::new(0_u32));
        let c = Rc::clone(&count);
        let token = s.start(
            Box::new(move |info| {
                *c.borrow_mut() += 1;
                if info.tick_index == 1 {
                    handle.stop();
                }
                Ok(())
            }),
            HostTime(0),
        );
        s.tick(token, HostTime(1));
        s.tick(token, HostTime(2));
        assert_eq!(s.state(), SchedulerState::Idle);
        assert_eq!(s.tick(token, HostTime(3)), TickOutcome::Discarded);
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn handle_stopped_on_another_thread_blocks_the_next_tick() {
        extern crate std;

        let mut s = scheduler();
        let (log, cb) = recorder();
        let token = s.start(cb, HostTime(0));
        s.tick(token, HostTime(5));

        let remote = s.stop_handle();
        std::thread::spawn(move || remote.stop()).join().unwrap();

        assert_eq!(s.tick(token, HostTime(10)), TickOutcome::Discarded);
        assert_eq!(s.state(), SchedulerState::Idle);
        assert_eq!(log.borrow().len(), 1, "callback never started");
        assert_eq!(s.tick_count(), 1, "discarded tick left the counters alone");
    }

    #[test]
    fn stale_stop_handle_does_not_stop_new_session() {
        let mut s = scheduler();
        let (_, cb) = recorder();
        s.start(cb, HostTime(0));
        let stale = s.stop_handle();
        s.stop();
        assert!(stale.is_stopped());
        let (_, cb) = recorder();
        let token = s.start(cb, HostTime(10));
        stale.stop();
        assert!(s.is_running());
        assert_eq!(s.tick(token, HostTime(20)), TickOutcome::Delivered);
    }

    #[test]
    fn stop_handle_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StopHandle>();
    }

    #[test]
    fn paused_time_is_excluded() {
        let mut s = scheduler();
        let (log, cb) = recorder();
        let token = s.start(cb, HostTime(0));
        s.tick(token, HostTime(10));
        s.pause(HostTime(15));
        assert_eq!(s.tick(token, HostTime(20)), TickOutcome::Discarded);
        s.resume(HostTime(1015));
        s.tick(token, HostTime(1020));
        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].delta, Duration(10), "5 before pause + 5 after resume");
        assert_eq!(log[1].elapsed, Duration(20));
    }

    #[test]
    fn pause_and_resume_only_from_valid_states() {
        let mut s = scheduler();
        s.pause(HostTime(0));
        assert_eq!(s.state(), SchedulerState::Idle);
        let (_, cb) = recorder();
        s.start(cb, HostTime(0));
        s.resume(HostTime(5));
        assert_eq!(s.state(), SchedulerState::Running);
        s.pause(HostTime(5));
        s.stop();
        assert_eq!(s.state(), SchedulerState::Idle);
    }

    #[test]
    fn smoothed_delta_tracks_average() {
        let config = SchedulerConfig::frame_synced().with_smoothing(0.5);
        let mut s = Scheduler::new(config).unwrap();
        let (log, cb) = recorder();
        let token = s.start(cb, HostTime(0));
        s.tick(token, HostTime(100));
        s.tick(token, HostTime(300));
        let log = log.borrow();
        assert_eq!(log[0].smoothed_delta, Duration(100), "first sample seeds the average");
        assert_eq!(log[1].smoothed_delta, Duration(150));
    }

    #[test]
    fn fixed_interval_deadlines_do_not_drift() {
        let config = SchedulerConfig::fixed_interval(Duration(100));
        let mut s = Scheduler::new(config).unwrap();
        assert_eq!(s.next_tick_at(HostTime(0)), None, "idle");
        let (_, cb) = recorder();
        let token = s.start(cb, HostTime(1000));
        assert_eq!(s.next_tick_at(HostTime(1000)), Some(HostTime(1100)));
        // Host woke up late: the next deadline stays on the grid.
        s.tick(token, HostTime(1130));
        assert_eq!(s.next_tick_at(HostTime(1130)), Some(HostTime(1200)));
        // Overslept past several slots: they are skipped.
        assert_eq!(s.next_tick_at(HostTime(1450)), Some(HostTime(1500)));
        assert_eq!(scheduler().next_tick_at(HostTime(0)), None, "frame synced");
    }

    #[cfg(feature = "trace")]
    #[test]
    fn transitions_and_failures_reach_the_sink() {
        use crate::trace::TraceSink;

        #[derive(Default)]
        struct Sink {
            transitions: Vec<(SchedulerState, SchedulerState)>,
            failures: u32,
        }
        impl TraceSink for Sink {
            fn on_scheduler_transition(&mut self, e: &SchedulerTransitionEvent) {
                self.transitions.push((e.from, e.to));
            }
            fn on_tick_failure(&mut self, _e: &TickFailureEvent<'_>) {
                self.failures += 1;
            }
        }

        let mut sink = Sink::default();
        let mut s = scheduler();
        {
            let mut tracer = Tracer::new(&mut sink);
            let token = s.start_traced(Box::new(|_| Err(Error::tick("x"))), HostTime(0), &mut tracer);
            s.tick_traced(token, HostTime(1), &mut tracer);
            s.stop_traced(&mut tracer);
        }
        assert_eq!(
            sink.transitions,
            &[
                (SchedulerState::Idle, SchedulerState::Running),
                (SchedulerState::Running, SchedulerState::Idle)
            ]
        );
        assert_eq!(sink.failures, 1);
    }
}
