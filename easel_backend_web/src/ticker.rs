// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser tick source.
//!
//! [`WebTicker`] owns a [`Scheduler`] and feeds it ticks from
//! `requestAnimationFrame` (for [`TimingStrategy::FrameSynced`]) or
//! `setTimeout` (for [`TimingStrategy::FixedInterval`], aimed at the
//! scheduler's next deadline). Only one request is outstanding at a time and
//! the next one is made after the current tick returns, so a slow callback
//! delays the following tick instead of overlapping it.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use easel_core::scheduler::{Scheduler, StopHandle, TickCallback, TickToken, TimingStrategy};
use easel_core::time::{Duration, HostTime};

// Global bindings work on both the main thread and in dedicated workers.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, delay_ms: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pending {
    Frame(i32),
    Timeout(i32),
}

impl Pending {
    fn cancel(self) {
        match self {
            Self::Frame(id) => cancel_animation_frame(id),
            Self::Timeout(id) => clear_timeout(id),
        }
    }
}

struct TickerInner {
    scheduler: RefCell<Scheduler>,
    /// Registered with the browser for every request.
    closure: RefCell<Option<Closure<dyn FnMut()>>>,
    token: Cell<Option<TickToken>>,
    pending: Cell<Option<Pending>>,
}

/// Drives a [`Scheduler`] from the browser event loop.
pub struct WebTicker {
    inner: Rc<TickerInner>,
}

impl WebTicker {
    /// Wraps `scheduler`. Nothing is requested until [`start`](Self::start).
    pub fn new(scheduler: Scheduler) -> Self {
        let inner = Rc::new(TickerInner {
            scheduler: RefCell::new(scheduler),
            closure: RefCell::new(None),
            token: Cell::new(None),
            pending: Cell::new(None),
        });
        let weak = Rc::downgrade(&inner);
        let closure = Closure::wrap(Box::new(move || fire(&weak)) as Box<dyn FnMut()>);
        *inner.closure.borrow_mut() = Some(closure);
        Self { inner }
    }

    /// Starts a session and requests the first tick.
    ///
    /// Does nothing if the scheduler is already running or paused.
    pub fn start(&self, callback: TickCallback) {
        let token = self.inner.scheduler.borrow_mut().start(callback, crate::now());
        self.inner.token.set(Some(token));
        request(&self.inner);
    }

    /// Stops the session and cancels the pending request.
    pub fn stop(&self) {
        self.cancel();
        self.inner.token.set(None);
        self.inner.scheduler.borrow_mut().stop();
    }

    /// Pauses the session. Time spent paused is not counted.
    pub fn pause(&self) {
        self.cancel();
        self.inner.scheduler.borrow_mut().pause(crate::now());
    }

    /// Resumes a paused session.
    pub fn resume(&self) {
        self.inner.scheduler.borrow_mut().resume(crate::now());
        request(&self.inner);
    }

    /// A handle that stops the current session from anywhere, including from
    /// inside the tick callback.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.inner.scheduler.borrow().stop_handle()
    }

    /// Returns `true` while ticks are being requested.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.scheduler.borrow().is_running()
    }

    /// Ticks delivered in the current session.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.inner.scheduler.borrow().tick_count()
    }

    fn cancel(&self) {
        if let Some(pending) = self.inner.pending.take() {
            pending.cancel();
        }
    }
}

impl Drop for WebTicker {
    fn drop(&mut self) {
        self.cancel();
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for WebTicker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebTicker")
            .field("scheduler", &self.inner.scheduler)
            .field("pending", &self.inner.pending.get())
            .finish_non_exhaustive()
    }
}

fn fire(weak: &Weak<TickerInner>) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    inner.pending.set(None);
    let Some(token) = inner.token.get() else {
        return;
    };
    {
        let Ok(mut scheduler) = inner.scheduler.try_borrow_mut() else {
            tracing::warn!("scheduler busy when a tick fired; tick dropped");
            return;
        };
        scheduler.tick(token, crate::now());
    }
    request(&inner);
}

/// Requests the next tick if the session is live and nothing is pending.
fn request(inner: &TickerInner) {
    if inner.pending.get().is_some() {
        return;
    }
    let scheduler = inner.scheduler.borrow();
    if !scheduler.is_running() {
        return;
    }
    let closure = inner.closure.borrow();
    let Some(closure) = closure.as_ref() else {
        return;
    };
    let js = closure.as_ref().unchecked_ref();
    let pending = match scheduler.timing() {
        TimingStrategy::FrameSynced => Pending::Frame(request_animation_frame(js)),
        TimingStrategy::FixedInterval(_) => {
            let now = crate::now();
            let wait = scheduler
                .next_tick_at(now)
                .map_or(Duration::ZERO, |deadline| {
                    deadline.saturating_duration_since(now)
                });
            Pending::Timeout(set_timeout(js, delay_millis(wait)))
        }
    };
    inner.pending.set(Some(pending));
}

/// Converts a microsecond-tick wait into a `setTimeout` delay, rounding up so
/// the timer never fires before the deadline.
pub(crate) fn delay_millis(wait: Duration) -> i32 {
    i32::try_from(wait.ticks().div_ceil(1000)).unwrap_or(i32::MAX)
}

/// Converts a `performance.now()` reading to microsecond ticks.
pub(crate) fn host_time(ms: f64) -> HostTime {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "performance.now() is a small non-negative f64; µs fits in u64"
    )]
    let us = (ms * 1000.0) as u64;
    HostTime(us)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_round_up_to_whole_milliseconds() {
        assert_eq!(delay_millis(Duration::ZERO), 0);
        assert_eq!(delay_millis(Duration(1)), 1);
        assert_eq!(delay_millis(Duration(16_000)), 16);
        assert_eq!(delay_millis(Duration(16_001)), 17);
        assert_eq!(delay_millis(Duration(u64::MAX)), i32::MAX);
    }

    #[test]
    fn host_time_is_microseconds() {
        assert_eq!(host_time(16.5), HostTime(16_500));
        assert_eq!(host_time(0.0), HostTime(0));
    }
}
