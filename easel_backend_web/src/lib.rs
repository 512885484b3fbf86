// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for easel.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`now`] / [`timebase`]: `performance.now()` in microsecond ticks
//! - [`WebTicker`]: drives a [`Scheduler`](easel_core::scheduler::Scheduler)
//!   from `requestAnimationFrame` or `setTimeout`
//! - [`CanvasSurface`]: an `HTMLCanvasElement` on the main thread
//! - [`OffscreenSurface`]: an `OffscreenCanvas`, for workers
//! - [`OffscreenBitmap`]: the cache bitmap both surfaces use
//!
//! The crate targets `wasm32-unknown-unknown`.

#![no_std]

extern crate alloc;

mod context;
mod surface;
mod ticker;

pub use context::WebContext;
pub use surface::{CanvasSurface, OffscreenBitmap, OffscreenSurface};
pub use ticker::WebTicker;

use easel_core::time::{HostTime, Timebase};

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks. Use [`timebase`] to
/// convert to nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    ticker::host_time(ticker::performance_now())
}

/// Returns the web [`Timebase`]: 1 tick = 1 µs = 1000 ns.
#[must_use]
pub fn timebase() -> Timebase {
    Timebase::MICROS
}
