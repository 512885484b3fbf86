// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless backend for easel.
//!
//! Runs the core without a browser or a window:
//!
//! - [`now`] / [`timebase`]: a monotonic clock in nanosecond ticks
//! - [`PixelCanvas`]: a software rasterizer implementing
//!   [`Context2d`](easel_core::context::Context2d)
//! - [`HeadlessSurface`]: a [`Surface`](easel_core::context::Surface) backed
//!   by a [`PixelCanvas`]
//! - [`run_ticks`]: a blocking driver for a
//!   [`Scheduler`](easel_core::scheduler::Scheduler), and [`catch_panics`] to
//!   turn callback panics into tick failures

mod canvas;
mod driver;
mod surface;

use std::sync::OnceLock;
use std::time::Instant;

pub use canvas::{PixelCanvas, TextRun};
pub use driver::{NOMINAL_FRAME_NANOS, RunSummary, catch_panics, run_ticks, run_ticks_with};
pub use surface::HeadlessSurface;

use easel_core::time::{HostTime, Timebase};

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Returns the current host time in nanoseconds since the first call in this
/// process.
#[must_use]
pub fn now() -> HostTime {
    let epoch = EPOCH.get_or_init(Instant::now);
    HostTime(u64::try_from(epoch.elapsed().as_nanos()).unwrap_or(u64::MAX))
}

/// Returns the headless [`Timebase`]: 1 tick = 1 ns.
#[must_use]
pub fn timebase() -> Timebase {
    Timebase::NANOS
}
