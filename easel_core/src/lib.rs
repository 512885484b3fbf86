// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty tracking, render scheduling and frame execution for Canvas-2D-style
//! drawing.
//!
//! `easel_core` keeps a retained list of [`Drawable`](drawable::Drawable)s,
//! tracks which parts of the surface their changes invalidate, and repaints
//! only when something changed. It is `no_std` compatible (with `alloc`) and
//! never reads a clock or touches a platform API: hosts supply timestamps and
//! implement [`Surface`](context::Surface).
//!
//! # Architecture
//!
//! ```text
//!   Host timer (rAF / interval / test loop)
//!       │  now
//!       ▼
//!   Scheduler::tick() ──► TickInfo ──► caller's tick callback
//!                                          │  update drawables
//!                                          ▼
//!   DrawableRegistry ──► DirtyTracker ──► Renderer::render()
//!                                              │
//!                          ┌───────────────────┤
//!                          ▼                   ▼
//!                    BitmapCache ──blit──► Surface / Context2d
//! ```
//!
//! **[`registry`]**: Slot arena of drawables with generational
//! [`DrawableId`](registry::DrawableId) handles. Insertion order is paint
//! order. Mutations made through the registry mark the dirty tracker.
//!
//! **[`dirty`]**: Dirty flag plus accumulated redraw rectangle, and
//! per-drawable change channels via `understory_dirty`.
//!
//! **[`frame`]**: The [`Renderer`](frame::Renderer) state machine: skip
//! clean frames, clear the redraw area, paint visible drawables with
//! per-drawable state isolation and failure isolation.
//!
//! **[`cache`]**: Offscreen bitmaps of individual drawables, reused while
//! their generation and pixel placement match.
//!
//! **[`scheduler`]**: Tick scheduler with frame-synced or fixed-interval
//! timing, stale-tick rejection and pause/resume.
//!
//! **[`context`]**: The [`Context2d`](context::Context2d),
//! [`Bitmap`](context::Bitmap) and [`Surface`](context::Surface) traits that
//! backends implement.
//!
//! **[`time`]**: Host ticks, durations and timebase conversion.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types, with
//! the [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables informational `Tracer` events
//!   (ticks, transitions, frame begin/end). Failure events are always
//!   delivered.
//! - `trace-rich` (disabled by default, implies `trace`): Adds per-drawable
//!   change and cache events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod cache;
pub mod context;
pub mod dirty;
pub mod drawable;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod registry;
pub mod scheduler;
pub mod time;
pub mod trace;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
