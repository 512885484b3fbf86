// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error taxonomy.
//!
//! Errors fall into two groups with different propagation rules:
//!
//! - **Structural**: [`Error::InvalidArgument`] and
//!   [`Error::ContextUnavailable`] are returned to the immediate caller.
//! - **Per-element runtime**: [`Error::PaintFailure`] and
//!   [`Error::TickFailure`] are produced by drawables and tick callbacks.
//!   The frame executor and scheduler recover from them locally and report
//!   them through [`TraceSink`](crate::trace::TraceSink); they never escape
//!   [`Renderer::render`](crate::frame::Renderer::render) or
//!   [`Scheduler::tick`](crate::scheduler::Scheduler::tick).

use alloc::string::String;

/// Errors produced by the drawing core and its collaborators.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A caller supplied a malformed value: a stale handle, non-finite or
    /// negative-size bounds, or an invalid configuration.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The surface could not yield a usable drawing context.
    #[error("drawing context unavailable: {0}")]
    ContextUnavailable(String),
    /// A single drawable failed to paint.
    #[error("paint failed: {0}")]
    PaintFailure(String),
    /// A scheduler tick callback failed.
    #[error("tick callback failed: {0}")]
    TickFailure(String),
}

impl Error {
    /// Shorthand for [`Error::InvalidArgument`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    /// Shorthand for [`Error::ContextUnavailable`].
    pub fn context_unavailable(reason: impl Into<String>) -> Self {
        Self::ContextUnavailable(reason.into())
    }

    /// Shorthand for [`Error::PaintFailure`].
    pub fn paint(reason: impl Into<String>) -> Self {
        Self::PaintFailure(reason.into())
    }

    /// Shorthand for [`Error::TickFailure`].
    pub fn tick(reason: impl Into<String>) -> Self {
        Self::TickFailure(reason.into())
    }

    /// Returns `true` for errors that the core recovers from locally.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PaintFailure(_) | Self::TickFailure(_))
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
