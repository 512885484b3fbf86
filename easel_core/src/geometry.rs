// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounding-box helpers over [`kurbo::Rect`].
//!
//! Bounds are axis-aligned rectangles in surface coordinates. A rectangle
//! with zero width or height is *degenerate*: it still counts as a change
//! for dirty tracking but covers no pixels.

use alloc::format;

use kurbo::Rect;

use crate::error::{Error, Result};

/// Validates drawable bounds.
///
/// Returns [`Error::InvalidArgument`] for non-finite coordinates or a
/// negative width or height.
pub fn validate_bounds(bounds: Rect) -> Result<Rect> {
    if !is_finite(bounds) {
        return Err(Error::invalid(format!("non-finite bounds {bounds:?}")));
    }
    if bounds.width() < 0.0 || bounds.height() < 0.0 {
        return Err(Error::invalid(format!(
            "negative bounds size {}x{}",
            bounds.width(),
            bounds.height()
        )));
    }
    Ok(bounds)
}

/// Returns `true` if every coordinate of `rect` is finite.
#[must_use]
pub fn is_finite(rect: Rect) -> bool {
    rect.x0.is_finite() && rect.y0.is_finite() && rect.x1.is_finite() && rect.y1.is_finite()
}

/// Returns `true` if `rect` covers no area.
#[must_use]
pub fn is_degenerate(rect: Rect) -> bool {
    !(rect.width() > 0.0 && rect.height() > 0.0)
}

/// Returns `true` if `a` and `b` share a region of positive area.
#[must_use]
pub fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

/// Returns `true` if `outer` fully contains `inner`.
#[must_use]
pub fn contains(outer: Rect, inner: Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && outer.x1 >= inner.x1 && outer.y1 >= inner.y1
}

/// Expands `rect` outward to whole-pixel edges.
#[must_use]
pub fn pixel_aligned(rect: Rect) -> Rect {
    rect.expand()
}

/// Returns the pixel dimensions needed to hold `rect`, at least 1x1.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "bounds are validated finite and non-negative; sizes are clamped to u32"
)]
pub fn pixel_size(rect: Rect) -> (u32, u32) {
    let size = rect.size().ceil();
    let w = size.width.clamp(1.0, f64::from(u32::MAX)) as u32;
    let h = size.height.clamp(1.0, f64::from(u32::MAX)) as u32;
    (w, h)
}

/// The full rectangle of a `width` x `height` surface.
#[must_use]
pub fn surface_rect(width: u32, height: u32) -> Rect {
    Rect::new(0.0, 0.0, f64::from(width), f64::from(height))
}
