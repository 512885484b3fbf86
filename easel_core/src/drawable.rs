// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawable contract.
//!
//! A [`Drawable`] knows how to paint itself, reports an axis-aligned bounding
//! box computed from its current properties, a visibility flag, and a change
//! counter. Concrete shapes live outside the core.
//!
//! Change detection is explicit: a drawable embeds a [`Generation`] and bumps
//! it from every setter that affects its pixels *relative to its own bounds
//! origin*. Pure translations change [`bounds`](Drawable::bounds) but need not
//! bump the generation, since cached bitmaps are position independent.
//!
//! ```rust,ignore
//! struct Dot {
//!     center: Point,
//!     color: Color,
//!     generation: Generation,
//! }
//!
//! impl Dot {
//!     fn set_color(&mut self, color: Color) {
//!         self.color = color;
//!         self.generation.bump();
//!     }
//!
//!     fn set_center(&mut self, center: Point) {
//!         // Translation only: bounds move, pixels do not change.
//!         self.center = center;
//!     }
//! }
//! ```

use core::any::Any;

use kurbo::Rect;

use crate::context::Context2d;
use crate::error::Result;

/// A paintable object owned by a [`DrawableRegistry`](crate::registry::DrawableRegistry).
///
/// The `Any` supertrait lets
/// [`DrawableRegistry::update`](crate::registry::DrawableRegistry::update)
/// hand back the concrete type.
pub trait Drawable: Any {
    /// Paints the drawable into `ctx`.
    ///
    /// The context's paint state is saved before and restored after this call,
    /// so the implementation may change any state freely. Returning an error
    /// skips the drawable for this frame; the renderer reports it and keeps
    /// painting the rest.
    fn paint(&self, ctx: &mut dyn Context2d) -> Result<()>;

    /// The axis-aligned bounding box in surface coordinates, derived from the
    /// drawable's current properties.
    fn bounds(&self) -> Rect;

    /// Whether the drawable should be painted.
    fn is_visible(&self) -> bool {
        true
    }

    /// The drawable's change counter. See [`Generation`].
    fn generation(&self) -> u64;
}

/// A monotonically increasing per-drawable change counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// A fresh counter.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Advances the counter. Call from every paint-affecting setter.
    #[inline]
    pub fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    /// Returns the current value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}
