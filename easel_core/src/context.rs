// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing-context capability set.
//!
//! The core never inspects which host produced a drawing context. It talks
//! to three narrow traits:
//!
//! - [`Context2d`]: a Canvas-2D-like immediate-mode context (state stack,
//!   transforms, paths, rectangles, text).
//! - [`Bitmap`]: an offscreen target with its own context, used by the
//!   bitmap cache.
//! - [`Surface`]: the on-screen (or headless) target a renderer owns.
//!
//! Every context method that mutates paint state (fill/stroke color, line
//! width, alpha, composite mode, transform, clip) is covered by
//! [`save`](Context2d::save)/[`restore`](Context2d::restore).

use alloc::string::String;
use core::fmt;

use kurbo::{Affine, Point, Rect, Vec2};

use crate::error::Result;

/// A straight-alpha RGBA color with 8 bits per channel.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 is opaque).
    pub a: u8,
}

impl Color {
    /// Opaque black, the initial fill and stroke color of a fresh context.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Creates an opaque color.
    #[inline]
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Creates a color with explicit alpha.
    #[inline]
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns `true` if the alpha channel is zero.
    #[inline]
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Formats the color as a CSS `rgba()` string.
    #[must_use]
    pub fn to_css(self) -> String {
        alloc::format!(
            "rgba({}, {}, {}, {})",
            self.r,
            self.g,
            self.b,
            f64::from(self.a) / 255.0
        )
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r, self.g, self.b, self.a
        )
    }
}

/// How new pixels combine with existing ones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CompositeOp {
    /// Draw over existing content (the context default).
    #[default]
    SourceOver,
    /// Replace existing content.
    Copy,
    /// Erase existing content where the source is opaque.
    DestinationOut,
    /// Add color values.
    Lighter,
    /// Multiply color values.
    Multiply,
}

impl CompositeOp {
    /// The Canvas-2D `globalCompositeOperation` name.
    #[must_use]
    pub const fn css_name(self) -> &'static str {
        match self {
            Self::SourceOver => "source-over",
            Self::Copy => "copy",
            Self::DestinationOut => "destination-out",
            Self::Lighter => "lighter",
            Self::Multiply => "multiply",
        }
    }
}

/// A Canvas-2D-like drawing context.
///
/// Implementations exist for the browser's `CanvasRenderingContext2D`, for
/// `OffscreenCanvasRenderingContext2D` in workers, and for the headless
/// software rasterizer. The trait is object safe; drawables receive
/// `&mut dyn Context2d`.
///
/// Angles are in radians. Transforms compose the same way Canvas 2D does:
/// [`transform`](Self::transform) post-multiplies the current matrix.
pub trait Context2d {
    /// Width of the target in pixels.
    fn width(&self) -> u32;
    /// Height of the target in pixels.
    fn height(&self) -> u32;

    /// Pushes the paint state onto the state stack.
    fn save(&mut self);
    /// Pops the paint state. Unbalanced calls are ignored.
    fn restore(&mut self);

    /// Sets the fill color.
    fn set_fill_color(&mut self, color: Color);
    /// Sets the stroke color.
    fn set_stroke_color(&mut self, color: Color);
    /// Sets the stroke width in user units.
    fn set_line_width(&mut self, width: f64);
    /// Sets the global alpha in `[0, 1]`.
    fn set_global_alpha(&mut self, alpha: f64);
    /// Sets the composite operation.
    fn set_composite_op(&mut self, op: CompositeOp);

    /// Replaces the current transform.
    fn set_transform(&mut self, transform: Affine);
    /// Post-multiplies the current transform.
    fn transform(&mut self, transform: Affine);
    /// Resets the current transform to identity.
    fn reset_transform(&mut self) {
        self.set_transform(Affine::IDENTITY);
    }
    /// Translates the current transform.
    fn translate(&mut self, offset: Vec2) {
        self.transform(Affine::translate(offset));
    }
    /// Scales the current transform.
    fn scale(&mut self, sx: f64, sy: f64) {
        self.transform(Affine::scale_non_uniform(sx, sy));
    }
    /// Rotates the current transform.
    fn rotate(&mut self, radians: f64) {
        self.transform(Affine::rotate(radians));
    }

    /// Intersects the clip region with `rect` (in user space).
    fn clip_rect(&mut self, rect: Rect);

    /// Sets every pixel in `rect` to transparent black, ignoring composite
    /// mode and alpha.
    fn clear_rect(&mut self, rect: Rect);
    /// Fills `rect` with the fill color.
    fn fill_rect(&mut self, rect: Rect);
    /// Strokes the outline of `rect` with the stroke color.
    fn stroke_rect(&mut self, rect: Rect);

    /// Starts a new path, discarding the current one.
    fn begin_path(&mut self);
    /// Begins a new subpath at `p`.
    fn move_to(&mut self, p: Point);
    /// Adds a line segment to `p`.
    fn line_to(&mut self, p: Point);
    /// Adds a quadratic Bézier segment.
    fn quad_to(&mut self, ctrl: Point, p: Point);
    /// Adds a cubic Bézier segment.
    fn curve_to(&mut self, ctrl1: Point, ctrl2: Point, p: Point);
    /// Adds a circular arc.
    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64, counterclockwise: bool);
    /// Closes the current subpath.
    fn close_path(&mut self);
    /// Fills the current path (nonzero winding).
    fn fill(&mut self);
    /// Strokes the current path.
    fn stroke(&mut self);

    /// Draws a text run with its baseline origin at `origin`.
    fn fill_text(&mut self, text: &str, origin: Point);
}

/// An offscreen drawing target.
pub trait Bitmap {
    /// Width in pixels.
    fn width(&self) -> u32;
    /// Height in pixels.
    fn height(&self) -> u32;
    /// Returns the bitmap's drawing context.
    fn context(&mut self) -> Result<&mut dyn Context2d>;
}

/// The target a [`Renderer`](crate::frame::Renderer) paints into.
pub trait Surface {
    /// Offscreen bitmap type used for caching.
    type Bitmap: Bitmap;

    /// Width in pixels.
    fn width(&self) -> u32;
    /// Height in pixels.
    fn height(&self) -> u32;

    /// Returns the drawing context.
    ///
    /// Fails with [`Error::ContextUnavailable`](crate::Error::ContextUnavailable)
    /// when the host cannot provide one.
    fn context(&mut self) -> Result<&mut dyn Context2d>;

    /// Resizes the backing store. Contents are discarded.
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// Allocates a transparent offscreen bitmap.
    fn create_bitmap(&mut self, width: u32, height: u32) -> Result<Self::Bitmap>;

    /// Draws `bitmap` with its top-left corner at `origin` in user space,
    /// honoring the current transform, clip, alpha and composite mode.
    fn blit(&mut self, bitmap: &Self::Bitmap, origin: Point) -> Result<()>;
}
