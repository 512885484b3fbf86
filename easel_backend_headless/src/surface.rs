// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`Surface`] over a [`PixelCanvas`].

use easel_core::context::{Context2d, Surface};
use easel_core::{Error, Result};
use kurbo::Point;

use crate::canvas::PixelCanvas;

/// An in-memory render target. Offscreen bitmaps are [`PixelCanvas`]es too.
#[derive(Debug)]
pub struct HeadlessSurface {
    canvas: PixelCanvas,
}

impl HeadlessSurface {
    /// Creates a transparent surface.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: PixelCanvas::new(width, height),
        }
    }

    /// The backing canvas, for reading pixels.
    #[must_use]
    pub fn canvas(&self) -> &PixelCanvas {
        &self.canvas
    }
}

impl Surface for HeadlessSurface {
    type Bitmap = PixelCanvas;

    fn width(&self) -> u32 {
        self.canvas.width()
    }

    fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn context(&mut self) -> Result<&mut dyn Context2d> {
        Ok(&mut self.canvas)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.canvas.resize(width, height);
        Ok(())
    }

    fn create_bitmap(&mut self, width: u32, height: u32) -> Result<PixelCanvas> {
        if width == 0 || height == 0 {
            return Err(Error::invalid(format!(
                "bitmap size must be non-zero, got {width}x{height}"
            )));
        }
        Ok(PixelCanvas::new(width, height))
    }

    fn blit(&mut self, bitmap: &PixelCanvas, origin: Point) -> Result<()> {
        self.canvas.draw_canvas(bitmap, origin);
        Ok(())
    }
}
