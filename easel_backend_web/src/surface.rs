// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canvas surfaces.
//!
//! [`CanvasSurface`] wraps an `<canvas>` element on the main thread.
//! [`OffscreenSurface`] wraps an `OffscreenCanvas`, typically one transferred
//! to a worker with `transferControlToOffscreen()`. Both cache drawables in
//! [`OffscreenBitmap`]s.

use alloc::format;

use easel_core::context::{Bitmap, Context2d, Surface};
use easel_core::{Error, Result};
use kurbo::Point;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, HtmlCanvasElement, OffscreenCanvas,
    OffscreenCanvasRenderingContext2d,
};

use crate::context::{WebContext, js_error};

/// An `OffscreenCanvas` used as a cache bitmap.
#[derive(Debug)]
pub struct OffscreenBitmap {
    canvas: OffscreenCanvas,
    ctx: WebContext<OffscreenCanvasRenderingContext2d>,
}

impl OffscreenBitmap {
    /// Allocates a transparent `width` x `height` bitmap.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid(format!(
                "bitmap size must be non-zero, got {width}x{height}"
            )));
        }
        let canvas = OffscreenCanvas::new(width, height)
            .map_err(|e| Error::context_unavailable(js_error(&e)))?;
        let raw = offscreen_context(&canvas)?;
        Ok(Self {
            canvas,
            ctx: WebContext::new(raw, width, height),
        })
    }

    /// The backing canvas.
    #[must_use]
    pub fn canvas(&self) -> &OffscreenCanvas {
        &self.canvas
    }
}

impl Bitmap for OffscreenBitmap {
    fn width(&self) -> u32 {
        self.ctx.width
    }

    fn height(&self) -> u32 {
        self.ctx.height
    }

    fn context(&mut self) -> Result<&mut dyn Context2d> {
        Ok(&mut self.ctx)
    }
}

fn offscreen_context(canvas: &OffscreenCanvas) -> Result<OffscreenCanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .map_err(|e| Error::context_unavailable(js_error(&e)))?
        .ok_or_else(|| Error::context_unavailable("OffscreenCanvas has no 2d context"))?
        .dyn_into::<OffscreenCanvasRenderingContext2d>()
        .map_err(|_| Error::context_unavailable("unexpected OffscreenCanvas context type"))
}

/// A surface over an `HTMLCanvasElement`.
#[derive(Debug)]
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: WebContext<CanvasRenderingContext2d>,
}

impl CanvasSurface {
    /// Wraps `canvas`, acquiring its 2D context.
    ///
    /// Fails with [`Error::ContextUnavailable`] if the canvas already has a
    /// context of another kind.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let raw = canvas
            .get_context("2d")
            .map_err(|e| Error::context_unavailable(js_error(&e)))?
            .ok_or_else(|| Error::context_unavailable("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| Error::context_unavailable("unexpected canvas context type"))?;
        let (width, height) = (canvas.width(), canvas.height());
        Ok(Self {
            canvas,
            ctx: WebContext::new(raw, width, height),
        })
    }

    /// Looks up a `<canvas>` by element id in the window's document.
    pub fn from_element_id(id: &str) -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| Error::context_unavailable("no window document"))?;
        let canvas = document
            .get_element_by_id(id)
            .ok_or_else(|| Error::invalid(format!("no element with id {id:?}")))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| Error::invalid(format!("element {id:?} is not a canvas")))?;
        Self::new(canvas)
    }

    /// The canvas element.
    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl Surface for CanvasSurface {
    type Bitmap = OffscreenBitmap;

    fn width(&self) -> u32 {
        self.ctx.width
    }

    fn height(&self) -> u32 {
        self.ctx.height
    }

    fn context(&mut self) -> Result<&mut dyn Context2d> {
        Ok(&mut self.ctx)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.ctx.width = width;
        self.ctx.height = height;
        Ok(())
    }

    fn create_bitmap(&mut self, width: u32, height: u32) -> Result<OffscreenBitmap> {
        OffscreenBitmap::new(width, height)
    }

    fn blit(&mut self, bitmap: &OffscreenBitmap, origin: Point) -> Result<()> {
        self.ctx
            .raw
            .draw_image_with_offscreen_canvas(&bitmap.canvas, origin.x, origin.y)
            .map_err(|e| Error::paint(js_error(&e)))
    }
}

/// A surface over an `OffscreenCanvas`, usable from a worker.
#[derive(Debug)]
pub struct OffscreenSurface {
    canvas: OffscreenCanvas,
    ctx: WebContext<OffscreenCanvasRenderingContext2d>,
}

impl OffscreenSurface {
    /// Wraps `canvas`, acquiring its 2D context.
    pub fn new(canvas: OffscreenCanvas) -> Result<Self> {
        let raw = offscreen_context(&canvas)?;
        let (width, height) = (canvas.width(), canvas.height());
        Ok(Self {
            canvas,
            ctx: WebContext::new(raw, width, height),
        })
    }

    /// The backing canvas.
    #[must_use]
    pub fn canvas(&self) -> &OffscreenCanvas {
        &self.canvas
    }
}

impl Surface for OffscreenSurface {
    type Bitmap = OffscreenBitmap;

    fn width(&self) -> u32 {
        self.ctx.width
    }

    fn height(&self) -> u32 {
        self.ctx.height
    }

    fn context(&mut self) -> Result<&mut dyn Context2d> {
        Ok(&mut self.ctx)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.ctx.width = width;
        self.ctx.height = height;
        Ok(())
    }

    fn create_bitmap(&mut self, width: u32, height: u32) -> Result<OffscreenBitmap> {
        OffscreenBitmap::new(width, height)
    }

    fn blit(&mut self, bitmap: &OffscreenBitmap, origin: Point) -> Result<()> {
        self.ctx
            .raw
            .draw_image_with_offscreen_canvas(&bitmap.canvas, origin.x, origin.y)
            .map_err(|e| Error::paint(js_error(&e)))
    }
}
