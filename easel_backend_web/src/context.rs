// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`Context2d`] over the browser's 2D contexts.
//!
//! `CanvasRenderingContext2D` and `OffscreenCanvasRenderingContext2D` expose
//! the same drawing methods but share no Rust trait, so one macro implements
//! [`Context2d`] for [`WebContext`] over each of them.
//!
//! The trait's drawing methods are infallible. The few browser calls that can
//! throw (invalid transforms, unknown composite modes) are logged and
//! otherwise ignored, the way the browser ignores invalid values set through
//! plain properties.

use alloc::format;
use alloc::string::String;

use easel_core::context::{Color, CompositeOp, Context2d};
use kurbo::{Affine, Point, Rect};
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, OffscreenCanvasRenderingContext2d};

/// A browser 2D context plus the pixel size of its canvas.
#[derive(Debug)]
pub struct WebContext<C> {
    pub(crate) raw: C,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl<C> WebContext<C> {
    pub(crate) fn new(raw: C, width: u32, height: u32) -> Self {
        Self { raw, width, height }
    }

    /// The underlying browser context.
    #[must_use]
    pub fn raw(&self) -> &C {
        &self.raw
    }
}

/// Renders a thrown JS value for an error message.
pub(crate) fn js_error(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn ignore_js(op: &'static str, result: Result<(), JsValue>) {
    if let Err(err) = result {
        tracing::debug!(op, error = %js_error(&err), "canvas call threw");
    }
}

macro_rules! impl_context2d {
    ($raw:ty) => {
        impl Context2d for WebContext<$raw> {
            fn width(&self) -> u32 {
                self.width
            }

            fn height(&self) -> u32 {
                self.height
            }

            fn save(&mut self) {
                self.raw.save();
            }

            fn restore(&mut self) {
                self.raw.restore();
            }

            fn set_fill_color(&mut self, color: Color) {
                self.raw.set_fill_style_str(&color.to_css());
            }

            fn set_stroke_color(&mut self, color: Color) {
                self.raw.set_stroke_style_str(&color.to_css());
            }

            fn set_line_width(&mut self, width: f64) {
                self.raw.set_line_width(width);
            }

            fn set_global_alpha(&mut self, alpha: f64) {
                self.raw.set_global_alpha(alpha);
            }

            fn set_composite_op(&mut self, op: CompositeOp) {
                ignore_js(
                    "globalCompositeOperation",
                    self.raw.set_global_composite_operation(op.css_name()),
                );
            }

            fn set_transform(&mut self, t: Affine) {
                let [a, b, c, d, e, f] = t.as_coeffs();
                ignore_js("setTransform", self.raw.set_transform(a, b, c, d, e, f));
            }

            fn transform(&mut self, t: Affine) {
                let [a, b, c, d, e, f] = t.as_coeffs();
                ignore_js("transform", self.raw.transform(a, b, c, d, e, f));
            }

            fn reset_transform(&mut self) {
                ignore_js("resetTransform", self.raw.reset_transform());
            }

            fn clip_rect(&mut self, r: Rect) {
                self.raw.begin_path();
                self.raw.rect(r.x0, r.y0, r.width(), r.height());
                self.raw.clip();
                self.raw.begin_path();
            }

            fn clear_rect(&mut self, r: Rect) {
                self.raw.clear_rect(r.x0, r.y0, r.width(), r.height());
            }

            fn fill_rect(&mut self, r: Rect) {
                self.raw.fill_rect(r.x0, r.y0, r.width(), r.height());
            }

            fn stroke_rect(&mut self, r: Rect) {
                self.raw.stroke_rect(r.x0, r.y0, r.width(), r.height());
            }

            fn begin_path(&mut self) {
                self.raw.begin_path();
            }

            fn move_to(&mut self, p: Point) {
                self.raw.move_to(p.x, p.y);
            }

            fn line_to(&mut self, p: Point) {
                self.raw.line_to(p.x, p.y);
            }

            fn quad_to(&mut self, ctrl: Point, p: Point) {
                self.raw.quadratic_curve_to(ctrl.x, ctrl.y, p.x, p.y);
            }

            fn curve_to(&mut self, c1: Point, c2: Point, p: Point) {
                self.raw.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y);
            }

            fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64, ccw: bool) {
                ignore_js(
                    "arc",
                    self.raw
                        .arc_with_anticlockwise(center.x, center.y, radius, start, end, ccw),
                );
            }

            fn close_path(&mut self) {
                self.raw.close_path();
            }

            fn fill(&mut self) {
                self.raw.fill();
            }

            fn stroke(&mut self) {
                self.raw.stroke();
            }

            fn fill_text(&mut self, text: &str, origin: Point) {
                ignore_js("fillText", self.raw.fill_text(text, origin.x, origin.y));
            }
        }
    };
}

impl_context2d!(CanvasRenderingContext2d);
impl_context2d!(OffscreenCanvasRenderingContext2d);
