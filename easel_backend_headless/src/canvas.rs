// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Software rasterizer.
//!
//! [`PixelCanvas`] is a pixel buffer with a [`Context2d`] implementation.
//! Coverage is binary: a pixel is painted when its center lies inside the
//! shape (nonzero winding). Pixels are kept premultiplied in `f64` and only
//! quantized to straight-alpha RGBA8 when read, so drawing one canvas onto
//! another composites exactly like painting the same shapes directly.
//!
//! Paths are transformed to device space as they are built, the way Canvas 2D
//! applies the current transform at call time. Clips are axis-aligned: a
//! rotated clip rectangle is replaced by its device-space bounding box. Text
//! runs are recorded, not rasterized.

use std::f64::consts::TAU;

use easel_core::context::{Bitmap, Color, CompositeOp, Context2d};
use kurbo::{Affine, Arc, BezPath, PathEl, Point, Rect, Shape, Stroke, StrokeOpts, Vec2};

/// Flattening tolerance in device pixels.
const TOLERANCE: f64 = 0.1;

#[derive(Clone, Copy, Debug)]
struct PaintState {
    fill: Color,
    stroke: Color,
    line_width: f64,
    alpha: f64,
    composite: CompositeOp,
    transform: Affine,
    /// Device-space clip.
    clip: Option<Rect>,
}

impl Default for PaintState {
    fn default() -> Self {
        Self {
            fill: Color::BLACK,
            stroke: Color::BLACK,
            line_width: 1.0,
            alpha: 1.0,
            composite: CompositeOp::SourceOver,
            transform: Affine::IDENTITY,
            clip: None,
        }
    }
}

/// A `fill_text` call, captured in device space.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    /// The text.
    pub text: String,
    /// Baseline origin after the current transform.
    pub origin: Point,
    /// Fill color at call time.
    pub color: Color,
}

/// A software canvas with a [`Context2d`].
pub struct PixelCanvas {
    width: u32,
    height: u32,
    pixels: Vec<Premul>,
    state: PaintState,
    stack: Vec<PaintState>,
    path: BezPath,
    current: Option<Point>,
    subpath_start: Option<Point>,
    texts: Vec<TextRun>,
}

impl std::fmt::Debug for PixelCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelCanvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("depth", &self.stack.len())
            .field("texts", &self.texts.len())
            .finish_non_exhaustive()
    }
}

impl PixelCanvas {
    /// Creates a transparent canvas.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Premul::CLEAR; width as usize * height as usize],
            state: PaintState::default(),
            stack: Vec::new(),
            path: BezPath::new(),
            current: None,
            subpath_start: None,
            texts: Vec::new(),
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the pixel at `(x, y)`, or `None` outside the canvas.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        (x < self.width && y < self.height).then(|| self.pixels[self.index(x, y)].to_color())
    }

    /// All pixels as RGBA8, row-major.
    #[must_use]
    pub fn pixels(&self) -> Vec<Color> {
        self.pixels.iter().copied().map(Premul::to_color).collect()
    }

    /// Text runs drawn so far.
    #[must_use]
    pub fn texts(&self) -> &[TextRun] {
        &self.texts
    }

    /// Reallocates the buffer and resets all state.
    pub fn resize(&mut self, width: u32, height: u32) {
        *self = Self::new(width, height);
    }

    /// Draws `src` with its top-left corner at `origin` in user space.
    ///
    /// Each covered device pixel samples the nearest source pixel through the
    /// inverse transform, so whole-pixel translations copy exactly.
    pub fn draw_canvas(&mut self, src: &Self, origin: Point) {
        let t = self.state.transform * Affine::translate(origin.to_vec2());
        if t.determinant().abs() < f64::EPSILON {
            return;
        }
        let inv = t.inverse();
        let bbox = t.transform_rect_bbox(Rect::new(
            0.0,
            0.0,
            f64::from(src.width),
            f64::from(src.height),
        ));
        let Some((xs, ys)) = self.pixel_span(bbox) else {
            return;
        };
        let (alpha, op) = (self.state.alpha, self.state.composite);
        let (sw, sh) = (f64::from(src.width), f64::from(src.height));
        for y in ys.0..ys.1 {
            for x in xs.0..xs.1 {
                let s = inv * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let (sx, sy) = (s.x.floor(), s.y.floor());
                if sx < 0.0 || sy < 0.0 || sx >= sw || sy >= sh {
                    continue;
                }
                let sample = src.pixels[src.index(to_index(sx), to_index(sy))];
                let idx = self.index(x, y);
                self.pixels[idx] = composite(op, sample.scaled(alpha), self.pixels[idx]);
            }
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Pixel index ranges whose centers fall inside `bbox`, the canvas and the
    /// clip.
    fn pixel_span(&self, bbox: Rect) -> Option<((u32, u32), (u32, u32))> {
        let mut area = bbox.intersect(Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));
        if let Some(clip) = self.state.clip {
            area = area.intersect(clip);
        }
        let xs = (
            center_index(area.x0, self.width),
            center_index(area.x1, self.width),
        );
        let ys = (
            center_index(area.y0, self.height),
            center_index(area.y1, self.height),
        );
        (xs.0 < xs.1 && ys.0 < ys.1).then_some((xs, ys))
    }

    /// Calls `shade` for every pixel whose center is inside `path` (nonzero
    /// winding), honoring the clip.
    fn rasterize(&mut self, path: &BezPath, mut shade: impl FnMut(Premul) -> Premul) {
        let edges = edges(path);
        if edges.is_empty() {
            return;
        }
        let Some((xs, ys)) = self.pixel_span(path.bounding_box()) else {
            return;
        };
        let mut crossings: Vec<(f64, i32)> = Vec::new();
        for y in ys.0..ys.1 {
            let cy = f64::from(y) + 0.5;
            crossings.clear();
            crossings.extend(edges.iter().filter_map(|e| e.crossing(cy)));
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut winding = 0;
            for pair in crossings.windows(2) {
                winding += pair[0].1;
                if winding == 0 {
                    continue;
                }
                let start = center_index(pair[0].0, self.width).max(xs.0);
                let end = center_index(pair[1].0, self.width).min(xs.1);
                for x in start..end {
                    let idx = self.index(x, y);
                    self.pixels[idx] = shade(self.pixels[idx]);
                }
            }
        }
    }

    fn fill_device(&mut self, path: &BezPath, color: Color) {
        let src = Premul::of(color, self.state.alpha);
        let op = self.state.composite;
        self.rasterize(path, |dst| composite(op, src, dst));
    }

    fn stroke_device(&mut self, path: &BezPath) {
        let scale = self.state.transform.determinant().abs().sqrt();
        let width = self.state.line_width * scale;
        if width <= 0.0 {
            return;
        }
        let outline = kurbo::stroke(
            path.iter(),
            &Stroke::new(width),
            &StrokeOpts::default(),
            TOLERANCE,
        );
        self.fill_device(&outline, self.state.stroke);
    }

    fn rect_path(&self, rect: Rect) -> BezPath {
        self.state.transform * rect.to_path(TOLERANCE)
    }

    fn ensure_subpath(&mut self, device: Point) {
        if self.current.is_none() {
            self.path.move_to(device);
            self.current = Some(device);
            self.subpath_start = Some(device);
        }
    }
}

impl Context2d for PixelCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn set_fill_color(&mut self, color: Color) {
        self.state.fill = color;
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.state.stroke = color;
    }

    fn set_line_width(&mut self, width: f64) {
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        if (0.0..=1.0).contains(&alpha) {
            self.state.alpha = alpha;
        }
    }

    fn set_composite_op(&mut self, op: CompositeOp) {
        self.state.composite = op;
    }

    fn set_transform(&mut self, transform: Affine) {
        self.state.transform = transform;
    }

    fn transform(&mut self, transform: Affine) {
        self.state.transform *= transform;
    }

    fn clip_rect(&mut self, rect: Rect) {
        let device = self.state.transform.transform_rect_bbox(rect);
        self.state.clip = Some(match self.state.clip {
            Some(clip) => clip.intersect(device),
            None => device,
        });
    }

    fn clear_rect(&mut self, rect: Rect) {
        let path = self.rect_path(rect);
        self.rasterize(&path, |_| Premul::CLEAR);
    }

    fn fill_rect(&mut self, rect: Rect) {
        let path = self.rect_path(rect);
        self.fill_device(&path, self.state.fill);
    }

    fn stroke_rect(&mut self, rect: Rect) {
        let path = self.rect_path(rect);
        self.stroke_device(&path);
    }

    fn begin_path(&mut self) {
        self.path = BezPath::new();
        self.current = None;
        self.subpath_start = None;
    }

    fn move_to(&mut self, p: Point) {
        let d = self.state.transform * p;
        self.path.move_to(d);
        self.current = Some(d);
        self.subpath_start = Some(d);
    }

    fn line_to(&mut self, p: Point) {
        let d = self.state.transform * p;
        if self.current.is_none() {
            self.ensure_subpath(d);
            return;
        }
        self.path.line_to(d);
        self.current = Some(d);
    }

    fn quad_to(&mut self, ctrl: Point, p: Point) {
        let t = self.state.transform;
        self.ensure_subpath(t * ctrl);
        let d = t * p;
        self.path.quad_to(t * ctrl, d);
        self.current = Some(d);
    }

    fn curve_to(&mut self, ctrl1: Point, ctrl2: Point, p: Point) {
        let t = self.state.transform;
        self.ensure_subpath(t * ctrl1);
        let d = t * p;
        self.path.curve_to(t * ctrl1, t * ctrl2, d);
        self.current = Some(d);
    }

    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64, counterclockwise: bool) {
        if !(radius.is_finite() && radius >= 0.0 && start.is_finite() && end.is_finite()) {
            return;
        }
        let t = self.state.transform;
        let arc = Arc {
            center,
            radii: Vec2::new(radius, radius),
            start_angle: start,
            sweep_angle: sweep(start, end, counterclockwise),
            x_rotation: 0.0,
        };
        let first = t * (center + Vec2::from_angle(start) * radius);
        if self.current.is_some() {
            self.path.line_to(first);
        } else {
            self.ensure_subpath(first);
        }
        let mut last = first;
        for el in arc.append_iter(TOLERANCE) {
            let el = t * el;
            if let PathEl::LineTo(p) | PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) = el {
                last = p;
            }
            self.path.push(el);
        }
        self.current = Some(last);
    }

    fn close_path(&mut self) {
        if self.current.is_some() {
            self.path.close_path();
            self.current = self.subpath_start;
        }
    }

    fn fill(&mut self) {
        let path = std::mem::take(&mut self.path);
        self.fill_device(&path, self.state.fill);
        self.path = path;
    }

    fn stroke(&mut self) {
        let path = std::mem::take(&mut self.path);
        self.stroke_device(&path);
        self.path = path;
    }

    fn fill_text(&mut self, text: &str, origin: Point) {
        self.texts.push(TextRun {
            text: text.to_owned(),
            origin: self.state.transform * origin,
            color: self.state.fill,
        });
    }
}

impl Bitmap for PixelCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn context(&mut self) -> easel_core::Result<&mut dyn Context2d> {
        Ok(self)
    }
}

/// Canvas 2D arc sweep: clockwise sweeps are positive (y-down), and a span of
/// a full turn or more draws a full circle.
fn sweep(start: f64, end: f64, counterclockwise: bool) -> f64 {
    if counterclockwise {
        let d = start - end;
        if d >= TAU { -TAU } else { -d.rem_euclid(TAU) }
    } else {
        let d = end - start;
        if d >= TAU { TAU } else { d.rem_euclid(TAU) }
    }
}

// ---------------------------------------------------------------------------
// Scan conversion
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
struct Edge {
    p0: Point,
    p1: Point,
}

impl Edge {
    /// Where this edge crosses the horizontal line `y`, and its winding
    /// direction. Half-open in y so shared vertices count once.
    fn crossing(&self, y: f64) -> Option<(f64, i32)> {
        let (lo, hi, dir) = if self.p0.y < self.p1.y {
            (self.p0, self.p1, 1)
        } else if self.p0.y > self.p1.y {
            (self.p1, self.p0, -1)
        } else {
            return None;
        };
        if y < lo.y || y >= hi.y {
            return None;
        }
        let x = lo.x + (y - lo.y) * (hi.x - lo.x) / (hi.y - lo.y);
        Some((x, dir))
    }
}

/// Flattens `path` into line edges, closing every subpath.
fn edges(path: &BezPath) -> Vec<Edge> {
    let mut out = Vec::new();
    let mut start = Point::ZERO;
    let mut current = Point::ZERO;
    let mut open = false;
    kurbo::flatten(path.iter(), TOLERANCE, |el| match el {
        PathEl::MoveTo(p) => {
            if open && current != start {
                out.push(Edge { p0: current, p1: start });
            }
            start = p;
            current = p;
            open = true;
        }
        PathEl::LineTo(p) => {
            out.push(Edge { p0: current, p1: p });
            current = p;
        }
        PathEl::ClosePath => {
            if current != start {
                out.push(Edge { p0: current, p1: start });
            }
            current = start;
        }
        // `flatten` only emits the three variants above.
        PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
    });
    if open && current != start {
        out.push(Edge {
            p0: current,
            p1: start,
        });
    }
    out
}

/// First pixel index whose center is at or after `v`, clamped to `0..=max`.
fn center_index(v: f64, max: u32) -> u32 {
    let c = (v - 0.5).ceil();
    if c <= 0.0 || c.is_nan() {
        0
    } else if c >= f64::from(max) {
        max
    } else {
        to_index(c)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "callers pass non-negative integral values below the canvas size"
)]
fn to_index(v: f64) -> u32 {
    v as u32
}

// ---------------------------------------------------------------------------
// Compositing
// ---------------------------------------------------------------------------

/// A premultiplied color with channels in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Premul {
    r: f64,
    g: f64,
    b: f64,
    a: f64,
}

impl Premul {
    const CLEAR: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    fn of(c: Color, global_alpha: f64) -> Self {
        let a = f64::from(c.a) / 255.0 * global_alpha;
        Self {
            r: f64::from(c.r) / 255.0 * a,
            g: f64::from(c.g) / 255.0 * a,
            b: f64::from(c.b) / 255.0 * a,
            a,
        }
    }

    fn scaled(self, k: f64) -> Self {
        Self {
            r: self.r * k,
            g: self.g * k,
            b: self.b * k,
            a: self.a * k,
        }
    }

    fn to_color(self) -> Color {
        if self.a <= 0.0 {
            return Color::TRANSPARENT;
        }
        Color::rgba(
            channel(self.r / self.a),
            channel(self.g / self.a),
            channel(self.b / self.a),
            channel(self.a),
        )
    }
}

#[expect(clippy::cast_possible_truncation, reason = "clamped to 0..=255 first")]
fn channel(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn composite(op: CompositeOp, s: Premul, d: Premul) -> Premul {
    match op {
        CompositeOp::SourceOver => {
            let k = 1.0 - s.a;
            Premul {
                r: s.r + d.r * k,
                g: s.g + d.g * k,
                b: s.b + d.b * k,
                a: s.a + d.a * k,
            }
        }
        CompositeOp::Copy => s,
        CompositeOp::DestinationOut => {
            let k = 1.0 - s.a;
            Premul {
                r: d.r * k,
                g: d.g * k,
                b: d.b * k,
                a: d.a * k,
            }
        }
        CompositeOp::Lighter => Premul {
            r: (s.r + d.r).min(1.0),
            g: (s.g + d.g).min(1.0),
            b: (s.b + d.b).min(1.0),
            a: (s.a + d.a).min(1.0),
        },
        CompositeOp::Multiply => {
            let (ks, kd) = (1.0 - d.a, 1.0 - s.a);
            Premul {
                r: s.r * ks + d.r * kd + s.r * d.r,
                g: s.g * ks + d.g * kd + s.g * d.g,
                b: s.b * ks + d.b * kd + s.b * d.b,
                a: s.a + d.a - s.a * d.a,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const RED: Color = Color::rgb(255, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    fn count(canvas: &PixelCanvas, color: Color) -> usize {
        canvas.pixels().iter().filter(|&&c| c == color).count()
    }

    #[test]
    fn fill_rect_covers_pixel_centers() {
        let mut c = PixelCanvas::new(8, 8);
        c.set_fill_color(RED);
        c.fill_rect(Rect::new(1.0, 1.0, 3.0, 3.0));
        assert_eq!(c.pixel(1, 1), Some(RED));
        assert_eq!(c.pixel(2, 2), Some(RED));
        assert_eq!(c.pixel(0, 0), Some(Color::TRANSPARENT));
        assert_eq!(c.pixel(3, 3), Some(Color::TRANSPARENT));
        assert_eq!(count(&c, RED), 4);
    }

    #[test]
    fn source_over_blends() {
        let mut c = PixelCanvas::new(2, 1);
        c.set_fill_color(BLUE);
        c.fill_rect(Rect::new(0.0, 0.0, 2.0, 1.0));
        c.set_fill_color(RED);
        c.set_global_alpha(0.5);
        c.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(c.pixel(0, 0), Some(Color::rgba(128, 0, 128, 255)));
        assert_eq!(c.pixel(1, 0), Some(BLUE));
    }

    #[test]
    fn destination_out_erases() {
        let mut c = PixelCanvas::new(2, 1);
        c.set_fill_color(BLUE);
        c.fill_rect(Rect::new(0.0, 0.0, 2.0, 1.0));
        c.set_composite_op(CompositeOp::DestinationOut);
        c.fill_rect(Rect::new(1.0, 0.0, 2.0, 1.0));
        assert_eq!(c.pixel(0, 0), Some(BLUE));
        assert_eq!(c.pixel(1, 0), Some(Color::TRANSPARENT));
    }

    #[test]
    fn multiply_darkens() {
        let mut c = PixelCanvas::new(1, 1);
        c.set_fill_color(Color::rgb(255, 255, 0));
        c.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        c.set_composite_op(CompositeOp::Multiply);
        c.set_fill_color(Color::rgb(0, 255, 255));
        c.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(c.pixel(0, 0), Some(Color::rgb(0, 255, 0)));
    }

    #[test]
    fn save_restore_round_trips_state() {
        let mut c = PixelCanvas::new(10, 10);
        c.save();
        c.set_fill_color(RED);
        c.translate(Vec2::new(5.0, 5.0));
        c.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        c.restore();
        c.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(c.pixel(5, 5), Some(RED));
        assert_eq!(c.pixel(0, 0), Some(Color::BLACK));
        c.restore(); // Unbalanced restore is ignored.
    }

    #[test]
    fn clip_limits_painting() {
        let mut c = PixelCanvas::new(10, 10);
        c.clip_rect(Rect::new(2.0, 2.0, 4.0, 4.0));
        c.set_fill_color(RED);
        c.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(count(&c, RED), 4);
        assert_eq!(c.pixel(2, 2), Some(RED));
        assert_eq!(c.pixel(4, 4), Some(Color::TRANSPARENT));
    }

    #[test]
    fn clear_rect_ignores_composite_and_alpha() {
        let mut c = PixelCanvas::new(4, 1);
        c.set_fill_color(RED);
        c.fill_rect(Rect::new(0.0, 0.0, 4.0, 1.0));
        c.set_global_alpha(0.25);
        c.set_composite_op(CompositeOp::Lighter);
        c.clear_rect(Rect::new(1.0, 0.0, 3.0, 1.0));
        assert_eq!(c.pixel(0, 0), Some(RED));
        assert_eq!(c.pixel(1, 0), Some(Color::TRANSPARENT));
        assert_eq!(c.pixel(2, 0), Some(Color::TRANSPARENT));
        assert_eq!(c.pixel(3, 0), Some(RED));
    }

    #[test]
    fn circle_area_is_close_to_pi_r_squared() {
        let mut c = PixelCanvas::new(40, 40);
        c.set_fill_color(RED);
        c.begin_path();
        c.arc(Point::new(20.0, 20.0), 10.0, 0.0, 2.0 * PI, false);
        c.fill();
        let area = count(&c, RED);
        assert!((294..=334).contains(&area), "area {area}");
        assert_eq!(c.pixel(20, 20), Some(RED));
        assert_eq!(c.pixel(31, 20), Some(Color::TRANSPARENT));
    }

    #[test]
    fn nonzero_winding_respects_orientation() {
        let mut c = PixelCanvas::new(10, 10);
        c.set_fill_color(RED);
        c.begin_path();
        // Outer square clockwise.
        c.move_to(Point::new(0.0, 0.0));
        c.line_to(Point::new(10.0, 0.0));
        c.line_to(Point::new(10.0, 10.0));
        c.line_to(Point::new(0.0, 10.0));
        c.close_path();
        // Inner square counterclockwise: a hole.
        c.move_to(Point::new(3.0, 3.0));
        c.line_to(Point::new(3.0, 7.0));
        c.line_to(Point::new(7.0, 7.0));
        c.line_to(Point::new(7.0, 3.0));
        c.close_path();
        c.fill();
        assert_eq!(c.pixel(1, 1), Some(RED));
        assert_eq!(c.pixel(5, 5), Some(Color::TRANSPARENT));
        assert_eq!(count(&c, RED), 100 - 16);
    }

    #[test]
    fn stroke_rect_paints_outline_only() {
        let mut c = PixelCanvas::new(20, 20);
        c.set_stroke_color(BLUE);
        c.set_line_width(2.0);
        c.stroke_rect(Rect::new(5.0, 5.0, 15.0, 15.0));
        assert_eq!(c.pixel(5, 10), Some(BLUE));
        assert_eq!(c.pixel(4, 10), Some(BLUE));
        assert_eq!(c.pixel(10, 10), Some(Color::TRANSPARENT));
        assert_eq!(c.pixel(2, 10), Some(Color::TRANSPARENT));
    }

    #[test]
    fn rotated_fill_rect_is_a_diamond() {
        let mut c = PixelCanvas::new(20, 20);
        c.set_fill_color(RED);
        c.translate(Vec2::new(10.0, 10.0));
        c.rotate(PI / 4.0);
        c.fill_rect(Rect::new(-4.0, -4.0, 4.0, 4.0));
        assert_eq!(c.pixel(10, 10), Some(RED));
        // Axis-aligned corner of the unrotated square is outside the diamond.
        assert_eq!(c.pixel(6, 6), Some(Color::TRANSPARENT));
        assert_eq!(c.pixel(10, 5), Some(RED));
    }

    #[test]
    fn draw_canvas_copies_at_whole_pixel_offset() {
        let mut src = PixelCanvas::new(3, 2);
        src.set_fill_color(RED);
        src.fill_rect(Rect::new(0.0, 0.0, 1.0, 2.0));
        let mut dst = PixelCanvas::new(10, 10);
        dst.draw_canvas(&src, Point::new(4.0, 5.0));
        assert_eq!(dst.pixel(4, 5), Some(RED));
        assert_eq!(dst.pixel(4, 6), Some(RED));
        assert_eq!(dst.pixel(5, 5), Some(Color::TRANSPARENT));
        assert_eq!(count(&dst, RED), 2);
    }

    #[test]
    fn text_is_recorded_in_device_space() {
        let mut c = PixelCanvas::new(10, 10);
        c.set_fill_color(BLUE);
        c.translate(Vec2::new(2.0, 3.0));
        c.fill_text("hi", Point::new(1.0, 1.0));
        assert_eq!(
            c.texts(),
            &[TextRun {
                text: "hi".into(),
                origin: Point::new(3.0, 4.0),
                color: BLUE,
            }]
        );
        assert_eq!(count(&c, BLUE), 0, "text is not rasterized");
    }

    #[test]
    fn sweep_follows_canvas_rules() {
        assert_eq!(sweep(0.0, PI, false), PI);
        assert_eq!(sweep(0.0, PI, true), -PI);
        assert_eq!(sweep(0.0, 3.0 * TAU, false), TAU);
        assert_eq!(sweep(PI, 0.0, false), PI);
    }
}
