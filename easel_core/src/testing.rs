// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles: a configurable drawable and a surface that records every
//! call made on it.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::Cell;
use core::ops::{Deref, DerefMut};

use kurbo::{Affine, Point, Rect, Vec2};

use crate::context::{Bitmap, Color, CompositeOp, Context2d, Surface};
use crate::drawable::{Drawable, Generation};
use crate::error::{Error, Result};

/// A rectangle drawable with knobs for the behaviors tests care about.
#[derive(Debug)]
pub(crate) struct Probe {
    pub(crate) bounds: Rect,
    pub(crate) visible: bool,
    generation: Generation,
    label: Option<u32>,
    counter: Option<Rc<Cell<u32>>>,
    fail: bool,
    poison: bool,
}

impl Probe {
    pub(crate) fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            visible: true,
            generation: Generation::new(),
            label: None,
            counter: None,
            fail: false,
            poison: false,
        }
    }

    /// Announces itself with a `"probe {label}"` text op before filling.
    pub(crate) fn labeled(mut self, label: u32) -> Self {
        self.label = Some(label);
        self
    }

    /// Increments `counter` on every paint.
    pub(crate) fn counting(mut self, counter: &Rc<Cell<u32>>) -> Self {
        self.counter = Some(Rc::clone(counter));
        self
    }

    /// Every paint fails.
    pub(crate) fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Scribbles over the paint state before filling.
    pub(crate) fn poisoning(mut self) -> Self {
        self.poison = true;
        self
    }

    /// Moves horizontally without bumping the generation.
    pub(crate) fn translate(&mut self, dx: f64) {
        self.bounds = self.bounds + Vec2::new(dx, 0.0);
    }

    /// A paint-affecting change.
    pub(crate) fn touch(&mut self) {
        self.generation.bump();
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

impl Drawable for Probe {
    fn paint(&self, ctx: &mut dyn Context2d) -> Result<()> {
        if self.fail {
            return Err(Error::paint("probe configured to fail"));
        }
        if let Some(counter) = &self.counter {
            counter.set(counter.get() + 1);
        }
        if self.poison {
            ctx.set_transform(Affine::scale(100.0));
            ctx.set_fill_color(Color::rgb(255, 0, 0));
            ctx.set_global_alpha(0.1);
            ctx.set_composite_op(CompositeOp::Copy);
            ctx.clip_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        }
        if let Some(label) = self.label {
            ctx.fill_text(&format!("probe {label}"), self.bounds.origin());
        }
        ctx.fill_rect(self.bounds);
        Ok(())
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn generation(&self) -> u64 {
        self.generation.get()
    }
}

/// Paint state captured with each recorded draw call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct State {
    pub(crate) fill: Color,
    pub(crate) stroke: Color,
    pub(crate) line_width: f64,
    pub(crate) alpha: f64,
    pub(crate) composite: CompositeOp,
    pub(crate) transform: Affine,
    pub(crate) clip: Option<Rect>,
    /// Save-stack depth at the time of the call.
    pub(crate) depth: usize,
}

impl Default for State {
    fn default() -> Self {
        Self {
            fill: Color::BLACK,
            stroke: Color::BLACK,
            line_width: 1.0,
            alpha: 1.0,
            composite: CompositeOp::SourceOver,
            transform: Affine::IDENTITY,
            clip: None,
            depth: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Op {
    Save,
    Restore,
    ClearRect(Rect, Affine),
    FillRect(Rect, State),
    StrokeRect(Rect, State),
    Clip(Rect),
    Fill(State),
    Stroke(State),
    Text(String, Point),
    Blit(Point, (u32, u32)),
}

/// A [`Context2d`] that records calls instead of drawing.
#[derive(Debug)]
pub(crate) struct RecordingContext {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) ops: Vec<Op>,
    state: State,
    stack: Vec<State>,
}

impl RecordingContext {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
            state: State::default(),
            stack: Vec::new(),
        }
    }

    fn snapshot(&self) -> State {
        State {
            depth: self.stack.len(),
            ..self.state
        }
    }

    /// Labels of [`Probe`]s painted so far, in order.
    pub(crate) fn painted_labels(&self) -> Vec<u32> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Text(t, _) => t.strip_prefix("probe ")?.parse().ok(),
                _ => None,
            })
            .collect()
    }

    /// State of the fill that followed the labeled probe's announcement.
    pub(crate) fn fill_state_for_label(&self, label: u32) -> Option<State> {
        let marker = format!("probe {label}");
        let start = self
            .ops
            .iter()
            .position(|op| matches!(op, Op::Text(t, _) if *t == marker))?;
        self.ops[start..].iter().find_map(|op| match op {
            Op::FillRect(_, s) => Some(*s),
            _ => None,
        })
    }
}

impl Context2d for RecordingContext {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn save(&mut self) {
        self.stack.push(self.state);
        self.ops.push(Op::Save);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
        self.ops.push(Op::Restore);
    }

    fn set_fill_color(&mut self, color: Color) {
        self.state.fill = color;
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.state.stroke = color;
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.alpha = alpha;
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
        self.ops.push(Op::Clip(rect));
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.ops.push(Op::ClearRect(rect, self.state.transform));
    }

    fn fill_rect(&mut self, rect: Rect) {
        self.ops.push(Op::FillRect(rect, self.snapshot()));
    }

    fn stroke_rect(&mut self, rect: Rect) {
        self.ops.push(Op::StrokeRect(rect, self.snapshot()));
    }

    fn begin_path(&mut self) {}

    fn move_to(&mut self, _p: Point) {}

    fn line_to(&mut self, _p: Point) {}

    fn quad_to(&mut self, _ctrl: Point, _p: Point) {}

    fn curve_to(&mut self, _ctrl1: Point, _ctrl2: Point, _p: Point) {}

    fn arc(&mut self, _center: Point, _radius: f64, _start: f64, _end: f64, _ccw: bool) {}

    fn close_path(&mut self) {}

    fn fill(&mut self) {
        self.ops.push(Op::Fill(self.snapshot()));
    }

    fn stroke(&mut self) {
        self.ops.push(Op::Stroke(self.snapshot()));
    }

    fn fill_text(&mut self, text: &str, origin: Point) {
        self.ops.push(Op::Text(text.into(), origin));
    }
}

#[derive(Debug)]
pub(crate) struct RecordingBitmap {
    pub(crate) width: u32,
    pub(crate) height: u32,
    ctx: RecordingContext,
}

impl Deref for RecordingBitmap {
    type Target = RecordingContext;

    fn deref(&self) -> &RecordingContext {
        &self.ctx
    }
}

impl Bitmap for RecordingBitmap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn context(&mut self) -> Result<&mut dyn Context2d> {
        Ok(&mut self.ctx)
    }
}

/// A [`Surface`] over a [`RecordingContext`]. Set `fail_context` to simulate
/// a lost context.
#[derive(Debug)]
pub(crate) struct RecordingSurface {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) fail_context: bool,
    ctx: RecordingContext,
}

impl RecordingSurface {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fail_context: false,
            ctx: RecordingContext::new(width, height),
        }
    }
}

impl Deref for RecordingSurface {
    type Target = RecordingContext;

    fn deref(&self) -> &RecordingContext {
        &self.ctx
    }
}

impl DerefMut for RecordingSurface {
    fn deref_mut(&mut self) -> &mut RecordingContext {
        &mut self.ctx
    }
}

impl Surface for RecordingSurface {
    type Bitmap = RecordingBitmap;

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn context(&mut self) -> Result<&mut dyn Context2d> {
        if self.fail_context {
            return Err(Error::context_unavailable("recording surface lost"));
        }
        Ok(&mut self.ctx)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.width = width;
        self.height = height;
        self.ctx.width = width;
        self.ctx.height = height;
        Ok(())
    }

    fn create_bitmap(&mut self, width: u32, height: u32) -> Result<RecordingBitmap> {
        Ok(RecordingBitmap {
            width,
            height,
            ctx: RecordingContext::new(width, height),
        })
    }

    fn blit(&mut self, bitmap: &RecordingBitmap, origin: Point) -> Result<()> {
        self.ctx.ops.push(Op::Blit(origin, (bitmap.width, bitmap.height)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_context_tracks_state_stack() {
        let mut ctx = RecordingContext::new(10, 10);
        ctx.save();
        ctx.set_stroke_color(Color::WHITE);
        ctx.set_line_width(3.0);
        ctx.translate(Vec2::new(2.0, 0.0));
        ctx.clip_rect(Rect::new(0.0, 0.0, 4.0, 4.0));
        ctx.stroke_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        ctx.restore();
        ctx.stroke_rect(Rect::new(0.0, 0.0, 1.0, 1.0));

        let [.., Op::StrokeRect(_, inner), Op::Restore, Op::StrokeRect(_, outer)] =
            ctx.ops.as_slice()
        else {
            panic!("unexpected ops: {:?}", ctx.ops);
        };
        assert_eq!(inner.stroke, Color::WHITE);
        assert_eq!(inner.line_width, 3.0);
        assert_eq!(inner.clip, Some(Rect::new(2.0, 0.0, 6.0, 4.0)));
        assert_eq!(inner.depth, 1);
        assert_eq!(*outer, State::default(), "restore pops everything");
    }
}
