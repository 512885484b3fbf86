// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animated scene rendered headlessly.
//!
//! Runs a fixed-interval scheduler over a simulated clock for a few seconds
//! of animation. Each tick moves a cached block, pulses a disc, blinks a
//! caption, and fills a meter that overshoots its range (and so fails to
//! paint) for part of every cycle. Trace events go to a
//! [`PrettyPrintSink`] on stderr and a [`RecorderSink`], which is exported
//! as Chrome trace JSON at the end.
//!
//! Usage: `headless_demo [TRACE_PATH]` (default `easel-trace.json`). Set
//! `RUST_LOG=debug` for renderer and driver logs.

use std::cell::{Cell, RefCell};
use std::error::Error as StdError;
use std::f64::consts::TAU;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::rc::Rc;

use easel_backend_headless::{HeadlessSurface, catch_panics, run_ticks_with};
use easel_core::context::{Color, Context2d};
use easel_core::dirty::DrawableChanges;
use easel_core::drawable::{Drawable, Generation};
use easel_core::frame::{FrameReport, Renderer, RendererConfig};
use easel_core::registry::DrawableId;
use easel_core::scheduler::{Scheduler, SchedulerConfig};
use easel_core::time::{Duration, HostTime};
use easel_core::trace::{
    CacheEvent, FrameBeginEvent, PaintFailureEvent, SchedulerTransitionEvent, TickEvent,
    TickFailureEvent, TraceSink, Tracer,
};
use easel_core::{Error, Result};
use easel_debug::chrome;
use easel_debug::pretty::PrettyPrintSink;
use easel_debug::recorder::{RecordedEvent, RecorderSink};
use kurbo::{Point, Rect, Size};
use tracing_subscriber::EnvFilter;

const WIDTH: u32 = 320;
const HEIGHT: u32 = 200;
const TICKS: u64 = 180;
const INTERVAL_MS: u64 = 16;

// -- drawables ---------------------------------------------------------------

#[derive(Debug)]
struct Block {
    rect: Rect,
    color: Color,
}

impl Drawable for Block {
    fn paint(&self, ctx: &mut dyn Context2d) -> Result<()> {
        ctx.set_fill_color(self.color);
        ctx.fill_rect(self.rect);
        ctx.set_stroke_color(Color::BLACK);
        ctx.set_line_width(2.0);
        ctx.stroke_rect(self.rect);
        Ok(())
    }

    fn bounds(&self) -> Rect {
        // Half the stroke lies outside the rectangle.
        self.rect.inset(1.0)
    }

    fn generation(&self) -> u64 {
        0
    }
}

#[derive(Debug)]
struct Disc {
    center: Point,
    radius: f64,
    color: Color,
    generation: Generation,
}

impl Disc {
    fn set_color(&mut self, color: Color) {
        if self.color != color {
            self.color = color;
            self.generation.bump();
        }
    }
}

impl Drawable for Disc {
    fn paint(&self, ctx: &mut dyn Context2d) -> Result<()> {
        ctx.begin_path();
        ctx.arc(self.center, self.radius, 0.0, TAU, false);
        ctx.set_fill_color(self.color);
        ctx.fill();
        Ok(())
    }

    fn bounds(&self) -> Rect {
        Rect::from_center_size(self.center, Size::new(2.0 * self.radius, 2.0 * self.radius))
    }

    fn generation(&self) -> u64 {
        self.generation.get()
    }
}

#[derive(Debug)]
struct Caption {
    text: &'static str,
    origin: Point,
    visible: bool,
}

impl Drawable for Caption {
    fn paint(&self, ctx: &mut dyn Context2d) -> Result<()> {
        ctx.set_fill_color(Color::BLACK);
        ctx.fill_text(self.text, self.origin);
        Ok(())
    }

    fn bounds(&self) -> Rect {
        // Rough extent of a 12px sans-serif run.
        let width = 7.0 * self.text.len() as f64;
        Rect::new(
            self.origin.x,
            self.origin.y - 12.0,
            self.origin.x + width,
            self.origin.y + 4.0,
        )
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn generation(&self) -> u64 {
        0
    }
}

#[derive(Debug)]
struct Meter {
    frame: Rect,
    value: f64,
    generation: Generation,
}

impl Drawable for Meter {
    fn paint(&self, ctx: &mut dyn Context2d) -> Result<()> {
        if !(0.0..=1.0).contains(&self.value) {
            return Err(Error::paint(format!(
                "meter value {:.2} is outside [0, 1]",
                self.value
            )));
        }
        ctx.set_stroke_color(Color::BLACK);
        ctx.set_line_width(1.0);
        ctx.stroke_rect(self.frame);
        let mut fill = self.frame;
        fill.x1 = fill.x0 + self.frame.width() * self.value;
        ctx.set_fill_color(Color::rgb(40, 160, 80));
        ctx.fill_rect(fill);
        Ok(())
    }

    fn bounds(&self) -> Rect {
        self.frame.inset(1.0)
    }

    fn generation(&self) -> u64 {
        self.generation.get()
    }
}

// -- scene -------------------------------------------------------------------

#[derive(Debug)]
struct Scene {
    renderer: Renderer<HeadlessSurface>,
    block: DrawableId,
    disc: DrawableId,
    caption: DrawableId,
    meter: DrawableId,
}

impl Scene {
    fn new() -> Result<Self> {
        let mut renderer = Renderer::with_config(
            HeadlessSurface::new(WIDTH, HEIGHT),
            RendererConfig {
                auto_clear: false,
                clear_color: Some(Color::WHITE),
                recache_stale: true,
            },
        )?;
        let block = renderer.add(Block {
            rect: Rect::new(20.0, 40.0, 60.0, 70.0),
            color: Color::rgb(220, 60, 60),
        })?;
        let disc = renderer.add(Disc {
            center: Point::new(240.0, 60.0),
            radius: 20.0,
            color: Color::rgb(60, 90, 220),
            generation: Generation::new(),
        })?;
        let caption = renderer.add(Caption {
            text: "easel headless",
            origin: Point::new(20.0, 150.0),
            visible: true,
        })?;
        let meter = renderer.add(Meter {
            frame: Rect::new(20.0, 170.0, 300.0, 185.0),
            value: 0.0,
            generation: Generation::new(),
        })?;
        renderer.cache(block)?;
        Ok(Self {
            renderer,
            block,
            disc,
            caption,
            meter,
        })
    }

    /// Poses the scene at `t` seconds.
    fn animate(&mut self, t: f64) -> Result<()> {
        // Triangle wave across the canvas, snapped to whole pixels so the
        // cached bitmap stays reusable.
        let phase = (t * 0.5).fract();
        let x = (20.0 + 220.0 * (1.0 - (2.0 * phase - 1.0).abs())).round();
        self.renderer.update(self.block, |b: &mut Block| {
            b.rect = Rect::from_origin_size((x, 40.0), (40.0, 30.0));
        })?;

        let second = t.floor();
        self.renderer.update(self.disc, |d: &mut Disc| {
            d.radius = 20.0 + 8.0 * (t * 3.0).sin();
            d.set_color(if second % 2.0 == 0.0 {
                Color::rgb(60, 90, 220)
            } else {
                Color::rgb(230, 160, 30)
            });
        })?;

        self.renderer.update(self.caption, |c: &mut Caption| {
            c.visible = second % 2.0 == 0.0;
        })?;

        // Overshoots to 1.2 near the end of each cycle.
        let value = (t * 0.4).fract() * 1.2;
        self.renderer.update(self.meter, |m: &mut Meter| {
            m.value = value;
            m.generation.bump();
        })?;
        Ok(())
    }
}

// -- sinks -------------------------------------------------------------------

/// Forwards every event to both sinks.
struct Tee {
    recorder: RecorderSink,
    pretty: PrettyPrintSink,
}

impl TraceSink for Tee {
    fn on_tick(&mut self, e: &TickEvent) {
        self.recorder.on_tick(e);
        self.pretty.on_tick(e);
    }

    fn on_scheduler_transition(&mut self, e: &SchedulerTransitionEvent) {
        self.recorder.on_scheduler_transition(e);
        self.pretty.on_scheduler_transition(e);
    }

    fn on_tick_failure(&mut self, e: &TickFailureEvent<'_>) {
        self.recorder.on_tick_failure(e);
        self.pretty.on_tick_failure(e);
    }

    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.recorder.on_frame_begin(e);
        self.pretty.on_frame_begin(e);
    }

    fn on_frame_skipped(&mut self, frame_index: u64) {
        self.recorder.on_frame_skipped(frame_index);
        self.pretty.on_frame_skipped(frame_index);
    }

    fn on_frame_end(&mut self, report: &FrameReport) {
        self.recorder.on_frame_end(report);
        self.pretty.on_frame_end(report);
    }

    fn on_paint_failure(&mut self, e: &PaintFailureEvent<'_>) {
        self.recorder.on_paint_failure(e);
        self.pretty.on_paint_failure(e);
    }

    fn on_drawable_changes(&mut self, frame_index: u64, changes: &DrawableChanges) {
        self.recorder.on_drawable_changes(frame_index, changes);
        self.pretty.on_drawable_changes(frame_index, changes);
    }

    fn on_cache_event(&mut self, e: &CacheEvent) {
        self.recorder.on_cache_event(e);
        self.pretty.on_cache_event(e);
    }
}

// -- main --------------------------------------------------------------------

fn main() -> std::result::Result<(), Box<dyn StdError>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let out_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "easel-trace.json".to_owned());
    let timebase = easel_backend_headless::timebase();

    let sinks = Rc::new(RefCell::new(Tee {
        recorder: RecorderSink::new(),
        pretty: PrettyPrintSink::stderr(timebase),
    }));
    let scene = Rc::new(RefCell::new(Scene::new()?));

    let config = SchedulerConfig::fixed_interval(Duration::from_millis(INTERVAL_MS, timebase))
        .with_max_delta(Duration::from_millis(100, timebase));
    let mut scheduler = Scheduler::new(config)?;

    let callback = {
        let scene = Rc::clone(&scene);
        let sinks = Rc::clone(&sinks);
        catch_panics(move |info| {
            let mut sinks = sinks.borrow_mut();
            // The driver runs untraced so the callback can own the sinks.
            sinks.on_tick(&TickEvent::from(info));
            let mut scene = scene.borrow_mut();
            scene.animate(info.elapsed.as_secs_f64(timebase))?;
            scene.renderer.render_traced(&mut Tracer::new(&mut *sinks))?;
            Ok(())
        })
    };

    // Simulated clock: sleeping advances it instantly.
    let clock = Rc::new(Cell::new(1_000_000_000_u64));
    scheduler.start_traced(
        callback,
        HostTime(clock.get()),
        &mut Tracer::new(&mut *sinks.borrow_mut()),
    );
    let summary = {
        let now = Rc::clone(&clock);
        let sleep = Rc::clone(&clock);
        run_ticks_with(
            &mut scheduler,
            TICKS,
            move || HostTime(now.get()),
            move |d| sleep.set(sleep.get() + d.ticks()),
            &mut Tracer::none(),
        )
    };
    scheduler.stop_traced(&mut Tracer::new(&mut *sinks.borrow_mut()));

    let sinks = sinks.borrow();
    let events = sinks.recorder.events();
    let frames = events
        .iter()
        .filter(|e| matches!(e, RecordedEvent::FrameEnd(r) if !r.skipped))
        .count();
    let blits = events
        .iter()
        .filter_map(|e| match e {
            RecordedEvent::FrameEnd(r) => Some(r.blitted),
            _ => None,
        })
        .sum::<u32>();
    let painted_pixels = scene
        .borrow()
        .renderer
        .surface()
        .canvas()
        .pixels()
        .iter()
        .filter(|c| !c.is_transparent())
        .count();
    tracing::info!(
        delivered = summary.delivered,
        failed = summary.failed,
        frames,
        blits,
        paint_failures = sinks.recorder.failure_count(),
        painted_pixels,
        "animation finished"
    );

    let mut writer = BufWriter::new(File::create(&out_path)?);
    chrome::export(events, timebase, &mut writer)?;
    writer.flush()?;
    tracing::info!(path = %out_path, events = events.len(), "wrote Chrome trace");
    Ok(())
}
