// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The frame executor.
//!
//! A [`Renderer`] owns a [`Surface`], a [`DrawableRegistry`] and a
//! [`BitmapCache`], and turns pending changes into one frame per
//! [`render`](Renderer::render) call:
//!
//! ```text
//!   Idle ──► CheckDirty ──┬──► SkipFrame              (nothing changed)
//!                         │
//!                         └──► Clearing ──► Painting ──► Done
//! ```
//!
//! - **CheckDirty**: drop cache entries of removed or changed drawables and
//!   every entry that no longer matches its drawable, hidden or not. Then
//!   refuse to run on a lost context, and skip the frame if the dirty
//!   tracker is clean.
//! - **Clearing**: consume the redraw region. A full region, or
//!   [`RendererConfig::auto_clear`], clears the whole surface; otherwise only
//!   the pixel-aligned redraw rectangle is cleared and painting is clipped to
//!   it.
//! - **Painting**: frame hooks, then every visible drawable intersecting the
//!   redraw rectangle in registry order, each bracketed by save/restore.
//!   Cached drawables are blitted when their entry still matches.
//! - **Done**: clear the dirty tracker and report.
//!
//! A drawable whose paint call fails is skipped for the frame and reported;
//! the rest of the frame proceeds.

use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Rect};

use crate::cache::{BitmapCache, CacheEntry, Lookup, Placement};
use crate::context::{Bitmap, Color, Context2d, Surface};
use crate::dirty::{DrawableChanges, RedrawRegion};
use crate::drawable::Drawable;
use crate::error::{Error, Result};
use crate::geometry;
use crate::registry::{DrawableId, DrawableRegistry};
#[cfg(feature = "trace-rich")]
use crate::trace::{CacheEvent, CacheEventKind};
use crate::trace::{FrameBeginEvent, PaintFailureEvent, Tracer};

/// Renderer options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RendererConfig {
    /// Clear the whole surface on every executed frame, even when only a
    /// region is dirty. Defaults to `true`.
    pub auto_clear: bool,
    /// Fill cleared pixels with this color instead of leaving them
    /// transparent.
    pub clear_color: Option<Color>,
    /// After a stale cache entry is discarded, paint the drawable into a
    /// fresh cache entry the next time it is painted directly.
    pub recache_stale: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            auto_clear: true,
            clear_color: None,
            recache_stale: false,
        }
    }
}

/// Stage of the frame state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FramePhase {
    /// No frame has run yet.
    #[default]
    Idle,
    /// Deciding whether anything needs painting.
    CheckDirty,
    /// The last frame was skipped because nothing was dirty.
    SkipFrame,
    /// Clearing the redraw area.
    Clearing,
    /// Painting drawables.
    Painting,
    /// The last frame completed.
    Done,
}

/// Outcome of one [`Renderer::render`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    /// Frame counter (counts every `render()` call).
    pub frame_index: u64,
    /// `true` if nothing was dirty and nothing was painted.
    pub skipped: bool,
    /// The region consumed from the dirty tracker.
    pub region: RedrawRegion,
    /// Whether the whole surface was cleared.
    pub full_clear: bool,
    /// Drawables painted directly.
    pub painted: u32,
    /// Drawables blitted from the cache.
    pub blitted: u32,
    /// Visible drawables outside the redraw rectangle.
    pub culled: u32,
    /// Invisible drawables.
    pub hidden: u32,
    /// Drawables whose paint call failed.
    pub failed: u32,
    /// Per-drawable changes since the previous executed frame.
    pub changes: DrawableChanges,
}

impl FrameReport {
    fn skipped(frame_index: u64) -> Self {
        Self {
            frame_index,
            skipped: true,
            region: RedrawRegion::Empty,
            full_clear: false,
            painted: 0,
            blitted: 0,
            culled: 0,
            hidden: 0,
            failed: 0,
            changes: DrawableChanges::default(),
        }
    }
}

/// What a [`FrameHook`] is told about the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInfo {
    /// Frame counter.
    pub frame_index: u64,
    /// The consumed redraw region.
    pub region: RedrawRegion,
    /// The rectangle being repainted (the whole surface on a full clear).
    pub target: Rect,
    /// Whether the whole surface was cleared.
    pub full_clear: bool,
}

/// Extension point that runs at fixed points of every executed frame.
///
/// Hooks run in registration order, each bracketed by save/restore, with the
/// frame's clip in effect. `before_frame` runs after clearing and before any
/// drawable; `after_frame` runs after the last drawable. Skipped frames run no
/// hooks.
pub trait FrameHook {
    /// Called before drawables are painted.
    fn before_frame(&mut self, ctx: &mut dyn Context2d, info: &FrameInfo) {
        _ = (ctx, info);
    }

    /// Called after drawables are painted.
    fn after_frame(&mut self, ctx: &mut dyn Context2d, info: &FrameInfo) {
        _ = (ctx, info);
    }
}

/// Owns a surface and everything needed to repaint it incrementally.
pub struct Renderer<S: Surface> {
    surface: S,
    registry: DrawableRegistry,
    cache: BitmapCache<S::Bitmap>,
    /// Drawables whose stale entry is re-cached on their next direct paint.
    recache: BTreeSet<DrawableId>,
    hooks: Vec<Box<dyn FrameHook>>,
    config: RendererConfig,
    frame_index: u64,
    phase: FramePhase,
    lost: Option<Error>,
}

impl<S: Surface> fmt::Debug for Renderer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("size", &(self.surface.width(), self.surface.height()))
            .field("registry", &self.registry)
            .field("cache", &self.cache)
            .field("hooks", &self.hooks.len())
            .field("config", &self.config)
            .field("frame_index", &self.frame_index)
            .field("phase", &self.phase)
            .field("lost", &self.lost)
            .finish()
    }
}

impl<S: Surface> Renderer<S> {
    /// Creates a renderer with the default configuration.
    pub fn new(surface: S) -> Result<Self> {
        Self::with_config(surface, RendererConfig::default())
    }

    /// Creates a renderer.
    ///
    /// Fails with [`Error::ContextUnavailable`] if the surface cannot yield a
    /// drawing context. The first frame repaints everything.
    pub fn with_config(mut surface: S, config: RendererConfig) -> Result<Self> {
        surface.context().map_err(as_context_error)?;
        let mut registry = DrawableRegistry::new();
        registry.dirty_mut().mark_all();
        Ok(Self {
            surface,
            registry,
            cache: BitmapCache::new(),
            recache: BTreeSet::new(),
            hooks: Vec::new(),
            config,
            frame_index: 0,
            phase: FramePhase::Idle,
            lost: None,
        })
    }

    // -- Accessors --

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Mutable configuration. Changes apply from the next frame.
    pub fn config_mut(&mut self) -> &mut RendererConfig {
        &mut self.config
    }

    /// The surface.
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable surface access. Drawing on it directly bypasses dirty
    /// tracking; call [`mark_all`](Self::mark_all) afterwards if needed.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Consumes the renderer, returning its surface.
    pub fn into_surface(self) -> S {
        self.surface
    }

    /// The registry.
    #[must_use]
    pub fn registry(&self) -> &DrawableRegistry {
        &self.registry
    }

    /// Mutable registry access.
    pub fn registry_mut(&mut self) -> &mut DrawableRegistry {
        &mut self.registry
    }

    /// Index of the next frame.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Where the last `render()` call ended.
    #[must_use]
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Returns `true` if something changed since the last executed frame.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.registry.dirty().is_dirty()
    }

    /// Returns the sticky context error, if the surface was lost.
    #[must_use]
    pub fn context_error(&self) -> Option<&Error> {
        self.lost.as_ref()
    }

    // -- Registry delegates --

    /// See [`DrawableRegistry::add`].
    pub fn add<D: Drawable>(&mut self, drawable: D) -> Result<DrawableId> {
        self.registry.add(drawable)
    }

    /// Removes a drawable and discards its cache entry.
    pub fn remove(&mut self, id: DrawableId) -> Result<Box<dyn Drawable>> {
        let drawable = self.registry.remove(id)?;
        self.cache.invalidate(id);
        self.recache.remove(&id);
        Ok(drawable)
    }

    /// See [`DrawableRegistry::update`].
    pub fn update<D: Drawable, R>(
        &mut self,
        id: DrawableId,
        f: impl FnOnce(&mut D) -> R,
    ) -> Result<R> {
        self.registry.update(id, f)
    }

    /// Announces an out-of-band change and discards the drawable's cache entry.
    pub fn mark_changed(&mut self, id: DrawableId) -> Result<()> {
        self.registry.mark_changed(id)?;
        self.cache.invalidate(id);
        Ok(())
    }

    /// See [`DrawableRegistry::bring_to_front`].
    pub fn bring_to_front(&mut self, id: DrawableId) -> Result<()> {
        self.registry.bring_to_front(id)
    }

    /// See [`DrawableRegistry::send_to_back`].
    pub fn send_to_back(&mut self, id: DrawableId) -> Result<()> {
        self.registry.send_to_back(id)
    }

    /// Marks the whole surface for repaint.
    pub fn mark_all(&mut self) {
        self.registry.dirty_mut().mark_all();
    }

    /// Registers a frame hook. Hooks run in registration order.
    pub fn add_hook(&mut self, hook: impl FrameHook + 'static) {
        self.hooks.push(Box::new(hook));
    }

    /// Resizes the surface and marks everything dirty.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.surface.resize(width, height)?;
        tracing::debug!(width, height, "surface resized");
        self.registry.dirty_mut().mark_all();
        Ok(())
    }

    // -- Cache --

    /// Paints a drawable into an offscreen bitmap and caches it.
    ///
    /// Later frames blit the bitmap while the drawable's generation, pixel
    /// size and sub-pixel phase stay the same. Paint errors are returned as
    /// [`Error::PaintFailure`].
    pub fn cache(&mut self, id: DrawableId) -> Result<()> {
        let drawable = self.registry.get(id).ok_or_else(|| {
            Error::invalid(alloc::format!("stale or unknown drawable handle {id:?}"))
        })?;
        let entry = paint_entry(&mut self.surface, drawable)?;
        tracing::debug!(drawable = ?id, size = ?entry.placement.size, "cached drawable");
        self.cache.insert(id, entry);
        self.recache.remove(&id);
        Ok(())
    }

    /// Discards a drawable's cache entry. Returns `true` if one existed.
    pub fn invalidate_cache(&mut self, id: DrawableId) -> bool {
        self.recache.remove(&id);
        self.cache.invalidate(id)
    }

    /// Returns `true` if `id` has a cache entry (matching or not).
    #[must_use]
    pub fn is_cached(&self, id: DrawableId) -> bool {
        self.cache.contains(id)
    }

    /// The bitmap cache.
    #[must_use]
    pub fn bitmap_cache(&self) -> &BitmapCache<S::Bitmap> {
        &self.cache
    }

    // -- Frames --

    /// Renders a frame. See [`render_traced`](Self::render_traced).
    pub fn render(&mut self) -> Result<FrameReport> {
        self.render_traced(&mut Tracer::none())
    }

    /// Renders a frame if anything is dirty.
    ///
    /// A clean renderer returns a skipped report without touching the surface.
    /// Paint failures are reported through `tracer` and counted in the report;
    /// they never fail the frame. Fails with [`Error::ContextUnavailable`] if
    /// the surface is lost, now or earlier.
    pub fn render_traced(&mut self, tracer: &mut Tracer<'_>) -> Result<FrameReport> {
        let frame_index = self.frame_index;
        self.frame_index += 1;
        self.phase = FramePhase::CheckDirty;

        for id in self.registry.take_removed() {
            self.recache.remove(&id);
            if self.cache.invalidate(id) {
                trace_cache(tracer, frame_index, id, CacheOp::Discarded);
            }
        }
        for id in self.registry.take_changed() {
            if self.cache.invalidate(id) {
                trace_cache(tracer, frame_index, id, CacheOp::Discarded);
            }
        }
        // Stale entries go now, not when their drawable is next painted.
        let registry = &self.registry;
        let stale = self.cache.discard_stale(|id, entry| {
            registry
                .get(id)
                .is_some_and(|d| entry.matches(d.generation(), d.bounds()))
        });
        for id in stale {
            trace_cache(tracer, frame_index, id, CacheOp::Discarded);
            if self.config.recache_stale {
                self.recache.insert(id);
            }
        }

        if let Some(err) = &self.lost {
            return Err(err.clone());
        }
        if !self.registry.dirty().is_dirty() {
            self.phase = FramePhase::SkipFrame;
            tracer.frame_skipped(frame_index);
            let report = FrameReport::skipped(frame_index);
            tracer.frame_end(&report);
            return Ok(report);
        }

        // Acquire the context before consuming anything, so a lost surface
        // leaves dirty state intact.
        self.checked_context()?;

        self.phase = FramePhase::Clearing;
        let (width, height) = (self.surface.width(), self.surface.height());
        let region = self.registry.dirty_mut().consume_region();
        let full_clear = region.is_full() || self.config.auto_clear;
        let target = if full_clear {
            Some(geometry::surface_rect(width, height))
        } else {
            region.to_rect(width, height).map(geometry::pixel_aligned)
        };
        tracer.frame_begin(&FrameBeginEvent {
            frame_index,
            region,
            full_clear,
        });

        let mut report = FrameReport {
            frame_index,
            skipped: false,
            region,
            full_clear,
            painted: 0,
            blitted: 0,
            culled: 0,
            hidden: 0,
            failed: 0,
            changes: DrawableChanges::default(),
        };

        if let Some(target) = target {
            self.paint_frame(frame_index, target, &mut report, tracer)?;
        }

        report.changes = self.registry.dirty_mut().drain_changes();
        #[cfg(feature = "trace-rich")]
        tracer.drawable_changes(frame_index, &report.changes);
        self.registry.dirty_mut().clear();
        self.phase = FramePhase::Done;
        tracer.frame_end(&report);
        Ok(report)
    }

    fn paint_frame(
        &mut self,
        frame_index: u64,
        target: Rect,
        report: &mut FrameReport,
        tracer: &mut Tracer<'_>,
    ) -> Result<()> {
        let info = FrameInfo {
            frame_index,
            region: report.region,
            target,
            full_clear: report.full_clear,
        };

        {
            let ctx = self.checked_context()?;
            ctx.save();
            ctx.reset_transform();
            ctx.clear_rect(target);
            if let Some(color) = self.config.clear_color {
                ctx.save();
                ctx.set_fill_color(color);
                ctx.fill_rect(target);
                ctx.restore();
            }
            if !report.full_clear {
                ctx.clip_rect(target);
            }
        }

        self.phase = FramePhase::Painting;
        self.run_hooks(&info, HookPoint::Before)?;

        let Self {
            surface,
            registry,
            cache,
            recache,
            lost,
            ..
        } = self;
        for (id, drawable) in registry.iter() {
            if !drawable.is_visible() {
                report.hidden += 1;
                continue;
            }
            let bounds = drawable.bounds();
            if !geometry::overlaps(bounds, target) {
                report.culled += 1;
                continue;
            }

            let hit = cache.lookup(id, drawable.generation(), bounds) == Lookup::Hit;
            let result = match cache.get(id) {
                Some(entry) if hit => {
                    let origin = Placement::of(bounds).origin;
                    blit_entry(surface, lost, entry, origin).map(|()| {
                        report.blitted += 1;
                        trace_cache(tracer, frame_index, id, CacheOp::Blitted);
                    })
                }
                _ => paint_direct(surface, lost, drawable).map(|()| {
                    report.painted += 1;
                }),
            };

            match result {
                Ok(()) => {
                    if !hit && recache.remove(&id) {
                        match paint_entry(surface, drawable) {
                            Ok(entry) => {
                                cache.insert(id, entry);
                                trace_cache(tracer, frame_index, id, CacheOp::Stored);
                            }
                            Err(err) => {
                                tracing::debug!(drawable = ?id, %err, "recache failed");
                            }
                        }
                    }
                }
                Err(err @ Error::ContextUnavailable(_)) => return Err(err),
                Err(err) => {
                    let err = as_paint_error(err);
                    report.failed += 1;
                    tracing::warn!(frame = frame_index, drawable = ?id, %err, "drawable failed to paint");
                    tracer.paint_failure(&PaintFailureEvent {
                        frame_index,
                        drawable: id,
                        error: &err,
                    });
                }
            }
        }

        self.run_hooks(&info, HookPoint::After)?;
        self.checked_context()?.restore();
        Ok(())
    }

    fn run_hooks(&mut self, info: &FrameInfo, point: HookPoint) -> Result<()> {
        if self.hooks.is_empty() {
            return Ok(());
        }
        let ctx = context_of(&mut self.surface, &mut self.lost)?;
        for hook in &mut self.hooks {
            ctx.save();
            match point {
                HookPoint::Before => hook.before_frame(ctx, info),
                HookPoint::After => hook.after_frame(ctx, info),
            }
            ctx.restore();
        }
        Ok(())
    }

    fn checked_context(&mut self) -> Result<&mut dyn Context2d> {
        context_of(&mut self.surface, &mut self.lost)
    }
}

#[derive(Clone, Copy, Debug)]
enum HookPoint {
    Before,
    After,
}

/// Gets the surface context, recording a failure as a sticky loss.
fn context_of<'s, S: Surface>(
    surface: &'s mut S,
    lost: &mut Option<Error>,
) -> Result<&'s mut dyn Context2d> {
    match surface.context() {
        Ok(ctx) => Ok(ctx),
        Err(err) => {
            let err = as_context_error(err);
            tracing::warn!(%err, "drawing context lost");
            *lost = Some(err.clone());
            Err(err)
        }
    }
}

fn paint_direct<S: Surface>(
    surface: &mut S,
    lost: &mut Option<Error>,
    drawable: &dyn Drawable,
) -> Result<()> {
    let ctx = context_of(surface, lost)?;
    ctx.save();
    let result = drawable.paint(ctx);
    ctx.restore();
    result.map_err(as_paint_error)
}

fn blit_entry<S: Surface>(
    surface: &mut S,
    lost: &mut Option<Error>,
    entry: &CacheEntry<S::Bitmap>,
    origin: Point,
) -> Result<()> {
    context_of(surface, lost)?.save();
    let result = surface.blit(&entry.bitmap, origin);
    context_of(surface, lost)?.restore();
    result.map_err(as_paint_error)
}

/// Paints `drawable` into a fresh bitmap in local space.
fn paint_entry<S: Surface>(
    surface: &mut S,
    drawable: &dyn Drawable,
) -> Result<CacheEntry<S::Bitmap>> {
    let bounds = geometry::validate_bounds(drawable.bounds())?;
    let placement = Placement::of(bounds);
    let (w, h) = placement.size;
    let mut bitmap = surface.create_bitmap(w, h)?;
    {
        let ctx = bitmap.context()?;
        ctx.save();
        ctx.translate(-placement.origin.to_vec2());
        let result = drawable.paint(ctx);
        ctx.restore();
        result.map_err(as_paint_error)?;
    }
    Ok(CacheEntry {
        bitmap,
        generation: drawable.generation(),
        placement,
    })
}

fn as_context_error(err: Error) -> Error {
    match err {
        Error::ContextUnavailable(_) => err,
        other => Error::context_unavailable(other.to_string()),
    }
}

fn as_paint_error(err: Error) -> Error {
    match err {
        Error::PaintFailure(_) => err,
        other => Error::paint(other.to_string()),
    }
}

#[derive(Clone, Copy, Debug)]
enum CacheOp {
    Stored,
    Blitted,
    Discarded,
}

fn trace_cache(tracer: &mut Tracer<'_>, frame_index: u64, id: DrawableId, op: CacheOp) {
    if !matches!(op, CacheOp::Blitted) {
        tracing::debug!(frame = frame_index, drawable = ?id, ?op, "cache entry updated");
    }
    #[cfg(feature = "trace-rich")]
    tracer.cache_event(&CacheEvent {
        frame_index,
        drawable: id,
        kind: match op {
            CacheOp::Stored => CacheEventKind::Stored,
            CacheOp::Blitted => CacheEventKind::Blitted,
            CacheOp::Discarded => CacheEventKind::Discarded,
        },
    });
    #[cfg(not(feature = "trace-rich"))]
    {
        _ = (tracer, frame_index, id, op);
    }
}
