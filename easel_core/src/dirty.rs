// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty tracking: the global flag, the accumulated redraw region, and
//! per-drawable change channels.
//!
//! Two layers of state live here:
//!
//! - **Region state** decides *whether* and *where* to repaint. A boolean
//!   dirty flag, a "whole surface" flag, and a single bounding-box union of
//!   marked rectangles. Union is a plain bounding box, so marking is O(1).
//! - **Per-drawable channels** record *which* drawables changed and how, in
//!   an [`understory_dirty`] tracker keyed by registry slot index. The
//!   renderer drains them once per frame into [`DrawableChanges`] for
//!   diagnostics; they never affect what gets painted.
//!
//! # Invariants
//!
//! - The dirty flag is set whenever a region or the whole-surface flag is.
//! - [`consume_region`](DirtyTracker::consume_region) takes the region but
//!   leaves the flag set; only [`clear`](DirtyTracker::clear), called once
//!   after a frame is painted, resets it.

use alloc::vec::Vec;

use kurbo::Rect;
use understory_dirty::{Channel, CycleHandling, DirtyTracker as ChannelTracker};

use crate::drawable::Drawable;
use crate::geometry;

/// Paint-affecting properties changed (generation bump or visibility).
pub const PAINT: Channel = Channel::new(0);

/// Bounds changed.
pub const GEOMETRY: Channel = Channel::new(1);

/// Paint order changed.
pub const ORDER: Channel = Channel::new(2);

/// Drawable added to or removed from the registry.
pub const MEMBERSHIP: Channel = Channel::new(3);

/// What a frame must repaint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RedrawRegion {
    /// The entire surface.
    Full,
    /// The given rectangle (surface coordinates).
    Partial(Rect),
    /// Nothing has area, though something may still have changed.
    Empty,
}

impl RedrawRegion {
    /// Returns `true` for [`RedrawRegion::Full`].
    #[must_use]
    pub const fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }

    /// Returns the rectangle this region covers on a surface of the given
    /// size, or `None` if it covers nothing there.
    #[must_use]
    pub fn to_rect(&self, width: u32, height: u32) -> Option<Rect> {
        let surface = geometry::surface_rect(width, height);
        match *self {
            Self::Full => Some(surface),
            Self::Partial(r) => {
                let clipped = r.intersect(surface);
                (!geometry::is_degenerate(clipped)).then_some(clipped)
            }
            Self::Empty => None,
        }
    }
}

/// Slot indices drained from the per-drawable change channels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrawableChanges {
    /// Drawables whose paint-affecting properties changed.
    pub painted: Vec<u32>,
    /// Drawables whose bounds changed.
    pub moved: Vec<u32>,
    /// Drawables whose paint order changed.
    pub reordered: Vec<u32>,
    /// Slots where a drawable was added or removed.
    pub membership: Vec<u32>,
}

impl DrawableChanges {
    /// Returns `true` if no channel recorded anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.painted.is_empty()
            && self.moved.is_empty()
            && self.reordered.is_empty()
            && self.membership.is_empty()
    }
}

/// Tracks whether the surface needs repainting and where.
pub struct DirtyTracker {
    dirty: bool,
    all: bool,
    region: Option<Rect>,
    channels: ChannelTracker<u32>,
}

impl core::fmt::Debug for DirtyTracker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DirtyTracker")
            .field("dirty", &self.dirty)
            .field("all", &self.all)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl Default for DirtyTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DirtyTracker {
    /// Creates a clean tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dirty: false,
            all: false,
            region: None,
            channels: ChannelTracker::with_cycle_handling(CycleHandling::Error),
        }
    }

    /// Marks the entire surface dirty.
    pub fn mark_all(&mut self) {
        self.dirty = true;
        self.all = true;
    }

    /// Unions `bounds` into the redraw region.
    ///
    /// A degenerate rectangle still sets the dirty flag but adds no area. A
    /// non-finite rectangle escalates to [`mark_all`](Self::mark_all).
    pub fn mark_region(&mut self, bounds: Rect) {
        self.dirty = true;
        if self.all {
            return;
        }
        if !geometry::is_finite(bounds) {
            tracing::debug!(?bounds, "non-finite dirty rect, repainting everything");
            self.all = true;
            self.region = None;
            return;
        }
        if geometry::is_degenerate(bounds) {
            return;
        }
        self.region = Some(match self.region {
            Some(r) => r.union(bounds),
            None => bounds,
        });
    }

    /// Marks the drawable's current bounds.
    pub fn mark_object(&mut self, drawable: &dyn Drawable) {
        self.mark_region(drawable.bounds());
    }

    /// Records a per-drawable change on `channel` for slot `idx`.
    ///
    /// This feeds diagnostics only; callers still mark a region.
    pub fn mark_drawable(&mut self, idx: u32, channel: Channel) {
        self.channels.mark(idx, channel);
    }

    /// Drops channel state for a slot that is being freed.
    pub fn forget(&mut self, idx: u32) {
        self.channels.remove_key(idx);
    }

    /// Returns `true` if anything changed since the last [`clear`](Self::clear).
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns `true` if the whole surface is marked.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.all
    }

    /// Returns the pending region without consuming it.
    #[must_use]
    pub fn peek_region(&self) -> RedrawRegion {
        if self.all {
            RedrawRegion::Full
        } else {
            match self.region {
                Some(r) => RedrawRegion::Partial(r),
                None => RedrawRegion::Empty,
            }
        }
    }

    /// Takes the accumulated region. The dirty flag stays set until
    /// [`clear`](Self::clear).
    pub fn consume_region(&mut self) -> RedrawRegion {
        let region = self.peek_region();
        self.all = false;
        self.region = None;
        region
    }

    /// Drains every per-drawable channel.
    pub fn drain_changes(&mut self) -> DrawableChanges {
        DrawableChanges {
            painted: self.drain_channel(PAINT),
            moved: self.drain_channel(GEOMETRY),
            reordered: self.drain_channel(ORDER),
            membership: self.drain_channel(MEMBERSHIP),
        }
    }

    fn drain_channel(&mut self, channel: Channel) -> Vec<u32> {
        self.channels.drain(channel).deterministic().run().collect()
    }

    /// Resets to clean. Call exactly once after a frame has been painted.
    pub fn clear(&mut self) {
        self.dirty = false;
        self.all = false;
        self.region = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tracker_is_clean() {
        let mut t = DirtyTracker::new();
        assert!(!t.is_dirty());
        assert_eq!(t.consume_region(), RedrawRegion::Empty);
        assert!(t.drain_changes().is_empty());
    }

    #[test]
    fn regions_union_to_bounding_box() {
        let mut t = DirtyTracker::new();
        t.mark_region(Rect::new(0.0, 0.0, 10.0, 10.0));
        t.mark_region(Rect::new(20.0, 5.0, 30.0, 40.0));
        assert!(t.is_dirty());
        assert_eq!(
            t.consume_region(),
            RedrawRegion::Partial(Rect::new(0.0, 0.0, 30.0, 40.0))
        );
    }

    #[test]
    fn consume_keeps_flag_until_clear() {
        let mut t = DirtyTracker::new();
        t.mark_all();
        assert_eq!(t.consume_region(), RedrawRegion::Full);
        assert!(t.is_dirty(), "still dirty until the frame is painted");
        assert_eq!(t.consume_region(), RedrawRegion::Empty);
        t.clear();
        assert!(!t.is_dirty());
    }

    #[test]
    fn degenerate_rect_sets_flag_without_area() {
        let mut t = DirtyTracker::new();
        t.mark_region(Rect::new(5.0, 5.0, 5.0, 20.0));
        assert!(t.is_dirty(), "zero-size changes are still changes");
        assert_eq!(t.peek_region(), RedrawRegion::Empty);
    }

    #[test]
    fn mark_all_absorbs_regions() {
        let mut t = DirtyTracker::new();
        t.mark_region(Rect::new(0.0, 0.0, 1.0, 1.0));
        t.mark_all();
        t.mark_region(Rect::new(5.0, 5.0, 6.0, 6.0));
        assert_eq!(t.consume_region(), RedrawRegion::Full);
    }

    #[test]
    fn non_finite_escalates_to_full() {
        let mut t = DirtyTracker::new();
        t.mark_region(Rect::new(0.0, 0.0, f64::INFINITY, 1.0));
        assert!(t.is_all());
    }

    #[test]
    fn channels_drain_sorted_and_once() {
        let mut t = DirtyTracker::new();
        t.mark_drawable(3, PAINT);
        t.mark_drawable(1, PAINT);
        t.mark_drawable(2, MEMBERSHIP);
        let changes = t.drain_changes();
        assert_eq!(changes.painted.len(), 2);
        assert!(changes.painted.contains(&1) && changes.painted.contains(&3));
        assert_eq!(changes.membership, &[2]);
        assert!(t.drain_changes().is_empty(), "drained channels are empty");
    }

    #[test]
    fn region_clipped_to_surface() {
        let r = RedrawRegion::Partial(Rect::new(-10.0, -10.0, 20.0, 20.0));
        assert_eq!(r.to_rect(100, 100), Some(Rect::new(0.0, 0.0, 20.0, 20.0)));
        let off = RedrawRegion::Partial(Rect::new(200.0, 0.0, 210.0, 10.0));
        assert_eq!(off.to_rect(100, 100), None);
        assert_eq!(RedrawRegion::Full.to_rect(4, 3), Some(Rect::new(0.0, 0.0, 4.0, 3.0)));
    }
}
