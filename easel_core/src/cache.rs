// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Offscreen bitmap cache.
//!
//! A cache entry holds a bitmap of one drawable painted in *local space*: the
//! drawable is translated so the pixel-aligned corner of its bounds lands at
//! the bitmap origin, and the bitmap is blitted back at that corner. A pure
//! translation by whole pixels therefore keeps the entry valid.
//!
//! An entry is reused only while the drawable's generation, the bitmap's
//! pixel size and the sub-pixel phase of its bounds all match what was
//! recorded when it was painted. Anything else is a stale entry and must be
//! discarded. There is no eviction policy: entries exist because a caller
//! asked for them and leave when invalidated or when their drawable is
//! removed.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Rect, Vec2};

use crate::geometry;
use crate::registry::DrawableId;

/// Where and at what size a drawable's bounds land on the pixel grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Pixel-aligned top-left corner, in surface coordinates.
    pub origin: Point,
    /// Bitmap size in pixels.
    pub size: (u32, u32),
    /// Offset of the true bounds origin from `origin`, in `[0, 1)`.
    pub phase: Vec2,
}

impl Placement {
    /// Computes the placement of `bounds`.
    #[must_use]
    pub fn of(bounds: Rect) -> Self {
        let aligned = geometry::pixel_aligned(bounds);
        Self {
            origin: aligned.origin(),
            size: geometry::pixel_size(aligned),
            phase: bounds.origin() - aligned.origin(),
        }
    }
}

/// A cached bitmap and what it was painted from.
#[derive(Debug)]
pub struct CacheEntry<B> {
    /// The painted bitmap.
    pub bitmap: B,
    /// Drawable generation at paint time.
    pub generation: u64,
    /// Placement of the drawable's bounds at paint time.
    pub placement: Placement,
}

impl<B> CacheEntry<B> {
    /// Returns `true` if the entry still depicts a drawable with the given
    /// generation and current bounds.
    #[must_use]
    pub fn matches(&self, generation: u64, bounds: Rect) -> bool {
        let now = Placement::of(bounds);
        self.generation == generation
            && self.placement.size == now.size
            && self.placement.phase == now.phase
    }
}

/// Outcome of a cache lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lookup {
    /// A matching entry exists.
    Hit,
    /// An entry exists but no longer matches.
    Stale,
    /// No entry.
    Miss,
}

/// Bitmap cache keyed by drawable.
pub struct BitmapCache<B> {
    entries: BTreeMap<DrawableId, CacheEntry<B>>,
}

impl<B> fmt::Debug for BitmapCache<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitmapCache")
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl<B> Default for BitmapCache<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> BitmapCache<B> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `id` has an entry, matching or not.
    #[must_use]
    pub fn contains(&self, id: DrawableId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Returns the entry for `id`.
    #[must_use]
    pub fn get(&self, id: DrawableId) -> Option<&CacheEntry<B>> {
        self.entries.get(&id)
    }

    /// Classifies the entry for `id` against the drawable's current state.
    #[must_use]
    pub fn lookup(&self, id: DrawableId, generation: u64, bounds: Rect) -> Lookup {
        match self.entries.get(&id) {
            Some(entry) if entry.matches(generation, bounds) => Lookup::Hit,
            Some(_) => Lookup::Stale,
            None => Lookup::Miss,
        }
    }

    /// Stores an entry, replacing (and dropping) any previous one.
    pub fn insert(&mut self, id: DrawableId, entry: CacheEntry<B>) {
        self.entries.insert(id, entry);
    }

    /// Discards the entry for `id`. Returns `true` if one existed.
    pub fn invalidate(&mut self, id: DrawableId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Discards every entry for which `is_current` returns `false`, and
    /// returns their ids in key order.
    pub fn discard_stale(
        &mut self,
        mut is_current: impl FnMut(DrawableId, &CacheEntry<B>) -> bool,
    ) -> Vec<DrawableId> {
        let mut stale = Vec::new();
        self.entries.retain(|&id, entry| {
            let keep = is_current(id, entry);
            if !keep {
                stale.push(id);
            }
            keep
        });
        stale
    }

    /// Discards every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
