// Copyright 2026 the Easel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered drawable storage with generational handles.
//!
//! Drawables live in a slot arena. Paint order is a doubly linked list
//! threaded through the slots (`next`/`prev` index arrays), so insertion at
//! either end, removal and reordering are all O(1) and never shift other
//! entries. Freed slots are recycled through a free list; each slot carries a
//! version that is bumped on removal so stale [`DrawableId`]s are rejected.
//!
//! The registry owns its [`DirtyTracker`]. Every structural change and every
//! mutation made through [`update`](DrawableRegistry::update) or announced
//! with [`mark_changed`](DrawableRegistry::mark_changed) marks the affected
//! region. To detect changes the registry keeps, per slot, the bounds,
//! visibility and generation it last observed.

use alloc::boxed::Box;
use alloc::format;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use kurbo::Rect;

use crate::dirty::{self, DirtyTracker};
use crate::drawable::Drawable;
use crate::error::{Error, Result};
use crate::geometry;

/// Sentinel for "no slot" in link fields.
const INVALID: u32 = u32::MAX;

/// A handle to a drawable in a [`DrawableRegistry`].
///
/// Contains the slot index and the slot's version at insertion time, so a
/// handle to a removed drawable never aliases a later occupant of the slot.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DrawableId {
    pub(crate) idx: u32,
    pub(crate) version: u32,
}

impl DrawableId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the slot version.
    #[inline]
    #[must_use]
    pub const fn version(self) -> u32 {
        self.version
    }
}

impl fmt::Debug for DrawableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DrawableId({}v{})", self.idx, self.version)
    }
}

/// What the registry last saw of a drawable.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Observed {
    bounds: Rect,
    visible: bool,
    generation: u64,
}

impl Observed {
    fn of(drawable: &dyn Drawable) -> Self {
        Self {
            bounds: drawable.bounds(),
            visible: drawable.is_visible(),
            generation: drawable.generation(),
        }
    }
}

/// Ordered collection of drawables; insertion order is paint order.
pub struct DrawableRegistry {
    // -- Storage --
    slots: Vec<Option<Box<dyn Drawable>>>,
    observed: Vec<Observed>,
    version: Vec<u32>,

    // -- Paint order --
    next: Vec<u32>,
    prev: Vec<u32>,
    head: u32,
    tail: u32,

    // -- Allocation --
    free_list: Vec<u32>,
    len: u32,

    dirty: DirtyTracker,
    pending_removed: Vec<DrawableId>,
    pending_changed: Vec<DrawableId>,
}

impl fmt::Debug for DrawableRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawableRegistry")
            .field("len", &self.len)
            .field("slots", &self.slots.len())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl Default for DrawableRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawableRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            observed: Vec::new(),
            version: Vec::new(),
            next: Vec::new(),
            prev: Vec::new(),
            head: INVALID,
            tail: INVALID,
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::new(),
            pending_removed: Vec::new(),
            pending_changed: Vec::new(),
        }
    }

    /// Number of live drawables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns `true` if the registry holds no drawables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends a drawable at the top of the paint order.
    ///
    /// The drawable's bounds are marked dirty. Fails with
    /// [`Error::InvalidArgument`] if its bounds are non-finite or have a
    /// negative size.
    pub fn add<D: Drawable>(&mut self, drawable: D) -> Result<DrawableId> {
        self.add_boxed(Box::new(drawable))
    }

    /// Like [`add`](Self::add), for an already boxed drawable.
    pub fn add_boxed(&mut self, drawable: Box<dyn Drawable>) -> Result<DrawableId> {
        geometry::validate_bounds(drawable.bounds())?;
        let observed = Observed::of(&*drawable);

        let idx = if let Some(idx) = self.free_list.pop() {
            self.slots[idx as usize] = Some(drawable);
            self.observed[idx as usize] = observed;
            idx
        } else {
            let idx = u32::try_from(self.slots.len())
                .ok()
                .filter(|&i| i != INVALID)
                .ok_or_else(|| Error::invalid("drawable registry is full"))?;
            self.slots.push(Some(drawable));
            self.observed.push(observed);
            self.version.push(0);
            self.next.push(INVALID);
            self.prev.push(INVALID);
            idx
        };
        self.len += 1;
        self.link_back(idx);

        if observed.visible {
            self.dirty.mark_region(observed.bounds);
        } else {
            self.dirty.mark_region(Rect::ZERO);
        }
        self.dirty.mark_drawable(idx, dirty::MEMBERSHIP);

        Ok(DrawableId {
            idx,
            version: self.version[idx as usize],
        })
    }

    /// Removes a drawable and returns it.
    ///
    /// Marks its last painted bounds dirty if it was visible. The id is queued
    /// for [`take_removed`](Self::take_removed) so cache entries can be
    /// discarded.
    pub fn remove(&mut self, id: DrawableId) -> Result<Box<dyn Drawable>> {
        self.validate(id)?;
        let idx = id.idx;
        let drawable = self.slots[idx as usize]
            .take()
            .ok_or_else(|| stale(id))?;

        self.unlink(idx);
        let seen = self.observed[idx as usize];
        if seen.visible || drawable.is_visible() {
            self.dirty.mark_region(seen.bounds);
            self.dirty.mark_region(drawable.bounds());
        }

        self.dirty.forget(idx);
        self.dirty.mark_drawable(idx, dirty::MEMBERSHIP);
        self.version[idx as usize] = self.version[idx as usize].wrapping_add(1);
        self.free_list.push(idx);
        self.len -= 1;
        self.pending_removed.push(id);
        Ok(drawable)
    }

    /// Returns `true` if `id` refers to a live drawable.
    #[must_use]
    pub fn contains(&self, id: DrawableId) -> bool {
        self.validate(id).is_ok()
    }

    /// Returns the drawable for `id`, if live.
    #[must_use]
    pub fn get(&self, id: DrawableId) -> Option<&dyn Drawable> {
        self.validate(id).ok()?;
        self.slots[id.idx as usize].as_deref()
    }

    /// Mutates a drawable of concrete type `D` and marks whatever changed.
    ///
    /// Bounds, visibility and generation are compared before and after `f`
    /// runs. Any difference marks the union of the old and new bounds. If the
    /// new bounds are malformed the whole surface is marked.
    ///
    /// Fails with [`Error::InvalidArgument`] for a stale handle or if the
    /// drawable is not a `D`; `f` is not called in either case.
    pub fn update<D: Drawable, R>(
        &mut self,
        id: DrawableId,
        f: impl FnOnce(&mut D) -> R,
    ) -> Result<R> {
        self.update_dyn(id, |d| {
            let any: &mut dyn Any = d;
            any.downcast_mut::<D>().map(f)
        })?
        .ok_or_else(|| {
            Error::invalid(format!(
                "drawable {id:?} is not a {}",
                core::any::type_name::<D>()
            ))
        })
    }

    /// Mutates a drawable through its trait object and marks whatever changed.
    pub fn update_dyn<R>(
        &mut self,
        id: DrawableId,
        f: impl FnOnce(&mut (dyn Drawable + 'static)) -> R,
    ) -> Result<R> {
        self.validate(id)?;
        let drawable = self.slots[id.idx as usize]
            .as_deref_mut()
            .ok_or_else(|| stale(id))?;
        let out = f(drawable);
        self.sync(id.idx, false);
        Ok(out)
    }

    /// Announces that a drawable changed out of band (for example through
    /// interior mutability). Its old and new bounds are marked
    /// unconditionally, and the id is queued for
    /// [`take_changed`](Self::take_changed).
    pub fn mark_changed(&mut self, id: DrawableId) -> Result<()> {
        self.validate(id)?;
        self.sync(id.idx, true);
        if !self.pending_changed.contains(&id) {
            self.pending_changed.push(id);
        }
        Ok(())
    }

    /// Moves a drawable to the top of the paint order.
    pub fn bring_to_front(&mut self, id: DrawableId) -> Result<()> {
        self.validate(id)?;
        if self.tail == id.idx {
            return Ok(());
        }
        self.unlink(id.idx);
        self.link_back(id.idx);
        self.mark_reordered(id.idx);
        Ok(())
    }

    /// Moves a drawable to the bottom of the paint order.
    pub fn send_to_back(&mut self, id: DrawableId) -> Result<()> {
        self.validate(id)?;
        if self.head == id.idx {
            return Ok(());
        }
        self.unlink(id.idx);
        self.link_front(id.idx);
        self.mark_reordered(id.idx);
        Ok(())
    }

    /// Iterates drawables in paint order (bottom first).
    ///
    /// The iterator borrows the registry, so it cannot be mutated while a
    /// traversal is in progress. Call again to restart.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            registry: self,
            cursor: self.head,
            remaining: self.len as usize,
        }
    }

    /// Returns and clears the ids removed since the last call.
    pub fn take_removed(&mut self) -> Vec<DrawableId> {
        core::mem::take(&mut self.pending_removed)
    }

    /// Returns and clears the ids passed to
    /// [`mark_changed`](Self::mark_changed) since the last call.
    pub fn take_changed(&mut self) -> Vec<DrawableId> {
        core::mem::take(&mut self.pending_changed)
    }

    /// The dirty tracker.
    #[must_use]
    pub fn dirty(&self) -> &DirtyTracker {
        &self.dirty
    }

    /// Mutable access to the dirty tracker, for explicit marking.
    pub fn dirty_mut(&mut self) -> &mut DirtyTracker {
        &mut self.dirty
    }

    // -- Internals --

    fn validate(&self, id: DrawableId) -> Result<()> {
        let idx = id.idx as usize;
        if idx < self.slots.len() && self.version[idx] == id.version && self.slots[idx].is_some() {
            Ok(())
        } else {
            Err(stale(id))
        }
    }

    fn sync(&mut self, idx: u32, force: bool) {
        let Some(drawable) = self.slots[idx as usize].as_deref() else {
            return;
        };
        let before = self.observed[idx as usize];
        let after = Observed::of(drawable);
        self.observed[idx as usize] = after;

        let moved = before.bounds != after.bounds;
        let painted = before.generation != after.generation || before.visible != after.visible;
        if !(force || moved || painted) {
            return;
        }
        if moved {
            self.dirty.mark_drawable(idx, dirty::GEOMETRY);
        }
        if painted || force {
            self.dirty.mark_drawable(idx, dirty::PAINT);
        }

        if let Err(err) = geometry::validate_bounds(after.bounds) {
            tracing::warn!(slot = idx, %err, "drawable reported malformed bounds");
            self.dirty.mark_all();
            return;
        }
        if before.visible || after.visible {
            self.dirty.mark_region(before.bounds);
            self.dirty.mark_region(after.bounds);
        } else {
            // Hidden before and after: flag only.
            self.dirty.mark_region(Rect::ZERO);
        }
    }

    fn mark_reordered(&mut self, idx: u32) {
        self.dirty.mark_drawable(idx, dirty::ORDER);
        let seen = self.observed[idx as usize];
        if seen.visible {
            self.dirty.mark_region(seen.bounds);
        }
    }

    fn link_back(&mut self, idx: u32) {
        self.prev[idx as usize] = self.tail;
        self.next[idx as usize] = INVALID;
        if self.tail == INVALID {
            self.head = idx;
        } else {
            self.next[self.tail as usize] = idx;
        }
        self.tail = idx;
    }

    fn link_front(&mut self, idx: u32) {
        self.next[idx as usize] = self.head;
        self.prev[idx as usize] = INVALID;
        if self.head == INVALID {
            self.tail = idx;
        } else {
            self.prev[self.head as usize] = idx;
        }
        self.head = idx;
    }

    fn unlink(&mut self, idx: u32) {
        let prev = self.prev[idx as usize];
        let next = self.next[idx as usize];
        if prev == INVALID {
            self.head = next;
        } else {
            self.next[prev as usize] = next;
        }
        if next == INVALID {
            self.tail = prev;
        } else {
            self.prev[next as usize] = prev;
        }
        self.prev[idx as usize] = INVALID;
        self.next[idx as usize] = INVALID;
    }
}

fn stale(id: DrawableId) -> Error {
    Error::invalid(format!("stale or unknown drawable handle {id:?}"))
}

/// Paint-order iterator returned by [`DrawableRegistry::iter`].
pub struct Iter<'a> {
    registry: &'a DrawableRegistry,
    cursor: u32,
    remaining: usize,
}

impl fmt::Debug for Iter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("cursor", &self.cursor)
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (DrawableId, &'a dyn Drawable);

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor != INVALID {
            let idx = self.cursor;
            self.cursor = self.registry.next[idx as usize];
            if let Some(d) = self.registry.slots[idx as usize].as_deref() {
                self.remaining = self.remaining.saturating_sub(1);
                let id = DrawableId {
                    idx,
                    version: self.registry.version[idx as usize],
                };
                return Some((id, d));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a DrawableRegistry {
    type Item = (DrawableId, &'a dyn Drawable);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirty::RedrawRegion;
    use crate::testing::Probe;

    fn labels(reg: &DrawableRegistry) -> Vec<u32> {
        reg.iter().map(|(id, _)| id.index()).collect()
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut reg = DrawableRegistry::new();
        let a = reg.add(Probe::new(Rect::new(0.0, 0.0, 1.0, 1.0))).unwrap();
        let b = reg.add(Probe::new(Rect::new(1.0, 0.0, 2.0, 1.0))).unwrap();
        let c = reg.add(Probe::new(Rect::new(2.0, 0.0, 3.0, 1.0))).unwrap();
        assert_eq!(labels(&reg), &[a.index(), b.index(), c.index()]);
        assert_eq!(reg.iter().len(), 3);
        // Restartable.
        assert_eq!(labels(&reg), &[a.index(), b.index(), c.index()]);
    }

    #[test]
    fn remove_preserves_order_of_rest() {
        let mut reg = DrawableRegistry::new();
        let ids: Vec<_> = (0..4)
            .map(|i| {
                let x = f64::from(i);
                reg.add(Probe::new(Rect::new(x, 0.0, x + 1.0, 1.0))).unwrap()
            })
            .collect();
        reg.remove(ids[1]).unwrap();
        assert_eq!(labels(&reg), &[ids[0].index(), ids[2].index(), ids[3].index()]);
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.take_removed(), &[ids[1]]);
        assert!(reg.take_removed().is_empty(), "queue drains once");
    }

    #[test]
    fn stale_handles_are_rejected() {
        let mut reg = DrawableRegistry::new();
        let a = reg.add(Probe::new(Rect::new(0.0, 0.0, 1.0, 1.0))).unwrap();
        reg.remove(a).unwrap();
        let b = reg.add(Probe::new(Rect::new(0.0, 0.0, 1.0, 1.0))).unwrap();
        assert_eq!(a.index(), b.index(), "slot is reused");
        assert_ne!(a, b);
        assert!(!reg.contains(a));
        assert!(matches!(reg.remove(a), Err(Error::InvalidArgument(_))));
        assert!(matches!(reg.update_dyn(a, |_| ()), Err(Error::InvalidArgument(_))));
        assert!(matches!(reg.bring_to_front(a), Err(Error::InvalidArgument(_))));
        assert!(reg.get(a).is_none());
        assert!(reg.get(b).is_some());
    }

    #[test]
    fn add_rejects_malformed_bounds() {
        let mut reg = DrawableRegistry::new();
        let bad = Probe::new(Rect::new(10.0, 10.0, 0.0, 20.0));
        assert!(matches!(reg.add(bad), Err(Error::InvalidArgument(_))));
        assert!(reg.is_empty());
        assert!(!reg.dirty().is_dirty(), "rejected add does not mark");
    }

    #[test]
    fn add_and_remove_mark_bounds() {
        let mut reg = DrawableRegistry::new();
        let a = reg.add(Probe::new(Rect::new(0.0, 0.0, 10.0, 10.0))).unwrap();
        assert_eq!(
            reg.dirty_mut().consume_region(),
            RedrawRegion::Partial(Rect::new(0.0, 0.0, 10.0, 10.0))
        );
        reg.dirty_mut().clear();
        reg.remove(a).unwrap();
        assert!(reg.dirty().is_dirty());
        assert_eq!(
            reg.dirty().peek_region(),
            RedrawRegion::Partial(Rect::new(0.0, 0.0, 10.0, 10.0))
        );
    }

    #[test]
    fn removing_hidden_drawable_marks_nothing() {
        let mut reg = DrawableRegistry::new();
        let mut p = Probe::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        p.visible = false;
        let a = reg.add(p).unwrap();
        reg.dirty_mut().clear();
        reg.remove(a).unwrap();
        assert!(!reg.dirty().is_dirty());
    }

    #[test]
    fn update_marks_old_and_new_bounds() {
        let mut reg = DrawableRegistry::new();
        let a = reg.add(Probe::new(Rect::new(0.0, 0.0, 10.0, 10.0))).unwrap();
        reg.dirty_mut().clear();
        let _ = reg.dirty_mut().drain_changes();

        reg.update(a, |p: &mut Probe| p.translate(10.0)).unwrap();
        assert_eq!(
            reg.dirty().peek_region(),
            RedrawRegion::Partial(Rect::new(0.0, 0.0, 20.0, 10.0))
        );
        let changes = reg.dirty_mut().drain_changes();
        assert_eq!(changes.moved, &[a.index()]);
        assert!(changes.painted.is_empty(), "translation is not a repaint");
    }

    #[test]
    fn update_without_change_stays_clean() {
        let mut reg = DrawableRegistry::new();
        let a = reg.add(Probe::new(Rect::new(0.0, 0.0, 10.0, 10.0))).unwrap();
        reg.dirty_mut().clear();
        let bounds = reg.update_dyn(a, |d| d.bounds()).unwrap();
        assert_eq!(bounds, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(!reg.dirty().is_dirty());
    }

    #[test]
    fn generation_bump_marks_paint_channel() {
        let mut reg = DrawableRegistry::new();
        let a = reg.add(Probe::new(Rect::new(0.0, 0.0, 10.0, 10.0))).unwrap();
        reg.dirty_mut().clear();
        let _ = reg.dirty_mut().drain_changes();
        reg.update(a, Probe::touch).unwrap();
        assert!(reg.dirty().is_dirty());
        assert_eq!(reg.dirty_mut().drain_changes().painted, &[a.index()]);
    }

    #[test]
    fn malformed_bounds_after_update_marks_everything() {
        let mut reg = DrawableRegistry::new();
        let a = reg.add(Probe::new(Rect::new(0.0, 0.0, 10.0, 10.0))).unwrap();
        reg.dirty_mut().clear();
        reg.update(a, |p: &mut Probe| p.bounds = Rect::new(0.0, f64::NAN, 1.0, 1.0))
            .unwrap();
        assert_eq!(reg.dirty().peek_region(), RedrawRegion::Full);
    }

    #[test]
    fn hidden_mutation_sets_flag_only() {
        let mut reg = DrawableRegistry::new();
        let mut p = Probe::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        p.visible = false;
        let a = reg.add(p).unwrap();
        reg.dirty_mut().clear();
        reg.update(a, Probe::touch).unwrap();
        assert!(reg.dirty().is_dirty());
        assert_eq!(reg.dirty().peek_region(), RedrawRegion::Empty);
    }

    #[test]
    fn mark_changed_marks_unconditionally() {
        let mut reg = DrawableRegistry::new();
        let a = reg.add(Probe::new(Rect::new(5.0, 5.0, 10.0, 10.0))).unwrap();
        reg.dirty_mut().clear();
        reg.mark_changed(a).unwrap();
        assert_eq!(
            reg.dirty().peek_region(),
            RedrawRegion::Partial(Rect::new(5.0, 5.0, 10.0, 10.0))
        );
        reg.mark_changed(a).unwrap();
        assert_eq!(reg.take_changed(), &[a], "queued once");
        assert!(reg.take_changed().is_empty());
    }

    #[test]
    fn reordering() {
        let mut reg = DrawableRegistry::new();
        let a = reg.add(Probe::new(Rect::new(0.0, 0.0, 1.0, 1.0))).unwrap();
        let b = reg.add(Probe::new(Rect::new(0.0, 0.0, 2.0, 2.0))).unwrap();
        let c = reg.add(Probe::new(Rect::new(0.0, 0.0, 3.0, 3.0))).unwrap();
        reg.dirty_mut().clear();

        reg.bring_to_front(a).unwrap();
        assert_eq!(labels(&reg), &[b.index(), c.index(), a.index()]);
        assert_eq!(
            reg.dirty().peek_region(),
            RedrawRegion::Partial(Rect::new(0.0, 0.0, 1.0, 1.0))
        );

        reg.send_to_back(c).unwrap();
        assert_eq!(labels(&reg), &[c.index(), b.index(), a.index()]);
        assert_eq!(reg.dirty_mut().drain_changes().reordered.len(), 2);

        reg.dirty_mut().clear();
        reg.send_to_back(c).unwrap();
        assert!(!reg.dirty().is_dirty(), "already at the back");
    }
}
