// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Array-backed storage: the drawing order itself, scanned linearly for queries.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt::Debug;
use kurbo::{Point, Rect, Size};
use understory_bsp::{rect_contains, rects_intersect};

use crate::changes::{ChangeLog, StorageChange};
use crate::protocol::{IndexSet, ObjectStorage, QueryOptions};
use crate::storable::{Storable, StorageId};

/// Storage keeping objects in a plain vector.
///
/// Every query walks the whole sequence. This is the simplest backend and the source of
/// truth for drawing order inside the BSP backends, which wrap one.
pub struct LinearStorage<T: Storable> {
    id: StorageId,
    objects: Vec<Rc<T>>,
    canvas: Size,
    changes: ChangeLog,
}

impl<T: Storable> LinearStorage<T> {
    /// Create an empty storage. The canvas size is only recorded.
    pub fn new(canvas: Size) -> Self {
        Self {
            id: StorageId::next(),
            objects: Vec::new(),
            canvas,
            changes: ChangeLog::default(),
        }
    }

    fn renumber_from(&self, start: usize) {
        for (i, object) in self.objects.iter().enumerate().skip(start) {
            object.set_z_index(i);
        }
    }

    /// Insert without recording a change. Returns the position actually used.
    pub(crate) fn splice_in(&mut self, object: Rc<T>, index: usize) -> usize {
        debug_assert!(
            self.index_of_object(&object).is_none(),
            "object inserted twice into the same storage"
        );
        let index = index.min(self.objects.len());
        object.set_storage(Some(self.id));
        self.objects.insert(index, object);
        self.renumber_from(index);
        index
    }

    /// Remove without recording a change.
    pub(crate) fn splice_out(&mut self, index: usize) -> Option<Rc<T>> {
        if index >= self.objects.len() {
            return None;
        }
        let object = self.objects.remove(index);
        object.set_storage(None);
        self.renumber_from(index);
        Some(object)
    }

    /// Replace without recording a change.
    pub(crate) fn splice_replace(&mut self, index: usize, object: Rc<T>) -> Option<Rc<T>> {
        let id = self.id;
        let slot = self.objects.get_mut(index)?;
        object.set_storage(Some(id));
        object.set_z_index(index);
        let old = core::mem::replace(slot, object);
        if !Rc::ptr_eq(&old, slot) {
            old.set_storage(None);
        }
        Some(old)
    }

    /// Move the object at `from` to `to` (clamped) without recording a change.
    /// Returns the position actually used.
    pub(crate) fn reposition(&mut self, from: usize, to: usize) -> usize {
        let to = to.min(self.objects.len().saturating_sub(1));
        if from != to && from < self.objects.len() {
            let object = self.objects.remove(from);
            self.objects.insert(to, object);
            self.renumber_from(from.min(to));
        }
        to
    }

    /// Swap in a whole new sequence without recording a change.
    pub(crate) fn replace_all(&mut self, objects: Vec<Rc<T>>) {
        for old in &self.objects {
            old.set_storage(None);
        }
        self.objects = objects;
        for object in &self.objects {
            object.set_storage(Some(self.id));
        }
        self.renumber_from(0);
    }

    pub(crate) fn record(&mut self, change: StorageChange) {
        self.changes.push(change);
    }

    pub(crate) fn set_canvas(&mut self, size: Size) -> bool {
        let changed = self.canvas != size;
        self.canvas = size;
        changed
    }

    /// Linear query honoring every option.
    pub(crate) fn scan(&self, rects: &[Rect], options: QueryOptions) -> Vec<Rc<T>> {
        let cull = !options.contains(QueryOptions::IGNORE_UPDATE_RECT);
        let mut out: Vec<Rc<T>> = self
            .objects
            .iter()
            .filter(|o| is_eligible(o.as_ref(), options))
            .filter(|o| {
                !cull || {
                    let bounds = o.bounds().abs();
                    rects.iter().any(|r| rects_intersect(&bounds, &r.abs()))
                }
            })
            .cloned()
            .collect();
        if options.contains(QueryOptions::REVERSE_ORDER) {
            out.reverse();
        }
        out
    }
}

/// Whether `object` passes the visibility filter of `options`.
pub(crate) fn is_eligible<T: Storable + ?Sized>(object: &T, options: QueryOptions) -> bool {
    object.is_visible() || options.contains(QueryOptions::INCLUDE_INVISIBLE)
}

/// Put candidates into the order `options` asks for.
///
/// `in_z_order` says whether `out` is already ascending by Z-index.
pub(crate) fn arrange<T: Storable>(out: &mut [Rc<T>], options: QueryOptions, in_z_order: bool) {
    if !in_z_order && !options.contains(QueryOptions::RELAXED_Z_ORDER) {
        out.sort_unstable_by_key(|o| o.z_index());
    }
    if options.contains(QueryOptions::REVERSE_ORDER) {
        out.reverse();
    }
}

impl<T: Storable> ObjectStorage<T> for LinearStorage<T> {
    fn id(&self) -> StorageId {
        self.id
    }

    fn objects_intersecting_rects(&self, rects: &[Rect], options: QueryOptions) -> Vec<Rc<T>> {
        self.scan(rects, options)
    }

    fn objects_containing_point(&self, point: Point) -> Vec<Rc<T>> {
        self.objects
            .iter()
            .filter(|o| o.is_visible() && rect_contains(&o.bounds().abs(), point))
            .cloned()
            .collect()
    }

    fn objects(&self) -> &[Rc<T>] {
        &self.objects
    }

    fn set_objects(&mut self, objects: Vec<Rc<T>>) {
        self.replace_all(objects);
        self.record(StorageChange::Reset);
    }

    fn insert_object(&mut self, object: Rc<T>, index: usize) {
        let index = self.splice_in(object, index);
        self.record(StorageChange::Inserted(IndexSet::from([index])));
    }

    fn remove_object(&mut self, index: usize) -> Option<Rc<T>> {
        let object = self.splice_out(index)?;
        self.record(StorageChange::Removed(IndexSet::from([index])));
        Some(object)
    }

    fn replace_object(&mut self, index: usize, object: Rc<T>) -> Option<Rc<T>> {
        let old = self.splice_replace(index, object)?;
        self.record(StorageChange::Replaced(index));
        Some(old)
    }

    fn insert_objects(&mut self, objects: Vec<Rc<T>>, indices: &IndexSet) {
        debug_assert_eq!(objects.len(), indices.len(), "one index per object");
        let mut placed = IndexSet::new();
        for (object, &index) in objects.into_iter().zip(indices) {
            placed.insert(self.splice_in(object, index));
        }
        self.record(StorageChange::Inserted(placed));
    }

    fn remove_objects(&mut self, indices: &IndexSet) -> Vec<Rc<T>> {
        let mut removed = Vec::with_capacity(indices.len());
        let mut positions = IndexSet::new();
        for &index in indices.iter().rev() {
            if let Some(object) = self.splice_out(index) {
                removed.push(object);
                positions.insert(index);
            }
        }
        removed.reverse();
        self.record(StorageChange::Removed(positions));
        removed
    }

    fn index_of_object(&self, object: &Rc<T>) -> Option<usize> {
        if object.storage() != Some(self.id) {
            return None;
        }
        let z = object.z_index();
        if self.objects.get(z).is_some_and(|o| Rc::ptr_eq(o, object)) {
            return Some(z);
        }
        self.objects.iter().position(|o| Rc::ptr_eq(o, object))
    }

    fn move_object(&mut self, object: &Rc<T>, index: usize) {
        let Some(from) = self.index_of_object(object) else {
            log::warn!("move_object: object is not owned by this storage");
            return;
        };
        let to = self.reposition(from, index);
        if from != to {
            self.record(StorageChange::Moved { from, to });
        }
    }

    fn object_did_change_bounds(&mut self, _object: &Rc<T>, _old_bounds: Rect) {}

    fn object_did_change_visibility(&mut self, _object: &Rc<T>) {}

    fn canvas_size(&self) -> Size {
        self.canvas
    }

    fn set_canvas_size(&mut self, size: Size) {
        self.set_canvas(size);
    }

    fn set_change_tracking(&mut self, enabled: bool) {
        self.changes.set_tracking(enabled);
    }

    fn is_tracking_changes(&self) -> bool {
        self.changes.is_tracking()
    }

    fn take_changes(&mut self) -> Vec<StorageChange> {
        self.changes.take()
    }
}

impl<T: Storable> Debug for LinearStorage<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LinearStorage")
            .field("id", &self.id)
            .field("objects", &self.objects.len())
            .field("canvas", &self.canvas)
            .finish_non_exhaustive()
    }
}
