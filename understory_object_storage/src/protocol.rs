// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The storage protocol shared by every backend.

use alloc::collections::BTreeSet;
use alloc::rc::Rc;
use alloc::vec::Vec;
use bitflags::bitflags;
use kurbo::{BezPath, Point, Rect, Size};

use crate::changes::StorageChange;
use crate::storable::{Storable, StorageId};

/// A sorted set of positions in the drawing order.
pub type IndexSet = BTreeSet<usize>;

bitflags! {
    /// Options for [`ObjectStorage::objects_intersecting_rect`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct QueryOptions: u8 {
        /// Return objects top to bottom instead of bottom to top.
        const REVERSE_ORDER = 0b0000_0001;
        /// Include objects that are not visible.
        const INCLUDE_INVISIBLE = 0b0000_0010;
        /// Skip spatial culling and return every eligible object.
        const IGNORE_UPDATE_RECT = 0b0000_0100;
        /// The caller does not need drawing order; backends may skip sorting.
        /// The set of objects returned is unchanged.
        const RELAXED_Z_ORDER = 0b0000_1000;
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::empty()
    }
}

/// Operations every object storage exposes.
///
/// A storage exclusively owns a sequence of objects whose order is the drawing order
/// (position 0 is drawn first). Every object's [`z_index`](Storable::z_index) equals its
/// position. Query results come back in drawing order unless
/// [`QueryOptions::RELAXED_Z_ORDER`] is given.
///
/// All operations are total: out-of-range positions and objects the storage does not own
/// are ignored (and reported through `Option`s where a value is returned).
///
/// Once [`set_change_tracking`](Self::set_change_tracking) is switched on, mutations of the
/// sequence are recorded as [`StorageChange`]s, drained with
/// [`take_changes`](Self::take_changes).
pub trait ObjectStorage<T: Storable> {
    /// Identity stamped on every object this storage owns.
    fn id(&self) -> StorageId;

    /// Objects intersecting any of `rects`, typically the pieces of an update region.
    fn objects_intersecting_rects(&self, rects: &[Rect], options: QueryOptions) -> Vec<Rc<T>>;

    /// Objects intersecting `rect`.
    fn objects_intersecting_rect(&self, rect: Rect, options: QueryOptions) -> Vec<Rc<T>> {
        self.objects_intersecting_rects(&[rect], options)
    }

    /// Visible objects whose bounds contain `point`, in drawing order.
    fn objects_containing_point(&self, point: Point) -> Vec<Rc<T>>;

    /// Every object, in drawing order.
    fn objects(&self) -> &[Rc<T>];

    /// Replace the whole sequence, e.g. after loading a document.
    fn set_objects(&mut self, objects: Vec<Rc<T>>);

    /// Number of objects.
    fn count(&self) -> usize {
        self.objects().len()
    }

    /// The object at `index`.
    fn object_at(&self, index: usize) -> Option<&Rc<T>> {
        self.objects().get(index)
    }

    /// The objects at `indices`, skipping positions out of range.
    fn objects_at(&self, indices: &IndexSet) -> Vec<Rc<T>> {
        indices
            .iter()
            .filter_map(|&i| self.object_at(i).cloned())
            .collect()
    }

    /// Insert `object` at `index`; an index past the end appends.
    fn insert_object(&mut self, object: Rc<T>, index: usize);

    /// Remove and return the object at `index`.
    fn remove_object(&mut self, index: usize) -> Option<Rc<T>>;

    /// Put `object` at `index`, returning the object it replaced.
    fn replace_object(&mut self, index: usize, object: Rc<T>) -> Option<Rc<T>>;

    /// Insert `objects` so they end up at `indices`.
    ///
    /// Pairs are applied in ascending index order, as a sequence of single insertions.
    /// `objects` and `indices` must have the same length; release builds ignore the surplus.
    fn insert_objects(&mut self, objects: Vec<Rc<T>>, indices: &IndexSet);

    /// Remove the objects at `indices`, returning them in ascending position order.
    fn remove_objects(&mut self, indices: &IndexSet) -> Vec<Rc<T>>;

    /// Whether `object` is owned by this storage.
    fn contains_object(&self, object: &Rc<T>) -> bool {
        self.index_of_object(object).is_some()
    }

    /// Position of `object`.
    fn index_of_object(&self, object: &Rc<T>) -> Option<usize>;

    /// Move `object` so that it ends up at `index` (clamped to the last position).
    fn move_object(&mut self, object: &Rc<T>, index: usize);

    /// `object`'s bounds changed from `old_bounds` to its current bounds.
    fn object_did_change_bounds(&mut self, object: &Rc<T>, old_bounds: Rect);

    /// `object`'s visibility flipped.
    fn object_did_change_visibility(&mut self, object: &Rc<T>);

    /// The canvas size spatial backends partition.
    fn canvas_size(&self) -> Size;

    /// Change the canvas size. Spatial backends rebuild.
    fn set_canvas_size(&mut self, size: Size);

    /// Start or stop recording changes to the drawing order. Off by default; stopping
    /// discards anything not yet taken.
    fn set_change_tracking(&mut self, enabled: bool);

    /// Whether changes are being recorded.
    fn is_tracking_changes(&self) -> bool;

    /// Drain recorded changes to the drawing order.
    fn take_changes(&mut self) -> Vec<StorageChange>;

    /// Outline of the spatial divisions, for backends that have any.
    fn debug_storage_divisions(&self) -> Option<BezPath> {
        None
    }
}
