// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The capability surface every stored object provides.

use core::cell::Cell;
use core::sync::atomic::{AtomicUsize, Ordering};
use kurbo::Rect;
use understory_bsp::Mark;

/// Opaque identity of a storage instance.
///
/// Objects record the id of the storage that owns them instead of a pointer back to it, so
/// ownership only ever flows from storage to object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StorageId(usize);

impl StorageId {
    /// A fresh id, distinct from every other id handed out in this process.
    pub(crate) fn next() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// An object that can live in an [`ObjectStorage`](crate::ObjectStorage).
///
/// Objects are shared as `Rc<T>`; identity is pointer identity. Setters take `&self` and are
/// meant for storage internals only: client code reads [`z_index`](Self::z_index) and
/// [`storage`](Self::storage) but never writes them. [`StorableState`] provides the
/// bookkeeping fields for implementors to embed and forward to.
///
/// Whenever [`bounds`](Self::bounds) or [`is_visible`](Self::is_visible) changes, the owner
/// must be told through
/// [`object_did_change_bounds`](crate::ObjectStorage::object_did_change_bounds) or
/// [`object_did_change_visibility`](crate::ObjectStorage::object_did_change_visibility).
pub trait Storable: Mark {
    /// Axis-aligned bounds in canvas coordinates.
    fn bounds(&self) -> Rect;

    /// Whether the object takes part in drawing and hit-testing.
    fn is_visible(&self) -> bool;

    /// Position in the owner's drawing order (0 is the bottom).
    fn z_index(&self) -> usize;

    /// Record the position in the owner's drawing order.
    fn set_z_index(&self, z_index: usize);

    /// The storage currently holding this object.
    fn storage(&self) -> Option<StorageId>;

    /// Record the storage currently holding this object.
    fn set_storage(&self, storage: Option<StorageId>);
}

/// Storage bookkeeping for a [`Storable`] implementation.
///
/// Cloning yields a detached copy: the Z-index is kept but the mark and the owner are not,
/// so a copied object can be inserted anywhere.
#[derive(Debug, Default)]
pub struct StorableState {
    z_index: Cell<usize>,
    marked: Cell<bool>,
    storage: Cell<Option<StorageId>>,
}

impl StorableState {
    /// Fresh, unowned state.
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`Storable::z_index`].
    pub fn z_index(&self) -> usize {
        self.z_index.get()
    }

    /// See [`Storable::set_z_index`].
    pub fn set_z_index(&self, z_index: usize) {
        self.z_index.set(z_index);
    }

    /// See [`Mark::is_marked`].
    pub fn is_marked(&self) -> bool {
        self.marked.get()
    }

    /// See [`Mark::set_marked`].
    pub fn set_marked(&self, marked: bool) {
        self.marked.set(marked);
    }

    /// See [`Storable::storage`].
    pub fn storage(&self) -> Option<StorageId> {
        self.storage.get()
    }

    /// See [`Storable::set_storage`].
    pub fn set_storage(&self, storage: Option<StorageId>) {
        self.storage.set(storage);
    }
}

impl Clone for StorableState {
    fn clone(&self) -> Self {
        Self {
            z_index: Cell::new(self.z_index.get()),
            marked: Cell::new(false),
            storage: Cell::new(None),
        }
    }
}

impl PartialEq for StorableState {
    /// Bookkeeping never makes two objects different.
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}
