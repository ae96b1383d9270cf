// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_object_storage --heading-base-level=0

//! Understory Object Storage: Z-ordered storage for the objects of a 2D drawing.
//!
//! A storage owns the objects of one drawing layer in drawing order (position 0 is drawn
//! first) and answers the two questions a renderer and a hit-tester ask: which objects touch
//! this update region, and which objects lie under this point. Results always come back in
//! drawing order unless the caller opts out.
//!
//! Objects implement [`Storable`]; the storage stamps its [`StorageId`] and each object's
//! position onto it. Clients report bounds and visibility changes back through
//! [`ObjectStorage::object_did_change_bounds`] and
//! [`ObjectStorage::object_did_change_visibility`]. Layers that mirror the drawing order
//! (a layer list, an undo stack) switch on [`ObjectStorage::set_change_tracking`] and drain
//! [`StorageChange`]s with [`ObjectStorage::take_changes`].
//!
//! Three interchangeable backends implement [`ObjectStorage`]:
//!
//! - [`LinearStorage`]: a plain vector; every query scans it. Fine for a few dozen objects.
//! - [`IndexedStorage`]: the vector plus an [`IndexTree`](understory_bsp::IndexTree) of
//!   positions, kept in step by shifting stored positions after each mutation.
//! - [`DirectStorage`]: the vector plus a [`DirectTree`](understory_bsp::DirectTree) of object
//!   references. Reordering is free; results are sorted by Z-index after the query.
//!
//! [`new_storage`] picks one at runtime.
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use kurbo::{Point, Rect, Size};
//! use understory_object_storage::{
//!     Mark, ObjectStorage, QueryOptions, Storable, StorableState, StorageId, StorageKind,
//!     new_storage, BspConfig,
//! };
//!
//! struct Shape {
//!     bounds: Cell<Rect>,
//!     state: StorableState,
//! }
//!
//! impl Mark for Shape {
//!     fn is_marked(&self) -> bool { self.state.is_marked() }
//!     fn set_marked(&self, marked: bool) { self.state.set_marked(marked) }
//! }
//!
//! impl Storable for Shape {
//!     fn bounds(&self) -> Rect { self.bounds.get() }
//!     fn is_visible(&self) -> bool { true }
//!     fn z_index(&self) -> usize { self.state.z_index() }
//!     fn set_z_index(&self, z: usize) { self.state.set_z_index(z) }
//!     fn storage(&self) -> Option<StorageId> { self.state.storage() }
//!     fn set_storage(&self, s: Option<StorageId>) { self.state.set_storage(s) }
//! }
//!
//! let shape = |r| Rc::new(Shape { bounds: Cell::new(r), state: StorableState::new() });
//!
//! let mut layer = new_storage(StorageKind::IndexedBsp, Size::new(800.0, 600.0), BspConfig::default());
//! let back = shape(Rect::new(0.0, 0.0, 400.0, 300.0));
//! let front = shape(Rect::new(100.0, 100.0, 200.0, 200.0));
//! layer.insert_object(back.clone(), 0);
//! layer.insert_object(front.clone(), 1);
//!
//! // Bottom to top.
//! let hits = layer.objects_containing_point(Point::new(150.0, 150.0));
//! assert!(Rc::ptr_eq(&hits[0], &back) && Rc::ptr_eq(&hits[1], &front));
//!
//! // Moving an object is mirrored in the index.
//! let old = front.bounds.replace(Rect::new(500.0, 400.0, 600.0, 500.0));
//! layer.object_did_change_bounds(&front, old);
//! let region = layer.objects_intersecting_rect(Rect::new(450.0, 350.0, 800.0, 600.0), QueryOptions::empty());
//! assert_eq!(region.len(), 1);
//! assert_eq!(front.z_index(), 1);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod changes;
mod direct;
mod factory;
mod indexed;
mod linear;
mod protocol;
mod storable;

#[cfg(test)]
mod properties;

pub use changes::StorageChange;
pub use direct::DirectStorage;
pub use factory::{StorageKind, new_storage};
pub use indexed::IndexedStorage;
pub use linear::LinearStorage;
pub use protocol::{IndexSet, ObjectStorage, QueryOptions};
pub use storable::{Storable, StorableState, StorageId};

pub use understory_bsp::{BspConfig, Mark, TreeDepth};
