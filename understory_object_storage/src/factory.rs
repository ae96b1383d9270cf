// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Picking a backend at runtime.

use alloc::boxed::Box;
use kurbo::Size;
use understory_bsp::BspConfig;

use crate::direct::DirectStorage;
use crate::indexed::IndexedStorage;
use crate::linear::LinearStorage;
use crate::protocol::ObjectStorage;
use crate::storable::Storable;

/// The available storage backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// [`LinearStorage`]: no spatial index.
    Linear,
    /// [`IndexedStorage`]: BSP tree of drawing-order positions.
    #[default]
    IndexedBsp,
    /// [`DirectStorage`]: BSP tree of object references.
    DirectBsp,
}

/// Create an empty storage of the given kind.
///
/// `config` only matters for the BSP backends.
pub fn new_storage<T: Storable + 'static>(
    kind: StorageKind,
    canvas: Size,
    config: BspConfig,
) -> Box<dyn ObjectStorage<T>> {
    log::debug!("new {kind:?} storage for a {}x{} canvas", canvas.width, canvas.height);
    match kind {
        StorageKind::Linear => Box::new(LinearStorage::new(canvas)),
        StorageKind::IndexedBsp => Box::new(IndexedStorage::with_config(canvas, config)),
        StorageKind::DirectBsp => Box::new(DirectStorage::with_config(canvas, config)),
    }
}
