// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! BSP storage whose tree holds the objects themselves.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt::Debug;
use kurbo::{BezPath, Point, Rect, Size};
use understory_bsp::{BspConfig, DirectTree, TreeDepth, rect_contains};

use crate::changes::StorageChange;
use crate::linear::{LinearStorage, arrange, is_eligible};
use crate::protocol::{IndexSet, ObjectStorage, QueryOptions};
use crate::storable::{Storable, StorageId};

/// Storage pairing the linear drawing order with a [`DirectTree`].
///
/// Leaves retain each visible object together with the bounds it was registered under.
/// Reordering touches only the vector; query results are sorted by each object's own
/// Z-index unless [`QueryOptions::RELAXED_Z_ORDER`] is given.
pub struct DirectStorage<T: Storable> {
    linear: LinearStorage<T>,
    tree: DirectTree<T>,
    config: BspConfig,
    built_count: usize,
}

impl<T: Storable> DirectStorage<T> {
    /// Create an empty storage with the default depth policy.
    pub fn new(canvas: Size) -> Self {
        Self::with_config(canvas, BspConfig::default())
    }

    /// Create an empty storage with an explicit depth policy.
    pub fn with_config(canvas: Size, config: BspConfig) -> Self {
        Self {
            linear: LinearStorage::new(canvas),
            tree: DirectTree::new(canvas, config.resolve_depth(0)),
            config,
            built_count: 0,
        }
    }

    /// The spatial index.
    pub fn tree(&self) -> &DirectTree<T> {
        &self.tree
    }

    /// The depth policy in effect.
    pub fn config(&self) -> BspConfig {
        self.config
    }

    /// Change the depth policy and rebuild.
    pub fn set_tree_depth(&mut self, depth: TreeDepth) {
        self.config.depth = depth;
        self.rebuild();
    }

    /// Tear the tree down and re-insert every visible object.
    pub fn rebuild(&mut self) {
        let count = self.linear.count();
        let depth = self.config.resolve_depth(count);
        self.tree = DirectTree::new(self.linear.canvas_size(), depth);
        for object in self.linear.objects() {
            if object.is_visible() {
                self.tree.insert(object, object.bounds());
            }
        }
        self.built_count = count;
        log::debug!(
            "direct storage: rebuilt depth {depth} ({} leaves) for {count} objects",
            self.tree.leaf_count()
        );
    }

    fn retune(&mut self) {
        if self
            .config
            .wants_rebuild(self.tree.depth(), self.built_count, self.linear.count())
        {
            self.rebuild();
        }
    }

    fn register(&mut self, object: &Rc<T>) {
        if object.is_visible() {
            self.tree.insert(object, object.bounds());
        }
    }
}

impl<T: Storable> ObjectStorage<T> for DirectStorage<T> {
    fn id(&self) -> StorageId {
        self.linear.id()
    }

    fn objects_intersecting_rects(&self, rects: &[Rect], options: QueryOptions) -> Vec<Rc<T>> {
        if options.intersects(QueryOptions::INCLUDE_INVISIBLE | QueryOptions::IGNORE_UPDATE_RECT) {
            return self.linear.scan(rects, options);
        }
        let mut out = self.tree.query_rects(rects);
        out.retain(|o| is_eligible(o.as_ref(), options));
        arrange(&mut out, options, false);
        out
    }

    fn objects_containing_point(&self, point: Point) -> Vec<Rc<T>> {
        let mut out = self.tree.query_point(point);
        out.retain(|o| o.is_visible() && rect_contains(&o.bounds().abs(), point));
        arrange(&mut out, QueryOptions::empty(), false);
        out
    }

    fn objects(&self) -> &[Rc<T>] {
        self.linear.objects()
    }

    fn set_objects(&mut self, objects: Vec<Rc<T>>) {
        self.linear.replace_all(objects);
        self.linear.record(StorageChange::Reset);
        self.rebuild();
    }

    fn insert_object(&mut self, object: Rc<T>, index: usize) {
        self.register(&object);
        let index = self.linear.splice_in(object, index);
        self.linear
            .record(StorageChange::Inserted(IndexSet::from([index])));
        self.retune();
    }

    fn remove_object(&mut self, index: usize) -> Option<Rc<T>> {
        let object = self.linear.splice_out(index)?;
        self.tree.remove(&object, object.bounds());
        self.linear
            .record(StorageChange::Removed(IndexSet::from([index])));
        self.retune();
        Some(object)
    }

    fn replace_object(&mut self, index: usize, object: Rc<T>) -> Option<Rc<T>> {
        let incoming = Rc::clone(&object);
        let old = self.linear.splice_replace(index, object)?;
        self.tree.remove(&old, old.bounds());
        self.register(&incoming);
        self.linear.record(StorageChange::Replaced(index));
        Some(old)
    }

    fn insert_objects(&mut self, objects: Vec<Rc<T>>, indices: &IndexSet) {
        debug_assert_eq!(objects.len(), indices.len(), "one index per object");
        let mut placed = IndexSet::new();
        for (object, &index) in objects.into_iter().zip(indices) {
            self.register(&object);
            placed.insert(self.linear.splice_in(object, index));
        }
        self.linear.record(StorageChange::Inserted(placed));
        self.retune();
    }

    fn remove_objects(&mut self, indices: &IndexSet) -> Vec<Rc<T>> {
        let mut removed = Vec::with_capacity(indices.len());
        let mut positions = IndexSet::new();
        for &index in indices.iter().rev() {
            if let Some(object) = self.linear.splice_out(index) {
                self.tree.remove(&object, object.bounds());
                removed.push(object);
                positions.insert(index);
            }
        }
        removed.reverse();
        self.linear.record(StorageChange::Removed(positions));
        self.retune();
        removed
    }

    fn index_of_object(&self, object: &Rc<T>) -> Option<usize> {
        self.linear.index_of_object(object)
    }

    fn move_object(&mut self, object: &Rc<T>, index: usize) {
        // Leaves carry no positions; only the vector and the Z-indices change.
        self.linear.move_object(object, index);
    }

    fn object_did_change_bounds(&mut self, object: &Rc<T>, old_bounds: Rect) {
        if !self.linear.contains_object(object) {
            log::warn!("object_did_change_bounds: object is not owned by this storage");
            return;
        }
        self.tree.remove(object, old_bounds);
        self.register(object);
    }

    fn object_did_change_visibility(&mut self, object: &Rc<T>) {
        if !self.linear.contains_object(object) {
            log::warn!("object_did_change_visibility: object is not owned by this storage");
            return;
        }
        self.tree.remove(object, object.bounds());
        self.register(object);
    }

    fn canvas_size(&self) -> Size {
        self.linear.canvas_size()
    }

    fn set_canvas_size(&mut self, size: Size) {
        if self.linear.set_canvas(size) {
            self.rebuild();
        }
    }

    fn set_change_tracking(&mut self, enabled: bool) {
        self.linear.set_change_tracking(enabled);
    }

    fn is_tracking_changes(&self) -> bool {
        self.linear.is_tracking_changes()
    }

    fn take_changes(&mut self) -> Vec<StorageChange> {
        self.linear.take_changes()
    }

    fn debug_storage_divisions(&self) -> Option<BezPath> {
        Some(self.tree.debug_divisions())
    }
}

impl<T: Storable> Debug for DirectStorage<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DirectStorage")
            .field("linear", &self.linear)
            .field("tree", &self.tree)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
