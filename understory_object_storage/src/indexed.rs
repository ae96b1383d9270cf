// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! BSP storage whose tree indexes positions in the drawing order.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt::Debug;
use kurbo::{BezPath, Point, Rect, Size};
use understory_bsp::{BspConfig, IndexTree, TreeDepth, rect_contains, rects_intersect};

use crate::changes::StorageChange;
use crate::linear::{LinearStorage, arrange, is_eligible};
use crate::protocol::{IndexSet, ObjectStorage, QueryOptions};
use crate::storable::{Storable, StorageId};

/// Storage pairing the linear drawing order with an [`IndexTree`].
///
/// The vector stays the truth for Z-order; the tree stores the positions of visible objects in
/// every leaf their bounds touch. Every mutation updates the vector first, then patches the
/// tree and shifts the stored positions so that tree position `i` always names vector
/// position `i`.
///
/// Queries that include invisible objects or skip culling fall back to a linear scan, since
/// the tree only knows visible objects.
pub struct IndexedStorage<T: Storable> {
    linear: LinearStorage<T>,
    tree: IndexTree,
    config: BspConfig,
    built_count: usize,
}

impl<T: Storable> IndexedStorage<T> {
    /// Create an empty storage with the default depth policy.
    pub fn new(canvas: Size) -> Self {
        Self::with_config(canvas, BspConfig::default())
    }

    /// Create an empty storage with an explicit depth policy.
    pub fn with_config(canvas: Size, config: BspConfig) -> Self {
        Self {
            linear: LinearStorage::new(canvas),
            tree: IndexTree::new(canvas, config.resolve_depth(0)),
            config,
            built_count: 0,
        }
    }

    /// The spatial index.
    pub fn tree(&self) -> &IndexTree {
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
        self.tree = IndexTree::new(self.linear.canvas_size(), depth);
        for (i, object) in self.linear.objects().iter().enumerate() {
            if object.is_visible() {
                self.tree.insert(i, object.bounds());
            }
        }
        self.built_count = count;
        log::debug!(
            "indexed storage: rebuilt depth {depth} ({} leaves) for {count} objects",
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

    /// Mirror an insertion at `index` in the tree.
    fn register(&mut self, index: usize) {
        self.tree.shift_indices(index, 1);
        if let Some(object) = self.linear.object_at(index)
            && object.is_visible()
        {
            self.tree.insert(index, object.bounds());
        }
    }

    /// Mirror a removal of `object` from `index` in the tree.
    fn unregister(&mut self, index: usize, object: &T) {
        self.tree.remove(index, object.bounds());
        self.tree.shift_indices(index + 1, -1);
    }
}

impl<T: Storable> ObjectStorage<T> for IndexedStorage<T> {
    fn id(&self) -> StorageId {
        self.linear.id()
    }

    fn objects_intersecting_rects(&self, rects: &[Rect], options: QueryOptions) -> Vec<Rc<T>> {
        if options.intersects(QueryOptions::INCLUDE_INVISIBLE | QueryOptions::IGNORE_UPDATE_RECT) {
            return self.linear.scan(rects, options);
        }
        let objects = self.linear.objects();
        let mut out: Vec<Rc<T>> = self
            .tree
            .query_rects(rects)
            .into_iter()
            .filter_map(|i| objects.get(i))
            .filter(|o| {
                let bounds = o.bounds().abs();
                is_eligible(o.as_ref(), options)
                    && rects.iter().any(|r| rects_intersect(&bounds, &r.abs()))
            })
            .cloned()
            .collect();
        arrange(&mut out, options, true);
        out
    }

    fn objects_containing_point(&self, point: Point) -> Vec<Rc<T>> {
        let objects = self.linear.objects();
        self.tree
            .query_point(point)
            .into_iter()
            .filter_map(|i| objects.get(i))
            .filter(|o| o.is_visible() && rect_contains(&o.bounds().abs(), point))
            .cloned()
            .collect()
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
        let index = self.linear.splice_in(object, index);
        self.register(index);
        self.linear
            .record(StorageChange::Inserted(IndexSet::from([index])));
        self.retune();
    }

    fn remove_object(&mut self, index: usize) -> Option<Rc<T>> {
        let object = self.linear.splice_out(index)?;
        self.unregister(index, &object);
        self.linear
            .record(StorageChange::Removed(IndexSet::from([index])));
        self.retune();
        Some(object)
    }

    fn replace_object(&mut self, index: usize, object: Rc<T>) -> Option<Rc<T>> {
        let old = self.linear.splice_replace(index, object)?;
        self.tree.remove(index, old.bounds());
        if let Some(new) = self.linear.object_at(index)
            && new.is_visible()
        {
            self.tree.insert(index, new.bounds());
        }
        self.linear.record(StorageChange::Replaced(index));
        Some(old)
    }

    fn insert_objects(&mut self, objects: Vec<Rc<T>>, indices: &IndexSet) {
        debug_assert_eq!(objects.len(), indices.len(), "one index per object");
        let mut placed = IndexSet::new();
        for (object, &index) in objects.into_iter().zip(indices) {
            let index = self.linear.splice_in(object, index);
            self.register(index);
            placed.insert(index);
        }
        self.linear.record(StorageChange::Inserted(placed));
        self.retune();
    }

    fn remove_objects(&mut self, indices: &IndexSet) -> Vec<Rc<T>> {
        let mut removed = Vec::with_capacity(indices.len());
        let mut positions = IndexSet::new();
        for &index in indices.iter().rev() {
            if let Some(object) = self.linear.splice_out(index) {
                self.unregister(index, &object);
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
        let Some(from) = self.linear.index_of_object(object) else {
            log::warn!("move_object: object is not owned by this storage");
            return;
        };
        let to = self.linear.reposition(from, index);
        if from == to {
            return;
        }
        self.unregister(from, object);
        self.register(to);
        self.linear.record(StorageChange::Moved { from, to });
    }

    fn object_did_change_bounds(&mut self, object: &Rc<T>, old_bounds: Rect) {
        let Some(index) = self.linear.index_of_object(object) else {
            log::warn!("object_did_change_bounds: object is not owned by this storage");
            return;
        };
        self.tree.remove(index, old_bounds);
        if object.is_visible() {
            self.tree.insert(index, object.bounds());
        }
    }

    fn object_did_change_visibility(&mut self, object: &Rc<T>) {
        let Some(index) = self.linear.index_of_object(object) else {
            log::warn!("object_did_change_visibility: object is not owned by this storage");
            return;
        };
        let bounds = object.bounds();
        self.tree.remove(index, bounds);
        if object.is_visible() {
            self.tree.insert(index, bounds);
        }
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

impl<T: Storable> Debug for IndexedStorage<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IndexedStorage")
            .field("linear", &self.linear)
            .field("tree", &self.tree)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
