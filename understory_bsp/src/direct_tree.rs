// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Partition tree whose leaves hold shared object references.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt::Debug;
use kurbo::{BezPath, Point, Rect, Size};

use crate::mark::Mark;
use crate::partition::Partition;
use crate::types::{rect_contains, rects_intersect};

/// A BSP tree retaining the objects themselves.
///
/// Each leaf keeps `(object, rect)` pairs for everything registered over it, so a query needs no
/// translation step and can test the stored rect directly. The price is one extra reference
/// per touched leaf and a mandatory [`remove`](Self::remove) when an object leaves its owner.
///
/// Results are unordered; duplicates from straddling objects are suppressed with the
/// [`Mark`] capability and every mark is cleared before a query returns.
pub struct DirectTree<T: Mark> {
    partition: Partition,
    leaves: Vec<Vec<(Rc<T>, Rect)>>,
    count: usize,
}

impl<T: Mark> DirectTree<T> {
    /// Create an empty tree over a canvas of `size`, split `depth` times.
    pub fn new(size: Size, depth: u32) -> Self {
        let partition = Partition::new(size, depth);
        let leaves = (0..partition.leaf_count()).map(|_| Vec::new()).collect();
        Self {
            partition,
            leaves,
            count: 0,
        }
    }

    /// The canvas size the tree was built for.
    pub fn canvas_size(&self) -> Size {
        self.partition.canvas_size()
    }

    /// Current depth.
    pub fn depth(&self) -> u32 {
        self.partition.depth()
    }

    /// Rebuild the leaves at a new depth. The tree is emptied; callers re-insert.
    pub fn set_depth(&mut self, depth: u32) {
        *self = Self::new(self.canvas_size(), depth);
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Region covered by `leaf`.
    pub fn leaf_rect(&self, leaf: usize) -> Option<Rect> {
        self.partition.leaf_rect(leaf)
    }

    /// Number of `(object, rect)` entries held by `leaf`.
    pub fn leaf_len(&self, leaf: usize) -> usize {
        self.leaves.get(leaf).map_or(0, Vec::len)
    }

    /// Number of distinct objects currently registered.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Release every object, keeping the partition.
    pub fn remove_all(&mut self) {
        for leaf in &mut self.leaves {
            leaf.clear();
        }
        self.count = 0;
    }

    /// Register `item` with bounds `rect` in every leaf `rect` reaches.
    pub fn insert(&mut self, item: &Rc<T>, rect: Rect) {
        let rect = rect.abs();
        let leaves = &mut self.leaves;
        self.partition.visit_leaves(rect, |leaf| {
            leaves[leaf].push((Rc::clone(item), rect));
        });
        self.count += 1;
    }

    /// Erase `item` from every leaf `rect` reaches.
    ///
    /// `rect` must be the rect `item` was inserted with. Returns whether anything was removed.
    pub fn remove(&mut self, item: &Rc<T>, rect: Rect) -> bool {
        let mut found = false;
        let leaves = &mut self.leaves;
        self.partition.visit_leaves(rect.abs(), |leaf| {
            let bucket = &mut leaves[leaf];
            if let Some(pos) = bucket.iter().position(|(o, _)| Rc::ptr_eq(o, item)) {
                bucket.swap_remove(pos);
                found = true;
            }
        });
        if found {
            self.count -= 1;
        }
        found
    }

    /// Objects whose stored rect intersects any of `rects`, each reported once, unordered.
    pub fn query_rects(&self, rects: &[Rect]) -> Vec<Rc<T>> {
        let mut found = Vec::new();
        for query in rects {
            let query = query.abs();
            self.partition.visit_leaves(query, |leaf| {
                for (item, r) in &self.leaves[leaf] {
                    if !item.is_marked() && rects_intersect(r, &query) {
                        item.set_marked(true);
                        found.push(Rc::clone(item));
                    }
                }
            });
        }
        for item in &found {
            item.set_marked(false);
        }
        found
    }

    /// Objects whose stored rect intersects `rect`, unordered.
    pub fn query_rect(&self, rect: Rect) -> Vec<Rc<T>> {
        self.query_rects(&[rect])
    }

    /// Objects whose stored rect contains `point`, unordered.
    pub fn query_point(&self, point: Point) -> Vec<Rc<T>> {
        // A point reaches exactly one leaf, so there is nothing to de-duplicate.
        let mut found = Vec::new();
        self.partition
            .visit_leaves(Rect::from_points(point, point), |leaf| {
                for (item, r) in &self.leaves[leaf] {
                    if rect_contains(r, point) {
                        found.push(Rc::clone(item));
                    }
                }
            });
        found
    }

    /// One closed rectangle per leaf.
    pub fn debug_divisions(&self) -> BezPath {
        self.partition.debug_divisions()
    }
}

impl<T: Mark> Debug for DirectTree<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let entries: usize = self.leaves.iter().map(Vec::len).sum();
        f.debug_struct("DirectTree")
            .field("canvas", &self.canvas_size())
            .field("depth", &self.depth())
            .field("leaves", &self.leaves.len())
            .field("objects", &self.count)
            .field("entries", &entries)
            .finish_non_exhaustive()
    }
}
