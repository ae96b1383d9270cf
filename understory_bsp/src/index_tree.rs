// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Partition tree whose leaves hold array positions.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::fmt::Debug;
use kurbo::{BezPath, Point, Rect, Size};
use smallvec::SmallVec;

use crate::partition::Partition;

type IndexLeaf = SmallVec<[usize; 8]>;

/// A BSP tree storing positions into an external array.
///
/// The positions refer to a Z-ordered sequence kept by the caller. Because leaves store
/// positions rather than identities, any mutation that moves elements of that sequence must
/// be mirrored with [`shift_indices`](Self::shift_indices) before the next query.
///
/// Leaf buckets are kept sorted, and queries collect into a [`BTreeSet`], so results come back
/// in ascending position order (which is drawing order for the caller).
#[derive(Clone)]
pub struct IndexTree {
    partition: Partition,
    leaves: Vec<IndexLeaf>,
}

impl IndexTree {
    /// Create an empty tree over a canvas of `size`, split `depth` times.
    pub fn new(size: Size, depth: u32) -> Self {
        let partition = Partition::new(size, depth);
        let leaves = (0..partition.leaf_count())
            .map(|_| IndexLeaf::new())
            .collect();
        Self { partition, leaves }
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

    /// Positions stored in `leaf`, ascending.
    pub fn leaf_indices(&self, leaf: usize) -> &[usize] {
        self.leaves.get(leaf).map(|l| l.as_slice()).unwrap_or(&[])
    }

    /// Drop every stored position, keeping the partition.
    pub fn clear(&mut self) {
        for leaf in &mut self.leaves {
            leaf.clear();
        }
    }

    /// Register `index` in every leaf `rect` reaches.
    pub fn insert(&mut self, index: usize, rect: Rect) {
        let leaves = &mut self.leaves;
        self.partition.visit_leaves(rect, |leaf| {
            let bucket = &mut leaves[leaf];
            if let Err(pos) = bucket.binary_search(&index) {
                bucket.insert(pos, index);
            }
        });
        log::trace!("index tree: inserted {index} at {rect:?}");
    }

    /// Erase `index` from every leaf `rect` reaches.
    ///
    /// `rect` must be the rect `index` was inserted with.
    pub fn remove(&mut self, index: usize, rect: Rect) {
        let leaves = &mut self.leaves;
        self.partition.visit_leaves(rect, |leaf| {
            let bucket = &mut leaves[leaf];
            if let Ok(pos) = bucket.binary_search(&index) {
                bucket.remove(pos);
            }
        });
        log::trace!("index tree: removed {index} at {rect:?}");
    }

    /// Add `delta` to every stored position `>= start`.
    ///
    /// After inserting at array position `p` call `shift_indices(p, 1)` (before registering
    /// the new element); after removing position `p` call `shift_indices(p + 1, -1)`.
    pub fn shift_indices(&mut self, start: usize, delta: isize) {
        if delta == 0 {
            return;
        }
        debug_assert!(
            delta > 0 || start >= delta.unsigned_abs(),
            "shifting {start} by {delta} would underflow"
        );
        for bucket in &mut self.leaves {
            for index in bucket.iter_mut().rev() {
                if *index < start {
                    break;
                }
                *index = index.saturating_add_signed(delta);
            }
        }
    }

    /// Positions registered in any leaf reached by any of `rects`.
    pub fn query_rects(&self, rects: &[Rect]) -> BTreeSet<usize> {
        let mut out = BTreeSet::new();
        self.partition.visit_leaves_multi(rects, |leaf| {
            out.extend(self.leaves[leaf].iter().copied());
        });
        out
    }

    /// Positions registered in any leaf `rect` reaches.
    ///
    /// Leaves are coarse: callers filter the candidates against real bounds.
    pub fn query_rect(&self, rect: Rect) -> BTreeSet<usize> {
        let mut out = BTreeSet::new();
        self.partition.visit_leaves(rect, |leaf| {
            out.extend(self.leaves[leaf].iter().copied());
        });
        out
    }

    /// Positions registered in the leaf containing `point`.
    pub fn query_point(&self, point: Point) -> BTreeSet<usize> {
        self.query_rect(Rect::from_points(point, point))
    }

    /// One closed rectangle per leaf.
    pub fn debug_divisions(&self) -> BezPath {
        self.partition.debug_divisions()
    }
}

impl Debug for IndexTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let entries: usize = self.leaves.iter().map(|l| l.len()).sum();
        let occupied = self.leaves.iter().filter(|l| !l.is_empty()).count();
        f.debug_struct("IndexTree")
            .field("canvas", &self.canvas_size())
            .field("depth", &self.depth())
            .field("leaves", &self.leaves.len())
            .field("occupied", &occupied)
            .field("entries", &entries)
            .finish_non_exhaustive()
    }
}
