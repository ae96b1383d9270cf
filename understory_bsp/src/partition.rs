// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The fixed partition shared by both trees: node arena, construction, and leaf traversal.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use kurbo::{BezPath, Point, Rect, Shape, Size};
use smallvec::{SmallVec, smallvec};

use crate::types::{MAX_TREE_DEPTH, NodeKind, clamp_to};

#[derive(Copy, Clone, Debug)]
enum Node {
    /// Split at x = `at`.
    Vertical { at: f64, low: usize, high: usize },
    /// Split at y = `at`.
    Horizontal { at: f64, low: usize, high: usize },
    Leaf(usize),
}

impl Node {
    fn kind(&self) -> NodeKind {
        match self {
            Self::Vertical { .. } => NodeKind::Vertical,
            Self::Horizontal { .. } => NodeKind::Horizontal,
            Self::Leaf(_) => NodeKind::Leaf,
        }
    }
}

/// A canvas rectangle bisected `depth` times into `2^depth` leaves.
///
/// The partition only knows geometry; the trees keep one bucket per leaf, addressed by the
/// leaf numbers this type hands out.
///
/// Descent uses a closed rule so that anything touching a split line reaches both sides:
/// a rect goes low when its minimum lies before the line and high when its maximum lies on
/// or after it. Rects are clamped into the canvas first.
#[derive(Clone, Debug)]
pub struct Partition {
    canvas: Rect,
    depth: u32,
    root: usize,
    nodes: Vec<Node>,
    leaf_rects: Vec<Rect>,
}

impl Partition {
    /// Build the partition of a canvas of `size` (origin at zero).
    ///
    /// `depth` is capped at [`MAX_TREE_DEPTH`].
    pub fn new(size: Size, depth: u32) -> Self {
        let depth = depth.min(MAX_TREE_DEPTH);
        let canvas = Rect::from_origin_size(Point::ZERO, size).abs();
        let mut partition = Self {
            canvas,
            depth,
            root: 0,
            nodes: Vec::with_capacity((2_usize << depth) - 1),
            leaf_rects: Vec::with_capacity(1_usize << depth),
        };
        let first = if canvas.width() >= canvas.height() {
            NodeKind::Vertical
        } else {
            NodeKind::Horizontal
        };
        partition.root = partition.build(canvas, depth, first);
        partition
    }

    fn build(&mut self, region: Rect, depth: u32, kind: NodeKind) -> usize {
        let node = if depth == 0 {
            self.leaf_rects.push(region);
            Node::Leaf(self.leaf_rects.len() - 1)
        } else if kind == NodeKind::Vertical {
            let at = 0.5 * (region.x0 + region.x1);
            let low = self.build(
                Rect::new(region.x0, region.y0, at, region.y1),
                depth - 1,
                NodeKind::Horizontal,
            );
            let high = self.build(
                Rect::new(at, region.y0, region.x1, region.y1),
                depth - 1,
                NodeKind::Horizontal,
            );
            Node::Vertical { at, low, high }
        } else {
            let at = 0.5 * (region.y0 + region.y1);
            let low = self.build(
                Rect::new(region.x0, region.y0, region.x1, at),
                depth - 1,
                NodeKind::Vertical,
            );
            let high = self.build(
                Rect::new(region.x0, at, region.x1, region.y1),
                depth - 1,
                NodeKind::Vertical,
            );
            Node::Horizontal { at, low, high }
        };
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// The canvas rectangle.
    pub fn canvas(&self) -> Rect {
        self.canvas
    }

    /// The canvas size.
    pub fn canvas_size(&self) -> Size {
        self.canvas.size()
    }

    /// Number of splits from root to any leaf.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Number of leaves (`2^depth`).
    pub fn leaf_count(&self) -> usize {
        self.leaf_rects.len()
    }

    /// Region covered by `leaf`.
    pub fn leaf_rect(&self, leaf: usize) -> Option<Rect> {
        self.leaf_rects.get(leaf).copied()
    }

    /// Kind of the root node.
    pub fn root_kind(&self) -> NodeKind {
        self.nodes[self.root].kind()
    }

    /// Call `visit` with every leaf the (clamped) rect reaches.
    ///
    /// Each leaf is visited at most once per call.
    pub fn visit_leaves(&self, rect: Rect, mut visit: impl FnMut(usize)) {
        let r = clamp_to(rect.abs(), &self.canvas);
        let mut stack: SmallVec<[usize; 24]> = smallvec![self.root];
        while let Some(n) = stack.pop() {
            match self.nodes[n] {
                Node::Leaf(leaf) => visit(leaf),
                Node::Vertical { at, low, high } => {
                    if r.x1 >= at {
                        stack.push(high);
                    }
                    if r.x0 < at {
                        stack.push(low);
                    }
                }
                Node::Horizontal { at, low, high } => {
                    if r.y1 >= at {
                        stack.push(high);
                    }
                    if r.y0 < at {
                        stack.push(low);
                    }
                }
            }
        }
    }

    /// Call `visit` with every leaf any of `rects` reaches, once per leaf.
    pub fn visit_leaves_multi(&self, rects: &[Rect], mut visit: impl FnMut(usize)) {
        if let [rect] = rects {
            self.visit_leaves(*rect, visit);
            return;
        }
        // Proportional to the leaves reached, not to the size of the tree.
        let mut seen = BTreeSet::new();
        for rect in rects {
            self.visit_leaves(*rect, |leaf| {
                if seen.insert(leaf) {
                    visit(leaf);
                }
            });
        }
    }

    /// A path made of one closed rectangle per leaf, for drawing the divisions.
    pub fn debug_divisions(&self) -> BezPath {
        let mut path = BezPath::new();
        for rect in &self.leaf_rects {
            path.extend(rect.path_elements(0.1));
        }
        path
    }
}
