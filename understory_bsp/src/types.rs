// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth policy, node kinds, and the closed-interval geometry helpers shared by both trees.

use kurbo::{Point, Rect};

/// Target number of objects per leaf when the depth is chosen automatically.
///
/// Also the hysteresis used by storages running with [`TreeDepth::Auto`]: the tree is only
/// rebuilt at a new depth once the object count has drifted by more than this many objects
/// since the last build.
pub const BSP_SLACK: usize = 48;

/// Default lower bound for automatically chosen depths.
pub const DEFAULT_MIN_DEPTH: u32 = 10;

/// Default upper bound for automatically chosen depths. `0` means "no limit" (other than
/// [`MAX_TREE_DEPTH`]).
pub const DEFAULT_MAX_DEPTH: u32 = 0;

/// Hard cap on any depth. A tree of this depth has about a million leaves.
pub const MAX_TREE_DEPTH: u32 = 20;

/// The kind of a partition node.
///
/// A [`Vertical`](NodeKind::Vertical) split divides its region with a vertical line (constant x);
/// a [`Horizontal`](NodeKind::Horizontal) split divides it with a horizontal line (constant y).
/// Kinds alternate from one level to the next.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Split along y.
    Horizontal,
    /// Split along x.
    Vertical,
    /// Terminal node covering one canvas sub-rectangle.
    Leaf,
}

/// How deep a tree is built.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TreeDepth {
    /// Exactly this many splits from root to leaf (clamped to the configured maximum).
    Fixed(u32),
    /// Pick a depth from the object count, aiming for [`BSP_SLACK`] objects per leaf.
    #[default]
    Auto,
}

/// Depth configuration for a partition tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BspConfig {
    /// Depth policy.
    pub depth: TreeDepth,
    /// Lower bound applied to [`TreeDepth::Auto`].
    pub min_depth: u32,
    /// Upper bound applied to every policy; `0` means [`MAX_TREE_DEPTH`].
    pub max_depth: u32,
}

impl Default for BspConfig {
    fn default() -> Self {
        Self {
            depth: TreeDepth::Auto,
            min_depth: DEFAULT_MIN_DEPTH,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl BspConfig {
    /// A configuration with a fixed depth and default bounds.
    pub const fn with_depth(depth: u32) -> Self {
        Self {
            depth: TreeDepth::Fixed(depth),
            min_depth: DEFAULT_MIN_DEPTH,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    fn cap(&self) -> u32 {
        if self.max_depth == 0 {
            MAX_TREE_DEPTH
        } else {
            self.max_depth.min(MAX_TREE_DEPTH)
        }
    }

    /// The depth a tree holding `object_count` objects should be built at.
    pub fn resolve_depth(&self, object_count: usize) -> u32 {
        let cap = self.cap();
        match self.depth {
            TreeDepth::Fixed(depth) => depth.min(cap),
            TreeDepth::Auto => {
                let leaves = object_count.div_ceil(BSP_SLACK).max(1);
                let ideal = leaves.next_power_of_two().trailing_zeros();
                ideal.max(self.min_depth).min(cap)
            }
        }
    }

    /// Whether an automatically sized tree built at `built_depth` for `built_count` objects
    /// should be rebuilt now that it holds `count`.
    pub fn wants_rebuild(&self, built_depth: u32, built_count: usize, count: usize) -> bool {
        matches!(self.depth, TreeDepth::Auto)
            && count.abs_diff(built_count) > BSP_SLACK
            && self.resolve_depth(count) != built_depth
    }
}

/// Closed rectangle intersection: touching edges and zero-area rects count.
///
/// Both rects are expected to be normalized (`x0 <= x1`, `y0 <= y1`).
#[inline]
pub fn rects_intersect(a: &Rect, b: &Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Closed point containment: points on the edge are inside.
#[inline]
pub fn rect_contains(r: &Rect, p: Point) -> bool {
    r.x0 <= p.x && p.x <= r.x1 && r.y0 <= p.y && p.y <= r.y1
}

/// Project `rect` into `canvas`.
///
/// Content outside the canvas collapses onto the nearest canvas edge, so it still lands in
/// a boundary leaf.
#[inline]
pub(crate) fn clamp_to(rect: Rect, canvas: &Rect) -> Rect {
    Rect::new(
        rect.x0.clamp(canvas.x0, canvas.x1),
        rect.y0.clamp(canvas.y0, canvas.y1),
        rect.x1.clamp(canvas.x0, canvas.x1),
        rect.y1.clamp(canvas.y0, canvas.y1),
    )
}
