// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_bsp --heading-base-level=0

//! Understory BSP: fixed-depth binary space partition trees for 2D drawing storage.
//!
//! A canvas rectangle is bisected a fixed number of times, alternating vertical and horizontal
//! splits, into `2^depth` leaves that tile it. Items are registered in every leaf their bounds
//! touch, so an item straddling a split line lives in several leaves and queries de-duplicate.
//!
//! Two trees share that partition:
//!
//! - [`IndexTree`]: leaves hold positions into an external Z-ordered array. Queries return a
//!   sorted set of positions. Any mutation that moves array elements must be mirrored with
//!   [`IndexTree::shift_indices`].
//! - [`DirectTree`]: leaves hold `(Rc<T>, Rect)` pairs. Queries return objects directly and
//!   de-duplicate with the [`Mark`] capability. No renumbering is needed when array positions
//!   change, but removal has to visit every leaf again to release the references.
//!
//! Depth is chosen with [`BspConfig`]; any change of canvas size or depth means building a new
//! tree and re-inserting everything.
//!
//! Content outside the canvas is clamped onto the nearest edge and registered in a boundary
//! leaf. Queries can therefore over-include, never omit: callers test candidates against
//! real bounds.
//!
//! # Example
//!
//! ```rust
//! use understory_bsp::IndexTree;
//! use kurbo::{Point, Rect, Size};
//!
//! let mut tree = IndexTree::new(Size::new(100.0, 100.0), 4);
//! tree.insert(0, Rect::new(10.0, 10.0, 20.0, 20.0));
//! tree.insert(1, Rect::new(40.0, 40.0, 60.0, 60.0));
//!
//! // Removing array position 0 renumbers everything above it.
//! tree.remove(0, Rect::new(10.0, 10.0, 20.0, 20.0));
//! tree.shift_indices(1, -1);
//!
//! let hits: Vec<usize> = tree.query_point(Point::new(50.0, 50.0)).into_iter().collect();
//! assert_eq!(hits, [0]);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod direct_tree;
pub mod index_tree;
pub mod mark;
pub mod partition;
pub mod types;

pub use direct_tree::DirectTree;
pub use index_tree::IndexTree;
pub use mark::Mark;
pub use partition::Partition;
pub use types::{
    BSP_SLACK, BspConfig, DEFAULT_MAX_DEPTH, DEFAULT_MIN_DEPTH, MAX_TREE_DEPTH, NodeKind,
    TreeDepth, rect_contains, rects_intersect,
};
