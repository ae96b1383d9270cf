// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Comparing storage backends.
//!
//! Load the same scattered drawing into every backend, check that they agree, print the
//! BSP divisions, and look at how a bare index tree spreads the drawing over its leaves.
//!
//! Run:
//! - `cargo run -p understory_examples --example storage_backends`

use std::rc::Rc;

use kurbo::{PathEl, Rect, Size};
use understory_bsp::IndexTree;
use understory_object_storage::{
    BspConfig, Mark, QueryOptions, Storable, StorableState, StorageId, StorageKind, TreeDepth,
    new_storage,
};

struct Dot {
    id: usize,
    bounds: Rect,
    state: StorableState,
}

impl Mark for Dot {
    fn is_marked(&self) -> bool {
        self.state.is_marked()
    }
    fn set_marked(&self, marked: bool) {
        self.state.set_marked(marked);
    }
}

impl Storable for Dot {
    fn bounds(&self) -> Rect {
        self.bounds
    }
    fn is_visible(&self) -> bool {
        true
    }
    fn z_index(&self) -> usize {
        self.state.z_index()
    }
    fn set_z_index(&self, z_index: usize) {
        self.state.set_z_index(z_index);
    }
    fn storage(&self) -> Option<StorageId> {
        self.state.storage()
    }
    fn set_storage(&self, storage: Option<StorageId>) {
        self.state.set_storage(storage);
    }
}

fn scatter(count: usize) -> Vec<Rc<Dot>> {
    // Deterministic low-discrepancy layout.
    (0..count)
        .map(|i| {
            let x = (i as f64 * 0.618_033_988_75).fract() * 960.0;
            let y = (i as f64 * 0.754_877_666_2).fract() * 720.0;
            Rc::new(Dot {
                id: i,
                bounds: Rect::new(x, y, x + 40.0, y + 40.0),
                state: StorableState::new(),
            })
        })
        .collect()
}

fn main() {
    let canvas = Size::new(1000.0, 760.0);
    let config = BspConfig::with_depth(4);
    let query = Rect::new(200.0, 150.0, 420.0, 330.0);

    let mut answers = Vec::new();
    for kind in [
        StorageKind::Linear,
        StorageKind::IndexedBsp,
        StorageKind::DirectBsp,
    ] {
        let mut storage = new_storage(kind, canvas, config);
        storage.set_objects(scatter(500));
        let hits: Vec<usize> = storage
            .objects_intersecting_rect(query, QueryOptions::REVERSE_ORDER)
            .iter()
            .map(|d| d.id)
            .collect();
        println!("{kind:?}: {} hits, topmost {:?}", hits.len(), hits.first());
        if let Some(path) = storage.debug_storage_divisions() {
            let leaves = path
                .elements()
                .iter()
                .filter(|el| matches!(el, PathEl::MoveTo(_)))
                .count();
            println!("  {leaves} leaf rectangles");
        }
        answers.push(hits);
    }
    assert!(answers.windows(2).all(|w| w[0] == w[1]), "backends disagree");

    // The same drawing in a bare index tree: dots straddling split lines sit in several leaves.
    let dots = scatter(500);
    let mut tree = IndexTree::new(canvas, 4);
    for (i, dot) in dots.iter().enumerate() {
        tree.insert(i, dot.bounds());
    }
    let entries: Vec<usize> = (0..tree.leaf_count())
        .map(|leaf| tree.leaf_indices(leaf).len())
        .collect();
    let total: usize = entries.iter().sum();
    println!(
        "index tree: {} leaves, {total} entries for {} dots, busiest leaf {:?}",
        tree.leaf_count(),
        dots.len(),
        entries.iter().max()
    );

    let auto = BspConfig {
        depth: TreeDepth::Auto,
        min_depth: 2,
        max_depth: 12,
    };
    for count in [10, 1000, 100_000] {
        println!("auto depth for {count} objects: {}", auto.resolve_depth(count));
    }
}
