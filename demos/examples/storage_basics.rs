// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Object storage basics.
//!
//! Fill a layer, hit-test, drag and restack a shape, and drain the change log.
//!
//! Run:
//! - `cargo run -p understory_examples --example storage_basics`

use std::cell::Cell;
use std::rc::Rc;

use kurbo::{Point, Rect, Size};
use understory_object_storage::{
    IndexedStorage, Mark, ObjectStorage, QueryOptions, Storable, StorableState, StorageId,
};

#[derive(Debug)]
struct Shape {
    name: &'static str,
    bounds: Cell<Rect>,
    visible: Cell<bool>,
    state: StorableState,
}

impl Shape {
    fn new(name: &'static str, bounds: Rect) -> Rc<Self> {
        Rc::new(Self {
            name,
            bounds: Cell::new(bounds),
            visible: Cell::new(true),
            state: StorableState::new(),
        })
    }
}

impl Mark for Shape {
    fn is_marked(&self) -> bool {
        self.state.is_marked()
    }
    fn set_marked(&self, marked: bool) {
        self.state.set_marked(marked);
    }
}

impl Storable for Shape {
    fn bounds(&self) -> Rect {
        self.bounds.get()
    }
    fn is_visible(&self) -> bool {
        self.visible.get()
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

fn names(shapes: &[Rc<Shape>]) -> Vec<&'static str> {
    shapes.iter().map(|s| s.name).collect()
}

fn main() {
    let mut layer = IndexedStorage::new(Size::new(800.0, 600.0));
    let background = Shape::new("background", Rect::new(0.0, 0.0, 800.0, 600.0));
    let card = Shape::new("card", Rect::new(100.0, 100.0, 300.0, 250.0));
    let badge = Shape::new("badge", Rect::new(280.0, 90.0, 320.0, 130.0));
    layer.set_objects(vec![background.clone(), card.clone(), badge.clone()]);
    println!("tree depth {} with {} leaves", layer.tree().depth(), layer.tree().leaf_count());
    // A layer list would watch the drawing order.
    layer.set_change_tracking(true);

    // Hit-testing returns bottom to top; the last hit is the one on top.
    let hits = layer.objects_containing_point(Point::new(290.0, 110.0));
    println!("under the cursor: {:?}", names(&hits));
    assert_eq!(names(&hits), ["background", "card", "badge"]);

    // Drag the card and tell the layer.
    let old = card.bounds.replace(Rect::new(500.0, 350.0, 700.0, 500.0));
    layer.object_did_change_bounds(&card, old);
    let damage = Rect::new(450.0, 300.0, 800.0, 600.0);
    let repaint = layer.objects_intersecting_rect(damage, QueryOptions::empty());
    println!("repaint after drag: {:?}", names(&repaint));

    // Send the badge to the back, then hide it.
    layer.move_object(&badge, 0);
    badge.visible.set(false);
    layer.object_did_change_visibility(&badge);
    println!("drawing order: {:?}", names(layer.objects()));
    let visible = layer.objects_intersecting_rect(damage, QueryOptions::IGNORE_UPDATE_RECT);
    println!("visible: {:?}", names(&visible));

    for change in layer.take_changes() {
        println!("change: {change:?}");
    }
}
