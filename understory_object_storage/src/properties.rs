// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Randomized checks that every backend answers exactly like a brute-force scan.

use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use alloc::rc::Rc;
use alloc::vec::Vec;
use kurbo::{Point, Rect, Size};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use understory_bsp::{BspConfig, rect_contains, rects_intersect};

use crate::changes::StorageChange;
use crate::factory::{StorageKind, new_storage};
use crate::protocol::{IndexSet, ObjectStorage, QueryOptions};
use crate::storable::Storable;
use crate::testing::{TestObject, random_rect, tags};

const KINDS: [StorageKind; 3] = [
    StorageKind::Linear,
    StorageKind::IndexedBsp,
    StorageKind::DirectBsp,
];

/// The same drawing held by every backend.
///
/// Objects belong to one storage at a time, so each backend gets its own copies; copies share
/// a tag and are always mutated together.
struct Mirror {
    stores: Vec<Box<dyn ObjectStorage<TestObject>>>,
    next_tag: usize,
}

impl Mirror {
    fn new(canvas: Size, config: BspConfig) -> Self {
        Self {
            stores: KINDS
                .iter()
                .map(|&kind| new_storage(kind, canvas, config))
                .collect(),
            next_tag: 0,
        }
    }

    fn canvas(&self) -> Size {
        self.stores[0].canvas_size()
    }

    fn count(&self) -> usize {
        self.stores[0].count()
    }

    fn insert(&mut self, bounds: Rect, index: usize) {
        let tag = self.next_tag;
        self.next_tag += 1;
        for s in &mut self.stores {
            s.insert_object(TestObject::new(tag, bounds), index);
        }
    }

    /// Insert one object per entry of `indices`, as a single batch.
    fn insert_batch(&mut self, bounds: &[Rect], indices: &IndexSet) {
        let first = self.next_tag;
        self.next_tag += bounds.len();
        for s in &mut self.stores {
            let objects = bounds
                .iter()
                .enumerate()
                .map(|(i, b)| TestObject::new(first + i, *b))
                .collect();
            s.insert_objects(objects, indices);
        }
    }

    fn remove(&mut self, index: usize) {
        for s in &mut self.stores {
            s.remove_object(index);
        }
    }

    fn move_to(&mut self, from: usize, to: usize) {
        for s in &mut self.stores {
            let o = Rc::clone(&s.objects()[from]);
            s.move_object(&o, to);
        }
    }

    fn set_bounds(&mut self, index: usize, bounds: Rect) {
        for s in &mut self.stores {
            let o = Rc::clone(&s.objects()[index]);
            let old = o.set_bounds(bounds);
            s.object_did_change_bounds(&o, old);
        }
    }

    fn toggle_visibility(&mut self, index: usize) {
        for s in &mut self.stores {
            let o = Rc::clone(&s.objects()[index]);
            o.set_visible(!o.is_visible());
            s.object_did_change_visibility(&o);
        }
    }

    fn random_step(&mut self, rng: &mut SmallRng) {
        let n = self.count();
        let canvas = self.canvas();
        match rng.random_range(0..6) {
            0 if n > 0 => self.remove(rng.random_range(0..n)),
            1 if n > 0 => self.move_to(rng.random_range(0..n), rng.random_range(0..n)),
            2 if n > 0 => self.set_bounds(rng.random_range(0..n), random_rect(rng, canvas)),
            3 if n > 0 => self.toggle_visibility(rng.random_range(0..n)),
            4 => {
                let indices: IndexSet = (0..3).map(|_| rng.random_range(0..=n)).collect();
                let bounds: Vec<_> = indices.iter().map(|_| random_rect(rng, canvas)).collect();
                self.insert_batch(&bounds, &indices);
            }
            _ => {
                let bounds = random_rect(rng, canvas);
                self.insert(bounds, rng.random_range(0..=n));
            }
        }
    }

    /// Every backend returns what a brute-force scan of its own objects returns.
    fn check_query(&self, rects: &[Rect], options: QueryOptions) {
        let mut answers = Vec::new();
        for s in &self.stores {
            let got = s.objects_intersecting_rects(rects, options);
            let mut expected: Vec<_> = s
                .objects()
                .iter()
                .filter(|o| {
                    let b = o.bounds().abs();
                    (o.is_visible() || options.contains(QueryOptions::INCLUDE_INVISIBLE))
                        && (options.contains(QueryOptions::IGNORE_UPDATE_RECT)
                            || rects.iter().any(|r| rects_intersect(&b, &r.abs())))
                })
                .map(|o| o.tag)
                .collect();
            if options.contains(QueryOptions::REVERSE_ORDER) {
                expected.reverse();
            }
            let got = tags(&got);
            if options.contains(QueryOptions::RELAXED_Z_ORDER) {
                let set: BTreeSet<_> = got.iter().copied().collect();
                assert_eq!(set.len(), got.len(), "duplicate results");
                assert_eq!(
                    set,
                    expected.iter().copied().collect::<BTreeSet<_>>(),
                    "wrong membership"
                );
            } else {
                assert_eq!(got, expected, "wrong results for {rects:?} {options:?}");
            }
            answers.push(got);
        }
        if !options.contains(QueryOptions::RELAXED_Z_ORDER) {
            assert!(answers.windows(2).all(|w| w[0] == w[1]), "backends disagree");
        }
    }

    fn check_point(&self, point: Point) {
        for s in &self.stores {
            let expected: Vec<_> = s
                .objects()
                .iter()
                .filter(|o| o.is_visible() && rect_contains(&o.bounds().abs(), point))
                .map(|o| o.tag)
                .collect();
            assert_eq!(tags(&s.objects_containing_point(point)), expected);
        }
    }

    fn check_z_indices(&self) {
        for s in &self.stores {
            for (i, o) in s.objects().iter().enumerate() {
                assert_eq!(o.z_index(), i, "stale z-index");
                assert_eq!(o.storage(), Some(s.id()), "stale owner");
            }
        }
        let order: Vec<_> = self.stores.iter().map(|s| tags(s.objects())).collect();
        assert!(order.windows(2).all(|w| w[0] == w[1]), "drawing orders diverged");
    }
}

fn random_query(rng: &mut SmallRng, canvas: Size) -> Rect {
    let x = rng.random_range(-50.0..canvas.width);
    let y = rng.random_range(-50.0..canvas.height);
    let w = rng.random_range(0.0..canvas.width / 2.0);
    let h = rng.random_range(0.0..canvas.height / 2.0);
    Rect::new(x, y, x + w, y + h)
}

#[test]
fn backends_agree_under_random_mutation() {
    let mut rng = SmallRng::seed_from_u64(0xB5B);
    let mut m = Mirror::new(Size::new(600.0, 400.0), BspConfig::with_depth(5));
    for _ in 0..120 {
        let bounds = random_rect(&mut rng, m.canvas());
        m.insert(bounds, m.count());
    }
    let canvas = m.canvas();
    for _ in 0..300 {
        m.random_step(&mut rng);
        m.check_z_indices();
        let q = random_query(&mut rng, canvas);
        m.check_query(&[q], QueryOptions::empty());
        m.check_query(&[q], QueryOptions::REVERSE_ORDER);
        m.check_query(&[q], QueryOptions::RELAXED_Z_ORDER);
        let p = Point::new(
            rng.random_range(0.0..canvas.width),
            rng.random_range(0.0..canvas.height),
        );
        m.check_point(p);
    }
}

#[test]
fn region_queries_cover_every_rect() {
    let mut rng = SmallRng::seed_from_u64(7);
    let mut m = Mirror::new(Size::new(500.0, 500.0), BspConfig::with_depth(6));
    for _ in 0..150 {
        let bounds = random_rect(&mut rng, m.canvas());
        m.insert(bounds, 0);
    }
    let canvas = m.canvas();
    for _ in 0..50 {
        let region: Vec<_> = (0..3).map(|_| random_query(&mut rng, canvas)).collect();
        m.check_query(&region, QueryOptions::empty());
        m.check_query(&region, QueryOptions::INCLUDE_INVISIBLE);
    }
    m.toggle_visibility(10);
    m.check_query(&[], QueryOptions::IGNORE_UPDATE_RECT);
    m.check_query(
        &[],
        QueryOptions::IGNORE_UPDATE_RECT | QueryOptions::INCLUDE_INVISIBLE,
    );
}

#[test]
fn content_outside_the_canvas_is_found() {
    let mut m = Mirror::new(Size::new(100.0, 100.0), BspConfig::with_depth(4));
    m.insert(Rect::new(-40.0, -40.0, -10.0, -10.0), 0);
    m.insert(Rect::new(150.0, 20.0, 180.0, 60.0), 1);
    m.insert(Rect::new(90.0, 90.0, 130.0, 130.0), 2);
    m.check_query(&[Rect::new(-50.0, -50.0, 0.0, 0.0)], QueryOptions::empty());
    m.check_query(&[Rect::new(160.0, 0.0, 170.0, 100.0)], QueryOptions::empty());
    m.check_query(&[Rect::new(120.0, 120.0, 125.0, 125.0)], QueryOptions::empty());
    m.check_point(Point::new(-20.0, -20.0));
    m.check_point(Point::new(170.0, 50.0));
    for s in &m.stores {
        assert_eq!(s.objects_containing_point(Point::new(-20.0, -20.0)).len(), 1);
    }
}

#[test]
fn stress_full_canvas_returns_everything_once() {
    fn assert_complete(s: &dyn ObjectStorage<TestObject>, phase: &str) {
        let all = s.objects_intersecting_rect(
            Rect::from_origin_size(Point::ORIGIN, s.canvas_size()),
            QueryOptions::RELAXED_Z_ORDER,
        );
        let unique: BTreeSet<_> = all.iter().map(|o| o.tag).collect();
        assert_eq!(unique.len(), all.len(), "duplicates after {phase}");
        assert_eq!(all.len(), s.count(), "objects lost after {phase}");
        let ordered = s.objects_intersecting_rect(
            Rect::from_origin_size(Point::ORIGIN, s.canvas_size()),
            QueryOptions::empty(),
        );
        assert_eq!(tags(&ordered), tags(s.objects()), "drawing order broken after {phase}");
    }

    let canvas = Size::new(2000.0, 2000.0);
    let mut rng = SmallRng::seed_from_u64(1000);
    for kind in [StorageKind::IndexedBsp, StorageKind::DirectBsp] {
        let mut s = new_storage(kind, canvas, BspConfig::with_depth(8));
        let objects: Vec<_> = (0..1000)
            .map(|i| TestObject::new(i, random_rect(&mut rng, canvas)))
            .collect();
        s.set_objects(objects);
        assert_complete(s.as_ref(), "loading");
        for _ in 0..500 {
            let n = s.count();
            s.remove_object(rng.random_range(0..n));
        }
        assert_eq!(s.count(), 500);
        assert_complete(s.as_ref(), "removals");
        for i in 0..500 {
            let n = s.count();
            let o = TestObject::new(1000 + i, random_rect(&mut rng, canvas));
            s.insert_object(o, rng.random_range(0..=n));
        }
        assert_eq!(s.count(), 1000);
        assert_complete(s.as_ref(), "insertions");
        for _ in 0..200 {
            let n = s.count();
            let o = Rc::clone(&s.objects()[rng.random_range(0..n)]);
            s.move_object(&o, rng.random_range(0..n));
        }
        assert_complete(s.as_ref(), "moves");
    }
}

#[test]
fn reloading_the_same_objects_changes_nothing() {
    let mut rng = SmallRng::seed_from_u64(3);
    let mut m = Mirror::new(Size::new(300.0, 300.0), BspConfig::default());
    for i in 0..80 {
        let bounds = random_rect(&mut rng, m.canvas());
        m.insert(bounds, i);
    }
    let q = Rect::new(50.0, 50.0, 200.0, 150.0);
    let before: Vec<_> = m
        .stores
        .iter()
        .map(|s| tags(&s.objects_intersecting_rect(q, QueryOptions::empty())))
        .collect();
    for s in &mut m.stores {
        let objects = s.objects().to_vec();
        s.set_objects(objects);
    }
    m.check_z_indices();
    for (s, expected) in m.stores.iter().zip(&before) {
        assert_eq!(&tags(&s.objects_intersecting_rect(q, QueryOptions::empty())), expected);
    }
}

#[test]
fn resizing_keeps_answers_exact() {
    let mut rng = SmallRng::seed_from_u64(4);
    let mut m = Mirror::new(Size::new(400.0, 400.0), BspConfig::with_depth(4));
    for i in 0..60 {
        let bounds = random_rect(&mut rng, m.canvas());
        m.insert(bounds, i);
    }
    for s in &mut m.stores {
        s.set_canvas_size(Size::new(150.0, 150.0));
        assert_eq!(s.canvas_size(), Size::new(150.0, 150.0));
    }
    for _ in 0..40 {
        let q = random_query(&mut rng, Size::new(400.0, 400.0));
        m.check_query(&[q], QueryOptions::empty());
        m.check_point(Point::new(
            rng.random_range(0.0..400.0),
            rng.random_range(0.0..400.0),
        ));
    }
}

#[test]
fn backends_report_identical_changes() {
    let mut m = Mirror::new(Size::new(100.0, 100.0), BspConfig::with_depth(3));
    for s in &mut m.stores {
        s.set_change_tracking(true);
    }
    m.insert(Rect::new(0.0, 0.0, 10.0, 10.0), 0);
    m.insert(Rect::new(20.0, 0.0, 30.0, 10.0), 0);
    m.insert(Rect::new(40.0, 0.0, 50.0, 10.0), 9);
    m.move_to(0, 2);
    m.set_bounds(1, Rect::new(5.0, 5.0, 6.0, 6.0));
    m.toggle_visibility(0);
    m.remove(1);
    let expected = [
        StorageChange::Inserted(IndexSet::from([0])),
        StorageChange::Inserted(IndexSet::from([0])),
        StorageChange::Inserted(IndexSet::from([2])),
        StorageChange::Moved { from: 0, to: 2 },
        StorageChange::Removed(IndexSet::from([1])),
    ];
    for s in &mut m.stores {
        assert_eq!(s.take_changes(), expected);
    }
    for s in &mut m.stores {
        let removed = s.remove_objects(&IndexSet::from([0, 1, 5]));
        assert_eq!(removed.len(), 2);
        assert!(removed.iter().all(|o| o.storage().is_none()));
        assert_eq!(s.take_changes(), [StorageChange::Removed(IndexSet::from([0, 1]))]);
        assert_eq!(s.count(), 0);
    }
}

#[test]
fn unobserved_storages_keep_no_history() {
    for kind in KINDS {
        let mut s = new_storage(kind, Size::new(100.0, 100.0), BspConfig::with_depth(4));
        assert!(!s.is_tracking_changes());
        for i in 0..50_000 {
            s.insert_object(TestObject::new(i, Rect::new(1.0, 1.0, 9.0, 9.0)), 0);
            s.remove_object(0);
        }
        assert!(s.take_changes().is_empty(), "{kind:?} recorded without an observer");

        s.set_change_tracking(true);
        s.insert_object(TestObject::new(0, Rect::ZERO), 0);
        assert_eq!(s.take_changes(), [StorageChange::Inserted(IndexSet::from([0]))]);
        s.remove_object(0);
        s.set_change_tracking(false);
        assert!(s.take_changes().is_empty(), "{kind:?} kept changes after tracking stopped");
    }
}
