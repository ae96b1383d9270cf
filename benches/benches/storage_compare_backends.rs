// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::Cell;
use std::rc::Rc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect, Size};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use understory_object_storage::{
    BspConfig, Mark, ObjectStorage, QueryOptions, Storable, StorableState, StorageId,
    StorageKind, new_storage,
};

const CANVAS: Size = Size::new(4000.0, 3000.0);

const KINDS: [StorageKind; 3] = [
    StorageKind::Linear,
    StorageKind::IndexedBsp,
    StorageKind::DirectBsp,
];

struct Shape {
    bounds: Cell<Rect>,
    state: StorableState,
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

fn gen_random_shapes(count: usize, max_side: f64, seed: u64) -> Vec<Rc<Shape>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let w = rng.random_range(4.0..max_side);
            let h = rng.random_range(4.0..max_side);
            let x = rng.random_range(0.0..CANVAS.width - w);
            let y = rng.random_range(0.0..CANVAS.height - h);
            Rc::new(Shape {
                bounds: Cell::new(Rect::new(x, y, x + w, y + h)),
                state: StorableState::new(),
            })
        })
        .collect()
}

fn populated(kind: StorageKind, count: usize) -> Box<dyn ObjectStorage<Shape>> {
    let mut storage = new_storage(kind, CANVAS, BspConfig::default());
    storage.set_objects(gen_random_shapes(count, 120.0, 0xD8A3_C0DE));
    storage
}

fn bench_query_rect(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_rect");
    for &n in &[500usize, 5000, 20000] {
        for kind in KINDS {
            let storage = populated(kind, n);
            let update = Rect::new(1000.0, 800.0, 1400.0, 1100.0);
            group.throughput(Throughput::Elements(n as u64));
            group.bench_function(format!("{kind:?}_n{n}"), |b| {
                b.iter(|| {
                    let hits = storage.objects_intersecting_rect(update, QueryOptions::empty());
                    black_box(hits.len());
                });
            });
            group.bench_function(format!("{kind:?}_relaxed_n{n}"), |b| {
                b.iter(|| {
                    let hits =
                        storage.objects_intersecting_rect(update, QueryOptions::RELAXED_Z_ORDER);
                    black_box(hits.len());
                });
            });
        }
    }
    group.finish();
}

fn bench_hit_test(c: &mut Criterion) {
    let mut group = c.benchmark_group("hit_test");
    let mut rng = SmallRng::seed_from_u64(42);
    let points: Vec<Point> = (0..256)
        .map(|_| {
            Point::new(
                rng.random_range(0.0..CANVAS.width),
                rng.random_range(0.0..CANVAS.height),
            )
        })
        .collect();
    for kind in KINDS {
        let storage = populated(kind, 10000);
        group.bench_function(format!("{kind:?}_n10000"), |b| {
            b.iter(|| {
                let mut total = 0;
                for &p in &points {
                    total += storage.objects_containing_point(p).len();
                }
                black_box(total);
            });
        });
    }
    group.finish();
}

fn bench_populate(c: &mut Criterion) {
    let mut group = c.benchmark_group("populate");
    let n = 5000;
    group.throughput(Throughput::Elements(n as u64));
    for kind in KINDS {
        group.bench_function(format!("{kind:?}_insert_n{n}"), |b| {
            b.iter_batched(
                || gen_random_shapes(n, 120.0, 7),
                |shapes| {
                    let mut storage = new_storage(kind, CANVAS, BspConfig::default());
                    for (i, shape) in shapes.into_iter().enumerate() {
                        storage.insert_object(shape, i);
                    }
                    black_box(storage.count());
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_mutate(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutate");
    for kind in KINDS {
        // Removing near the bottom of the drawing order forces the largest renumbering.
        group.bench_function(format!("{kind:?}_remove_insert_front_n5000"), |b| {
            b.iter_batched(
                || populated(kind, 5000),
                |mut storage| {
                    for _ in 0..100 {
                        if let Some(o) = storage.remove_object(0) {
                            let last = storage.count();
                            storage.insert_object(o, last);
                        }
                    }
                    black_box(storage.count());
                },
                BatchSize::LargeInput,
            )
        });
        group.bench_function(format!("{kind:?}_drag_n5000"), |b| {
            b.iter_batched(
                || populated(kind, 5000),
                |mut storage| {
                    let Some(o) = storage.object_at(2500).cloned() else {
                        return;
                    };
                    for step in 0..100 {
                        let old = o.bounds.get();
                        o.bounds.set(old.with_origin(Point::new(step as f64 * 30.0, 1500.0)));
                        storage.object_did_change_bounds(&o, old);
                    }
                    black_box(storage.count());
                },
                BatchSize::LargeInput,
            )
        });
        group.bench_function(format!("{kind:?}_bring_to_front_n5000"), |b| {
            b.iter_batched(
                || populated(kind, 5000),
                |mut storage| {
                    for i in 0..100 {
                        if let Some(o) = storage.object_at(i).cloned() {
                            storage.move_object(&o, usize::MAX);
                        }
                    }
                    black_box(storage.count());
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_query_rect,
    bench_hit_test,
    bench_populate,
    bench_mutate
);
criterion_main!(benches);
