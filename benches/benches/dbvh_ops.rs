// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec3;
use thicket_aabb::Aabb3;
use thicket_dbvh::Dbvh;

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f32(&mut self) -> f32 {
        let v = self.next_u64() >> 40;
        (v as f32) / ((1u64 << 24) as f32)
    }
}

/// Unit cubes on a regular 3D lattice.
fn gen_lattice_boxes(n: usize, cell: f32) -> Vec<Aabb3> {
    let mut out = Vec::with_capacity(n * n * n);
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let min = Vec3::new(x as f32 * cell, y as f32 * cell, z as f32 * cell);
                out.push(Aabb3::new(min, min + Vec3::splat(cell)));
            }
        }
    }
    out
}

fn gen_random_boxes(count: usize, span: f32, max_size: f32, seed: u64) -> Vec<Aabb3> {
    let mut rng = Rng::new(seed);
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let min = Vec3::new(
            rng.next_f32() * span,
            rng.next_f32() * span,
            rng.next_f32() * span,
        );
        let size = Vec3::new(
            rng.next_f32() * max_size,
            rng.next_f32() * max_size,
            rng.next_f32() * max_size,
        );
        out.push(Aabb3::new(min, min + size));
    }
    out
}

fn build_tree(boxes: &[Aabb3]) -> Dbvh<usize> {
    let mut tree = Dbvh::new();
    for (i, b) in boxes.iter().enumerate() {
        tree.insert(i, *b);
    }
    tree
}

fn bench_insert(c: &mut Criterion) {
    let lattice = gen_lattice_boxes(10, 2.0);
    let random = gen_random_boxes(1000, 100.0, 4.0, 0x5eed);

    let mut group = c.benchmark_group("insert");
    group.throughput(Throughput::Elements(lattice.len() as u64));
    group.bench_function("lattice_1000", |b| {
        b.iter(|| black_box(build_tree(&lattice)));
    });
    group.throughput(Throughput::Elements(random.len() as u64));
    group.bench_function("random_1000", |b| {
        b.iter(|| black_box(build_tree(&random)));
    });
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let boxes = gen_random_boxes(1000, 100.0, 4.0, 0xfeed);
    let tree = build_tree(&boxes);
    let probes = gen_random_boxes(64, 100.0, 10.0, 0xbeef);

    let mut group = c.benchmark_group("query");
    group.throughput(Throughput::Elements(probes.len() as u64));
    group.bench_function("region_1000x64", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for q in &probes {
                hits += tree.query_region(*q).count();
            }
            black_box(hits)
        });
    });
    group.bench_function("point_1000x64", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for q in &probes {
                hits += tree.query_point(q.center()).count();
            }
            black_box(hits)
        });
    });
    group.finish();
}

fn bench_update_churn(c: &mut Criterion) {
    let boxes = gen_random_boxes(1000, 100.0, 4.0, 0xc0ffee);
    let moved = gen_random_boxes(1000, 100.0, 4.0, 0xdecaf);

    let mut group = c.benchmark_group("update");
    group.throughput(Throughput::Elements(boxes.len() as u64));
    group.bench_function("move_all_1000", |b| {
        b.iter_batched(
            || {
                let mut tree = Dbvh::new();
                let ids: Vec<_> = boxes.iter().enumerate().map(|(i, b)| tree.insert(i, *b)).collect();
                (tree, ids)
            },
            |(mut tree, ids)| {
                for (id, b) in ids.into_iter().zip(moved.iter()) {
                    let _ = black_box(tree.update(id, *b));
                }
                tree
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_query, bench_update_churn);
criterion_main!(benches);
