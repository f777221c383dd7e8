// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Churn and maintenance.
//!
//! Insert boxes in an adversarial (nested) order, watch the tree height
//! degrade, then recover it with an explicit rebuild.
//!
//! Run:
//! - `cargo run -p thicket_demos --example dbvh_churn`

use glam::Vec3;
use thicket_aabb::Aabb3;
use thicket_dbvh::Dbvh;

fn main() {
    let mut tree: Dbvh<usize> = Dbvh::new();

    // Nested cubes: every new box contains all previous ones, the worst case
    // for greedy placement.
    let n = 256;
    for i in 0..n {
        let r = (i + 1) as f32;
        tree.insert(i, Aabb3::new(Vec3::splat(-r), Vec3::splat(r)));
    }
    println!("after {n} nested inserts: height {}", tree.height());
    assert!(tree.validate().is_empty());

    // Queries stay correct regardless of the shape.
    let hits = tree
        .query_region(Aabb3::new(Vec3::splat(-2.0), Vec3::splat(2.0)))
        .count();
    println!("boxes overlapping the small probe: {hits}");

    // Maintenance pass: same leaves, same handles, fresh wiring.
    tree.rebuild();
    println!("after rebuild: height {}", tree.height());
    assert!(tree.validate().is_empty());

    let hits_after = tree
        .query_region(Aabb3::new(Vec3::splat(-2.0), Vec3::splat(2.0)))
        .count();
    assert_eq!(hits, hits_after);
    println!("query answers unchanged: {hits_after}");
}
