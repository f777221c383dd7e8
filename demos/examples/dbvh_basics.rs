// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DBVH basics.
//!
//! Build a small tree, run region and point queries, move a box, remove it.
//!
//! Run:
//! - `cargo run -p thicket_demos --example dbvh_basics`

use glam::Vec3;
use thicket_aabb::Aabb3;
use thicket_dbvh::Dbvh;

fn main() {
    let mut tree: Dbvh<&str> = Dbvh::new();

    // A few props scattered on the ground plane.
    let crate_box = tree.insert("crate", Aabb3::new(Vec3::ZERO, Vec3::splat(1.0)));
    let _barrel = tree.insert(
        "barrel",
        Aabb3::new(Vec3::new(4.0, 0.0, 4.0), Vec3::new(5.0, 2.0, 5.0)),
    );
    let _fence = tree.insert(
        "fence",
        Aabb3::new(Vec3::new(-6.0, 0.0, -1.0), Vec3::new(6.0, 1.0, 0.0)),
    );

    println!("tree: {tree:?}");

    // Which boxes could a player standing at the origin touch?
    let probe = Aabb3::from_center_half_extents(Vec3::ZERO, Vec3::splat(1.5));
    let near: Vec<&str> = tree.query_region(probe).map(|(_, name)| *name).collect();
    println!("near origin: {near:?}");

    // Point query: what is at (4.5, 1.0, 4.5)?
    let at: Vec<&str> = tree
        .query_point(Vec3::new(4.5, 1.0, 4.5))
        .map(|(_, name)| *name)
        .collect();
    println!("at barrel center: {at:?}");

    // The crate gets pushed next to the barrel. `update` hands back a new
    // handle; the old one is dead from here on.
    let crate_box = tree
        .update(crate_box, Aabb3::new(Vec3::new(3.0, 0.0, 4.0), Vec3::new(4.0, 1.0, 5.0)))
        .expect("crate is live");

    let near_barrel: Vec<&str> = tree
        .query_region(Aabb3::new(Vec3::new(3.5, 0.0, 3.5), Vec3::new(5.5, 2.0, 5.5)))
        .map(|(_, name)| *name)
        .collect();
    println!("near barrel after push: {near_barrel:?}");

    // Despawn the crate.
    let removed = tree.remove(crate_box).expect("crate is live");
    println!("removed: {removed}, remaining: {}", tree.len());
}
