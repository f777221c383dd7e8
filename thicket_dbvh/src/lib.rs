// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=thicket_dbvh --heading-base-level=0

//! Thicket DBVH: an incrementally maintained dynamic bounding-volume hierarchy.
//!
//! Thicket DBVH is the broad-phase building block for collision detection,
//! culling, and proximity queries in real-time simulations.
//!
//! - Insert, reposition, and remove axis-aligned bounding boxes ([`Aabb3`])
//!   with user payloads, without ever rebuilding the whole tree.
//! - Query by intersecting region or containing point; results are always
//!   conservative (touching counts).
//! - Handles are generational: a released [`NodeId`] can never alias a live
//!   node, so use-after-remove is detected in O(1) instead of corrupting the
//!   structure.
//!
//! The tree answers exactly one question: "which stored boxes overlap this
//! box or point". It performs no narrow-phase work, no raycasts, and no swept
//! queries; callers compute up-to-date bounds from their own transforms and
//! feed them in.
//!
//! ## Where this fits
//!
//! A typical frame drives the tree in two phases. First, mutation: one
//! [`Dbvh::insert`]/[`Dbvh::update`]/[`Dbvh::remove`] per changed object.
//! Then, queries: [`Dbvh::query_region`] with each region of interest to
//! collect candidates for precise tests downstream. Nothing in the tree calls
//! back into the caller; all interaction is synchronous call/return.
//!
//! ## Structure and maintenance
//!
//! Insertion picks a sibling leaf by greedy surface-area descent and splices
//! a new internal node above it; removal collapses the leaf's parent onto the
//! sibling; both refit every affected ancestor, so the union invariant holds
//! after every operation. There is no rebalancing during mutation: an
//! adversarial insertion order can degrade [`Dbvh::height`] (and with it
//! query cost) without ever affecting correctness. [`Dbvh::rebuild`] is the
//! explicit recovery hook, and [`Dbvh::validate`] reports structural health
//! as a [`ValidationIssues`] set.
//!
//! ## API overview
//!
//! - [`Dbvh`]: the tree; owns a node [`Arena`] and a root handle.
//! - [`NodeId`]: generational handle of a leaf, returned by
//!   [`Dbvh::insert`] and [`Dbvh::update`].
//! - [`Arena`]/[`Node`]/[`NodeKind`]: the slot table the tree allocates from.
//! - [`DbvhError`]/[`ArenaError`]: stale-handle rejections; nothing here
//!   panics on malformed calls.
//!
//! # Example
//!
//! ```rust
//! use glam::Vec3;
//! use thicket_dbvh::{Aabb3, Dbvh};
//!
//! let mut tree: Dbvh<&str> = Dbvh::new();
//!
//! let crate_box = tree.insert("crate", Aabb3::new(Vec3::ZERO, Vec3::splat(1.0)));
//! let _barrel = tree.insert("barrel", Aabb3::new(Vec3::splat(5.0), Vec3::splat(6.0)));
//!
//! // Which boxes could a 2x2x2 probe at the origin touch?
//! let hits: Vec<_> = tree
//!     .query_region(Aabb3::new(Vec3::splat(-1.0), Vec3::splat(1.0)))
//!     .map(|(_, name)| *name)
//!     .collect();
//! assert_eq!(hits, vec!["crate"]);
//!
//! // Move the crate; the old handle dies, the new one is live.
//! let crate_box = tree
//!     .update(crate_box, Aabb3::new(Vec3::splat(5.5), Vec3::splat(6.5)))
//!     .unwrap();
//!
//! let near_barrel = tree
//!     .query_point(Vec3::splat(5.75))
//!     .map(|(_, name)| *name)
//!     .collect::<Vec<_>>();
//! assert_eq!(near_barrel.len(), 2);
//!
//! assert_eq!(tree.remove(crate_box), Ok("crate"));
//! ```
//!
//! ## Handle discipline
//!
//! [`Dbvh::update`] removes and reinserts under the hood, so it returns a
//! *new* handle and kills the old one. Reading a dead handle is not undefined
//! behavior here, just an `Err`/`None`:
//!
//! ```rust
//! use glam::Vec3;
//! use thicket_dbvh::{Aabb3, Dbvh, DbvhError};
//!
//! let mut tree: Dbvh<u32> = Dbvh::new();
//! let old = tree.insert(7, Aabb3::new(Vec3::ZERO, Vec3::ONE));
//! let new = tree.update(old, Aabb3::new(Vec3::ONE, Vec3::splat(2.0))).unwrap();
//!
//! assert_eq!(tree.get(old), None);
//! assert_eq!(tree.remove(old), Err(DbvhError::InvalidHandle));
//! assert_eq!(tree.get(new), Some(&7));
//! ```
//!
//! This crate is `no_std` and uses `alloc`. The tree provides no internal
//! synchronization: share it across threads behind one external lock or
//! confine it to a single thread.

#![no_std]

extern crate alloc;

pub mod arena;
pub mod error;
pub mod tree;
pub mod validate;

pub use arena::{Arena, Node, NodeId, NodeKind};
pub use error::{ArenaError, DbvhError};
pub use thicket_aabb::Aabb3;
pub use tree::Dbvh;
pub use validate::ValidationIssues;
