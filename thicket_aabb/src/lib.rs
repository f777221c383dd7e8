// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket AABB: a Glam-native 3D axis-aligned bounding box.
//!
//! This crate is the geometry layer under [`thicket_dbvh`]: a small, total
//! box algebra with no error conditions.
//!
//! - Closed-interval intersection and containment tests: boxes that merely
//!   touch on an edge or face count as intersecting, which is what a
//!   conservative broad phase needs.
//! - [`Aabb3::union`] is associative, commutative, and idempotent, with
//!   [`Aabb3::EMPTY`] as its identity.
//! - [`Aabb3::surface_area`] is a monotonic placement heuristic, not a
//!   volume; it only ever compares candidate placements against each other.
//! - [`Aabb3::stepped`] pads both corners by an epsilon so a freshly
//!   computed leaf box stays valid under later floating-point refits.
//!
//! All operations are total over degenerate (zero-volume) and inverted
//! boxes. Float inputs are assumed finite apart from the [`Aabb3::EMPTY`]
//! sentinel; no NaNs.
//!
//! [`thicket_dbvh`]: https://docs.rs/thicket_dbvh
//!
//! # Example
//!
//! ```rust
//! use glam::Vec3;
//! use thicket_aabb::Aabb3;
//!
//! let a = Aabb3::new(Vec3::ZERO, Vec3::splat(2.0));
//! let b = Aabb3::new(Vec3::splat(2.0), Vec3::splat(4.0));
//!
//! // Touching boxes intersect.
//! assert!(a.intersects(&b));
//!
//! // Union is the tightest enclosing box.
//! let u = a.union(&b);
//! assert_eq!(u, Aabb3::new(Vec3::ZERO, Vec3::splat(4.0)));
//!
//! // EMPTY is the union identity.
//! assert_eq!(Aabb3::EMPTY.union(&a), a);
//! ```
//!
//! This crate is `no_std` and does not require `alloc`.

#![no_std]

use glam::Vec3;

/// Axis-aligned bounding box in 3D, stored as min/max corners.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb3 {
    /// The empty box: `min = +∞`, `max = −∞`.
    ///
    /// Intersects and contains nothing; the identity of [`Self::union`].
    pub const EMPTY: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// Create a new AABB from min/max corners.
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at `center` with the given half-extents.
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Create a degenerate (zero-volume) box around a single point.
    pub const fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Whether the boxes overlap or touch on every axis.
    ///
    /// The comparison is closed: shared faces and edges count.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Whether the box contains the point (closed on all axes).
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.min.x <= p.x
            && self.min.y <= p.y
            && self.min.z <= p.z
            && p.x <= self.max.x
            && p.y <= self.max.y
            && p.z <= self.max.z
    }

    /// Whether `other` lies entirely inside this box (closed on all axes).
    pub fn contains(&self, other: &Self) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.min.z <= other.min.z
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
            && other.max.z <= self.max.z
    }

    /// The tightest box containing both operands.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// In-place union.
    pub fn expand(&mut self, other: &Self) {
        *self = self.union(other);
    }

    /// Inflate both corners outward by `margin` on every axis.
    pub fn padded(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    /// Inflate by one float epsilon to absorb drift from incremental refits.
    ///
    /// Idempotent only up to the epsilon, not exactly.
    pub fn stepped(&self) -> Self {
        self.padded(f32::EPSILON)
    }

    /// Surface area, `2*(dx*dy + dy*dz + dz*dx)`, with extents clamped to
    /// zero so inverted boxes (including [`Self::EMPTY`]) report 0.
    ///
    /// A monotonic proxy for box size used to compare candidate placements;
    /// never an exact volume.
    pub fn surface_area(&self) -> f32 {
        let d = (self.max - self.min).max(Vec3::ZERO);
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// True if the box is inverted on any axis (no volume). Assumes no NaN.
    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    /// Center point. Meaningless for [`Self::EMPTY`].
    pub fn center(&self) -> Vec3 {
        0.5 * (self.min + self.max)
    }

    /// Per-axis extents, clamped to zero for inverted boxes.
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min).max(Vec3::ZERO)
    }
}

impl Default for Aabb3 {
    fn default() -> Self {
        Self::EMPTY
    }
}
