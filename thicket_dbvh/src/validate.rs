// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural diagnostics and explicit maintenance.

use alloc::vec;
use alloc::vec::Vec;

use thicket_aabb::Aabb3;

use crate::arena::{NodeId, NodeKind};
use crate::tree::Dbvh;

bitflags::bitflags! {
    /// Structural defects found by [`Dbvh::validate`]. Empty means healthy.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ValidationIssues: u8 {
        /// An internal node's bounds is not the union of its children's.
        const STALE_BOUNDS = 0b0000_0001;
        /// A child's parent link does not point back at its parent, or the
        /// root carries a parent link.
        const BAD_PARENT_LINK = 0b0000_0010;
        /// A live slot is not reachable from the root.
        const UNREACHABLE_NODE = 0b0000_0100;
        /// A child handle names a freed or stale slot.
        const FREE_SLOT_REACHABLE = 0b0000_1000;
        /// The live-node count does not match a binary tree's leaf count.
        const LEAF_COUNT_MISMATCH = 0b0001_0000;
    }
}

impl<T> Dbvh<T> {
    /// Check every tree invariant and report what is broken.
    ///
    /// Walks the whole tree: internal bounds must equal the union of their
    /// children (within one [`stepped`] epsilon), parent links must match the
    /// traversal, every live slot must be reachable, and no stale handle may
    /// appear as a child. Intended for tests and debug assertions; cost is
    /// O(live nodes).
    ///
    /// [`stepped`]: thicket_aabb::Aabb3::stepped
    pub fn validate(&self) -> ValidationIssues {
        let mut issues = ValidationIssues::empty();
        let mut visited = vec![false; self.arena().slot_count()];
        let mut leaves = 0usize;

        if let Some(root) = self.root() {
            if self.arena().get(root).is_some_and(|n| n.parent().is_some()) {
                issues |= ValidationIssues::BAD_PARENT_LINK;
            }
            let mut stack = vec![root];
            while let Some(id) = stack.pop() {
                let Some(node) = self.arena().get(id) else {
                    issues |= ValidationIssues::FREE_SLOT_REACHABLE;
                    continue;
                };
                visited[id.idx()] = true;
                match node.kind() {
                    NodeKind::Leaf(_) => leaves += 1,
                    NodeKind::Internal { left, right } => {
                        for child in [*left, *right] {
                            match self.arena().get(child) {
                                Some(c) if c.parent() != Some(id) => {
                                    issues |= ValidationIssues::BAD_PARENT_LINK;
                                }
                                None => issues |= ValidationIssues::FREE_SLOT_REACHABLE,
                                _ => {}
                            }
                        }
                        if let (Some(l), Some(r)) =
                            (self.arena().get(*left), self.arena().get(*right))
                        {
                            let merged = l.bounds().union(&r.bounds());
                            let stored = node.bounds();
                            if !(stored.stepped().contains(&merged)
                                && merged.stepped().contains(&stored))
                            {
                                issues |= ValidationIssues::STALE_BOUNDS;
                            }
                        }
                        stack.push(*left);
                        stack.push(*right);
                    }
                }
            }
        }

        if self.arena().ids().any(|id| !visited[id.idx()]) {
            issues |= ValidationIssues::UNREACHABLE_NODE;
        }
        if self.len() != leaves {
            issues |= ValidationIssues::LEAF_COUNT_MISMATCH;
        }
        issues
    }

    /// Depth of the deepest leaf; 0 for an empty tree, 1 for a sole leaf.
    ///
    /// No rebalancing happens during inserts and removes, so adversarial
    /// insertion orders can drive this toward the leaf count. Correctness is
    /// unaffected; [`Self::rebuild`] is the recovery hook.
    pub fn height(&self) -> usize {
        let Some(root) = self.root() else {
            return 0;
        };
        let mut max_depth = 0;
        let mut stack = vec![(root, 1usize)];
        while let Some((id, depth)) = stack.pop() {
            match self.arena().get(id).map(|n| n.kind()) {
                Some(NodeKind::Internal { left, right }) => {
                    stack.push((*left, depth + 1));
                    stack.push((*right, depth + 1));
                }
                _ => max_depth = max_depth.max(depth),
            }
        }
        max_depth
    }

    /// Rebuild the hierarchy over the current leaves.
    ///
    /// Frees every internal node, then rebuilds top-down by splitting the
    /// leaf set at the centroid median of its widest axis, so the result is
    /// balanced by construction regardless of geometry. Leaf handles survive
    /// unchanged; only the internal wiring is rebuilt. An explicit
    /// maintenance operation for callers that observe query cost degrading
    /// after adversarial churn; never invoked implicitly.
    pub fn rebuild(&mut self) {
        let mut leaves: Vec<(NodeId, Aabb3)> = Vec::new();
        let mut internals = Vec::new();
        for id in self.arena().ids().collect::<Vec<NodeId>>() {
            match self.arena().get(id) {
                Some(n) if n.is_leaf() => leaves.push((id, n.bounds())),
                Some(_) => internals.push(id),
                None => {}
            }
        }
        for id in internals {
            self.arena_mut()
                .release(id)
                .expect("detached internal node is live");
        }
        self.set_root(None);
        if leaves.is_empty() {
            return;
        }
        let root = self.build_cluster(&mut leaves);
        if let Some(node) = self.arena_mut().get_mut(root) {
            node.set_parent(None);
        }
        self.set_root(Some(root));
    }

    /// Median split over leaf centroids along the widest axis. Halving by
    /// count bounds the recursion depth by `log2(leaves)`.
    fn build_cluster(&mut self, leaves: &mut [(NodeId, Aabb3)]) -> NodeId {
        if leaves.len() == 1 {
            return leaves[0].0;
        }
        let mut centroids = Aabb3::EMPTY;
        for (_, b) in leaves.iter() {
            centroids.expand(&Aabb3::from_point(b.center()));
        }
        let ext = centroids.extents();
        let axis = if ext.x >= ext.y && ext.x >= ext.z {
            0
        } else if ext.y >= ext.z {
            1
        } else {
            2
        };
        let mid = leaves.len() / 2;
        leaves.select_nth_unstable_by(mid, |a, b| {
            match a.1.center()[axis].partial_cmp(&b.1.center()[axis]) {
                Some(ord) => ord,
                None => core::cmp::Ordering::Equal,
            }
        });
        let (lo, hi) = leaves.split_at_mut(mid);
        let left = self.build_cluster(lo);
        let right = self.build_cluster(hi);
        self.link_cluster(left, right)
    }
}
