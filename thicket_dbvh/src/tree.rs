// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: insertion, removal, repositioning, queries.

use alloc::vec;
use alloc::vec::Vec;

use glam::Vec3;
use thicket_aabb::Aabb3;

use crate::arena::{Arena, Node, NodeId, NodeKind};
use crate::error::DbvhError;

/// Incrementally maintained dynamic bounding-volume hierarchy.
///
/// A binary tree of AABBs over a changing payload set. Leaves carry payloads;
/// every internal node's bounds is the union of its children's bounds, and
/// every mutation restores that invariant along the affected ancestor chain.
///
/// The tree is either Empty (no root) or NonEmpty; removing the last leaf
/// returns it to Empty. Single-threaded and synchronous: all operations run
/// to completion on the caller's thread, and no internal locking is provided.
pub struct Dbvh<T> {
    arena: Arena<T>,
    root: Option<NodeId>,
}

impl<T> Default for Dbvh<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> core::fmt::Debug for Dbvh<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dbvh")
            .field("leaves", &self.len())
            .field("has_root", &self.root.is_some())
            .field("arena", &self.arena)
            .finish_non_exhaustive()
    }
}

impl<T> Dbvh<T> {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Insert a payload with the given bounds. Returns its leaf handle.
    ///
    /// Placement descends from the root, at each internal node choosing the
    /// child whose bounds-union with the incoming box has the smaller surface
    /// area; equal costs descend right. A new internal node is spliced in
    /// above the chosen sibling, and the whole ancestor chain is refit.
    pub fn insert(&mut self, payload: T, bounds: Aabb3) -> NodeId {
        let leaf = self.arena.reserve(Node::leaf(payload, bounds));
        self.attach_leaf(leaf);
        leaf
    }

    /// Remove a leaf, returning its payload.
    ///
    /// The leaf's sibling is promoted into their collapsed parent's place and
    /// the ancestor bounds are refit. A stale handle is rejected without
    /// touching the tree; on an empty tree this is a safe, non-panicking call.
    pub fn remove(&mut self, id: NodeId) -> Result<T, DbvhError> {
        if !self.arena.get(id).is_some_and(Node::is_leaf) {
            return Err(DbvhError::InvalidHandle);
        }
        self.detach_leaf(id);
        match self.arena.release(id)?.kind {
            NodeKind::Leaf(payload) => Ok(payload),
            NodeKind::Internal { .. } => Err(DbvhError::InvalidHandle),
        }
    }

    /// Reposition the payload behind `id`, returning its new handle.
    ///
    /// The payload is captured by removing the leaf first and reinserting it
    /// at the new bounds. The old slot may be recycled by the reinsertion, so
    /// `id` is dead on return and must not be used again; only the returned
    /// handle names the payload afterwards.
    pub fn update(&mut self, id: NodeId, bounds: Aabb3) -> Result<NodeId, DbvhError> {
        let payload = self.remove(id)?;
        Ok(self.insert(payload, bounds))
    }

    /// Payload access. `None` for stale or non-leaf handles.
    pub fn get(&self, id: NodeId) -> Option<&T> {
        match self.arena.get(id)?.kind() {
            NodeKind::Leaf(payload) => Some(payload),
            NodeKind::Internal { .. } => None,
        }
    }

    /// Mutable payload access. `None` for stale or non-leaf handles.
    ///
    /// Mutating the payload never moves the leaf; use [`Self::update`] when
    /// its bounds change.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        match &mut self.arena.get_mut(id)?.kind {
            NodeKind::Leaf(payload) => Some(payload),
            NodeKind::Internal { .. } => None,
        }
    }

    /// The stored bounds of a live leaf.
    pub fn bounds(&self, id: NodeId) -> Option<Aabb3> {
        let node = self.arena.get(id)?;
        node.is_leaf().then(|| node.bounds())
    }

    /// Whether `id` names a live leaf.
    pub fn contains_handle(&self, id: NodeId) -> bool {
        self.arena.get(id).is_some_and(Node::is_leaf)
    }

    /// Number of stored payloads.
    pub fn len(&self) -> usize {
        // A binary tree with L leaves holds 2L - 1 nodes.
        self.arena.len().div_ceil(2)
    }

    /// True when no payload is stored.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Bounds of the whole tree, `None` when empty.
    pub fn root_bounds(&self) -> Option<Aabb3> {
        self.root.map(|r| self.node(r).bounds)
    }

    /// Drop every payload and invalidate all outstanding handles.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
    }

    /// Payloads whose stored bounds intersect `region`, in traversal order.
    ///
    /// Touching counts as intersecting, so the result set is conservative.
    /// A degenerate (inverted/empty) region matches nothing. The order is not
    /// stable across mutations. The result is materialized up front; the
    /// returned iterator borrows the tree but does not traverse lazily.
    pub fn query_region(&self, region: Aabb3) -> impl Iterator<Item = (NodeId, &T)> {
        let mut out = Vec::new();
        let Some(root) = self.root else {
            return out.into_iter();
        };
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if !node.bounds.intersects(&region) {
                continue;
            }
            match &node.kind {
                NodeKind::Leaf(payload) => out.push((id, payload)),
                NodeKind::Internal { left, right } => {
                    stack.push(*left);
                    stack.push(*right);
                }
            }
        }
        out.into_iter()
    }

    /// Payloads whose stored bounds contain the point, in traversal order.
    pub fn query_point(&self, p: Vec3) -> impl Iterator<Item = (NodeId, &T)> {
        let mut out = Vec::new();
        let Some(root) = self.root else {
            return out.into_iter();
        };
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if !node.bounds.contains_point(p) {
                continue;
            }
            match &node.kind {
                NodeKind::Leaf(payload) => out.push((id, payload)),
                NodeKind::Internal { left, right } => {
                    stack.push(*left);
                    stack.push(*right);
                }
            }
        }
        out.into_iter()
    }

    /// Every stored payload, in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> {
        let mut out = Vec::new();
        let Some(root) = self.root else {
            return out.into_iter();
        };
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            match &self.node(id).kind {
                NodeKind::Leaf(payload) => out.push((id, payload)),
                NodeKind::Internal { left, right } => {
                    stack.push(*left);
                    stack.push(*right);
                }
            }
        }
        out.into_iter()
    }

    // --- internals ---

    pub(crate) fn arena(&self) -> &Arena<T> {
        &self.arena
    }

    pub(crate) fn arena_mut(&mut self) -> &mut Arena<T> {
        &mut self.arena
    }

    pub(crate) fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub(crate) fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    fn node(&self, id: NodeId) -> &Node<T> {
        self.arena.get(id).expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        self.arena.get_mut(id).expect("dangling NodeId")
    }

    fn children(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        match self.node(id).kind {
            NodeKind::Internal { left, right } => Some((left, right)),
            NodeKind::Leaf(_) => None,
        }
    }

    /// Splice a detached leaf into the tree next to the cheapest sibling.
    fn attach_leaf(&mut self, leaf: NodeId) {
        let Some(root) = self.root else {
            self.node_mut(leaf).parent = None;
            self.root = Some(leaf);
            return;
        };

        let bounds = self.node(leaf).bounds;

        // Greedy descent: the child whose union with the incoming box has the
        // strictly smaller surface area wins; equal costs go right.
        let mut cursor = root;
        while let Some((left, right)) = self.children(cursor) {
            let cost_left = self.node(left).bounds.union(&bounds).surface_area();
            let cost_right = self.node(right).bounds.union(&bounds).surface_area();
            cursor = if cost_left < cost_right { left } else { right };
        }
        let sibling = cursor;

        let old_parent = self.node(sibling).parent;
        let merged = self.node(sibling).bounds.union(&bounds);
        let parent = self.arena.reserve(Node::internal(sibling, leaf, merged));
        self.node_mut(parent).parent = old_parent;
        self.node_mut(sibling).parent = Some(parent);
        self.node_mut(leaf).parent = Some(parent);

        match old_parent {
            Some(grandparent) => {
                self.replace_child(grandparent, sibling, parent);
                // Ancestor boxes widen with the new leaf; refit the chain so
                // they stay tight, not merely valid upper bounds.
                self.fix_bounds(Some(grandparent));
            }
            None => self.root = Some(parent),
        }
    }

    /// Unlink a leaf, collapsing its parent onto the sibling.
    fn detach_leaf(&mut self, leaf: NodeId) {
        let Some(parent) = self.node(leaf).parent else {
            // Sole leaf: the tree becomes Empty.
            self.root = None;
            return;
        };

        let (left, right) = self.children(parent).expect("leaf parent must be internal");
        let sibling = if left == leaf { right } else { left };

        match self.node(parent).parent {
            Some(grandparent) => {
                self.replace_child(grandparent, parent, sibling);
                self.node_mut(sibling).parent = Some(grandparent);
                self.fix_bounds(Some(grandparent));
            }
            None => {
                self.root = Some(sibling);
                self.node_mut(sibling).parent = None;
            }
        }

        self.arena
            .release(parent)
            .expect("collapsed parent is live");
        self.node_mut(leaf).parent = None;
    }

    /// Join two detached subtrees under a fresh internal node.
    pub(crate) fn link_cluster(&mut self, left: NodeId, right: NodeId) -> NodeId {
        let merged = self.node(left).bounds.union(&self.node(right).bounds);
        let parent = self.arena.reserve(Node::internal(left, right, merged));
        self.node_mut(left).parent = Some(parent);
        self.node_mut(right).parent = Some(parent);
        parent
    }

    fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        if let NodeKind::Internal { left, right } = &mut self.node_mut(parent).kind {
            if *left == old {
                *left = new;
            } else if *right == old {
                *right = new;
            }
        }
    }

    /// Walk upward from `start` recomputing each internal node's bounds from
    /// its children.
    pub(crate) fn fix_bounds(&mut self, start: Option<NodeId>) {
        let mut cursor = start;
        while let Some(id) = cursor {
            if let Some((left, right)) = self.children(id) {
                let merged = self.node(left).bounds.union(&self.node(right).bounds);
                self.node_mut(id).bounds = merged;
            }
            cursor = self.node(id).parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    /// Boxes `(-i,-i,-i)..(i,i,i)`, the nested-cube family.
    fn cube(i: f32) -> Aabb3 {
        Aabb3::new(Vec3::splat(-i), Vec3::splat(i))
    }

    fn region(min: f32, max: f32) -> Aabb3 {
        Aabb3::new(Vec3::splat(min), Vec3::splat(max))
    }

    /// Deterministic xorshift, enough for box churn.
    struct Rng(u64);

    impl Rng {
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

        fn next_aabb(&mut self, span: f32, max_size: f32) -> Aabb3 {
            let min = Vec3::new(
                (self.next_f32() - 0.5) * span,
                (self.next_f32() - 0.5) * span,
                (self.next_f32() - 0.5) * span,
            );
            let size = Vec3::new(
                self.next_f32() * max_size,
                self.next_f32() * max_size,
                self.next_f32() * max_size,
            );
            Aabb3::new(min, min + size)
        }
    }

    #[test]
    fn query_misses_disjoint_region() {
        let mut tree: Dbvh<usize> = Dbvh::new();
        for i in 0..5 {
            tree.insert(i, cube(i as f32));
        }
        // The largest stored box reaches 4; a region starting at 5 sees nothing.
        let hits: Vec<_> = tree.query_region(region(5.0, 10.0)).collect();
        assert!(hits.is_empty(), "no stored box reaches the query region");
    }

    #[test]
    fn query_returns_all_overlapping() {
        let mut tree: Dbvh<usize> = Dbvh::new();
        for i in 0..5 {
            tree.insert(i, cube(i as f32));
        }
        let mut hits: Vec<usize> = tree.query_region(region(-10.0, 10.0)).map(|(_, p)| *p).collect();
        hits.sort_unstable();
        assert_eq!(hits, vec![0, 1, 2, 3, 4], "every stored box overlaps");
    }

    #[test]
    fn remove_on_empty_tree_is_safe() {
        let mut tree: Dbvh<u32> = Dbvh::new();
        let bogus = NodeId::new(0, 1);
        assert_eq!(
            tree.remove(bogus),
            Err(DbvhError::InvalidHandle),
            "remove on an empty tree reports the stale handle"
        );
        assert!(tree.is_empty(), "still empty");
    }

    #[test]
    fn insert_then_remove_returns_to_empty() {
        let mut tree: Dbvh<u32> = Dbvh::new();
        let id = tree.insert(9, cube(1.0));
        assert!(!tree.is_empty(), "one leaf");
        assert_eq!(tree.remove(id), Ok(9), "payload comes back");
        assert!(tree.is_empty(), "root must be cleared");
        assert_eq!(tree.len(), 0, "no live nodes remain");
        assert_eq!(tree.remove(id), Err(DbvhError::InvalidHandle), "handle is dead");
    }

    #[test]
    fn remove_restores_pre_insert_shape() {
        let mut tree: Dbvh<u32> = Dbvh::new();
        let a = tree.insert(1, cube(1.0));
        let b = tree.insert(2, Aabb3::new(Vec3::splat(5.0), Vec3::splat(6.0)));
        let root_after = tree.root();

        tree.remove(b).expect("live handle");
        assert_eq!(tree.root(), Some(a), "sole survivor is promoted to root");
        assert_ne!(tree.root(), root_after, "collapsed internal root is gone");
        assert_eq!(tree.len(), 1, "one leaf left");
        assert_eq!(tree.bounds(a), Some(cube(1.0)), "survivor keeps its bounds");
        assert!(tree.node(a).parent.is_none(), "root leaf has no parent");
    }

    #[test]
    fn update_moves_payload_under_slot_reuse() {
        // Several removes first so the free list is hot and the reinsert
        // recycles slots; a stale read of the old handle would be observable.
        let mut tree: Dbvh<u32> = Dbvh::new();
        let mut ids = Vec::new();
        for i in 0..8u32 {
            let base = i as f32 * 3.0;
            ids.push(tree.insert(i, Aabb3::new(Vec3::splat(base), Vec3::splat(base + 1.0))));
        }
        tree.remove(ids[1]).expect("live");
        tree.remove(ids[2]).expect("live");
        tree.remove(ids[6]).expect("live");

        let old_bounds = tree.bounds(ids[4]).expect("live");
        let new_bounds = Aabb3::new(Vec3::splat(100.0), Vec3::splat(101.0));
        let moved = tree.update(ids[4], new_bounds).expect("live handle");

        assert!(tree.get(ids[4]).is_none(), "old handle is dead after update");
        assert_eq!(tree.get(moved), Some(&4), "new handle names the payload");
        assert_eq!(tree.bounds(moved), Some(new_bounds), "bounds are the new ones");

        let at_new: Vec<u32> = tree.query_region(new_bounds).map(|(_, p)| *p).collect();
        assert_eq!(at_new, vec![4], "query at the new bounds finds it");
        let at_old: Vec<u32> = tree.query_region(old_bounds).map(|(_, p)| *p).collect();
        assert!(!at_old.contains(&4), "query at the old bounds must not");

        assert!(
            tree.validate().is_empty(),
            "tree invariants hold after update under reuse: {:?}",
            tree.validate()
        );
    }

    #[test]
    fn update_on_stale_handle_is_rejected() {
        let mut tree: Dbvh<u32> = Dbvh::new();
        let id = tree.insert(1, cube(1.0));
        tree.remove(id).expect("live");
        assert_eq!(
            tree.update(id, cube(2.0)),
            Err(DbvhError::InvalidHandle),
            "update must reject the released handle"
        );
    }

    #[test]
    fn clear_invalidates_handles_for_good() {
        let mut tree: Dbvh<u32> = Dbvh::new();
        let old = tree.insert(1, cube(1.0));
        tree.clear();
        assert!(tree.is_empty(), "clear empties the tree");

        // Refill; the recycled slots must not resurrect the old handle.
        let new = tree.insert(2, cube(2.0));
        assert!(tree.get(old).is_none(), "pre-clear handle stays dead");
        assert_eq!(tree.remove(old), Err(DbvhError::InvalidHandle), "and is rejected");
        assert_eq!(tree.get(new), Some(&2), "post-clear handle is unaffected");
        assert!(tree.validate().is_empty(), "refilled tree is healthy");
    }

    #[test]
    fn point_query_hits_containing_leaves() {
        let mut tree: Dbvh<usize> = Dbvh::new();
        for i in 1..=4 {
            tree.insert(i, cube(i as f32));
        }
        // (2.5, 2.5, 2.5) lies inside cubes 3 and 4 only.
        let mut hits: Vec<usize> = tree.query_point(Vec3::splat(2.5)).map(|(_, p)| *p).collect();
        hits.sort_unstable();
        assert_eq!(hits, vec![3, 4], "only the enclosing cubes match");

        // A boundary point counts: (4, 4, 4) is the corner of cube 4.
        let corner: Vec<usize> = tree.query_point(Vec3::splat(4.0)).map(|(_, p)| *p).collect();
        assert_eq!(corner, vec![4], "closed comparison includes the corner");
    }

    #[test]
    fn degenerate_region_matches_nothing() {
        let mut tree: Dbvh<u32> = Dbvh::new();
        tree.insert(1, cube(5.0));
        let hits = tree.query_region(Aabb3::EMPTY).count();
        assert_eq!(hits, 0, "an empty region is a miss, not an error");
    }

    #[test]
    fn iter_enumerates_everything() {
        let mut tree: Dbvh<usize> = Dbvh::new();
        let mut rng = Rng(0x5eed);
        for i in 0..50 {
            tree.insert(i, rng.next_aabb(100.0, 5.0));
        }
        let mut all: Vec<usize> = tree.iter().map(|(_, p)| *p).collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>(), "full enumeration");
        assert_eq!(tree.len(), 50, "leaf count matches");
    }

    #[test]
    fn query_matches_linear_oracle() {
        let mut tree: Dbvh<usize> = Dbvh::new();
        let mut rng = Rng(0xfeed_beef);
        let mut stored = Vec::new();
        for i in 0..200 {
            let b = rng.next_aabb(50.0, 8.0);
            stored.push(b);
            tree.insert(i, b);
        }
        for _ in 0..25 {
            let q = rng.next_aabb(60.0, 20.0);
            let mut got: Vec<usize> = tree.query_region(q).map(|(_, p)| *p).collect();
            got.sort_unstable();
            let want: Vec<usize> = stored
                .iter()
                .enumerate()
                .filter(|(_, b)| b.intersects(&q))
                .map(|(i, _)| i)
                .collect();
            assert_eq!(got, want, "no false positives, no false negatives");
        }
    }

    #[test]
    fn stress_sorted_insertion_orders() {
        let n = 1000;
        let mut up: Dbvh<usize> = Dbvh::new();
        for i in 0..n {
            up.insert(i, cube(i as f32 + 1.0));
        }
        assert_eq!(up.len(), n, "all leaves stored (increasing)");
        assert!(up.validate().is_empty(), "invariants hold for increasing order");

        let mut down: Dbvh<usize> = Dbvh::new();
        for i in (0..n).rev() {
            down.insert(i, cube(i as f32 + 1.0));
        }
        assert_eq!(down.len(), n, "all leaves stored (decreasing)");
        assert!(down.validate().is_empty(), "invariants hold for decreasing order");

        // Adversarial order may cost depth, never correctness.
        let all_up = up.query_region(cube(n as f32)).count();
        let all_down = down.query_region(cube(n as f32)).count();
        assert_eq!(all_up, n, "increasing-order tree answers fully");
        assert_eq!(all_down, n, "decreasing-order tree answers fully");
    }

    #[test]
    fn mixed_churn_keeps_invariants() {
        let mut tree: Dbvh<u64> = Dbvh::new();
        let mut rng = Rng(0x00c0_ffee);
        let mut live: Vec<NodeId> = Vec::new();
        for step in 0..500u64 {
            match (rng.next_u64() % 4, live.len()) {
                (0 | 1, _) | (_, 0) => {
                    live.push(tree.insert(step, rng.next_aabb(40.0, 6.0)));
                }
                (2, n) => {
                    let pick = (rng.next_u64() as usize) % n;
                    let id = live.swap_remove(pick);
                    tree.remove(id).expect("tracked handles are live");
                }
                (_, n) => {
                    let pick = (rng.next_u64() as usize) % n;
                    let id = live[pick];
                    live[pick] = tree.update(id, rng.next_aabb(40.0, 6.0)).expect("live");
                }
            }
        }
        assert_eq!(tree.len(), live.len(), "leaf count tracks the live set");
        assert!(
            tree.validate().is_empty(),
            "invariants hold after churn: {:?}",
            tree.validate()
        );
        for id in &live {
            assert!(tree.contains_handle(*id), "every tracked handle stays live");
        }
    }
}
