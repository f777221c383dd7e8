// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node storage: a growable slot table with a free list and generational handles.

use alloc::vec::Vec;

use thicket_aabb::Aabb3;

use crate::error::ArenaError;

/// Identifier for a node slot.
///
/// This is a small, copyable handle that stays stable across arena growth but
/// becomes invalid when the underlying slot is released.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On reserve, a fresh slot starts at generation `1`.
/// - On release, the slot is freed; any existing `NodeId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `NodeId`.
///
/// ### Liveness
///
/// Use [`Arena::is_live`] to check whether a `NodeId` still refers to a live node.
/// Stale `NodeId`s never alias a different live node because the generation must match.
/// This is an O(1) check; no free-list scan is involved.
///
/// ### Notes
///
/// - The generation increments on slot reuse and never decreases.
/// - `u32` is ample for practical lifetimes; the counter saturates at
///   `u32::MAX` rather than wrapping back into earlier generations.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// The two node shapes: a payload-carrying leaf, or an internal node with
/// exactly two children and no payload.
#[derive(Clone, Debug)]
pub enum NodeKind<T> {
    /// A leaf holding one payload.
    Leaf(T),
    /// An internal node whose bounds is the union of its children's bounds.
    Internal {
        /// Left child.
        left: NodeId,
        /// Right child.
        right: NodeId,
    },
}

/// One tree node: bounds, an optional parent link, and the leaf/internal shape.
#[derive(Clone, Debug)]
pub struct Node<T> {
    pub(crate) bounds: Aabb3,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind<T>,
}

impl<T> Node<T> {
    /// Create a detached leaf node.
    pub fn leaf(payload: T, bounds: Aabb3) -> Self {
        Self {
            bounds,
            parent: None,
            kind: NodeKind::Leaf(payload),
        }
    }

    pub(crate) fn internal(left: NodeId, right: NodeId, bounds: Aabb3) -> Self {
        Self {
            bounds,
            parent: None,
            kind: NodeKind::Internal { left, right },
        }
    }

    /// The node's bounds.
    pub fn bounds(&self) -> Aabb3 {
        self.bounds
    }

    /// The parent handle, if any.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    /// Leaf/internal shape.
    pub fn kind(&self) -> &NodeKind<T> {
        &self.kind
    }

    /// True for payload-carrying leaves.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }
}

/// Growable node table addressed by [`NodeId`], with recycled slots.
///
/// The only place handles are produced ([`Arena::reserve`]) or invalidated
/// ([`Arena::release`]). Growth appends, never reshuffles, so handles stay
/// stable for the lifetime of their slot.
pub struct Arena<T> {
    nodes: Vec<Option<Node<T>>>,
    generations: Vec<u32>, // last generation per slot (persists across frees)
    free_list: Vec<usize>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> core::fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Arena")
            .field("slots_total", &self.nodes.len())
            .field("slots_live", &self.len())
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl<T> Arena<T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Store a node, recycling a freed slot when one exists.
    pub fn reserve(&mut self, node: Node<T>) -> NodeId {
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(node);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            NodeId::new(idx as u32, generation)
        } else {
            self.nodes.push(Some(node));
            self.generations.push(1);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            NodeId::new((self.nodes.len() - 1) as u32, 1)
        }
    }

    /// Free a slot, returning its node.
    ///
    /// Releasing a stale handle (including a second release of the same
    /// handle) is an error and leaves the arena untouched.
    pub fn release(&mut self, id: NodeId) -> Result<Node<T>, ArenaError> {
        if !self.is_live(id) {
            return Err(ArenaError::NotLive);
        }
        let node = self.nodes[id.idx()].take().ok_or(ArenaError::NotLive)?;
        self.free_list.push(id.idx());
        Ok(node)
    }

    /// Whether `id` names a live slot. O(1).
    pub fn is_live(&self, id: NodeId) -> bool {
        self.generations.get(id.idx()).copied() == Some(id.1)
            && self.nodes[id.idx()].is_some()
    }

    /// Generation-checked access to a node.
    pub fn get(&self, id: NodeId) -> Option<&Node<T>> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (self.generations[id.idx()] == id.1).then_some(n)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        let generation = *self.generations.get(id.idx())?;
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        (generation == id.1).then_some(n)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        // Every freed slot is on the free list exactly once.
        self.nodes.len() - self.free_list.len()
    }

    /// True when no node is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all nodes and invalidate all handles.
    ///
    /// Slots and their generation history are retained, so a handle issued
    /// before the clear can never alias a node reserved after it.
    pub fn clear(&mut self) {
        for (idx, slot) in self.nodes.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.free_list.push(idx);
            }
        }
    }

    /// Iterate live handles in slot order.
    pub(crate) fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().enumerate().filter_map(|(i, slot)| {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            slot.as_ref().map(|_| NodeId::new(i as u32, self.generations[i]))
        })
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.nodes.len()
    }
}
