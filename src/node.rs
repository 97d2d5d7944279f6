use core::{fmt, mem, ops::Not};

use log::trace;

/// An index into the node arena.
pub(crate) type Link = Option<usize>;

/// A stable handle to a node of an [`AvlTree`](crate::AvlTree).
///
/// A `NodeId` keeps referring to the same key-value pair across rotations and across the removal
/// of other keys, including removals that relink the node into a different position. Once the
/// node's own key is removed, the id is stale and every lookup through it returns `None`, even if
/// the underlying arena slot has since been reused or the tree has been cleared.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    /// Returns the arena slot this id refers to.
    pub const fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// Which children a node has.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Arity {
    Leaf,
    LeftOnly,
    RightOnly,
    Both,
}

#[derive(Clone, Debug)]
pub(crate) struct Links {
    parent: Link,
    children: [Link; 2],
    height: i8,
}

impl Links {
    const fn new() -> Self {
        Links {
            parent: None,
            children: [None; 2],
            height: 0,
        }
    }

    #[inline]
    pub(crate) fn height(&self) -> i8 {
        self.height
    }

    #[inline]
    pub(crate) fn parent(&self) -> Link {
        self.parent
    }

    #[inline]
    pub(crate) fn child(&self, dir: Dir) -> Link {
        self.children[dir as usize]
    }

    #[inline]
    pub(crate) fn left(&self) -> Link {
        self.child(Dir::Left)
    }

    #[inline]
    pub(crate) fn right(&self) -> Link {
        self.child(Dir::Right)
    }

    pub(crate) fn arity(&self) -> Arity {
        match (self.left(), self.right()) {
            (None, None) => Arity::Leaf,
            (Some(_), None) => Arity::LeftOnly,
            (None, Some(_)) => Arity::RightOnly,
            (Some(_), Some(_)) => Arity::Both,
        }
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, parent: Link) -> Link {
        mem::replace(&mut self.parent, parent)
    }

    #[inline]
    pub(crate) fn set_child(&mut self, dir: Dir, child: Link) -> Link {
        mem::replace(&mut self.children[dir as usize], child)
    }

    #[inline]
    pub(crate) fn set_left(&mut self, left: Link) -> Link {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    pub(crate) fn set_right(&mut self, right: Link) -> Link {
        self.set_child(Dir::Right, right)
    }

    #[inline]
    pub(crate) fn set_height(&mut self, height: i8) -> i8 {
        mem::replace(&mut self.height, height)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) links: Links,
    pub(crate) key: K,
    pub(crate) value: V,
}

#[derive(Clone, Debug)]
struct Slot<K, V> {
    generation: u32,
    node: Option<Node<K, V>>,
}

/// Slot storage for tree nodes.
///
/// Freed slots are recycled through a free list. Every free bumps the slot's generation so that
/// outstanding [`NodeId`]s for the freed node stop resolving. A slot whose generation would wrap
/// is retired instead of recycled.
#[derive(Clone, Debug)]
pub(crate) struct Arena<K, V> {
    slots: Vec<Slot<K, V>>,
    free: Vec<usize>,
    live: usize,
}

impl<K, V> Arena<K, V> {
    pub(crate) const fn new() -> Self {
        Arena {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Number of occupied slots.
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    /// Stores a new detached leaf and returns its slot.
    pub(crate) fn alloc(&mut self, key: K, value: V) -> usize {
        let node = Node {
            links: Links::new(),
            key,
            value,
        };

        self.live += 1;

        match self.free.pop() {
            Some(idx) => {
                let slot = &mut self.slots[idx];
                debug_assert!(slot.node.is_none(), "free list entry is occupied");
                slot.node = Some(node);
                idx
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                self.slots.len() - 1
            }
        }
    }

    /// Vacates `idx` and returns the node that lived there.
    ///
    /// The node's links are not inspected; the caller must already have unlinked it.
    pub(crate) fn free(&mut self, idx: usize) -> Node<K, V> {
        let slot = &mut self.slots[idx];
        let node = slot.node.take().expect("freeing a vacant arena slot");
        self.live -= 1;

        match slot.generation.checked_add(1) {
            Some(generation) => {
                slot.generation = generation;
                self.free.push(idx);
            }
            // Reusing the slot would bring back ids from its first generation.
            None => trace!("retiring arena slot {idx}"),
        }

        node
    }

    /// Vacates every occupied slot, keeping generations so that no earlier id resolves again.
    pub(crate) fn clear(&mut self) {
        for idx in 0..self.slots.len() {
            if self.slots[idx].node.is_some() {
                self.free(idx);
            }
        }

        debug_assert_eq!(self.live, 0);
    }

    pub(crate) fn id(&self, idx: usize) -> NodeId {
        NodeId {
            index: idx,
            generation: self.slots[idx].generation,
        }
    }

    /// Maps `id` back to its slot, or `None` if the node has been removed.
    pub(crate) fn resolve(&self, id: NodeId) -> Link {
        let slot = self.slots.get(id.index)?;

        (slot.generation == id.generation && slot.node.is_some()).then_some(id.index)
    }

    #[inline]
    pub(crate) fn node(&self, idx: usize) -> &Node<K, V> {
        self.slots[idx]
            .node
            .as_ref()
            .expect("link points at a vacant arena slot")
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, idx: usize) -> &mut Node<K, V> {
        self.slots[idx]
            .node
            .as_mut()
            .expect("link points at a vacant arena slot")
    }

    #[inline]
    pub(crate) fn links(&self, idx: usize) -> &Links {
        &self.node(idx).links
    }

    #[inline]
    pub(crate) fn links_mut(&mut self, idx: usize) -> &mut Links {
        &mut self.node_mut(idx).links
    }

    pub(crate) fn maybe_set_parent(&mut self, opt_node: Link, parent: Link) {
        if let Some(node) = opt_node {
            self.links_mut(node).set_parent(parent);
        }
    }

    /// Returns the cached height of the pointed-to node, or -1 if there is none.
    #[inline]
    pub(crate) fn height(&self, node: Link) -> i8 {
        node.map(|n| self.links(n).height()).unwrap_or(-1)
    }

    /// `height(left) - height(right)`, using -1 for a missing child.
    pub(crate) fn balance_factor(&self, idx: usize) -> i8 {
        let links = self.links(idx);
        self.height(links.left()) - self.height(links.right())
    }

    /// Recomputes the height of `idx` from its children's cached heights.
    ///
    /// The children must already be up to date.
    pub(crate) fn recache_height(&mut self, idx: usize) {
        let links = self.links(idx);
        let height = self
            .height(links.left())
            .max(self.height(links.right()))
            .checked_add(1)
            .expect("tree height overflow");

        self.links_mut(idx).set_height(height);
    }
}

/// A read-only view of one node of an [`AvlTree`](crate::AvlTree), including its structural
/// metadata.
pub struct NodeRef<'tree, K, V> {
    arena: &'tree Arena<K, V>,
    idx: usize,
}

impl<K, V> Clone for NodeRef<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for NodeRef<'_, K, V> {}

impl<'tree, K, V> NodeRef<'tree, K, V> {
    pub(crate) fn new(arena: &'tree Arena<K, V>, idx: usize) -> Self {
        NodeRef { arena, idx }
    }

    pub fn id(&self) -> NodeId {
        self.arena.id(self.idx)
    }

    pub fn key(&self) -> &'tree K {
        &self.arena.node(self.idx).key
    }

    pub fn value(&self) -> &'tree V {
        &self.arena.node(self.idx).value
    }

    /// Length of the longest downward path from this node to a leaf. A leaf has height 0.
    pub fn height(&self) -> usize {
        self.arena.links(self.idx).height() as usize
    }

    /// Height of the left subtree minus height of the right subtree.
    pub fn balance_factor(&self) -> i8 {
        self.arena.balance_factor(self.idx)
    }

    pub fn arity(&self) -> Arity {
        self.arena.links(self.idx).arity()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.arena.links(self.idx).parent().map(|p| self.arena.id(p))
    }

    pub fn left(&self) -> Option<NodeId> {
        self.arena.links(self.idx).left().map(|l| self.arena.id(l))
    }

    pub fn right(&self) -> Option<NodeId> {
        self.arena.links(self.idx).right().map(|r| self.arena.id(r))
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for NodeRef<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id())
            .field("key", self.key())
            .field("value", self.value())
            .field("height", &self.height())
            .field("parent", &self.parent())
            .field("left", &self.left())
            .field("right", &self.right())
            .finish()
    }
}
