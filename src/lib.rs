//! An ordered map backed by an AVL tree whose nodes live in an arena.
//!
//! Every node caches its height, where a leaf has height 0 and a missing child counts as -1.
//! The tree maintains, after every operation returns:
//!
//! 1. BST order: every key in a node's left subtree is less than the node's key, and every key
//!    in its right subtree is greater.
//! 2. Every cached height equals `1 + max(height(left), height(right))`.
//! 3. Every balance factor `height(left) - height(right)` is -1, 0 or 1.
//! 4. Every child's parent link points at the node holding it, and the root has no parent.
//!
//! Removing a node with two children does not move keys or values between nodes. Instead the
//! node and its in-order successor exchange structural positions, after which the node has at
//! most one child and is unlinked directly. As a result a [`NodeId`] keeps naming the same
//! key-value pair until that key itself is removed.
//!
//! ```
//! use avl_arena::AvlTree;
//!
//! let mut tree = AvlTree::new();
//! for key in [10, 20, 30] {
//!     tree.insert(key, key * 100);
//! }
//!
//! // Inserting 30 rotated 20 up to the root.
//! let root = tree.node(tree.root().unwrap()).unwrap();
//! assert_eq!(*root.key(), 20);
//! assert_eq!(root.height(), 1);
//!
//! // Duplicate inserts keep the existing value.
//! tree.insert(20, 0);
//! assert_eq!(tree.get(&20), Some(&2000));
//!
//! assert!(tree.remove(&20));
//! assert!(!tree.remove(&20));
//! assert_eq!(tree.iter().collect::<Vec<_>>(), [(&10, &1000), (&30, &3000)]);
//! ```

use core::{borrow::Borrow, cmp::Ordering, fmt, ops::Index};

use log::{debug, trace};

mod balance;
mod cursor;
mod debug;
mod entry;
mod iter;
mod node;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use cursor::{Cursor, CursorMut};
pub use debug::InvariantViolation;
pub use entry::{Entry, OccupiedEntry, OccupiedError, VacantEntry};
pub use iter::{Iter, Keys, Values};
pub use node::{Arity, NodeId, NodeRef};

use entry::InsertAs;
use node::{Arena, Dir, Link, Node};

/// An ordered map based on an AVL tree.
pub struct AvlTree<K, V> {
    arena: Arena<K, V>,
    root: Link,
    len: usize,
}

/// Where a key was found, or where it would be attached.
enum Search {
    Found(usize),
    Vacant(InsertAs),
}

impl<K, V> AvlTree<K, V> {
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<K, V> {
        AvlTree {
            arena: Arena::new(),
            root: None,
            len: 0,
        }
    }

    /// Returns `true` if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        let empty = self.len() == 0;
        debug_assert_eq!(empty, self.root.is_none());
        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the id of the root node.
    pub fn root(&self) -> Option<NodeId> {
        self.root.map(|r| self.arena.id(r))
    }

    /// Returns the height of the tree, or `None` if it is empty. A single node has height 0.
    pub fn height(&self) -> Option<usize> {
        self.root.map(|r| self.arena.links(r).height() as usize)
    }

    /// Returns a view of the node named by `id`, or `None` if that node has been removed.
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_, K, V>> {
        self.arena
            .resolve(id)
            .map(|idx| NodeRef::new(&self.arena, idx))
    }

    /// Returns the first key-value pair in the tree.
    ///
    /// The returned key is the minimum key in the tree.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.first_raw().map(|idx| self.entry_at(idx))
    }

    /// Returns the last key-value pair in the tree.
    ///
    /// The returned key is the maximum key in the tree.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.last_raw().map(|idx| self.entry_at(idx))
    }

    /// Removes and returns the first key-value pair in the tree.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let first = self.first_raw()?;
        Some(self.remove_at(first))
    }

    /// Removes and returns the last key-value pair in the tree.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let last = self.last_raw()?;
        Some(self.remove_at(last))
    }

    /// Removes the node named by `id` and returns its key-value pair.
    ///
    /// Returns `None` if the node has already been removed.
    pub fn remove_node(&mut self, id: NodeId) -> Option<(K, V)> {
        let idx = self.arena.resolve(id)?;
        Some(self.remove_at(idx))
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
        self.len = 0;
    }

    /// Gets an iterator over the entries of the tree, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self)
    }

    /// Gets an iterator over the keys of the tree, in sorted order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self)
    }

    /// Gets an iterator over the values of the tree, in order by key.
    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self)
    }

    /// Returns a cursor pointing at the first element, or at the "ghost" non-element if the tree
    /// is empty.
    pub fn cursor_first(&self) -> Cursor<'_, K, V> {
        Cursor::new(self, self.first_raw())
    }

    /// Returns a cursor pointing at the last element, or at the "ghost" non-element if the tree
    /// is empty.
    pub fn cursor_last(&self) -> Cursor<'_, K, V> {
        Cursor::new(self, self.last_raw())
    }

    /// Returns an editing cursor pointing at the first element.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, K, V> {
        let first = self.first_raw();
        CursorMut::new(self, first)
    }

    /// Returns an editing cursor pointing at the last element.
    pub fn cursor_last_mut(&mut self) -> CursorMut<'_, K, V> {
        let last = self.last_raw();
        CursorMut::new(self, last)
    }

    fn entry_at(&self, idx: usize) -> (&K, &V) {
        let node = self.arena.node(idx);
        (&node.key, &node.value)
    }

    // Returns the minimum node in the subtree rooted at `root`.
    fn min_in_subtree(&self, root: usize) -> usize {
        let mut cur = root;

        while let Some(left) = self.arena.links(cur).left() {
            cur = left;
        }

        cur
    }

    // Returns the maximum node in the subtree rooted at `root`.
    fn max_in_subtree(&self, root: usize) -> usize {
        let mut cur = root;

        while let Some(right) = self.arena.links(cur).right() {
            cur = right;
        }

        cur
    }

    pub(crate) fn first_raw(&self) -> Link {
        self.root.map(|r| self.min_in_subtree(r))
    }

    pub(crate) fn last_raw(&self) -> Link {
        self.root.map(|r| self.max_in_subtree(r))
    }

    fn which_child(&self, parent: usize, child: usize) -> Dir {
        if self.arena.links(parent).left() == Some(child) {
            Dir::Left
        } else {
            Dir::Right
        }
    }

    /// Returns the in-order successor of `node`.
    pub(crate) fn successor_raw(&self, node: usize) -> Link {
        self.neighbor_raw(node, Dir::Right)
    }

    /// Returns the in-order predecessor of `node`.
    pub(crate) fn predecessor_raw(&self, node: usize) -> Link {
        self.neighbor_raw(node, Dir::Left)
    }

    fn neighbor_raw(&self, node: usize, dir: Dir) -> Link {
        if let Some(child) = self.arena.links(node).child(dir) {
            return Some(match dir {
                Dir::Left => self.max_in_subtree(child),
                Dir::Right => self.min_in_subtree(child),
            });
        }

        // Ascend until arriving from the `!dir` side.
        let mut cur = node;
        loop {
            let parent = self.arena.links(cur).parent()?;
            if self.which_child(parent, cur) != dir {
                return Some(parent);
            }
            cur = parent;
        }
    }

    /// Points the slot of `parent` that holds `old_child` at `new_child`, or makes `new_child`
    /// the root if `parent` is `None`. `new_child`'s parent link is set to `parent`.
    ///
    /// `old_child` must be a child of `parent`, and `new_child` must not be `parent`'s other
    /// child.
    fn replace_child_or_set_root(&mut self, parent: Link, old_child: usize, new_child: Link) {
        match parent {
            Some(parent) => {
                let dir = self.which_child(parent, old_child);

                if cfg!(debug_assertions) {
                    assert_eq!(
                        self.arena.links(parent).child(dir),
                        Some(old_child),
                        "`old_child` must be a child of `parent`"
                    );
                    if let Some(new_child) = new_child {
                        assert_ne!(
                            self.arena.links(parent).child(!dir),
                            Some(new_child),
                            "`new_child` must not be a child of `parent`"
                        );
                    }
                }

                self.arena.links_mut(parent).set_child(dir, new_child);
            }
            None => self.root = new_child,
        }

        self.arena.maybe_set_parent(new_child, parent);
    }

    /// Removes the node at `node` from the tree and returns its key-value pair.
    fn remove_at(&mut self, node: usize) -> (K, V) {
        let links = self.arena.links(node);
        let parent = links.parent();

        match (links.left(), links.right()) {
            (Some(_), Some(_)) => {
                debug!("removing {} (two children)", self.arena.id(node));

                self.swap_with_successor(node);

                // `node` now holds its successor's old position, which never has a left child.
                debug_assert_eq!(self.arena.links(node).left(), None);
                return self.remove_at(node);
            }

            (Some(child), None) | (None, Some(child)) => {
                debug!("removing {} (one child)", self.arena.id(node));
                self.replace_child_or_set_root(parent, node, Some(child));
            }

            (None, None) => {
                debug!("removing {} (leaf)", self.arena.id(node));
                self.replace_child_or_set_root(parent, node, None);
            }
        }

        self.rebalance_from(parent);
        self.len -= 1;

        let Node { key, value, .. } = self.arena.free(node);
        (key, value)
    }

    /// Exchanges the structural positions of `node` and its in-order successor: their parent
    /// and child links and their cached heights. Keys and values stay where they are. Returns
    /// the successor.
    ///
    /// `node` must have two children. Afterwards the successor sits where `node` was, and `node`
    /// sits where the successor was, with no left child.
    pub(crate) fn swap_with_successor(&mut self, node: usize) -> usize {
        let links = self.arena.links(node).clone();
        let left = links.left().expect("swap requires a left child");
        let right = links.right().expect("swap requires a right child");

        let successor = self.min_in_subtree(right);
        let successor_links = self.arena.links(successor).clone();
        let successor_right = successor_links.right();

        // The successor takes over `node`'s parent slot (or the root), left subtree and height.
        self.replace_child_or_set_root(links.parent(), node, Some(successor));
        self.arena.links_mut(successor).set_left(Some(left));
        self.arena.links_mut(left).set_parent(Some(successor));
        self.arena.links_mut(successor).set_height(links.height());

        if successor == right {
            trace!(
                "swap {} with its right child {}",
                self.arena.id(node),
                self.arena.id(successor)
            );

            // `node` drops down to become the successor's right child.
            self.arena.links_mut(successor).set_right(Some(node));
            self.arena.links_mut(node).set_parent(Some(successor));
        } else {
            trace!(
                "swap {} with its successor {}",
                self.arena.id(node),
                self.arena.id(successor)
            );

            let successor_parent = successor_links
                .parent()
                .expect("a successor below the right child has a parent");

            // `node` replaces the successor as the left child of the successor's parent.
            self.arena.links_mut(successor_parent).set_left(Some(node));
            self.arena.links_mut(node).set_parent(Some(successor_parent));

            self.arena.links_mut(successor).set_right(Some(right));
            self.arena.links_mut(right).set_parent(Some(successor));
        }

        // `node` takes over the successor's right subtree (its left was empty) and height.
        self.arena.links_mut(node).set_left(None);
        self.arena.links_mut(node).set_right(successor_right);
        self.arena.maybe_set_parent(successor_right, Some(node));
        self.arena.links_mut(node).set_height(successor_links.height());

        successor
    }
}

impl<K: Ord, V> AvlTree<K, V> {
    fn search<Q>(&self, key: &Q) -> Search
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let Some(mut cur) = self.root else {
            return Search::Vacant(InsertAs::Root);
        };

        loop {
            let dir = match key.cmp(self.arena.node(cur).key.borrow()) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return Search::Found(cur),
                Ordering::Greater => Dir::Right,
            };

            match self.arena.links(cur).child(dir) {
                Some(child) => cur = child,
                None => return Search::Vacant(InsertAs::Child { parent: cur, dir }),
            }
        }
    }

    pub(crate) fn find_raw<Q>(&self, key: &Q) -> Link
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.search(key) {
            Search::Found(idx) => Some(idx),
            Search::Vacant(_) => None,
        }
    }

    /// Returns the id of the node holding `key`.
    pub fn find<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_raw(key).map(|idx| self.arena.id(idx))
    }

    /// Returns `true` if the tree contains a value associated with `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_raw(key).is_some()
    }

    /// Returns a reference to the value associated with `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_raw(key).map(|idx| &self.arena.node(idx).value)
    }

    /// Returns the stored key and the value associated with `key`.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_raw(key).map(|idx| self.entry_at(idx))
    }

    /// Returns a mutable reference to the value associated with `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let idx = self.find_raw(key)?;
        Some(&mut self.arena.node_mut(idx).value)
    }

    /// Returns a cursor pointing at `key`, or at the "ghost" non-element if `key` is absent.
    pub fn cursor_at<Q>(&self, key: &Q) -> Cursor<'_, K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Cursor::new(self, self.find_raw(key))
    }

    /// Inserts a key-value pair and returns the id of its node.
    ///
    /// If the tree already contains `key`, nothing changes: `value` is dropped and the id of the
    /// existing node is returned.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, key: K, value: V) -> NodeId {
        match self.search(&key) {
            Search::Found(idx) => self.arena.id(idx),
            Search::Vacant(insert_as) => {
                let idx = self.insert_at(insert_as, key, value);
                self.arena.id(idx)
            }
        }
    }

    /// Inserts a key-value pair, failing if the key is already present.
    ///
    /// On failure the tree is unchanged, and the error holds the occupied entry along with the
    /// rejected value.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<NodeId, OccupiedError<'_, K, V>> {
        match self.entry(key) {
            Entry::Occupied(entry) => Err(OccupiedError { entry, value }),
            Entry::Vacant(entry) => Ok(entry.insert_node(value)),
        }
    }

    /// Gets the entry for `key` for in-place manipulation.
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V> {
        match self.search(&key) {
            Search::Found(idx) => Entry::Occupied(OccupiedEntry::new(self, idx)),
            Search::Vacant(insert_as) => Entry::Vacant(VacantEntry::new(self, key, insert_as)),
        }
    }

    /// Removes `key` from the tree. Returns `true` if it was present.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).is_some()
    }

    /// Removes `key` from the tree, returning its value if it was present.
    pub fn take<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes `key` from the tree, returning the stored key and value if it was present.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let idx = self.find_raw(key)?;
        Some(self.remove_at(idx))
    }
}

impl<K, V> AvlTree<K, V> {
    /// Attaches a new node for `key` at the position found by [`AvlTree::search`].
    pub(crate) fn insert_at(&mut self, insert_as: InsertAs, key: K, value: V) -> usize {
        let idx = self.arena.alloc(key, value);

        match insert_as {
            InsertAs::Root => {
                debug_assert!(self.root.is_none());
                self.root = Some(idx);
            }
            InsertAs::Child { parent, dir } => {
                debug_assert_eq!(self.arena.links(parent).child(dir), None);
                self.arena.links_mut(parent).set_child(dir, Some(idx));
                self.arena.links_mut(idx).set_parent(Some(parent));
                self.rebalance_from(Some(parent));
            }
        }

        self.len += 1;
        idx
    }
}

impl<K, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> Clone for AvlTree<K, V> {
    /// Copies the tree node for node, so every [`NodeId`] of `self` names the same entry in the
    /// copy.
    fn clone(&self) -> Self {
        AvlTree {
            arena: self.arena.clone(),
            root: self.root,
            len: self.len,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for AvlTree<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for AvlTree<K, V> {}

impl<K, Q, V> Index<&Q> for AvlTree<K, V>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
{
    type Output = V;

    /// Returns a reference to the value associated with `key`.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the tree.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<'tree, K, V> IntoIterator for &'tree AvlTree<K, V> {
    type Item = (&'tree K, &'tree V);
    type IntoIter = Iter<'tree, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = AvlTree::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}
