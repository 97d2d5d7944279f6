use core::{fmt, mem};

use crate::{node::Dir, AvlTree, NodeId, NodeRef};

/// A view into a single entry in an [`AvlTree`], which may be either vacant or occupied.
///
/// This is constructed by [`AvlTree::entry`].
pub enum Entry<'tree, K, V> {
    Vacant(VacantEntry<'tree, K, V>),
    Occupied(OccupiedEntry<'tree, K, V>),
}

impl<'tree, K, V> Entry<'tree, K, V> {
    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Vacant(entry) => entry.key(),
            Entry::Occupied(entry) => entry.key(),
        }
    }

    /// Ensures a value is in the entry by inserting `default` if empty, and returns a mutable
    /// reference to the value in the entry.
    pub fn or_insert(self, default: V) -> &'tree mut V {
        match self {
            Entry::Vacant(entry) => entry.insert(default),
            Entry::Occupied(entry) => entry.into_mut(),
        }
    }

    /// Ensures a value is in the entry by inserting the result of `default` if empty, and returns
    /// a mutable reference to the value in the entry.
    pub fn or_insert_with<F: FnOnce() -> V>(self, default: F) -> &'tree mut V {
        match self {
            Entry::Vacant(entry) => entry.insert(default()),
            Entry::Occupied(entry) => entry.into_mut(),
        }
    }

    /// Provides in-place mutable access to an occupied entry before any potential inserts.
    pub fn and_modify<F: FnOnce(&mut V)>(mut self, f: F) -> Self {
        if let Entry::Occupied(entry) = &mut self {
            f(entry.get_mut());
        }

        self
    }
}

impl<'tree, K, V: Default> Entry<'tree, K, V> {
    /// Ensures a value is in the entry by inserting the default value if empty, and returns a
    /// mutable reference to the value in the entry.
    pub fn or_default(self) -> &'tree mut V {
        self.or_insert_with(V::default)
    }
}

/// Where a vacant key attaches to the tree.
#[derive(Copy, Clone, Debug)]
pub(crate) enum InsertAs {
    Root,
    Child { parent: usize, dir: Dir },
}

/// A view into a vacant entry in an [`AvlTree`]. It is part of the [`Entry`] enum.
pub struct VacantEntry<'tree, K, V> {
    tree: &'tree mut AvlTree<K, V>,
    key: K,
    insert_as: InsertAs,
}

impl<'tree, K, V> VacantEntry<'tree, K, V> {
    pub(crate) fn new(tree: &'tree mut AvlTree<K, V>, key: K, insert_as: InsertAs) -> Self {
        VacantEntry {
            tree,
            key,
            insert_as,
        }
    }

    /// Returns a reference to the key that would be used when inserting through this entry.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Takes ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts `value` under this entry's key and returns the id of the new node.
    pub fn insert_node(self, value: V) -> NodeId {
        let idx = self.tree.insert_at(self.insert_as, self.key, value);
        self.tree.arena.id(idx)
    }

    /// Inserts `value` under this entry's key and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'tree mut V {
        let idx = self.tree.insert_at(self.insert_as, self.key, value);
        &mut self.tree.arena.node_mut(idx).value
    }
}

/// A view into an occupied entry in an [`AvlTree`]. It is part of the [`Entry`] enum.
pub struct OccupiedEntry<'tree, K, V> {
    tree: &'tree mut AvlTree<K, V>,
    node: usize,
}

impl<'tree, K, V> OccupiedEntry<'tree, K, V> {
    pub(crate) fn new(tree: &'tree mut AvlTree<K, V>, node: usize) -> Self {
        OccupiedEntry { tree, node }
    }

    /// Returns the id of the node holding this entry.
    pub fn id(&self) -> NodeId {
        self.tree.arena.id(self.node)
    }

    /// Returns a view of the node holding this entry.
    pub fn node(&self) -> NodeRef<'_, K, V> {
        NodeRef::new(&self.tree.arena, self.node)
    }

    /// Returns a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.tree.arena.node(self.node).key
    }

    /// Returns a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.tree.arena.node(self.node).value
    }

    /// Returns a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.tree.arena.node_mut(self.node).value
    }

    /// Converts the entry into a mutable reference to its value, bound to the tree's borrow.
    pub fn into_mut(self) -> &'tree mut V {
        &mut self.tree.arena.node_mut(self.node).value
    }

    /// Replaces the value in the entry, returning the previous value.
    ///
    /// The node keeps its identity and position.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }

    /// Removes the entry from the tree, returning its value.
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Removes the entry from the tree, returning the stored key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.tree.remove_at(self.node)
    }
}

/// The error returned by [`AvlTree::try_insert`] when the key is already present.
///
/// Holds the occupied entry and the value that was not inserted.
pub struct OccupiedError<'tree, K, V> {
    /// The entry in the tree that was already occupied.
    pub entry: OccupiedEntry<'tree, K, V>,
    /// The value which was not inserted, because the entry was already occupied.
    pub value: V,
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OccupiedError<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OccupiedError")
            .field("key", self.entry.key())
            .field("old_value", self.entry.get())
            .field("new_value", &self.value)
            .finish()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Display for OccupiedError<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to insert {:?}, key {:?} already exists with value {:?}",
            self.value,
            self.entry.key(),
            self.entry.get(),
        )
    }
}

impl<K: fmt::Debug, V: fmt::Debug> std::error::Error for OccupiedError<'_, K, V> {}

#[cfg(test)]
mod tests {
    use crate::{AvlTree, Entry};

    #[test]
    fn vacant_insert_rebalances() {
        let mut tree = AvlTree::new();

        for key in 0..16u32 {
            match tree.entry(key) {
                Entry::Vacant(entry) => {
                    assert_eq!(*entry.key(), key);
                    *entry.insert(0) += key;
                }
                Entry::Occupied(_) => panic!("{key} inserted twice"),
            }
            tree.assert_invariants();
        }

        assert_eq!(tree.len(), 16);
        assert_eq!(tree.height(), Some(4));
        assert!(tree.iter().all(|(k, v)| k == v));
    }

    #[test]
    fn occupied_entry_replace_and_remove() {
        let mut tree: AvlTree<_, _> = [(1, "one"), (2, "two"), (3, "three")].into_iter().collect();
        let two = tree.find(&2).unwrap();

        let Entry::Occupied(mut entry) = tree.entry(2) else {
            panic!("2 is present");
        };
        assert_eq!(entry.id(), two);
        assert_eq!(entry.insert("deux"), "two");
        assert_eq!(entry.node().height(), 1);
        assert_eq!(entry.remove_entry(), (2, "deux"));

        tree.assert_invariants();
        assert_eq!(tree.len(), 2);
        assert!(tree.node(two).is_none());
    }

    #[test]
    fn or_insert_and_modify() {
        let mut counts: AvlTree<&str, u32> = AvlTree::new();

        for word in ["b", "a", "b", "c", "b", "a"] {
            counts.entry(word).and_modify(|n| *n += 1).or_insert(1);
        }
        *counts.entry("d").or_default() += 10;

        assert_eq!(
            counts.iter().collect::<Vec<_>>(),
            [(&"a", &2), (&"b", &3), (&"c", &1), (&"d", &10)]
        );
        counts.assert_invariants();
    }

    #[test]
    fn try_insert_reports_occupied() {
        let mut tree = AvlTree::new();
        let id = tree.try_insert(7, 'a').unwrap();

        let err = tree.try_insert(7, 'b').unwrap_err();
        assert_eq!(err.entry.id(), id);
        assert_eq!(err.value, 'b');
        assert_eq!(
            err.to_string(),
            "failed to insert 'b', key 7 already exists with value 'a'"
        );

        assert_eq!(tree.get(&7), Some(&'a'));
        assert_eq!(tree.len(), 1);
    }
}
