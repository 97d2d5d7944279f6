use crate::{node::Link, AvlTree, NodeRef};

/// A cursor over an [`AvlTree`].
///
/// A cursor points either to an element of the tree or to a "ghost" non-element that connects the
/// last element to the first.
pub struct Cursor<'tree, K, V> {
    tree: &'tree AvlTree<K, V>,
    cur: Link,
}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        Cursor {
            tree: self.tree,
            cur: self.cur,
        }
    }
}

impl<'tree, K, V> Cursor<'tree, K, V> {
    pub(crate) fn new(tree: &'tree AvlTree<K, V>, cur: Link) -> Self {
        Cursor { tree, cur }
    }

    /// Moves the cursor to the next element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method moves it to the first
    /// element. If it is pointing to the last element, this method moves it to the "ghost"
    /// non-element.
    pub fn move_next(&mut self) {
        self.cur = next_of(self.tree, self.cur);
    }

    /// Moves the cursor to the previous element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method moves it to the last
    /// element. If it is pointing to the first element, this method moves it to the "ghost"
    /// non-element.
    pub fn move_prev(&mut self) {
        self.cur = prev_of(self.tree, self.cur);
    }

    /// Returns the entry pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get(&self) -> Option<(&'tree K, &'tree V)> {
        self.cur.map(|idx| self.tree.entry_at(idx))
    }

    /// Returns the key pointed to by the cursor.
    pub fn key(&self) -> Option<&'tree K> {
        self.get().map(|(k, _)| k)
    }

    /// Returns a view of the node pointed to by the cursor.
    pub fn node(&self) -> Option<NodeRef<'tree, K, V>> {
        self.cur.map(|idx| NodeRef::new(&self.tree.arena, idx))
    }

    /// Returns the next entry.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the first element.
    /// If it is pointing to the last element, this method returns `None`.
    pub fn peek_next(&self) -> Option<(&'tree K, &'tree V)> {
        next_of(self.tree, self.cur).map(|idx| self.tree.entry_at(idx))
    }

    /// Returns the previous entry.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the last element.
    /// If it is pointing to the first element, this method returns `None`.
    pub fn peek_prev(&self) -> Option<(&'tree K, &'tree V)> {
        prev_of(self.tree, self.cur).map(|idx| self.tree.entry_at(idx))
    }
}

/// A cursor over an [`AvlTree`] which supports editing operations.
///
/// A cursor points either to an element of the tree or to a "ghost" non-element that connects the
/// last element to the first.
pub struct CursorMut<'tree, K, V> {
    tree: &'tree mut AvlTree<K, V>,
    cur: Link,
}

impl<'tree, K, V> CursorMut<'tree, K, V> {
    pub(crate) fn new(tree: &'tree mut AvlTree<K, V>, cur: Link) -> Self {
        CursorMut { tree, cur }
    }

    /// Returns a read-only cursor pointing to the current element.
    ///
    /// The `CursorMut` remains immutably borrowed for the lifetime of the returned `Cursor`.
    pub fn as_cursor(&self) -> Cursor<'_, K, V> {
        Cursor::new(self.tree, self.cur)
    }

    /// Moves the cursor to the next element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method will move it to the first
    /// element. If it is pointing to the last element, this method will move it to the "ghost"
    /// non-element.
    pub fn move_next(&mut self) {
        self.cur = next_of(self.tree, self.cur);
    }

    /// Moves the cursor to the previous element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method will move it to the last
    /// element. If it is pointing to the first element, this method will move it to the "ghost"
    /// non-element.
    pub fn move_prev(&mut self) {
        self.cur = prev_of(self.tree, self.cur);
    }

    /// Returns the entry pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get(&self) -> Option<(&K, &V)> {
        self.cur.map(|idx| self.tree.entry_at(idx))
    }

    /// Returns the key and a mutable reference to the value pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get_mut(&mut self) -> Option<(&K, &mut V)> {
        let node = self.tree.arena.node_mut(self.cur?);
        Some((&node.key, &mut node.value))
    }

    /// Returns the next entry.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the first element.
    /// If it is pointing to the last element, this method returns `None`.
    pub fn peek_next(&self) -> Option<(&K, &V)> {
        next_of(self.tree, self.cur).map(|idx| self.tree.entry_at(idx))
    }

    /// Returns the previous entry.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the last element.
    /// If it is pointing to the first element, this method returns `None`.
    pub fn peek_prev(&self) -> Option<(&K, &V)> {
        prev_of(self.tree, self.cur).map(|idx| self.tree.entry_at(idx))
    }

    /// Removes the current element from the tree.
    ///
    /// This returns the removed element and moves the cursor to the next element. If the cursor is
    /// pointing to the "ghost" non-element, this method returns `None`, and neither the tree nor
    /// the cursor is modified.
    pub fn remove_current(&mut self) -> Option<(K, V)> {
        let remove = self.cur?;

        // Removal relinks nodes instead of moving entries between them, so the neighbour found
        // here still holds the same entry afterwards.
        self.move_next();

        Some(self.tree.remove_at(remove))
    }

    /// Removes the current element from the tree.
    ///
    /// This returns the removed element and moves the cursor to the previous element. If the
    /// cursor is pointing to the "ghost" non-element, this method returns `None`, and neither the
    /// tree nor the cursor is modified.
    pub fn remove_current_and_move_prev(&mut self) -> Option<(K, V)> {
        let remove = self.cur?;

        self.move_prev();

        Some(self.tree.remove_at(remove))
    }
}

fn next_of<K, V>(tree: &AvlTree<K, V>, cur: Link) -> Link {
    match cur {
        Some(idx) => tree.successor_raw(idx),
        None => tree.first_raw(),
    }
}

fn prev_of<K, V>(tree: &AvlTree<K, V>, cur: Link) -> Link {
    match cur {
        Some(idx) => tree.predecessor_raw(idx),
        None => tree.last_raw(),
    }
}

#[cfg(test)]
mod tests {
    use crate::AvlTree;

    #[test]
    fn ghost_wraps_around() {
        let tree: AvlTree<u32, ()> = [(1, ()), (2, ())].into_iter().collect();
        let mut curs = tree.cursor_last();

        assert_eq!(curs.key(), Some(&2));
        curs.move_next();
        assert_eq!(curs.key(), None);
        assert_eq!(curs.peek_next().map(|(k, _)| *k), Some(1));
        assert_eq!(curs.peek_prev().map(|(k, _)| *k), Some(2));
        curs.move_next();
        assert_eq!(curs.key(), Some(&1));
        curs.move_prev();
        assert_eq!(curs.key(), None);
    }

    #[test]
    fn remove_two_child_nodes_while_walking() {
        let mut tree: AvlTree<u32, u32> = (0..64).map(|k| (k, k)).collect();
        let mut curs = tree.cursor_first_mut();

        // Removes every even key; many of them have two children when removed.
        while let Some((&key, _)) = curs.get() {
            if key % 2 == 0 {
                assert_eq!(curs.remove_current(), Some((key, key)));
            } else {
                curs.move_next();
            }
        }

        tree.assert_invariants();
        assert_eq!(tree.len(), 32);
        assert!(tree.keys().all(|k| k % 2 == 1));
    }

    #[test]
    fn remove_and_move_prev_from_the_back() {
        let mut tree: AvlTree<u32, &str> = [(1, "a"), (2, "b"), (3, "c")].into_iter().collect();
        let mut curs = tree.cursor_last_mut();

        if let Some((_, v)) = curs.get_mut() {
            *v = "z";
        }
        assert_eq!(curs.remove_current_and_move_prev(), Some((3, "z")));
        assert_eq!(curs.as_cursor().key(), Some(&2));
        assert_eq!(curs.remove_current_and_move_prev(), Some((2, "b")));
        assert_eq!(curs.remove_current_and_move_prev(), Some((1, "a")));
        assert_eq!(curs.get(), None);
        assert_eq!(curs.remove_current_and_move_prev(), None);

        assert!(tree.is_empty());
    }

    #[test]
    fn cursor_at_key() {
        let tree: AvlTree<u32, ()> = (0..10).map(|k| (k * 2, ())).collect();

        let curs = tree.cursor_at(&8);
        assert_eq!(curs.key(), Some(&8));
        assert_eq!(curs.peek_prev().map(|(k, _)| *k), Some(6));
        assert_eq!(curs.peek_next().map(|(k, _)| *k), Some(10));
        assert_eq!(curs.node().map(|n| n.id()), tree.find(&8));

        assert_eq!(tree.cursor_at(&9).key(), None);
    }
}
