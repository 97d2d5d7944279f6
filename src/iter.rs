use core::iter::FusedIterator;

use crate::{node::Link, AvlTree};

/// An in-order iterator over the entries of an [`AvlTree`].
///
/// Created by [`AvlTree::iter`]. Walks the tree through parent links, so it holds no stack and
/// each step is amortized _O(1)_.
pub struct Iter<'tree, K, V> {
    tree: &'tree AvlTree<K, V>,

    front: Link,
    back: Link,

    len: usize,
}

impl<'tree, K, V> Iter<'tree, K, V> {
    pub(crate) fn new(tree: &'tree AvlTree<K, V>) -> Self {
        Iter {
            tree,

            front: tree.first_raw(),
            back: tree.last_raw(),
            len: tree.len(),
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            tree: self.tree,
            front: self.front,
            back: self.back,
            len: self.len,
        }
    }
}

impl<'tree, K, V> Iterator for Iter<'tree, K, V> {
    type Item = (&'tree K, &'tree V);

    fn next(&mut self) -> Option<Self::Item> {
        // The two ends meet once every element has been yielded from one side or the other.
        if self.len == 0 {
            return None;
        }

        let cur = self.front?;
        self.front = self.tree.successor_raw(cur);
        self.len -= 1;

        let node = self.tree.arena.node(cur);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let cur = self.back?;
        self.back = self.tree.predecessor_raw(cur);
        self.len -= 1;

        let node = self.tree.arena.node(cur);
        Some((&node.key, &node.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// An iterator over the keys of an [`AvlTree`], in sorted order.
///
/// Created by [`AvlTree::keys`].
pub struct Keys<'tree, K, V> {
    inner: Iter<'tree, K, V>,
}

impl<'tree, K, V> Keys<'tree, K, V> {
    pub(crate) fn new(tree: &'tree AvlTree<K, V>) -> Self {
        Keys { inner: tree.iter() }
    }
}

impl<'tree, K, V> Iterator for Keys<'tree, K, V> {
    type Item = &'tree K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// An iterator over the values of an [`AvlTree`], in order by key.
///
/// Created by [`AvlTree::values`].
pub struct Values<'tree, K, V> {
    inner: Iter<'tree, K, V>,
}

impl<'tree, K, V> Values<'tree, K, V> {
    pub(crate) fn new(tree: &'tree AvlTree<K, V>) -> Self {
        Values { inner: tree.iter() }
    }
}

impl<'tree, K, V> Iterator for Values<'tree, K, V> {
    type Item = &'tree V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

#[cfg(test)]
mod tests {
    use crate::AvlTree;

    #[test]
    fn empty() {
        let tree: AvlTree<u32, ()> = AvlTree::new();
        let mut iter = tree.iter();

        assert_eq!(iter.len(), 0);
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn both_ends_meet() {
        let tree: AvlTree<u32, u32> = (0..10).map(|k| (k, k * k)).collect();
        let mut iter = tree.iter();

        assert_eq!(iter.next(), Some((&0, &0)));
        assert_eq!(iter.next_back(), Some((&9, &81)));
        assert_eq!(iter.len(), 8);

        let middle: Vec<u32> = iter.by_ref().map(|(k, _)| *k).collect();
        assert_eq!(middle, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn keys_and_values_after_removals() {
        let mut tree: AvlTree<i32, char> = (0..26).map(|k| (k, (b'a' + k as u8) as char)).collect();
        for key in (0..26).step_by(3) {
            assert!(tree.remove(&key));
        }

        let keys: Vec<i32> = tree.keys().copied().collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(keys.len(), tree.len());

        let values: String = tree.values().rev().collect();
        assert_eq!(values, "zxwutrqonlkihfecb");
    }
}
