//! The rotation engine.
//!
//! Rotations are only ever applied by [`AvlTree::rebalance_from`], the upward pass that both
//! insertion and removal finish with.
//!
//! Rotation selection at an unbalanced node `n`, where `bf(x) = height(x.left) - height(x.right)`:
//!
//! | `bf(n)` | `bf` of heavy child | rotation                                    |
//! |---------|---------------------|---------------------------------------------|
//! | +2      | >= 0                | right at `n`                                |
//! | +2      | -1                  | left at `n.left`, then right at `n`         |
//! | -2      | +1                  | right at `n.right`, then left at `n`        |
//! | -2      | <= 0                | left at `n`                                 |

use log::trace;

use crate::{
    node::{Dir, Link},
    AvlTree,
};

impl<K, V> AvlTree<K, V> {
    /// Rotates `down` towards `dir`, promoting its `!dir` child in its place.
    ///
    /// A right rotation promotes the left child: the child's right subtree becomes the left
    /// subtree of `down`, and `down` becomes the child's right child. Both nodes are recached,
    /// `down` first. Returns the promoted node, which is the new local subtree root.
    ///
    /// ```text
    ///      down                up
    ///      /  \               /  \
    ///     up   c    -->      a   down
    ///    /  \                    /  \
    ///   a  across            across  c
    /// ```
    pub(crate) fn rotate(&mut self, down: usize, dir: Dir) -> usize {
        let up = self
            .arena
            .links(down)
            .child(!dir)
            .expect("rotation requires the child being promoted");

        trace!("rotate {dir:?} at {}", self.arena.id(down));

        let across = self.arena.links(up).child(dir);
        self.arena.links_mut(down).set_child(!dir, across);
        self.arena.maybe_set_parent(across, Some(down));

        self.arena.links_mut(up).set_child(dir, Some(down));
        let parent = self.arena.links_mut(down).set_parent(Some(up));
        self.replace_child_or_set_root(parent, down, Some(up));

        self.arena.recache_height(down);
        self.arena.recache_height(up);

        up
    }

    /// Performs a double rotation at `down`: first at its `!dir` child towards `!dir`, then at
    /// `down` towards `dir`. Returns the new local subtree root.
    pub(crate) fn rotate_twice(&mut self, down: usize, dir: Dir) -> usize {
        let heavy = self
            .arena
            .links(down)
            .child(!dir)
            .expect("double rotation requires a heavy child");

        self.rotate(heavy, !dir);
        self.rotate(down, dir)
    }

    /// Restores the balance of `node` if its balance factor is +/-2, applying exactly one single
    /// or double rotation. Returns whichever node roots the subtree afterwards.
    ///
    /// The heights of `node`'s children must be correct, and `node`'s own height recached.
    fn rebalance_at(&mut self, node: usize) -> usize {
        let bf = self.arena.balance_factor(node);
        debug_assert!((-2..=2).contains(&bf), "balance factor {bf} out of range");

        // The heavy side is the one that has to be promoted.
        let dir = match bf {
            2 => Dir::Left,
            -2 => Dir::Right,
            _ => return node,
        };

        let heavy = self
            .arena
            .links(node)
            .child(dir)
            .expect("an unbalanced node has a child on its heavy side");

        let heavy_bf = self.arena.balance_factor(heavy);
        let outer = match dir {
            Dir::Left => heavy_bf >= 0,
            Dir::Right => heavy_bf <= 0,
        };

        if outer {
            self.rotate(node, !dir)
        } else {
            self.rotate_twice(node, !dir)
        }
    }

    /// The upward pass shared by insertion and removal.
    ///
    /// Starting at `start`, recaches each node's height, rotates wherever the node is out of
    /// balance, and moves on to the parent of the resulting subtree root, until it has passed
    /// the tree root. The walk never stops early, which removal relies on since a removal can
    /// unbalance any ancestor.
    pub(crate) fn rebalance_from(&mut self, start: Link) {
        let mut opt_cur = start;

        while let Some(cur) = opt_cur {
            self.arena.recache_height(cur);
            let top = self.rebalance_at(cur);

            if cfg!(debug_assertions) {
                let bf = self.arena.balance_factor(top);
                assert!((-1..=1).contains(&bf), "subtree still unbalanced ({bf})");
            }

            opt_cur = self.arena.links(top).parent();
        }
    }
}
