use std::{collections::VecDeque, error::Error, fmt};

use crate::{AvlTree, NodeId};

/// A structural defect found by [`AvlTree::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The root node has a parent link.
    RootHasParent { root: NodeId },
    /// A child's parent link does not point at the node holding it.
    ParentMismatch {
        node: NodeId,
        expected: NodeId,
        found: Option<NodeId>,
    },
    /// A key is outside the range allowed by its ancestors.
    OutOfOrder { node: NodeId },
    /// A cached height differs from the one computed from the node's children.
    HeightMismatch {
        node: NodeId,
        cached: i8,
        computed: i8,
    },
    /// A balance factor is outside `-1..=1`.
    Unbalanced { node: NodeId, balance: i8 },
    /// The stored length differs from the number of nodes reachable from the root.
    CountMismatch { len: usize, reachable: usize },
    /// The arena holds nodes that cannot be reached from the root.
    LeakedNodes { live: usize, reachable: usize },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::RootHasParent { root } => {
                write!(f, "root {root} has a parent")
            }
            InvariantViolation::ParentMismatch {
                node,
                expected,
                found: Some(found),
            } => write!(f, "{node} has parent {found}, expected {expected}"),
            InvariantViolation::ParentMismatch {
                node,
                expected,
                found: None,
            } => write!(f, "{node} has no parent, expected {expected}"),
            InvariantViolation::OutOfOrder { node } => {
                write!(f, "key of {node} is out of order")
            }
            InvariantViolation::HeightMismatch {
                node,
                cached,
                computed,
            } => write!(f, "{node} caches height {cached}, actual height is {computed}"),
            InvariantViolation::Unbalanced { node, balance } => {
                write!(f, "{node} has balance factor {balance}")
            }
            InvariantViolation::CountMismatch { len, reachable } => {
                write!(f, "tree length is {len} but {reachable} nodes are reachable")
            }
            InvariantViolation::LeakedNodes { live, reachable } => {
                write!(f, "arena holds {live} nodes but {reachable} are reachable")
            }
        }
    }
}

impl Error for InvariantViolation {}

impl<K: Ord, V> AvlTree<K, V> {
    /// Checks every structural invariant of the tree.
    ///
    /// Walks the whole tree, so this takes _O(n)_ time.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let mut reachable = 0;

        if let Some(root) = self.root {
            if self.arena.links(root).parent().is_some() {
                return Err(InvariantViolation::RootHasParent {
                    root: self.arena.id(root),
                });
            }

            self.validate_at(root, None, None, &mut reachable)?;
        }

        if reachable != self.len {
            return Err(InvariantViolation::CountMismatch {
                len: self.len,
                reachable,
            });
        }

        let live = self.arena.live();
        if live != reachable {
            return Err(InvariantViolation::LeakedNodes { live, reachable });
        }

        Ok(())
    }

    /// Panics if any structural invariant of the tree is violated.
    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        if let Err(violation) = self.validate() {
            panic!("tree invariant violated: {violation}");
        }
    }

    // Returns the computed height of the subtree at `node`.
    fn validate_at<'a>(
        &'a self,
        node: usize,
        lower: Option<&'a K>,
        upper: Option<&'a K>,
        reachable: &mut usize,
    ) -> Result<i8, InvariantViolation> {
        *reachable += 1;

        let id = self.arena.id(node);
        let key = &self.arena.node(node).key;

        let above_lower = lower.map_or(true, |lower| lower < key);
        let below_upper = upper.map_or(true, |upper| key < upper);
        if !(above_lower && below_upper) {
            return Err(InvariantViolation::OutOfOrder { node: id });
        }

        let links = self.arena.links(node);
        let mut heights = [-1i8; 2];

        for (slot, (child, lower, upper)) in [
            (links.left(), lower, Some(key)),
            (links.right(), Some(key), upper),
        ]
        .into_iter()
        .enumerate()
        {
            let Some(child) = child else {
                continue;
            };

            let parent = self.arena.links(child).parent();
            if parent != Some(node) {
                return Err(InvariantViolation::ParentMismatch {
                    node: self.arena.id(child),
                    expected: id,
                    found: parent.map(|p| self.arena.id(p)),
                });
            }

            heights[slot] = self.validate_at(child, lower, upper, reachable)?;
        }

        let [left, right] = heights;
        let computed = left.max(right) + 1;
        let cached = links.height();
        if cached != computed {
            return Err(InvariantViolation::HeightMismatch {
                node: id,
                cached,
                computed,
            });
        }

        let balance = left - right;
        if !(-1..=1).contains(&balance) {
            return Err(InvariantViolation::Unbalanced { node: id, balance });
        }

        Ok(computed)
    }
}

impl<K: fmt::Display, V> AvlTree<K, V> {
    /// Writes the tree in Graphviz DOT format, one rank per tree level.
    ///
    /// Each node is labelled `key:h<height>`, and missing children are drawn as points.
    pub fn dotgraph<W: fmt::Write>(&self, name: &str, mut w: W) -> fmt::Result {
        let Some(root) = self.root else {
            return write!(w, "digraph \"graph-{name}\" {{}}");
        };

        enum Item {
            Node(usize),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut edges = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let Some(item) = queue.pop_front() else {
                    break;
                };

                let node = match item {
                    Item::Node(node) => node,
                    Item::Missing(id) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                };

                let key = &self.arena.node(node).key;
                let links = self.arena.links(node);
                let height = links.height();
                write!(w, "\"graph{name}-{key}\" [label=\"{key}:h{height}\"]; ")?;

                for child in [links.left(), links.right()] {
                    match child {
                        Some(child) => {
                            let child_key = &self.arena.node(child).key;

                            queue.push_back(Item::Node(child));
                            writeln!(
                                edges,
                                "\"graph{name}-{key}\" -> \"graph{name}-{child_key}\";"
                            )?;
                        }
                        None => {
                            queue.push_back(Item::Missing(missing));
                            writeln!(
                                edges,
                                "\"graph{name}-{key}\" -> \"graph{name}-missing{missing}\";"
                            )?;
                            missing += 1;
                        }
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&edges)?;

        w.write_str(" }\n}")
    }
}
