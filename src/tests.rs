use std::ops::Range;

use proptest::prelude::*;

use crate::model;

use super::*;

fn permutations(keys: &[u32]) -> Vec<Vec<u32>> {
    if keys.len() <= 1 {
        return vec![keys.to_vec()];
    }

    let mut out = Vec::new();
    for (i, &first) in keys.iter().enumerate() {
        let mut rest = keys.to_vec();
        rest.remove(i);

        for mut tail in permutations(&rest) {
            tail.insert(0, first);
            out.push(tail);
        }
    }

    out
}

fn insert_find_all(keys: &[u32]) {
    let mut tree: AvlTree<u32, u32> = AvlTree::new();

    for &key in keys {
        tree.insert(key, key + 1);
        tree.assert_invariants();
    }

    for key in keys {
        let node = tree.find_raw(key).expect("item not found");
        assert_eq!(tree.entry_at(node), (key, &(key + 1)));
    }
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree: AvlTree<u32, ()> = AvlTree::new();

    for &key in keys {
        tree.insert(key, ());
        tree.assert_invariants();
    }

    for key in keys {
        let node = tree.find_raw(key).expect("item not found");
        tree.remove_at(node);
        tree.assert_invariants();
    }

    for &key in keys {
        tree.insert(key, ());
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        assert!(tree.remove(key));
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
    assert_eq!(tree.height(), None);
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn up_to_five_elems_find() {
    for n in 1..=5 {
        let keys: Vec<u32> = (0..n).collect();
        for perm in permutations(&keys) {
            insert_find_all(&perm);
        }
    }
}

#[test]
fn up_to_six_elems_remove() {
    for n in 1..=6 {
        let keys: Vec<u32> = (0..n).collect();
        for perm in permutations(&keys) {
            insert_remove_all(&perm);
        }
    }
}

// (key, height, left key, right key) of the node named by `id`.
fn shape(tree: &AvlTree<u32, ()>, id: NodeId) -> (u32, usize, Option<u32>, Option<u32>) {
    let node = tree.node(id).expect("live node");
    let key_of = |child: Option<NodeId>| child.and_then(|c| tree.node(c)).map(|n| *n.key());

    (*node.key(), node.height(), key_of(node.left()), key_of(node.right()))
}

#[test]
fn ascending_triple_rotates_left() {
    let mut tree = AvlTree::new();
    for key in [10, 20, 30] {
        tree.insert(key, ());
    }

    let root = tree.root().unwrap();
    assert_eq!(shape(&tree, root), (20, 1, Some(10), Some(30)));
    assert_eq!(tree.node(tree.find(&10).unwrap()).unwrap().height(), 0);
    assert_eq!(tree.node(tree.find(&30).unwrap()).unwrap().height(), 0);
    tree.assert_invariants();
}

#[test]
fn zigzag_triple_rotates_twice() {
    let mut tree = AvlTree::new();
    for key in [30, 10, 20] {
        tree.insert(key, ());
    }

    let root = tree.root().unwrap();
    assert_eq!(shape(&tree, root), (20, 1, Some(10), Some(30)));
    tree.assert_invariants();

    let mut tree = AvlTree::new();
    for key in [10, 30, 20] {
        tree.insert(key, ());
    }

    let root = tree.root().unwrap();
    assert_eq!(shape(&tree, root), (20, 1, Some(10), Some(30)));
    tree.assert_invariants();
}

fn seven() -> AvlTree<u32, ()> {
    let mut tree = AvlTree::new();
    for key in [50, 30, 70, 20, 40, 60, 80] {
        tree.insert(key, ());
    }
    tree.assert_invariants();
    tree
}

#[test]
fn remove_root_with_two_children() {
    let mut tree = seven();
    let sixty = tree.find(&60).unwrap();

    assert!(tree.remove(&50));
    tree.assert_invariants();

    assert_eq!(tree.len(), 6);
    assert_eq!(tree.root(), Some(sixty));
    assert_eq!(shape(&tree, sixty), (60, 2, Some(30), Some(70)));
    assert_eq!(
        shape(&tree, tree.find(&70).unwrap()),
        (70, 1, None, Some(80))
    );
    assert_eq!(
        tree.keys().copied().collect::<Vec<_>>(),
        [20, 30, 40, 60, 70, 80]
    );
}

#[test]
fn remove_absent_key_changes_nothing() {
    let mut tree = seven();
    let before: Vec<u32> = tree.keys().copied().collect();
    let root = tree.root();

    assert!(!tree.remove(&999));
    assert_eq!(tree.take(&999), None);

    assert_eq!(tree.len(), 7);
    assert_eq!(tree.root(), root);
    assert_eq!(tree.keys().copied().collect::<Vec<_>>(), before);
}

#[test]
fn ascending_seven_is_perfect() {
    let tree: AvlTree<u32, ()> = (1..=7).map(|k| (k, ())).collect();

    assert_eq!(tree.height(), Some(2));
    let root = tree.root().unwrap();
    assert_eq!(shape(&tree, root), (4, 2, Some(2), Some(6)));
    tree.assert_invariants();
}

#[test]
fn swap_with_deeper_successor() {
    let mut tree = seven();
    let fifty = tree.find_raw(&50).unwrap();
    let sixty = tree.find_raw(&60).unwrap();
    let seventy = tree.find_raw(&70).unwrap();

    let successor = tree.swap_with_successor(fifty);
    assert_eq!(successor, sixty);

    // 60 took over the root position, 50 took over the leaf slot under 70.
    assert_eq!(tree.root, Some(sixty));
    assert_eq!(tree.arena.links(sixty).parent(), None);
    assert_eq!(tree.arena.links(sixty).height(), 2);
    assert_eq!(tree.arena.links(seventy).left(), Some(fifty));
    assert_eq!(tree.arena.links(fifty).parent(), Some(seventy));
    assert_eq!(tree.arena.links(fifty).arity(), Arity::Leaf);
    assert_eq!(tree.arena.links(fifty).height(), 0);

    let (key, ()) = tree.remove_at(fifty);
    assert_eq!(key, 50);
    tree.assert_invariants();
}

#[test]
fn swap_with_right_child_successor() {
    let mut tree = AvlTree::new();
    for key in [20, 10, 30, 40] {
        tree.insert(key, ());
    }

    let twenty = tree.find_raw(&20).unwrap();
    let thirty = tree.find_raw(&30).unwrap();
    let forty = tree.find_raw(&40).unwrap();

    assert_eq!(tree.swap_with_successor(twenty), thirty);

    // 20 dropped down to be 30's right child and adopted 40.
    assert_eq!(tree.root, Some(thirty));
    assert_eq!(tree.arena.links(thirty).right(), Some(twenty));
    assert_eq!(tree.arena.links(twenty).parent(), Some(thirty));
    assert_eq!(tree.arena.links(twenty).left(), None);
    assert_eq!(tree.arena.links(twenty).right(), Some(forty));
    assert_eq!(tree.arena.links(forty).parent(), Some(twenty));
    assert_eq!(tree.arena.links(twenty).arity(), Arity::RightOnly);

    tree.remove_at(twenty);
    tree.assert_invariants();

    let root = tree.root().unwrap();
    assert_eq!(shape(&tree, root), (30, 1, Some(10), Some(40)));
}

#[test]
fn successor_id_survives_removal() {
    let mut tree: AvlTree<u32, String> = (0..31).map(|k| (k, k.to_string())).collect();

    for key in [15, 7, 23, 3, 11] {
        let succ_key = key + 1;
        let succ = tree.find(&succ_key).unwrap();

        assert!(tree.remove(&key));
        tree.assert_invariants();

        let node = tree.node(succ).expect("successor still live");
        assert_eq!(*node.key(), succ_key);
        assert_eq!(*node.value(), succ_key.to_string());
    }
}

#[test]
fn stale_ids_do_not_resolve() {
    let mut tree = seven();
    let forty = tree.find(&40).unwrap();

    assert_eq!(tree.remove_node(forty), Some((40, ())));
    assert!(tree.node(forty).is_none());
    assert_eq!(tree.remove_node(forty), None);

    // The slot is recycled, but under a new id.
    let again = tree.insert(40, ());
    assert_eq!(again.index(), forty.index());
    assert_ne!(again, forty);
    assert!(tree.node(forty).is_none());
    tree.assert_invariants();
}

#[test]
fn duplicate_insert_is_idempotent() {
    let mut tree: AvlTree<u32, u32> = [(50, 0), (30, 1), (70, 0)].into_iter().collect();
    let id = tree.find(&30).unwrap();

    assert_eq!(tree.insert(30, 2), id);
    assert_eq!(tree.get(&30), Some(&1));
    assert_eq!(tree.len(), 3);
    tree.assert_invariants();
}

#[test]
fn insert_then_remove_all_round_trips() {
    let keys: Vec<u32> = (0..200).map(|k| (k * 71) % 211).collect();
    let mut tree = AvlTree::new();

    for &key in &keys {
        tree.insert(key, key);
    }
    assert_eq!(tree.len(), keys.len());

    for key in keys.iter().rev() {
        assert_eq!(tree.take(key), Some(*key));
    }

    assert!(tree.is_empty());
    assert_eq!(tree.root(), None);
    tree.assert_invariants();
}

#[test]
fn height_stays_logarithmic() {
    for n in [1usize, 2, 10, 100, 1000, 4096] {
        let tree: AvlTree<usize, ()> = (0..n).map(|k| (k, ())).collect();
        let height = tree.height().unwrap() as f64;
        let bound = 1.44 * ((n + 2) as f64).log2();

        assert!(height <= bound, "{n} keys: height {height} > {bound}");
    }
}

#[test]
fn clone_preserves_ids() {
    let tree = seven();
    let copy = tree.clone();

    assert_eq!(tree, copy);
    for key in [20, 50, 80] {
        let id = tree.find(&key).unwrap();
        assert_eq!(copy.find(&key), Some(id));
        assert_eq!(copy.node(id).map(|n| *n.key()), Some(key));
    }
    copy.assert_invariants();
}

#[test]
fn clear_and_reuse() {
    let mut tree = seven();
    tree.clear();

    assert!(tree.is_empty());
    assert_eq!(tree.first_key_value(), None);
    tree.assert_invariants();

    tree.insert(1, ());
    assert_eq!(tree.len(), 1);
    tree.assert_invariants();
}

#[test]
fn ids_stay_stale_across_clear() {
    let mut tree = AvlTree::new();
    let old = tree.insert(1u32, "one");

    tree.clear();
    let new = tree.insert(2, "two");

    assert_eq!(new.index(), old.index());
    assert!(tree.node(old).is_none());
    assert_eq!(tree.remove_node(old), None);
    assert_eq!(tree.get(&2), Some(&"two"));
    assert_eq!(tree.len(), 1);
    tree.assert_invariants();
}

#[test]
fn map_accessors() {
    let mut tree: AvlTree<String, u32> = AvlTree::new();
    tree.insert("b".to_string(), 2);
    tree.insert("a".to_string(), 1);
    tree.insert("c".to_string(), 3);

    assert_eq!(tree["b"], 2);
    assert!(tree.contains_key("a"));
    assert_eq!(tree.get_key_value("c"), Some((&"c".to_string(), &3)));
    *tree.get_mut("a").unwrap() += 10;
    assert_eq!(tree.first_key_value(), Some((&"a".to_string(), &11)));
    assert_eq!(tree.last_key_value(), Some((&"c".to_string(), &3)));

    assert_eq!(tree.pop_last(), Some(("c".to_string(), 3)));
    assert_eq!(tree.pop_first(), Some(("a".to_string(), 11)));
    assert_eq!(tree.remove_entry("b"), Some(("b".to_string(), 2)));
    assert_eq!(tree.pop_first(), None);

    assert_eq!(format!("{tree:?}"), "{}");
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn cursor_equivalence(
        keys in proptest::collection::vec(0u32..1000, 0..100),
        ops in proptest::collection::vec(model::cursor_op_strategy(), FUZZ_RANGE),
    ) {
        model::run_cursor_equivalence(keys, ops);
    }
}
