use proptest::prelude::*;
use rbtree::{Color, Index, Tree};

fn build(keys: &[i32]) -> Tree<i32> {
    let mut tree = Tree::new();
    for &key in keys {
        tree.insert(key);
        if let Err(err) = tree.validate() {
            panic!("invalid red-black tree after insert({}): {}", key, err);
        }
    }
    tree
}

fn key_of(tree: &Tree<i32>, node: Index) -> i32 {
    *tree.node(node).unwrap().key()
}

// Walks the whole tree through the public node accessors and returns every key with
// its color and the keys of its children
fn collect_nodes(tree: &Tree<i32>) -> Vec<(i32, Color, Option<i32>, Option<i32>)> {
    let mut out = Vec::new();
    let mut pending: Vec<Index> = tree.root().into_iter().collect();
    while let Some(index) = pending.pop() {
        let node = tree.node(index).unwrap();
        out.push((
            *node.key(),
            node.color(),
            node.left().map(|left| key_of(tree, left)),
            node.right().map(|right| key_of(tree, right)),
        ));
        pending.extend(node.left());
        pending.extend(node.right());
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn insertion_keeps_invariants(keys in proptest::collection::vec(-500i32..500, 0..300)) {
        let tree = build(&keys);

        if let Some(root) = tree.root() {
            let root = tree.node(root).unwrap();
            prop_assert!(root.is_black());
            prop_assert_eq!(root.parent(), None);
        }

        let mut pending: Vec<Index> = tree.root().into_iter().collect();
        while let Some(index) = pending.pop() {
            let node = tree.node(index).unwrap();
            for child in node.left().into_iter().chain(node.right()) {
                let child_node = tree.node(child).unwrap();
                prop_assert_eq!(child_node.parent(), Some(index));
                prop_assert!(!(node.is_red() && child_node.is_red()));
                pending.push(child);
            }
        }

        // Red-black height bound
        let bound = 2.0 * ((keys.len() + 1) as f64).log2();
        prop_assert!(tree.height() as f64 <= bound.max(0.0) + f64::EPSILON);
    }

    #[test]
    fn in_order_is_sorted_and_keeps_duplicates(keys in proptest::collection::vec(0i32..50, 0..200)) {
        let tree = build(&keys);

        let mut expected = keys.clone();
        expected.sort();
        if expected.is_empty() {
            prop_assert_eq!(tree.in_order(), None);
        } else {
            prop_assert_eq!(tree.in_order(), Some(expected));
        }
        prop_assert_eq!(tree.len(), keys.len());
        prop_assert_eq!(tree.iter().len(), keys.len());
    }

    #[test]
    fn copies_do_not_follow_the_original(
        keys in proptest::collection::vec(-100i32..100, 0..100),
        more in proptest::collection::vec(-100i32..100, 1..50),
    ) {
        let mut tree = build(&keys);
        let copy = tree.clone();
        let before = copy.in_order();
        prop_assert_eq!(collect_nodes(&copy), collect_nodes(&tree));

        tree.extend(more.iter().copied());
        prop_assert_eq!(copy.in_order(), before);
        prop_assert!(copy.validate().is_ok());
        prop_assert_eq!(copy.len() + more.len(), tree.len());
    }

    #[test]
    fn find_agrees_with_a_scan(
        keys in proptest::collection::vec(-200i32..200, 0..150),
        probes in proptest::collection::vec(-250i32..250, 1..40),
    ) {
        let tree = build(&keys);
        for probe in probes {
            let found = tree.find(&probe);
            prop_assert_eq!(found.is_some(), keys.contains(&probe));
            if let Some(node) = found {
                prop_assert_eq!(key_of(&tree, node), probe);
            }
        }
    }

    #[test]
    fn contains_matches_only_the_root(keys in proptest::collection::vec(0i32..100, 1..100), probe in 0i32..100) {
        let tree = build(&keys);
        let root_key = key_of(&tree, tree.root().unwrap());
        prop_assert_eq!(tree.contains(&probe), probe == root_key);
    }
}

#[test]
fn root_only_search_misses_deeper_keys() {
    let tree = build(&[20, 10, 25, 5, 15]);

    // 15 is the right child of 10, which is not the root
    let fifteen = tree.find(&15).unwrap();
    let parent = tree.node(fifteen).unwrap().parent().unwrap();
    assert_eq!(key_of(&tree, parent), 10);
    assert_ne!(tree.root(), Some(parent));

    assert!(!tree.contains(&15));
    assert!(tree.contains(&20));
}

#[test]
fn assignment_replaces_previous_contents() {
    let source = build(&[4, 2, 6, 1, 3, 5, 7]);
    let mut target = build(&[100, 200]);

    target.clone_from(&source);
    assert_eq!(target.in_order(), Some((1..=7).collect()));
    assert_eq!(collect_nodes(&target), collect_nodes(&source));
    assert!(target.validate().is_ok());
}

#[test]
fn display_lists_keys_in_order() {
    let tree = build(&[3, 1, 2, 2]);
    assert_eq!(tree.to_string(), "1 2 2 3");
    assert_eq!(Tree::<i32>::new().to_string(), "empty tree");
}
