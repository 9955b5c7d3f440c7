use crate::error::{Error, Result};
use crate::node::{Color, Node, NodeType};
use generational_arena::{Arena, Index};
use log::{debug, trace};
use std::fmt;

/// The tree structure.
/// Stores the nodes in a generational arena and the index of the root of the tree.
///
/// Every node in the arena is reachable from `root` through child links; there is no
/// deletion, so the arena never holds detached nodes.
#[derive(Debug)]
pub struct Tree<K> {
    nodes: Arena<Node<K>>,
    root: Option<Index>,
}

impl<K> Tree<K> {
    /// Create a new empty tree
    pub fn new() -> Self {
        Tree {
            nodes: Arena::new(),
            root: None,
        }
    }

    /// Create an empty tree with room for `capacity` nodes before reallocating
    pub fn with_capacity(capacity: usize) -> Self {
        Tree {
            nodes: Arena::with_capacity(capacity),
            root: None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    /// Returns the node stored at `index`, or `None` if the handle does not belong to
    /// this tree (for instance because the tree has since been cleared).
    pub fn node(&self, index: Index) -> Option<&Node<K>> {
        self.nodes.get(index)
    }

    /// Number of nodes on the longest path from the root down to a leaf.
    pub fn height(&self) -> usize {
        let mut deepest = 0;
        let mut pending: Vec<(Index, usize)> =
            self.root.map(|root| (root, 1)).into_iter().collect();
        while let Some((node, depth)) = pending.pop() {
            deepest = deepest.max(depth);
            pending.extend(self.get_left(node).map(|left| (left, depth + 1)));
            pending.extend(self.get_right(node).map(|right| (right, depth + 1)));
        }
        deepest
    }

    /// Borrowing in-order iterator over the keys.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            tree: self,
            next: self.root.map(|root| self.leftmost(root)),
            remaining: self.len(),
        }
    }

    /// Release every node, children before the node that owns them, leaving an empty
    /// but usable tree.
    pub fn clear(&mut self) {
        if self.root.is_none() {
            return;
        }

        let mut pending: Vec<Index> = self.root.into_iter().collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(node) = pending.pop() {
            order.push(node);
            pending.extend(self.get_left(node));
            pending.extend(self.get_right(node));
        }

        // Every node appears after its parent in `order`, so walking it backwards
        // frees whole subtrees before their owner
        let mut released = 0;
        for node in order.into_iter().rev() {
            if self.nodes.remove(node).is_some() {
                released += 1;
            }
        }
        self.root = None;
        debug!("released {} nodes", released);
    }

    /// Returns a NodeType indicating if the given node is a left child or right child in
    /// relation to its parent, or an orphan (the root).
    pub fn node_type(&self, node: Index) -> NodeType {
        match self.get_parent(node) {
            Some(parent) if self.get_left(parent) == Some(node) => NodeType::LeftChild,
            Some(_) => NodeType::RightChild,
            None => NodeType::Orphan,
        }
    }

    /// `true` if `node` is the left child of its parent.
    ///
    /// The root has no parent to compare against; callers must not ask about it.
    pub fn is_left_child(&self, node: Index) -> bool {
        debug_assert!(self.get_parent(node).is_some(), "the root is nobody's child");
        self.node_type(node) == NodeType::LeftChild
    }

    /// `true` if `node` is the right child of its parent.
    ///
    /// The root has no parent to compare against; callers must not ask about it.
    pub fn is_right_child(&self, node: Index) -> bool {
        debug_assert!(self.get_parent(node).is_some(), "the root is nobody's child");
        self.node_type(node) == NodeType::RightChild
    }

    // Rebalances the tree after inserting a new red node
    fn insert_rebalance(&mut self, mut node: Index) {
        while Some(node) != self.root
            && self.get_color(Some(node)) == Color::Red
            && self.get_parent_color(node) == Color::Red
        {
            // Parent is red so it isn't the root and has a parent of its own
            let Some(mut parent) = self.get_parent(node) else {
                break;
            };
            let Some(grandparent) = self.get_parent(parent) else {
                break;
            };
            let parent_node_type = self.node_type(parent);
            let uncle = if parent_node_type == NodeType::LeftChild {
                self.get_right(grandparent)
            } else {
                self.get_left(grandparent)
            };

            if let (Some(uncle), Color::Red) = (uncle, self.get_color(uncle)) {
                // Push the red up: parent and uncle go black, grandparent goes red
                debug!("recoloring below {:?}", grandparent);
                self.set_color(uncle, Color::Black);
                self.set_color(parent, Color::Black);
                self.set_color(grandparent, Color::Red);
                node = grandparent;
                continue;
            }

            // Uncle is black (or missing) so we will need to do some rotations
            if self.node_type(node) != parent_node_type {
                // Left-right or right-left case, straighten the path first
                debug!("straightening zig-zag at {:?}", parent);
                if parent_node_type == NodeType::LeftChild {
                    self.left_rotate(parent);
                } else {
                    self.right_rotate(parent);
                }
                // The node and its parent have swapped places
                node = parent;
                parent = match self.get_parent(node) {
                    Some(parent) => parent,
                    None => break,
                };
            }

            // Left-left or right-right case, rotate the grandparent away from the conflict
            debug!("rotating grandparent {:?}", grandparent);
            if parent_node_type == NodeType::LeftChild {
                self.right_rotate(grandparent);
            } else {
                self.left_rotate(grandparent);
            }

            // The parent now heads the subtree and takes the grandparent's color
            let grandparent_color = self.get_color(Some(grandparent));
            self.set_color(grandparent, self.get_color(Some(parent)));
            self.set_color(parent, grandparent_color);
            break;
        }

        if let Some(root) = self.root {
            self.set_color(root, Color::Black);
        }
    }

    // Rotates the nodes to the left
    //    p              q
    //   / \            / \
    //  a   q   -->    p   c
    //     / \        / \
    //    b   c      a   b
    fn left_rotate(&mut self, rotation_root: Index) {
        // Left rotation so pivot is to the right
        let Some(pivot) = self.get_right(rotation_root) else {
            return;
        };
        let pivot_left = self.get_left(pivot);
        let parent = self.get_parent(rotation_root);
        let rotation_root_type = self.node_type(rotation_root);
        trace!("left rotation at {:?}, pivot {:?}", rotation_root, pivot);

        // The left child of the pivot becomes the right child of the rotation root
        self.set_right(rotation_root, pivot_left);
        if let Some(pivot_left) = pivot_left {
            self.set_parent(pivot_left, Some(rotation_root));
        }

        // The pivot replaces the rotation root in the tree
        self.set_parent(pivot, parent);
        self.replace_child(parent, rotation_root_type, pivot);

        // Set the left child of the pivot to be the rotation root
        self.set_left(pivot, Some(rotation_root));
        self.set_parent(rotation_root, Some(pivot));
    }

    // Rotates the nodes to the right
    //     q             p
    //    / \           / \
    //   p   c  -->    a   q
    //  / \               / \
    // a   b             b   c
    fn right_rotate(&mut self, rotation_root: Index) {
        // Right rotation so pivot is to the left
        let Some(pivot) = self.get_left(rotation_root) else {
            return;
        };
        let pivot_right = self.get_right(pivot);
        let parent = self.get_parent(rotation_root);
        let rotation_root_type = self.node_type(rotation_root);
        trace!("right rotation at {:?}, pivot {:?}", rotation_root, pivot);

        // The right child of the pivot becomes the left child of the rotation root
        self.set_left(rotation_root, pivot_right);
        if let Some(pivot_right) = pivot_right {
            self.set_parent(pivot_right, Some(rotation_root));
        }

        // The pivot replaces the rotation root in the tree
        self.set_parent(pivot, parent);
        self.replace_child(parent, rotation_root_type, pivot);

        // Set the right child of the pivot to be the rotation root
        self.set_right(pivot, Some(rotation_root));
        self.set_parent(rotation_root, Some(pivot));
    }

    // Installs `child` in the slot of `parent` described by `slot`, or as the root
    fn replace_child(&mut self, parent: Option<Index>, slot: NodeType, child: Index) {
        match (parent, slot) {
            (Some(parent), NodeType::LeftChild) => self.set_left(parent, Some(child)),
            (Some(parent), NodeType::RightChild) => self.set_right(parent, Some(child)),
            _ => self.root = Some(child),
        }
    }

    fn leftmost(&self, mut node: Index) -> Index {
        while let Some(left) = self.get_left(node) {
            node = left;
        }
        node
    }

    // Next node in key order, following parent links once the right subtree is exhausted
    fn successor(&self, node: Index) -> Option<Index> {
        if let Some(right) = self.get_right(node) {
            return Some(self.leftmost(right));
        }
        let mut node = node;
        while self.node_type(node) == NodeType::RightChild {
            node = self.get_parent(node)?;
        }
        self.get_parent(node)
    }

    // Getter and setters
    fn set_right(&mut self, node: Index, right: Option<Index>) {
        self.nodes[node].right = right;
    }

    fn get_right(&self, node: Index) -> Option<Index> {
        self.nodes[node].right
    }

    fn set_left(&mut self, node: Index, left: Option<Index>) {
        self.nodes[node].left = left;
    }

    fn get_left(&self, node: Index) -> Option<Index> {
        self.nodes[node].left
    }

    fn set_parent(&mut self, node: Index, parent: Option<Index>) {
        self.nodes[node].parent = parent;
    }

    fn get_parent(&self, node: Index) -> Option<Index> {
        self.nodes[node].parent
    }

    fn set_color(&mut self, node: Index, color: Color) {
        self.nodes[node].color = color;
    }

    // Missing nodes count as black
    fn get_color(&self, node: Option<Index>) -> Color {
        node.and_then(|node| self.nodes.get(node))
            .map_or(Color::Black, |node| node.color)
    }

    fn get_parent_color(&self, node: Index) -> Color {
        self.get_color(self.get_parent(node))
    }
}

impl<K: Ord + fmt::Debug> Tree<K> {
    /// Insert `key` and rebalance the tree. Returns the index of the newly created node.
    ///
    /// Keys equal to an existing key are placed in its right subtree.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to populate the new node with
    ///
    pub fn insert(&mut self, key: K) -> Index {
        let mut parent = None;
        let mut goes_left = false;
        let mut current = self.root;
        while let Some(node) = current {
            parent = Some(node);
            goes_left = key < *self.nodes[node].key();
            current = if goes_left {
                self.get_left(node)
            } else {
                self.get_right(node)
            };
        }

        trace!("placing {:?} under {:?}", key, parent);
        let new_node = self.nodes.insert(Node::new(key));
        self.set_parent(new_node, parent);
        match parent {
            None => self.root = Some(new_node),
            Some(parent) if goes_left => self.set_left(parent, Some(new_node)),
            Some(parent) => self.set_right(parent, Some(new_node)),
        }

        // Balance the tree
        self.insert_rebalance(new_node);

        new_node
    }

    /// Check every structural property of the tree and report the first one broken:
    /// parent backlinks, key order, a black root, no red node with a red child and an
    /// equal black height on every path.
    pub fn validate(&self) -> Result<()> {
        let Some(root) = self.root else {
            return Ok(());
        };
        if self.get_parent(root).is_some() {
            return Err(Error::RootHasParent);
        }
        self.check_links(root)?;
        self.check_order()?;
        if self.get_color(Some(root)) != Color::Black {
            return Err(Error::RootNotBlack);
        }
        self.check_colors(Some(root)).map(|_| ())
    }

    fn check_links(&self, root: Index) -> Result<()> {
        let mut pending = vec![root];
        while let Some(node) = pending.pop() {
            for child in [self.get_left(node), self.get_right(node)].into_iter().flatten() {
                if self.get_parent(child) != Some(node) {
                    return Err(Error::BrokenBacklink {
                        key: self.describe(node),
                    });
                }
                pending.push(child);
            }
        }
        Ok(())
    }

    // Rotations can move a duplicate into the left subtree of its twin, so the order
    // only has to be non-decreasing
    fn check_order(&self) -> Result<()> {
        let mut keys = self.iter();
        if let Some(mut previous) = keys.next() {
            for key in keys {
                if key < previous {
                    return Err(Error::OutOfOrder {
                        key: format!("{:?}", key),
                    });
                }
                previous = key;
            }
        }
        Ok(())
    }

    // Returns the black height below `node`, counting the missing leaves as black
    fn check_colors(&self, node: Option<Index>) -> Result<usize> {
        let Some(node) = node else {
            return Ok(1);
        };
        let left = self.get_left(node);
        let right = self.get_right(node);
        let color = self.get_color(Some(node));
        if color == Color::Red
            && (self.get_color(left) == Color::Red || self.get_color(right) == Color::Red)
        {
            return Err(Error::RedRed {
                key: self.describe(node),
            });
        }

        let left_height = self.check_colors(left)?;
        let right_height = self.check_colors(right)?;
        if left_height != right_height {
            return Err(Error::BlackHeightMismatch {
                key: self.describe(node),
                left: left_height,
                right: right_height,
            });
        }
        Ok(if color == Color::Black {
            left_height + 1
        } else {
            left_height
        })
    }

    fn describe(&self, node: Index) -> String {
        format!("{:?}", self.nodes[node].key())
    }
}

impl<K: Ord> Tree<K> {
    /// Returns the index of a node holding `key`, walking down by key order.
    pub fn find(&self, key: &K) -> Option<Index> {
        let mut current = self.root;
        while let Some(node) = current {
            let node_key = self.nodes[node].key();
            if key == node_key {
                return Some(node);
            }
            current = if key < node_key {
                self.get_left(node)
            } else {
                self.get_right(node)
            };
        }
        None
    }
}

impl<K: PartialEq> Tree<K> {
    /// Visits every node in order comparing against `key`, but only a match at the root
    /// is reported: matches found in either subtree are discarded on the way back up.
    /// Use [`Tree::find`] to locate a key anywhere in the tree.
    pub fn contains(&self, key: &K) -> bool {
        self.search_from(self.root, key)
    }

    fn search_from(&self, node: Option<Index>, key: &K) -> bool {
        let Some(node) = node else {
            return false;
        };
        let _ = self.search_from(self.get_left(node), key);
        if self.nodes[node].key() == key {
            return true;
        }
        let _ = self.search_from(self.get_right(node), key);
        false
    }
}

impl<K: Clone> Tree<K> {
    /// Keys in non-decreasing order, or `None` if the tree is empty.
    pub fn in_order(&self) -> Option<Vec<K>> {
        if self.is_empty() {
            return None;
        }
        Some(self.iter().cloned().collect())
    }

    // Duplicates the subtree at `src` into `dst`, hanging the copy off `parent`
    fn copy_subtree(
        &self,
        src: Option<Index>,
        parent: Option<Index>,
        dst: &mut Arena<Node<K>>,
    ) -> Option<Index> {
        let original = &self.nodes[src?];
        let mut node = Node::new(original.key().clone());
        node.color = original.color;
        node.parent = parent;
        let copy = dst.insert(node);

        let left = self.copy_subtree(original.left, Some(copy), dst);
        let right = self.copy_subtree(original.right, Some(copy), dst);
        dst[copy].left = left;
        dst[copy].right = right;
        Some(copy)
    }
}

impl<K: Clone> Clone for Tree<K> {
    fn clone(&self) -> Self {
        let mut nodes = Arena::with_capacity(self.len());
        let root = self.copy_subtree(self.root, None, &mut nodes);
        debug!("deep copied {} nodes", nodes.len());
        Tree { nodes, root }
    }

    // Assignment: tear down what we hold, then copy the source
    fn clone_from(&mut self, source: &Self) {
        self.clear();
        self.root = source.copy_subtree(source.root, None, &mut self.nodes);
        debug!("assigned {} nodes", self.len());
    }
}

impl<K> Drop for Tree<K> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K> Default for Tree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + fmt::Debug> Extend<K> for Tree<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, keys: I) {
        for key in keys {
            self.insert(key);
        }
    }
}

impl<K: Ord + fmt::Debug> FromIterator<K> for Tree<K> {
    fn from_iter<I: IntoIterator<Item = K>>(keys: I) -> Self {
        let mut tree = Tree::new();
        tree.extend(keys);
        tree
    }
}

impl<K: fmt::Display> fmt::Display for Tree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("empty tree");
        }
        for (position, key) in self.iter().enumerate() {
            if position > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

/// In-order iterator over the keys of a [`Tree`].
pub struct Iter<'a, K> {
    tree: &'a Tree<K>,
    next: Option<Index>,
    remaining: usize,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        let tree = self.tree;
        let node = self.next?;
        self.next = tree.successor(node);
        self.remaining = self.remaining.saturating_sub(1);
        Some(tree.nodes[node].key())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<'a, K> IntoIterator for &'a Tree<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}
