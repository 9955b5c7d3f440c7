use generational_arena::Index;

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Color {
    Red,
    Black,
}

/// Position of a node relative to its parent.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum NodeType {
    LeftChild,
    RightChild,
    Orphan,
}

/// A single tree element.
///
/// The key is fixed at creation. Links are arena indices owned by the enclosing
/// [`Tree`](crate::Tree): `left` and `right` point down to the children the node owns,
/// `parent` points back up and owns nothing.
#[derive(Debug, Clone)]
pub struct Node<K> {
    pub(crate) parent: Option<Index>,
    pub(crate) left: Option<Index>,
    pub(crate) right: Option<Index>,

    key: K,

    pub(crate) color: Color,
}

impl<K> Node<K> {
    pub(crate) fn new(key: K) -> Self {
        Node {
            // Tree structure
            parent: None,
            left: None,
            right: None,

            key,

            // New nodes are always red
            color: Color::Red,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn is_red(&self) -> bool {
        self.color == Color::Red
    }

    pub fn is_black(&self) -> bool {
        self.color == Color::Black
    }

    pub fn left(&self) -> Option<Index> {
        self.left
    }

    pub fn right(&self) -> Option<Index> {
        self.right
    }

    /// The node this one hangs off, `None` for the root.
    pub fn parent(&self) -> Option<Index> {
        self.parent
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}
