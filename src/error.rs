use thiserror::Error;

/// Structural problems reported by [`Tree::validate`](crate::Tree::validate) and lock
/// failures reported by the shared wrapper.
///
/// Keys are rendered with their `Debug` form so the error does not carry the key type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("root node has a parent link")]
    RootHasParent,

    #[error("root node is not black")]
    RootNotBlack,

    #[error("child of node {key} does not point back to it")]
    BrokenBacklink { key: String },

    #[error("node {key} is out of binary search order")]
    OutOfOrder { key: String },

    #[error("red node {key} has a red child")]
    RedRed { key: String },

    #[error("black height differs below node {key}: left {left}, right {right}")]
    BlackHeightMismatch {
        key: String,
        left: usize,
        right: usize,
    },

    #[error("tree lock poisoned by a panicking writer")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, Error>;
