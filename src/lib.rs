//! A red-black tree whose nodes live in a generational arena.
//!
//! Keys are kept in non-decreasing order; a key equal to one already stored goes into
//! that node's right subtree. After every insertion the tree is recolored and rotated
//! back into shape, so its height stays within `2 * log2(n + 1)`.
//!
//! ```
//! use rbtree::Tree;
//!
//! let mut tree = Tree::new();
//! for key in [20, 10, 25, 5, 15] {
//!     tree.insert(key);
//! }
//! assert_eq!(tree.in_order(), Some(vec![5, 10, 15, 20, 25]));
//! assert!(tree.find(&15).is_some());
//! assert!(tree.validate().is_ok());
//! ```

mod error;
mod node;
#[cfg(feature = "sync")]
mod sync;
mod tree;

pub use error::{Error, Result};
pub use generational_arena::Index;
pub use node::{Color, Node, NodeType};
#[cfg(feature = "sync")]
pub use sync::SyncTree;
pub use tree::{Iter, Tree};
