//! Selector algebra: composable predicates over nodes in their tree.
//!
//! Atoms test a node's name, attributes or position; combinators build new
//! selectors from existing ones. Any [`TreeNode`](arbor_node::TreeNode)
//! implementation can be searched with [`find`] and [`find_all`].

pub mod find;
pub mod selector;

pub use find::{FindAll, find, find_all};
pub use selector::{AttrsPredicate, NodePredicate, Selector, all_of, and, any_of, not, or, xor};
