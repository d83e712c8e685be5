//! Persistent, immutable tree nodes.
//!
//! Nodes are never mutated in place: every change produces new nodes for the
//! changed node and its ancestors while untouched subtrees are shared. A
//! [`Tree`] indexes parent links for a given root so that ancestor and depth
//! queries work without nodes owning their parents.
//!
//! # Key Types
//!
//! - [`Node`]: reference-counted node with name, attributes and children
//! - [`Tree`]: a rooted tree with weak parent lookups
//! - [`NodeRef`]: a node located inside a `Tree`
//! - [`TreeNode`]: the traversal contract matchers and selectors depend on
//! - [`NodeContext`]: an object-safe `TreeNode` view for user predicates
//! - [`TreeMapping`]: the neutral flat mapping used by serializers

pub mod access;
pub mod error;
pub mod mapping;
pub mod node;
pub mod traverse;
pub mod tree;

pub use access::{NodeContext, NodeData, TreeNode};
pub use error::TreeError;
pub use mapping::{MappingEntry, TreeMapping};
pub use node::{Attrs, Node, NodeId};
pub use traverse::{Ancestors, Descendants, Order, Postorder, Preorder, fold};
pub use tree::{NodeRef, Tree, escape_segment};
