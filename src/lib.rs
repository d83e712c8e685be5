//! Pattern matching and pure transformations over immutable, structurally
//! shared trees.
//!
//! - [`Node`] / [`Tree`]: persistent nodes and a rooted tree with parent lookups
//! - [`PathExpr`] / [`PathCompiler`]: dot-notation path expressions, cached
//! - [`Selector`]: composable node predicates, searched with [`find`] / [`find_all`]
//! - [`Pipeline`]: closed [`Transform`]s optionally ending in a [`Shaper`]
//!
//! ```ignore
//! use arbor::*;
//!
//! let tree = Tree::new(Node::new("app").with_children([
//!     Node::new("config").with_attr("debug", true),
//!     Node::new("database"),
//! ]))?;
//!
//! let compiler = PathCompiler::default();
//! let children = compiler.evaluate(tree.root(), "app.*")?;
//!
//! let cleaned = filter_nodes(Selector::attr_equals("debug", true)).apply(&tree)?;
//! ```

pub mod error;

pub use error::{Error, Result};

pub use arbor_node::{
    Ancestors, Attrs, Descendants, MappingEntry, Node, NodeContext, NodeData, NodeId, NodeRef, Order,
    Postorder, Preorder, Tree, TreeError, TreeMapping, TreeNode, escape_segment, fold,
};
pub use arbor_path::{
    CompilerConfig, Matches, PathCompiler, PathError, PathExpr, Segment, compile, evaluate,
};
pub use arbor_select::{Selector, all_of, and, any_of, find, find_all, not, or, xor};
pub use arbor_transform::{
    Output, Pipeline, PipelineConfig, Shaper, Stage, StageStats, Transform, TransformError,
    filter_nodes, map_nodes, map_selected, or_else, prune, rename, set_attr, shape, then,
};
pub use serde_json::Value;
