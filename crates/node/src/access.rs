//! The read-only access contract that matching and selection are written against.
use crate::node::{Attrs, Node};
use crate::traverse::{Ancestors, Descendants, Postorder, Preorder};
use serde_json::Value;
use std::fmt::Debug;
use std::hash::Hash;

/// The data carried by a single node, independent of where it sits in a tree.
///
/// This part of the contract is object safe, so user predicates can be written
/// against `&dyn NodeData`.
pub trait NodeData {
    fn name(&self) -> &str;

    fn attrs(&self) -> &Attrs;

    fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs().get(key)
    }

    /// The node's type tag: its `type` attribute, when that is a string.
    fn type_tag(&self) -> Option<&str> {
        self.attr("type").and_then(Value::as_str)
    }
}

impl NodeData for Node {
    fn name(&self) -> &str {
        Node::name(self)
    }

    fn attrs(&self) -> &Attrs {
        Node::attrs(self)
    }
}

/// A node located inside a navigable, read-only tree.
///
/// The path evaluator and the selector algebra only ever see nodes through this
/// trait. `'a` is the lifetime of the tree the node belongs to.
pub trait TreeNode<'a>: NodeData + Clone + Eq + Hash + Debug + 'a {
    /// The child nodes, in document order.
    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// The parent node, or `None` for the root.
    fn parent(&self) -> Option<Self>;

    fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    fn is_leaf(&self) -> bool {
        self.children().next().is_none()
    }

    /// Number of edges between this node and the root.
    fn depth(&self) -> usize {
        self.ancestors().count()
    }

    /// Parent, grandparent, ... up to and including the root.
    fn ancestors(&self) -> Ancestors<'a, Self> {
        Ancestors::new(self.clone())
    }

    /// This node and all of its descendants, depth-first, parents before children.
    fn preorder(&self) -> Preorder<'a, Self> {
        Preorder::new(self.clone())
    }

    /// This node and all of its descendants, children before parents.
    fn postorder(&self) -> Postorder<'a, Self> {
        Postorder::new(self.clone())
    }

    /// All descendants in preorder, excluding this node.
    fn descendants(&self) -> Descendants<'a, Self> {
        Descendants::new(self.clone())
    }

    /// The leaves of the subtree rooted here, in preorder.
    fn leaves(&self) -> std::iter::Filter<Preorder<'a, Self>, fn(&Self) -> bool> {
        let is_leaf: fn(&Self) -> bool = |n| n.is_leaf();
        self.preorder().filter(is_leaf)
    }
}

/// An object-safe view of a node in its tree, for user predicates that need
/// more than the node's own data.
pub trait NodeContext: NodeData {
    fn parent_context(&self) -> Option<Box<dyn NodeContext + '_>>;

    fn child_contexts(&self) -> Vec<Box<dyn NodeContext + '_>>;

    /// Number of edges between this node and the root.
    fn level(&self) -> usize;
}

impl<'a, N: TreeNode<'a>> NodeContext for N {
    fn parent_context(&self) -> Option<Box<dyn NodeContext + '_>> {
        let parent = TreeNode::parent(self)?;
        Some(Box::new(parent))
    }

    fn child_contexts(&self) -> Vec<Box<dyn NodeContext + '_>> {
        TreeNode::children(self)
            .map(|child| Box::new(child) as Box<dyn NodeContext + '_>)
            .collect()
    }

    fn level(&self) -> usize {
        self.depth()
    }
}
