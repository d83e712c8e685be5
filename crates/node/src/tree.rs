//! A rooted tree with non-owning parent lookups.
use crate::access::{NodeData, TreeNode};
use crate::error::TreeError;
use crate::node::{Attrs, Node, NodeId, NodeInner};
use itertools::Itertools;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

/// A root node plus an index from every non-root node to its parent.
///
/// Nodes hold no parent pointers themselves (a shared subtree can be reused by
/// many tree versions), so parent lookups go through this index, which only
/// keeps weak references.
#[derive(Clone)]
pub struct Tree {
    root: Node,
    parents: HashMap<NodeId, Weak<NodeInner>>,
}

impl Tree {
    /// Indexes `root`. Fails if one node allocation appears at more than one place.
    pub fn new(root: Node) -> Result<Self, TreeError> {
        let mut parents = HashMap::new();
        let mut stack = vec![root.clone()];
        while let Some(node) = stack.pop() {
            for child in node.children() {
                if parents
                    .insert(child.id(), Arc::downgrade(&node.0))
                    .is_some()
                {
                    return Err(TreeError::DuplicateParent {
                        name: child.name().to_string(),
                    });
                }
                stack.push(child.clone());
            }
        }
        Ok(Self { root, parents })
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            node: self.root.clone(),
        }
    }

    pub fn root_node(&self) -> &Node {
        &self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.parents.len() + 1
    }

    pub fn contains(&self, node: &Node) -> bool {
        node.ptr_eq(&self.root) || self.parents.contains_key(&node.id())
    }

    /// Locates a node handle inside this tree.
    pub fn locate(&self, node: &Node) -> Option<NodeRef<'_>> {
        self.contains(node).then(|| NodeRef {
            tree: self,
            node: node.clone(),
        })
    }

    pub fn parent_of(&self, node: &Node) -> Option<Node> {
        self.parents
            .get(&node.id())
            .and_then(Weak::upgrade)
            .map(Node)
    }

    /// Follows child indexes from the root.
    pub fn node_at(&self, path: &[usize]) -> Option<NodeRef<'_>> {
        let mut current = &self.root;
        for &index in path {
            current = current.child(index)?;
        }
        self.locate(current)
    }

    /// Moves the subtree rooted at `node` to become the last child of `new_parent`.
    pub fn reparent(&self, node: &Node, new_parent: &Node) -> Result<Tree, TreeError> {
        let moved = self
            .locate(node)
            .ok_or_else(|| TreeError::NotInTree(node.name().to_string()))?;
        let target = self
            .locate(new_parent)
            .ok_or_else(|| TreeError::NotInTree(new_parent.name().to_string()))?;
        if moved.is_root() {
            return Err(TreeError::ReparentRoot(node.name().to_string()));
        }
        if target == moved || target.ancestors().any(|a| a == moved) {
            return Err(TreeError::Cycle(node.name().to_string()));
        }

        let old_path = moved.index_path();
        let mut new_path = target.index_path();
        let (&old_index, old_parent_path) = old_path
            .split_last()
            .ok_or_else(|| TreeError::ReparentRoot(node.name().to_string()))?;

        // Removing the node shifts later siblings (and their subtrees) one slot left.
        let depth = old_parent_path.len();
        if new_path.len() > depth
            && new_path[..depth] == *old_parent_path
            && new_path[depth] > old_index
        {
            new_path[depth] -= 1;
        }

        let detached = self
            .root
            .update_at(old_parent_path, |p| p.remove_child(old_index).unwrap_or_else(|| p.clone()))
            .ok_or_else(|| TreeError::NotInTree(node.name().to_string()))?;
        let attached = detached
            .update_at(&new_path, |p| p.push_child(node.clone()))
            .ok_or_else(|| TreeError::NotInTree(new_parent.name().to_string()))?;
        Tree::new(attached)
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tree").field(&self.root).finish()
    }
}

/// Escapes a node name for use as one segment of a dot-notation path.
pub fn escape_segment(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c == '\\' || c == '.' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// A node together with the tree it was reached in.
#[derive(Clone)]
pub struct NodeRef<'t> {
    tree: &'t Tree,
    node: Node,
}

impl<'t> NodeRef<'t> {
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn into_node(self) -> Node {
        self.node
    }

    pub fn tree(&self) -> &'t Tree {
        self.tree
    }

    /// Position of this node among its parent's children.
    pub fn sibling_index(&self) -> Option<usize> {
        let parent = self.tree.parent_of(&self.node)?;
        parent.children().iter().position(|c| c.ptr_eq(&self.node))
    }

    /// Child indexes leading from the root to this node.
    pub fn index_path(&self) -> Vec<usize> {
        let mut path: Vec<usize> = std::iter::once(self.clone())
            .chain(self.ancestors())
            .filter_map(|n| n.sibling_index())
            .collect();
        path.reverse();
        path
    }

    /// The escaped dot-notation path of names from the root to this node.
    pub fn path(&self) -> String {
        let mut chain: Vec<NodeRef<'t>> = self.ancestors().collect();
        chain.reverse();
        chain.push(self.clone());
        chain.iter().map(|n| escape_segment(n.name())).join(".")
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.node.ptr_eq(&other.node)
    }
}

impl Eq for NodeRef<'_> {}

impl Hash for NodeRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.id().hash(state);
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeRef({})", self.path())
    }
}

impl NodeData for NodeRef<'_> {
    fn name(&self) -> &str {
        self.node.name()
    }

    fn attrs(&self) -> &Attrs {
        self.node.attrs()
    }
}

impl<'t> TreeNode<'t> for NodeRef<'t> {
    fn children(&self) -> Box<dyn Iterator<Item = Self> + 't> {
        let tree = self.tree;
        let node = self.node.clone();
        Box::new((0..node.children().len()).map(move |i| NodeRef {
            tree,
            node: node.children()[i].clone(),
        }))
    }

    fn parent(&self) -> Option<Self> {
        self.tree.parent_of(&self.node).map(|node| NodeRef {
            tree: self.tree,
            node,
        })
    }

    fn is_leaf(&self) -> bool {
        self.node.is_leaf()
    }
}
