//! The persistent node representation.
//!
//! A [`Node`] is an immutable, reference-counted handle. Every method that
//! "changes" a node returns a new handle and leaves the receiver untouched;
//! children that were not touched are shared between both versions.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// The attribute mapping of a node. Insertion order is preserved.
pub type Attrs = IndexMap<String, Value>;

/// Identity of a node allocation, stable for as long as the node is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug)]
pub(crate) struct NodeInner {
    pub(crate) name: String,
    pub(crate) attrs: Attrs,
    pub(crate) children: Vec<Node>,
}

/// An immutable tree vertex: a name, an attribute mapping and ordered children.
#[derive(Clone)]
pub struct Node(pub(crate) Arc<NodeInner>);

impl Node {
    /// Creates a node with no attributes and no children.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_parts(name, Attrs::new(), Vec::new())
    }

    /// Creates a childless node carrying `attrs`.
    pub fn leaf(name: impl Into<String>, attrs: Attrs) -> Self {
        Self::from_parts(name, attrs, Vec::new())
    }

    pub fn from_parts(name: impl Into<String>, attrs: Attrs, children: Vec<Node>) -> Self {
        Node(Arc::new(NodeInner {
            name: name.into(),
            attrs,
            children,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn attrs(&self) -> &Attrs {
        &self.0.attrs
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.0.attrs.get(key)
    }

    pub fn children(&self) -> &[Node] {
        &self.0.children
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.0.children.get(index)
    }

    pub fn is_leaf(&self) -> bool {
        self.0.children.is_empty()
    }

    /// The number of nodes in the subtree rooted here, including this node.
    pub fn size(&self) -> usize {
        1 + self.0.children.iter().map(Node::size).sum::<usize>()
    }

    pub fn id(&self) -> NodeId {
        NodeId(Arc::as_ptr(&self.0) as usize)
    }

    /// True if both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    // --- Reconstruction ---

    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self::from_parts(name, self.0.attrs.clone(), self.0.children.clone())
    }

    pub fn with_attr(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut attrs = self.0.attrs.clone();
        attrs.insert(key.into(), value.into());
        Self::from_parts(self.0.name.clone(), attrs, self.0.children.clone())
    }

    pub fn with_attrs(&self, attrs: Attrs) -> Self {
        Self::from_parts(self.0.name.clone(), attrs, self.0.children.clone())
    }

    pub fn with_children(&self, children: impl IntoIterator<Item = Node>) -> Self {
        Self::from_parts(
            self.0.name.clone(),
            self.0.attrs.clone(),
            children.into_iter().collect(),
        )
    }

    /// Returns a copy of this node with `child` appended after the existing children.
    pub fn push_child(&self, child: Node) -> Self {
        let mut children = self.0.children.clone();
        children.push(child);
        Self::from_parts(self.0.name.clone(), self.0.attrs.clone(), children)
    }

    /// Returns `None` if `index` is out of bounds.
    pub fn replace_child(&self, index: usize, child: Node) -> Option<Self> {
        if index >= self.0.children.len() {
            return None;
        }
        let mut children = self.0.children.clone();
        children[index] = child;
        Some(Self::from_parts(
            self.0.name.clone(),
            self.0.attrs.clone(),
            children,
        ))
    }

    /// Returns `None` if `index` is out of bounds.
    pub fn remove_child(&self, index: usize) -> Option<Self> {
        if index >= self.0.children.len() {
            return None;
        }
        let mut children = self.0.children.clone();
        children.remove(index);
        Some(Self::from_parts(
            self.0.name.clone(),
            self.0.attrs.clone(),
            children,
        ))
    }

    /// Rebuilds the nodes along `path` (child indexes from this node), replacing
    /// the node at the end of the path with `f(node)`. Nodes off the path are shared.
    pub fn update_at(&self, path: &[usize], f: impl FnOnce(&Node) -> Node) -> Option<Self> {
        match path.split_first() {
            None => Some(f(self)),
            Some((&index, rest)) => {
                let updated = self.child(index)?.update_at(rest, f)?;
                self.replace_child(index, updated)
            }
        }
    }

    /// Rebuilds this node only if some child changed identity, otherwise returns
    /// the receiver itself so the untouched subtree keeps its identity.
    pub fn rebuild_with(&self, children: Vec<Node>) -> Self {
        let unchanged = children.len() == self.0.children.len()
            && children
                .iter()
                .zip(self.0.children.iter())
                .all(|(a, b)| a.ptr_eq(b));
        if unchanged {
            self.clone()
        } else {
            self.with_children(children)
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.0.name == other.0.name
                && self.0.attrs == other.0.attrs
                && self.0.children == other.0.children)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Node");
        s.field("name", &self.0.name);
        if !self.0.attrs.is_empty() {
            s.field("attrs", &self.0.attrs);
        }
        if !self.0.children.is_empty() {
            s.field("children", &self.0.children);
        }
        s.finish()
    }
}
