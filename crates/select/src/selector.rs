//! Selector atoms and combinators.
use arbor_node::{Attrs, NodeContext, TreeNode};
use arbor_path::{PathError, PathExpr, glob_match, matching::values_equal};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub type AttrsPredicate = Arc<dyn Fn(&Attrs) -> bool + Send + Sync>;
pub type NodePredicate = Arc<dyn Fn(&dyn NodeContext) -> bool + Send + Sync>;

/// A predicate over a node in its tree.
///
/// Composite selectors own their operands and evaluate them left to right,
/// `And` stopping at the first `false` and `Or` at the first `true`.
#[derive(Clone)]
pub enum Selector {
    Any,
    Nothing,
    /// Name matched by a glob pattern (`*` matches any run of characters).
    Name(String),
    NameRegex(Regex),
    Attrs(AttrsPredicate),
    /// The node's `type` attribute equals the tag.
    Type(String),
    Custom(NodePredicate),
    Leaf,
    Root,
    Depth(usize),
    /// The parent matches.
    ChildOf(Box<Selector>),
    /// Some descendant matches.
    AncestorOf(Box<Selector>),
    /// Some ancestor matches.
    DescendantOf(Box<Selector>),
    Path(Arc<PathExpr>),
    And(Box<Selector>, Box<Selector>),
    Or(Box<Selector>, Box<Selector>),
    Not(Box<Selector>),
    Xor(Box<Selector>, Box<Selector>),
}

impl Selector {
    pub fn matches<'a, N: TreeNode<'a>>(&self, node: &N) -> bool {
        match self {
            Selector::Any => true,
            Selector::Nothing => false,
            Selector::Name(pattern) => glob_match(pattern, node.name()),
            Selector::NameRegex(regex) => regex.is_match(node.name()),
            Selector::Attrs(predicate) => predicate(node.attrs()),
            Selector::Type(tag) => node.type_tag() == Some(tag.as_str()),
            Selector::Custom(predicate) => predicate(node),
            Selector::Leaf => node.is_leaf(),
            Selector::Root => node.is_root(),
            Selector::Depth(depth) => node.depth() == *depth,
            Selector::ChildOf(parent) => node.parent().is_some_and(|p| parent.matches(&p)),
            Selector::AncestorOf(inner) => node.descendants().any(|d| inner.matches(&d)),
            Selector::DescendantOf(inner) => node.ancestors().any(|a| inner.matches(&a)),
            Selector::Path(expr) => expr.matches(node),
            Selector::And(a, b) => a.matches(node) && b.matches(node),
            Selector::Or(a, b) => a.matches(node) || b.matches(node),
            Selector::Not(a) => !a.matches(node),
            Selector::Xor(a, b) => a.matches(node) != b.matches(node),
        }
    }

    // --- Atoms ---

    pub fn any() -> Self {
        Selector::Any
    }

    pub fn none() -> Self {
        Selector::Nothing
    }

    pub fn by_name(pattern: impl Into<String>) -> Self {
        Selector::Name(pattern.into())
    }

    /// Name matched by an anchored regex.
    pub fn by_name_regex(pattern: &str) -> Result<Self, PathError> {
        Regex::new(&format!("^(?:{})$", pattern))
            .map(Selector::NameRegex)
            .map_err(|e| PathError::InvalidRegex {
                expression: pattern.to_string(),
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    pub fn by_attrs(predicate: impl Fn(&Attrs) -> bool + Send + Sync + 'static) -> Self {
        Selector::Attrs(Arc::new(predicate))
    }

    pub fn attr_equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        Self::by_attrs(move |attrs| attrs.get(&key).is_some_and(|v| values_equal(v, &value)))
    }

    pub fn has_attr(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::by_attrs(move |attrs| attrs.contains_key(&key))
    }

    pub fn by_type(tag: impl Into<String>) -> Self {
        Selector::Type(tag.into())
    }

    /// A user predicate over the located node, which can look at its parent,
    /// children and depth as well as its own data.
    pub fn custom(predicate: impl Fn(&dyn NodeContext) -> bool + Send + Sync + 'static) -> Self {
        Selector::Custom(Arc::new(predicate))
    }

    pub fn is_leaf() -> Self {
        Selector::Leaf
    }

    pub fn is_root() -> Self {
        Selector::Root
    }

    pub fn depth_equals(depth: usize) -> Self {
        Selector::Depth(depth)
    }

    pub fn child_of(parent: Selector) -> Self {
        Selector::ChildOf(Box::new(parent))
    }

    pub fn ancestor_of(descendant: Selector) -> Self {
        Selector::AncestorOf(Box::new(descendant))
    }

    pub fn descendant_of(ancestor: Selector) -> Self {
        Selector::DescendantOf(Box::new(ancestor))
    }

    pub fn path(expr: impl Into<Arc<PathExpr>>) -> Self {
        Selector::Path(expr.into())
    }

    pub fn parse_path(source: &str) -> Result<Self, PathError> {
        Ok(Self::path(PathExpr::parse(source)?))
    }

    // --- Combinators ---

    pub fn and(self, other: Selector) -> Self {
        Selector::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Selector) -> Self {
        Selector::Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Selector::Not(Box::new(self))
    }

    pub fn xor(self, other: Selector) -> Self {
        Selector::Xor(Box::new(self), Box::new(other))
    }
}

impl From<PathExpr> for Selector {
    fn from(expr: PathExpr) -> Self {
        Selector::path(expr)
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Any => f.write_str("Any"),
            Selector::Nothing => f.write_str("Nothing"),
            Selector::Name(p) => f.debug_tuple("Name").field(p).finish(),
            Selector::NameRegex(r) => f.debug_tuple("NameRegex").field(&r.as_str()).finish(),
            Selector::Attrs(_) => f.write_str("Attrs(<fn>)"),
            Selector::Type(t) => f.debug_tuple("Type").field(t).finish(),
            Selector::Custom(_) => f.write_str("Custom(<fn>)"),
            Selector::Leaf => f.write_str("Leaf"),
            Selector::Root => f.write_str("Root"),
            Selector::Depth(d) => f.debug_tuple("Depth").field(d).finish(),
            Selector::ChildOf(s) => f.debug_tuple("ChildOf").field(s).finish(),
            Selector::AncestorOf(s) => f.debug_tuple("AncestorOf").field(s).finish(),
            Selector::DescendantOf(s) => f.debug_tuple("DescendantOf").field(s).finish(),
            Selector::Path(p) => f.debug_tuple("Path").field(&p.source()).finish(),
            Selector::And(a, b) => f.debug_tuple("And").field(a).field(b).finish(),
            Selector::Or(a, b) => f.debug_tuple("Or").field(a).field(b).finish(),
            Selector::Not(a) => f.debug_tuple("Not").field(a).finish(),
            Selector::Xor(a, b) => f.debug_tuple("Xor").field(a).field(b).finish(),
        }
    }
}

pub fn and(a: Selector, b: Selector) -> Selector {
    a.and(b)
}

pub fn or(a: Selector, b: Selector) -> Selector {
    a.or(b)
}

pub fn not(a: Selector) -> Selector {
    a.not()
}

pub fn xor(a: Selector, b: Selector) -> Selector {
    a.xor(b)
}

/// Conjunction of all selectors; matches everything when empty.
pub fn all_of(selectors: impl IntoIterator<Item = Selector>) -> Selector {
    selectors
        .into_iter()
        .reduce(Selector::and)
        .unwrap_or(Selector::Any)
}

/// Disjunction of all selectors; matches nothing when empty.
pub fn any_of(selectors: impl IntoIterator<Item = Selector>) -> Selector {
    selectors
        .into_iter()
        .reduce(Selector::or)
        .unwrap_or(Selector::Nothing)
}
