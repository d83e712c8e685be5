//! Closed transforms that rebuild only what they change.
//!
//! Every built-in reconstructs the tree bottom-up and hands back the original
//! `Node` for any subtree it left alone, so untouched parts of the output
//! share their allocations with the input.
use crate::error::TransformError;
use crate::stage::Transform;
use arbor_node::{Node, NodeData, NodeRef, Tree, TreeError, TreeNode};
use arbor_select::Selector;
use serde_json::Value;

/// Applies `f` to every node, children before their parent.
///
/// `f` sees the node with its already-mapped children. Returning a node
/// equal to its argument (same name, attributes and child allocations)
/// counts as "unchanged" and keeps the original allocation.
pub fn map_nodes(f: impl Fn(&Node) -> Node + Send + Sync + 'static) -> Transform {
    Transform::new("map_nodes", move |tree| {
        let root = map_subtree(tree.root_node(), &f);
        finish(tree, root)
    })
}

/// Applies `f` to the nodes matched by `selector`.
///
/// Matching happens against the input tree, so structural selectors see the
/// original shape.
pub fn map_selected(
    label: impl Into<String>,
    selector: Selector,
    f: impl Fn(&Node) -> Node + Send + Sync + 'static,
) -> Transform {
    Transform::new(label, move |tree| {
        let root = map_matching(tree.root(), &selector, &f);
        finish(tree, root)
    })
}

pub fn rename(selector: Selector, name: impl Into<String>) -> Transform {
    let name = name.into();
    let label = format!("rename to '{}'", name);
    map_selected(label, selector, move |node| node.with_name(name.as_str()))
}

pub fn set_attr(selector: Selector, key: impl Into<String>, value: impl Into<Value>) -> Transform {
    let key = key.into();
    let value = value.into();
    let label = format!("set_attr '{}'", key);
    map_selected(label, selector, move |node| {
        node.with_attr(key.as_str(), value.clone())
    })
}

/// Removes every node matched by `selector`, moving its surviving children
/// up into its place under the nearest kept ancestor.
///
/// Fails with [`TreeError::ReparentRoot`] if the root matches.
pub fn filter_nodes(selector: Selector) -> Transform {
    Transform::new("filter_nodes", move |tree| {
        let root = tree.root();
        if selector.matches(&root) {
            return Err(TreeError::ReparentRoot(root.name().to_string()).into());
        }
        let children = root
            .children()
            .flat_map(|child| splice(child, &selector))
            .collect();
        finish(tree, root.node().rebuild_with(children))
    })
}

/// Removes every subtree whose root is matched by `selector`.
///
/// Fails with [`TreeError::ReparentRoot`] if the root matches.
pub fn prune(selector: Selector) -> Transform {
    Transform::new("prune", move |tree| {
        let root = tree.root();
        if selector.matches(&root) {
            return Err(TreeError::ReparentRoot(root.name().to_string()).into());
        }
        finish(tree, cut(root, &selector))
    })
}

/// Wraps a rebuilt root, returning the input itself when nothing changed.
fn finish(input: &Tree, root: Node) -> Result<Tree, TransformError> {
    if root.ptr_eq(input.root_node()) {
        return Ok(input.clone());
    }
    Ok(Tree::new(root)?)
}

fn map_subtree(node: &Node, f: &impl Fn(&Node) -> Node) -> Node {
    let children = node.children().iter().map(|c| map_subtree(c, f)).collect();
    keep_if_same(node.rebuild_with(children), f)
}

fn map_matching(node: NodeRef<'_>, selector: &Selector, f: &impl Fn(&Node) -> Node) -> Node {
    let children = node
        .children()
        .map(|c| map_matching(c, selector, f))
        .collect();
    let rebuilt = node.node().rebuild_with(children);
    if selector.matches(&node) {
        keep_if_same(rebuilt, f)
    } else {
        rebuilt
    }
}

fn keep_if_same(node: Node, f: &impl Fn(&Node) -> Node) -> Node {
    let mapped = f(&node);
    if shallow_eq(&mapped, &node) { node } else { mapped }
}

fn shallow_eq(a: &Node, b: &Node) -> bool {
    a.ptr_eq(b)
        || (a.name() == b.name()
            && a.attrs() == b.attrs()
            && a.children().len() == b.children().len()
            && a.children().iter().zip(b.children()).all(|(x, y)| x.ptr_eq(y)))
}

// The nodes `node` turns into: itself, or its surviving children if it matches.
fn splice(node: NodeRef<'_>, selector: &Selector) -> Vec<Node> {
    let children: Vec<Node> = node
        .children()
        .flat_map(|child| splice(child, selector))
        .collect();
    if selector.matches(&node) {
        log::trace!("filter removed '{}'", node.path());
        children
    } else {
        vec![node.node().rebuild_with(children)]
    }
}

fn cut(node: NodeRef<'_>, selector: &Selector) -> Node {
    let children = node
        .children()
        .filter(|child| {
            let matched = selector.matches(child);
            if matched {
                log::trace!("pruned '{}'", child.path());
            }
            !matched
        })
        .map(|child| cut(child, selector))
        .collect();
    node.node().rebuild_with(children)
}
