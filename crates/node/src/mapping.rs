//! Conversion between a [`Tree`] and a flat, neutral mapping.
//!
//! The mapping is what serializers and DSL front-ends exchange with the core:
//! one entry per node, keyed by the node's path, naming the parent entry and
//! carrying the attributes.
//!
//! Key syntax: names joined by `.`, with `\.`, `\\` and `\#` escapes. When a
//! name repeats among siblings, the n-th repeat (n >= 1) gets a `#n` suffix.
//! The node name is always the last key component without its suffix, and a
//! child's key is always its parent's key plus that component.

use crate::error::TreeError;
use crate::node::{Attrs, Node};
use crate::tree::Tree;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MappingEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub attrs: Attrs,
}

pub type TreeMapping = IndexMap<String, MappingEntry>;

fn escape_key_component(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '\\' | '.' | '#') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Extracts the node name from a mapping key.
pub fn name_from_key(key: &str) -> Result<String, TreeError> {
    let last = last_component(key);
    parse_component(key, &key[last..]).map(|(name, _)| name)
}

// Byte offset where the last unescaped-dot separated component starts.
fn last_component(key: &str) -> usize {
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in key.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '.' => start = i + 1,
            _ => {}
        }
    }
    start
}

/// Splits one key component into its unescaped name and sibling index
/// (0 when there is no `#n` suffix). Only the canonical spelling
/// `to_mapping` would produce is accepted.
fn parse_component(key: &str, component: &str) -> Result<(String, usize), TreeError> {
    let mut name = String::new();
    let mut suffix: Option<String> = None;
    let mut chars = component.chars();
    while let Some(c) = chars.next() {
        match (c, suffix.as_mut()) {
            ('\\', None) => match chars.next() {
                Some(escaped @ ('\\' | '.' | '#')) => name.push(escaped),
                Some(other) => {
                    return Err(TreeError::invalid_key(
                        key,
                        format!("invalid escape sequence '\\{}'", other),
                    ));
                }
                None => return Err(TreeError::invalid_key(key, "dangling escape")),
            },
            ('.', _) => return Err(TreeError::invalid_key(key, "unescaped '.' in a key component")),
            ('#', None) => suffix = Some(String::new()),
            (c, Some(digits)) => digits.push(c),
            (c, None) => name.push(c),
        }
    }
    let index = match suffix {
        None => 0,
        Some(digits) => digits
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| TreeError::invalid_key(key, "sibling suffix must be a positive number"))?,
    };
    let canonical = sibling_key(&escape_key_component(&name), index);
    if canonical != component {
        return Err(TreeError::invalid_key(key, format!("expected '{}'", canonical)));
    }
    Ok((name, index))
}

fn sibling_key(escaped: &str, index: usize) -> String {
    if index == 0 {
        escaped.to_string()
    } else {
        format!("{}#{}", escaped, index)
    }
}

impl Tree {
    /// Renders the tree as a neutral mapping, entries in preorder.
    pub fn to_mapping(&self) -> TreeMapping {
        let mut out = TreeMapping::new();
        let root = self.root_node();
        let key = escape_key_component(root.name());
        emit(root, key, None, &mut out);
        out
    }

    /// Builds a tree from a neutral mapping. Entries may appear in any order.
    ///
    /// Every key must be its parent's key plus one escaped component, so a
    /// key always names its node. Children follow entry order, except that
    /// same-named siblings are placed by their `#n` suffix, which must count
    /// up from the unsuffixed key without gaps.
    pub fn from_mapping(mapping: &TreeMapping) -> Result<Tree, TreeError> {
        let mut root: Option<&str> = None;
        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for (key, entry) in mapping {
            match &entry.parent {
                None => {
                    if let Some(first) = root {
                        return Err(TreeError::MultipleRoots {
                            first: first.to_string(),
                            second: key.clone(),
                        });
                    }
                    root = Some(key);
                }
                Some(parent) => {
                    if parent == key {
                        return Err(TreeError::Cycle(key.clone()));
                    }
                    if !mapping.contains_key(parent) {
                        return Err(TreeError::UnknownParent {
                            key: key.clone(),
                            parent: parent.clone(),
                        });
                    }
                    children.entry(parent.as_str()).or_default().push(key);
                }
            }
        }
        let root = root.ok_or(TreeError::MissingRoot)?;

        let (name, index) = parse_component(root, root)?;
        if index != 0 {
            return Err(TreeError::invalid_key(root, "the root key takes no sibling suffix"));
        }
        let mut built = 0;
        let node = build(root, name, mapping, &children, &mut built)?;
        if built != mapping.len() {
            // Every parent exists and there is a single root, so whatever the
            // walk from the root did not reach hangs off a cycle.
            let stray = mapping
                .keys()
                .find(|k| !is_reachable(k, mapping, root))
                .cloned()
                .unwrap_or_default();
            return Err(TreeError::Cycle(stray));
        }
        Tree::new(node)
    }
}

fn emit(node: &Node, key: String, parent: Option<&str>, out: &mut TreeMapping) {
    out.insert(
        key.clone(),
        MappingEntry {
            parent: parent.map(str::to_string),
            attrs: node.attrs().clone(),
        },
    );
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for child in node.children() {
        let count = seen.entry(child.name()).or_insert(0);
        let component = sibling_key(&escape_key_component(child.name()), *count);
        *count += 1;
        emit(child, format!("{}.{}", key, component), Some(&key), out);
    }
}

fn build(
    key: &str,
    name: String,
    mapping: &TreeMapping,
    children: &HashMap<&str, Vec<&str>>,
    built: &mut usize,
) -> Result<Node, TreeError> {
    *built += 1;
    let entry = &mapping[key];
    let mut kids = Vec::new();
    if let Some(keys) = children.get(key) {
        for (child_key, child_name) in order_siblings(key, keys)? {
            kids.push(build(child_key, child_name, mapping, children, built)?);
        }
    }
    Ok(Node::from_parts(name, entry.attrs.clone(), kids))
}

/// Child keys of `parent` with their names, in child order.
fn order_siblings<'m>(
    parent: &str,
    keys: &[&'m str],
) -> Result<Vec<(&'m str, String)>, TreeError> {
    let mut slots = Vec::with_capacity(keys.len());
    let mut groups: IndexMap<String, Vec<(usize, &'m str)>> = IndexMap::new();
    for &key in keys {
        let component = key
            .strip_prefix(parent)
            .and_then(|rest| rest.strip_prefix('.'))
            .ok_or_else(|| {
                TreeError::invalid_key(key, format!("key does not extend its parent '{}'", parent))
            })?;
        let (name, index) = parse_component(key, component)?;
        groups.entry(name.clone()).or_default().push((index, key));
        slots.push(name);
    }
    for (name, group) in groups.iter_mut() {
        group.sort_unstable();
        let gap = group.iter().enumerate().find(|(i, (index, _))| i != index);
        if let Some((_, &(_, key))) = gap {
            return Err(TreeError::invalid_key(
                key,
                format!("siblings named '{}' must be numbered without gaps", name),
            ));
        }
        // Popped from the back below.
        group.reverse();
    }
    Ok(slots
        .into_iter()
        .filter_map(|name| {
            let (_, key) = groups.get_mut(&name)?.pop()?;
            Some((key, name))
        })
        .collect())
}

fn is_reachable(key: &str, mapping: &TreeMapping, root: &str) -> bool {
    let mut current = key;
    for _ in 0..=mapping.len() {
        if current == root {
            return true;
        }
        match mapping.get(current).and_then(|e| e.parent.as_deref()) {
            Some(parent) => current = parent,
            None => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(parent: Option<&str>, attrs: serde_json::Value) -> MappingEntry {
        let attrs = match attrs {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            _ => Attrs::new(),
        };
        MappingEntry {
            parent: parent.map(str::to_string),
            attrs,
        }
    }

    fn sample_mapping() -> TreeMapping {
        let mut m = TreeMapping::new();
        m.insert("app".into(), entry(None, json!({"version": 2})));
        m.insert("app.config".into(), entry(Some("app"), json!({"debug": true})));
        m.insert("app.config.item".into(), entry(Some("app.config"), json!({})));
        m.insert("app.config.item#1".into(), entry(Some("app.config"), json!({"n": 1})));
        m.insert("app.v1\\.0".into(), entry(Some("app"), json!({})));
        m
    }

    #[test]
    fn test_mapping_round_trip() {
        let m = sample_mapping();
        let tree = Tree::from_mapping(&m).unwrap();
        assert_eq!(tree.to_mapping(), m);
        let config = &tree.root_node().children()[0];
        assert_eq!(config.children().len(), 2);
        assert_eq!(config.children()[1].name(), "item");
        assert_eq!(tree.root_node().children()[1].name(), "v1.0");
    }

    #[test]
    fn test_tree_round_trip() {
        let tree = Tree::new(Node::new("r").with_attr("k", json!([1, 2])).with_children([
            Node::new("a#b"),
            Node::new("a#b").with_children([Node::new("c")]),
        ]))
        .unwrap();
        let rebuilt = Tree::from_mapping(&tree.to_mapping()).unwrap();
        assert_eq!(rebuilt, tree);
    }

    #[test]
    fn test_entries_out_of_order() {
        let mut m = TreeMapping::new();
        m.insert("app.b".into(), entry(Some("app"), json!({})));
        m.insert("app".into(), entry(None, json!({})));
        m.insert("app.a".into(), entry(Some("app"), json!({})));
        let tree = Tree::from_mapping(&m).unwrap();
        let names: Vec<_> = tree.root_node().children().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn test_suffixed_siblings_out_of_order() {
        let mut m = TreeMapping::new();
        m.insert("app".into(), entry(None, json!({})));
        m.insert("app.item#1".into(), entry(Some("app"), json!({"n": 1})));
        m.insert("app.other".into(), entry(Some("app"), json!({})));
        m.insert("app.item".into(), entry(Some("app"), json!({"n": 0})));
        let tree = Tree::from_mapping(&m).unwrap();
        let kids = tree.root_node().children();
        assert_eq!(kids[0].attr("n"), Some(&json!(0)));
        assert_eq!(kids[1].name(), "other");
        assert_eq!(kids[2].attr("n"), Some(&json!(1)));
        assert_eq!(tree.to_mapping(), m);
    }

    #[test]
    fn test_keys_must_follow_their_parent() {
        let cases: [&[(&str, Option<&str>)]; 5] = [
            &[("root", None), ("child", Some("root"))],
            &[("root", None), ("root.a.b", Some("root"))],
            &[("root", None), ("root.a#0", Some("root"))],
            &[("root", None), ("root.a", Some("root")), ("root.a#2", Some("root"))],
            &[("root#1", None)],
        ];
        for case in cases {
            let m: TreeMapping = case
                .iter()
                .map(|(key, parent)| (key.to_string(), entry(*parent, json!({}))))
                .collect();
            assert!(
                matches!(Tree::from_mapping(&m), Err(TreeError::InvalidKey { .. })),
                "expected an invalid key in {:?}",
                case
            );
        }
    }

    #[test]
    fn test_structural_errors() {
        let mut m = TreeMapping::new();
        assert_eq!(Tree::from_mapping(&m), Err(TreeError::MissingRoot));

        m.insert("a".into(), entry(None, json!({})));
        m.insert("b".into(), entry(None, json!({})));
        assert!(matches!(Tree::from_mapping(&m), Err(TreeError::MultipleRoots { .. })));

        let mut m = TreeMapping::new();
        m.insert("a".into(), entry(None, json!({})));
        m.insert("a.x".into(), entry(Some("nowhere"), json!({})));
        assert!(matches!(Tree::from_mapping(&m), Err(TreeError::UnknownParent { .. })));

        let mut m = TreeMapping::new();
        m.insert("a".into(), entry(None, json!({})));
        m.insert("p".into(), entry(Some("q"), json!({})));
        m.insert("q".into(), entry(Some("p"), json!({})));
        assert!(matches!(Tree::from_mapping(&m), Err(TreeError::Cycle(_))));
    }

    #[test]
    fn test_invalid_key_escape() {
        assert!(matches!(name_from_key("a.\\x"), Err(TreeError::InvalidKey { .. })));
        assert_eq!(name_from_key("a.b\\#c#2").unwrap(), "b#c");
    }

    #[test]
    fn test_mapping_serde_shape() {
        let tree = Tree::new(Node::new("app").with_children([Node::new("db")])).unwrap();
        let value = serde_json::to_value(tree.to_mapping()).unwrap();
        assert_eq!(
            value,
            json!({ "app": { "attrs": {} }, "app.db": { "parent": "app", "attrs": {} } })
        );
        let back: TreeMapping = serde_json::from_value(value).unwrap();
        assert_eq!(Tree::from_mapping(&back).unwrap(), tree);
    }
}
