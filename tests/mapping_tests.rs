mod common;

use arbor::{MappingEntry, Node, Tree, TreeError, TreeMapping, shape};
use common::{TestResult, nested_app_tree, wide_tree};
use serde_json::json;

fn entry(parent: Option<&str>, attrs: serde_json::Value) -> MappingEntry {
    let attrs = match attrs {
        serde_json::Value::Object(map) => map.into_iter().collect(),
        _ => Default::default(),
    };
    MappingEntry {
        parent: parent.map(str::to_string),
        attrs,
    }
}

#[test]
fn trees_survive_a_mapping_round_trip() -> TestResult {
    let awkward = Tree::new(Node::new("root").with_children([
        Node::new("a.b").with_attr("k", json!({"nested": [1, 2]})),
        Node::new("dup"),
        Node::new("dup").with_children([Node::new("x#1"), Node::new(r"back\slash")]),
        Node::new("dup").with_attr("third", true),
    ]))?;
    for tree in [nested_app_tree(), wide_tree(2, 4), awkward] {
        let mapping = tree.to_mapping();
        let rebuilt = Tree::from_mapping(&mapping)?;
        assert_eq!(rebuilt, tree);
        assert_eq!(rebuilt.to_mapping(), mapping);
    }
    Ok(())
}

#[test]
fn mappings_survive_a_tree_round_trip() -> TestResult {
    // Entries deliberately out of preorder.
    let mapping: TreeMapping = [
        ("app.db", entry(Some("app"), json!({"port": 5432}))),
        ("app.config.flag", entry(Some("app.config"), json!({}))),
        ("app", entry(None, json!({"version": "1.0"}))),
        ("app.config", entry(Some("app"), json!({"debug": true}))),
        ("app.db#1", entry(Some("app"), json!({}))),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    let tree = Tree::from_mapping(&mapping)?;
    assert_eq!(tree.to_mapping(), mapping);
    let children: Vec<_> = tree.root_node().children().iter().map(|c| c.name()).collect();
    assert_eq!(children, ["db", "config", "db"]);
    Ok(())
}

#[test]
fn mapping_errors_are_structural_violations() {
    let two_roots: TreeMapping = [
        ("a".to_string(), entry(None, json!({}))),
        ("b".to_string(), entry(None, json!({}))),
    ]
    .into_iter()
    .collect();
    assert!(matches!(
        Tree::from_mapping(&two_roots),
        Err(TreeError::MultipleRoots { .. })
    ));

    let orphan: TreeMapping = [
        ("a".to_string(), entry(None, json!({}))),
        ("a.b".to_string(), entry(Some("a.x"), json!({}))),
    ]
    .into_iter()
    .collect();
    assert!(matches!(
        Tree::from_mapping(&orphan),
        Err(TreeError::UnknownParent { .. })
    ));

    assert!(matches!(
        Tree::from_mapping(&TreeMapping::new()),
        Err(TreeError::MissingRoot)
    ));
}

#[test]
fn mapping_shaper_emits_the_serialized_form() -> TestResult {
    let tree = Tree::new(Node::new("app").with_children([Node::new("db")]))?;
    let value = shape::to_mapping_value().apply(&tree)?;
    assert_eq!(
        value,
        json!({ "app": { "attrs": {} }, "app.db": { "parent": "app", "attrs": {} } })
    );
    let back: TreeMapping = serde_json::from_value(value)?;
    assert_eq!(Tree::from_mapping(&back)?, tree);
    Ok(())
}

#[test]
fn suffixed_siblings_keep_their_attrs_in_any_entry_order() -> TestResult {
    let mapping: TreeMapping = [
        ("app", entry(None, json!({}))),
        ("app.item#1", entry(Some("app"), json!({"n": 1}))),
        ("app.item", entry(Some("app"), json!({"n": 0}))),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    let tree = Tree::from_mapping(&mapping)?;
    let round_trip = tree.to_mapping();
    assert_eq!(round_trip, mapping);
    assert_eq!(round_trip["app.item"].attrs["n"], json!(0));
    assert_eq!(round_trip["app.item#1"].attrs["n"], json!(1));
    Ok(())
}

#[test]
fn keys_outside_the_path_scheme_are_rejected() {
    let detached: TreeMapping = [
        ("root".to_string(), entry(None, json!({}))),
        ("child".to_string(), entry(Some("root"), json!({}))),
    ]
    .into_iter()
    .collect();
    assert!(matches!(
        Tree::from_mapping(&detached),
        Err(TreeError::InvalidKey { ref key, .. }) if key == "child"
    ));
}
