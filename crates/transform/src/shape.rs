//! Terminal stages turning a tree into a value.
use crate::stage::Shaper;
use arbor_node::{NodeData, NodeRef, Order, TreeNode, fold as fold_tree};
use arbor_select::{Selector, find_all};
use serde_json::Value;

/// Accumulates over every node in `order`, starting from `init`.
pub fn fold(
    init: Value,
    order: Order,
    combine: impl Fn(Value, &NodeRef<'_>) -> Value + Send + Sync + 'static,
) -> Shaper {
    Shaper::new("fold", move |tree| {
        Ok(fold_tree(tree.root(), init.clone(), order, |acc, node| {
            combine(acc, node)
        }))
    })
}

/// The number of nodes matched by `selector`.
pub fn count(selector: Selector) -> Shaper {
    Shaper::new("count", move |tree| {
        Ok(Value::from(find_all(tree.root(), &selector).count()))
    })
}

/// Node names as an array, in `order`.
pub fn collect_names(order: Order) -> Shaper {
    Shaper::new("collect_names", move |tree| {
        let names: Vec<Value> = match order {
            Order::Preorder => tree.root().preorder().map(|n| n.name().into()).collect(),
            Order::Postorder => tree.root().postorder().map(|n| n.name().into()).collect(),
        };
        Ok(Value::Array(names))
    })
}

/// The tree's neutral mapping, as JSON.
pub fn to_mapping_value() -> Shaper {
    Shaper::new("to_mapping", |tree| {
        Ok(serde_json::to_value(tree.to_mapping())?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_node::{Node, Tree};
    use serde_json::json;

    /// app -> [a{size:2} -> [b{size:3}], c{size:5}]
    fn sample() -> Tree {
        Tree::new(Node::new("app").with_children([
            Node::new("a")
                .with_attr("size", 2)
                .with_children([Node::new("b").with_attr("size", 3)]),
            Node::new("c").with_attr("size", 5),
        ]))
        .unwrap()
    }

    #[test]
    fn test_fold_sums_attributes() {
        let total = fold(json!(0), Order::Preorder, |acc, node| {
            let size = node.attr("size").and_then(Value::as_i64).unwrap_or(0);
            json!(acc.as_i64().unwrap_or(0) + size)
        });
        assert_eq!(total.apply(&sample()).unwrap(), json!(10));
    }

    #[test]
    fn test_fold_order_is_caller_selected() {
        let trail = |order| {
            fold(json!(""), order, |acc, node| {
                json!(format!("{}{}", acc.as_str().unwrap_or(""), node.name()))
            })
        };
        let tree = sample();
        assert_eq!(trail(Order::Preorder).apply(&tree).unwrap(), json!("appabc"));
        assert_eq!(trail(Order::Postorder).apply(&tree).unwrap(), json!("bacapp"));
    }

    #[test]
    fn test_count_and_names() {
        let tree = sample();
        assert_eq!(count(Selector::is_leaf()).apply(&tree).unwrap(), json!(2));
        assert_eq!(
            collect_names(Order::Postorder).apply(&tree).unwrap(),
            json!(["b", "a", "c", "app"])
        );
    }

    #[test]
    fn test_mapping_value() {
        let tree = Tree::new(Node::new("app").with_children([Node::new("db").with_attr("port", 1)])).unwrap();
        assert_eq!(
            to_mapping_value().apply(&tree).unwrap(),
            json!({
                "app": {"attrs": {}},
                "app.db": {"parent": "app", "attrs": {"port": 1}}
            })
        );
    }
}
