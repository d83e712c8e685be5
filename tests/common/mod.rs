#![allow(dead_code)]

use arbor::{Node, Tree};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// app -> [config{debug:true}, database{}]
pub fn app_tree() -> Tree {
    Tree::new(Node::new("app").with_children([
        Node::new("config").with_attr("debug", true),
        Node::new("database"),
    ]))
    .expect("fixture is a valid tree")
}

/// app -> [config{debug:true} -> [log_level{value:"info"}, cache{size:64}], database{port:5432}]
pub fn nested_app_tree() -> Tree {
    let config = Node::new("config").with_attr("debug", true).with_children([
        Node::new("log_level").with_attr("value", "info"),
        Node::new("cache").with_attr("size", 64),
    ]);
    Tree::new(Node::new("app").with_children([
        config,
        Node::new("database").with_attr("port", 5432),
    ]))
    .expect("fixture is a valid tree")
}

/// app -> [a -> [b -> [c], d]]
pub fn deep_tree() -> Tree {
    let a = Node::new("a").with_children([
        Node::new("b").with_children([Node::new("c")]),
        Node::new("d"),
    ]);
    Tree::new(Node::new("app").with_children([a])).expect("fixture is a valid tree")
}

/// root -> [x -> [y], z -> [w]]
pub fn xyz_tree() -> Tree {
    Tree::new(Node::new("root").with_children([
        Node::new("x").with_children([Node::new("y")]),
        Node::new("z").with_children([Node::new("w")]),
    ]))
    .expect("fixture is a valid tree")
}

/// A complete tree of the given depth and fan-out, named `n{level}_{index}`.
pub fn wide_tree(depth: usize, fan_out: usize) -> Tree {
    fn build(level: usize, index: usize, depth: usize, fan_out: usize) -> Node {
        let node = Node::new(format!("n{}_{}", level, index)).with_attr("level", level);
        if level == depth {
            return node;
        }
        node.with_children((0..fan_out).map(|i| build(level + 1, index * fan_out + i, depth, fan_out)))
    }
    Tree::new(build(0, 0, depth, fan_out)).expect("fixture is a valid tree")
}

pub fn names<'t>(nodes: impl IntoIterator<Item = arbor::NodeRef<'t>>) -> Vec<String> {
    use arbor::NodeData;
    nodes.into_iter().map(|n| n.name().to_string()).collect()
}
