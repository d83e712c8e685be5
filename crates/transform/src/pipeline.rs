//! Sequencing stages with an optional debug hook.
use crate::config::{Observer, PipelineConfig, StageStats};
use crate::error::TransformError;
use crate::stage::{Shaper, Stage, Transform};
use arbor_node::Tree;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// The result of running a [`Pipeline`].
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Tree(Tree),
    Value(Value),
}

impl Output {
    pub fn into_tree(self) -> Option<Tree> {
        match self {
            Output::Tree(tree) => Some(tree),
            Output::Value(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Output::Tree(_) => None,
            Output::Value(value) => Some(value),
        }
    }
}

/// Closed transforms run left to right, optionally ending in one shaper.
///
/// ```ignore
/// let pipeline = Pipeline::new()
///     .then(filter_nodes(Selector::attr_equals("debug", true)))?
///     .then(shape::count(Selector::any()))?
///     .with_debug(true);
/// let output = pipeline.run(&tree)?;
/// ```
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
    config: PipelineConfig,
    observer: Option<Observer>,
}

impl Pipeline {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Enables per-stage node count reporting.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Installs a callback receiving the stats of each stage in debug runs.
    pub fn with_observer(mut self, observer: impl Fn(&StageStats) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Appends a stage. Nothing may follow a shaper.
    pub fn then(mut self, stage: impl Into<Stage>) -> Result<Self, TransformError> {
        let stage = stage.into();
        if let Some(Stage::Shaper(shaper)) = self.stages.last() {
            return Err(TransformError::type_mismatch(shaper.label(), stage.label()));
        }
        self.stages.push(stage);
        Ok(self)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Whether the pipeline ends in a shaper and so produces a value.
    pub fn is_terminal(&self) -> bool {
        self.stages.last().is_some_and(Stage::is_shaper)
    }

    pub fn run(&self, input: &Tree) -> Result<Output, TransformError> {
        let mut current: Option<Tree> = None;
        for (index, stage) in self.stages.iter().enumerate() {
            let tree = current.as_ref().unwrap_or(input);
            match stage {
                Stage::Transform(transform) => {
                    let out = transform.apply(tree)?;
                    self.report(index, transform.label(), tree.len(), Some(out.len()));
                    current = Some(out);
                }
                Stage::Shaper(shaper) => {
                    let value = shaper.apply(tree)?;
                    self.report(index, shaper.label(), tree.len(), None);
                    return Ok(Output::Value(value));
                }
            }
        }
        Ok(Output::Tree(current.unwrap_or_else(|| input.clone())))
    }

    fn report(&self, index: usize, label: &str, nodes_in: usize, nodes_out: Option<usize>) {
        if !self.config.debug {
            return;
        }
        let stats = StageStats {
            index,
            label: label.to_string(),
            nodes_in,
            nodes_out,
        };
        log::debug!("{}", stats);
        if let Some(observer) = &self.observer {
            observer(&stats);
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages)
            .field("config", &self.config)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl From<Transform> for Pipeline {
    fn from(transform: Transform) -> Self {
        Pipeline {
            stages: vec![Stage::Transform(transform)],
            ..Default::default()
        }
    }
}

impl From<Shaper> for Pipeline {
    fn from(shaper: Shaper) -> Self {
        Pipeline {
            stages: vec![Stage::Shaper(shaper)],
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::{filter_nodes, prune};
    use crate::shape::{collect_names, count};
    use arbor_node::{Node, Order};
    use arbor_select::Selector;
    use serde_json::json;
    use std::sync::Mutex;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// app -> [config{debug:true} -> [flag], database]
    fn sample() -> Tree {
        Tree::new(Node::new("app").with_children([
            Node::new("config")
                .with_attr("debug", true)
                .with_children([Node::new("flag")]),
            Node::new("database"),
        ]))
        .unwrap()
    }

    #[test]
    fn test_shaper_must_be_last() {
        let result = Pipeline::new()
            .then(count(Selector::any()))
            .and_then(|p| p.then(prune(Selector::is_leaf())));
        match result {
            Err(TransformError::TypeMismatch { shaper, stage }) => {
                assert_eq!(shaper, "count");
                assert_eq!(stage, "prune");
            }
            other => panic!("expected a type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_run_to_value() {
        let pipeline = Pipeline::new()
            .then(filter_nodes(Selector::attr_equals("debug", true)))
            .unwrap()
            .then(collect_names(Order::Preorder))
            .unwrap();
        assert!(pipeline.is_terminal());
        let out = pipeline.run(&sample()).unwrap();
        assert_eq!(out.into_value(), Some(json!(["app", "flag", "database"])));
    }

    #[test]
    fn test_empty_pipeline_returns_input() {
        let tree = sample();
        let out = Pipeline::new().run(&tree).unwrap().into_tree().unwrap();
        assert!(out.root_node().ptr_eq(tree.root_node()));
    }

    #[test]
    fn test_debug_hook_reports_counts_without_changing_result() {
        init_logger();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let build = || {
            Pipeline::new()
                .then(filter_nodes(Selector::by_name("config")))
                .unwrap()
                .then(prune(Selector::by_name("database")))
                .unwrap()
        };

        let quiet = build().run(&sample()).unwrap();
        let loud = build()
            .with_debug(true)
            .with_observer(move |stats| sink.lock().unwrap().push(stats.clone()))
            .run(&sample())
            .unwrap();
        assert_eq!(quiet, loud);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[0],
            StageStats {
                index: 0,
                label: "filter_nodes".into(),
                nodes_in: 4,
                nodes_out: Some(3)
            }
        );
        assert_eq!((seen[1].nodes_in, seen[1].nodes_out), (3, Some(2)));
    }

    #[test]
    fn test_observer_is_silent_without_debug() {
        let calls = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&calls);
        Pipeline::from(count(Selector::any()))
            .with_observer(move |_| *sink.lock().unwrap() += 1)
            .run(&sample())
            .unwrap();
        assert_eq!(*calls.lock().unwrap(), 0);
    }
}
