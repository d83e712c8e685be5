//! The two kinds of pipeline stage.
use crate::error::TransformError;
use arbor_node::Tree;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type TransformFn = Arc<dyn Fn(&Tree) -> Result<Tree, TransformError> + Send + Sync>;
type ShaperFn = Arc<dyn Fn(&Tree) -> Result<Value, TransformError> + Send + Sync>;

/// A closed transformer: tree in, tree out.
#[derive(Clone)]
pub struct Transform {
    label: String,
    apply: TransformFn,
}

impl Transform {
    pub fn new(
        label: impl Into<String>,
        apply: impl Fn(&Tree) -> Result<Tree, TransformError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            apply: Arc::new(apply),
        }
    }

    /// A transform returning its input.
    pub fn identity() -> Self {
        Self::new("identity", |tree| Ok(tree.clone()))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn apply(&self, tree: &Tree) -> Result<Tree, TransformError> {
        (self.apply)(tree)
    }

    /// Runs `self`, then `next` on its output.
    pub fn then(self, next: Transform) -> Transform {
        let label = format!("{} >> {}", self.label, next.label);
        Transform::new(label, move |input| next.apply(&self.apply(input)?))
    }

    /// Runs `self`; if that leaves the tree structurally unchanged, runs
    /// `fallback` on the original input instead. When neither changes the
    /// tree, the input comes back.
    pub fn or_else(self, fallback: Transform) -> Transform {
        let label = format!("{} || {}", self.label, fallback.label);
        Transform::new(label, move |input| {
            let first = self.apply(input)?;
            if first != *input {
                return Ok(first);
            }
            log::trace!("'{}' left the tree unchanged, trying '{}'", self.label, fallback.label);
            let second = fallback.apply(input)?;
            if second != *input {
                Ok(second)
            } else {
                Ok(input.clone())
            }
        })
    }

    /// Feeds the output of `self` into a shaper.
    pub fn shape(self, shaper: Shaper) -> Shaper {
        let label = format!("{} >> {}", self.label, shaper.label);
        Shaper::new(label, move |input| shaper.apply(&self.apply(input)?))
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transform").field(&self.label).finish()
    }
}

/// A terminal transformer: tree in, value out.
#[derive(Clone)]
pub struct Shaper {
    label: String,
    apply: ShaperFn,
}

impl Shaper {
    pub fn new(
        label: impl Into<String>,
        apply: impl Fn(&Tree) -> Result<Value, TransformError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            apply: Arc::new(apply),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn apply(&self, tree: &Tree) -> Result<Value, TransformError> {
        (self.apply)(tree)
    }
}

impl fmt::Debug for Shaper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shaper").field(&self.label).finish()
    }
}

/// One step of a [`Pipeline`](crate::Pipeline).
#[derive(Debug, Clone)]
pub enum Stage {
    Transform(Transform),
    Shaper(Shaper),
}

impl Stage {
    pub fn label(&self) -> &str {
        match self {
            Stage::Transform(t) => t.label(),
            Stage::Shaper(s) => s.label(),
        }
    }

    pub fn is_shaper(&self) -> bool {
        matches!(self, Stage::Shaper(_))
    }
}

impl From<Transform> for Stage {
    fn from(transform: Transform) -> Self {
        Stage::Transform(transform)
    }
}

impl From<Shaper> for Stage {
    fn from(shaper: Shaper) -> Self {
        Stage::Shaper(shaper)
    }
}

/// `t1` followed by `t2`.
pub fn then(first: Transform, second: Transform) -> Transform {
    first.then(second)
}

/// The first of `t1`, `t2` that changes the tree; the input if neither does.
pub fn or_else(first: Transform, fallback: Transform) -> Transform {
    first.or_else(fallback)
}
