use std::fmt;
use std::sync::Arc;

/// Pipeline-wide settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    /// When set, every stage reports its node counts through `log::debug!`
    /// and the pipeline's observer, if one is installed.
    ///
    /// Defaults to `false`.
    pub debug: bool,
}

/// What one stage saw and produced during a debug run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageStats {
    pub index: usize,
    pub label: String,
    pub nodes_in: usize,
    /// `None` for a shaper, whose output is not a tree.
    pub nodes_out: Option<usize>,
}

impl fmt::Display for StageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.nodes_out {
            Some(out) => write!(
                f,
                "stage {} '{}': {} -> {} nodes",
                self.index, self.label, self.nodes_in, out
            ),
            None => write!(
                f,
                "stage {} '{}': {} nodes -> value",
                self.index, self.label, self.nodes_in
            ),
        }
    }
}

pub type Observer = Arc<dyn Fn(&StageStats) + Send + Sync>;
