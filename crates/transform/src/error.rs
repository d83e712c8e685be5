use arbor_node::TreeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Cannot append '{stage}' after shaper '{shaper}': a shaper must be the last stage")]
    TypeMismatch { shaper: String, stage: String },

    #[error("Structural violation: {0}")]
    Tree(#[from] TreeError),

    #[error("Failed to render value: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl TransformError {
    pub fn type_mismatch(shaper: impl Into<String>, stage: impl Into<String>) -> Self {
        Self::TypeMismatch {
            shaper: shaper.into(),
            stage: stage.into(),
        }
    }
}
