use thiserror::Error;

/// Violations of the tree's structural invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Node '{name}' is attached to more than one parent")]
    DuplicateParent { name: String },

    #[error("Cycle detected involving '{0}'")]
    Cycle(String),

    #[error("Root node '{0}' cannot be re-parented or removed")]
    ReparentRoot(String),

    #[error("Mapping has more than one root: '{first}' and '{second}'")]
    MultipleRoots { first: String, second: String },

    #[error("Mapping has no root entry")]
    MissingRoot,

    #[error("Entry '{key}' refers to unknown parent '{parent}'")]
    UnknownParent { key: String, parent: String },

    #[error("Invalid mapping key '{key}': {message}")]
    InvalidKey { key: String, message: String },

    #[error("Node '{0}' is not part of this tree")]
    NotInTree(String),
}

impl TreeError {
    pub fn invalid_key(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            message: message.into(),
        }
    }
}
