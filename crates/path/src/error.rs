use thiserror::Error;

/// Syntax errors raised while compiling a path expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Unbalanced '{bracket}' at position {position} in '{expression}'")]
    UnbalancedBracket {
        expression: String,
        position: usize,
        bracket: char,
    },

    #[error("Invalid escape sequence at position {position} in '{expression}'")]
    InvalidEscape { expression: String, position: usize },

    #[error("Invalid regex '{pattern}' in '{expression}': {message}")]
    InvalidRegex {
        expression: String,
        pattern: String,
        message: String,
    },

    #[error("Fuzzy threshold '{threshold}' in '{expression}' must be a number between 0 and 1")]
    FuzzyThreshold {
        expression: String,
        threshold: String,
    },

    #[error("Empty segment at position {position} in '{expression}'")]
    EmptySegment { expression: String, position: usize },

    #[error("Invalid filter '[{filter}]' in '{expression}': {message}")]
    InvalidFilter {
        expression: String,
        filter: String,
        message: String,
    },
}

impl PathError {
    pub fn unbalanced(expression: impl Into<String>, position: usize, bracket: char) -> Self {
        Self::UnbalancedBracket {
            expression: expression.into(),
            position,
            bracket,
        }
    }

    pub fn empty_segment(expression: impl Into<String>, position: usize) -> Self {
        Self::EmptySegment {
            expression: expression.into(),
            position,
        }
    }

    pub fn invalid_filter(
        expression: impl Into<String>,
        filter: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidFilter {
            expression: expression.into(),
            filter: filter.into(),
            message: message.into(),
        }
    }

    /// The expression the error was raised for.
    pub fn expression(&self) -> &str {
        match self {
            Self::UnbalancedBracket { expression, .. }
            | Self::InvalidEscape { expression, .. }
            | Self::InvalidRegex { expression, .. }
            | Self::FuzzyThreshold { expression, .. }
            | Self::EmptySegment { expression, .. }
            | Self::InvalidFilter { expression, .. } => expression,
        }
    }
}
