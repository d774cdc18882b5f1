//! Error types for the evaluation crate.

use condconf_protocol::LevelError;
use thiserror::Error;

/// A parse failure inside a profile expression or condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at offset {position})")]
pub struct ExpressionError {
    /// Byte offset of the offending token.
    pub position: usize,
    pub message: String,
}

/// Deepest `!`/parenthesis nesting the expression parsers accept.
pub(crate) const MAX_NESTING_DEPTH: usize = 128;

impl ExpressionError {
    pub(crate) fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn too_deep(position: usize) -> Self {
        Self::new(position, "expression nested too deeply")
    }
}

/// Errors recorded while evaluating a document.
///
/// Each error is fatal to the subtree of the node at `location` only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// A profile gate could not be parsed.
    #[error("invalid profile expression '{expression}' at {location}: {source}")]
    InvalidExpression {
        expression: String,
        location: String,
        #[source]
        source: ExpressionError,
    },
    /// An `if` condition could not be parsed.
    #[error("invalid condition '{condition}' at {location}: {source}")]
    InvalidCondition {
        condition: String,
        location: String,
        #[source]
        source: ExpressionError,
    },
    /// A level directive named no known level.
    #[error("invalid level '{level}' at {location}")]
    InvalidLevel {
        level: String,
        location: String,
        #[source]
        source: LevelError,
    },
}

impl EvaluationError {
    /// Location of the node that failed, e.g. `nodes[1].nodes[0]`.
    pub fn location(&self) -> &str {
        match self {
            EvaluationError::InvalidExpression { location, .. }
            | EvaluationError::InvalidCondition { location, .. }
            | EvaluationError::InvalidLevel { location, .. } => location,
        }
    }
}
