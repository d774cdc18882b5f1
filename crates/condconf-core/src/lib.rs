//! Evaluation engine for conditional configuration documents.
//!
//! This crate owns profile expressions, relaxed property resolution,
//! placeholder substitution, `if` conditions, and the tree evaluator that
//! turns a [`Document`](condconf_protocol::Document) plus an
//! [`Environment`](condconf_config::Environment) into an [`Evaluation`].

pub mod condition;
pub mod error;
pub mod evaluator;
pub mod placeholder;
pub mod profiles;
pub mod resolver;

/// Error types for expressions and evaluation runs.
pub use error::{EvaluationError, ExpressionError};
/// Tree evaluation entry points and results.
pub use evaluator::{Evaluation, EvaluationWarning, Evaluator, evaluate};
/// Profile expression parsing and matching.
pub use profiles::{ProfileExpression, Profiles};
/// Relaxed property lookup.
pub use resolver::{PropertyResolver, resolve};
