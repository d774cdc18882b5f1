//! Output types produced by an evaluation run.

use crate::{Level, Scope};
use serde::{Deserialize, Serialize};

/// Evaluation state of a node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Never reached; only left behind by a fail-fast halt.
    Pending,
    /// Gate was false, or an ancestor was not active.
    Skipped,
    /// Gate was true (or absent) and every ancestor was active.
    Active,
    /// Reached, but its gate or directive could not be evaluated.
    Failed,
}

/// Final state of one node, keyed by its location in the document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeTrace {
    pub location: String,
    pub kind: String,
    pub state: NodeState,
}

/// A variable bound during a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoundVariable {
    pub name: String,
    pub value: String,
    pub scope: Scope,
}

/// A side effect requested by an executed directive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Effect {
    /// Set (or reset, when `level` is `None`) a logger threshold.
    SetLevel {
        logger: String,
        level: Option<Level>,
    },
    /// Set a variable in the given scope.
    SetProperty {
        name: String,
        value: String,
        scope: Scope,
    },
}

/// An effect together with the location of the directive that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutedEffect {
    pub location: String,
    #[serde(flatten)]
    pub effect: Effect,
}
