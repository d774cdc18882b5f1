//! Result of one evaluation run.

use crate::error::EvaluationError;
use condconf_protocol::{
    BoundVariable, Effect, ExecutedEffect, Level, NodeState, NodeTrace, Scope,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Non-fatal findings of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum EvaluationWarning {
    /// A property directive found no value and had no default.
    UnresolvedProperty {
        location: String,
        name: String,
        source: String,
    },
    /// A `${NAME}` placeholder had no value and no fallback.
    UndefinedPlaceholder { location: String, name: String },
}

impl fmt::Display for EvaluationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationWarning::UnresolvedProperty {
                location,
                name,
                source,
            } => write!(
                f,
                "property '{source}' for variable '{name}' at {location} has no value and no default"
            ),
            EvaluationWarning::UndefinedPlaceholder { location, name } => {
                write!(f, "placeholder '{name}' at {location} is undefined")
            }
        }
    }
}

/// Bound variables, executed effects, and diagnostics of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Variables in first-binding order; rebinding updates in place.
    pub variables: Vec<BoundVariable>,
    /// Effects in document order.
    pub effects: Vec<ExecutedEffect>,
    pub errors: Vec<EvaluationError>,
    pub warnings: Vec<EvaluationWarning>,
    /// Final state of every visited node, in visit order.
    pub nodes: Vec<NodeTrace>,
}

impl Evaluation {
    /// True when no error was recorded.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Value of a bound variable; `None` means unset.
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|variable| variable.name == name)
            .map(|variable| variable.value.as_str())
    }

    /// Variables bound with context scope.
    pub fn context_properties(&self) -> BTreeMap<&str, &str> {
        self.variables
            .iter()
            .filter(|variable| variable.scope == Scope::Context)
            .map(|variable| (variable.name.as_str(), variable.value.as_str()))
            .collect()
    }

    /// Logger level changes in document order.
    pub fn level_changes(&self) -> Vec<(&str, Option<Level>)> {
        self.effects
            .iter()
            .filter_map(|executed| match &executed.effect {
                Effect::SetLevel { logger, level } => Some((logger.as_str(), *level)),
                Effect::SetProperty { .. } => None,
            })
            .collect()
    }

    pub fn state_of(&self, location: &str) -> Option<NodeState> {
        self.nodes
            .iter()
            .find(|trace| trace.location == location)
            .map(|trace| trace.state)
    }

    pub(super) fn bind(&mut self, name: &str, value: String, scope: Scope) {
        match self
            .variables
            .iter_mut()
            .find(|variable| variable.name == name)
        {
            Some(existing) => {
                existing.value = value;
                existing.scope = scope;
            }
            None => self.variables.push(BoundVariable {
                name: name.to_string(),
                value,
                scope,
            }),
        }
    }
}
