//! Document model and evaluation output types shared by condconf crates.

mod level;
mod outcome;

pub use level::{Level, LevelError, ROOT_LOGGER_NAME, parse_level_setting};
pub use outcome::{BoundVariable, Effect, ExecutedEffect, NodeState, NodeTrace};

use serde::{Deserialize, Serialize};

/// A parsed configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Document {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    /// Top-level nodes in document order.
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl Document {
    /// Build a document from top-level nodes.
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            schema: None,
            nodes,
        }
    }
}

/// A single node of the configuration tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Bind a variable from an environment property.
    Property(PropertyDirective),
    /// Bind a variable to a literal (substituted) value.
    Variable(VariableDirective),
    /// Change the level of a named logger.
    Logger(LoggerDirective),
    /// Change the level of the root logger.
    Root(RootDirective),
    /// Children gated by a profile expression.
    Profile(ProfileBlock),
    /// Children gated by a property condition.
    If(IfBlock),
}

impl Node {
    /// Short node kind used in logs and locations.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Property(_) => "property",
            Node::Variable(_) => "variable",
            Node::Logger(_) => "logger",
            Node::Root(_) => "root",
            Node::Profile(_) => "profile",
            Node::If(_) => "if",
        }
    }

    pub fn property(name: impl Into<String>, source: impl Into<String>) -> Self {
        Node::Property(PropertyDirective::new(name, source))
    }

    pub fn variable(name: impl Into<String>, value: impl Into<String>) -> Self {
        Node::Variable(VariableDirective {
            name: name.into(),
            value: value.into(),
            scope: Scope::default(),
        })
    }

    pub fn logger(name: impl Into<String>, level: impl Into<String>) -> Self {
        Node::Logger(LoggerDirective {
            name: name.into(),
            level: level.into(),
        })
    }

    pub fn root(level: impl Into<String>) -> Self {
        Node::Root(RootDirective {
            level: level.into(),
        })
    }

    pub fn profile(name: impl Into<String>, nodes: Vec<Node>) -> Self {
        Node::Profile(ProfileBlock {
            name: name.into(),
            nodes,
        })
    }

    pub fn when(condition: impl Into<String>, then: Vec<Node>, otherwise: Vec<Node>) -> Self {
        Node::If(IfBlock {
            condition: condition.into(),
            then,
            otherwise,
        })
    }
}

/// Visibility of a bound variable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Visible to substitution for the rest of the run only.
    #[default]
    Local,
    /// Exported with the run's context properties.
    Context,
}

/// Declares a variable bound to an environment property.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertyDirective {
    /// Variable name to bind.
    pub name: String,
    /// Environment key, matched with relaxed rules.
    pub source: String,
    /// Value used when the source is absent or empty.
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub scope: Scope,
}

impl PropertyDirective {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            default: None,
            scope: Scope::default(),
        }
    }

    /// Set the fallback value.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set the variable scope.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }
}

impl From<PropertyDirective> for Node {
    fn from(directive: PropertyDirective) -> Self {
        Node::Property(directive)
    }
}

/// Declares a variable with a literal value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariableDirective {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub scope: Scope,
}

/// Sets the level of a named logger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggerDirective {
    pub name: String,
    /// Level text; substituted and parsed at evaluation time.
    pub level: String,
}

/// Sets the level of the root logger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RootDirective {
    pub level: String,
}

/// Children applied only when the profile expression matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileBlock {
    /// Raw profile expression, e.g. `production | test`.
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

/// Children chosen by a condition over bound properties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IfBlock {
    /// Raw condition, e.g. `property("MINE").contains("true")`.
    pub condition: String,
    #[serde(default)]
    pub then: Vec<Node>,
    #[serde(default, rename = "else")]
    pub otherwise: Vec<Node>,
}
