//! Single-pass evaluation of a configuration document.
//!
//! Nodes are visited depth first in document order. A node is active when its
//! own gate holds and its parent is active; descendants of an inactive node
//! are recorded as skipped without parsing their gates. Errors are fatal to
//! the failing node's subtree only, unless fail-fast is requested; nodes the
//! halted walk never reached stay pending.

mod evaluation;

pub use evaluation::{Evaluation, EvaluationWarning};

use crate::condition::Condition;
use crate::error::EvaluationError;
use crate::placeholder;
use crate::profiles::Profiles;
use crate::resolver::PropertyResolver;
use condconf_config::Environment;
use condconf_protocol::{
    Document, Effect, ExecutedEffect, IfBlock, Node, NodeState, NodeTrace, ProfileBlock,
    PropertyDirective, ROOT_LOGGER_NAME, Scope, parse_level_setting,
};
use log::{debug, info, warn};
use std::collections::BTreeSet;

/// Evaluate `document` against `environment`, collecting errors.
pub fn evaluate(document: &Document, environment: &Environment) -> Evaluation {
    Evaluator::new(environment).evaluate(document)
}

/// Evaluates documents against one environment.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'env> {
    environment: &'env Environment,
    fail_fast: bool,
}

impl<'env> Evaluator<'env> {
    pub fn new(environment: &'env Environment) -> Self {
        Self {
            environment,
            fail_fast: false,
        }
    }

    /// Stop at the first error instead of collecting.
    pub fn fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }

    /// Run the document. In fail-fast mode the walk stops at the first error,
    /// which is the only entry in `errors`.
    pub fn evaluate(&self, document: &Document) -> Evaluation {
        let mut run = Run {
            resolver: PropertyResolver::new(self.environment),
            profiles: self.environment.effective_profiles(),
            fail_fast: self.fail_fast,
            halted: false,
            evaluation: Evaluation::default(),
        };
        debug!(
            "evaluating document (nodes={}, profiles={:?}, fail_fast={})",
            document.nodes.len(),
            run.profiles,
            self.fail_fast
        );
        run.nodes(&document.nodes, "", "nodes", true);
        let evaluation = run.evaluation;
        info!(
            "evaluation finished (nodes={}, variables={}, effects={}, warnings={}, errors={})",
            evaluation.nodes.len(),
            evaluation.variables.len(),
            evaluation.effects.len(),
            evaluation.warnings.len(),
            evaluation.errors.len()
        );
        evaluation
    }

    /// Like [`Evaluator::evaluate`], but in fail-fast mode the first error is
    /// returned as `Err`.
    pub fn run(&self, document: &Document) -> Result<Evaluation, EvaluationError> {
        let evaluation = self.evaluate(document);
        if self.fail_fast
            && let Some(error) = evaluation.errors.first()
        {
            return Err(error.clone());
        }
        Ok(evaluation)
    }
}

/// Mutable state of one run.
struct Run<'env> {
    resolver: PropertyResolver<'env>,
    profiles: BTreeSet<&'env str>,
    fail_fast: bool,
    halted: bool,
    evaluation: Evaluation,
}

impl Run<'_> {
    fn nodes(&mut self, nodes: &[Node], parent: &str, field: &str, active: bool) {
        for (idx, node) in nodes.iter().enumerate() {
            let location = if parent.is_empty() {
                format!("{field}[{idx}]")
            } else {
                format!("{parent}.{field}[{idx}]")
            };
            if !active {
                self.skip(node, location);
            } else if self.halted {
                self.unreached(node, location);
            } else {
                self.visit(node, location);
            }
        }
    }

    /// Nodes after a fail-fast halt keep their initial state, and so do
    /// their descendants while the run stays halted.
    fn unreached(&mut self, node: &Node, location: String) {
        self.trace(node, &location, NodeState::Pending);
        self.children(node, &location, true, true);
    }

    fn skip(&mut self, node: &Node, location: String) {
        debug!("node skipped (location={location}, kind={})", node.kind());
        self.trace(node, &location, NodeState::Skipped);
        self.children(node, &location, false, false);
    }

    /// Walk a block's children; `then_active` applies to profile nodes and
    /// `then` branches, `else_active` to `else` branches.
    fn children(&mut self, node: &Node, location: &str, then_active: bool, else_active: bool) {
        match node {
            Node::Profile(block) => self.nodes(&block.nodes, location, "nodes", then_active),
            Node::If(block) => {
                self.nodes(&block.then, location, "then", then_active);
                self.nodes(&block.otherwise, location, "else", else_active);
            }
            _ => {}
        }
    }

    fn visit(&mut self, node: &Node, location: String) {
        match node {
            Node::Property(directive) => self.property(node, directive, &location),
            Node::Variable(directive) => {
                let value = self.substitute(&directive.value, &location);
                self.bind(&directive.name, value, directive.scope, &location);
                self.trace(node, &location, NodeState::Active);
            }
            Node::Logger(directive) => {
                self.set_level(node, &directive.name, &directive.level, &location);
            }
            Node::Root(directive) => {
                self.set_level(node, ROOT_LOGGER_NAME, &directive.level, &location);
            }
            Node::Profile(block) => self.profile(node, block, &location),
            Node::If(block) => self.condition(node, block, &location),
        }
    }

    fn property(&mut self, node: &Node, directive: &PropertyDirective, location: &str) {
        let resolved = self.resolver.resolve(&directive.source);
        let value = match (resolved, &directive.default) {
            (Some(value), _) if !value.is_empty() => Some(value.to_string()),
            (_, Some(default)) => Some(self.substitute(default, location)),
            (found, None) => found.map(str::to_string),
        };
        match value {
            Some(value) => self.bind(&directive.name, value, directive.scope, location),
            None => {
                warn!(
                    "property has no value (location={location}, name={}, source={})",
                    directive.name, directive.source
                );
                self.evaluation
                    .warnings
                    .push(EvaluationWarning::UnresolvedProperty {
                        location: location.to_string(),
                        name: directive.name.clone(),
                        source: directive.source.clone(),
                    });
            }
        }
        self.trace(node, location, NodeState::Active);
    }

    fn set_level(&mut self, node: &Node, logger: &str, raw: &str, location: &str) {
        let text = self.substitute(raw, location);
        match parse_level_setting(&text) {
            Ok(level) => {
                debug!("level change (location={location}, logger={logger}, level={level:?})");
                self.effect(
                    location,
                    Effect::SetLevel {
                        logger: logger.to_string(),
                        level,
                    },
                );
                self.trace(node, location, NodeState::Active);
            }
            Err(source) => {
                self.trace(node, location, NodeState::Failed);
                self.fail(EvaluationError::InvalidLevel {
                    level: text,
                    location: location.to_string(),
                    source,
                });
            }
        }
    }

    fn profile(&mut self, node: &Node, block: &ProfileBlock, location: &str) {
        match Profiles::parse(&block.name) {
            Ok(profiles) => {
                let matched = profiles.matches(&self.profiles);
                debug!(
                    "profile gate (location={location}, expression={}, matched={matched})",
                    block.name
                );
                let state = if matched {
                    NodeState::Active
                } else {
                    NodeState::Skipped
                };
                self.trace(node, location, state);
                self.children(node, location, matched, false);
            }
            Err(source) => {
                self.trace(node, location, NodeState::Failed);
                self.fail(EvaluationError::InvalidExpression {
                    expression: block.name.clone(),
                    location: location.to_string(),
                    source,
                });
                self.children(node, location, false, false);
            }
        }
    }

    fn condition(&mut self, node: &Node, block: &IfBlock, location: &str) {
        match Condition::parse(&block.condition) {
            Ok(condition) => {
                let holds = condition.evaluate(&|name: &str| self.lookup(name));
                debug!(
                    "condition (location={location}, condition={}, holds={holds})",
                    block.condition
                );
                self.trace(node, location, NodeState::Active);
                self.children(node, location, holds, !holds);
            }
            Err(source) => {
                self.trace(node, location, NodeState::Failed);
                self.fail(EvaluationError::InvalidCondition {
                    condition: block.condition.clone(),
                    location: location.to_string(),
                    source,
                });
                self.children(node, location, false, false);
            }
        }
    }

    /// Bound variables first, then the environment.
    fn lookup(&self, name: &str) -> Option<String> {
        self.evaluation
            .variable(name)
            .or_else(|| self.resolver.resolve(name))
            .map(str::to_string)
    }

    fn substitute(&mut self, text: &str, location: &str) -> String {
        let result = placeholder::substitute(text, |name| self.lookup(name));
        for name in result.undefined {
            warn!("undefined placeholder (location={location}, name={name})");
            self.evaluation
                .warnings
                .push(EvaluationWarning::UndefinedPlaceholder {
                    location: location.to_string(),
                    name,
                });
        }
        result.value
    }

    fn bind(&mut self, name: &str, value: String, scope: Scope, location: &str) {
        debug!("variable bound (location={location}, name={name}, scope={scope:?})");
        self.evaluation.bind(name, value.clone(), scope);
        self.effect(
            location,
            Effect::SetProperty {
                name: name.to_string(),
                value,
                scope,
            },
        );
    }

    fn effect(&mut self, location: &str, effect: Effect) {
        self.evaluation.effects.push(ExecutedEffect {
            location: location.to_string(),
            effect,
        });
    }

    fn trace(&mut self, node: &Node, location: &str, state: NodeState) {
        self.evaluation.nodes.push(NodeTrace {
            location: location.to_string(),
            kind: node.kind().to_string(),
            state,
        });
    }

    fn fail(&mut self, error: EvaluationError) {
        warn!("{error}");
        self.evaluation.errors.push(error);
        if self.fail_fast {
            self.halted = true;
        }
    }
}
