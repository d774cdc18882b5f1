//! Rendering of evaluation results for the command line.

use condconf::Environment;
use condconf::core::{Evaluation, EvaluationWarning};
use condconf::protocol::{BoundVariable, Effect, ExecutedEffect, NodeTrace, Scope};
use serde::Serialize;

#[derive(Serialize)]
struct Report<'a> {
    profiles: Vec<&'a str>,
    variables: &'a [BoundVariable],
    effects: &'a [ExecutedEffect],
    warnings: &'a [EvaluationWarning],
    errors: Vec<ErrorEntry>,
    nodes: &'a [NodeTrace],
}

#[derive(Serialize)]
struct ErrorEntry {
    location: String,
    message: String,
}

pub(crate) fn render_json(
    evaluation: &Evaluation,
    environment: &Environment,
) -> serde_json::Result<String> {
    let report = Report {
        profiles: environment.effective_profiles().into_iter().collect(),
        variables: &evaluation.variables,
        effects: &evaluation.effects,
        warnings: &evaluation.warnings,
        errors: evaluation
            .errors
            .iter()
            .map(|err| ErrorEntry {
                location: err.location().to_string(),
                message: err.to_string(),
            })
            .collect(),
        nodes: &evaluation.nodes,
    };
    serde_json::to_string_pretty(&report)
}

pub(crate) fn render_text(evaluation: &Evaluation, environment: &Environment) -> String {
    let mut out = String::new();
    let profiles: Vec<&str> = environment.effective_profiles().into_iter().collect();
    out.push_str(&format!("profiles: {}\n", profiles.join(", ")));

    let context = evaluation.context_properties();
    if !context.is_empty() {
        out.push_str("context:\n");
        for (name, value) in context {
            out.push_str(&format!("  {name}={value}\n"));
        }
    }
    if !evaluation.effects.is_empty() {
        out.push_str("effects:\n");
        for executed in &evaluation.effects {
            out.push_str(&format!(
                "  {} {}\n",
                executed.location,
                describe(&executed.effect)
            ));
        }
    }
    if !evaluation.warnings.is_empty() {
        out.push_str("warnings:\n");
        for warning in &evaluation.warnings {
            out.push_str(&format!("  {warning}\n"));
        }
    }
    if !evaluation.errors.is_empty() {
        out.push_str("errors:\n");
        for error in &evaluation.errors {
            out.push_str(&format!("  {error}\n"));
        }
    }
    out.trim_end().to_string()
}

fn describe(effect: &Effect) -> String {
    match effect {
        Effect::SetLevel {
            logger,
            level: Some(level),
        } => format!("level {logger}={level}"),
        Effect::SetLevel { logger, level: None } => format!("level {logger}=INHERITED"),
        Effect::SetProperty { name, value, scope } => {
            let scope = match scope {
                Scope::Local => "local",
                Scope::Context => "context",
            };
            format!("set {name}={value} ({scope})")
        }
    }
}
