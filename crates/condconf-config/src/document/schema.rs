//! Schema validation for configuration documents.
//!
//! Runs on the raw JSON value before decoding so that errors carry a
//! `label:path` location instead of a serde message.

use crate::ConfigError;
use serde_json::{Map, Value};

const NODE_KINDS: [&str; 7] = [
    "property", "variable", "logger", "root", "profile", "if", "include",
];

/// Validate a whole document.
pub(super) fn validate_document(value: &Value, label: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, label, "")?;
    ensure_allowed_keys(map, &["$schema", "nodes"], label, "")?;
    if let Some(value) = map.get("$schema") {
        expect_string(value, label, "$schema")?;
    }
    if let Some(value) = map.get("nodes") {
        validate_nodes(value, label, "nodes")?;
    }
    Ok(())
}

/// Validate an ordered list of nodes.
fn validate_nodes(value: &Value, label: &str, path: &str) -> Result<(), ConfigError> {
    let nodes = expect_array(value, label, path)?;
    for (idx, node) in nodes.iter().enumerate() {
        validate_node(node, label, &format!("{path}[{idx}]"))?;
    }
    Ok(())
}

/// Validate a single externally tagged node.
fn validate_node(value: &Value, label: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, label, path)?;
    ensure_allowed_keys(map, &NODE_KINDS, label, path)?;
    let mut entries = map.iter();
    let (kind, body) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        (None, _) => return Err(invalid_field(label, path, "expected a node kind")),
        (Some(_), Some(_)) => {
            return Err(invalid_field(label, path, "expected exactly one node kind"));
        }
    };
    let path = join_path(path, kind);
    let body = expect_object(body, label, &path)?;
    match kind.as_str() {
        "property" => {
            ensure_allowed_keys(body, &["name", "source", "default", "scope"], label, &path)?;
            require_string(body, "name", label, &path)?;
            require_string(body, "source", label, &path)?;
            optional_string(body, "default", label, &path)?;
            validate_scope(body, label, &path)
        }
        "variable" => {
            ensure_allowed_keys(body, &["name", "value", "scope"], label, &path)?;
            require_string(body, "name", label, &path)?;
            require_string(body, "value", label, &path)?;
            validate_scope(body, label, &path)
        }
        "logger" => {
            ensure_allowed_keys(body, &["name", "level"], label, &path)?;
            require_string(body, "name", label, &path)?;
            require_string(body, "level", label, &path)
        }
        "root" => {
            ensure_allowed_keys(body, &["level"], label, &path)?;
            require_string(body, "level", label, &path)
        }
        "profile" => {
            ensure_allowed_keys(body, &["name", "nodes"], label, &path)?;
            require_string(body, "name", label, &path)?;
            if let Some(value) = body.get("nodes") {
                validate_nodes(value, label, &join_path(&path, "nodes"))?;
            }
            Ok(())
        }
        "if" => {
            ensure_allowed_keys(body, &["condition", "then", "else"], label, &path)?;
            require_string(body, "condition", label, &path)?;
            for branch in ["then", "else"] {
                if let Some(value) = body.get(branch) {
                    validate_nodes(value, label, &join_path(&path, branch))?;
                }
            }
            Ok(())
        }
        "include" => {
            ensure_allowed_keys(body, &["path", "optional"], label, &path)?;
            require_string(body, "path", label, &path)?;
            if let Some(value) = body.get("optional") {
                expect_bool(value, label, &join_path(&path, "optional"))?;
            }
            Ok(())
        }
        _ => Err(invalid_field(label, &path, "unknown node kind")),
    }
}

/// Validate the optional `scope` field.
fn validate_scope(map: &Map<String, Value>, label: &str, path: &str) -> Result<(), ConfigError> {
    let Some(value) = map.get("scope") else {
        return Ok(());
    };
    let path = join_path(path, "scope");
    match value.as_str() {
        Some("local" | "context") => Ok(()),
        Some(_) => Err(invalid_field(label, &path, "expected one of: local, context")),
        None => Err(invalid_field(label, &path, "expected string")),
    }
}

/// Require a string field.
fn require_string(
    map: &Map<String, Value>,
    key: &str,
    label: &str,
    path: &str,
) -> Result<(), ConfigError> {
    let field_path = join_path(path, key);
    let Some(value) = map.get(key) else {
        return Err(invalid_field(label, &field_path, "missing required field"));
    };
    expect_string(value, label, &field_path)
}

fn optional_string(
    map: &Map<String, Value>,
    key: &str,
    label: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match map.get(key) {
        Some(value) => expect_string(value, label, &join_path(path, key)),
        None => Ok(()),
    }
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    label: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(label, path, "expected object")),
    }
}

/// Expect a JSON array or return a typed error.
fn expect_array<'a>(
    value: &'a Value,
    label: &str,
    path: &str,
) -> Result<&'a Vec<Value>, ConfigError> {
    match value {
        Value::Array(arr) => Ok(arr),
        _ => Err(invalid_field(label, path, "expected array")),
    }
}

/// Expect a JSON string or return a typed error.
fn expect_string(value: &Value, label: &str, path: &str) -> Result<(), ConfigError> {
    if value.as_str().is_some() {
        Ok(())
    } else {
        Err(invalid_field(label, path, "expected string"))
    }
}

/// Expect a JSON boolean or return a typed error.
fn expect_bool(value: &Value, label: &str, path: &str) -> Result<(), ConfigError> {
    if matches!(value, Value::Bool(_)) {
        Ok(())
    } else {
        Err(invalid_field(label, path, "expected bool"))
    }
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    label: &str,
    path: &str,
) -> Result<(), ConfigError> {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(invalid_field(label, &join_path(path, key), "unknown key"));
        }
    }
    Ok(())
}

/// Join nested paths for better error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
fn invalid_field(label: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{label}:{normalized_path}"),
        message: message.to_string(),
    }
}
