//! Flattening of nested JSON property files into dotted keys.

use crate::ConfigError;
use serde_json::Value;

/// Flatten a property document into `(key, value)` pairs.
///
/// Objects join keys with `.`, arrays append `[index]`, scalars are
/// stringified, and `null` entries are skipped.
pub(super) fn flatten_properties(
    value: &Value,
    label: &str,
) -> Result<Vec<(String, String)>, ConfigError> {
    let Value::Object(map) = value else {
        return Err(ConfigError::InvalidField {
            path: format!("{label}:root"),
            message: "expected object".to_string(),
        });
    };
    let mut entries = Vec::new();
    for (key, value) in map {
        flatten_into(key.clone(), value, &mut entries);
    }
    Ok(entries)
}

fn flatten_into(prefix: String, value: &Value, entries: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                flatten_into(format!("{prefix}.{key}"), value, entries);
            }
        }
        Value::Array(items) => {
            for (idx, value) in items.iter().enumerate() {
                flatten_into(format!("{prefix}[{idx}]"), value, entries);
            }
        }
        Value::String(text) => entries.push((prefix, text.clone())),
        Value::Bool(flag) => entries.push((prefix, flag.to_string())),
        Value::Number(number) => entries.push((prefix, number.to_string())),
        Value::Null => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn flattens_nested_objects_and_arrays() {
        let value = json!({
            "my": { "example-property": "test", "enabled": true },
            "servers": [ { "port": 8080 }, { "port": 8081 } ],
            "logging.level.root": "INFO",
            "unset": null,
        });
        let mut entries = flatten_properties(&value, "test").expect("entries");
        entries.sort();
        assert_eq!(
            entries,
            vec![
                ("logging.level.root".to_string(), "INFO".to_string()),
                ("my.enabled".to_string(), "true".to_string()),
                ("my.example-property".to_string(), "test".to_string()),
                ("servers[0].port".to_string(), "8080".to_string()),
                ("servers[1].port".to_string(), "8081".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_non_object_roots() {
        let err = flatten_properties(&json!(["a"]), "user(app.json5)").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid config at user(app.json5):root: expected object"
        );
    }
}
