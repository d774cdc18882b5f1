//! Loading of JSON5 configuration documents.
//!
//! A document is parsed, validated against the node schema, has its
//! `include` nodes replaced by the included documents' nodes, and is finally
//! decoded into a [`Document`].

mod schema;

use crate::ConfigError;
use crate::loader::utils;
use condconf_protocol::Document;
use log::{debug, info};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Label used in error locations for documents loaded from strings.
const INLINE_LABEL: &str = "inline";

/// Loads configuration documents from disk or memory.
#[derive(Debug, Clone, Default)]
pub struct DocumentLoader {
    base_dir: Option<PathBuf>,
}

impl DocumentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory that includes in string documents are resolved against.
    ///
    /// Defaults to the current directory.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Load a document from a JSON5 file; includes resolve next to it.
    pub fn load_from_path(&self, path: impl AsRef<Path>) -> Result<Document, ConfigError> {
        let path = path.as_ref();
        debug!("loading document (path={})", path.display());
        let mut value = read_document(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut stack = vec![utils::unique_path(path)];
        splice_document(&mut value, base_dir, &mut stack)?;
        decode(value, &path.display().to_string())
    }

    /// Load a document from a JSON5 string.
    pub fn load_from_str(&self, contents: &str) -> Result<Document, ConfigError> {
        let mut value: Value = json5::from_str(contents)?;
        schema::validate_document(&value, INLINE_LABEL)?;
        let base_dir = self
            .base_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        splice_document(&mut value, &base_dir, &mut Vec::new())?;
        decode(value, INLINE_LABEL)
    }
}

/// Read, parse, and validate one document file.
fn read_document(path: &Path) -> Result<Value, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let value: Value = json5::from_str(&contents)?;
    schema::validate_document(&value, &path.display().to_string())?;
    Ok(value)
}

fn decode(value: Value, label: &str) -> Result<Document, ConfigError> {
    let document: Document = serde_json::from_value(value)?;
    info!(
        "document loaded (source={}, nodes={})",
        label,
        document.nodes.len()
    );
    Ok(document)
}

/// Replace include nodes throughout a validated document.
fn splice_document(
    document: &mut Value,
    base_dir: &Path,
    stack: &mut Vec<PathBuf>,
) -> Result<(), ConfigError> {
    if let Some(nodes) = document.get_mut("nodes") {
        splice_nodes(nodes, base_dir, stack)?;
    }
    Ok(())
}

fn splice_nodes(
    nodes: &mut Value,
    base_dir: &Path,
    stack: &mut Vec<PathBuf>,
) -> Result<(), ConfigError> {
    let Value::Array(items) = nodes else {
        return Ok(());
    };
    let mut spliced = Vec::with_capacity(items.len());
    for mut node in std::mem::take(items) {
        if let Some(include) = node.get("include") {
            spliced.extend(load_include(include, base_dir, stack)?);
            continue;
        }
        if let Some(children) = node.get_mut("profile").and_then(|body| body.get_mut("nodes")) {
            splice_nodes(children, base_dir, stack)?;
        }
        if let Some(body) = node.get_mut("if") {
            for branch in ["then", "else"] {
                if let Some(children) = body.get_mut(branch) {
                    splice_nodes(children, base_dir, stack)?;
                }
            }
        }
        spliced.push(node);
    }
    *items = spliced;
    Ok(())
}

/// Resolve one include node into the included document's nodes.
fn load_include(
    include: &Value,
    base_dir: &Path,
    stack: &mut Vec<PathBuf>,
) -> Result<Vec<Value>, ConfigError> {
    let raw_path = include.get("path").and_then(Value::as_str).unwrap_or_default();
    let optional = include
        .get("optional")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let target = utils::resolve_relative(base_dir, Path::new(raw_path));
    if !target.exists() {
        if optional {
            debug!("skipping missing optional include (path={})", target.display());
            return Ok(Vec::new());
        }
        return Err(ConfigError::MissingInclude(target));
    }

    let key = utils::unique_path(&target);
    if stack.contains(&key) {
        return Err(ConfigError::IncludeCycle(target));
    }
    debug!("including document (path={})", target.display());
    let mut included = read_document(&target)?;
    stack.push(key);
    let include_dir = target.parent().unwrap_or(base_dir).to_path_buf();
    let result = splice_document(&mut included, &include_dir, stack);
    stack.pop();
    result?;

    match included.get_mut("nodes") {
        Some(Value::Array(nodes)) => Ok(std::mem::take(nodes)),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use condconf_protocol::Node;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("dir");
        }
        fs::write(&path, contents).expect("write");
        path
    }

    #[test]
    fn loads_nested_document_from_string() {
        let document = DocumentLoader::new()
            .load_from_str(
                r#"{
                    // comments are fine in JSON5
                    nodes: [
                        { property: { name: "MINE", source: "my.example-property", default: "bar" } },
                        { profile: { name: "production", nodes: [ { root: { level: "WARN" } } ] } },
                    ],
                }"#,
            )
            .expect("document");
        assert_eq!(document.nodes.len(), 2);
        assert_eq!(document.nodes[1].kind(), "profile");
    }

    #[test]
    fn reports_schema_errors_with_location() {
        let loader = DocumentLoader::new();
        let cases = [
            (r#"{ nodes: [ { logger: { name: "a" } } ] }"#, "inline:nodes[0].logger.level"),
            (r#"{ nodes: [ { bogus: {} } ] }"#, "inline:nodes[0].bogus"),
            (
                r#"{ nodes: [ { variable: { name: "a", value: "b", scope: "global" } } ] }"#,
                "inline:nodes[0].variable.scope",
            ),
            (
                r#"{ nodes: [ { profile: { name: "p", nodes: [ { root: {}, logger: {} } ] } } ] }"#,
                "inline:nodes[0].profile.nodes[0]",
            ),
            (r#"{ extra: 1 }"#, "inline:extra"),
        ];
        for (input, expected) in cases {
            let err = loader.load_from_str(input).unwrap_err();
            match err {
                ConfigError::InvalidField { path, .. } => assert_eq!(path, expected),
                other => panic!("unexpected error for {input}: {other}"),
            }
        }
    }

    #[test]
    fn splices_includes_relative_to_the_including_file() {
        let temp = TempDir::new().expect("tmp");
        write(
            temp.path(),
            "parts/levels.json5",
            r#"{ nodes: [ { logger: { name: "org.example", level: "DEBUG" } } ] }"#,
        );
        let main = write(
            temp.path(),
            "main.json5",
            r#"{ nodes: [
                { root: { level: "INFO" } },
                { profile: { name: "dev", nodes: [ { include: { path: "parts/levels.json5" } } ] } },
                { include: { path: "missing.json5", optional: true } },
            ] }"#,
        );

        let document = DocumentLoader::new().load_from_path(&main).expect("document");
        assert_eq!(
            document.nodes,
            vec![
                Node::root("INFO"),
                Node::profile("dev", vec![Node::logger("org.example", "DEBUG")]),
            ]
        );
    }

    #[test]
    fn string_documents_resolve_includes_against_base_dir() {
        let temp = TempDir::new().expect("tmp");
        write(
            temp.path(),
            "shared.json5",
            r#"{ nodes: [ { variable: { name: "A", value: "1" } } ] }"#,
        );
        let document = DocumentLoader::new()
            .with_base_dir(temp.path())
            .load_from_str(r#"{ nodes: [ { include: { path: "shared.json5" } } ] }"#)
            .expect("document");
        assert_eq!(document.nodes, vec![Node::variable("A", "1")]);
    }

    #[test]
    fn rejects_missing_required_include() {
        let temp = TempDir::new().expect("tmp");
        let main = write(
            temp.path(),
            "main.json5",
            r#"{ nodes: [ { include: { path: "nope.json5" } } ] }"#,
        );
        let err = DocumentLoader::new().load_from_path(&main).unwrap_err();
        assert!(matches!(err, ConfigError::MissingInclude(path) if path.ends_with("nope.json5")));
    }

    #[test]
    fn rejects_include_cycles() {
        let temp = TempDir::new().expect("tmp");
        write(
            temp.path(),
            "b.json5",
            r#"{ nodes: [ { include: { path: "a.json5" } } ] }"#,
        );
        let a = write(
            temp.path(),
            "a.json5",
            r#"{ nodes: [ { include: { path: "b.json5" } } ] }"#,
        );
        let err = DocumentLoader::new().load_from_path(&a).unwrap_err();
        assert!(matches!(err, ConfigError::IncludeCycle(_)));
    }

    #[test]
    fn same_file_may_be_included_twice_without_cycle() {
        let temp = TempDir::new().expect("tmp");
        write(
            temp.path(),
            "leaf.json5",
            r#"{ nodes: [ { root: { level: "OFF" } } ] }"#,
        );
        let main = write(
            temp.path(),
            "main.json5",
            r#"{ nodes: [ { include: { path: "leaf.json5" } }, { include: { path: "leaf.json5" } } ] }"#,
        );
        let document = DocumentLoader::new().load_from_path(&main).expect("document");
        assert_eq!(document.nodes, vec![Node::root("OFF"), Node::root("OFF")]);
    }
}
