//! Property sources backing an environment.

use crate::name::{PropertyName, canonicalize};
use std::collections::BTreeMap;
use std::fmt;

/// A named provider of string properties.
///
/// Implementations receive the requested key already canonicalized and must
/// answer from their own entries only; priority between sources is handled by
/// the [`Environment`](crate::Environment).
pub trait PropertySource: Send + Sync + fmt::Debug {
    /// Stable name used in logs and layer metadata.
    fn name(&self) -> &str;

    /// Look up a property by relaxed name.
    fn lookup(&self, name: &PropertyName) -> Option<&str>;
}

/// Entries grouped by a lookup form.
///
/// Several original keys can share one form; lookups then prefer the original
/// that equals the requested text, and otherwise the smallest original key, so
/// the answer never depends on insertion order.
#[derive(Debug, Clone, Default)]
struct RelaxedIndex {
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl RelaxedIndex {
    fn insert(&mut self, form: String, original: String, value: String) {
        self.entries
            .entry(form)
            .or_default()
            .insert(original, value);
    }

    fn get(&self, form: &str, requested: &str) -> Option<&str> {
        let candidates = self.entries.get(form)?;
        candidates
            .get(requested)
            .or_else(|| candidates.values().next())
            .map(String::as_str)
    }

    fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }
}

/// In-memory property source built from key/value pairs.
#[derive(Debug, Clone)]
pub struct MapPropertySource {
    name: String,
    index: RelaxedIndex,
}

impl MapPropertySource {
    pub fn new<I, K, V>(name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut index = RelaxedIndex::default();
        for (key, value) in entries {
            let key = key.into();
            index.insert(canonicalize(&key), key, value.into());
        }
        Self {
            name: name.into(),
            index,
        }
    }

    /// Number of distinct original keys held by this source.
    pub fn len(&self) -> usize {
        self.index.len()
    }
}

impl PropertySource for MapPropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, name: &PropertyName) -> Option<&str> {
        self.index.get(name.canonical(), name.original())
    }
}

/// Property source over environment variables.
///
/// A requested key matches a variable spelled in upper snake case
/// (`my.example-property` matches `MY_EXAMPLE_PROPERTY`); variables that use
/// property syntax directly are matched by their canonical form.
#[derive(Debug, Clone)]
pub struct SystemEnvironmentSource {
    name: String,
    by_env_name: RelaxedIndex,
    by_canonical: RelaxedIndex,
}

impl SystemEnvironmentSource {
    /// Source name used for the process environment.
    pub const NAME: &'static str = "systemEnvironment";

    /// Snapshot the current process environment.
    pub fn from_process() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut by_env_name = RelaxedIndex::default();
        let mut by_canonical = RelaxedIndex::default();
        for (key, value) in vars {
            let key = key.into();
            let value = value.into();
            by_env_name.insert(key.to_ascii_uppercase(), key.clone(), value.clone());
            by_canonical.insert(canonicalize(&key), key, value);
        }
        Self {
            name: Self::NAME.to_string(),
            by_env_name,
            by_canonical,
        }
    }
}

impl PropertySource for SystemEnvironmentSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, name: &PropertyName) -> Option<&str> {
        let env_name = name.env_var_form();
        self.by_env_name
            .get(&env_name, &env_name)
            .or_else(|| self.by_canonical.get(name.canonical(), name.original()))
    }
}
