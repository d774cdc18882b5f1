//! Active profiles plus priority-ordered property sources.

use crate::source::{MapPropertySource, PropertySource};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Profile considered active when no profile is explicitly active.
pub const DEFAULT_PROFILE: &str = "default";

/// A property source with its priority.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    /// Higher values win.
    pub priority: i32,
    pub source: Arc<dyn PropertySource>,
}

/// Immutable inputs for one evaluation run.
///
/// Sources are ordered highest priority first; equal priorities keep the order
/// in which they were added.
#[derive(Debug, Clone)]
pub struct Environment {
    active_profiles: Vec<String>,
    default_profiles: Vec<String>,
    sources: Vec<SourceEntry>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Environment {
    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::default()
    }

    /// Profiles explicitly activated, in activation order.
    pub fn active_profiles(&self) -> &[String] {
        &self.active_profiles
    }

    /// Profiles used when none is active.
    pub fn default_profiles(&self) -> &[String] {
        &self.default_profiles
    }

    /// Profiles that gates are evaluated against.
    pub fn effective_profiles(&self) -> BTreeSet<&str> {
        let profiles = if self.active_profiles.is_empty() {
            &self.default_profiles
        } else {
            &self.active_profiles
        };
        profiles.iter().map(String::as_str).collect()
    }

    /// Property sources, highest priority first.
    pub fn property_sources(&self) -> &[SourceEntry] {
        &self.sources
    }
}

/// Builder for [`Environment`].
#[derive(Debug, Default)]
pub struct EnvironmentBuilder {
    active_profiles: Vec<String>,
    default_profiles: Option<Vec<String>>,
    sources: Vec<SourceEntry>,
}

impl EnvironmentBuilder {
    /// Activate a profile; blank names and duplicates are ignored.
    pub fn active_profile(mut self, profile: impl Into<String>) -> Self {
        push_profile(&mut self.active_profiles, profile.into());
        self
    }

    pub fn active_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for profile in profiles {
            push_profile(&mut self.active_profiles, profile.into());
        }
        self
    }

    /// Replace the default profiles (`["default"]` unless set).
    pub fn default_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut defaults = Vec::new();
        for profile in profiles {
            push_profile(&mut defaults, profile.into());
        }
        self.default_profiles = Some(defaults);
        self
    }

    /// Add a property source at the given priority.
    pub fn source(mut self, priority: i32, source: impl PropertySource + 'static) -> Self {
        self.sources.push(SourceEntry {
            priority,
            source: Arc::new(source),
        });
        self
    }

    /// Add a shared property source at the given priority.
    pub fn shared_source(mut self, priority: i32, source: Arc<dyn PropertySource>) -> Self {
        self.sources.push(SourceEntry { priority, source });
        self
    }

    /// Add an in-memory source built from key/value pairs.
    pub fn properties<I, K, V>(self, name: impl Into<String>, priority: i32, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.source(priority, MapPropertySource::new(name, entries))
    }

    pub fn build(self) -> Environment {
        let mut sources = self.sources;
        // Stable: equal priorities keep insertion order.
        sources.sort_by(|a, b| b.priority.cmp(&a.priority));
        Environment {
            active_profiles: self.active_profiles,
            default_profiles: self
                .default_profiles
                .unwrap_or_else(|| vec![DEFAULT_PROFILE.to_string()]),
            sources,
        }
    }
}

fn push_profile(profiles: &mut Vec<String>, profile: String) {
    let profile = profile.trim();
    if profile.is_empty() || profiles.iter().any(|existing| existing == profile) {
        return;
    }
    profiles.push(profile.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_profiles_apply_only_without_active_profiles() {
        let env = Environment::default();
        assert_eq!(env.effective_profiles(), BTreeSet::from(["default"]));

        let env = Environment::builder()
            .active_profile("production")
            .active_profile(" ")
            .active_profile("production")
            .build();
        assert_eq!(env.active_profiles(), ["production".to_string()]);
        assert_eq!(env.effective_profiles(), BTreeSet::from(["production"]));
    }

    #[test]
    fn sources_sort_by_descending_priority_keeping_ties_in_order() {
        let env = Environment::builder()
            .properties("low", 10, [("a", "1")])
            .properties("high", 50, [("a", "2")])
            .properties("tie-first", 10, [("a", "3")])
            .build();
        let names: Vec<&str> = env
            .property_sources()
            .iter()
            .map(|entry| entry.source.name())
            .collect();
        assert_eq!(names, vec!["high", "low", "tie-first"]);
    }
}
