//! Layered environment loader.
//!
//! Discovers property layers (defaults, system, user, project, profile files,
//! environment variables, runtime overrides), resolves the active profiles,
//! and produces an [`Environment`] whose sources are ordered by precedence.

mod flatten;
mod layer_io;
pub(crate) mod utils;

#[cfg(test)]
mod tests;

use crate::ConfigError;
use crate::environment::{DEFAULT_PROFILE, Environment, EnvironmentBuilder};
use crate::name::PropertyName;
use crate::source::{MapPropertySource, PropertySource, SystemEnvironmentSource};
use log::{debug, info};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Property listing the active profiles, comma separated.
pub const ACTIVE_PROFILES_PROPERTY: &str = "condconf.profiles.active";
/// Property listing the default profiles, comma separated.
pub const DEFAULT_PROFILES_PROPERTY: &str = "condconf.profiles.default";

/// Default base name of property files (`application.json5`).
const DEFAULT_CONFIG_NAME: &str = "application";
/// Default config directory under the user's home.
const DEFAULT_CONFIG_DIR: &str = ".condconf";

#[cfg(not(windows))]
/// Default system config directory.
const SYSTEM_CONFIG_DIR: &str = "/etc/condconf";
#[cfg(windows)]
/// Default system config directory.
const SYSTEM_CONFIG_DIR: &str = "C:\\ProgramData\\condconf";

const DEFAULTS_PRIORITY: i32 = 0;
const SYSTEM_PRIORITY: i32 = 100;
const USER_PRIORITY: i32 = 200;
const PROJECT_PRIORITY: i32 = 300;
const PROFILE_PRIORITY: i32 = 400;
const ENVIRONMENT_PRIORITY: i32 = 500;
const RUNTIME_PRIORITY: i32 = 600;

/// Effective environment plus metadata about which layers were considered.
#[derive(Debug, Clone)]
pub struct LayeredEnvironment {
    /// The assembled environment.
    pub environment: Environment,
    /// Metadata for each layer considered during load, in load order.
    pub layers: Vec<PropertyLayer>,
}

/// Origin for a single property layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyLayerSource {
    /// Programmatic defaults (lowest precedence).
    Defaults,
    /// System-wide property file.
    System,
    /// User-specific property file.
    User,
    /// Property file in the working directory.
    Project,
    /// Profile-specific property file in the working directory.
    Profile,
    /// Process environment variables.
    Environment,
    /// Runtime overrides (highest precedence).
    Runtime,
}

impl PropertyLayerSource {
    /// Short name used in labels and logs.
    pub fn label(self) -> &'static str {
        match self {
            PropertyLayerSource::Defaults => "defaults",
            PropertyLayerSource::System => "system",
            PropertyLayerSource::User => "user",
            PropertyLayerSource::Project => "project",
            PropertyLayerSource::Profile => "profile",
            PropertyLayerSource::Environment => "environment",
            PropertyLayerSource::Runtime => "runtime",
        }
    }
}

/// Metadata about a property layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyLayer {
    /// Layer origin.
    pub source: PropertyLayerSource,
    /// Location on disk for file layers.
    pub path: Option<PathBuf>,
    /// Profile the layer belongs to, for profile files.
    pub profile: Option<String>,
    /// Number of properties contributed.
    pub property_count: usize,
    /// Reason the layer was skipped, if it was.
    pub skipped_reason: Option<String>,
}

impl PropertyLayer {
    pub fn is_loaded(&self) -> bool {
        self.skipped_reason.is_none()
    }
}

/// Options controlling layer discovery and overrides.
#[derive(Debug, Clone)]
pub struct LayeredEnvironmentOptions {
    /// Working directory holding project and profile files.
    pub cwd: PathBuf,
    /// Base name of property files (`application` by default).
    pub config_name: String,
    /// Optional system property file.
    pub system_config_path: Option<PathBuf>,
    /// Optional user property file (defaults to `~/.condconf/application.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Lowest-precedence programmatic properties.
    pub defaults: Vec<(String, String)>,
    /// Explicit active profiles; when `None` they come from properties.
    pub active_profiles: Option<Vec<String>>,
    /// Environment variables to expose; `None` disables the layer.
    pub env_vars: Option<Vec<(String, String)>>,
    /// Highest-precedence properties, e.g. from the command line.
    pub runtime_properties: Vec<(String, String)>,
}

impl LayeredEnvironmentOptions {
    /// Create options with default layer locations for the provided cwd.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            config_name: DEFAULT_CONFIG_NAME.to_string(),
            system_config_path: layer_io::default_system_config_path(DEFAULT_CONFIG_NAME),
            user_config_path: layer_io::default_user_config_path(DEFAULT_CONFIG_NAME),
            defaults: Vec::new(),
            active_profiles: None,
            env_vars: None,
            runtime_properties: Vec::new(),
        }
    }

    /// Activate profiles explicitly, bypassing the profile properties.
    pub fn with_active_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_profiles = Some(profiles.into_iter().map(Into::into).collect());
        self
    }

    /// Add a lowest-precedence default property.
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.push((key.into(), value.into()));
        self
    }

    /// Add a highest-precedence runtime property.
    pub fn with_runtime_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.runtime_properties.push((key.into(), value.into()));
        self
    }

    /// Expose the given variables as the environment layer.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(
            vars.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
        self
    }

    /// Expose the current process environment as the environment layer.
    pub fn with_process_env(self) -> Self {
        self.with_env_vars(std::env::vars())
    }
}

/// Internal representation of a loaded file layer.
#[derive(Debug, Clone)]
struct LoadedLayer {
    meta: PropertyLayer,
    properties: MapPropertySource,
}

/// Result of probing an optional file layer.
#[derive(Debug)]
enum LayerOutcome {
    Loaded(LoadedLayer),
    Skipped(PropertyLayer),
}

/// Accumulates layers while loading.
struct LayerStack {
    layers: Vec<PropertyLayer>,
    builder: EnvironmentBuilder,
    sources: Vec<(i32, Arc<dyn PropertySource>)>,
    seen_paths: HashSet<PathBuf>,
}

impl LayerStack {
    fn new() -> Self {
        Self {
            layers: Vec::new(),
            builder: Environment::builder(),
            sources: Vec::new(),
            seen_paths: HashSet::new(),
        }
    }

    fn push(&mut self, meta: PropertyLayer, priority: i32, source: Arc<dyn PropertySource>) {
        debug!(
            "loaded layer (source={:?}, priority={}, properties={})",
            meta.source, priority, meta.property_count
        );
        self.layers.push(meta);
        self.sources.push((priority, source));
    }

    fn push_file(
        &mut self,
        source: PropertyLayerSource,
        path: Option<&Path>,
        priority: i32,
        profile: Option<&str>,
    ) -> Result<(), ConfigError> {
        if let Some(path) = path
            && path.exists()
            && !self.seen_paths.insert(utils::unique_path(path))
        {
            debug!(
                "skipping duplicate layer (source={:?}, path={})",
                source,
                path.display()
            );
            return Ok(());
        }
        match layer_io::load_optional_layer(source, path, profile)? {
            LayerOutcome::Loaded(layer) => {
                self.push(layer.meta, priority, Arc::new(layer.properties));
            }
            LayerOutcome::Skipped(meta) => self.layers.push(meta),
        }
        Ok(())
    }

    /// Highest-precedence value for `key` among the layers loaded so far.
    fn find(&self, key: &str) -> Option<String> {
        let name = PropertyName::new(key);
        let mut ordered: Vec<&(i32, Arc<dyn PropertySource>)> = self.sources.iter().collect();
        ordered.sort_by(|a, b| b.0.cmp(&a.0));
        ordered
            .into_iter()
            .find_map(|(_, source)| source.lookup(&name).map(str::to_string))
    }

    fn finish(self, active: Vec<String>, defaults: Vec<String>) -> LayeredEnvironment {
        let mut builder = self
            .builder
            .active_profiles(active)
            .default_profiles(defaults);
        for (priority, source) in self.sources {
            builder = builder.shared_source(priority, source);
        }
        LayeredEnvironment {
            environment: builder.build(),
            layers: self.layers,
        }
    }
}

impl LayeredEnvironment {
    /// Load a layered environment using the default layer locations.
    pub fn load(cwd: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!(
            "loading layered environment with defaults (cwd={})",
            cwd.as_ref().display()
        );
        Self::load_with_options(LayeredEnvironmentOptions::new(cwd))
    }

    /// Load a layered environment using explicit layer locations and overrides.
    ///
    /// Layer precedence (low -> high): defaults, system, user, project,
    /// profile files (later profiles win), environment variables, runtime.
    pub fn load_with_options(options: LayeredEnvironmentOptions) -> Result<Self, ConfigError> {
        let cwd = utils::normalize_path(&options.cwd)?;
        debug!("normalized cwd for environment load: {}", cwd.display());
        let mut stack = LayerStack::new();

        if !options.defaults.is_empty() {
            let properties = MapPropertySource::new(
                PropertyLayerSource::Defaults.label(),
                options.defaults.iter().cloned(),
            );
            let meta = PropertyLayer {
                source: PropertyLayerSource::Defaults,
                path: None,
                profile: None,
                property_count: properties.len(),
                skipped_reason: None,
            };
            stack.push(meta, DEFAULTS_PRIORITY, Arc::new(properties));
        }

        let project_path = cwd.join(format!("{}.json5", options.config_name));
        for (source, path, priority) in [
            (
                PropertyLayerSource::System,
                options.system_config_path.as_deref(),
                SYSTEM_PRIORITY,
            ),
            (
                PropertyLayerSource::User,
                options.user_config_path.as_deref(),
                USER_PRIORITY,
            ),
            (
                PropertyLayerSource::Project,
                Some(project_path.as_path()),
                PROJECT_PRIORITY,
            ),
        ] {
            stack.push_file(source, path, priority, None)?;
        }

        if let Some(vars) = options.env_vars.as_ref() {
            let properties = SystemEnvironmentSource::from_vars(vars.iter().cloned());
            let meta = PropertyLayer {
                source: PropertyLayerSource::Environment,
                path: None,
                profile: None,
                property_count: vars.len(),
                skipped_reason: None,
            };
            stack.push(meta, ENVIRONMENT_PRIORITY, Arc::new(properties));
        }

        if !options.runtime_properties.is_empty() {
            let properties = MapPropertySource::new(
                PropertyLayerSource::Runtime.label(),
                options.runtime_properties.iter().cloned(),
            );
            let meta = PropertyLayer {
                source: PropertyLayerSource::Runtime,
                path: None,
                profile: None,
                property_count: properties.len(),
                skipped_reason: None,
            };
            stack.push(meta, RUNTIME_PRIORITY, Arc::new(properties));
        }

        let active = match options.active_profiles {
            Some(profiles) => profiles
                .iter()
                .flat_map(|profile| split_profiles(profile))
                .collect(),
            None => stack
                .find(ACTIVE_PROFILES_PROPERTY)
                .map(|value| split_profiles(&value))
                .unwrap_or_default(),
        };
        let defaults = stack
            .find(DEFAULT_PROFILES_PROPERTY)
            .map(|value| split_profiles(&value))
            .filter(|profiles| !profiles.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_PROFILE.to_string()]);
        debug!("resolved profiles (active={active:?}, defaults={defaults:?})");

        let file_profiles = if active.is_empty() {
            &defaults
        } else {
            &active
        };
        for (idx, profile) in file_profiles.iter().enumerate() {
            let path = cwd.join(format!("{}-{profile}.json5", options.config_name));
            // Later profiles win; stay below the environment layer.
            let priority = PROFILE_PRIORITY
                .saturating_add(i32::try_from(idx).unwrap_or(i32::MAX))
                .min(ENVIRONMENT_PRIORITY - 1);
            stack.push_file(
                PropertyLayerSource::Profile,
                Some(path.as_path()),
                priority,
                Some(profile),
            )?;
        }

        let loaded = stack.layers.iter().filter(|layer| layer.is_loaded()).count();
        let layered = stack.finish(active, defaults);
        info!(
            "layered environment loaded (layers={}, loaded={}, active_profiles={:?})",
            layered.layers.len(),
            loaded,
            layered.environment.active_profiles()
        );
        Ok(layered)
    }
}

/// Split a comma separated profile list, trimming blanks.
pub fn split_profiles(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|profile| !profile.is_empty())
        .map(str::to_string)
        .collect()
}
