//! Environment model, layered property loading, and document loading.
//!
//! This crate owns property names and their relaxed canonical form, the
//! priority-ordered property sources that make up an [`Environment`], the
//! layered loader that assembles an environment from files and overrides, and
//! the loader for JSON5 configuration documents.

mod document;
mod environment;
mod error;
mod loader;
mod name;
mod source;

/// Public error type returned by loading and validation APIs.
pub use error::ConfigError;
/// Configuration document loading.
pub use document::DocumentLoader;
/// Environment assembly and profile queries.
pub use environment::{DEFAULT_PROFILE, Environment, EnvironmentBuilder, SourceEntry};
/// Layered environment types and loader options.
pub use loader::{
    ACTIVE_PROFILES_PROPERTY, DEFAULT_PROFILES_PROPERTY, LayeredEnvironment,
    LayeredEnvironmentOptions, PropertyLayer, PropertyLayerSource, split_profiles,
};
/// Relaxed property names.
pub use name::{PropertyName, canonicalize};
/// Property source implementations.
pub use source::{MapPropertySource, PropertySource, SystemEnvironmentSource};
