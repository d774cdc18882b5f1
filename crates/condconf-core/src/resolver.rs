//! Relaxed property resolution against an [`Environment`].

use condconf_config::{Environment, PropertyName};
use log::trace;

/// Resolve `key` against the environment's sources, highest priority first.
pub fn resolve<'env>(key: &str, environment: &'env Environment) -> Option<&'env str> {
    PropertyResolver::new(environment).resolve(key)
}

/// Looks up properties in an environment using relaxed names.
#[derive(Debug, Clone, Copy)]
pub struct PropertyResolver<'env> {
    environment: &'env Environment,
}

impl<'env> PropertyResolver<'env> {
    pub fn new(environment: &'env Environment) -> Self {
        Self { environment }
    }

    pub fn resolve(&self, key: &str) -> Option<&'env str> {
        self.resolve_name(&PropertyName::new(key))
    }

    /// Resolve an already canonicalized name.
    pub fn resolve_name(&self, name: &PropertyName) -> Option<&'env str> {
        if name.is_empty() {
            return None;
        }
        let found = self
            .environment
            .property_sources()
            .iter()
            .find_map(|entry| {
                entry
                    .source
                    .lookup(name)
                    .map(|value| (entry.source.name(), value))
            });
        match found {
            Some((source, value)) => {
                trace!("resolved property (key={name}, source={source})");
                Some(value)
            }
            None => {
                trace!("property not found (key={name})");
                None
            }
        }
    }
}
