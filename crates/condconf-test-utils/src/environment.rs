use condconf_config::{Environment, MapPropertySource, PropertyName, PropertySource};
use parking_lot::Mutex;
use std::sync::Arc;

/// Priority used for inline test properties.
pub const INLINE_PRIORITY: i32 = 100;

/// Environment with the given active profiles and one inline source.
pub fn environment_with(profiles: &[&str], properties: &[(&str, &str)]) -> Environment {
    Environment::builder()
        .active_profiles(profiles.iter().copied())
        .properties("inline", INLINE_PRIORITY, properties.iter().copied())
        .build()
}

/// Environment with no active profiles and one inline source.
pub fn inline_environment(properties: &[(&str, &str)]) -> Environment {
    environment_with(&[], properties)
}

/// Property source that records every requested key.
#[derive(Debug, Clone)]
pub struct RecordingSource {
    inner: MapPropertySource,
    requests: Arc<Mutex<Vec<String>>>,
}

impl RecordingSource {
    pub fn new(properties: &[(&str, &str)]) -> Self {
        Self {
            inner: MapPropertySource::new("recording", properties.iter().copied()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Keys requested so far, as written by the caller.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

impl PropertySource for RecordingSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn lookup(&self, name: &PropertyName) -> Option<&str> {
        self.requests.lock().push(name.original().to_string());
        self.inner.lookup(name)
    }
}
