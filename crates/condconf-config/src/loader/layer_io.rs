//! IO helpers for reading property layers from disk.

use super::{
    DEFAULT_CONFIG_DIR, LayerOutcome, LoadedLayer, PropertyLayer, PropertyLayerSource,
    SYSTEM_CONFIG_DIR, flatten,
};
use crate::ConfigError;
use crate::source::MapPropertySource;
use directories::UserDirs;
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Load an optional layer if the provided path exists.
pub(super) fn load_optional_layer(
    source: PropertyLayerSource,
    path: Option<&Path>,
    profile: Option<&str>,
) -> Result<LayerOutcome, ConfigError> {
    let path = match path {
        Some(path) => path,
        None => {
            return Ok(LayerOutcome::Skipped(PropertyLayer {
                source,
                path: None,
                profile: profile.map(str::to_string),
                property_count: 0,
                skipped_reason: Some("no path configured".to_string()),
            }));
        }
    };

    if !path.exists() {
        debug!(
            "optional layer missing (source={:?}, path={})",
            source,
            path.display()
        );
        return Ok(LayerOutcome::Skipped(PropertyLayer {
            source,
            path: Some(path.to_path_buf()),
            profile: profile.map(str::to_string),
            property_count: 0,
            skipped_reason: Some("file not found".to_string()),
        }));
    }

    Ok(LayerOutcome::Loaded(load_required_layer(source, path, profile)?))
}

/// Load and flatten a required layer from disk.
pub(super) fn load_required_layer(
    source: PropertyLayerSource,
    path: &Path,
    profile: Option<&str>,
) -> Result<LoadedLayer, ConfigError> {
    debug!(
        "loading property layer (source={:?}, path={})",
        source,
        path.display()
    );
    let contents = fs::read_to_string(path)?;
    let value: Value = json5::from_str(&contents)?;
    let label = layer_label(source, path);
    let entries = flatten::flatten_properties(&value, &label)?;
    let property_count = entries.len();
    Ok(LoadedLayer {
        meta: PropertyLayer {
            source,
            path: Some(path.to_path_buf()),
            profile: profile.map(str::to_string),
            property_count,
            skipped_reason: None,
        },
        properties: MapPropertySource::new(label, entries),
    })
}

/// Build a user-friendly label for a file layer.
pub(super) fn layer_label(source: PropertyLayerSource, path: &Path) -> String {
    format!("{}({})", source.label(), path.display())
}

/// Default system config path for the current platform.
pub(super) fn default_system_config_path(config_name: &str) -> Option<PathBuf> {
    Some(PathBuf::from(SYSTEM_CONFIG_DIR).join(format!("{config_name}.json5")))
}

/// Default user config path under the home directory.
pub(super) fn default_user_config_path(config_name: &str) -> Option<PathBuf> {
    UserDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(DEFAULT_CONFIG_DIR)
            .join(format!("{config_name}.json5"))
    })
}
