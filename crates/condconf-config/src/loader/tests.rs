//! Tests for layered environment loading.

use super::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Options rooted in a temp dir so the real home and /etc are never read.
fn isolated_options(root: &Path) -> LayeredEnvironmentOptions {
    let mut options = LayeredEnvironmentOptions::new(root.join("project"));
    options.system_config_path = Some(root.join("system.json5"));
    options.user_config_path = Some(root.join("user.json5"));
    options
}

/// First value for `key` across the environment's sources.
fn value(environment: &Environment, key: &str) -> Option<String> {
    let name = PropertyName::new(key);
    environment
        .property_sources()
        .iter()
        .find_map(|entry| entry.source.lookup(&name).map(str::to_string))
}

#[test]
fn layers_apply_in_precedence_order() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    write_json5(
        &root.join("system.json5"),
        "{ app: { name: \"system\", owner: \"ops\", tier: \"system\" } }",
    );
    write_json5(
        &root.join("user.json5"),
        "{ app: { name: \"user\", tier: \"user\" } }",
    );
    write_json5(
        &root.join("project/application.json5"),
        "{ app: { name: \"project\" } }",
    );

    let options = isolated_options(root)
        .with_default("app.region", "eu")
        .with_default("app.name", "default");
    let layered = LayeredEnvironment::load_with_options(options).expect("load");
    let env = &layered.environment;

    assert_eq!(value(env, "app.name").as_deref(), Some("project"));
    assert_eq!(value(env, "app.tier").as_deref(), Some("user"));
    assert_eq!(value(env, "app.owner").as_deref(), Some("ops"));
    assert_eq!(value(env, "app.region").as_deref(), Some("eu"));
}

#[test]
fn environment_and_runtime_layers_override_files() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    write_json5(
        &root.join("project/application.json5"),
        "{ server: { port: 8080, host: \"localhost\" }, log: { dir: \"/var/log\" } }",
    );

    let options = isolated_options(root)
        .with_env_vars([("SERVER_PORT", "9090"), ("LOG_DIR", "/tmp/log")])
        .with_runtime_property("server.port", "7070");
    let layered = LayeredEnvironment::load_with_options(options).expect("load");
    let env = &layered.environment;

    assert_eq!(value(env, "server.port").as_deref(), Some("7070"));
    assert_eq!(value(env, "log.dir").as_deref(), Some("/tmp/log"));
    assert_eq!(value(env, "server.host").as_deref(), Some("localhost"));
}

#[test]
fn missing_files_are_recorded_as_skipped() {
    let temp = TempDir::new().expect("tmp");
    let mut options = isolated_options(temp.path());
    options.system_config_path = None;
    let layered = LayeredEnvironment::load_with_options(options).expect("load");

    let skipped: Vec<(PropertyLayerSource, Option<&str>)> = layered
        .layers
        .iter()
        .map(|layer| (layer.source, layer.skipped_reason.as_deref()))
        .collect();
    assert_eq!(
        skipped,
        vec![
            (PropertyLayerSource::System, Some("no path configured")),
            (PropertyLayerSource::User, Some("file not found")),
            (PropertyLayerSource::Project, Some("file not found")),
            (PropertyLayerSource::Profile, Some("file not found")),
        ]
    );
    assert!(layered.environment.property_sources().is_empty());
}

#[test]
fn explicit_profiles_load_profile_files_with_later_profiles_winning() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    write_json5(
        &root.join("project/application.json5"),
        "{ feature: \"base\", color: \"base\" }",
    );
    write_json5(
        &root.join("project/application-staging.json5"),
        "{ feature: \"staging\", color: \"staging\" }",
    );
    write_json5(
        &root.join("project/application-blue.json5"),
        "{ color: \"blue\" }",
    );

    let options = isolated_options(root).with_active_profiles(["staging", "blue"]);
    let layered = LayeredEnvironment::load_with_options(options).expect("load");
    let env = &layered.environment;

    assert_eq!(env.active_profiles(), ["staging", "blue"]);
    assert_eq!(value(env, "feature").as_deref(), Some("staging"));
    assert_eq!(value(env, "color").as_deref(), Some("blue"));

    let profiles: Vec<Option<&str>> = layered
        .layers
        .iter()
        .filter(|layer| layer.source == PropertyLayerSource::Profile)
        .map(|layer| layer.profile.as_deref())
        .collect();
    assert_eq!(profiles, vec![Some("staging"), Some("blue")]);
}

#[test]
fn active_profiles_come_from_property_when_not_given() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    write_json5(
        &root.join("project/application.json5"),
        "{ condconf: { profiles: { active: \"dev, local\" } } }",
    );
    write_json5(
        &root.join("project/application-dev.json5"),
        "{ database: { url: \"jdbc:dev\" } }",
    );

    let layered = LayeredEnvironment::load_with_options(isolated_options(root)).expect("load");
    let env = &layered.environment;
    assert_eq!(env.active_profiles(), ["dev", "local"]);
    assert_eq!(value(env, "database.url").as_deref(), Some("jdbc:dev"));

    let options = isolated_options(root).with_env_vars([("CONDCONF_PROFILES_ACTIVE", "prod")]);
    let layered = LayeredEnvironment::load_with_options(options).expect("load");
    assert_eq!(layered.environment.active_profiles(), ["prod"]);
}

#[test]
fn default_profile_files_load_when_nothing_is_active() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    write_json5(
        &root.join("project/application-default.json5"),
        "{ mode: \"fallback\" }",
    );

    let layered = LayeredEnvironment::load_with_options(isolated_options(root)).expect("load");
    let env = &layered.environment;
    assert!(env.active_profiles().is_empty());
    assert_eq!(env.default_profiles(), ["default"]);
    assert_eq!(value(env, "mode").as_deref(), Some("fallback"));

    let options = isolated_options(root).with_default(DEFAULT_PROFILES_PROPERTY, "local");
    let layered = LayeredEnvironment::load_with_options(options).expect("load");
    assert_eq!(layered.environment.default_profiles(), ["local"]);
    assert_eq!(value(&layered.environment, "mode"), None);
}

#[test]
fn rejects_non_object_property_file() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    write_json5(&root.join("project/application.json5"), "[1, 2, 3]");

    let err = LayeredEnvironment::load_with_options(isolated_options(root)).unwrap_err();
    assert!(format!("{err}").contains(":root"));
}

#[test]
fn split_profiles_trims_and_drops_blanks() {
    assert_eq!(split_profiles(" a, b ,,c "), vec!["a", "b", "c"]);
    assert!(split_profiles(" , ").is_empty());
}
