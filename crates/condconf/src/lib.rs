//! Public SDK surface for condconf.
//!
//! This crate re-exports the building blocks and provides helpers that load
//! a layered environment and evaluate a document in one call.

/// Re-export for convenience.
pub use condconf_config as config;
/// Re-export for convenience.
pub use condconf_core as core;
/// Re-export for convenience.
pub use condconf_protocol as protocol;

pub use condconf_config::{
    ConfigError, DocumentLoader, Environment, LayeredEnvironment, LayeredEnvironmentOptions,
};
pub use condconf_core::{Evaluation, EvaluationError, Evaluator, evaluate};

use log::info;
use std::path::Path;

/// Load the layered environment described by `options`, then evaluate the
/// document at `document` against it, collecting errors.
pub fn evaluate_file(
    document: impl AsRef<Path>,
    options: LayeredEnvironmentOptions,
) -> Result<(LayeredEnvironment, Evaluation), ConfigError> {
    let document_path = document.as_ref();
    let layered = LayeredEnvironment::load_with_options(options)?;
    let document = DocumentLoader::new().load_from_path(document_path)?;
    info!(
        "evaluating document (path={}, layers={})",
        document_path.display(),
        layered.layers.len()
    );
    let evaluation = evaluate(&document, &layered.environment);
    Ok((layered, evaluation))
}

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}
