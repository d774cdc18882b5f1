//! Error types for environment and document loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while loading or validating configuration input.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a file failed.
    #[error("failed to read config: {0}")]
    ReadFailed(#[from] std::io::Error),
    /// Parsing a JSON5 file failed.
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] json5::Error),
    /// Converting JSON values failed.
    #[error("failed to decode config: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// A specific field failed validation.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
    /// A document includes itself, directly or transitively.
    #[error("include cycle detected at {}", .0.display())]
    IncludeCycle(PathBuf),
    /// A required include target does not exist.
    #[error("included document not found: {}", .0.display())]
    MissingInclude(PathBuf),
}
