//! Logger levels understood by level directives.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logger name used for root level changes.
pub const ROOT_LOGGER_NAME: &str = "ROOT";

/// A logger threshold, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

/// Level text that matched no known level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown level: {0}")]
pub struct LevelError(pub String);

impl FromStr for Level {
    type Err = LevelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TRACE" | "ALL" => Ok(Level::Trace),
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "ERROR" => Ok(Level::Error),
            "OFF" => Ok(Level::Off),
            _ => Err(LevelError(value.to_string())),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Off => "OFF",
        };
        f.write_str(name)
    }
}

/// Parse a level directive value; `INHERITED` and `NULL` reset to `None`.
pub fn parse_level_setting(value: &str) -> Result<Option<Level>, LevelError> {
    match value.trim().to_ascii_uppercase().as_str() {
        "INHERITED" | "NULL" => Ok(None),
        _ => value.parse().map(Some),
    }
}
