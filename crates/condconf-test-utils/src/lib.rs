//! Test helpers shared across condconf crates.

pub mod documents;
pub mod environment;

pub use documents::{parse_document, write_file};
pub use environment::{RecordingSource, environment_with, inline_environment};
