use condconf_protocol::Document;
use std::fs;
use std::path::{Path, PathBuf};

/// Decode a document from JSON text written in the document schema.
pub fn parse_document(json: &str) -> Document {
    serde_json::from_str(json).expect("document json")
}

/// Write `contents` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(&path, contents).expect("write");
    path
}
