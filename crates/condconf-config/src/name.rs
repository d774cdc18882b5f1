//! Relaxed property names.
//!
//! Keys are compared through a canonical form so that `my.example-property`,
//! `my.EXAMPLE_PROPERTY`, and `my.exampleProperty` name the same property.
//! Within each dot-separated element the canonical form is lowercase, and
//! `-`, `_`, and camel-case boundaries collapse to a single `-`. Index
//! suffixes such as `[0]` are kept verbatim (lowercased).

use std::fmt;

/// A requested or declared property key with its canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyName {
    original: String,
    canonical: String,
}

impl PropertyName {
    pub fn new(name: impl Into<String>) -> Self {
        let original = name.into();
        let canonical = canonicalize(&original);
        Self {
            original,
            canonical,
        }
    }

    /// The key as written by the caller.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The relaxed form used for comparison.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Conventional environment variable spelling, e.g. `MY_EXAMPLE_PROPERTY`.
    pub fn env_var_form(&self) -> String {
        let mut out = String::with_capacity(self.canonical.len());
        for ch in self.canonical.chars() {
            match ch {
                '.' | '-' | '[' => {
                    if !out.ends_with('_') {
                        out.push('_');
                    }
                }
                ']' => {}
                other => out.push(other.to_ascii_uppercase()),
            }
        }
        out.trim_end_matches('_').to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl From<&str> for PropertyName {
    fn from(value: &str) -> Self {
        PropertyName::new(value)
    }
}

/// Reduce a key to its canonical relaxed form.
pub fn canonicalize(name: &str) -> String {
    name.trim()
        .split('.')
        .map(canonicalize_element)
        .collect::<Vec<_>>()
        .join(".")
}

fn canonicalize_element(element: &str) -> String {
    let mut out = String::with_capacity(element.len());
    let mut pending_separator = false;
    // Last letter of the current word; digits do not reset it, so `v2Enabled`
    // splits while `LOG4J` stays whole.
    let mut last_letter: Option<char> = None;
    let mut in_index = false;

    for ch in element.chars() {
        if in_index {
            out.extend(ch.to_lowercase());
            if ch == ']' {
                in_index = false;
            }
            continue;
        }
        match ch {
            '-' | '_' => {
                pending_separator = true;
                last_letter = None;
            }
            '[' => {
                pending_separator = false;
                in_index = true;
                last_letter = None;
                out.push('[');
            }
            _ => {
                let camel_boundary =
                    ch.is_uppercase() && last_letter.is_some_and(char::is_lowercase);
                if (pending_separator || camel_boundary) && !out.is_empty() {
                    out.push('-');
                }
                pending_separator = false;
                if ch.is_alphabetic() {
                    last_letter = Some(ch);
                }
                out.extend(ch.to_lowercase());
            }
        }
    }
    out
}
