//! The compiled base string table.
//!
//! Holds the project's authored lines in its base locale: id → text plus
//! metadata tags. Built programmatically by the asset pipeline or loaded
//! from a TOML file.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Stable identifier of one line of narrative text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct LineId(String);

impl LineId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LineId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for LineId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Errors loading a string table from disk.
#[derive(Debug, Error)]
pub enum TableError {
    /// The file could not be read.
    #[error("failed to read string table: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML of the expected shape.
    #[error("failed to parse string table: {0}")]
    Parse(#[from] toml::de::Error),
}

/// One base-locale entry: authored text plus metadata tags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StringEntry {
    /// Line text, markup included.
    pub text: String,
    /// Metadata tags attached to the line (e.g. `#chatter`).
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The compiled localization table for the project's base locale.
///
/// TOML shape:
///
/// ```toml
/// base_locale = "en"
///
/// [lines."line:intro_1"]
/// text = "Hello there!"
/// tags = ["#greeting"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct StringTable {
    base_locale: String,
    #[serde(default)]
    lines: HashMap<LineId, StringEntry>,
}

impl StringTable {
    /// Empty table authored in `base_locale`.
    pub fn new(base_locale: impl Into<String>) -> Self {
        Self {
            base_locale: base_locale.into(),
            lines: HashMap::new(),
        }
    }

    /// Load a table from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a table from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, TableError> {
        Ok(toml::from_str(content)?)
    }

    /// Insert a full entry.
    pub fn insert(&mut self, id: impl Into<LineId>, entry: StringEntry) {
        self.lines.insert(id.into(), entry);
    }

    /// Insert text with no tags.
    pub fn add(&mut self, id: impl Into<LineId>, text: impl Into<String>) {
        self.insert(
            id,
            StringEntry {
                text: text.into(),
                tags: Vec::new(),
            },
        );
    }

    /// Entry for a line id.
    pub fn get(&self, id: &LineId) -> Option<&StringEntry> {
        self.lines.get(id)
    }

    /// The locale the table is authored in.
    pub fn base_locale(&self) -> &str {
        &self.base_locale
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the table has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_get() {
        let mut table = StringTable::new("en");
        table.add("line:a", "Hello");
        table.insert(
            "line:b",
            StringEntry {
                text: "Bye".into(),
                tags: vec!["#farewell".into()],
            },
        );

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&LineId::from("line:a")).unwrap().text, "Hello");
        assert_eq!(
            table.get(&LineId::from("line:b")).unwrap().tags,
            vec!["#farewell"]
        );
        assert!(table.get(&LineId::from("line:c")).is_none());
    }

    #[test]
    fn test_parse_toml() {
        let table = StringTable::from_toml_str(
            r##"
base_locale = "en"

[lines."line:intro_1"]
text = "Hello there!"
tags = ["#greeting"]

[lines."line:intro_2"]
text = "Mind the gap."
"##,
        )
        .unwrap();

        assert_eq!(table.base_locale(), "en");
        assert_eq!(table.len(), 2);
        let entry = table.get(&LineId::from("line:intro_1")).unwrap();
        assert_eq!(entry.text, "Hello there!");
        assert_eq!(entry.tags, vec!["#greeting"]);
        assert!(table
            .get(&LineId::from("line:intro_2"))
            .unwrap()
            .tags
            .is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_shape() {
        assert!(StringTable::from_toml_str("lines = 3").is_err());
    }
}
