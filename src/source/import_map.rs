//! Import-map reading and rewriting
//!
//! Handles both standalone import maps (`import_map.json`) and `deno.json`
//! configs carrying an `imports`/`scopes` section. Rewrites mutate only the
//! addressed key and re-serialize the whole document, preserving the
//! original end-of-line style and enforcing a trailing newline.

use crate::error::{AppError, ImportMapError, IoError};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// One resolvable entry of an import map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportMapEntry {
    /// The alias key
    pub key: String,
    /// The mapped specifier
    pub value: String,
    /// The scope prefix this entry lives under, if any
    pub scope: Option<String>,
}

/// An import-map file held in memory for reading and rewriting
#[derive(Debug, Clone)]
pub struct ImportMapFile {
    path: PathBuf,
    value: Value,
    crlf: bool,
}

impl ImportMapFile {
    /// Read and parse an import map from disk
    pub fn read(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let content = fs::read_to_string(&path).map_err(|e| IoError::read(&path, e))?;
        Self::from_content(path, &content)
    }

    /// Parse an import map from already-read content
    pub fn from_content(path: impl Into<PathBuf>, content: &str) -> Result<Self, AppError> {
        let path = path.into();
        let value: Value = serde_json::from_str(content)
            .map_err(|e| ImportMapError::parse(&path, e.to_string()))?;
        Ok(Self {
            path,
            value,
            crlf: content.contains("\r\n"),
        })
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the document has any `imports` or `scopes` section
    pub fn has_entries(&self) -> bool {
        !self.entries().is_empty()
    }

    /// All entries, top-level `imports` first, then each scope's
    pub fn entries(&self) -> Vec<ImportMapEntry> {
        let mut entries = Vec::new();

        if let Some(imports) = self.value.get("imports").and_then(Value::as_object) {
            for (key, value) in imports {
                if let Some(value) = value.as_str() {
                    entries.push(ImportMapEntry {
                        key: key.clone(),
                        value: value.to_string(),
                        scope: None,
                    });
                }
            }
        }

        if let Some(scopes) = self.value.get("scopes").and_then(Value::as_object) {
            for (scope, mappings) in scopes {
                if let Some(mappings) = mappings.as_object() {
                    for (key, value) in mappings {
                        if let Some(value) = value.as_str() {
                            entries.push(ImportMapEntry {
                                key: key.clone(),
                                value: value.to_string(),
                                scope: Some(scope.clone()),
                            });
                        }
                    }
                }
            }
        }

        entries
    }

    /// Look up one entry's current value
    pub fn get(&self, key: &str, scope: Option<&str>) -> Option<&str> {
        let mappings = match scope {
            None => self.value.get("imports")?,
            Some(scope) => self.value.get("scopes")?.get(scope)?,
        };
        mappings.get(key)?.as_str()
    }

    /// Rewrite one entry's value
    pub fn set(
        &mut self,
        key: &str,
        scope: Option<&str>,
        new_value: &str,
    ) -> Result<(), ImportMapError> {
        let mappings = match scope {
            None => self.value.get_mut("imports"),
            Some(scope) => self
                .value
                .get_mut("scopes")
                .and_then(|scopes| scopes.get_mut(scope)),
        };
        let slot = mappings
            .and_then(Value::as_object_mut)
            .and_then(|map| map.get_mut(key))
            .ok_or_else(|| ImportMapError::key_not_found(key))?;
        *slot = Value::String(new_value.to_string());
        Ok(())
    }

    /// Serialize with the original end-of-line style and a trailing newline
    pub fn serialize(&self) -> String {
        let mut text = serde_json::to_string_pretty(&self.value).unwrap_or_default();
        if self.crlf {
            text = text.replace('\n', "\r\n");
        }
        if !text.ends_with('\n') {
            text.push_str(if self.crlf { "\r\n" } else { "\n" });
        }
        text
    }

    /// Persist the document back to its path
    pub fn save(&self) -> Result<(), IoError> {
        fs::write(&self.path, self.serialize()).map_err(|e| IoError::write(&self.path, e))
    }
}
