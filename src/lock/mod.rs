//! Lockfile model, validation, and merging
//!
//! This module provides:
//! - The version-3 lockfile JSON shape (`packages.specifiers`,
//!   `packages.jsr`, `packages.npm`, `remote`, `workspace`)
//! - Schema-version validation (only `"3"` is accepted, checked before any
//!   mutation)
//! - Per-namespace deep merge of partial lockfiles into the full lockfile
//! - Partial-lock synthesis for a single bumped dependency

mod synthesis;

pub use synthesis::LockSynthesizer;

use crate::domain::DependencySpec;
use crate::error::LockError;
use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// The only lockfile schema version this tool understands
pub const SUPPORTED_LOCKFILE_VERSION: &str = "3";

/// A jsr package entry in the lockfile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsrLockEntry {
    /// Hash of the version manifest
    pub integrity: String,
    /// Requirement strings of direct dependencies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

/// An npm package entry in the lockfile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpmLockEntry {
    /// Tarball integrity hash
    pub integrity: String,
    /// Direct dependencies, name to `name@version`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
}

/// The `packages` section of a lockfile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagesJson {
    /// Requirement string to resolved specifier
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub specifiers: BTreeMap<String, String>,
    /// jsr entries keyed by `name@version`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub jsr: BTreeMap<String, JsrLockEntry>,
    /// npm entries keyed by `name@version`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub npm: BTreeMap<String, NpmLockEntry>,
}

impl PackagesJson {
    /// Returns true if no namespace has any entry
    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty() && self.jsr.is_empty() && self.npm.is_empty()
    }
}

/// A full or partial version-3 lockfile document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockfileJson {
    /// Schema version
    pub version: String,
    /// Package lock namespaces
    #[serde(default, skip_serializing_if = "PackagesJson::is_empty")]
    pub packages: PackagesJson,
    /// Remote module URL to content hash
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub remote: BTreeMap<String, String>,
    /// Workspace section, carried through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<Value>,
}

impl LockfileJson {
    /// An empty version-3 document
    pub fn empty() -> Self {
        Self {
            version: SUPPORTED_LOCKFILE_VERSION.to_string(),
            packages: PackagesJson::default(),
            remote: BTreeMap::new(),
            workspace: None,
        }
    }

    /// Merge a partial lockfile into this one
    ///
    /// Explicit per-namespace union with overwrite-on-conflict; entries are
    /// never removed. Partial locks only carry keys for the one dependency
    /// (and its transitive closure) they were built for, so the merge is
    /// commutative per dependency.
    pub fn merge(&mut self, part: LockfileJson) {
        self.packages.specifiers.extend(part.packages.specifiers);
        self.packages.jsr.extend(part.packages.jsr);
        self.packages.npm.extend(part.packages.npm);
        self.remote.extend(part.remote);
    }
}

impl Default for LockfileJson {
    fn default() -> Self {
        Self::empty()
    }
}

/// A lockfile bound to its on-disk path
#[derive(Debug, Clone)]
pub struct Lockfile {
    path: PathBuf,
    /// The parsed document
    pub json: LockfileJson,
}

impl Lockfile {
    /// Read and validate a lockfile from disk
    ///
    /// Fails fast on any schema version other than `"3"`, before any lock
    /// mutation can be attempted.
    pub fn read(path: impl Into<PathBuf>) -> Result<Self, LockError> {
        let path = path.into();
        let content = fs::read_to_string(&path).map_err(|e| LockError::Read {
            path: path.clone(),
            source: e,
        })?;
        let json: LockfileJson = serde_json::from_str(&content)
            .map_err(|e| LockError::parse(&path, e.to_string()))?;
        if json.version != SUPPORTED_LOCKFILE_VERSION {
            return Err(LockError::unsupported_version(&path, &json.version));
        }
        Ok(Self { path, json })
    }

    /// Create an in-memory lockfile that will be written to `path`
    pub fn new(path: impl Into<PathBuf>, json: LockfileJson) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The exact version locked for a requirement, if present
    ///
    /// The lookup key is the requirement string (`identify()` of the spec);
    /// the mapped value is a fully pinned specifier whose constraint is the
    /// locked version.
    pub fn locked_version(&self, spec: &DependencySpec) -> Option<Version> {
        let resolved = self.json.packages.specifiers.get(&spec.identify())?;
        let resolved = DependencySpec::try_parse(resolved)?;
        Version::parse(&resolved.constraint).ok()
    }

    /// Persist the document with a trailing newline
    pub fn save(&self) -> Result<(), LockError> {
        let mut text = serde_json::to_string_pretty(&self.json).map_err(|e| {
            LockError::parse(&self.path, e.to_string())
        })?;
        text.push('\n');
        fs::write(&self.path, text).map_err(|e| LockError::Write {
            path: self.path.clone(),
            source: e,
        })
    }
}
