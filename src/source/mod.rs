//! Dependency reference collection
//!
//! This module provides:
//! - Source positions and spans for in-place specifier rewriting
//! - [DependencyRef]: one concrete occurrence of a dependency in a source
//!   artifact, tagged with enough locator information to rewrite it
//! - The ESM module scanner (graph-builder contract)
//! - The import-map reader/writer

mod import_map;
mod scanner;

pub use import_map::ImportMapFile;
pub use scanner::{EsmScanner, GraphBuilder, Module, ModuleDependency};

use crate::domain::DependencySpec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;

/// A zero-indexed line/character position in a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// The 0-indexed line index
    pub line: usize,
    /// The 0-indexed character index
    pub character: usize,
}

impl Position {
    /// Create a new position
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.line.cmp(&other.line) {
            Ordering::Equal => self.character.cmp(&other.character),
            ordering => ordering,
        }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A half-open character range locating specifier text in a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start position (inclusive)
    pub start: Position,
    /// End position (exclusive by character)
    pub end: Position,
}

impl Span {
    /// Create a new span
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Where a dependency reference lives and how to rewrite it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefLocator {
    /// An import specifier inside an ES module
    Esm { path: PathBuf, span: Span },
    /// An entry in an import map (optionally inside a scope)
    ImportMap {
        path: PathBuf,
        key: String,
        scope: Option<String>,
    },
}

impl RefLocator {
    /// The file this reference lives in
    pub fn path(&self) -> &PathBuf {
        match self {
            RefLocator::Esm { path, .. } => path,
            RefLocator::ImportMap { path, .. } => path,
        }
    }
}

/// One concrete occurrence of a dependency in a source artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRef {
    /// The parsed dependency identity
    pub dependency: DependencySpec,
    /// Rewrite locator
    pub locator: RefLocator,
}

impl DependencyRef {
    /// Create a reference for an ESM import
    pub fn esm(dependency: DependencySpec, path: impl Into<PathBuf>, span: Span) -> Self {
        Self {
            dependency,
            locator: RefLocator::Esm {
                path: path.into(),
                span,
            },
        }
    }

    /// Create a reference for an import-map entry
    pub fn import_map(
        dependency: DependencySpec,
        path: impl Into<PathBuf>,
        key: impl Into<String>,
        scope: Option<String>,
    ) -> Self {
        Self {
            dependency,
            locator: RefLocator::ImportMap {
                path: path.into(),
                key: key.into(),
                scope,
            },
        }
    }
}

/// Collect dependency references from scanned modules and an import map
///
/// Specifiers that do not parse as updatable dependencies (relative imports,
/// bare import-map aliases, unversioned URLs) are skipped.
pub fn collect_refs(modules: &[Module], import_map: Option<&ImportMapFile>) -> Vec<DependencyRef> {
    let mut refs = Vec::new();

    for module in modules {
        for dep in &module.dependencies {
            if let Some(spec) = DependencySpec::try_parse(&dep.specifier) {
                refs.push(DependencyRef::esm(spec, module.path.clone(), dep.span));
            }
        }
    }

    if let Some(map) = import_map {
        for entry in map.entries() {
            if let Some(spec) = DependencySpec::try_parse(&entry.value) {
                refs.push(DependencyRef::import_map(
                    spec,
                    map.path().to_path_buf(),
                    entry.key,
                    entry.scope,
                ));
            }
        }
    }

    refs
}
