//! ES module import scanning
//!
//! A lightweight graph builder: starting from the entry modules it records
//! every static `import`/`export ... from` and dynamic `import(...)` string
//! literal, with the span of the specifier text between its quotes. Relative
//! imports are followed (when `resolve_local` is on) so the whole local
//! module graph is covered; they are never reported as dependencies.

use super::{Position, Span};
use crate::error::IoError;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// `import ... from "x"` / `export ... from "x"`
static FROM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:import|export)[^'";]*?from\s*["']([^"']+)["']"#).unwrap());

/// Side-effect `import "x"`
static BARE_IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"import\s+["']([^"']+)["']"#).unwrap());

/// Dynamic `import("x")`
static DYNAMIC_IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"import\s*\(\s*["']([^"']+)["']\s*\)"#).unwrap());

/// One import occurrence inside a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDependency {
    /// The specifier text as written (without quotes)
    pub specifier: String,
    /// Span of the specifier text between its quotes
    pub span: Span,
}

/// A scanned module and its dependencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Path to the module file
    pub path: PathBuf,
    /// Import occurrences found in the module
    pub dependencies: Vec<ModuleDependency>,
}

/// Builds the list of modules reachable from a set of entrypoints
pub trait GraphBuilder {
    /// Scan the graph rooted at `entrypoints`
    fn build(&self, entrypoints: &[PathBuf]) -> Result<Vec<Module>, IoError>;
}

/// Regex-based ESM import scanner
#[derive(Debug, Clone)]
pub struct EsmScanner {
    /// Whether relative imports are followed into the local graph
    resolve_local: bool,
}

impl EsmScanner {
    /// Create a scanner that follows relative imports
    pub fn new() -> Self {
        Self {
            resolve_local: true,
        }
    }

    /// Toggle following of relative imports
    pub fn with_resolve_local(mut self, resolve_local: bool) -> Self {
        self.resolve_local = resolve_local;
        self
    }

    /// Scan one module's source text for import specifiers
    pub fn scan(content: &str) -> Vec<ModuleDependency> {
        let mut deps: Vec<(usize, ModuleDependency)> = Vec::new();
        let mut seen_ranges: HashSet<(usize, usize)> = HashSet::new();

        for re in [&*FROM_RE, &*DYNAMIC_IMPORT_RE, &*BARE_IMPORT_RE] {
            for captures in re.captures_iter(content) {
                let m = captures.get(1).unwrap();
                if !seen_ranges.insert((m.start(), m.end())) {
                    continue;
                }
                deps.push((
                    m.start(),
                    ModuleDependency {
                        specifier: m.as_str().to_string(),
                        span: Span::new(
                            position_at(content, m.start()),
                            position_at(content, m.end()),
                        ),
                    },
                ));
            }
        }

        deps.sort_by_key(|(offset, _)| *offset);
        deps.into_iter().map(|(_, dep)| dep).collect()
    }

    fn is_relative(specifier: &str) -> bool {
        specifier.starts_with("./") || specifier.starts_with("../")
    }
}

impl Default for EsmScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder for EsmScanner {
    fn build(&self, entrypoints: &[PathBuf]) -> Result<Vec<Module>, IoError> {
        let mut queue: Vec<PathBuf> = entrypoints.to_vec();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut modules = Vec::new();

        while let Some(path) = queue.pop() {
            let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
            if !visited.insert(canonical) {
                continue;
            }

            let content = fs::read_to_string(&path).map_err(|e| IoError::read(&path, e))?;
            let all = Self::scan(&content);

            let mut dependencies = Vec::new();
            for dep in all {
                if Self::is_relative(&dep.specifier) {
                    if self.resolve_local {
                        if let Some(parent) = path.parent() {
                            let local = normalize(&parent.join(&dep.specifier));
                            if local.is_file() {
                                queue.push(local);
                            }
                        }
                    }
                } else {
                    dependencies.push(dep);
                }
            }

            modules.push(Module { path, dependencies });
        }

        Ok(modules)
    }
}

/// Convert a byte offset into a 0-indexed line/character position
fn position_at(content: &str, offset: usize) -> Position {
    let before = &content[..offset];
    let line = before.matches('\n').count();
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let character = before[line_start..].chars().count();
    Position::new(line, character)
}

/// Resolve `.` and `..` components without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                result.pop();
            }
            other => result.push(other),
        }
    }
    result
}
