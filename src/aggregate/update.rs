//! A reconciled update for one dependency name
//!
//! An [Update] carries every reference to the dependency, the per-requirement
//! bumps agreed during aggregation, and the name-level `from -> to` figures
//! for reporting. Writing an update rewrites source spans and import-map
//! entries in place and folds a freshly synthesized partial lock into the
//! lockfile; writing twice leaves the project byte-identical.

use crate::domain::{DependencyBump, DependencyKind, DependencyState, VersionBump};
use crate::error::{AppError, IoError};
use crate::lock::{LockSynthesizer, Lockfile};
use crate::registry::Registry;
use crate::source::{DependencyRef, ImportMapFile, Position, RefLocator, Span};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Commit summaries are kept within a conventional subject-line length
pub const MAX_SUMMARY_LENGTH: usize = 50;

/// One distinct requirement and the bump agreed for it
#[derive(Debug, Clone)]
pub struct RequirementBump {
    /// The requirement and its locked version before the update
    pub state: DependencyState,
    /// The agreed constraint/lock change
    pub bump: DependencyBump,
}

impl RequirementBump {
    /// The requirement's spec after applying the constraint bump
    pub fn new_spec(&self) -> crate::domain::DependencySpec {
        match self.bump.constraint.as_deref() {
            Some(constraint) => self.state.spec.with_constraint(constraint),
            None => self.state.spec.clone(),
        }
    }
}

/// A reconciled update for one dependency name
#[derive(Debug, Clone)]
pub struct Update {
    /// Display name of the dependency
    pub name: String,
    /// Registry or protocol kind
    pub kind: DependencyKind,
    /// Every reference to this dependency across the project
    pub refs: Vec<DependencyRef>,
    /// Per-requirement bumps, one per distinct requirement string
    pub requirements: Vec<RequirementBump>,
    /// Name-level constraint transition, when any constraint string changes
    pub constraint: Option<VersionBump>,
    /// Name-level lock transition, when any lock entry advances
    pub lock: Option<VersionBump>,
}

impl Update {
    /// New constraint for one reference, when its requirement is bumped
    fn new_constraint_for(&self, dep_ref: &DependencyRef) -> Option<&str> {
        let identity = dep_ref.dependency.identify();
        self.requirements
            .iter()
            .find(|req| req.state.spec.identify() == identity)
            .and_then(|req| req.bump.constraint.as_deref())
    }

    /// Apply this update to the project
    ///
    /// Rewrites every bumped reference (module spans and import-map entries)
    /// and, when a lockfile is given, synthesizes and merges the partial lock
    /// for each bumped requirement. Returns the paths actually modified.
    pub async fn write(
        &self,
        registry: &dyn Registry,
        mut lockfile: Option<&mut Lockfile>,
    ) -> Result<Vec<PathBuf>, AppError> {
        let mut touched = Vec::new();

        // Module rewrites, grouped per file and applied back to front so
        // earlier spans stay valid
        let mut by_file: BTreeMap<PathBuf, Vec<(Span, String, String)>> = BTreeMap::new();
        let mut map_edits: BTreeMap<PathBuf, Vec<(String, Option<String>, String)>> =
            BTreeMap::new();
        for dep_ref in &self.refs {
            let Some(constraint) = self.new_constraint_for(dep_ref) else {
                continue;
            };
            let replacement = dep_ref.dependency.with_constraint(constraint).stringify();
            match &dep_ref.locator {
                RefLocator::Esm { path, span } => {
                    by_file.entry(path.clone()).or_default().push((
                        *span,
                        dep_ref.dependency.stringify(),
                        replacement,
                    ));
                }
                RefLocator::ImportMap { path, key, scope } => {
                    map_edits.entry(path.clone()).or_default().push((
                        key.clone(),
                        scope.clone(),
                        replacement,
                    ));
                }
            }
        }

        for (path, mut edits) in by_file {
            let content = fs::read_to_string(&path).map_err(|e| IoError::read(&path, e))?;
            edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
            let mut updated = content.clone();
            for (span, old, replacement) in edits {
                if let Some(next) = splice(&updated, &span, &old, &replacement) {
                    updated = next;
                }
            }
            if updated != content {
                fs::write(&path, updated).map_err(|e| IoError::write(&path, e))?;
                touched.push(path);
            }
        }

        for (path, edits) in map_edits {
            let mut map = ImportMapFile::read(&path)?;
            let mut changed = false;
            for (key, scope, replacement) in edits {
                if map.get(&key, scope.as_deref()) != Some(replacement.as_str()) {
                    map.set(&key, scope.as_deref(), &replacement)?;
                    changed = true;
                }
            }
            if changed {
                map.save()?;
                touched.push(path);
            }
        }

        if let Some(lockfile) = lockfile.as_deref_mut() {
            if self.write_lock(registry, lockfile).await? {
                lockfile.save()?;
                touched.push(lockfile.path().to_path_buf());
            }
        }

        Ok(touched)
    }

    /// Fold this update's partial locks into the lockfile
    ///
    /// Returns true when any entry changed.
    async fn write_lock(
        &self,
        registry: &dyn Registry,
        lockfile: &mut Lockfile,
    ) -> Result<bool, AppError> {
        let synthesizer = LockSynthesizer::new(registry);
        let mut changed = false;

        for req in &self.requirements {
            if req.state.spec.kind.is_remote() {
                if req.bump.constraint.is_none() {
                    continue;
                }
                let old_url = req.state.spec.stringify();
                let new_url = req.new_spec().stringify();
                if old_url == new_url && lockfile.json.remote.contains_key(&new_url) {
                    continue;
                }
                lockfile.json.remote.remove(&old_url);
                let part = synthesizer.synthesize_remote(&new_url).await?;
                lockfile.json.merge(part);
                changed = true;
                continue;
            }

            let Some(target) = req.bump.lock.as_ref() else {
                continue;
            };
            let new_spec = req.new_spec();
            if lockfile.locked_version(&new_spec).as_ref() == Some(target) {
                continue;
            }
            let old_identity = req.state.spec.identify();
            if old_identity != new_spec.identify() {
                lockfile.json.packages.specifiers.remove(&old_identity);
            }
            let part = synthesizer.synthesize_package(&new_spec, target).await?;
            lockfile.json.merge(part);
            changed = true;
        }

        Ok(changed)
    }

    /// One-line summary for reports and commit subjects
    ///
    /// Dropped to progressively shorter forms until it fits the subject
    /// length; the bare form is used unconditionally as the last resort.
    pub fn summary(&self) -> String {
        let Some(bump) = self.constraint.as_ref().or(self.lock.as_ref()) else {
            return format!("bump {}", self.name);
        };
        let full = format!("bump {} from {} to {}", self.name, bump.from, bump.to);
        if full.len() <= MAX_SUMMARY_LENGTH {
            return full;
        }
        let short = format!("bump {} to {}", self.name, bump.to);
        if short.len() <= MAX_SUMMARY_LENGTH {
            return short;
        }
        format!("bump {}", self.name)
    }
}

/// Replace the span's text, re-locating it when earlier writes moved it
///
/// An earlier edit to another dependency on the same line shifts later
/// spans left or right without changing their line. When the recorded
/// range no longer holds the expected specifier, the quoted specifier is
/// searched for on its line instead of splicing blind.
fn splice(content: &str, span: &Span, old: &str, replacement: &str) -> Option<String> {
    if let (Some(start), Some(end)) =
        (byte_offset(content, span.start), byte_offset(content, span.end))
    {
        match content.get(start..end) {
            Some(text) if text == replacement => return None,
            Some(text) if text == old => {
                return Some(replace_range(content, start, end, replacement));
            }
            _ => {}
        }
    }

    let (line_start, line_end) = line_bounds(content, span.start.line)?;
    let line = &content[line_start..line_end];
    for quote in ['"', '\''] {
        if let Some(found) = line.find(&format!("{quote}{old}{quote}")) {
            let start = line_start + found + quote.len_utf8();
            return Some(replace_range(content, start, start + old.len(), replacement));
        }
    }
    None
}

fn replace_range(content: &str, start: usize, end: usize, replacement: &str) -> String {
    let mut result = String::with_capacity(content.len());
    result.push_str(&content[..start]);
    result.push_str(replacement);
    result.push_str(&content[end..]);
    result
}

/// Byte range of a 0-indexed line, terminator included
fn line_bounds(content: &str, line: usize) -> Option<(usize, usize)> {
    let mut base = 0;
    for (index, text) in content.split_inclusive('\n').enumerate() {
        if index == line {
            return Some((base, base + text.len()));
        }
        base += text.len();
    }
    None
}

/// Byte offset of a 0-indexed line/character position
fn byte_offset(content: &str, position: Position) -> Option<usize> {
    let mut base = 0;
    for (index, line) in content.split_inclusive('\n').enumerate() {
        if index == position.line {
            if position.character == 0 {
                return Some(base);
            }
            let mut count = 0;
            for (byte, _) in line.char_indices() {
                if count == position.character {
                    return Some(base + byte);
                }
                count += 1;
            }
            if count == position.character {
                return Some(base + line.len());
            }
            return None;
        }
        base += line.len();
    }
    None
}
