//! Dependency specifier parsing and stringification
//!
//! A specifier is a registry-prefixed or URL-shaped string such as:
//! - `jsr:@std/fs@^0.222.0/exists`
//! - `npm:chalk@5.3.0`
//! - `https://deno.land/std@0.222.0/fs/mod.ts`
//!
//! The body is matched as `name@constraint[/path]` against the last `@`
//! followed by a non-slash run. Specifiers without a version constraint fail
//! to parse: an unversioned dependency cannot be updated and is filtered
//! upstream.

use super::DependencyKind;
use crate::error::SpecError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Matches `name@constraint[/path]` with a greedy name up to the last `@`
static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)@([^/@]+)(/.*)?$").unwrap());

/// A component of a stringified specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecComponent {
    /// The `kind:` / `kind://` protocol prefix
    Kind,
    /// The package name or host+path stem
    Name,
    /// The `@constraint` segment
    Constraint,
    /// The trailing `/subpath`
    Path,
}

/// Canonical identity of a dependency parsed from a specifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencySpec {
    /// Which registry or protocol this dependency belongs to
    pub kind: DependencyKind,
    /// Package name (`@std/fs`) or host stem (`deno.land/std`)
    pub name: String,
    /// Version constraint as written in source (never empty)
    pub constraint: String,
    /// Optional subpath after the constraint (includes the leading slash)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl DependencySpec {
    /// Parse a specifier string into its components
    pub fn parse(specifier: &str) -> Result<Self, SpecError> {
        let (protocol, rest) = specifier
            .split_once(':')
            .ok_or_else(|| SpecError::parse(specifier, "missing protocol"))?;
        let kind = DependencyKind::from_protocol(protocol, specifier)?;

        // URL kinds carry `//` after the colon; package kinds may carry an
        // optional slash run (e.g., `jsr:/@std/fs@1`)
        let body = if kind.is_remote() {
            rest.strip_prefix("//")
                .ok_or_else(|| SpecError::parse(specifier, "missing '//' after protocol"))?
        } else {
            rest.trim_start_matches('/')
        };

        let captures = BODY_RE
            .captures(body)
            .ok_or_else(|| SpecError::parse(specifier, "missing version constraint"))?;

        Ok(Self {
            kind,
            name: captures[1].to_string(),
            constraint: captures[2].to_string(),
            path: captures.get(3).map(|m| m.as_str().to_string()),
        })
    }

    /// Parse a specifier, returning None instead of failing
    pub fn try_parse(specifier: &str) -> Option<Self> {
        Self::parse(specifier).ok()
    }

    /// Reassemble the full specifier string (all components)
    pub fn stringify(&self) -> String {
        self.stringify_with(&[
            SpecComponent::Kind,
            SpecComponent::Name,
            SpecComponent::Constraint,
            SpecComponent::Path,
        ])
    }

    /// Reassemble a subset of components
    pub fn stringify_with(&self, components: &[SpecComponent]) -> String {
        let mut result = String::new();
        if components.contains(&SpecComponent::Kind) {
            result.push_str(self.kind.as_str());
            result.push(':');
            if self.kind.is_remote() {
                result.push_str("//");
            }
        }
        if components.contains(&SpecComponent::Name) {
            result.push_str(&self.name);
        }
        if components.contains(&SpecComponent::Constraint) {
            result.push('@');
            result.push_str(&self.constraint);
        }
        if components.contains(&SpecComponent::Path) {
            if let Some(ref path) = self.path {
                result.push_str(path);
            }
        }
        result
    }

    /// Canonical dedup key for this dependency
    ///
    /// Remote kinds are identified by the full specifier; package kinds by
    /// `kind:name@constraint` with the subpath dropped, so two imports of
    /// different subpaths of the same requirement collapse.
    pub fn identify(&self) -> String {
        if self.kind.is_remote() {
            self.stringify()
        } else {
            self.stringify_with(&[
                SpecComponent::Kind,
                SpecComponent::Name,
                SpecComponent::Constraint,
            ])
        }
    }

    /// Name-level grouping key (`kind:name`), ignoring the constraint
    pub fn name_key(&self) -> String {
        if self.kind.is_remote() {
            self.stringify_with(&[SpecComponent::Kind, SpecComponent::Name])
        } else {
            format!("{}:{}", self.kind, self.name)
        }
    }

    /// Returns a copy of this spec with a different constraint
    pub fn with_constraint(&self, constraint: impl Into<String>) -> Self {
        Self {
            kind: self.kind,
            name: self.name.clone(),
            constraint: constraint.into(),
            path: self.path.clone(),
        }
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stringify())
    }
}
