//! Dependency kinds for supported registries and remote hosts

use crate::error::SpecError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The registry or protocol a dependency is fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// JSR package (e.g., `jsr:@std/fs@^0.222.0`)
    Jsr,
    /// npm package (e.g., `npm:chalk@5.3.0`)
    Npm,
    /// Plain HTTP remote module
    Http,
    /// HTTPS remote module
    Https,
}

impl DependencyKind {
    /// Parse a protocol string (without the trailing colon)
    pub fn from_protocol(protocol: &str, specifier: &str) -> Result<Self, SpecError> {
        match protocol {
            "jsr" => Ok(DependencyKind::Jsr),
            "npm" => Ok(DependencyKind::Npm),
            "http" => Ok(DependencyKind::Http),
            "https" => Ok(DependencyKind::Https),
            other => Err(SpecError::unsupported_kind(other, specifier)),
        }
    }

    /// The protocol string for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Jsr => "jsr",
            DependencyKind::Npm => "npm",
            DependencyKind::Http => "http",
            DependencyKind::Https => "https",
        }
    }

    /// Returns true for URL-style kinds resolved via redirects
    pub fn is_remote(&self) -> bool {
        matches!(self, DependencyKind::Http | DependencyKind::Https)
    }

    /// Returns true for package-registry kinds
    pub fn is_package(&self) -> bool {
        !self.is_remote()
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
