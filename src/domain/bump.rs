//! Resolver output and bump decision types
//!
//! - [DependencyUpdate] is what the version resolver discovered for one
//!   requirement: the best in-range version, the best stable out-of-range
//!   version, and the absolute best including pre-releases.
//! - [DependencyBump] is the decided change for one requirement: a new
//!   constraint string and/or a new locked version.
//! - [VersionBump] is the aggregate `from -> to` pair exposed on an Update.

use semver::Version;
use serde::{Deserialize, Serialize};

/// Candidate versions discovered by the resolver for one requirement
///
/// All three figures are independent; any subset may be populated. `latest`
/// is dropped when it carries no extra information over `released`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DependencyUpdate {
    /// Best version satisfying the existing constraint, newer than the lock
    pub constrainted: Option<Version>,
    /// Best non-prerelease version beyond the existing constraint
    pub released: Option<Version>,
    /// Absolute best version beyond the constraint, including pre-releases
    pub latest: Option<Version>,
}

impl DependencyUpdate {
    /// Returns true if no figure is populated (dependency is up to date)
    pub fn is_empty(&self) -> bool {
        self.constrainted.is_none() && self.released.is_none() && self.latest.is_none()
    }

    /// Normalize: drop `latest` when it equals `released`
    pub fn normalized(mut self) -> Self {
        if self.latest.is_some() && self.latest == self.released {
            self.latest = None;
        }
        self
    }

    /// Wrap in Option, mapping the all-empty case to None
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// The decided change for one requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyBump {
    /// New constraint string, when the constraint itself must change
    pub constraint: Option<String>,
    /// New exact version for the lockfile entry
    pub lock: Option<Version>,
}

impl DependencyBump {
    /// A bump that only changes the constraint
    pub fn constraint(constraint: impl Into<String>) -> Self {
        Self {
            constraint: Some(constraint.into()),
            lock: None,
        }
    }

    /// A bump that only advances the lock
    pub fn lock(lock: Version) -> Self {
        Self {
            constraint: None,
            lock: Some(lock),
        }
    }

    /// A bump that changes both the constraint and the lock
    pub fn both(constraint: impl Into<String>, lock: Version) -> Self {
        Self {
            constraint: Some(constraint.into()),
            lock: Some(lock),
        }
    }
}

/// An aggregate version transition exposed on an Update
///
/// `from` may be a comma-joined list when multiple distinct priors map onto
/// the same target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionBump {
    /// Prior constraint(s) or locked version(s)
    pub from: String,
    /// The single agreed target
    pub to: String,
}

impl VersionBump {
    /// Create a new version bump
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}
