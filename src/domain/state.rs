//! Per-requirement resolution state
//!
//! A [DependencyState] pairs one distinct requirement (a [DependencySpec])
//! with the exact version currently pinned for it in the lockfile, if any.
//! It is built once per distinct requirement string, not once per reference.

use super::DependencySpec;
use semver::Version;

/// A dependency requirement plus its locked version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyState {
    /// The requirement as written in source
    pub spec: DependencySpec,
    /// The exact version pinned in the lockfile for this requirement
    pub locked: Option<Version>,
}

impl DependencyState {
    /// Create a state without a lock entry
    pub fn new(spec: DependencySpec) -> Self {
        Self { spec, locked: None }
    }

    /// Create a state with a locked version
    pub fn locked(spec: DependencySpec, locked: Version) -> Self {
        Self {
            spec,
            locked: Some(locked),
        }
    }

    /// Returns true if this requirement is tracked by the lockfile
    pub fn is_lock_tracked(&self) -> bool {
        self.locked.is_some()
    }
}
