//! Bump decision ladder
//!
//! Given a requirement's state and the resolver's candidate figures, decide
//! the new constraint and/or lock. First matching rule wins:
//!
//! 1. `latest` present and the current constraint is itself a pre-release
//!    version string: bump to `latest`. This is the only path that moves a
//!    dependency across a pre-release boundary.
//! 2. `released` present: bump to `released`.
//! 3. `constrainted` present: advance the lock only (the constraint already
//!    admits it). Without a lock entry there is nothing to write.
//! 4. Otherwise: no bump.
//!
//! For rules 1-2 the constraint is widened just enough to admit the target.

use super::constraint::Constraint;
use crate::domain::{DependencyBump, DependencyState, DependencyUpdate};
use crate::error::ConstraintError;
use semver::Version;

/// The version the ladder would move this requirement to, if any
///
/// This is the figure bumps for one dependency name are reconciled on:
/// every requirement of a name must land on the same target.
pub fn bump_target(
    state: &DependencyState,
    update: &DependencyUpdate,
) -> Result<Option<Version>, ConstraintError> {
    let constraint = Constraint::parse(&state.spec.constraint)?;
    if update.latest.is_some() && constraint.is_prerelease() {
        return Ok(update.latest.clone());
    }
    if update.released.is_some() {
        return Ok(update.released.clone());
    }
    Ok(update.constrainted.clone())
}

/// Decide the bump for one requirement, if any
pub fn decide_bump(
    state: &DependencyState,
    update: &DependencyUpdate,
) -> Result<Option<DependencyBump>, ConstraintError> {
    let constraint = Constraint::parse(&state.spec.constraint)?;

    let target: Option<&Version> = if update.latest.is_some() && constraint.is_prerelease() {
        update.latest.as_ref()
    } else {
        update.released.as_ref()
    };

    if let Some(target) = target {
        let widened = constraint.widen(&state.spec.constraint, target);
        let bump = if state.is_lock_tracked() {
            DependencyBump::both(widened, target.clone())
        } else {
            DependencyBump::constraint(widened)
        };
        return Ok(Some(bump));
    }

    if let Some(ref constrainted) = update.constrainted {
        if state.is_lock_tracked() {
            return Ok(Some(DependencyBump::lock(constrainted.clone())));
        }
        return Ok(None);
    }

    Ok(None)
}
