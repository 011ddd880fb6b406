//! Version resolution for dependency requirements
//!
//! This module provides:
//! - The five-shape constraint model and widening rules
//! - The version resolver that queries a [Registry](crate::registry::Registry)
//!   and computes the `{constrainted, released, latest}` candidate figures
//! - The bump calculator that turns resolver output into a concrete
//!   constraint/lock change

mod bump;
pub mod constraint;

pub use bump::{bump_target, decide_bump};
pub use constraint::{increase, satisfies, Constraint};

use crate::domain::{DependencyState, DependencyUpdate};
use crate::error::AppError;
use crate::registry::Registry;
use semver::Version;

/// Resolves the candidate update figures for one requirement
pub struct VersionResolver<'a> {
    registry: &'a dyn Registry,
}

impl<'a> VersionResolver<'a> {
    /// Create a resolver over a registry
    pub fn new(registry: &'a dyn Registry) -> Self {
        Self { registry }
    }

    /// Resolve the update figures for one requirement
    ///
    /// Returns None when the dependency is fully up to date along every axis.
    pub async fn resolve(
        &self,
        state: &DependencyState,
    ) -> Result<Option<DependencyUpdate>, AppError> {
        if state.spec.kind.is_remote() {
            self.resolve_remote(state).await
        } else {
            self.resolve_package(state).await
        }
    }

    /// Package kinds: fetch the full version list and compute three figures
    ///
    /// `constrainted` only considers in-range versions strictly newer than
    /// the locked version, so a lock already pinning a newer in-range version
    /// is never walked backwards.
    async fn resolve_package(
        &self,
        state: &DependencyState,
    ) -> Result<Option<DependencyUpdate>, AppError> {
        let constraint = Constraint::parse(&state.spec.constraint)?;
        let versions = self
            .registry
            .versions(state.spec.kind, &state.spec.name)
            .await?;

        let constrainted = versions
            .iter()
            .filter(|v| constraint.satisfies(v))
            .filter(|v| state.locked.as_ref().map(|l| *v > l).unwrap_or(true))
            .max()
            .cloned();

        let above: Vec<&Version> = versions.iter().filter(|v| constraint.allows_above(v)).collect();
        let released = above.iter().filter(|v| v.pre.is_empty()).max().map(|v| (*v).clone());
        let latest = above.iter().max().map(|v| (*v).clone());

        Ok(DependencyUpdate {
            constrainted,
            released,
            latest,
        }
        .normalized()
        .into_option())
    }

    /// Remote kinds: probe the URL with HEAD and classify the redirect target
    ///
    /// No redirect means no update. A redirect whose URL does not parse to a
    /// version is ignored. Pre-release targets only ever populate `latest`;
    /// they never masquerade as `released`.
    async fn resolve_remote(
        &self,
        state: &DependencyState,
    ) -> Result<Option<DependencyUpdate>, AppError> {
        let url = state.spec.stringify();
        let Some(location) = self.registry.head_redirect(&url).await? else {
            return Ok(None);
        };

        let Some(redirected) = crate::domain::DependencySpec::try_parse(&location) else {
            return Ok(None);
        };
        let Ok(version) = Version::parse(&redirected.constraint) else {
            return Ok(None);
        };
        if redirected.constraint == state.spec.constraint {
            return Ok(None);
        }

        let update = if version.pre.is_empty() {
            DependencyUpdate {
                released: Some(version),
                ..Default::default()
            }
        } else {
            DependencyUpdate {
                latest: Some(version),
                ..Default::default()
            }
        };
        Ok(Some(update))
    }
}
