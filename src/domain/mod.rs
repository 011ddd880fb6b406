//! Core domain models for modup
//!
//! This module contains the fundamental types used throughout the application:
//! - Dependency kinds for supported registries
//! - Dependency specifier parsing and stringification
//! - Per-requirement resolution state and resolver output
//! - Bump decision results

mod bump;
mod kind;
mod spec;
mod state;

pub use bump::{DependencyBump, DependencyUpdate, VersionBump};
pub use kind::DependencyKind;
pub use spec::{DependencySpec, SpecComponent};
pub use state::DependencyState;
