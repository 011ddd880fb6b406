//! Registry access for fetching package version information
//!
//! This module provides:
//! - HTTP client shared foundation with retry logic
//! - npm registry adapter
//! - JSR registry adapter
//! - The [Registry] trait the resolver and lock synthesis consume, so tests
//!   can stub all network access behind one object

mod client;
mod jsr;
mod npm;

pub use client::HttpClient;
pub use jsr::JsrClient;
pub use npm::NpmClient;

use crate::domain::{DependencyKind, DependencySpec};
use crate::error::RegistryError;
use async_trait::async_trait;
use semver::Version;

/// Per-version metadata used for lock synthesis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    /// Integrity hash recorded in the lockfile for this version
    pub integrity: String,
    /// Registry-declared direct dependencies (kind, name, constraint)
    pub dependencies: Vec<DependencySpec>,
}

/// Trait over all registry and remote-host access
#[async_trait]
pub trait Registry: Send + Sync {
    /// Fetch the full version list for a package, sorted ascending
    async fn versions(
        &self,
        kind: DependencyKind,
        name: &str,
    ) -> Result<Vec<Version>, RegistryError>;

    /// Fetch integrity and direct dependencies for one package version
    async fn metadata(
        &self,
        kind: DependencyKind,
        name: &str,
        version: &Version,
    ) -> Result<PackageMetadata, RegistryError>;

    /// Probe a remote module URL with HEAD; return the redirect target if any
    async fn head_redirect(&self, url: &str) -> Result<Option<String>, RegistryError>;

    /// Fetch a remote module's content, for remote lock entries
    async fn fetch_module(&self, url: &str) -> Result<String, RegistryError>;
}

/// Production [Registry] backed by the real npm/JSR endpoints
#[derive(Clone)]
pub struct HttpRegistry {
    client: HttpClient,
    npm: NpmClient,
    jsr: JsrClient,
}

impl HttpRegistry {
    /// Create a registry facade over one shared HTTP client
    pub fn new(client: HttpClient) -> Self {
        Self {
            npm: NpmClient::new(client.clone()),
            jsr: JsrClient::new(client.clone()),
            client,
        }
    }

    /// Replace the npm adapter (for testing against a stub server)
    pub fn with_npm(mut self, npm: NpmClient) -> Self {
        self.npm = npm;
        self
    }

    /// Replace the JSR adapter (for testing against a stub server)
    pub fn with_jsr(mut self, jsr: JsrClient) -> Self {
        self.jsr = jsr;
        self
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    async fn versions(
        &self,
        kind: DependencyKind,
        name: &str,
    ) -> Result<Vec<Version>, RegistryError> {
        match kind {
            DependencyKind::Jsr => self.jsr.versions(name).await,
            DependencyKind::Npm => self.npm.versions(name).await,
            DependencyKind::Http | DependencyKind::Https => Err(
                RegistryError::invalid_response(name, kind.as_str(), "not a package registry"),
            ),
        }
    }

    async fn metadata(
        &self,
        kind: DependencyKind,
        name: &str,
        version: &Version,
    ) -> Result<PackageMetadata, RegistryError> {
        match kind {
            DependencyKind::Jsr => self.jsr.metadata(name, version).await,
            DependencyKind::Npm => self.npm.metadata(name, version).await,
            DependencyKind::Http | DependencyKind::Https => Err(
                RegistryError::invalid_response(name, kind.as_str(), "not a package registry"),
            ),
        }
    }

    async fn head_redirect(&self, url: &str) -> Result<Option<String>, RegistryError> {
        self.client.head_location(url).await
    }

    async fn fetch_module(&self, url: &str) -> Result<String, RegistryError> {
        self.client.get_text(url, url, "remote").await
    }
}
