//! npm registry adapter
//!
//! Fetches package metadata from the npm registry.
//! API endpoint: https://registry.npmjs.org/{package}

use crate::domain::{DependencyKind, DependencySpec};
use crate::error::RegistryError;
use crate::registry::{HttpClient, PackageMetadata};
use semver::Version;
use serde::Deserialize;
use std::collections::HashMap;

/// npm registry base URL
const NPM_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// npm registry adapter
#[derive(Clone)]
pub struct NpmClient {
    client: HttpClient,
    base_url: String,
}

/// npm package metadata response
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    /// Distribution tags (`latest` etc.); kept for response validation
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,
    /// Available versions
    versions: HashMap<String, NpmVersionMeta>,
}

#[derive(Debug, Deserialize)]
struct NpmVersionMeta {
    #[serde(default)]
    dist: NpmDist,
    #[serde(default)]
    dependencies: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct NpmDist {
    #[serde(default)]
    integrity: String,
}

impl NpmClient {
    /// Create a new npm adapter
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: NPM_REGISTRY_URL.to_string(),
        }
    }

    /// Override the registry base URL (for testing against a stub server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The registry name used in error messages
    pub fn registry_name(&self) -> &'static str {
        "npm"
    }

    fn build_url(&self, package: &str) -> String {
        format!("{}/{}", self.base_url, package)
    }

    async fn fetch_package(&self, package: &str) -> Result<NpmPackageResponse, RegistryError> {
        let url = self.build_url(package);
        let response: NpmPackageResponse = self
            .client
            .get_json(&url, package, self.registry_name())
            .await?;
        if response.versions.is_empty() && response.dist_tags.is_empty() {
            return Err(RegistryError::invalid_response(
                package,
                self.registry_name(),
                "no versions in package metadata",
            ));
        }
        Ok(response)
    }

    /// Fetch the full list of published versions, sorted ascending
    pub async fn versions(&self, package: &str) -> Result<Vec<Version>, RegistryError> {
        let response = self.fetch_package(package).await?;
        let mut versions: Vec<Version> = response
            .versions
            .keys()
            .filter_map(|v| Version::parse(v).ok())
            .collect();
        versions.sort();
        Ok(versions)
    }

    /// Fetch integrity and direct dependencies for one version
    pub async fn metadata(
        &self,
        package: &str,
        version: &Version,
    ) -> Result<PackageMetadata, RegistryError> {
        let response = self.fetch_package(package).await?;
        let meta = response.versions.get(&version.to_string()).ok_or_else(|| {
            RegistryError::invalid_response(
                package,
                self.registry_name(),
                format!("version {} missing from metadata", version),
            )
        })?;

        let dependencies = meta
            .dependencies
            .iter()
            .map(|(name, constraint)| DependencySpec {
                kind: DependencyKind::Npm,
                name: name.clone(),
                constraint: constraint.clone(),
                path: None,
            })
            .collect();

        Ok(PackageMetadata {
            integrity: meta.dist.integrity.clone(),
            dependencies,
        })
    }
}
