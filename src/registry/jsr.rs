//! JSR registry adapter
//!
//! Fetches package metadata from the JSR registry:
//! - version list from `https://jsr.io/{package}/meta.json` (yanked versions
//!   are excluded)
//! - version manifest from `https://jsr.io/{package}/{version}_meta.json`,
//!   hashed to produce the lockfile integrity value
//! - direct dependencies from the JSR dependency-graph API

use crate::domain::{DependencyKind, DependencySpec};
use crate::error::RegistryError;
use crate::registry::{HttpClient, PackageMetadata};
use semver::Version;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// JSR module registry base URL
const JSR_REGISTRY_URL: &str = "https://jsr.io";

/// JSR management API base URL
const JSR_API_URL: &str = "https://api.jsr.io";

/// JSR registry adapter
#[derive(Clone)]
pub struct JsrClient {
    client: HttpClient,
    base_url: String,
    api_url: String,
}

/// `meta.json` response shape
#[derive(Debug, Deserialize)]
struct JsrMetaResponse {
    versions: HashMap<String, JsrVersionInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct JsrVersionInfo {
    #[serde(default)]
    yanked: bool,
}

/// One entry of the dependency-graph API response
#[derive(Debug, Deserialize)]
struct JsrDependency {
    kind: String,
    name: String,
    constraint: String,
}

impl JsrClient {
    /// Create a new JSR adapter
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: JSR_REGISTRY_URL.to_string(),
            api_url: JSR_API_URL.to_string(),
        }
    }

    /// Override the registry base URL (for testing against a stub server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the API base URL (for testing against a stub server)
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// The registry name used in error messages
    pub fn registry_name(&self) -> &'static str {
        "jsr"
    }

    fn meta_url(&self, package: &str) -> String {
        format!("{}/{}/meta.json", self.base_url, package)
    }

    fn version_meta_url(&self, package: &str, version: &Version) -> String {
        format!("{}/{}/{}_meta.json", self.base_url, package, version)
    }

    fn dependencies_url(&self, scope: &str, name: &str, version: &Version) -> String {
        format!(
            "{}/scopes/{}/packages/{}/versions/{}/dependencies",
            self.api_url, scope, name, version
        )
    }

    /// Split `@scope/name` into its scope and short name
    fn split_name(package: &str) -> Result<(&str, &str), RegistryError> {
        package
            .strip_prefix('@')
            .and_then(|rest| rest.split_once('/'))
            .ok_or_else(|| {
                RegistryError::invalid_response(
                    package,
                    "jsr",
                    "package name is not in @scope/name form",
                )
            })
    }

    /// Fetch the list of published, non-yanked versions, sorted ascending
    pub async fn versions(&self, package: &str) -> Result<Vec<Version>, RegistryError> {
        let url = self.meta_url(package);
        let response: JsrMetaResponse = self
            .client
            .get_json(&url, package, self.registry_name())
            .await?;

        let mut versions: Vec<Version> = response
            .versions
            .iter()
            .filter(|(_, info)| !info.yanked)
            .filter_map(|(v, _)| Version::parse(v).ok())
            .collect();
        versions.sort();
        Ok(versions)
    }

    /// Fetch integrity and direct dependencies for one version
    ///
    /// The integrity is the SHA-256 of the version manifest, hex-encoded,
    /// matching what the lockfile records for jsr packages.
    pub async fn metadata(
        &self,
        package: &str,
        version: &Version,
    ) -> Result<PackageMetadata, RegistryError> {
        let manifest = self
            .client
            .get_text(
                &self.version_meta_url(package, version),
                package,
                self.registry_name(),
            )
            .await?;
        let integrity = format!("{:x}", Sha256::digest(manifest.as_bytes()));

        let (scope, name) = Self::split_name(package)?;
        let deps: Vec<JsrDependency> = self
            .client
            .get_json(
                &self.dependencies_url(scope, name, version),
                package,
                self.registry_name(),
            )
            .await?;

        let dependencies = deps
            .into_iter()
            .filter_map(|d| {
                let kind = match d.kind.as_str() {
                    "jsr" => DependencyKind::Jsr,
                    "npm" => DependencyKind::Npm,
                    _ => return None,
                };
                Some(DependencySpec {
                    kind,
                    name: d.name,
                    constraint: d.constraint,
                    path: None,
                })
            })
            .collect();

        Ok(PackageMetadata {
            integrity,
            dependencies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> JsrClient {
        JsrClient::new(HttpClient::new().unwrap())
    }

    #[test]
    fn test_registry_name() {
        assert_eq!(client().registry_name(), "jsr");
    }

    #[test]
    fn test_meta_url() {
        assert_eq!(
            client().meta_url("@std/fs"),
            "https://jsr.io/@std/fs/meta.json"
        );
    }

    #[test]
    fn test_version_meta_url() {
        let v = Version::parse("0.222.0").unwrap();
        assert_eq!(
            client().version_meta_url("@std/fs", &v),
            "https://jsr.io/@std/fs/0.222.0_meta.json"
        );
    }

    #[test]
    fn test_dependencies_url() {
        let v = Version::parse("1.0.0").unwrap();
        assert_eq!(
            client().dependencies_url("luca", "flag", &v),
            "https://api.jsr.io/scopes/luca/packages/flag/versions/1.0.0/dependencies"
        );
    }

    #[test]
    fn test_split_name() {
        assert_eq!(JsrClient::split_name("@std/fs").unwrap(), ("std", "fs"));
        assert!(JsrClient::split_name("fs").is_err());
    }

    #[test]
    fn test_with_base_url() {
        let c = client().with_base_url("http://127.0.0.1:8080");
        assert_eq!(c.meta_url("@std/fs"), "http://127.0.0.1:8080/@std/fs/meta.json");
    }

    #[test]
    fn test_meta_deserialization_yanked_flag() {
        let json = r#"{
            "versions": {
                "1.0.0": {},
                "1.0.1": { "yanked": true }
            }
        }"#;
        let response: JsrMetaResponse = serde_json::from_str(json).unwrap();
        assert!(!response.versions.get("1.0.0").unwrap().yanked);
        assert!(response.versions.get("1.0.1").unwrap().yanked);
    }

    #[test]
    fn test_dependency_deserialization() {
        let json = r#"[{ "kind": "jsr", "name": "@std/path", "constraint": "^0.222.0" }]"#;
        let deps: Vec<JsrDependency> = serde_json::from_str(json).unwrap();
        assert_eq!(deps[0].kind, "jsr");
        assert_eq!(deps[0].name, "@std/path");
        assert_eq!(deps[0].constraint, "^0.222.0");
    }
}
