//! Partial-lock synthesis for a single bumped dependency
//!
//! For a package dependency the synthesizer resolves the dependency's own
//! direct dependency tree (reusing the in-range version-selection rule to
//! pick a compatible version for each transitive dependency), fetches each
//! resolved package's integrity hash, and assembles a minimal lockfile
//! fragment covering exactly the closure reachable from the target package.
//! A `seen` set keyed by package identity makes the walk cycle-safe.
//!
//! For a remote dependency it instead walks the module graph at the new
//! version and records a content hash per fetched file into `remote`.

use super::{JsrLockEntry, LockfileJson, NpmLockEntry};
use crate::domain::{DependencyKind, DependencySpec};
use crate::error::{AppError, RegistryError};
use crate::registry::Registry;
use crate::resolve::Constraint;
use crate::source::EsmScanner;
use semver::Version;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};

/// Builds minimal partial lockfiles for one dependency at a time
pub struct LockSynthesizer<'a> {
    registry: &'a dyn Registry,
}

impl<'a> LockSynthesizer<'a> {
    /// Create a synthesizer over a registry
    pub fn new(registry: &'a dyn Registry) -> Self {
        Self { registry }
    }

    /// Build a partial lock for one package dependency pinned at `target`
    pub async fn synthesize_package(
        &self,
        spec: &DependencySpec,
        target: &Version,
    ) -> Result<LockfileJson, AppError> {
        let mut part = LockfileJson::empty();
        let mut seen: HashSet<String> = HashSet::new();
        let mut stack: Vec<(DependencySpec, Version)> = Vec::new();

        part.packages.specifiers.insert(
            spec.identify(),
            pinned_specifier(spec, target),
        );
        stack.push((spec.clone(), target.clone()));

        while let Some((current, version)) = stack.pop() {
            let identity = format!("{}:{}@{}", current.kind, current.name, version);
            if !seen.insert(identity) {
                continue;
            }

            let meta = self
                .registry
                .metadata(current.kind, &current.name, &version)
                .await?;

            let mut jsr_deps: Vec<String> = Vec::new();
            let mut npm_deps: BTreeMap<String, String> = BTreeMap::new();

            for dep in meta.dependencies {
                let chosen = self.pick_version(&dep).await?;
                part.packages
                    .specifiers
                    .insert(dep.identify(), pinned_specifier(&dep, &chosen));
                match current.kind {
                    DependencyKind::Jsr => jsr_deps.push(dep.identify()),
                    DependencyKind::Npm => {
                        npm_deps.insert(dep.name.clone(), format!("{}@{}", dep.name, chosen));
                    }
                    _ => {}
                }
                stack.push((dep, chosen));
            }

            let entry_key = format!("{}@{}", current.name, version);
            match current.kind {
                DependencyKind::Jsr => {
                    jsr_deps.sort();
                    part.packages.jsr.insert(
                        entry_key,
                        JsrLockEntry {
                            integrity: meta.integrity,
                            dependencies: jsr_deps,
                        },
                    );
                }
                DependencyKind::Npm => {
                    part.packages.npm.insert(
                        entry_key,
                        NpmLockEntry {
                            integrity: meta.integrity,
                            dependencies: npm_deps,
                        },
                    );
                }
                _ => {}
            }
        }

        Ok(part)
    }

    /// Build a partial lock for a remote dependency rooted at `url`
    ///
    /// Walks relative and absolute imports reachable from the root module
    /// and records a SHA-256 content hash per fetched file.
    pub async fn synthesize_remote(&self, url: &str) -> Result<LockfileJson, AppError> {
        let mut part = LockfileJson::empty();
        let mut seen: HashSet<String> = HashSet::new();
        let mut stack: Vec<String> = vec![url.to_string()];

        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let content = self.registry.fetch_module(&current).await?;
            let hash = format!("{:x}", Sha256::digest(content.as_bytes()));
            part.remote.insert(current.clone(), hash);

            for dep in EsmScanner::scan(&content) {
                if let Some(next) = join_url(&current, &dep.specifier) {
                    stack.push(next);
                }
            }
        }

        Ok(part)
    }

    /// Pick a compatible version for a transitive dependency
    ///
    /// Reuses the in-range selection rule: the best version satisfying the
    /// declared constraint, not necessarily the registry's latest. Falls
    /// back to the newest published version when the constraint is not one
    /// of the recognized shapes.
    async fn pick_version(&self, dep: &DependencySpec) -> Result<Version, AppError> {
        let versions = self.registry.versions(dep.kind, &dep.name).await?;
        let chosen = match Constraint::parse(&dep.constraint) {
            Ok(constraint) => versions.iter().filter(|v| constraint.satisfies(v)).max(),
            Err(_) => versions.iter().filter(|v| v.pre.is_empty()).max(),
        };
        chosen.cloned().ok_or_else(|| {
            AppError::Registry(RegistryError::invalid_response(
                &dep.name,
                dep.kind.as_str(),
                format!("no version satisfies '{}'", dep.constraint),
            ))
        })
    }
}

/// Resolved specifier string for a pinned version
fn pinned_specifier(spec: &DependencySpec, version: &Version) -> String {
    spec.with_constraint(version.to_string()).identify()
}

/// Resolve an import specifier against a remote module URL
fn join_url(base: &str, specifier: &str) -> Option<String> {
    if specifier.starts_with("http://") || specifier.starts_with("https://") {
        return Some(specifier.to_string());
    }
    if !specifier.starts_with("./") && !specifier.starts_with("../") {
        return None;
    }

    let (origin, path) = {
        let scheme_end = base.find("://")? + 3;
        let path_start = base[scheme_end..].find('/').map(|i| scheme_end + i)?;
        (&base[..path_start], &base[path_start..])
    };

    let mut segments: Vec<&str> = path.split('/').collect();
    segments.pop();
    for part in specifier.split('/') {
        match part {
            "." => {}
            ".." => {
                if segments.len() > 1 {
                    segments.pop();
                }
            }
            part => segments.push(part),
        }
    }
    Some(format!("{}{}", origin, segments.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PackageMetadata;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Stub registry with canned versions, metadata, and module bodies
    #[derive(Default)]
    struct StubRegistry {
        versions: HashMap<String, Vec<Version>>,
        metadata: HashMap<String, PackageMetadata>,
        modules: HashMap<String, String>,
        fetched: Mutex<Vec<String>>,
    }

    impl StubRegistry {
        fn with_versions(mut self, name: &str, versions: &[&str]) -> Self {
            self.versions.insert(
                name.to_string(),
                versions.iter().map(|v| Version::parse(v).unwrap()).collect(),
            );
            self
        }

        fn with_metadata(
            mut self,
            name: &str,
            version: &str,
            integrity: &str,
            deps: &[&str],
        ) -> Self {
            self.metadata.insert(
                format!("{}@{}", name, version),
                PackageMetadata {
                    integrity: integrity.to_string(),
                    dependencies: deps
                        .iter()
                        .map(|d| DependencySpec::parse(d).unwrap())
                        .collect(),
                },
            );
            self
        }

        fn with_module(mut self, url: &str, content: &str) -> Self {
            self.modules.insert(url.to_string(), content.to_string());
            self
        }
    }

    #[async_trait]
    impl Registry for StubRegistry {
        async fn versions(
            &self,
            _kind: DependencyKind,
            name: &str,
        ) -> Result<Vec<Version>, RegistryError> {
            self.versions
                .get(name)
                .cloned()
                .ok_or_else(|| RegistryError::package_not_found(name, "stub"))
        }

        async fn metadata(
            &self,
            _kind: DependencyKind,
            name: &str,
            version: &Version,
        ) -> Result<PackageMetadata, RegistryError> {
            self.metadata
                .get(&format!("{}@{}", name, version))
                .cloned()
                .ok_or_else(|| RegistryError::package_not_found(name, "stub"))
        }

        async fn head_redirect(&self, _url: &str) -> Result<Option<String>, RegistryError> {
            Ok(None)
        }

        async fn fetch_module(&self, url: &str) -> Result<String, RegistryError> {
            self.fetched.lock().unwrap().push(url.to_string());
            self.modules
                .get(url)
                .cloned()
                .ok_or_else(|| RegistryError::package_not_found(url, "stub"))
        }
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_synthesize_single_package() {
        let registry = StubRegistry::default()
            .with_versions("@luca/flag", &["1.0.0", "1.0.1"])
            .with_metadata("@luca/flag", "1.0.1", "hash-101", &[]);
        let synthesizer = LockSynthesizer::new(&registry);

        let spec = DependencySpec::parse("jsr:@luca/flag@^1.0.0").unwrap();
        let part = synthesizer.synthesize_package(&spec, &v("1.0.1")).await.unwrap();

        assert_eq!(
            part.packages.specifiers["jsr:@luca/flag@^1.0.0"],
            "jsr:@luca/flag@1.0.1"
        );
        let entry = &part.packages.jsr["@luca/flag@1.0.1"];
        assert_eq!(entry.integrity, "hash-101");
        assert!(entry.dependencies.is_empty());
    }

    #[tokio::test]
    async fn test_synthesize_transitive_closure() {
        let registry = StubRegistry::default()
            .with_versions("@std/fs", &["0.222.0"])
            .with_versions("@std/path", &["0.221.0", "0.222.0"])
            .with_metadata("@std/fs", "0.222.0", "fs-hash", &["jsr:@std/path@^0.222.0"])
            .with_metadata("@std/path", "0.222.0", "path-hash", &[]);
        let synthesizer = LockSynthesizer::new(&registry);

        let spec = DependencySpec::parse("jsr:@std/fs@^0.222.0").unwrap();
        let part = synthesizer
            .synthesize_package(&spec, &v("0.222.0"))
            .await
            .unwrap();

        assert_eq!(part.packages.specifiers.len(), 2);
        assert_eq!(
            part.packages.specifiers["jsr:@std/path@^0.222.0"],
            "jsr:@std/path@0.222.0"
        );
        assert_eq!(
            part.packages.jsr["@std/fs@0.222.0"].dependencies,
            vec!["jsr:@std/path@^0.222.0"]
        );
        assert_eq!(part.packages.jsr["@std/path@0.222.0"].integrity, "path-hash");
    }

    #[tokio::test]
    async fn test_synthesize_npm_dependencies_map() {
        let registry = StubRegistry::default()
            .with_versions("chalk", &["5.3.0"])
            .with_versions("supports-color", &["9.4.0"])
            .with_metadata("chalk", "5.3.0", "chalk-hash", &["npm:supports-color@^9.0.0"])
            .with_metadata("supports-color", "9.4.0", "sc-hash", &[]);
        let synthesizer = LockSynthesizer::new(&registry);

        let spec = DependencySpec::parse("npm:chalk@^5.0.0").unwrap();
        let part = synthesizer.synthesize_package(&spec, &v("5.3.0")).await.unwrap();

        let entry = &part.packages.npm["chalk@5.3.0"];
        assert_eq!(entry.dependencies["supports-color"], "supports-color@9.4.0");
        assert!(part.packages.npm.contains_key("supports-color@9.4.0"));
    }

    #[tokio::test]
    async fn test_synthesize_is_cycle_safe() {
        let registry = StubRegistry::default()
            .with_versions("a", &["1.0.0"])
            .with_versions("b", &["1.0.0"])
            .with_metadata("a", "1.0.0", "a-hash", &["npm:b@1.0.0"])
            .with_metadata("b", "1.0.0", "b-hash", &["npm:a@1.0.0"]);
        let synthesizer = LockSynthesizer::new(&registry);

        let spec = DependencySpec::parse("npm:a@1.0.0").unwrap();
        let part = synthesizer.synthesize_package(&spec, &v("1.0.0")).await.unwrap();
        assert_eq!(part.packages.npm.len(), 2);
    }

    #[tokio::test]
    async fn test_synthesize_remote_graph() {
        let registry = StubRegistry::default()
            .with_module(
                "https://deno.land/std@0.224.0/fs/mod.ts",
                "import './walk.ts';\n",
            )
            .with_module("https://deno.land/std@0.224.0/fs/walk.ts", "export {};\n");
        let synthesizer = LockSynthesizer::new(&registry);

        let part = synthesizer
            .synthesize_remote("https://deno.land/std@0.224.0/fs/mod.ts")
            .await
            .unwrap();

        assert_eq!(part.remote.len(), 2);
        assert!(part.remote.contains_key("https://deno.land/std@0.224.0/fs/walk.ts"));
        // Hashes are hex-encoded SHA-256 digests
        assert!(part.remote.values().all(|h| h.len() == 64));
    }

    #[tokio::test]
    async fn test_synthesize_remote_fetches_each_module_once() {
        let registry = StubRegistry::default()
            .with_module(
                "https://example.com/x@1.0.0/mod.ts",
                "import './a.ts';\nimport './b.ts';\n",
            )
            .with_module("https://example.com/x@1.0.0/a.ts", "import './b.ts';\n")
            .with_module("https://example.com/x@1.0.0/b.ts", "export {};\n");
        let synthesizer = LockSynthesizer::new(&registry);

        synthesizer
            .synthesize_remote("https://example.com/x@1.0.0/mod.ts")
            .await
            .unwrap();
        let fetched = registry.fetched.lock().unwrap();
        assert_eq!(fetched.len(), 3);
    }

    #[test]
    fn test_join_url_relative() {
        assert_eq!(
            join_url("https://deno.land/std@0.224.0/fs/mod.ts", "./walk.ts").unwrap(),
            "https://deno.land/std@0.224.0/fs/walk.ts"
        );
        assert_eq!(
            join_url("https://deno.land/std@0.224.0/fs/mod.ts", "../path/mod.ts").unwrap(),
            "https://deno.land/std@0.224.0/path/mod.ts"
        );
    }

    #[test]
    fn test_join_url_absolute_and_bare() {
        assert_eq!(
            join_url("https://a.com/x/mod.ts", "https://b.com/y.ts").unwrap(),
            "https://b.com/y.ts"
        );
        assert!(join_url("https://a.com/x/mod.ts", "jsr:@std/fs@1.0.0").is_none());
    }
}
