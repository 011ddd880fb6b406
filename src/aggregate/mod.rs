//! Bump aggregation across references
//!
//! This module provides:
//! - [AggregationContext]: resolves every distinct requirement found in the
//!   project (concurrently, through a per-name response cache) and groups
//!   the decided bumps by dependency name
//! - [Update]: one reconciled, writable, committable update per name
//!
//! Grouping is by name, not by requirement string: two files importing
//! `jsr:@std/fs@^0.222.0` and `jsr:@std/fs@^0.221.0` produce one update.
//! When distinct requirements of a name would land on different target
//! versions the aggregation fails with `ConflictingBumpTargets` rather than
//! committing a half-bumped dependency.

mod cache;
mod commit;
mod update;

pub use cache::CachingRegistry;
pub use commit::{CommitSequencer, UpdateGroup};
pub use update::{RequirementBump, Update, MAX_SUMMARY_LENGTH};

use crate::domain::{DependencySpec, DependencyState, VersionBump};
use crate::error::{AggregateError, AppError};
use crate::lock::Lockfile;
use crate::registry::Registry;
use crate::resolve::{bump_target, decide_bump, VersionResolver};
use crate::source::DependencyRef;
use semver::Version;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// A requirement that could not be resolved against its registry
///
/// Registry failures are per-dependency: one unreachable package must not
/// abort the whole run. Format and conflict errors remain fatal.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionFailure {
    /// The requirement string that failed
    pub requirement: String,
    /// The registry error, rendered
    pub error: String,
}

/// The outcome of one collection pass
#[derive(Debug, Default)]
pub struct Aggregation {
    /// Reconciled per-name updates
    pub updates: Vec<Update>,
    /// Requirements skipped due to registry failures
    pub failures: Vec<ResolutionFailure>,
}

/// Resolves and reconciles bumps for one collection pass
///
/// The context owns the per-name response cache; a fresh context starts with
/// a cold cache, so repeated invocations observe current registry state.
pub struct AggregationContext<'a> {
    registry: CachingRegistry<'a>,
    lockfile: Option<&'a Lockfile>,
}

impl<'a> AggregationContext<'a> {
    /// Create a context over a registry and an optional lockfile
    pub fn new(registry: &'a dyn Registry, lockfile: Option<&'a Lockfile>) -> Self {
        Self {
            registry: CachingRegistry::new(registry),
            lockfile,
        }
    }

    /// Resolve all references and reconcile them into per-name updates
    pub async fn collect(&self, refs: &[DependencyRef]) -> Result<Aggregation, AppError> {
        // Distinct requirements, keyed by requirement string
        let mut requirements: BTreeMap<String, DependencySpec> = BTreeMap::new();
        for dep_ref in refs {
            requirements
                .entry(dep_ref.dependency.identify())
                .or_insert_with(|| dep_ref.dependency.clone());
        }

        let states: Vec<DependencyState> = requirements
            .into_values()
            .map(|spec| {
                let locked = self.lockfile.and_then(|lock| lock.locked_version(&spec));
                DependencyState { spec, locked }
            })
            .collect();

        let resolver = VersionResolver::new(&self.registry);
        let resolved =
            futures::future::join_all(states.iter().map(|state| resolver.resolve(state))).await;

        let mut failures = Vec::new();
        let mut bumped: HashMap<String, (RequirementBump, Version)> = HashMap::new();
        for (state, result) in states.into_iter().zip(resolved) {
            let update = match result {
                Ok(Some(update)) => update,
                Ok(None) => continue,
                Err(AppError::Registry(err)) => {
                    failures.push(ResolutionFailure {
                        requirement: state.spec.identify(),
                        error: err.to_string(),
                    });
                    continue;
                }
                Err(err) => return Err(err),
            };
            let Some(bump) = decide_bump(&state, &update)? else {
                continue;
            };
            let Some(target) = bump_target(&state, &update)? else {
                continue;
            };
            bumped.insert(state.spec.identify(), (RequirementBump { state, bump }, target));
        }

        let mut groups: BTreeMap<String, Vec<DependencyRef>> = BTreeMap::new();
        for dep_ref in refs {
            groups
                .entry(dep_ref.dependency.name_key())
                .or_default()
                .push(dep_ref.clone());
        }

        let mut updates = Vec::new();
        for group_refs in groups.into_values() {
            if let Some(update) = reconcile(group_refs, &bumped)? {
                updates.push(update);
            }
        }
        Ok(Aggregation { updates, failures })
    }
}

/// Reconcile one name's references and requirement bumps into an Update
fn reconcile(
    refs: Vec<DependencyRef>,
    bumped: &HashMap<String, (RequirementBump, Version)>,
) -> Result<Option<Update>, AppError> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut entries: Vec<&(RequirementBump, Version)> = Vec::new();
    for dep_ref in &refs {
        let identity = dep_ref.dependency.identify();
        if seen.insert(identity.clone()) {
            if let Some(entry) = bumped.get(&identity) {
                entries.push(entry);
            }
        }
    }
    if entries.is_empty() {
        return Ok(None);
    }

    let name = entries[0].0.state.spec.name.clone();
    let kind = entries[0].0.state.spec.kind;

    let mut targets: Vec<String> = entries.iter().map(|(_, t)| t.to_string()).collect();
    targets.sort();
    targets.dedup();
    if targets.len() > 1 {
        return Err(AggregateError::conflicting_bump_targets(&name, targets).into());
    }
    let to = targets.pop().unwrap();

    // Constraint axis: priors whose constraint string actually changes
    let mut constraint_froms: Vec<String> = entries
        .iter()
        .filter(|(req, _)| {
            req.bump
                .constraint
                .as_deref()
                .is_some_and(|c| c != req.state.spec.constraint)
        })
        .map(|(req, _)| req.state.spec.constraint.clone())
        .collect();
    constraint_froms.sort();
    constraint_froms.dedup();
    let constraint = (!constraint_froms.is_empty())
        .then(|| VersionBump::new(constraint_froms.join(", "), to.clone()));

    // Lock axis: priors of every requirement whose lock entry advances
    let has_lock_bump = entries.iter().any(|(req, _)| req.bump.lock.is_some());
    let mut lock_froms: Vec<String> = entries
        .iter()
        .filter(|(req, _)| req.bump.lock.is_some())
        .filter_map(|(req, _)| req.state.locked.as_ref().map(Version::to_string))
        .filter(|from| *from != to)
        .collect();
    lock_froms.sort();
    lock_froms.dedup();
    let lock = has_lock_bump.then(|| VersionBump::new(lock_froms.join(", "), to.clone()));

    Ok(Some(Update {
        name,
        kind,
        refs,
        requirements: entries.into_iter().map(|(req, _)| req.clone()).collect(),
        constraint,
        lock,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DependencyKind;
    use crate::error::RegistryError;
    use crate::lock::LockfileJson;
    use crate::registry::PackageMetadata;
    use crate::source::{Position, Span};
    use async_trait::async_trait;

    struct StubRegistry {
        versions: HashMap<String, Vec<Version>>,
    }

    impl StubRegistry {
        fn new() -> Self {
            Self {
                versions: HashMap::new(),
            }
        }

        fn with_versions(mut self, name: &str, versions: &[&str]) -> Self {
            self.versions.insert(
                name.to_string(),
                versions.iter().map(|v| Version::parse(v).unwrap()).collect(),
            );
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
            _name: &str,
            _version: &Version,
        ) -> Result<PackageMetadata, RegistryError> {
            Ok(PackageMetadata {
                integrity: "stub".to_string(),
                dependencies: Vec::new(),
            })
        }

        async fn head_redirect(&self, _url: &str) -> Result<Option<String>, RegistryError> {
            Ok(None)
        }

        async fn fetch_module(&self, _url: &str) -> Result<String, RegistryError> {
            Ok(String::new())
        }
    }

    fn esm_ref(specifier: &str, file: &str, line: usize) -> DependencyRef {
        DependencyRef::esm(
            DependencySpec::parse(specifier).unwrap(),
            file,
            Span::new(Position::new(line, 8), Position::new(line, 8 + specifier.len())),
        )
    }

    #[tokio::test]
    async fn test_collect_groups_refs_by_name() {
        let registry = StubRegistry::new().with_versions("@luca/flag", &["1.0.0", "1.0.1"]);
        let context = AggregationContext::new(&registry, None);

        let refs = vec![
            esm_ref("jsr:@luca/flag@1.0.0", "/proj/mod.ts", 0),
            esm_ref("jsr:@luca/flag@1.0.0", "/proj/lib.ts", 0),
        ];
        let updates = context.collect(&refs).await.unwrap().updates;
        assert_eq!(updates.len(), 1);

        let update = &updates[0];
        assert_eq!(update.name, "@luca/flag");
        assert_eq!(update.refs.len(), 2);
        assert_eq!(update.requirements.len(), 1);
        assert_eq!(
            update.constraint,
            Some(VersionBump::new("1.0.0", "1.0.1"))
        );
        assert!(update.lock.is_none());
    }

    #[tokio::test]
    async fn test_collect_up_to_date_is_empty() {
        let registry = StubRegistry::new().with_versions("chalk", &["5.3.0"]);
        let context = AggregationContext::new(&registry, None);

        let refs = vec![esm_ref("npm:chalk@5.3.0", "/proj/mod.ts", 0)];
        let updates = context.collect(&refs).await.unwrap().updates;
        assert!(updates.is_empty());
    }

    #[tokio::test]
    async fn test_collect_lock_only_update() {
        let registry = StubRegistry::new().with_versions("@std/fs", &["1.0.0", "1.2.0"]);

        let mut json = LockfileJson::empty();
        json.packages
            .specifiers
            .insert("jsr:@std/fs@^1.0.0".into(), "jsr:@std/fs@1.0.0".into());
        let lockfile = Lockfile::new("/proj/deno.lock", json);
        let context = AggregationContext::new(&registry, Some(&lockfile));

        let refs = vec![esm_ref("jsr:@std/fs@^1.0.0", "/proj/mod.ts", 0)];
        let updates = context.collect(&refs).await.unwrap().updates;
        assert_eq!(updates.len(), 1);

        let update = &updates[0];
        assert!(update.constraint.is_none());
        assert_eq!(update.lock, Some(VersionBump::new("1.0.0", "1.2.0")));
        assert_eq!(update.requirements[0].bump.lock, Some(Version::new(1, 2, 0)));
    }

    #[tokio::test]
    async fn test_collect_comma_joins_distinct_priors() {
        let registry = StubRegistry::new().with_versions("chalk", &["0.9.0", "1.0.0", "1.0.1"]);
        let context = AggregationContext::new(&registry, None);

        let refs = vec![
            esm_ref("npm:chalk@1.0.0", "/proj/a.ts", 0),
            esm_ref("npm:chalk@~0.9.0", "/proj/b.ts", 0),
        ];
        let updates = context.collect(&refs).await.unwrap().updates;
        assert_eq!(updates.len(), 1);

        let bump = updates[0].constraint.as_ref().unwrap();
        assert_eq!(bump.from, "1.0.0, ~0.9.0");
        assert_eq!(bump.to, "1.0.1");
    }

    #[tokio::test]
    async fn test_collect_conflicting_targets_fail() {
        // The pre-release requirement lands on latest while the stable one
        // lands on released; the group cannot agree on one target
        let registry = StubRegistry::new().with_versions(
            "lib",
            &["1.0.0-rc.1", "1.0.0", "2.0.0", "2.1.0-rc.1"],
        );
        let context = AggregationContext::new(&registry, None);

        let refs = vec![
            esm_ref("npm:lib@1.0.0-rc.1", "/proj/a.ts", 0),
            esm_ref("npm:lib@^1.0.0", "/proj/b.ts", 0),
        ];
        let err = context.collect(&refs).await.unwrap_err();
        assert!(format!("{}", err).contains("conflicting bump targets for 'lib'"));
    }

    #[tokio::test]
    async fn test_collect_skips_unbumpable_requirement() {
        // ^1.0.0 already admits 1.0.1 and there is no lock entry to advance,
        // so this requirement produces nothing
        let registry = StubRegistry::new().with_versions("@std/fs", &["1.0.0", "1.0.1"]);
        let context = AggregationContext::new(&registry, None);

        let refs = vec![esm_ref("jsr:@std/fs@^1.0.0", "/proj/mod.ts", 0)];
        let updates = context.collect(&refs).await.unwrap().updates;
        assert!(updates.is_empty());
    }

    #[tokio::test]
    async fn test_collect_registry_failure_skips_requirement() {
        // chalk resolves, the unknown package is reported as a failure
        let registry = StubRegistry::new().with_versions("chalk", &["5.3.0", "5.4.0"]);
        let context = AggregationContext::new(&registry, None);

        let refs = vec![
            esm_ref("npm:chalk@5.3.0", "/proj/mod.ts", 0),
            esm_ref("npm:gone@1.0.0", "/proj/mod.ts", 1),
        ];
        let aggregation = context.collect(&refs).await.unwrap();
        assert_eq!(aggregation.updates.len(), 1);
        assert_eq!(aggregation.updates[0].name, "chalk");
        assert_eq!(aggregation.failures.len(), 1);
        assert_eq!(aggregation.failures[0].requirement, "npm:gone@1.0.0");
        assert!(aggregation.failures[0].error.contains("not found"));
    }

    #[tokio::test]
    async fn test_collect_separate_names_separate_updates() {
        let registry = StubRegistry::new()
            .with_versions("@luca/flag", &["1.0.0", "1.0.1"])
            .with_versions("chalk", &["5.3.0", "5.4.0"]);
        let context = AggregationContext::new(&registry, None);

        let refs = vec![
            esm_ref("jsr:@luca/flag@1.0.0", "/proj/mod.ts", 0),
            esm_ref("npm:chalk@5.3.0", "/proj/mod.ts", 1),
        ];
        let mut updates = context.collect(&refs).await.unwrap().updates;
        updates.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].name, "@luca/flag");
        assert_eq!(updates[1].name, "chalk");
    }
}
