//! Orchestrator for the full update workflow
//!
//! This module provides:
//! - Discovery of entrypoints, the import map, and the lockfile
//! - Workflow coordination: scan -> collect -> report/write/commit
//! - Commit sequencing with pre/post hooks, one commit per dependency

use crate::aggregate::{AggregationContext, CommitSequencer, ResolutionFailure, Update};
use crate::cli::CliArgs;
use crate::error::{AppError, IoError};
use crate::lock::Lockfile;
use crate::progress::Progress;
use crate::registry::{HttpClient, HttpRegistry, Registry};
use crate::source::{collect_refs, EsmScanner, GraphBuilder, ImportMapFile};
use crate::vcs::{run_hook, GitRunner, SystemGit};
use std::path::{Path, PathBuf};

/// Module extensions considered during entrypoint discovery
const MODULE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "mjs"];

/// Import-map files looked for in the project root, in order
const IMPORT_MAP_CANDIDATES: &[&str] = &["deno.json", "import_map.json"];

/// Default lockfile name
const LOCKFILE_NAME: &str = "deno.lock";

/// What a run did to the project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunAction {
    /// Report-only: nothing written
    Check,
    /// Updates written to disk
    Write,
    /// Updates written and committed per dependency
    Commit,
}

/// The outcome of one run, consumed by the output formatters
#[derive(Debug)]
pub struct RunReport {
    /// What the run did
    pub action: RunAction,
    /// Reconciled per-name updates
    pub updates: Vec<Update>,
    /// Requirements skipped due to registry failures
    pub failures: Vec<ResolutionFailure>,
    /// Files modified by the run
    pub touched: Vec<PathBuf>,
    /// Commit subjects created by the run
    pub commits: Vec<String>,
}

/// Coordinates one full update run
pub struct Orchestrator {
    args: CliArgs,
}

impl Orchestrator {
    /// Create a new orchestrator with the given CLI arguments
    pub fn new(args: CliArgs) -> Self {
        Self { args }
    }

    /// Run the workflow against the real registries and git
    pub async fn run(&self) -> Result<RunReport, AppError> {
        let registry = HttpRegistry::new(HttpClient::new()?);
        let git = SystemGit::new(&self.args.root);
        self.run_with(&registry, &git).await
    }

    /// Run the workflow with injected registry and git (for testing)
    pub async fn run_with(
        &self,
        registry: &dyn Registry,
        git: &dyn GitRunner,
    ) -> Result<RunReport, AppError> {
        let mut progress = Progress::new(!self.args.quiet && !self.args.json);
        let action = if self.args.commit {
            RunAction::Commit
        } else if self.args.write {
            RunAction::Write
        } else {
            RunAction::Check
        };

        let entrypoints = if self.args.entrypoints.is_empty() {
            discover_entrypoints(&self.args.root)?
        } else {
            self.args.entrypoints.clone()
        };
        let import_map_path = self
            .args
            .import_map
            .clone()
            .or_else(|| discover_import_map(&self.args.root));
        let lockfile_path = self
            .args
            .lockfile
            .clone()
            .or_else(|| discover_lockfile(&self.args.root));

        progress.spinner("scanning modules");
        let scanner = EsmScanner::new().with_resolve_local(self.args.resolve_local());
        let modules = scanner.build(&entrypoints)?;
        let import_map = match import_map_path {
            Some(path) => {
                let map = ImportMapFile::read(path)?;
                map.has_entries().then_some(map)
            }
            None => None,
        };
        progress.finish_and_clear();

        let mut lockfile = match lockfile_path {
            Some(path) => Some(Lockfile::read(path)?),
            None => None,
        };

        let mut refs = collect_refs(&modules, import_map.as_ref());
        refs.retain(|r| self.args.should_process_package(&r.dependency.name));

        progress.spinner("resolving dependencies");
        let aggregation = {
            let context = AggregationContext::new(registry, lockfile.as_ref());
            context.collect(&refs).await?
        };
        progress.finish_and_clear();

        let mut touched = Vec::new();
        let mut commits = Vec::new();
        match action {
            RunAction::Check => {}
            RunAction::Write => {
                for update in &aggregation.updates {
                    touched.extend(update.write(registry, lockfile.as_mut()).await?);
                }
            }
            RunAction::Commit => {
                let sequencer = CommitSequencer::new().with_prefix(self.args.prefix.clone());
                for group in sequencer.groups(&aggregation.updates) {
                    let mut paths = Vec::new();
                    for update in &group.updates {
                        paths.extend(update.write(registry, lockfile.as_mut()).await?);
                    }
                    paths.sort();
                    paths.dedup();
                    if paths.is_empty() {
                        continue;
                    }
                    if let Some(hook) = &self.args.pre_commit {
                        run_hook(hook, &self.args.root)?;
                    }
                    let message = sequencer.message_for(&group);
                    group.commit(git, &paths, &message)?;
                    if let Some(hook) = &self.args.post_commit {
                        run_hook(hook, &self.args.root)?;
                    }
                    commits.push(message);
                    touched.extend(paths);
                }
            }
        }
        touched.sort();
        touched.dedup();

        Ok(RunReport {
            action,
            updates: aggregation.updates,
            failures: aggregation.failures,
            touched,
            commits,
        })
    }
}

/// Root-level modules used as entrypoints when none are given
fn discover_entrypoints(root: &Path) -> Result<Vec<PathBuf>, IoError> {
    let entries = std::fs::read_dir(root).map_err(|e| IoError::read(root, e))?;
    let mut found = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let is_module = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| MODULE_EXTENSIONS.contains(&ext));
        if is_module && path.is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// First import-map candidate present in the project root
fn discover_import_map(root: &Path) -> Option<PathBuf> {
    IMPORT_MAP_CANDIDATES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

/// The lockfile, when the project has one
fn discover_lockfile(root: &Path) -> Option<PathBuf> {
    let path = root.join(LOCKFILE_NAME);
    path.is_file().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DependencyKind;
    use crate::error::{RegistryError, VcsError};
    use crate::registry::PackageMetadata;
    use async_trait::async_trait;
    use clap::Parser;
    use semver::Version;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::Mutex;

    struct StubRegistry {
        versions: HashMap<String, Vec<Version>>,
    }

    impl StubRegistry {
        fn with_versions(name: &str, versions: &[&str]) -> Self {
            let mut map = HashMap::new();
            map.insert(
                name.to_string(),
                versions.iter().map(|v| Version::parse(v).unwrap()).collect(),
            );
            Self { versions: map }
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
                integrity: "stub-integrity".to_string(),
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

    #[derive(Default)]
    struct RecordingGit {
        added: Mutex<Vec<Vec<PathBuf>>>,
        commits: Mutex<Vec<String>>,
    }

    impl GitRunner for RecordingGit {
        fn add(&self, paths: &[PathBuf]) -> Result<(), VcsError> {
            self.added.lock().unwrap().push(paths.to_vec());
            Ok(())
        }

        fn commit(&self, message: &str) -> Result<(), VcsError> {
            self.commits.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_discover_entrypoints() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mod.ts"), "").unwrap();
        fs::write(dir.path().join("cli.ts"), "").unwrap();
        fs::write(dir.path().join("readme.md"), "").unwrap();
        fs::create_dir(dir.path().join("src.ts")).unwrap();

        let found = discover_entrypoints(dir.path()).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found[0].ends_with("cli.ts"));
        assert!(found[1].ends_with("mod.ts"));
    }

    #[test]
    fn test_discover_import_map_prefers_deno_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("deno.json"), "{}").unwrap();
        fs::write(dir.path().join("import_map.json"), "{}").unwrap();

        let found = discover_import_map(dir.path()).unwrap();
        assert!(found.ends_with("deno.json"));
    }

    #[test]
    fn test_discover_lockfile_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_lockfile(dir.path()).is_none());
    }

    #[tokio::test]
    async fn test_check_run_reports_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("mod.ts");
        fs::write(&entry, "import \"jsr:@luca/flag@1.0.0\";\n").unwrap();

        let registry = StubRegistry::with_versions("@luca/flag", &["1.0.0", "1.0.1"]);
        let git = RecordingGit::default();
        let args = CliArgs::parse_from([
            "modup",
            entry.to_str().unwrap(),
            "--root",
            dir.path().to_str().unwrap(),
        ]);
        let report = Orchestrator::new(args).run_with(&registry, &git).await.unwrap();

        assert_eq!(report.action, RunAction::Check);
        assert_eq!(report.updates.len(), 1);
        assert!(report.touched.is_empty());
        assert_eq!(
            fs::read_to_string(&entry).unwrap(),
            "import \"jsr:@luca/flag@1.0.0\";\n"
        );
    }

    #[tokio::test]
    async fn test_write_run_rewrites_module() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("mod.ts");
        fs::write(&entry, "import \"jsr:@luca/flag@1.0.0\";\n").unwrap();

        let registry = StubRegistry::with_versions("@luca/flag", &["1.0.0", "1.0.1"]);
        let git = RecordingGit::default();
        let args = CliArgs::parse_from([
            "modup",
            entry.to_str().unwrap(),
            "--root",
            dir.path().to_str().unwrap(),
            "--write",
        ]);
        let report = Orchestrator::new(args).run_with(&registry, &git).await.unwrap();

        assert_eq!(report.action, RunAction::Write);
        assert_eq!(report.touched, vec![entry.clone()]);
        assert_eq!(
            fs::read_to_string(&entry).unwrap(),
            "import \"jsr:@luca/flag@1.0.1\";\n"
        );
        assert!(git.commits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_two_dependencies_on_one_line() {
        // Both bumps lengthen their specifier; the second update must not
        // splice with coordinates shifted by the first
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("mod.ts");
        fs::write(
            &entry,
            "import \"npm:aaa@1.9.0\"; import \"npm:bbb@1.9.0\";\n",
        )
        .unwrap();

        let mut registry = StubRegistry::with_versions("aaa", &["1.9.0", "1.10.0"]);
        registry.versions.insert(
            "bbb".to_string(),
            vec![Version::parse("1.9.0").unwrap(), Version::parse("1.10.0").unwrap()],
        );
        let git = RecordingGit::default();
        let args = CliArgs::parse_from([
            "modup",
            entry.to_str().unwrap(),
            "--root",
            dir.path().to_str().unwrap(),
            "--write",
        ]);
        let report = Orchestrator::new(args).run_with(&registry, &git).await.unwrap();

        assert_eq!(report.updates.len(), 2);
        assert_eq!(
            fs::read_to_string(&entry).unwrap(),
            "import \"npm:aaa@1.10.0\"; import \"npm:bbb@1.10.0\";\n"
        );
    }

    #[tokio::test]
    async fn test_commit_run_commits_per_dependency() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("mod.ts");
        fs::write(&entry, "import \"jsr:@luca/flag@1.0.0\";\n").unwrap();

        let registry = StubRegistry::with_versions("@luca/flag", &["1.0.0", "1.0.1"]);
        let git = RecordingGit::default();
        let args = CliArgs::parse_from([
            "modup",
            entry.to_str().unwrap(),
            "--root",
            dir.path().to_str().unwrap(),
            "--commit",
            "--prefix",
            "chore: ",
        ]);
        let report = Orchestrator::new(args).run_with(&registry, &git).await.unwrap();

        assert_eq!(report.action, RunAction::Commit);
        assert_eq!(
            report.commits,
            vec!["chore: bump @luca/flag from 1.0.0 to 1.0.1"]
        );
        assert_eq!(git.added.lock().unwrap().len(), 1);
        assert_eq!(
            git.commits.lock().unwrap()[0],
            "chore: bump @luca/flag from 1.0.0 to 1.0.1"
        );
    }

    /// Appends its git operations to the same log file the hooks write to,
    /// so the test can observe hook ordering around each commit
    struct FileLogGit {
        log: PathBuf,
    }

    impl FileLogGit {
        fn append(&self, line: &str) {
            use std::io::Write as _;
            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log)
                .unwrap();
            writeln!(file, "{}", line).unwrap();
        }
    }

    impl GitRunner for FileLogGit {
        fn add(&self, _paths: &[PathBuf]) -> Result<(), VcsError> {
            self.append("add");
            Ok(())
        }

        fn commit(&self, _message: &str) -> Result<(), VcsError> {
            self.append("commit");
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_hooks_run_around_each_commit() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("mod.ts");
        fs::write(&entry, "import \"jsr:@luca/flag@1.0.0\";\n").unwrap();
        let log = dir.path().join("order.log");

        let registry = StubRegistry::with_versions("@luca/flag", &["1.0.0", "1.0.1"]);
        let git = FileLogGit { log: log.clone() };
        let args = CliArgs::parse_from([
            "modup",
            entry.to_str().unwrap(),
            "--root",
            dir.path().to_str().unwrap(),
            "--commit",
            "--pre-commit",
            "echo pre >> order.log",
            "--post-commit",
            "echo post >> order.log",
        ]);
        let report = Orchestrator::new(args).run_with(&registry, &git).await.unwrap();

        assert_eq!(report.commits.len(), 1);
        let recorded = fs::read_to_string(&log).unwrap();
        assert_eq!(
            recorded.lines().collect::<Vec<_>>(),
            ["pre", "add", "commit", "post"]
        );
    }

    #[tokio::test]
    async fn test_failing_pre_commit_hook_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("mod.ts");
        fs::write(&entry, "import \"jsr:@luca/flag@1.0.0\";\n").unwrap();

        let registry = StubRegistry::with_versions("@luca/flag", &["1.0.0", "1.0.1"]);
        let git = RecordingGit::default();
        let args = CliArgs::parse_from([
            "modup",
            entry.to_str().unwrap(),
            "--root",
            dir.path().to_str().unwrap(),
            "--commit",
            "--pre-commit",
            "exit 1",
        ]);
        let err = Orchestrator::new(args).run_with(&registry, &git).await.unwrap_err();

        assert!(format!("{}", err).contains("exit 1"));
        assert!(git.commits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exclude_filter_skips_dependency() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("mod.ts");
        fs::write(&entry, "import \"jsr:@luca/flag@1.0.0\";\n").unwrap();

        let registry = StubRegistry::with_versions("@luca/flag", &["1.0.0", "1.0.1"]);
        let git = RecordingGit::default();
        let args = CliArgs::parse_from([
            "modup",
            entry.to_str().unwrap(),
            "--root",
            dir.path().to_str().unwrap(),
            "--exclude",
            "@luca/flag",
        ]);
        let report = Orchestrator::new(args).run_with(&registry, &git).await.unwrap();
        assert!(report.updates.is_empty());
    }
}
