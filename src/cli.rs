//! CLI argument parsing module for modup

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Dependency update tool for module-graph projects
#[derive(Parser, Debug, Clone)]
#[command(
    name = "modup",
    version,
    about = "Update jsr/npm/http dependencies across modules, import maps, and lockfiles"
)]
pub struct CliArgs {
    /// Entrypoint modules to scan (default: discovered in the project root)
    pub entrypoints: Vec<PathBuf>,

    /// Project root used for discovery and git operations
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    // Actions
    /// Write the updates to disk (default is report-only)
    #[arg(short, long)]
    pub write: bool,

    /// Commit each update separately (implies --write)
    #[arg(long)]
    pub commit: bool,

    /// Prefix prepended to every commit subject (e.g. "chore: ")
    #[arg(long)]
    pub prefix: Option<String>,

    /// Shell command to run before each commit
    #[arg(long = "pre-commit")]
    pub pre_commit: Option<String>,

    /// Shell command to run after each commit
    #[arg(long = "post-commit")]
    pub post_commit: Option<String>,

    // Project artifacts
    /// Import map or deno.json to update (default: discovered)
    #[arg(long = "import-map")]
    pub import_map: Option<PathBuf>,

    /// Lockfile to update (default: discovered deno.lock)
    #[arg(long)]
    pub lockfile: Option<PathBuf>,

    // Package filters
    /// Update only specific packages (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub only: Vec<String>,

    /// Exclude specific packages from update (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Do not follow relative imports from the entrypoints
    #[arg(long = "no-resolve-local")]
    pub no_resolve_local: bool,

    // Output options
    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long)]
    pub quiet: bool,
}

impl CliArgs {
    /// Check if a dependency should be processed based on name filters
    pub fn should_process_package(&self, name: &str) -> bool {
        if !self.only.is_empty() {
            return self.only.iter().any(|p| p == name);
        }
        if self.exclude.iter().any(|p| p == name) {
            return false;
        }
        true
    }

    /// Whether relative imports are followed into the local graph
    pub fn resolve_local(&self) -> bool {
        !self.no_resolve_local
    }

    /// Whether any write to disk is requested
    pub fn writes(&self) -> bool {
        self.write || self.commit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(["modup"]);
        assert!(args.entrypoints.is_empty());
        assert_eq!(args.root, PathBuf::from("."));
        assert!(!args.write);
        assert!(!args.commit);
        assert!(args.prefix.is_none());
        assert!(args.import_map.is_none());
        assert!(args.lockfile.is_none());
        assert!(args.only.is_empty());
        assert!(args.exclude.is_empty());
        assert!(!args.no_resolve_local);
        assert!(!args.json);
        assert!(!args.verbose);
        assert!(!args.quiet);
    }

    #[test]
    fn test_entrypoints() {
        let args = CliArgs::parse_from(["modup", "mod.ts", "cli.ts"]);
        assert_eq!(
            args.entrypoints,
            vec![PathBuf::from("mod.ts"), PathBuf::from("cli.ts")]
        );
    }

    #[test]
    fn test_write_flags() {
        let args = CliArgs::parse_from(["modup", "-w"]);
        assert!(args.write);
        assert!(args.writes());

        let args = CliArgs::parse_from(["modup", "--commit"]);
        assert!(!args.write);
        assert!(args.writes());
    }

    #[test]
    fn test_commit_options() {
        let args = CliArgs::parse_from([
            "modup",
            "--commit",
            "--prefix",
            "chore: ",
            "--pre-commit",
            "deno fmt",
            "--post-commit",
            "deno test",
        ]);
        assert!(args.commit);
        assert_eq!(args.prefix.as_deref(), Some("chore: "));
        assert_eq!(args.pre_commit.as_deref(), Some("deno fmt"));
        assert_eq!(args.post_commit.as_deref(), Some("deno test"));
    }

    #[test]
    fn test_artifact_paths() {
        let args = CliArgs::parse_from([
            "modup",
            "--import-map",
            "deno.json",
            "--lockfile",
            "deno.lock",
        ]);
        assert_eq!(args.import_map, Some(PathBuf::from("deno.json")));
        assert_eq!(args.lockfile, Some(PathBuf::from("deno.lock")));
    }

    #[test]
    fn test_only_and_exclude_multiple() {
        let args = CliArgs::parse_from([
            "modup", "--only", "@std/fs", "--only", "chalk", "--exclude", "left-pad",
        ]);
        assert_eq!(args.only, vec!["@std/fs", "chalk"]);
        assert_eq!(args.exclude, vec!["left-pad"]);
    }

    #[test]
    fn test_should_process_package() {
        let args = CliArgs::parse_from(["modup"]);
        assert!(args.should_process_package("anything"));

        let args = CliArgs::parse_from(["modup", "--exclude", "chalk"]);
        assert!(!args.should_process_package("chalk"));
        assert!(args.should_process_package("@std/fs"));

        let args = CliArgs::parse_from(["modup", "--only", "chalk"]);
        assert!(args.should_process_package("chalk"));
        assert!(!args.should_process_package("@std/fs"));
    }

    #[test]
    fn test_resolve_local_toggle() {
        let args = CliArgs::parse_from(["modup"]);
        assert!(args.resolve_local());

        let args = CliArgs::parse_from(["modup", "--no-resolve-local"]);
        assert!(!args.resolve_local());
    }

    #[test]
    fn test_output_flags() {
        let args = CliArgs::parse_from(["modup", "--json", "--verbose"]);
        assert!(args.json);
        assert!(args.verbose);

        let args = CliArgs::parse_from(["modup", "-q"]);
        assert!(args.quiet);
    }
}
