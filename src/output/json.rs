//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of the run report
//! - Per-dependency constraint/lock transitions and touched files

use crate::aggregate::{ResolutionFailure, Update};
use crate::domain::VersionBump;
use crate::orchestrator::{RunAction, RunReport};
use crate::output::{OutputFormatter, Verbosity};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level affects detail in output
    verbosity: Verbosity,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    fn update_to_json(&self, update: &Update) -> JsonUpdate {
        let files = if self.verbosity == Verbosity::Verbose {
            update
                .refs
                .iter()
                .map(|r| r.locator.path().display().to_string())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        } else {
            Vec::new()
        };

        JsonUpdate {
            name: update.name.clone(),
            kind: update.kind.as_str().to_string(),
            constraint: update.constraint.clone(),
            lock: update.lock.clone(),
            summary: update.summary(),
            files,
        }
    }
}

/// JSON representation of the full report
#[derive(Serialize)]
struct JsonOutput {
    /// What the run did: check, write, or commit
    action: String,
    /// Per-dependency updates
    updates: Vec<JsonUpdate>,
    /// Requirements skipped due to registry failures
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<ResolutionFailure>,
    /// Files modified by the run
    #[serde(skip_serializing_if = "Vec::is_empty")]
    touched: Vec<String>,
    /// Commit subjects created by the run
    #[serde(skip_serializing_if = "Vec::is_empty")]
    commits: Vec<String>,
}

/// JSON representation of one dependency update
#[derive(Serialize)]
struct JsonUpdate {
    /// Dependency name
    name: String,
    /// Registry or protocol kind
    kind: String,
    /// Constraint transition, when the constraint string changes
    #[serde(skip_serializing_if = "Option::is_none")]
    constraint: Option<VersionBump>,
    /// Lock transition, when the lock entry advances
    #[serde(skip_serializing_if = "Option::is_none")]
    lock: Option<VersionBump>,
    /// One-line summary
    summary: String,
    /// Files referencing the dependency (verbose only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<String>,
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &RunReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let action = match report.action {
            RunAction::Check => "check",
            RunAction::Write => "write",
            RunAction::Commit => "commit",
        };
        let output = JsonOutput {
            action: action.to_string(),
            updates: report
                .updates
                .iter()
                .map(|u| self.update_to_json(u))
                .collect(),
            failures: report.failures.clone(),
            touched: report
                .touched
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            commits: report.commits.clone(),
        };
        serde_json::to_writer_pretty(&mut *writer, &output)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DependencyKind;
    use crate::source::{DependencyRef, Position, Span};

    fn sample_report() -> RunReport {
        let spec = crate::domain::DependencySpec::parse("jsr:@luca/flag@1.0.0").unwrap();
        RunReport {
            action: RunAction::Check,
            updates: vec![Update {
                name: "@luca/flag".to_string(),
                kind: DependencyKind::Jsr,
                refs: vec![DependencyRef::esm(
                    spec,
                    "/proj/mod.ts",
                    Span::new(Position::new(0, 8), Position::new(0, 28)),
                )],
                requirements: Vec::new(),
                constraint: Some(VersionBump::new("1.0.0", "1.0.1")),
                lock: None,
            }],
            failures: Vec::new(),
            touched: Vec::new(),
            commits: Vec::new(),
        }
    }

    fn render(formatter: &JsonFormatter, report: &RunReport) -> serde_json::Value {
        let mut buffer = Vec::new();
        formatter.format(report, &mut buffer).unwrap();
        serde_json::from_slice(&buffer).unwrap()
    }

    #[test]
    fn test_json_shape() {
        let value = render(&JsonFormatter::new(Verbosity::Normal), &sample_report());
        assert_eq!(value["action"], "check");
        assert_eq!(value["updates"][0]["name"], "@luca/flag");
        assert_eq!(value["updates"][0]["kind"], "jsr");
        assert_eq!(value["updates"][0]["constraint"]["from"], "1.0.0");
        assert_eq!(value["updates"][0]["constraint"]["to"], "1.0.1");
        assert_eq!(
            value["updates"][0]["summary"],
            "bump @luca/flag from 1.0.0 to 1.0.1"
        );
        assert!(value["updates"][0].get("lock").is_none());
    }

    #[test]
    fn test_json_files_only_in_verbose() {
        let normal = render(&JsonFormatter::new(Verbosity::Normal), &sample_report());
        assert!(normal["updates"][0].get("files").is_none());

        let verbose = render(&JsonFormatter::new(Verbosity::Verbose), &sample_report());
        assert_eq!(verbose["updates"][0]["files"][0], "/proj/mod.ts");
    }

    #[test]
    fn test_json_failures_included() {
        let mut report = sample_report();
        report.failures.push(ResolutionFailure {
            requirement: "npm:gone@1.0.0".to_string(),
            error: "package not found: gone".to_string(),
        });
        let value = render(&JsonFormatter::new(Verbosity::Normal), &report);
        assert_eq!(value["failures"][0]["requirement"], "npm:gone@1.0.0");

        let clean = render(&JsonFormatter::new(Verbosity::Normal), &sample_report());
        assert!(clean.get("failures").is_none());
    }

    #[test]
    fn test_json_commit_report() {
        let mut report = sample_report();
        report.action = RunAction::Commit;
        report.commits.push("bump @luca/flag to 1.0.1".to_string());
        let value = render(&JsonFormatter::new(Verbosity::Normal), &report);
        assert_eq!(value["action"], "commit");
        assert_eq!(value["commits"][0], "bump @luca/flag to 1.0.1");
    }
}
