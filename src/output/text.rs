//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Per-dependency update lines with colors and change-type labels
//! - Dry-run marking when the run did not write anything
//! - Verbose per-file reference listings
//! - A closing summary line

use crate::aggregate::Update;
use crate::domain::VersionBump;
use crate::orchestrator::{RunAction, RunReport};
use crate::output::{OutputFormatter, Verbosity};
use colored::Colorize;
use semver::Version;
use std::collections::BTreeSet;
use std::io::Write;

/// Semantic version change type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionChangeType {
    /// Major version change (breaking)
    Major,
    /// Minor version change (features)
    Minor,
    /// Patch version change (fixes)
    Patch,
    /// Unknown or unparseable
    Unknown,
}

impl VersionChangeType {
    /// Determine the change type between two version-ish strings
    ///
    /// `old` may be a constraint (`^1.0.0`) or a comma-joined list; the first
    /// entry is stripped of its operator and compared against `new`.
    pub fn from_versions(old: &str, new: &str) -> Self {
        let first = old.split(',').next().unwrap_or(old).trim();
        let first = first.trim_start_matches(['^', '~']);
        match (Version::parse(first), Version::parse(new)) {
            (Ok(old), Ok(new)) => {
                if new.major != old.major {
                    VersionChangeType::Major
                } else if new.minor != old.minor {
                    VersionChangeType::Minor
                } else {
                    VersionChangeType::Patch
                }
            }
            _ => VersionChangeType::Unknown,
        }
    }

    /// Get the display label with color
    pub fn colored_label(&self) -> String {
        match self {
            VersionChangeType::Major => "major".red().bold().to_string(),
            VersionChangeType::Minor => "minor".yellow().to_string(),
            VersionChangeType::Patch => "patch".green().to_string(),
            VersionChangeType::Unknown => "?".dimmed().to_string(),
        }
    }

    /// Get the plain label
    pub fn label(&self) -> &'static str {
        match self {
            VersionChangeType::Major => "major",
            VersionChangeType::Minor => "minor",
            VersionChangeType::Patch => "patch",
            VersionChangeType::Unknown => "?",
        }
    }
}

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    /// The display transition for an update: constraint first, else lock
    fn bump_of(update: &Update) -> Option<&VersionBump> {
        update.constraint.as_ref().or(update.lock.as_ref())
    }

    fn format_update_line(
        &self,
        update: &Update,
        max_name_len: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let Some(bump) = Self::bump_of(update) else {
            return Ok(());
        };
        let change_type = VersionChangeType::from_versions(&bump.from, &bump.to);
        let lock_marker = if update.constraint.is_none() { " (lock)" } else { "" };

        if self.color {
            writeln!(
                writer,
                "  {:width$} {} {} {} [{}]{}",
                update.name,
                bump.from.dimmed(),
                "→".dimmed(),
                bump.to.bright_white().bold(),
                change_type.colored_label(),
                lock_marker.dimmed(),
                width = max_name_len
            )
        } else {
            writeln!(
                writer,
                "  {:width$} {} -> {} [{}]{}",
                update.name,
                bump.from,
                bump.to,
                change_type.label(),
                lock_marker,
                width = max_name_len
            )
        }
    }

    fn format_failures(&self, report: &RunReport, writer: &mut dyn Write) -> std::io::Result<()> {
        for failure in &report.failures {
            let line = format!(
                "warning: could not resolve {}: {}",
                failure.requirement, failure.error
            );
            if self.color {
                writeln!(writer, "{}", line.yellow())?;
            } else {
                writeln!(writer, "{}", line)?;
            }
        }
        Ok(())
    }

    fn format_refs(&self, update: &Update, writer: &mut dyn Write) -> std::io::Result<()> {
        let files: BTreeSet<String> = update
            .refs
            .iter()
            .map(|r| r.locator.path().display().to_string())
            .collect();
        for file in files {
            if self.color {
                writeln!(writer, "    {}", file.dimmed())?;
            } else {
                writeln!(writer, "    {}", file)?;
            }
        }
        Ok(())
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, report: &RunReport, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.verbosity != Verbosity::Quiet {
            self.format_failures(report, writer)?;
        }

        if report.updates.is_empty() {
            if self.verbosity != Verbosity::Quiet && report.failures.is_empty() {
                writeln!(writer, "all dependencies are up to date")?;
            }
            return Ok(());
        }

        let max_name_len = report
            .updates
            .iter()
            .map(|u| u.name.len())
            .max()
            .unwrap_or(0);

        if self.verbosity != Verbosity::Quiet && report.action == RunAction::Check {
            let header = "found updates (dry-run, pass --write to apply):";
            if self.color {
                writeln!(writer, "{}", header.cyan())?;
            } else {
                writeln!(writer, "{}", header)?;
            }
        }

        for update in &report.updates {
            self.format_update_line(update, max_name_len, writer)?;
            if self.verbosity == Verbosity::Verbose {
                self.format_refs(update, writer)?;
            }
        }

        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }

        match report.action {
            RunAction::Check => {}
            RunAction::Write => {
                writeln!(writer, "updated {} file(s)", report.touched.len())?;
            }
            RunAction::Commit => {
                for message in &report.commits {
                    if self.color {
                        writeln!(writer, "committed {}", message.green())?;
                    } else {
                        writeln!(writer, "committed {}", message)?;
                    }
                }
            }
        }
        Ok(())
    }
}
