//! Version-control and hook subprocess integration
//!
//! This module provides:
//! - The [GitRunner] contract used by the commit workflow
//! - [SystemGit]: the default runner executing real `git` commands
//! - Pre/post commit hook execution via the user's shell

use crate::error::VcsError;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Trait for running git operations during the commit workflow
pub trait GitRunner {
    /// Stage the given paths
    fn add(&self, paths: &[PathBuf]) -> Result<(), VcsError>;

    /// Commit the staged paths with a message
    fn commit(&self, message: &str) -> Result<(), VcsError>;
}

/// Default git runner executing real commands in a working directory
#[derive(Debug, Clone)]
pub struct SystemGit {
    working_dir: PathBuf,
}

impl SystemGit {
    /// Create a runner rooted at `working_dir`
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<(), VcsError> {
        let command_str = format!("git {}", args.join(" "));
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.working_dir)
            .output()
            .map_err(|e| VcsError::Spawn {
                command: command_str.clone(),
                source: e,
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(VcsError::command(command_str, stderr));
        }
        Ok(())
    }
}

impl GitRunner for SystemGit {
    fn add(&self, paths: &[PathBuf]) -> Result<(), VcsError> {
        let mut args = vec!["add", "--"];
        let rendered: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        args.extend(rendered.iter().map(String::as_str));
        self.run(&args)
    }

    fn commit(&self, message: &str) -> Result<(), VcsError> {
        self.run(&["commit", "-m", message])
    }
}

/// Run a user-supplied hook command through the shell
///
/// Non-zero exit aborts the commit workflow for the current group.
pub fn run_hook(command: &str, working_dir: &Path) -> Result<(), VcsError> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(working_dir)
        .output()
        .map_err(|e| VcsError::Spawn {
            command: command.to_string(),
            source: e,
        })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(VcsError::command(command, stderr));
    }
    Ok(())
}
