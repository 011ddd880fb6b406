//! Commit grouping for the commit workflow
//!
//! This module provides:
//! - [CommitSequencer]: partitions reconciled updates into commit groups
//!   with a caller-supplied key function and composes each group's subject
//! - [UpdateGroup]: one planned commit and the updates it covers
//!
//! The default policy is one commit per dependency name, with the update's
//! own summary as the subject.

use super::Update;
use crate::error::VcsError;
use crate::vcs::GitRunner;
use std::path::PathBuf;

/// Derives the commit group key for an update
pub type GroupKeyFn = dyn Fn(&Update) -> String + Send + Sync;

/// Composes a commit subject from a group key and its updates
pub type MessageFn = dyn Fn(&str, &[&Update]) -> String + Send + Sync;

/// Partitions updates into commits and composes their subjects
pub struct CommitSequencer {
    group_key: Box<GroupKeyFn>,
    message: Box<MessageFn>,
    prefix: Option<String>,
}

impl CommitSequencer {
    /// Create a sequencer with the per-name default policy
    pub fn new() -> Self {
        Self {
            group_key: Box::new(|update: &Update| update.name.clone()),
            message: Box::new(default_message),
            prefix: None,
        }
    }

    /// Replace the grouping key function
    pub fn with_group_key(
        mut self,
        key: impl Fn(&Update) -> String + Send + Sync + 'static,
    ) -> Self {
        self.group_key = Box::new(key);
        self
    }

    /// Replace the subject composer
    pub fn with_message(
        mut self,
        message: impl Fn(&str, &[&Update]) -> String + Send + Sync + 'static,
    ) -> Self {
        self.message = Box::new(message);
        self
    }

    /// Prepend a prefix to every composed subject
    pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix;
        self
    }

    /// Partition updates into commit groups, preserving first-seen key order
    pub fn groups<'u>(&self, updates: &'u [Update]) -> Vec<UpdateGroup<'u>> {
        let mut groups: Vec<UpdateGroup<'u>> = Vec::new();
        for update in updates {
            let key = (self.group_key)(update);
            match groups.iter_mut().find(|group| group.key == key) {
                Some(group) => group.updates.push(update),
                None => groups.push(UpdateGroup {
                    key,
                    updates: vec![update],
                }),
            }
        }
        groups
    }

    /// The commit subject for one group
    pub fn message_for(&self, group: &UpdateGroup<'_>) -> String {
        let subject = (self.message)(&group.key, &group.updates);
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, subject),
            None => subject,
        }
    }
}

impl Default for CommitSequencer {
    fn default() -> Self {
        Self::new()
    }
}

/// One planned commit and the updates it covers
pub struct UpdateGroup<'u> {
    /// The grouping key the sequencer derived
    pub key: String,
    /// Updates committed together
    pub updates: Vec<&'u Update>,
}

impl UpdateGroup<'_> {
    /// Stage and commit the given paths with a message
    pub fn commit(
        &self,
        git: &dyn GitRunner,
        paths: &[PathBuf],
        message: &str,
    ) -> Result<(), VcsError> {
        git.add(paths)?;
        git.commit(message)
    }
}

/// A lone update keeps its own summary; larger groups fall back to the key
fn default_message(key: &str, updates: &[&Update]) -> String {
    match updates {
        [update] => update.summary(),
        _ => format!("bump {}", key),
    }
}
