// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The session manifest: the entire session state as one serializable
//! record. Exclusively owned by the orchestrator of the active session;
//! external readers only ever see the on-disk snapshot.

use crate::entry::Entry;
use crate::thread::{Post, ThreadState, ThreadStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Current manifest schema version. Readers that encounter an unknown
/// version refuse to load.
pub const MANIFEST_VERSION: u32 = 1;

/// Errors from manifest mutations
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("unknown thread: {0}")]
    UnknownThread(String),
    #[error("duplicate thread: {0}")]
    DuplicateThread(String),
    #[error("invalid status transition for {post_id}: {from} -> {to}")]
    InvalidTransition {
        post_id: String,
        from: ThreadStatus,
        to: ThreadStatus,
    },
    #[error("thread {0} cannot become extracted with no entries")]
    EmptyEntries(String),
}

/// Reference to the form a session was created from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormRef {
    pub title: String,
    pub path: String,
    /// SHA-256 of the form's raw content
    pub hash: String,
}

/// Terminal status of one orchestrator invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

crate::simple_display! {
    RunStatus {
        Running => "running",
        Completed => "completed",
        Interrupted => "interrupted",
        Failed => "failed",
    }
}

/// Record of one orchestrator invocation over a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    pub id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    #[serde(default)]
    pub threads_processed: u64,
}

/// The entire session state as a single serializable record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub form: FormRef,
    pub query: String,
    #[serde(default)]
    pub subreddits: Vec<String>,
    #[serde(default)]
    pub discovered_subreddits: bool,
    #[serde(default)]
    pub threads: Vec<ThreadState>,
    #[serde(default)]
    pub runs: Vec<RunLog>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Manifest {
    pub fn new(form: FormRef, query: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            form,
            query: query.into(),
            subreddits: Vec::new(),
            discovered_subreddits: false,
            threads: Vec::new(),
            runs: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Find a thread's index by post id
    pub fn find_thread(&self, post_id: &str) -> Option<usize> {
        self.threads.iter().position(|t| t.post_id == post_id)
    }

    pub fn thread(&self, post_id: &str) -> Option<&ThreadState> {
        self.threads.iter().find(|t| t.post_id == post_id)
    }

    /// Append a newly discovered post. Returns false (and leaves the
    /// manifest untouched) when the post id is already present.
    pub fn add_thread(&mut self, post: &Post, now: DateTime<Utc>) -> bool {
        if self.find_thread(&post.id).is_some() {
            return false;
        }
        self.threads.push(ThreadState::from_post(post));
        self.updated_at = now;
        true
    }

    /// Transition a thread's status, enforcing the state machine.
    pub fn set_thread_status(
        &mut self,
        post_id: &str,
        status: ThreadStatus,
        now: DateTime<Utc>,
    ) -> Result<(), ManifestError> {
        let idx = self
            .find_thread(post_id)
            .ok_or_else(|| ManifestError::UnknownThread(post_id.to_string()))?;
        let from = self.threads[idx].status;
        if !from.can_transition_to(status) {
            return Err(ManifestError::InvalidTransition {
                post_id: post_id.to_string(),
                from,
                to: status,
            });
        }
        self.threads[idx].status = status;
        if status == ThreadStatus::Collected {
            self.threads[idx].collected_at = Some(now);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Mark a thread skipped with the evaluator's reason.
    pub fn skip_thread(
        &mut self,
        post_id: &str,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ManifestError> {
        self.set_thread_status(post_id, ThreadStatus::Skipped, now)?;
        if let Some(idx) = self.find_thread(post_id) {
            self.threads[idx].skip_reason = Some(reason.into());
        }
        Ok(())
    }

    /// Mark a thread failed with the error string.
    pub fn fail_thread(
        &mut self,
        post_id: &str,
        error: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ManifestError> {
        self.set_thread_status(post_id, ThreadStatus::Failed, now)?;
        if let Some(idx) = self.find_thread(post_id) {
            self.threads[idx].error = Some(error.into());
        }
        Ok(())
    }

    /// Store extracted entries and transition to `extracted`.
    pub fn set_thread_entries(
        &mut self,
        post_id: &str,
        entries: Vec<Entry>,
        now: DateTime<Utc>,
    ) -> Result<(), ManifestError> {
        if entries.is_empty() {
            return Err(ManifestError::EmptyEntries(post_id.to_string()));
        }
        self.set_thread_status(post_id, ThreadStatus::Extracted, now)?;
        if let Some(idx) = self.find_thread(post_id) {
            self.threads[idx].entries = entries;
            self.threads[idx].extracted_at = Some(now);
        }
        Ok(())
    }

    /// Transition an extracted thread to `ranked`.
    pub fn mark_ranked(&mut self, post_id: &str, now: DateTime<Utc>) -> Result<(), ManifestError> {
        self.set_thread_status(post_id, ThreadStatus::Ranked, now)
    }

    /// Count threads per status over the current thread list.
    pub fn counts_by_status(&self) -> BTreeMap<ThreadStatus, usize> {
        let mut counts = BTreeMap::new();
        for t in &self.threads {
            *counts.entry(t.status).or_insert(0) += 1;
        }
        counts
    }

    pub fn count_in(&self, status: ThreadStatus) -> usize {
        self.threads.iter().filter(|t| t.status == status).count()
    }

    /// Threads currently in the given status, in insertion order.
    pub fn threads_in(&self, status: ThreadStatus) -> Vec<&ThreadState> {
        self.threads.iter().filter(|t| t.status == status).collect()
    }

    /// Threads that still count toward the overprovision target:
    /// pending + collected + extracted + ranked.
    pub fn actionable_count(&self) -> usize {
        self.threads
            .iter()
            .filter(|t| {
                matches!(
                    t.status,
                    ThreadStatus::Pending
                        | ThreadStatus::Collected
                        | ThreadStatus::Extracted
                        | ThreadStatus::Ranked
                )
            })
            .count()
    }

    /// Threads that met the extraction goal: extracted + ranked.
    pub fn goal_count(&self) -> usize {
        self.count_in(ThreadStatus::Extracted) + self.count_in(ThreadStatus::Ranked)
    }

    /// Append a new running RunLog.
    pub fn start_run(&mut self, id: impl Into<String>, now: DateTime<Utc>) {
        self.runs.push(RunLog {
            id: id.into(),
            started_at: now,
            completed_at: None,
            status: RunStatus::Running,
            threads_processed: 0,
        });
        self.updated_at = now;
    }

    /// Set the terminal status on the last RunLog.
    pub fn complete_run(&mut self, status: RunStatus, threads_processed: u64, now: DateTime<Utc>) {
        if let Some(run) = self.runs.last_mut() {
            run.status = status;
            run.threads_processed = threads_processed;
            run.completed_at = Some(now);
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
