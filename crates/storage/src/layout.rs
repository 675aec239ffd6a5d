// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem conventions for a session directory.
//!
//! ```text
//! <output>/<slug-timestamp>/
//!   manifest.json              canonical session state (atomic writes)
//!   manifest.json.tmp          transient staging for rename
//!   discovery_results.json     written by the thread discoverer each round
//!   thread_<postid>.json       canonical thread payload per kept thread
//!   eval_<postid>.json         evaluator verdict per evaluated thread
//!   extraction.log             concatenated streaming model output
//! ```

use crate::store::StorageError;
use gleaner_core::Thread;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const DISCOVERY_FILE: &str = "discovery_results.json";
pub const EXTRACTION_LOG_FILE: &str = "extraction.log";

/// Paths within one session directory
#[derive(Debug, Clone)]
pub struct SessionLayout {
    dir: PathBuf,
}

impl SessionLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the session directory if needed.
    pub fn ensure_dir(&self) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    pub fn discovery_path(&self) -> PathBuf {
        self.dir.join(DISCOVERY_FILE)
    }

    pub fn extraction_log_path(&self) -> PathBuf {
        self.dir.join(EXTRACTION_LOG_FILE)
    }

    pub fn thread_path(&self, post_id: &str) -> PathBuf {
        self.dir.join(format!("thread_{}.json", post_id))
    }

    pub fn eval_path(&self, post_id: &str) -> PathBuf {
        self.dir.join(format!("eval_{}.json", post_id))
    }

    /// Read and parse the canonical thread payload for a post.
    ///
    /// Missing and malformed files are both errors; callers treat either
    /// as "refetch through the searcher".
    pub fn read_thread(&self, post_id: &str) -> Result<Thread, StorageError> {
        let raw = std::fs::read_to_string(self.thread_path(post_id))?;
        let thread = serde_json::from_str(&raw).map_err(StorageError::Json)?;
        Ok(thread)
    }

    /// Persist the canonical thread payload for a post.
    pub fn write_thread(&self, thread: &Thread) -> Result<(), StorageError> {
        let path = self.thread_path(&thread.id);
        let raw = serde_json::to_string_pretty(thread).map_err(StorageError::Json)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Remove a thread's eval and payload files ahead of an evaluator
    /// retry. Missing files are fine.
    pub fn remove_eval_artifacts(&self, post_id: &str) {
        for path in [self.eval_path(post_id), self.thread_path(post_id)] {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove eval artifact");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
