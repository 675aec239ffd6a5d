// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only extraction log shared by the worker pool.
//!
//! Multiple workers append streaming model output concurrently; the file
//! handle sits behind a mutex so chunks from different threads never
//! interleave mid-line.

use crate::layout::SessionLayout;
use crate::store::StorageError;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;

/// Mutex-protected writer for `extraction.log`
pub struct ExtractionLog {
    file: Mutex<File>,
}

impl ExtractionLog {
    /// Open (or create) the session's extraction log in append mode.
    pub fn open(layout: &SessionLayout) -> Result<Self, StorageError> {
        layout.ensure_dir()?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(layout.extraction_log_path())?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Append one block of streaming output, prefixed with the post id so
    /// interleaved worker output stays attributable.
    pub fn append(&self, post_id: &str, chunk: &str) {
        let mut file = self.file.lock();
        if let Err(e) = writeln!(file, "[{}] {}", post_id, chunk.trim_end()) {
            tracing::warn!(post_id, error = %e, "failed to append extraction log");
        }
    }
}

#[cfg(test)]
#[path = "extraction_log_tests.rs"]
mod tests;
