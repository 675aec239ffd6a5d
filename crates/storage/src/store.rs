// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash-safe manifest persistence.
//!
//! Saves write the full snapshot to a sibling `.tmp` path, fsync, then
//! rename over the canonical file. The canonical `manifest.json` is either
//! absent or parses as a complete manifest at every observable moment.

use crate::layout::SessionLayout;
use gleaner_core::{Manifest, MANIFEST_VERSION};
use std::fs::File;
use std::io::{BufWriter, ErrorKind};
use thiserror::Error;

/// Errors from session storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupt session manifest: {0}")]
    Corrupt(String),
    #[error("unsupported manifest version {found} (expected {expected})")]
    UnsupportedVersion { found: u64, expected: u32 },
}

/// Load the manifest for a session directory.
///
/// Returns `Ok(None)` when no manifest exists (a fresh session), which is
/// distinct from a corrupt manifest — corruption is fatal for the session.
pub fn load_manifest(layout: &SessionLayout) -> Result<Option<Manifest>, StorageError> {
    let raw = match std::fs::read_to_string(layout.manifest_path()) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::Io(e)),
    };

    // Check the schema version before committing to the full shape, so a
    // newer writer's manifest is refused rather than misread.
    let value: serde_json::Value =
        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt(e.to_string()))?;
    let found = value.get("version").and_then(|v| v.as_u64()).unwrap_or(0);
    if found != u64::from(MANIFEST_VERSION) {
        return Err(StorageError::UnsupportedVersion {
            found,
            expected: MANIFEST_VERSION,
        });
    }

    let manifest =
        serde_json::from_value(value).map_err(|e| StorageError::Corrupt(e.to_string()))?;
    Ok(Some(manifest))
}

/// Save a full manifest snapshot atomically (write to `.tmp`, then rename).
pub fn save_manifest(layout: &SessionLayout, manifest: &Manifest) -> Result<(), StorageError> {
    layout.ensure_dir()?;
    let path = layout.manifest_path();
    let tmp_path = path.with_extension("json.tmp");

    // Write to the temp file and sync before the rename
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, manifest)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }

    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
