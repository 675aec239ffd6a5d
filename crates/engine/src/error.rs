// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the run engine

use gleaner_core::FormError;
use gleaner_storage::StorageError;
use thiserror::Error;

/// Errors that abort a run.
///
/// Per-thread failures are not here — they land on the thread itself and
/// the pipeline continues. Cancellation is not an error either; it ends
/// the run with an `interrupted` outcome.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("form content changed since session was created (hash mismatch)")]
    FormChanged,
}
