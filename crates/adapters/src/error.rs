// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types shared by the collaborator traits

use thiserror::Error;

/// Errors a collaborator may surface to the pipeline
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Network-level failure talking to the platform
    #[error("transport failure: {0}")]
    Transport(String),
    /// The model agent failed or produced unusable output
    #[error("agent failure: {0}")]
    Agent(String),
    /// A response parsed but violated the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The run's cancellation signal fired mid-call
    #[error("cancelled")]
    Cancelled,
}
