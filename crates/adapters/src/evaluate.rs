// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thread evaluation contract

use crate::error::AdapterError;
use async_trait::async_trait;
use gleaner_core::{Form, ThreadState};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Evaluator verdict on a candidate thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Keep,
    Skip,
}

gleaner_core::simple_display! {
    Verdict {
        Keep => "keep",
        Skip => "skip",
    }
}

/// Evaluation outcome; also the shape of `eval_<postid>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    pub post_id: String,
    pub verdict: Verdict,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub estimated_entries: u32,
    /// Whether the evaluator persisted the canonical `thread_<postid>.json`
    #[serde(default)]
    pub thread_saved: bool,
}

/// Cheap model pass deciding whether a thread is worth extracting.
#[async_trait]
pub trait ThreadEvaluator: Send + Sync {
    /// On a `keep` verdict with `thread_saved`, the canonical thread JSON
    /// is expected to exist in the session directory; the caller validates
    /// it and refetches when it is missing or unusable.
    async fn evaluate_thread(
        &self,
        form: &Form,
        thread: &ThreadState,
        session_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<EvalResult, AdapterError>;
}
