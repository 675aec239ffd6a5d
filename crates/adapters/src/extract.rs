// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Field extraction contract

use crate::error::AdapterError;
use async_trait::async_trait;
use gleaner_core::{Entry, Form, Thread};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Extractor output: the distinct entries found in one thread
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub entries: Vec<Entry>,
}

/// Expensive model pass answering the form's questions over a thread.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract_fields(
        &self,
        thread: &Thread,
        form: &Form,
        cancel: &CancellationToken,
    ) -> Result<ExtractionResult, AdapterError>;
}
