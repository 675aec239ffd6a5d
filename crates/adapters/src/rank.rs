// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Model-assisted ranking contract

use crate::error::AdapterError;
use async_trait::async_trait;
use gleaner_core::{Form, RankFlag, Value};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Slim field projection sent to the ranker (no evidence, no links)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankFieldValue {
    pub id: String,
    pub value: Value,
    pub confidence: f64,
}

/// One entry as presented to the ranker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankInput {
    /// Position in the flattened entry list; assessments refer back to it
    pub index: usize,
    pub algo_score: f64,
    pub fields: Vec<RankFieldValue>,
}

/// Model quality assessment for one entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankAssessment {
    pub index: usize,
    #[serde(default)]
    pub flags: Vec<RankFlag>,
    /// Additional penalty; the caller normalizes sign and clamps
    #[serde(default)]
    pub penalty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Single-shot quality pass over all extracted entries.
#[async_trait]
pub trait Ranker: Send + Sync {
    /// May return an empty list (nothing to flag). A transport or agent
    /// failure degrades the caller to algorithmic-only ranking.
    async fn rank_entries(
        &self,
        form: &Form,
        inputs: &[RankInput],
        cancel: &CancellationToken,
    ) -> Result<Vec<RankAssessment>, AdapterError>;
}
