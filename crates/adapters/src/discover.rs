// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-driven discovery contracts (communities and threads)

use crate::error::AdapterError;
use async_trait::async_trait;
use gleaner_core::{Form, Post};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Phase-0 collaborator: propose communities worth searching for a form.
#[async_trait]
pub trait SubredditDiscoverer: Send + Sync {
    /// Returned names may carry `r/` prefixes or bad casing; the caller
    /// normalizes and validates them.
    async fn discover_subreddits(
        &self,
        form: &Form,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, AdapterError>;
}

/// Per-round collaborator: find candidate threads across the subreddits.
#[async_trait]
pub trait ThreadDiscoverer: Send + Sync {
    /// Returns up to `limit` posts. May also write `discovery_results.json`
    /// into the session directory as a side effect.
    async fn discover_threads(
        &self,
        form: &Form,
        query: &str,
        subreddits: &[String],
        limit: usize,
        session_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<Vec<Post>, AdapterError>;
}

/// One post as recorded in `discovery_results.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredPost {
    pub id: String,
    pub title: String,
    pub permalink: String,
    pub subreddit: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&Post> for DiscoveredPost {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            permalink: post.permalink.clone(),
            subreddit: post.subreddit.clone(),
            score: post.score,
            num_comments: post.num_comments,
            reason: post.reason.clone(),
        }
    }
}

/// One search the discoverer ran, for the session audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchLogEntry {
    pub query: String,
    pub subreddit: String,
    pub results: u64,
}

/// Shape of `discovery_results.json`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiscoveryResult {
    #[serde(default)]
    pub posts: Vec<DiscoveredPost>,
    #[serde(default)]
    pub search_log: Vec<SearchLogEntry>,
}

#[cfg(test)]
#[path = "discover_tests.rs"]
mod tests;
