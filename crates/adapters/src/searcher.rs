// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform search contract

use crate::error::AdapterError;
use async_trait::async_trait;
use gleaner_core::{Post, Thread};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Listing sort order for subreddit browsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Hot,
    New,
    Top,
    Rising,
}

gleaner_core::simple_display! {
    SortMode {
        Hot => "hot",
        New => "new",
        Top => "top",
        Rising => "rising",
    }
}

impl std::str::FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hot" => Ok(SortMode::Hot),
            "new" => Ok(SortMode::New),
            "top" => Ok(SortMode::Top),
            "rising" => Ok(SortMode::Rising),
            other => Err(format!("unknown sort mode: {}", other)),
        }
    }
}

/// Read access to the discussion platform.
///
/// Implementations are expected to honor the cancellation token; the core
/// imposes no additional timeout beyond what the implementation chooses.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Full-text search within one subreddit (or the pseudo-community `all`).
    async fn search(
        &self,
        query: &str,
        subreddit: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Post>, AdapterError>;

    /// Browse a subreddit listing in the given sort order.
    async fn list_subreddit(
        &self,
        subreddit: &str,
        sort: SortMode,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Post>, AdapterError>;

    /// Fetch a full thread (root post plus comment tree) by permalink.
    async fn get_thread(
        &self,
        permalink: &str,
        comment_limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Thread, AdapterError>;
}
