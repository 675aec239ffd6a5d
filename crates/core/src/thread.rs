// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discussion threads and their per-session pipeline state.

use crate::entry::Entry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post as returned by search/discovery (no comments yet)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub permalink: String,
    pub subreddit: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: u64,
    /// Why discovery surfaced this post (model-provided, optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A comment within a thread's tree
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<Comment>,
}

/// Canonical thread payload persisted as `thread_<postid>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub title: String,
    pub permalink: String,
    pub subreddit: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: u64,
    #[serde(default)]
    pub selftext: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}

impl Thread {
    /// A payload is usable by extraction only when it carries an id and a
    /// permalink. `expected_id` guards against an evaluator writing the
    /// wrong thread's file.
    pub fn is_valid_for(&self, expected_id: &str) -> bool {
        !self.id.is_empty() && !self.permalink.is_empty() && self.id == expected_id
    }
}

/// Pipeline status of a candidate thread.
///
/// `pending → collected → extracted → ranked`, with `skipped`/`failed`
/// terminal from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    Pending,
    Collected,
    Extracted,
    Ranked,
    Skipped,
    Failed,
}

crate::simple_display! {
    ThreadStatus {
        Pending => "pending",
        Collected => "collected",
        Extracted => "extracted",
        Ranked => "ranked",
        Skipped => "skipped",
        Failed => "failed",
    }
}

impl ThreadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ThreadStatus::Ranked | ThreadStatus::Skipped | ThreadStatus::Failed
        )
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use ThreadStatus::*;
        matches!(
            (self, next),
            (Pending, Collected)
                | (Collected, Extracted)
                | (Extracted, Ranked)
                | (Pending, Skipped)
                | (Pending, Failed)
                | (Collected, Skipped)
                | (Collected, Failed)
                | (Extracted, Skipped)
                | (Extracted, Failed)
        )
    }
}

/// One candidate thread's state within a session — the unit of pipeline
/// progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadState {
    pub post_id: String,
    pub permalink: String,
    pub title: String,
    pub subreddit: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: u64,
    pub status: ThreadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<Entry>,
    /// Evaluator's reason when status is `skipped`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ThreadState {
    pub fn from_post(post: &Post) -> Self {
        Self {
            post_id: post.id.clone(),
            permalink: post.permalink.clone(),
            title: post.title.clone(),
            subreddit: post.subreddit.clone(),
            score: post.score,
            num_comments: post.num_comments,
            status: ThreadStatus::Pending,
            collected_at: None,
            extracted_at: None,
            entries: Vec::new(),
            skip_reason: None,
            error: None,
        }
    }
}

#[cfg(test)]
#[path = "thread_tests.rs"]
mod tests;
