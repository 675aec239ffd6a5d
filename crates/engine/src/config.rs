// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run configuration and collaborator dependencies

use gleaner_adapters::{
    Extractor, Ranker, Searcher, SortMode, SubredditDiscoverer, ThreadDiscoverer, ThreadEvaluator,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default worker pool size
pub const DEFAULT_WORKERS: usize = 10;
/// Hard cap on the worker pool
pub const MAX_WORKERS: usize = 50;
/// Maximum discovery rounds per run
pub const MAX_ROUNDS: usize = 3;
/// Threads discovered per target entry (overprovision factor)
pub const OVERPROVISION_FACTOR: usize = 3;
/// Bounded work channel capacity
pub const WORK_CHANNEL_CAPACITY: usize = 200;
/// Evaluation attempts per thread (files cleaned between attempts)
pub const EVAL_ATTEMPTS: u32 = 2;
/// Comment depth requested when the worker fetches a thread itself
pub const DEFAULT_COMMENT_LIMIT: usize = 100;
/// Periodic saver wake interval
pub const SAVE_INTERVAL: Duration = Duration::from_secs(5);
/// Fallback tick while waiting for round completion
pub const ROUND_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Opaque per-phase model identifiers, passed verbatim to the agent
/// runners when the embedding application constructs its collaborators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelConfig {
    pub discovery: String,
    pub evaluation: String,
    pub extraction: String,
    pub ranking: String,
}

/// Inputs for one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Path to the form's authoring JSON
    pub form_path: PathBuf,
    /// Search query; empty means "derive from the form"
    pub query: String,
    /// Explicit subreddits; empty means "discover them" (phase 0)
    pub subreddits: Vec<String>,
    /// Target extracted-thread count `L`
    pub target_entries: usize,
    /// Directory session directories are created under
    pub output_dir: PathBuf,
    /// Worker pool size; clamped to [1, 50], default 10
    pub workers: Option<usize>,
    pub sort: SortMode,
    pub models: ModelConfig,
    /// Resume an existing session directory instead of deriving a new one
    pub session_dir: Option<PathBuf>,
}

impl RunConfig {
    pub fn new(form_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            form_path: form_path.into(),
            query: String::new(),
            subreddits: Vec::new(),
            target_entries: 10,
            output_dir: output_dir.into(),
            workers: None,
            sort: SortMode::default(),
            models: ModelConfig::default(),
            session_dir: None,
        }
    }

    /// Effective worker count, clamped to `[1, MAX_WORKERS]`.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or(DEFAULT_WORKERS).clamp(1, MAX_WORKERS)
    }

    /// Overprovision target `T = 3·L`.
    pub fn overprovision_target(&self) -> usize {
        self.target_entries * OVERPROVISION_FACTOR
    }
}

/// Collaborator dependencies for a run.
///
/// The searcher and extractor are mandatory; the rest are optional and
/// the pipeline degrades gracefully without them (direct search instead
/// of agent discovery, fetch-without-evaluation, algorithmic-only
/// ranking).
#[derive(Clone)]
pub struct RunDeps {
    pub searcher: Arc<dyn Searcher>,
    pub subreddit_discoverer: Option<Arc<dyn SubredditDiscoverer>>,
    pub thread_discoverer: Option<Arc<dyn ThreadDiscoverer>>,
    pub evaluator: Option<Arc<dyn ThreadEvaluator>>,
    pub extractor: Arc<dyn Extractor>,
    pub ranker: Option<Arc<dyn Ranker>>,
}

impl RunDeps {
    /// Deps with only the mandatory collaborators.
    pub fn minimal(searcher: Arc<dyn Searcher>, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            searcher,
            subreddit_discoverer: None,
            thread_discoverer: None,
            evaluator: None,
            extractor,
            ranker: None,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
