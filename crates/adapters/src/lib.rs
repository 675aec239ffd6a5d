// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gleaner-adapters: collaborator contracts for the retrieval pipeline.
//!
//! The engine drives five kinds of external collaborators — a platform
//! searcher plus four model-backed agents (subreddit discovery, thread
//! discovery, thread evaluation, field extraction) and a ranker. Their
//! concrete implementations live outside this workspace; this crate owns
//! the traits, the wire formats they exchange with the session directory,
//! and fake implementations for tests.

mod discover;
mod error;
mod evaluate;
mod extract;
pub mod parse;
mod rank;
mod searcher;

pub use discover::{
    DiscoveredPost, DiscoveryResult, SearchLogEntry, SubredditDiscoverer, ThreadDiscoverer,
};
pub use error::AdapterError;
pub use evaluate::{EvalResult, ThreadEvaluator, Verdict};
pub use extract::{ExtractionResult, Extractor};
pub use rank::{RankAssessment, RankFieldValue, RankInput, Ranker};
pub use searcher::{Searcher, SortMode};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{
    FakeEvaluator, FakeExtractor, FakeRanker, FakeSearcher, FakeSubredditDiscoverer,
    FakeThreadDiscoverer, SearchCall,
};
