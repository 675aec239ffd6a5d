// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake collaborators for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::{
    AdapterError, DiscoveryResult, EvalResult, ExtractionResult, Extractor, RankAssessment,
    RankInput, Ranker, Searcher, SortMode, SubredditDiscoverer, ThreadDiscoverer, ThreadEvaluator,
    Verdict,
};
use async_trait::async_trait;
use gleaner_core::{Entry, Evidence, FieldValue, Form, Post, Thread, ThreadState, Value, POST_CONTENT};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Recorded call to [`FakeSearcher`]
#[derive(Debug, Clone, PartialEq)]
pub enum SearchCall {
    Search {
        query: String,
        subreddit: String,
        limit: usize,
    },
    List {
        subreddit: String,
        sort: SortMode,
        limit: usize,
    },
    GetThread {
        permalink: String,
        comment_limit: usize,
    },
}

/// Fake platform searcher with scripted posts and threads.
#[derive(Clone, Default)]
pub struct FakeSearcher {
    inner: Arc<Mutex<SearcherState>>,
}

#[derive(Default)]
struct SearcherState {
    posts: Vec<Post>,
    threads: HashMap<String, Thread>,
    calls: Vec<SearchCall>,
    search_error: Option<String>,
    failing_permalinks: Vec<String>,
}

impl FakeSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the posts returned by `search` and `list_subreddit`.
    pub fn set_posts(&self, posts: Vec<Post>) {
        self.inner.lock().posts = posts;
    }

    /// Script a thread payload, keyed by permalink.
    pub fn set_thread(&self, thread: Thread) {
        self.inner
            .lock()
            .threads
            .insert(thread.permalink.clone(), thread);
    }

    /// Make every `search`/`list_subreddit` call fail with a transport error.
    pub fn fail_searches(&self, message: impl Into<String>) {
        self.inner.lock().search_error = Some(message.into());
    }

    /// Make `get_thread` fail for one permalink.
    pub fn fail_thread(&self, permalink: impl Into<String>) {
        self.inner.lock().failing_permalinks.push(permalink.into());
    }

    pub fn calls(&self) -> Vec<SearchCall> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl Searcher for FakeSearcher {
    async fn search(
        &self,
        query: &str,
        subreddit: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Post>, AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        let mut inner = self.inner.lock();
        inner.calls.push(SearchCall::Search {
            query: query.to_string(),
            subreddit: subreddit.to_string(),
            limit,
        });
        if let Some(msg) = &inner.search_error {
            return Err(AdapterError::Transport(msg.clone()));
        }
        Ok(inner.posts.iter().take(limit).cloned().collect())
    }

    async fn list_subreddit(
        &self,
        subreddit: &str,
        sort: SortMode,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Post>, AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        let mut inner = self.inner.lock();
        inner.calls.push(SearchCall::List {
            subreddit: subreddit.to_string(),
            sort,
            limit,
        });
        if let Some(msg) = &inner.search_error {
            return Err(AdapterError::Transport(msg.clone()));
        }
        Ok(inner.posts.iter().take(limit).cloned().collect())
    }

    async fn get_thread(
        &self,
        permalink: &str,
        comment_limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Thread, AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        let mut inner = self.inner.lock();
        inner.calls.push(SearchCall::GetThread {
            permalink: permalink.to_string(),
            comment_limit,
        });
        if inner.failing_permalinks.iter().any(|p| p == permalink) {
            return Err(AdapterError::Transport(format!(
                "fetch failed for {}",
                permalink
            )));
        }
        inner
            .threads
            .get(permalink)
            .cloned()
            .ok_or_else(|| AdapterError::Transport(format!("no thread at {}", permalink)))
    }
}

/// Fake subreddit discoverer with a scripted answer.
#[derive(Clone, Default)]
pub struct FakeSubredditDiscoverer {
    inner: Arc<Mutex<SubredditState>>,
}

#[derive(Default)]
struct SubredditState {
    names: Vec<String>,
    error: Option<String>,
    calls: u32,
}

impl FakeSubredditDiscoverer {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SubredditState {
                names,
                error: None,
                calls: 0,
            })),
        }
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.inner.lock().error = Some(message.into());
    }

    pub fn call_count(&self) -> u32 {
        self.inner.lock().calls
    }
}

#[async_trait]
impl SubredditDiscoverer for FakeSubredditDiscoverer {
    async fn discover_subreddits(
        &self,
        _form: &Form,
        _query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        let mut inner = self.inner.lock();
        inner.calls += 1;
        if let Some(msg) = &inner.error {
            return Err(AdapterError::Agent(msg.clone()));
        }
        Ok(inner.names.clone())
    }
}

/// Fake thread discoverer returning one scripted batch per round.
#[derive(Clone, Default)]
pub struct FakeThreadDiscoverer {
    inner: Arc<Mutex<DiscovererState>>,
}

#[derive(Default)]
struct DiscovererState {
    rounds: VecDeque<Vec<Post>>,
    error: Option<String>,
    limits_seen: Vec<usize>,
    write_results_file: bool,
}

impl FakeThreadDiscoverer {
    pub fn new(rounds: Vec<Vec<Post>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DiscovererState {
                rounds: rounds.into(),
                error: None,
                limits_seen: Vec::new(),
                write_results_file: false,
            })),
        }
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.inner.lock().error = Some(message.into());
    }

    /// Also write `discovery_results.json` like the real agent does.
    pub fn write_results_file(&self) {
        self.inner.lock().write_results_file = true;
    }

    /// The `limit` argument of each call, in order.
    pub fn limits_seen(&self) -> Vec<usize> {
        self.inner.lock().limits_seen.clone()
    }
}

#[async_trait]
impl ThreadDiscoverer for FakeThreadDiscoverer {
    async fn discover_threads(
        &self,
        _form: &Form,
        query: &str,
        subreddits: &[String],
        limit: usize,
        session_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<Vec<Post>, AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        let (posts, write_file) = {
            let mut inner = self.inner.lock();
            inner.limits_seen.push(limit);
            if let Some(msg) = &inner.error {
                return Err(AdapterError::Agent(msg.clone()));
            }
            let posts: Vec<Post> = inner
                .rounds
                .pop_front()
                .unwrap_or_default()
                .into_iter()
                .take(limit)
                .collect();
            (posts, inner.write_results_file)
        };
        if write_file {
            let result = DiscoveryResult {
                posts: posts.iter().map(Into::into).collect(),
                search_log: vec![crate::SearchLogEntry {
                    query: query.to_string(),
                    subreddit: subreddits.join("+"),
                    results: posts.len() as u64,
                }],
            };
            let raw = serde_json::to_string_pretty(&result)
                .map_err(|e| AdapterError::Agent(e.to_string()))?;
            std::fs::write(session_dir.join("discovery_results.json"), raw)
                .map_err(|e| AdapterError::Agent(e.to_string()))?;
        }
        Ok(posts)
    }
}

/// Scripted evaluator behavior for one attempt
#[derive(Debug, Clone)]
enum EvalScript {
    Keep {
        thread: Option<Thread>,
        estimated_entries: u32,
    },
    Skip {
        reason: String,
    },
    Fail {
        message: String,
    },
}

/// Fake thread evaluator.
///
/// Unscripted posts default to `keep` without a saved thread (the worker
/// then fetches through the searcher).
#[derive(Clone, Default)]
pub struct FakeEvaluator {
    inner: Arc<Mutex<EvaluatorState>>,
}

#[derive(Default)]
struct EvaluatorState {
    scripts: HashMap<String, VecDeque<EvalScript>>,
    attempts: HashMap<String, u32>,
}

impl FakeEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a `keep` verdict that persists the given thread payload.
    pub fn keep_with_thread(&self, post_id: &str, thread: Thread, estimated_entries: u32) {
        self.push(
            post_id,
            EvalScript::Keep {
                thread: Some(thread),
                estimated_entries,
            },
        );
    }

    /// Script a `keep` verdict that leaves thread fetching to the worker.
    pub fn keep_unsaved(&self, post_id: &str) {
        self.push(
            post_id,
            EvalScript::Keep {
                thread: None,
                estimated_entries: 1,
            },
        );
    }

    pub fn skip(&self, post_id: &str, reason: impl Into<String>) {
        self.push(
            post_id,
            EvalScript::Skip {
                reason: reason.into(),
            },
        );
    }

    /// Script one failing attempt (queue a second script to model retry
    /// recovery).
    pub fn fail_once(&self, post_id: &str, message: impl Into<String>) {
        self.push(
            post_id,
            EvalScript::Fail {
                message: message.into(),
            },
        );
    }

    /// Number of evaluation attempts seen for a post.
    pub fn attempts(&self, post_id: &str) -> u32 {
        self.inner.lock().attempts.get(post_id).copied().unwrap_or(0)
    }

    fn push(&self, post_id: &str, script: EvalScript) {
        self.inner
            .lock()
            .scripts
            .entry(post_id.to_string())
            .or_default()
            .push_back(script);
    }
}

#[async_trait]
impl ThreadEvaluator for FakeEvaluator {
    async fn evaluate_thread(
        &self,
        _form: &Form,
        thread: &ThreadState,
        session_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<EvalResult, AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        let script = {
            let mut inner = self.inner.lock();
            *inner.attempts.entry(thread.post_id.clone()).or_insert(0) += 1;
            inner
                .scripts
                .get_mut(&thread.post_id)
                .and_then(VecDeque::pop_front)
        };
        let script = script.unwrap_or(EvalScript::Keep {
            thread: None,
            estimated_entries: 1,
        });

        let result = match script {
            EvalScript::Fail { message } => return Err(AdapterError::Agent(message)),
            EvalScript::Skip { reason } => EvalResult {
                post_id: thread.post_id.clone(),
                verdict: Verdict::Skip,
                reason,
                estimated_entries: 0,
                thread_saved: false,
            },
            EvalScript::Keep {
                thread: payload,
                estimated_entries,
            } => {
                let saved = if let Some(payload) = payload {
                    let raw = serde_json::to_string_pretty(&payload)
                        .map_err(|e| AdapterError::Agent(e.to_string()))?;
                    std::fs::write(
                        session_dir.join(format!("thread_{}.json", payload.id)),
                        raw,
                    )
                    .map_err(|e| AdapterError::Agent(e.to_string()))?;
                    true
                } else {
                    false
                };
                EvalResult {
                    post_id: thread.post_id.clone(),
                    verdict: Verdict::Keep,
                    reason: "relevant".to_string(),
                    estimated_entries,
                    thread_saved: saved,
                }
            }
        };

        let raw =
            serde_json::to_string_pretty(&result).map_err(|e| AdapterError::Agent(e.to_string()))?;
        std::fs::write(
            session_dir.join(format!("eval_{}.json", thread.post_id)),
            raw,
        )
        .map_err(|e| AdapterError::Agent(e.to_string()))?;
        Ok(result)
    }
}

/// Fake extractor.
///
/// Unscripted threads yield one entry whose primary field is the thread
/// title with evidence from the root post.
#[derive(Clone, Default)]
pub struct FakeExtractor {
    inner: Arc<Mutex<ExtractorState>>,
}

#[derive(Default)]
struct ExtractorState {
    entries: HashMap<String, Vec<Entry>>,
    failures: HashMap<String, String>,
    delay: Option<Duration>,
    calls: Vec<String>,
}

impl FakeExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the entries returned for a thread id.
    pub fn set_entries(&self, thread_id: &str, entries: Vec<Entry>) {
        self.inner
            .lock()
            .entries
            .insert(thread_id.to_string(), entries);
    }

    pub fn fail(&self, thread_id: &str, message: impl Into<String>) {
        self.inner
            .lock()
            .failures
            .insert(thread_id.to_string(), message.into());
    }

    /// Sleep before answering (for cancellation tests).
    pub fn set_delay(&self, delay: Duration) {
        self.inner.lock().delay = Some(delay);
    }

    /// Thread ids extracted, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    async fn extract_fields(
        &self,
        thread: &Thread,
        form: &Form,
        cancel: &CancellationToken,
    ) -> Result<ExtractionResult, AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        let delay = {
            let mut inner = self.inner.lock();
            inner.calls.push(thread.id.clone());
            inner.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let inner = self.inner.lock();
        if let Some(message) = inner.failures.get(&thread.id) {
            return Err(AdapterError::Agent(message.clone()));
        }
        if let Some(entries) = inner.entries.get(&thread.id) {
            return Ok(ExtractionResult {
                entries: entries.clone(),
            });
        }

        // Default: answer the primary field with the thread title.
        let entries = form
            .primary_field()
            .map(|primary| {
                let fv = FieldValue::new(
                    primary.id.clone(),
                    Value::String(thread.title.clone()),
                    0.9,
                )
                .with_evidence(vec![Evidence {
                    text: thread.title.clone(),
                    comment_id: Some(POST_CONTENT.to_string()),
                    author: None,
                }]);
                vec![Entry::new(vec![fv])]
            })
            .unwrap_or_default();
        Ok(ExtractionResult { entries })
    }
}

/// Fake ranker with a scripted assessment list.
#[derive(Clone, Default)]
pub struct FakeRanker {
    inner: Arc<Mutex<RankerState>>,
}

#[derive(Default)]
struct RankerState {
    assessments: Vec<RankAssessment>,
    error: Option<String>,
    inputs_seen: Vec<Vec<RankInput>>,
}

impl FakeRanker {
    pub fn new(assessments: Vec<RankAssessment>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RankerState {
                assessments,
                error: None,
                inputs_seen: Vec::new(),
            })),
        }
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.inner.lock().error = Some(message.into());
    }

    /// The input batches of each invocation.
    pub fn inputs_seen(&self) -> Vec<Vec<RankInput>> {
        self.inner.lock().inputs_seen.clone()
    }
}

#[async_trait]
impl Ranker for FakeRanker {
    async fn rank_entries(
        &self,
        _form: &Form,
        inputs: &[RankInput],
        cancel: &CancellationToken,
    ) -> Result<Vec<RankAssessment>, AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        let mut inner = self.inner.lock();
        inner.inputs_seen.push(inputs.to_vec());
        if let Some(msg) = &inner.error {
            return Err(AdapterError::Agent(msg.clone()));
        }
        Ok(inner.assessments.clone())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
