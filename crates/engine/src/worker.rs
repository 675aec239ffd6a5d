// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker body: evaluate-then-extract for one thread at a time.
//!
//! Each post id is fed exactly once, so the worker holding an item is its
//! sole owner; thread-JSON writes happen outside the manifest mutex.

use crate::config::{RunDeps, DEFAULT_COMMENT_LIMIT, EVAL_ATTEMPTS};
use crate::shared::Shared;
use gleaner_adapters::{AdapterError, Verdict};
use gleaner_core::{Clock, Entry, Form, Thread, ThreadState, ThreadStatus, POST_CONTENT};
use gleaner_storage::{ExtractionLog, SessionLayout, StorageError};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;

/// One unit of pipeline work
#[derive(Debug, Clone)]
pub(crate) struct WorkItem {
    pub state: ThreadState,
    pub needs_eval: bool,
}

/// Everything a worker needs, shared across the pool
pub(crate) struct WorkerCtx<C: Clock> {
    pub deps: RunDeps,
    pub form: Arc<Form>,
    pub layout: SessionLayout,
    pub shared: Arc<Shared>,
    pub extraction_log: Arc<ExtractionLog>,
    pub cancel: CancellationToken,
    pub clock: C,
}

/// How one item ended
enum ItemOutcome {
    Extracted(usize),
    Skipped(String),
    Failed(String),
    /// Cancellation fired mid-item; the thread keeps its current status
    /// so a resumed run picks it up again.
    Cancelled,
}

enum WorkerErr {
    Cancelled,
    Other(String),
}

impl From<AdapterError> for WorkerErr {
    fn from(e: AdapterError) -> Self {
        match e {
            AdapterError::Cancelled => WorkerErr::Cancelled,
            other => WorkerErr::Other(other.to_string()),
        }
    }
}

impl From<StorageError> for WorkerErr {
    fn from(e: StorageError) -> Self {
        WorkerErr::Other(e.to_string())
    }
}

/// Long-lived worker: pulls items until the channel closes, the run is
/// cancelled, or the extraction goal is met.
pub(crate) async fn worker_loop<C: Clock>(
    ctx: Arc<WorkerCtx<C>>,
    rx: Arc<AsyncMutex<mpsc::Receiver<WorkItem>>>,
) {
    loop {
        if ctx.shared.goal_met() || ctx.cancel.is_cancelled() {
            break;
        }
        let item = {
            let mut rx = rx.lock().await;
            tokio::select! {
                _ = ctx.cancel.cancelled() => None,
                item = rx.recv() => item,
            }
        };
        let Some(item) = item else { break };
        process_item(&ctx, item).await;
    }
}

async fn process_item<C: Clock>(ctx: &WorkerCtx<C>, item: WorkItem) {
    let post_id = item.state.post_id.clone();
    let outcome = run_item(ctx, &item).await;

    let fed = ctx.shared.fed.load(Ordering::SeqCst);
    let done = ctx.shared.done.load(Ordering::SeqCst) + 1;
    match outcome {
        ItemOutcome::Extracted(count) => {
            tracing::info!(%post_id, entries = count, position = %format!("{done}/{fed}"), "extracted");
            ctx.shared.note_done();
        }
        ItemOutcome::Skipped(reason) => {
            tracing::info!(%post_id, %reason, position = %format!("{done}/{fed}"), "skipped");
            ctx.shared.note_done();
        }
        ItemOutcome::Failed(error) => {
            tracing::warn!(%post_id, %error, position = %format!("{done}/{fed}"), "thread failed");
            ctx.shared.note_done();
        }
        ItemOutcome::Cancelled => {
            tracing::debug!(%post_id, "item abandoned on cancellation");
        }
    }
}

async fn run_item<C: Clock>(ctx: &WorkerCtx<C>, item: &WorkItem) -> ItemOutcome {
    let ts = &item.state;
    if item.needs_eval {
        match collect(ctx, ts).await {
            CollectOutcome::Ready => {}
            CollectOutcome::Skipped(reason) => return ItemOutcome::Skipped(reason),
            CollectOutcome::Failed(error) => return fail_thread(ctx, &ts.post_id, error),
            CollectOutcome::Cancelled => return ItemOutcome::Cancelled,
        }
    }
    extract(ctx, ts).await
}

enum CollectOutcome {
    Ready,
    Skipped(String),
    Failed(String),
    Cancelled,
}

/// Evaluation step: decide keep/skip and make sure a canonical thread
/// payload exists (or will be refetched by extraction).
async fn collect<C: Clock>(ctx: &WorkerCtx<C>, ts: &ThreadState) -> CollectOutcome {
    let Some(evaluator) = &ctx.deps.evaluator else {
        // No evaluator configured: fetch the thread directly.
        return match fetch_and_persist(ctx, ts).await {
            Ok(_) => {
                mark_collected(ctx, &ts.post_id);
                CollectOutcome::Ready
            }
            Err(WorkerErr::Cancelled) => CollectOutcome::Cancelled,
            Err(WorkerErr::Other(e)) => CollectOutcome::Failed(e),
        };
    };

    let mut last_error = String::new();
    for attempt in 1..=EVAL_ATTEMPTS {
        if attempt > 1 {
            ctx.layout.remove_eval_artifacts(&ts.post_id);
        }
        match evaluator
            .evaluate_thread(&ctx.form, ts, ctx.layout.dir(), &ctx.cancel)
            .await
        {
            Ok(result) => {
                if result.verdict == Verdict::Skip {
                    let reason = if result.reason.is_empty() {
                        "skipped by evaluator".to_string()
                    } else {
                        result.reason
                    };
                    let now = ctx.clock.now_utc();
                    if let Err(e) = ctx
                        .shared
                        .mutate(|m| m.skip_thread(&ts.post_id, reason.clone(), now))
                    {
                        tracing::warn!(post_id = %ts.post_id, error = %e, "skip transition refused");
                    }
                    return CollectOutcome::Skipped(reason);
                }

                // Keep: validate the evaluator-persisted payload. An
                // unusable file is treated as missing; extraction refetches.
                let valid = ctx
                    .layout
                    .read_thread(&ts.post_id)
                    .map(|t| t.is_valid_for(&ts.post_id))
                    .unwrap_or(false);
                if !valid {
                    tracing::debug!(
                        post_id = %ts.post_id,
                        "evaluator thread payload missing or invalid, extraction will refetch"
                    );
                }
                mark_collected(ctx, &ts.post_id);
                return CollectOutcome::Ready;
            }
            Err(AdapterError::Cancelled) => return CollectOutcome::Cancelled,
            Err(e) => {
                last_error = e.to_string();
                tracing::warn!(post_id = %ts.post_id, attempt, error = %last_error, "evaluation attempt failed");
            }
        }
    }
    CollectOutcome::Failed(format!("evaluation failed: {}", last_error))
}

fn mark_collected<C: Clock>(ctx: &WorkerCtx<C>, post_id: &str) {
    let now = ctx.clock.now_utc();
    if let Err(e) = ctx
        .shared
        .mutate(|m| m.set_thread_status(post_id, ThreadStatus::Collected, now))
    {
        tracing::warn!(post_id, error = %e, "collected transition refused");
    }
}

/// Extraction step: run the extractor over the canonical payload,
/// derive comment links, and store the entries.
async fn extract<C: Clock>(ctx: &WorkerCtx<C>, ts: &ThreadState) -> ItemOutcome {
    let thread = match load_or_refetch(ctx, ts).await {
        Ok(t) => t,
        Err(WorkerErr::Cancelled) => return ItemOutcome::Cancelled,
        Err(WorkerErr::Other(e)) => return fail_thread(ctx, &ts.post_id, e),
    };

    ctx.extraction_log
        .append(&ts.post_id, &format!("extracting \"{}\"", thread.title));

    let result = match ctx
        .deps
        .extractor
        .extract_fields(&thread, &ctx.form, &ctx.cancel)
        .await
    {
        Ok(r) => r,
        Err(AdapterError::Cancelled) => return ItemOutcome::Cancelled,
        Err(e) => return fail_thread(ctx, &ts.post_id, e.to_string()),
    };

    let mut entries = sanitize_entries(result.entries, &ctx.form);
    if entries.is_empty() {
        let reason = "no entries extracted".to_string();
        let now = ctx.clock.now_utc();
        if let Err(e) = ctx
            .shared
            .mutate(|m| m.skip_thread(&ts.post_id, reason.clone(), now))
        {
            tracing::warn!(post_id = %ts.post_id, error = %e, "skip transition refused");
        }
        return ItemOutcome::Skipped(reason);
    }

    for entry in &mut entries {
        derive_links(entry, &ts.permalink);
    }
    let count = entries.len();
    ctx.extraction_log
        .append(&ts.post_id, &format!("extracted {} entries", count));

    let now = ctx.clock.now_utc();
    let stored = ctx
        .shared
        .mutate(|m| m.set_thread_entries(&ts.post_id, entries, now));
    match stored {
        Ok(()) => {
            ctx.shared.note_goal_hit();
            ItemOutcome::Extracted(count)
        }
        Err(e) => fail_thread(ctx, &ts.post_id, e.to_string()),
    }
}

/// Read the canonical thread JSON; refetch and rewrite when it is missing
/// or unusable. Extraction never runs on an invalid payload.
async fn load_or_refetch<C: Clock>(
    ctx: &WorkerCtx<C>,
    ts: &ThreadState,
) -> Result<Thread, WorkerErr> {
    match ctx.layout.read_thread(&ts.post_id) {
        Ok(t) if t.is_valid_for(&ts.post_id) => return Ok(t),
        Ok(_) => {
            tracing::warn!(post_id = %ts.post_id, "canonical thread payload mismatched, refetching");
        }
        Err(e) => {
            tracing::debug!(post_id = %ts.post_id, error = %e, "canonical thread payload unavailable, refetching");
        }
    }
    fetch_and_persist(ctx, ts).await
}

async fn fetch_and_persist<C: Clock>(
    ctx: &WorkerCtx<C>,
    ts: &ThreadState,
) -> Result<Thread, WorkerErr> {
    let thread = ctx
        .deps
        .searcher
        .get_thread(&ts.permalink, DEFAULT_COMMENT_LIMIT, &ctx.cancel)
        .await?;
    if !thread.is_valid_for(&ts.post_id) {
        return Err(WorkerErr::Other(format!(
            "fetched thread does not match post {}",
            ts.post_id
        )));
    }
    ctx.layout.write_thread(&thread)?;
    Ok(thread)
}

fn fail_thread<C: Clock>(ctx: &WorkerCtx<C>, post_id: &str, error: String) -> ItemOutcome {
    let now = ctx.clock.now_utc();
    if let Err(e) = ctx
        .shared
        .mutate(|m| m.fail_thread(post_id, error.clone(), now))
    {
        tracing::warn!(post_id, error = %e, "failed transition refused");
    }
    ItemOutcome::Failed(error)
}

/// Drop field values referencing unknown fields and null out values whose
/// dynamic type contradicts the declared one; entries left with no fields
/// are dropped.
fn sanitize_entries(entries: Vec<Entry>, form: &Form) -> Vec<Entry> {
    entries
        .into_iter()
        .filter_map(|mut entry| {
            entry.fields.retain(|fv| {
                let known = form.field(&fv.id).is_some();
                if !known {
                    tracing::warn!(field = %fv.id, "extractor answered an unknown field, dropping");
                }
                known
            });
            for fv in &mut entry.fields {
                let Some(field) = form.field(&fv.id) else {
                    continue;
                };
                if !fv.value.matches_type(field.field_type) {
                    tracing::warn!(
                        field = %fv.id,
                        expected = %field.field_type,
                        "extracted value contradicts declared type, treating as null"
                    );
                    fv.value = gleaner_core::Value::Null;
                }
            }
            (!entry.fields.is_empty()).then_some(entry)
        })
        .collect()
}

/// Populate field-level links from evidence comment ids and aggregate the
/// per-entry union. The `post_content` sentinel never becomes a link.
fn derive_links(entry: &mut Entry, permalink: &str) {
    let mut entry_links: Vec<String> = Vec::new();
    for fv in &mut entry.fields {
        let mut links: Vec<String> = Vec::new();
        for ev in &fv.evidence {
            let Some(comment_id) = &ev.comment_id else {
                continue;
            };
            if comment_id == POST_CONTENT {
                continue;
            }
            let link = format!("{}{}/", permalink, comment_id);
            if !links.contains(&link) {
                links.push(link);
            }
        }
        for link in &links {
            if !entry_links.contains(link) {
                entry_links.push(link.clone());
            }
        }
        fv.links = links;
    }
    entry.links = entry_links;
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
