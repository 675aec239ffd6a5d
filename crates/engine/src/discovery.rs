// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Phase 0 (subreddit discovery) and per-round thread discovery.

use crate::config::RunDeps;
use crate::shared::Shared;
use gleaner_adapters::{parse, AdapterError, SortMode};
use gleaner_core::{subreddit, Form, Post};
use gleaner_storage::SessionLayout;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Resolve the subreddits this run searches.
///
/// Phase 0 is skipped when explicit subreddits exist in the manifest or a
/// previous run already discovered them. Discovery failure is non-fatal:
/// the run proceeds against the pseudo-community `all`, and the manifest
/// flag stays unset so a resume retries discovery.
pub(crate) async fn ensure_subreddits(
    deps: &RunDeps,
    form: &Form,
    query: &str,
    shared: &Arc<Shared>,
    cancel: &CancellationToken,
) -> Vec<String> {
    let (existing, discovered) =
        shared.read(|m| (m.subreddits.clone(), m.discovered_subreddits));
    if !existing.is_empty() {
        return existing;
    }
    if discovered {
        return fallback();
    }

    let Some(discoverer) = &deps.subreddit_discoverer else {
        tracing::info!("no subreddit discoverer configured, searching r/all");
        return fallback();
    };

    match discoverer.discover_subreddits(form, query, cancel).await {
        Ok(raw) => {
            let names = expand_and_normalize(raw);
            if names.is_empty() {
                tracing::warn!("subreddit discovery returned no usable names, searching r/all");
                return fallback();
            }
            tracing::info!(subreddits = ?names, "discovered subreddits");
            shared.mutate(|m| {
                m.subreddits = names.clone();
                m.discovered_subreddits = true;
            });
            names
        }
        Err(e) => {
            tracing::warn!(error = %e, "subreddit discovery failed, searching r/all");
            fallback()
        }
    }
}

fn fallback() -> Vec<String> {
    vec![subreddit::FALLBACK_SUBREDDIT.to_string()]
}

/// Normalize discoverer output. Items that are not themselves names get
/// the lenient response parser applied — a model sometimes answers with
/// one blob of JSON or prose instead of a name list.
fn expand_and_normalize(raw: Vec<String>) -> Vec<String> {
    let mut candidates = Vec::new();
    for item in raw {
        if subreddit::normalize(&item).is_some() {
            candidates.push(item);
        } else {
            candidates.extend(parse::subreddit_names(&item));
        }
    }
    subreddit::normalize_all(candidates)
}

/// One round of thread discovery: the discoverer agent when configured,
/// direct platform search otherwise (and as the error fallback).
pub(crate) async fn discover_round(
    deps: &RunDeps,
    form: &Form,
    query: &str,
    subreddits: &[String],
    remaining: usize,
    sort: SortMode,
    layout: &SessionLayout,
    cancel: &CancellationToken,
) -> Vec<Post> {
    if let Some(discoverer) = &deps.thread_discoverer {
        match discoverer
            .discover_threads(form, query, subreddits, remaining, layout.dir(), cancel)
            .await
        {
            Ok(posts) => return posts,
            Err(AdapterError::Cancelled) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "thread discovery failed, falling back to direct search");
            }
        }
    }
    direct_search(deps, query, subreddits, remaining, sort, cancel).await
}

/// Split the remaining budget across subreddits and search each directly.
async fn direct_search(
    deps: &RunDeps,
    query: &str,
    subreddits: &[String],
    remaining: usize,
    sort: SortMode,
    cancel: &CancellationToken,
) -> Vec<Post> {
    let per_sub = remaining.div_ceil(subreddits.len().max(1));
    let mut posts: Vec<Post> = Vec::new();
    for sub in subreddits {
        if cancel.is_cancelled() || posts.len() >= remaining {
            break;
        }
        let result = if query.is_empty() {
            deps.searcher.list_subreddit(sub, sort, per_sub, cancel).await
        } else {
            deps.searcher.search(query, sub, per_sub, cancel).await
        };
        match result {
            Ok(batch) => posts.extend(batch),
            Err(AdapterError::Cancelled) => break,
            Err(e) => {
                tracing::warn!(subreddit = %sub, error = %e, "search failed, continuing");
            }
        }
    }
    posts.truncate(remaining);
    posts
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
