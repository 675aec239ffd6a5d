// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result projection: the manifest view external renderers consume.

use gleaner_core::{FieldValue, Form, Manifest, RankFlag, RunLog, ThreadStatus};
use serde::Serialize;
use std::collections::BTreeMap;

/// One ranked entry with its thread provenance
#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    pub post_id: String,
    pub permalink: String,
    pub thread_title: String,
    pub subreddit: String,
    /// String form of the form's primary field
    pub primary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank_score: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rank_flags: Vec<RankFlag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank_reason: Option<String>,
    /// Field values shown to renderers; internal-flagged fields excluded
    pub fields: Vec<FieldValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
}

/// Projection of a session for external rendering
#[derive(Debug, Clone, Serialize)]
pub struct SessionResults {
    pub query: String,
    /// Entries sorted by descending rank score (unranked entries last,
    /// both stable on thread insertion order)
    pub entries: Vec<RankedEntry>,
    pub totals: BTreeMap<String, usize>,
    pub runs: Vec<RunLog>,
}

/// Project ranked and extracted entries out of a manifest snapshot.
/// Pure function; safe to call on any loaded manifest.
pub fn project_results(manifest: &Manifest, form: &Form) -> SessionResults {
    let mut entries: Vec<RankedEntry> = Vec::new();
    for thread in &manifest.threads {
        if !matches!(
            thread.status,
            ThreadStatus::Extracted | ThreadStatus::Ranked
        ) {
            continue;
        }
        for entry in &thread.entries {
            let fields: Vec<FieldValue> = entry
                .fields
                .iter()
                .filter(|fv| {
                    form.field(&fv.id).map(|f| !f.internal).unwrap_or(false)
                })
                .cloned()
                .collect();
            entries.push(RankedEntry {
                post_id: thread.post_id.clone(),
                permalink: thread.permalink.clone(),
                thread_title: thread.title.clone(),
                subreddit: thread.subreddit.clone(),
                primary: entry.primary_text(form),
                rank_score: entry.rank_score,
                rank_flags: entry.rank_flags.clone(),
                rank_reason: entry.rank_reason.clone(),
                fields,
                links: entry.links.clone(),
            });
        }
    }

    // Descending by score; entries without a score sink to the end. The
    // sort is stable, preserving thread insertion order within ties.
    entries.sort_by(|a, b| {
        match (a.rank_score, b.rank_score) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    });

    let totals = manifest
        .counts_by_status()
        .into_iter()
        .map(|(status, count)| (status.to_string(), count))
        .collect();

    SessionResults {
        query: manifest.query.clone(),
        entries,
        totals,
        runs: manifest.runs.clone(),
    }
}

#[cfg(test)]
#[path = "results_tests.rs"]
mod tests;
