// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hybrid ranking engine.
//!
//! Runs once after the pipeline drains: algorithmic scores, then a
//! diversity penalty across similar primaries, then a thread-saturation
//! penalty, then a model-assisted quality pass. Penalties accumulate;
//! the final score is `max(0, algo + total_penalty)`.

pub(crate) mod cluster;
pub(crate) mod score;

use crate::config::RunDeps;
use crate::shared::Shared;
use gleaner_adapters::{RankAssessment, RankFieldValue, RankInput};
use gleaner_core::{Clock, Entry, Form, RankFlag, ThreadStatus};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One flattened (thread, entry) tuple being ranked
struct Slot {
    thread_idx: usize,
    entry_idx: usize,
    post_id: String,
    entry: Entry,
    algo: f64,
    penalty: f64,
}

/// Rank every entry of every `extracted` thread and transition those
/// threads to `ranked`. The algorithmic stages cannot fail; a failing
/// ranker agent degrades the pass to algorithmic-only with a warning.
pub(crate) async fn rank_session<C: Clock>(
    deps: &RunDeps,
    form: &Form,
    shared: &Arc<Shared>,
    cancel: &CancellationToken,
    clock: &C,
) {
    let mut slots: Vec<Slot> = shared.read(|m| {
        m.threads
            .iter()
            .enumerate()
            .filter(|(_, t)| t.status == ThreadStatus::Extracted)
            .flat_map(|(thread_idx, t)| {
                t.entries.iter().enumerate().map(move |(entry_idx, entry)| Slot {
                    thread_idx,
                    entry_idx,
                    post_id: t.post_id.clone(),
                    entry: entry.clone(),
                    algo: score::algo_score(entry, form, t.score, t.num_comments),
                    penalty: 0.0,
                })
            })
            .collect()
    });
    if slots.is_empty() {
        return;
    }
    tracing::info!(entries = slots.len(), "ranking extracted entries");

    apply_diversity(&mut slots, form);
    apply_saturation(&mut slots);

    if let Some(ranker) = &deps.ranker {
        let inputs: Vec<RankInput> = slots
            .iter()
            .enumerate()
            .map(|(index, slot)| RankInput {
                index,
                algo_score: slot.algo,
                fields: slot
                    .entry
                    .fields
                    .iter()
                    .map(|fv| RankFieldValue {
                        id: fv.id.clone(),
                        value: fv.value.clone(),
                        confidence: fv.confidence,
                    })
                    .collect(),
            })
            .collect();
        match ranker.rank_entries(form, &inputs, cancel).await {
            Ok(assessments) => apply_assessments(&mut slots, assessments),
            Err(e) => {
                tracing::warn!(error = %e, "model ranking failed, keeping algorithmic scores");
            }
        }
    }

    let now = clock.now_utc();
    shared.mutate(|m| {
        for slot in &slots {
            let final_score = (slot.algo + slot.penalty).max(0.0);
            if let Some(entry) = m
                .threads
                .get_mut(slot.thread_idx)
                .and_then(|t| t.entries.get_mut(slot.entry_idx))
            {
                entry.rank_score = Some(final_score);
                entry.rank_flags = slot.entry.rank_flags.clone();
                entry.rank_reason = slot.entry.rank_reason.clone();
            }
        }
        let ranked_threads: BTreeSet<usize> = slots.iter().map(|s| s.thread_idx).collect();
        for thread_idx in ranked_threads {
            let post_id = m.threads[thread_idx].post_id.clone();
            if let Err(e) = m.mark_ranked(&post_id, now) {
                tracing::warn!(%post_id, error = %e, "ranked transition refused");
            }
        }
    });
}

/// Penalize near-duplicate primaries. The highest-algo entry of each
/// cluster keeps its score (ties broken by earliest thread insertion
/// order); the rest take -15, -25, -35 ... capped at -50.
fn apply_diversity(slots: &mut [Slot], form: &Form) {
    let primaries: Vec<String> = slots.iter().map(|s| s.entry.primary_text(form)).collect();
    let normed: Vec<String> = primaries
        .iter()
        .map(|p| cluster::normalize_primary(p))
        .collect();

    for group in cluster::clusters(&normed) {
        if group.len() < 2 {
            continue;
        }
        let mut order = group;
        order.sort_by(|&a, &b| {
            slots[b]
                .algo
                .partial_cmp(&slots[a].algo)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    (slots[a].thread_idx, slots[a].entry_idx)
                        .cmp(&(slots[b].thread_idx, slots[b].entry_idx))
                })
        });
        let winner_primary = primaries[order[0]].clone();
        for (rank, &idx) in order.iter().enumerate().skip(1) {
            let penalty = (15.0 + 10.0 * (rank as f64 - 1.0)).min(50.0);
            slots[idx].penalty -= penalty;
            slots[idx].entry.add_flag(RankFlag::Duplicate);
            slots[idx].entry.rank_reason = Some(format!(
                "Similar to higher-scored entry: {}",
                winner_primary
            ));
        }
    }
}

/// Penalize entries piling up in one thread: within each source thread,
/// entries ranked below the best take -5 per rank, capped at -30.
fn apply_saturation(slots: &mut [Slot]) {
    let mut by_thread: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, slot) in slots.iter().enumerate() {
        by_thread.entry(slot.post_id.clone()).or_default().push(idx);
    }
    for group in by_thread.into_values() {
        if group.len() < 2 {
            continue;
        }
        let mut order = group;
        order.sort_by(|&a, &b| {
            let score_a = slots[a].algo + slots[a].penalty;
            let score_b = slots[b].algo + slots[b].penalty;
            score_b
                .partial_cmp(&score_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| slots[a].entry_idx.cmp(&slots[b].entry_idx))
        });
        for (rank, &idx) in order.iter().enumerate().skip(1) {
            let penalty = (5.0 * rank as f64).min(30.0);
            slots[idx].penalty -= penalty;
        }
    }
}

/// Fold the model's assessments into the accumulated penalties: the
/// penalty is normalized negative, clamped to [-50, 0], floored at -10
/// when flags are present, and added to (never substituted for) the
/// diversity and saturation penalties.
fn apply_assessments(slots: &mut [Slot], assessments: Vec<RankAssessment>) {
    for assessment in assessments {
        let Some(slot) = slots.get_mut(assessment.index) else {
            tracing::warn!(index = assessment.index, "assessment for unknown entry index");
            continue;
        };
        let mut penalty = -assessment.penalty.abs();
        penalty = penalty.max(-50.0);
        if !assessment.flags.is_empty() && penalty > -10.0 {
            penalty = -10.0;
        }
        slot.penalty += penalty;
        for flag in assessment.flags {
            slot.entry.add_flag(flag);
        }
        if let Some(reason) = assessment.reason {
            if !reason.is_empty() {
                slot.entry.rank_reason = Some(reason);
            }
        }
    }
}

#[cfg(test)]
#[path = "rank_tests.rs"]
mod tests;
