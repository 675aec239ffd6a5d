// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Algorithmic entry scoring.
//!
//! Weighted sum over four components, each already on a 0-100 scale; the
//! weights sum to 1.00 so the result stays within [0, 100] before any
//! penalty is applied.

use gleaner_core::{Entry, Form};

pub(crate) const CONFIDENCE_WEIGHT: f64 = 0.40;
pub(crate) const COMPLETENESS_WEIGHT: f64 = 0.25;
pub(crate) const UPVOTE_WEIGHT: f64 = 0.20;
pub(crate) const COMMENT_WEIGHT: f64 = 0.15;

/// Upvote counts saturate the log curve at this score.
const UPVOTE_SATURATION: f64 = 1000.0;
/// Comment counts saturate at this count.
const COMMENT_SATURATION: f64 = 500.0;

/// Weight of a field in the completeness ratio.
fn field_weight(required: bool) -> f64 {
    if required {
        2.0
    } else {
        1.0
    }
}

/// Algorithmic score in [0, 100]. Pure and total: no input can make it
/// fail or leave the range.
pub(crate) fn algo_score(entry: &Entry, form: &Form, score: i64, num_comments: u64) -> f64 {
    let total = CONFIDENCE_WEIGHT * confidence_component(entry)
        + COMPLETENESS_WEIGHT * completeness_component(entry, form)
        + UPVOTE_WEIGHT * log_component(score.max(0) as f64, UPVOTE_SATURATION)
        + COMMENT_WEIGHT * log_component(num_comments as f64, COMMENT_SATURATION);
    total.clamp(0.0, 100.0)
}

/// Mean confidence over fields holding a non-null value, scaled to 0-100.
/// Zero when nothing was answered.
fn confidence_component(entry: &Entry) -> f64 {
    let answered: Vec<f64> = entry
        .fields
        .iter()
        .filter(|fv| !fv.value.is_null())
        .map(|fv| fv.confidence)
        .collect();
    if answered.is_empty() {
        return 0.0;
    }
    answered.iter().sum::<f64>() / answered.len() as f64 * 100.0
}

/// Filled-weight over total-weight, required fields counting double.
fn completeness_component(entry: &Entry, form: &Form) -> f64 {
    let mut filled = 0.0;
    let mut total = 0.0;
    for field in &form.fields {
        let weight = field_weight(field.required);
        total += weight;
        let answered = entry
            .field(&field.id)
            .map(|fv| !fv.value.is_null())
            .unwrap_or(false);
        if answered {
            filled += weight;
        }
    }
    if total == 0.0 {
        return 0.0;
    }
    filled / total * 100.0
}

/// `min(log2(v+1)/log2(cap+1), 1) * 100`
fn log_component(value: f64, cap: f64) -> f64 {
    ((value + 1.0).log2() / (cap + 1.0).log2()).min(1.0) * 100.0
}

#[cfg(test)]
#[path = "score_tests.rs"]
mod tests;
