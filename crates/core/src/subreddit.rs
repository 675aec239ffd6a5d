// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subreddit name normalization.

/// The pseudo-community searched when discovery finds nothing usable.
pub const FALLBACK_SUBREDDIT: &str = "all";

/// Normalize a community name: strip an `r/` (or `/r/`) prefix, lowercase,
/// and validate against `^[a-z0-9_]{2,21}$`. Returns None for names that
/// fail validation (callers drop them silently).
pub fn normalize(name: &str) -> Option<String> {
    let trimmed = name.trim();
    let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
    let trimmed = trimmed
        .strip_prefix("r/")
        .or_else(|| trimmed.strip_prefix("R/"))
        .unwrap_or(trimmed);
    let lower = trimmed.to_lowercase();
    let valid_len = (2..=21).contains(&lower.len());
    let valid_chars = lower
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    (valid_len && valid_chars).then_some(lower)
}

/// Normalize a batch, dropping invalid names and case-insensitive
/// duplicates while preserving first-seen order.
pub fn normalize_all<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for name in names {
        if let Some(normalized) = normalize(name.as_ref()) {
            if seen.insert(normalized.clone()) {
                out.push(normalized);
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "subreddit_tests.rs"]
mod tests;
