// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session directory naming.

use chrono::{DateTime, Utc};

/// Maximum number of query words carried into the slug.
const MAX_SLUG_WORDS: usize = 4;

/// Derive the slug part of a session directory name from the query, or
/// from the first explicit subreddit when the query yields nothing.
pub fn session_slug(query: &str, subreddits: &[String]) -> String {
    let words: Vec<String> = query
        .split_whitespace()
        .map(slugify_word)
        .filter(|w| !w.is_empty())
        .take(MAX_SLUG_WORDS)
        .collect();
    if !words.is_empty() {
        return words.join("-");
    }
    subreddits
        .first()
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "session".to_string())
}

/// Full session directory name: `<slug>-<YYYYmmdd-HHMMSS>`.
pub fn session_dir_name(query: &str, subreddits: &[String], now: DateTime<Utc>) -> String {
    format!(
        "{}-{}",
        session_slug(query, subreddits),
        now.format("%Y%m%d-%H%M%S")
    )
}

fn slugify_word(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
#[path = "slug_tests.rs"]
mod tests;
