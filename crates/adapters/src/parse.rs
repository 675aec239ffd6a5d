// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lenient parsing of model responses.
//!
//! Discovery agents answer in whatever JSON shape the model felt like that
//! day. `subreddit_names` runs an ordered chain of attempted parses over
//! the same text and finishes with a regex heuristic, so a usable answer
//! is recovered from any of the shapes seen in practice:
//!
//! - object with a list value: `{"subreddits": ["travel", "hiking"]}`
//! - object of strings: `{"1": "travel", "2": "hiking"}`
//! - list of objects: `[{"name": "travel"}, {"subreddit": "hiking"}]`
//! - list of strings: `["travel", "hiking"]`
//! - freeform text mentioning `r/travel` and `r/hiking`

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Extract candidate subreddit names from a model response.
///
/// Returned names are raw candidates; callers normalize and validate them
/// (`gleaner_core::subreddit::normalize_all`).
pub fn subreddit_names(text: &str) -> Vec<String> {
    let body = strip_code_fence(text);

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let names = names_from_json(&value);
        if !names.is_empty() {
            return names;
        }
    }

    names_from_mentions(text)
}

/// Strip a surrounding markdown code fence if present.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn names_from_json(value: &Value) -> Vec<String> {
    match value {
        // Object with a list value (first array field wins), else an
        // object of strings.
        Value::Object(map) => {
            for v in map.values() {
                if let Value::Array(items) = v {
                    let names = strings_of(items);
                    if !names.is_empty() {
                        return names;
                    }
                }
            }
            map.values()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        }
        // List of strings, else list of objects carrying a name-ish field.
        Value::Array(items) => {
            let names = strings_of(items);
            if !names.is_empty() {
                return names;
            }
            items
                .iter()
                .filter_map(|item| {
                    let obj = item.as_object()?;
                    obj.get("name")
                        .or_else(|| obj.get("subreddit"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .or_else(|| {
                            obj.values()
                                .find_map(|v| v.as_str().map(str::to_string))
                        })
                })
                .collect()
        }
        _ => Vec::new(),
    }
}

fn strings_of(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

/// Last resort: scan freeform text for `r/name` mentions.
fn names_from_mentions(text: &str) -> Vec<String> {
    mention_regex()
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

// The pattern is a literal; compilation cannot fail at runtime.
#[allow(clippy::expect_used)]
fn mention_regex() -> &'static Regex {
    static MENTION: OnceLock<Regex> = OnceLock::new();
    MENTION.get_or_init(|| Regex::new(r"\br/([A-Za-z0-9_]{2,21})\b").expect("static pattern"))
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
