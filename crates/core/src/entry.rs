// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Extracted entries: one distinct item pulled out of a thread.

use crate::form::Form;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A quoted piece of thread content backing a field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub text: String,
    /// Source comment id; the sentinel `post_content` refers to the root post
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Sentinel comment id meaning "the root post", not a real comment.
pub const POST_CONTENT: &str = "post_content";

/// One answered form field within an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub id: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Evidence>,
    /// Permalinks to the comments the evidence came from (derived, not
    /// model-provided)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
}

impl FieldValue {
    /// Confidence is clamped to [0,1] on construction.
    pub fn new(id: impl Into<String>, value: Value, confidence: f64) -> Self {
        Self {
            id: id.into(),
            value,
            confidence: confidence.clamp(0.0, 1.0),
            evidence: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn with_evidence(mut self, evidence: Vec<Evidence>) -> Self {
        self.evidence = evidence;
        self
    }
}

/// Quality flags assigned by ranking (diversity pass or model assessment)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankFlag {
    Spam,
    Joke,
    Outdated,
    OffTopic,
    LowEffort,
    Duplicate,
}

crate::simple_display! {
    RankFlag {
        Spam => "spam",
        Joke => "joke",
        Outdated => "outdated",
        OffTopic => "off_topic",
        LowEffort => "low_effort",
        Duplicate => "duplicate",
    }
}

/// One distinct item extracted from a thread (a product, a destination, ...)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entry {
    pub fields: Vec<FieldValue>,
    /// Deduplicated union of the field-level links
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rank_flags: Vec<RankFlag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_reason: Option<String>,
}

impl Entry {
    pub fn new(fields: Vec<FieldValue>) -> Self {
        Self {
            fields,
            ..Default::default()
        }
    }

    pub fn field(&self, id: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// The value of the form's primary field, if answered.
    pub fn primary_value<'a>(&'a self, form: &Form) -> Option<&'a Value> {
        let primary = form.primary_field()?;
        self.field(&primary.id).map(|f| &f.value)
    }

    /// String form of the primary value (empty when unanswered or null).
    pub fn primary_text(&self, form: &Form) -> String {
        self.primary_value(form)
            .map(Value::display_string)
            .unwrap_or_default()
    }

    /// Add a flag if not already present, keeping flags sorted for
    /// deterministic serialization.
    pub fn add_flag(&mut self, flag: RankFlag) {
        if !self.rank_flags.contains(&flag) {
            self.rank_flags.push(flag);
            self.rank_flags.sort();
        }
    }

    /// Validate every field value against the form: ids must reference
    /// declared fields and dynamic types must agree with declared types.
    pub fn check_against(&self, form: &Form) -> Result<(), String> {
        for fv in &self.fields {
            let field = form
                .field(&fv.id)
                .ok_or_else(|| format!("field id '{}' not in form", fv.id))?;
            if !fv.value.matches_type(field.field_type) {
                return Err(format!(
                    "field '{}' value does not match declared type {}",
                    fv.id, field.field_type
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
