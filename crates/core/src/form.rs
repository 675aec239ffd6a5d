// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Extraction forms: the user-authored schema describing what to pull
//! out of each thread.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating a form
#[derive(Debug, Error)]
pub enum FormError {
    #[error("failed to read form {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse form: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("form has no fields")]
    NoFields,
    #[error("duplicate field id: {0}")]
    DuplicateFieldId(String),
    #[error("field has an empty id")]
    EmptyFieldId,
}

/// Declared type of a form field's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    /// Array of strings
    Array,
}

crate::simple_display! {
    FieldType {
        String => "string",
        Number => "number",
        Boolean => "boolean",
        Array => "array",
    }
}

/// One extractable field of a form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    /// Stable identifier, unique within the form
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Natural-language question the extractor answers for this field
    pub question: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_hints: Vec<String>,
    #[serde(default)]
    pub required: bool,
    /// Hidden from the display projection
    #[serde(default)]
    pub internal: bool,
}

/// A user-defined extraction schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Form {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_hints: Vec<String>,
    pub fields: Vec<Field>,
}

impl Form {
    /// Parse and validate a form from its authoring JSON.
    pub fn parse(raw: &str) -> Result<Self, FormError> {
        let form: Form = serde_json::from_str(raw)?;
        form.validate()?;
        Ok(form)
    }

    /// Load a form from disk, returning the parsed form and the raw bytes
    /// (the raw content is what gets hashed into the manifest's form ref).
    pub fn load(path: &Path) -> Result<(Self, String), FormError> {
        let raw = std::fs::read_to_string(path).map_err(|source| FormError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let form = Self::parse(&raw)?;
        Ok((form, raw))
    }

    fn validate(&self) -> Result<(), FormError> {
        if self.fields.is_empty() {
            return Err(FormError::NoFields);
        }
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.id.is_empty() {
                return Err(FormError::EmptyFieldId);
            }
            if !seen.insert(field.id.as_str()) {
                return Err(FormError::DuplicateFieldId(field.id.clone()));
            }
        }
        Ok(())
    }

    /// The primary identifier for an entry: first required field, else first field.
    ///
    /// `validate` guarantees at least one field exists.
    pub fn primary_field(&self) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.required)
            .or_else(|| self.fields.first())
    }

    /// Look up a field by id
    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Fields shown to external renderers (internal fields excluded)
    pub fn display_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.internal)
    }

    /// Query fallback when the run config carries none: first search hint,
    /// else the form title.
    pub fn default_query(&self) -> &str {
        self.search_hints
            .first()
            .map(String::as_str)
            .unwrap_or(&self.title)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Form {
    /// A minimal single-field form for tests.
    pub fn test_single(field_id: &str) -> Self {
        Self {
            title: "Test form".to_string(),
            description: String::new(),
            search_hints: Vec::new(),
            fields: vec![Field {
                id: field_id.to_string(),
                field_type: FieldType::String,
                question: format!("What is the {}?", field_id),
                search_hints: Vec::new(),
                required: true,
                internal: false,
            }],
        }
    }

    /// A two-field form (required string + string-array) for tests.
    pub fn test_pair(primary: &str, secondary: &str) -> Self {
        Self {
            title: "Test form".to_string(),
            description: String::new(),
            search_hints: Vec::new(),
            fields: vec![
                Field {
                    id: primary.to_string(),
                    field_type: FieldType::String,
                    question: format!("What is the {}?", primary),
                    search_hints: Vec::new(),
                    required: true,
                    internal: false,
                },
                Field {
                    id: secondary.to_string(),
                    field_type: FieldType::Array,
                    question: format!("What are the {}?", secondary),
                    search_hints: Vec::new(),
                    required: false,
                    internal: false,
                },
            ],
        }
    }
}

#[cfg(test)]
#[path = "form_tests.rs"]
mod tests;
