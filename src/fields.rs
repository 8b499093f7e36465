//! Field extraction
//!
//! Labels of document fields come from the index pattern the panel queries.
//! Resolving an index pattern is the caller's business (it usually means a
//! saved-object or mapping lookup), so the processors reach it only through
//! the [`FieldExtractor`] trait.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One field of an index pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name as stored in documents
    pub name: String,

    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Field type (number, date, keyword, ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
}

impl FieldSpec {
    /// Create a field with just a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            field_type: None,
        }
    }

    /// Set the display label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the field type
    pub fn with_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = Some(field_type.into());
        self
    }
}

/// Resolves the fields of an index pattern
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    /// Fields of `index`, in the order the caller wants them matched
    async fn extract_fields(&self, index: &str) -> Result<Vec<FieldSpec>>;
}

/// Extractor that knows no fields; labels fall back to raw field names
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFields;

#[async_trait]
impl FieldExtractor for NoFields {
    async fn extract_fields(&self, _index: &str) -> Result<Vec<FieldSpec>> {
        Ok(Vec::new())
    }
}

/// In-memory extractor keyed by index pattern
#[derive(Debug, Clone, Default)]
pub struct StaticFieldExtractor {
    indices: HashMap<String, Vec<FieldSpec>>,
}

impl StaticFieldExtractor {
    /// Create an empty extractor
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the fields of an index pattern
    pub fn with_index(mut self, index: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        self.indices.insert(index.into(), fields);
        self
    }
}

#[async_trait]
impl FieldExtractor for StaticFieldExtractor {
    async fn extract_fields(&self, index: &str) -> Result<Vec<FieldSpec>> {
        Ok(self.indices.get(index).cloned().unwrap_or_default())
    }
}
