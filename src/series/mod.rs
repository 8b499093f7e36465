//! Series configuration
//!
//! Describes one logical time series of a panel: its metrics (the last one
//! decides which processor renders it), how it is split into sub-series and
//! the labels used for display. These types deserialize from the saved panel
//! model, so serde names follow its camel/snake mix.

pub mod label;
pub mod metric;

pub use metric::{last_metric, Metric, SERIES_AGG};

use serde::{Deserialize, Serialize};

/// How a series is split into sub-series
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    /// No split, one series over all documents
    #[default]
    Everything,
    /// One series restricted by a single filter
    Filter,
    /// One series per configured filter
    Filters,
    /// One series per term of a field
    Terms,
}

/// Query of a split filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterQuery {
    /// Query string
    #[serde(default)]
    pub query: String,

    /// Query language (kuery, lucene)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// One entry of a `filters` split
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitFilter {
    /// Filter id, also the key of its bucket in the response
    pub id: String,

    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Display colour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Filter query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterQuery>,
}

impl SplitFilter {
    /// Label shown for the filter: explicit label, then the query, then `*`
    pub fn display_label(&self) -> String {
        if let Some(label) = self.label.as_deref().filter(|l| !l.is_empty()) {
            return label.to_string();
        }
        self.filter
            .as_ref()
            .map(|f| f.query.as_str())
            .filter(|q| !q.is_empty())
            .unwrap_or("*")
            .to_string()
    }
}

/// Configuration of one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Series id, also the name of its aggregation in the response
    pub id: String,

    /// Label template; `{{ key }}` is replaced by the split key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Series colour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Metrics in definition order
    #[serde(default)]
    pub metrics: Vec<Metric>,

    /// Split mode
    #[serde(default)]
    pub split_mode: SplitMode,

    /// Filters for `filters` split mode, in display order
    #[serde(default)]
    pub split_filters: Vec<SplitFilter>,

    /// Field for `terms` split mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_field: Option<String>,
}

impl SeriesConfig {
    /// Create a series with the given metrics and no split
    pub fn new(id: impl Into<String>, metrics: Vec<Metric>) -> Self {
        Self {
            id: id.into(),
            label: None,
            color: None,
            metrics,
            split_mode: SplitMode::Everything,
            split_filters: Vec::new(),
            terms_field: None,
        }
    }

    /// Set the label template
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the colour
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Split into one series per filter
    pub fn with_split_filters(mut self, filters: Vec<SplitFilter>) -> Self {
        self.split_mode = SplitMode::Filters;
        self.split_filters = filters;
        self
    }

    /// Split into one series per term of `field`
    pub fn with_terms(mut self, field: impl Into<String>) -> Self {
        self.split_mode = SplitMode::Terms;
        self.terms_field = Some(field.into());
        self
    }

    /// Label template, ignoring empty strings
    pub fn label_template(&self) -> Option<&str> {
        self.label.as_deref().filter(|l| !l.is_empty())
    }
}

/// Request metadata shared by all processors of a series
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesMeta {
    /// Index pattern queried; fields are only extracted when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,

    /// Time field of the date histogram
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_field: Option<String>,

    /// Date histogram interval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}
