//! Metric definitions

use serde::{Deserialize, Serialize};

use super::SeriesConfig;

/// Type of the metric that aggregates across series; it never renders by itself
pub const SERIES_AGG: &str = "series_agg";

/// One metric of a series
///
/// Only the fields the response processors read are modelled; the rest of the
/// saved metric is ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    /// Metric id, also the name of its aggregation in the response
    pub id: String,

    /// Metric type (`avg`, `avg_bucket`, `std_deviation_bucket`, ...)
    #[serde(rename = "type")]
    pub metric_type: String,

    /// Document field, or the id of the metric a pipeline metric reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Rendering mode (`raw`, `upper`, `lower`, `band`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// User supplied label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Function of a `series_agg` metric
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    /// Value of a `static` metric
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Metric {
    /// Create a metric with id and type
    pub fn new(id: impl Into<String>, metric_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metric_type: metric_type.into(),
            field: None,
            mode: None,
            alias: None,
            function: None,
            value: None,
        }
    }

    /// Set the field
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the mode
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Set the alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Mode as a string slice
    pub fn mode(&self) -> Option<&str> {
        self.mode.as_deref()
    }
}

/// The metric that decides how a series is rendered
///
/// This is the last metric of the series, skipping `series_agg` metrics which
/// only post-process other series. Returns `None` for a series without
/// renderable metrics.
pub fn last_metric(series: &SeriesConfig) -> Option<&Metric> {
    series
        .metrics
        .iter()
        .rev()
        .find(|m| m.metric_type != SERIES_AGG)
}
