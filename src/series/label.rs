//! Display labels for metrics and split keys

use lazy_static::lazy_static;
use regex::Regex;

use super::{Metric, SeriesConfig};
use crate::fields::FieldSpec;

lazy_static! {
    /// `{{ key }}` placeholder in series label templates
    static ref KEY_PLACEHOLDER: Regex = Regex::new(r"\{\{\s*key\s*\}\}").expect("valid regex");

    /// Percentile reference suffix of a pipeline metric field (`m1[99]`)
    static ref PERCENTILE_REF: Regex = Regex::new(r"\[([0-9.]+)\]$").expect("valid regex");
}

/// Metric types that read another metric through their `field`
const PIPELINE_TYPES: &[&str] = &[
    "avg_bucket",
    "max_bucket",
    "min_bucket",
    "sum_bucket",
    "std_deviation_bucket",
    "variance_bucket",
    "sum_of_squares_bucket",
    "cumulative_sum",
    "derivative",
    "moving_average",
    "serial_diff",
    "positive_only",
];

/// Human readable name of a metric type
pub fn metric_type_label(metric_type: &str) -> Option<&'static str> {
    let label = match metric_type {
        "avg" => "Average",
        "cardinality" => "Unique Count",
        "count" => "Count",
        "max" => "Max",
        "min" => "Min",
        "sum" => "Sum",
        "std_deviation" => "Std. Deviation",
        "variance" => "Variance",
        "sum_of_squares" => "Sum of Squares",
        "percentile" => "Percentile",
        "percentile_rank" => "Percentile Rank",
        "top_hit" => "Top Hit",
        "value_count" => "Value Count",
        "avg_bucket" => "Overall Average",
        "max_bucket" => "Overall Max",
        "min_bucket" => "Overall Min",
        "sum_bucket" => "Overall Sum",
        "std_deviation_bucket" => "Overall Std. Deviation",
        "variance_bucket" => "Overall Variance",
        "sum_of_squares_bucket" => "Overall Sum of Squares",
        "cumulative_sum" => "Cumulative Sum",
        "derivative" => "Derivative",
        "moving_average" => "Moving Average",
        "serial_diff" => "Serial Difference",
        "positive_only" => "Positive Only",
        _ => return None,
    };
    Some(label)
}

/// Label of a document field: its display label, else its name
pub fn extract_field_label(fields: &[FieldSpec], name: &str) -> String {
    fields
        .iter()
        .find(|f| f.name == name)
        .map(|f| f.label.clone().unwrap_or_else(|| f.name.clone()))
        .unwrap_or_else(|| name.to_string())
}

/// Display label of `metric`
///
/// Pipeline metrics are labelled after the metric they read, which is looked
/// up in `metrics` by id prefix of the pipeline metric's field.
pub fn calculate_label(metric: Option<&Metric>, metrics: &[Metric], fields: &[FieldSpec]) -> String {
    calculate_label_at_depth(metric, metrics, fields, 0)
}

// Bounded so a self-referencing pipeline metric cannot recurse forever.
const MAX_LABEL_DEPTH: usize = 16;

fn calculate_label_at_depth(
    metric: Option<&Metric>,
    metrics: &[Metric],
    fields: &[FieldSpec],
    depth: usize,
) -> String {
    let Some(metric) = metric else {
        return "Unknown".to_string();
    };
    if let Some(alias) = metric.alias.as_deref().filter(|a| !a.is_empty()) {
        return alias.to_string();
    }

    let field = metric.field.as_deref().unwrap_or_default();
    match metric.metric_type.as_str() {
        "count" => return "Count".to_string(),
        "calculation" => return "Bucket Script".to_string(),
        "math" => return "Math".to_string(),
        "series_agg" => {
            return format!(
                "Series Agg ({})",
                metric.function.as_deref().unwrap_or_default()
            )
        }
        "filter_ratio" => return "Filter Ratio".to_string(),
        "positive_rate" => {
            return format!("Counter Rate of {}", extract_field_label(fields, field))
        }
        "static" => {
            return format!(
                "Static Value of {}",
                metric.value.as_deref().unwrap_or_default()
            )
        }
        _ => {}
    }

    let type_label = metric_type_label(&metric.metric_type).unwrap_or(metric.metric_type.as_str());

    if PIPELINE_TYPES.contains(&metric.metric_type.as_str()) {
        let target = if depth < MAX_LABEL_DEPTH {
            metrics
                .iter()
                .find(|m| !field.is_empty() && field.starts_with(m.id.as_str()))
        } else {
            None
        };
        let target_label = calculate_label_at_depth(target, metrics, fields, depth + 1);

        if let Some(caps) = PERCENTILE_REF.captures(field) {
            return format!("{} of {} ({})", type_label, target_label, &caps[1]);
        }
        return format!("{} of {}", type_label, target_label);
    }

    format!("{} of {}", type_label, extract_field_label(fields, field))
}

/// Label of a split key, applying the series label template when it has a
/// `{{ key }}` placeholder
pub fn format_key(key: &str, series: &SeriesConfig) -> String {
    match series.label_template() {
        Some(template) if KEY_PLACEHOLDER.is_match(template) => {
            KEY_PLACEHOLDER.replace(template, regex::NoExpand(key)).into_owned()
        }
        _ => key.to_string(),
    }
}
