//! Split discovery
//!
//! Partitions the aggregation of one series into splits: one per terms
//! bucket, one per configured filter, or a single split when the series is
//! not split. Every split carries its date histogram buckets and the nodes of
//! its sibling metrics.
//!
//! Split order always follows the response (terms) or the series config
//! (filters), never map iteration order.

use serde_json::{Map, Value};
use tracing::trace;

use crate::config::SiblingRules;
use crate::error::{ResponseError, Result};
use crate::fields::{FieldExtractor, FieldSpec};
use crate::response::{dotted, AggregationResponse, Bucket, Timeseries, AGGREGATIONS};
use crate::series::label::{calculate_label, format_key};
use crate::series::{last_metric, SeriesConfig, SeriesMeta, SplitMode};
use crate::types::BucketKey;

/// One sub-series of a series
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// `<series id>` or `<series id>:<split key>`
    pub id: String,

    /// Split key, `None` for an unsplit series
    pub key: Option<BucketKey>,

    /// Display label
    pub label: String,

    /// Label built from the engine-formatted key, when there is one
    pub label_formatted: Option<String>,

    /// Label of the series' terminal metric
    pub split_by_label: String,

    /// Display colour
    pub color: Option<String>,

    /// Date histogram buckets in time order
    pub timeseries: Timeseries,

    /// Aggregation node of the split (bucket node, or the merged sibling
    /// metric nodes of an unsplit series)
    pub node: Map<String, Value>,
}

/// Discover the splits of `series` in `response`
///
/// Fails with a malformed response error when the series aggregation or a
/// split's date histogram is missing.
pub async fn get_splits(
    response: &AggregationResponse,
    series: &SeriesConfig,
    meta: &SeriesMeta,
    fields: &dyn FieldExtractor,
    rules: &SiblingRules,
) -> Result<Vec<Split>> {
    let fields_for_series: Vec<FieldSpec> = match meta.index.as_deref() {
        Some(index) => fields.extract_fields(index).await?,
        None => Vec::new(),
    };
    let split_by_label = calculate_label(last_metric(series), &series.metrics, &fields_for_series);

    let series_path = dotted(&[AGGREGATIONS, &series.id]);
    let series_node = response
        .aggregation(&series.id)
        .ok_or_else(|| ResponseError::missing(series_path.clone()))?
        .as_object()
        .ok_or_else(|| ResponseError::shape(series_path.clone(), "an object"))?;

    let splits = match series_node.get("buckets") {
        Some(Value::Array(buckets)) => {
            terms_splits(buckets, series, &split_by_label, &series_path)?
        }
        Some(Value::Object(buckets)) if series.split_mode == SplitMode::Filters => {
            filter_splits(buckets, series, &split_by_label, &series_path)?
        }
        _ => vec![single_split(series_node, series, split_by_label, &series_path, rules)?],
    };

    trace!(
        series = %series.id,
        splits = splits.len(),
        "Discovered splits"
    );
    Ok(splits)
}

fn terms_splits(
    buckets: &[Value],
    series: &SeriesConfig,
    split_by_label: &str,
    series_path: &str,
) -> Result<Vec<Split>> {
    let buckets_path = dotted(&[series_path, "buckets"]);

    buckets
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let path = format!("{}[{}]", buckets_path, i);
            let bucket = Bucket::from_node(raw, &path)?;
            let timeseries = Timeseries::from_parent(bucket.node(), &path)?;
            let key = bucket.key.to_string();
            let node = bucket.node().clone();

            Ok(Split {
                id: format!("{}:{}", series.id, key),
                label: format_key(&key, series),
                label_formatted: bucket
                    .key_as_string
                    .as_deref()
                    .map(|k| format_key(k, series)),
                split_by_label: split_by_label.to_string(),
                color: series.color.clone(),
                timeseries,
                key: Some(bucket.key),
                node,
            })
        })
        .collect()
}

fn filter_splits(
    buckets: &Map<String, Value>,
    series: &SeriesConfig,
    split_by_label: &str,
    series_path: &str,
) -> Result<Vec<Split>> {
    series
        .split_filters
        .iter()
        .map(|filter| {
            let path = dotted(&[series_path, "buckets", &filter.id]);
            let node = buckets
                .get(&filter.id)
                .ok_or_else(|| ResponseError::missing(path.clone()))?
                .as_object()
                .ok_or_else(|| ResponseError::shape(path.clone(), "a bucket object"))?;
            let timeseries = Timeseries::from_parent(node, &path)?;

            Ok(Split {
                id: format!("{}:{}", series.id, filter.id),
                key: Some(BucketKey::Str(filter.id.clone())),
                label: filter.display_label(),
                label_formatted: None,
                split_by_label: split_by_label.to_string(),
                color: filter.color.clone(),
                timeseries,
                node: node.clone(),
            })
        })
        .collect()
}

fn single_split(
    series_node: &Map<String, Value>,
    series: &SeriesConfig,
    split_by_label: String,
    series_path: &str,
    rules: &SiblingRules,
) -> Result<Split> {
    let timeseries = Timeseries::from_parent(series_node, series_path)?;

    // Same predicate the stages use to claim a metric
    let mut node = Map::new();
    for metric in &series.metrics {
        if rules.is_sibling_metric(metric) {
            if let Some(value) = series_node.get(&metric.id) {
                node.insert(metric.id.clone(), value.clone());
            }
        }
    }

    Ok(Split {
        id: series.id.clone(),
        key: None,
        label: series
            .label_template()
            .map(str::to_string)
            .unwrap_or_else(|| split_by_label.clone()),
        label_formatted: None,
        split_by_label,
        color: series.color.clone(),
        timeseries,
        node,
    })
}
