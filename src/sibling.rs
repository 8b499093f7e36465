//! Sibling pipeline metric values
//!
//! A sibling pipeline aggregation (`avg_bucket`, `max_bucket`, ...) is
//! requested as an extended stats bucket aggregation over the time buckets and
//! returned next to them, keyed by the metric id. The metric type without its
//! suffix names the statistic to read:
//!
//! ```text
//! { "timeseries": { "buckets": [...] },
//!   "m2": { "count": 3, "min": 1.0, "max": 9.0, "avg": 4.0, "sum": 12.0, ... } }
//! ```
//!
//! `std_deviation_bucket` additionally returns `std_deviation_bounds` with
//! `upper` and `lower` entries, selected by the metric mode.

use serde_json::{Map, Value};

use crate::config::SiblingRules;
use crate::response::{lookup_in, Bucket};
use crate::series::Metric;
use crate::splits::Split;

/// Path of the value below the metric's node
pub fn sibling_agg_key<'a>(metric: &'a Metric, rules: &SiblingRules) -> Vec<&'a str> {
    let key = rules.base_type(&metric.metric_type);
    match (key, metric.mode()) {
        ("std_deviation", Some(mode @ ("upper" | "lower"))) => vec!["std_deviation_bounds", mode],
        _ => vec![key],
    }
}

/// Value of the sibling metric in `node`, `None` when absent
///
/// Missing nodes, `null` and non-numeric values all read as absent: empty
/// buckets legitimately carry no value.
pub fn sibling_agg_value(node: &Map<String, Value>, metric: &Metric, rules: &SiblingRules) -> Option<f64> {
    let mut path = vec![metric.id.as_str()];
    path.extend(sibling_agg_key(metric, rules));
    lookup_in(node, &path).and_then(Value::as_f64)
}

/// Value of the sibling metric for one time bucket of a split
///
/// When the bucket carries its own node for the metric, the value is read from
/// the bucket. Otherwise the split-level value (computed over all of the
/// split's buckets) applies to every bucket.
pub fn bucket_sibling_value(split: &Split, bucket: &Bucket, metric: &Metric, rules: &SiblingRules) -> Option<f64> {
    if bucket.child(&metric.id).is_some() {
        sibling_agg_value(bucket.node(), metric, rules)
    } else {
        sibling_agg_value(&split.node, metric, rules)
    }
}
