//! Sibling pipeline metric processor
//!
//! Renders series whose terminal metric is a sibling pipeline aggregation
//! (`avg_bucket`, `max_bucket`, ...) as one row per split with one data point
//! per time bucket. Combinations listed in [`SiblingRules::excluded`] are
//! left to the stage that owns them.

use async_trait::async_trait;

use super::{ProcessorContext, ResponseProcessor, StageOutcome};
use crate::config::SiblingRules;
use crate::error::Result;
use crate::response::AggregationResponse;
use crate::series::{last_metric, Metric};
use crate::sibling::bucket_sibling_value;
use crate::splits::{get_splits, Split};
use crate::types::{DataPoint, ResultRow, ResultRows};

/// One row per split for sibling pipeline metrics
#[derive(Debug, Clone, Default)]
pub struct StdSibling {
    rules: SiblingRules,
}

impl StdSibling {
    /// Create the stage with the given matching rules
    pub fn new(rules: SiblingRules) -> Self {
        Self { rules }
    }

    /// The metric this stage renders for `ctx`, or `None` to pass through
    pub fn applicable_metric<'a>(&self, ctx: &ProcessorContext<'a>) -> Option<&'a Metric> {
        last_metric(ctx.series)
            .filter(|metric| self.rules.is_sibling_metric(metric))
            .filter(|metric| !self.rules.is_excluded(metric))
    }

    fn split_row(&self, split: &Split, metric: &Metric) -> ResultRow {
        let data = split
            .timeseries
            .buckets
            .iter()
            .map(|bucket| {
                DataPoint::new(
                    bucket.key.clone(),
                    bucket_sibling_value(split, bucket, metric, &self.rules),
                )
            })
            .collect();

        ResultRow::new(split.id.clone(), split.label.clone(), data).with_color(split.color.clone())
    }
}

#[async_trait]
impl ResponseProcessor for StdSibling {
    fn name(&self) -> &'static str {
        "std_sibling"
    }

    async fn process(&self, ctx: &ProcessorContext<'_>, results: &mut ResultRows) -> Result<StageOutcome> {
        let Some(metric) = self.applicable_metric(ctx) else {
            return Ok(StageOutcome::Passthrough);
        };

        let response = AggregationResponse::from_bucket(ctx.bucket.clone());
        let splits = get_splits(&response, ctx.series, ctx.meta, ctx.fields, &self.rules).await?;

        let appended = splits.len();
        results.extend(splits.iter().map(|split| self.split_row(split, metric)));
        Ok(StageOutcome::Appended(appended))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::fields::NoFields;
    use crate::series::{SeriesConfig, SeriesMeta};
    use crate::types::BucketKey;
    use serde_json::{json, Map, Value};

    fn bucket(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    async fn run(series: &SeriesConfig, bucket: &Map<String, Value>, input: ResultRows) -> Result<(StageOutcome, ResultRows)> {
        let meta = SeriesMeta::default();
        let ctx = ProcessorContext::new(bucket, series, &meta, &NoFields);
        let mut results = input;
        let outcome = StdSibling::default().process(&ctx, &mut results).await?;
        Ok((outcome, results))
    }

    fn existing_rows() -> ResultRows {
        ResultRows::from(vec![ResultRow::new("prev", "Previous", vec![])])
    }

    #[tokio::test]
    async fn test_passthrough_for_non_sibling_metric() {
        let series = SeriesConfig::new("s1", vec![Metric::new("m1", "avg").with_field("bytes")]);
        // Response shape is irrelevant when the stage does not apply
        let (outcome, rows) = run(&series, &Map::new(), existing_rows()).await.unwrap();

        assert_eq!(outcome, StageOutcome::Passthrough);
        assert_eq!(rows, existing_rows());
    }

    #[tokio::test]
    async fn test_passthrough_for_excluded_combination() {
        let series = SeriesConfig::new(
            "s1",
            vec![Metric::new("m1", "std_deviation_bucket").with_mode("band")],
        );
        let (outcome, rows) = run(&series, &Map::new(), existing_rows()).await.unwrap();

        assert_eq!(outcome, StageOutcome::Passthrough);
        assert_eq!(rows, existing_rows());
    }

    #[tokio::test]
    async fn test_passthrough_without_metrics() {
        let series = SeriesConfig::new("s1", vec![]);
        let (outcome, _) = run(&series, &Map::new(), ResultRows::new()).await.unwrap();
        assert_eq!(outcome, StageOutcome::Passthrough);
    }

    #[tokio::test]
    async fn test_split_level_value_repeats_per_bucket() {
        let series = SeriesConfig::new(
            "s1",
            vec![
                Metric::new("m1", "avg").with_field("bytes"),
                Metric::new("m2", "max_bucket").with_field("m1"),
            ],
        );
        let node = bucket(json!({
            "s1": {
                "timeseries": {"buckets": [
                    {"key": 1000, "m1": {"value": 1.0}},
                    {"key": 2000, "m1": {"value": 5.0}},
                    {"key": 3000, "m1": {"value": null}}
                ]},
                "m2": {"max": 5.0, "avg": 3.0}
            }
        }));

        let (outcome, rows) = run(&series, &node, existing_rows()).await.unwrap();
        assert_eq!(outcome, StageOutcome::Appended(1));
        assert_eq!(rows.len(), 2);

        let row = &rows.as_slice()[1];
        assert_eq!(row.id, "s1");
        assert_eq!(row.label, "Overall Max of Average of bytes");
        assert_eq!(
            row.data,
            vec![
                DataPoint::new(BucketKey::Int(1000), Some(5.0)),
                DataPoint::new(BucketKey::Int(2000), Some(5.0)),
                DataPoint::new(BucketKey::Int(3000), Some(5.0)),
            ]
        );
    }

    #[tokio::test]
    async fn test_std_deviation_upper_mode() {
        let series = SeriesConfig::new(
            "s1",
            vec![Metric::new("m2", "std_deviation_bucket").with_mode("upper")],
        );
        let node = bucket(json!({
            "s1": {
                "timeseries": {"buckets": [{"key": 1}]},
                "m2": {"std_deviation": 2.0, "std_deviation_bounds": {"upper": 7.0, "lower": 1.0}}
            }
        }));

        let (_, rows) = run(&series, &node, ResultRows::new()).await.unwrap();
        assert_eq!(rows.as_slice()[0].data, vec![DataPoint::new(BucketKey::Int(1), Some(7.0))]);
    }

    #[tokio::test]
    async fn test_empty_buckets_still_append_row() {
        let series = SeriesConfig::new("s1", vec![Metric::new("m2", "sum_bucket")]);
        let node = bucket(json!({"s1": {"timeseries": {"buckets": []}, "m2": {"sum": null}}}));

        let (outcome, rows) = run(&series, &node, ResultRows::new()).await.unwrap();
        assert_eq!(outcome, StageOutcome::Appended(1));
        assert!(rows.as_slice()[0].data.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_response_propagates() {
        let series = SeriesConfig::new("s1", vec![Metric::new("m2", "avg_bucket")]);
        let node = bucket(json!({"s2": {}}));

        let err = run(&series, &node, ResultRows::new()).await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }
}
