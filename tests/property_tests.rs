//! Property Tests for the Response Pipeline
//!
//! Uses property-based testing (proptest) to check row shape, ordering and
//! passthrough behavior over generated aggregation responses.

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use kuba_tsvb::fields::NoFields;
use kuba_tsvb::{
    BucketKey, DataPoint, Metric, PipelineConfig, ProcessorContext, ResponsePipeline, ResultRow,
    ResultRows, SeriesConfig, SeriesMeta,
};

// =============================================================================
// Test Data Strategies
// =============================================================================

/// Metric value as it appears in a response: a number or null
fn metric_value() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        3 => (-1e6..1e6f64).prop_map(Some),
        1 => (-1000i32..1000).prop_map(|i| Some(i as f64)),
        1 => Just(None),
    ]
}

/// Strictly increasing time bucket keys
fn bucket_keys(max_len: usize) -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(1i64..60_000, 0..max_len).prop_map(|deltas| {
        let mut current = 1_600_000_000_000i64;
        deltas
            .into_iter()
            .map(|delta| {
                current += delta;
                current
            })
            .collect()
    })
}

/// One terms split: its time bucket keys plus a per-bucket value for each
fn split_buckets() -> impl Strategy<Value = Vec<(i64, Option<f64>)>> {
    bucket_keys(20).prop_flat_map(|keys| {
        let len = keys.len();
        prop::collection::vec(metric_value(), len)
            .prop_map(move |values| keys.clone().into_iter().zip(values).collect())
    })
}

/// Metric types no stage claims
fn non_sibling_type() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "avg",
        "sum",
        "count",
        "max",
        "derivative",
        "moving_average",
        "cumulative_sum",
        "bucket_script",
        "_bucket",
    ])
}

// =============================================================================
// Helpers
// =============================================================================

fn terms_response(splits: &[Vec<(i64, Option<f64>)>]) -> Map<String, Value> {
    let terms: Vec<Value> = splits
        .iter()
        .enumerate()
        .map(|(i, buckets)| {
            let buckets: Vec<Value> = buckets
                .iter()
                .map(|(key, value)| json!({"key": key, "m2": {"max": value}}))
                .collect();
            json!({"key": format!("term-{}", i), "timeseries": {"buckets": buckets}})
        })
        .collect();

    let mut bucket = Map::new();
    bucket.insert("s1".to_string(), json!({ "buckets": terms }));
    bucket
}

fn max_bucket_series() -> SeriesConfig {
    SeriesConfig::new(
        "s1",
        vec![
            Metric::new("m1", "avg").with_field("latency"),
            Metric::new("m2", "max_bucket").with_field("m1"),
        ],
    )
    .with_terms("host")
}

fn run_blocking(bucket: &Map<String, Value>, series: &SeriesConfig, input: ResultRows) -> ResultRows {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let pipeline = ResponsePipeline::from_config(&PipelineConfig::default());
    let meta = SeriesMeta::default();
    let ctx = ProcessorContext::new(bucket, series, &meta, &NoFields);
    rt.block_on(pipeline.run(&ctx, input)).unwrap()
}

// =============================================================================
// Sibling Extraction Properties
// =============================================================================

mod sibling_extraction {
    use super::*;

    proptest! {
        /// One row per split, one point per time bucket, keys in response order
        #[test]
        fn rows_mirror_splits_and_buckets(
            splits in prop::collection::vec(split_buckets(), 0..8)
        ) {
            let bucket = terms_response(&splits);
            let rows = run_blocking(&bucket, &max_bucket_series(), ResultRows::new());

            prop_assert_eq!(rows.len(), splits.len());
            for (i, (row, expected)) in rows.iter().zip(&splits).enumerate() {
                prop_assert_eq!(&row.id, &format!("s1:term-{}", i));

                let points: Vec<DataPoint> = expected
                    .iter()
                    .map(|(key, value)| DataPoint::new(BucketKey::Int(*key), *value))
                    .collect();
                prop_assert_eq!(&row.data, &points);
            }
        }

        /// Earlier rows are never touched and stay in front
        #[test]
        fn existing_rows_are_preserved(
            splits in prop::collection::vec(split_buckets(), 0..5),
            existing in 0usize..5
        ) {
            let input: Vec<ResultRow> = (0..existing)
                .map(|i| ResultRow::new(format!("prior-{}", i), "Prior", vec![]))
                .collect();

            let bucket = terms_response(&splits);
            let rows = run_blocking(&bucket, &max_bucket_series(), ResultRows::from(input.clone()));

            prop_assert_eq!(rows.len(), existing + splits.len());
            prop_assert_eq!(&rows.as_slice()[..existing], input.as_slice());
        }

        /// Two passes over identical inputs produce identical rows
        #[test]
        fn processing_is_deterministic(
            splits in prop::collection::vec(split_buckets(), 0..5)
        ) {
            let series = max_bucket_series();
            let first = run_blocking(&terms_response(&splits), &series, ResultRows::new());
            let second = run_blocking(&terms_response(&splits), &series, ResultRows::new());
            prop_assert_eq!(first, second);
        }
    }
}

// =============================================================================
// Passthrough Properties
// =============================================================================

mod passthrough {
    use super::*;

    proptest! {
        /// A last metric that is not a sibling aggregation leaves rows unchanged
        #[test]
        fn non_sibling_metric_is_identity(
            metric_type in non_sibling_type(),
            splits in prop::collection::vec(split_buckets(), 0..3),
            existing in 0usize..4
        ) {
            let series = SeriesConfig::new("s1", vec![Metric::new("m2", metric_type)]);
            let input: ResultRows = (0..existing)
                .map(|i| ResultRow::new(format!("row-{}", i), "Row", vec![]))
                .collect::<Vec<_>>()
                .into();

            let rows = run_blocking(&terms_response(&splits), &series, input.clone());
            prop_assert_eq!(rows, input);
        }
    }
}
