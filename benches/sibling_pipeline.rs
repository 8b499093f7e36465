use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Map, Value};

use kuba_tsvb::fields::NoFields;
use kuba_tsvb::{
    Metric, PipelineConfig, ProcessorContext, ResponsePipeline, ResultRows, SeriesConfig, SeriesMeta,
};

fn create_terms_response(splits: usize, buckets: usize) -> Map<String, Value> {
    let terms: Vec<Value> = (0..splits)
        .map(|i| {
            let timeseries: Vec<Value> = (0..buckets)
                .map(|j| {
                    json!({
                        "key": 1_600_000_000_000i64 + (j as i64 * 10_000),
                        "doc_count": j,
                        "m2": {"avg": 100.0 + (j as f64 * 0.5)}
                    })
                })
                .collect();
            json!({"key": format!("host-{}", i), "timeseries": {"buckets": timeseries}})
        })
        .collect();

    let mut bucket = Map::new();
    bucket.insert("s1".to_string(), json!({ "buckets": terms }));
    bucket
}

fn bench_sibling_pipeline(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let pipeline = ResponsePipeline::from_config(&PipelineConfig::default());
    let series = SeriesConfig::new(
        "s1",
        vec![
            Metric::new("m1", "avg").with_field("cpu"),
            Metric::new("m2", "avg_bucket").with_field("m1"),
        ],
    )
    .with_terms("host");
    let meta = SeriesMeta::default();

    let mut group = c.benchmark_group("sibling_pipeline");

    for (splits, buckets) in [(1, 100), (10, 100), (10, 1000), (100, 100)].iter() {
        let bucket = create_terms_response(*splits, *buckets);
        let ctx = ProcessorContext::new(&bucket, &series, &meta, &NoFields);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", splits, buckets)),
            &ctx,
            |b, ctx| {
                b.iter(|| {
                    rt.block_on(async {
                        black_box(pipeline.run(ctx, ResultRows::new()).await.unwrap())
                    })
                });
            },
        );
    }

    group.finish();
}

fn bench_passthrough(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let pipeline = ResponsePipeline::from_config(&PipelineConfig::default());
    let series = SeriesConfig::new("s1", vec![Metric::new("m1", "avg").with_field("cpu")]);
    let meta = SeriesMeta::default();
    let bucket = create_terms_response(10, 100);
    let ctx = ProcessorContext::new(&bucket, &series, &meta, &NoFields);

    c.bench_function("passthrough", |b| {
        b.iter(|| rt.block_on(async { black_box(pipeline.run(&ctx, ResultRows::new()).await.unwrap()) }))
    });
}

criterion_group!(benches, bench_sibling_pipeline, bench_passthrough);
criterion_main!(benches);
