use automl_pipelines::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_classification_data(n_rows: usize, n_features: usize) -> (DataFrame, Series) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let columns: Vec<Column> = (0..n_features)
        .map(|i| {
            let values: Vec<f64> = (0..n_rows).map(|_| rng.gen::<f64>() * 10.0).collect();
            Column::new(format!("feature_{}", i).into(), values)
        })
        .collect();
    let df = DataFrame::new(columns).unwrap();

    // Label depends on the first feature plus noise
    let first = df.column("feature_0").unwrap().as_materialized_series().f64().unwrap().clone();
    let target: Vec<f64> = first
        .into_iter()
        .map(|v| {
            let v = v.unwrap_or(0.0) + rng.gen::<f64>();
            if v > 5.5 {
                1.0
            } else {
                0.0
            }
        })
        .collect();

    (df, Series::new("target".into(), target))
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_fit");
    group.sample_size(10);

    for n_rows in [500, 2000].iter() {
        let data = create_classification_data(*n_rows, 8);

        group.bench_with_input(BenchmarkId::new("random_forest", n_rows), &data, |b, (x, y)| {
            b.iter(|| {
                let mut pipeline =
                    BinaryClassificationPipeline::new(&RFClassificationPipeline, Parameters::new())
                        .unwrap();
                pipeline.fit(black_box(x), black_box(y)).unwrap();
            })
        });

        group.bench_with_input(BenchmarkId::new("logistic_regression", n_rows), &data, |b, (x, y)| {
            b.iter(|| {
                let mut pipeline = BinaryClassificationPipeline::new(
                    &LogisticRegressionPipeline,
                    Parameters::new(),
                )
                .unwrap();
                pipeline.fit(black_box(x), black_box(y)).unwrap();
            })
        });
    }

    group.finish();
}

fn bench_score(c: &mut Criterion) {
    let (x, y) = create_classification_data(2000, 8);
    let mut pipeline =
        BinaryClassificationPipeline::new(&RFClassificationPipeline, Parameters::new()).unwrap();
    pipeline.fit(&x, &y).unwrap();
    let objectives: Vec<ObjectiveRef> = vec![
        "Accuracy Binary".into(),
        "F1".into(),
        "AUC".into(),
        "Log Loss Binary".into(),
    ];

    c.bench_function("pipeline_score", |b| {
        b.iter(|| pipeline.score(black_box(&x), black_box(&y), &objectives).unwrap())
    });
}

criterion_group!(benches, bench_fit, bench_score);
criterion_main!(benches);
