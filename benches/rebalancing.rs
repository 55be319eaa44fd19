use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use sensor_fault::drift::{DatasetDriftDetector, DriftConfig};
use sensor_fault::synthetic::{Sampler, SmoteTomek};

/// Imbalanced data, one faulty row in ten
fn create_imbalanced_data(n_rows: usize, n_features: usize) -> (Array2<f64>, Array1<i64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let y: Array1<i64> = (0..n_rows).map(|i| if i % 10 == 0 { 1 } else { 0 }).collect();
    let x = Array2::from_shape_fn((n_rows, n_features), |(i, _)| {
        rng.gen::<f64>() * 10.0 + y[i] as f64 * 3.0
    });
    (x, y)
}

fn create_sensor_frame(n_rows: usize, n_features: usize, shift: f64) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let columns: Vec<Column> = (0..n_features)
        .map(|j| {
            let values: Vec<f64> = (0..n_rows).map(|_| rng.gen::<f64>() + shift).collect();
            Column::new(format!("sensor_{}", j).into(), values)
        })
        .collect();
    DataFrame::new(columns).unwrap()
}

fn bench_smote_tomek(c: &mut Criterion) {
    let mut group = c.benchmark_group("smote_tomek");
    group.sample_size(10);

    for n_rows in [500, 2000, 5000].iter() {
        let (x, y) = create_imbalanced_data(*n_rows, 20);

        group.bench_with_input(BenchmarkId::new("fit_resample", n_rows), &(x, y), |b, (x, y)| {
            b.iter(|| {
                let mut sampler = SmoteTomek::new().with_seed(42);
                sampler.fit_resample(black_box(x), black_box(y)).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_drift(c: &mut Criterion) {
    let mut group = c.benchmark_group("drift");

    for n_rows in [1000, 10000].iter() {
        let reference = create_sensor_frame(*n_rows, 50, 0.0);
        let current = create_sensor_frame(*n_rows, 50, 0.1);
        let detector = DatasetDriftDetector::new(DriftConfig::default());

        group.bench_with_input(
            BenchmarkId::new("detect", n_rows),
            &(reference, current),
            |b, (reference, current)| {
                b.iter(|| detector.detect(black_box(reference), black_box(current)).unwrap())
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_smote_tomek, bench_drift);
criterion_main!(benches);
