use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use hindsight_core::{FilterConfig, InitialConditions, KalmanFilter, LinearModel, Matrix, Vector};

fn tracker(capacity: usize) -> KalmanFilter {
    #[rustfmt::skip]
    let transition = Matrix::from_row_slice(4, 4, &[
        1.0, 0.0, 0.0, 0.1,
        0.0, 1.0, 0.1, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ]);
    let model = LinearModel::new(
        transition,
        Matrix::from_row_slice(4, 1, &[0.0, 0.005, 0.1, 0.0]),
        Matrix::from_row_slice(2, 4, &[1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0]),
        Matrix::zeros(2, 1),
        Matrix::identity(2, 2),
        Matrix::from_diagonal(&Vector::from_vec(vec![0.2, 0.2, 0.1, 0.1])),
        Matrix::from_diagonal(&Vector::from_vec(vec![0.2, 0.2])),
        Matrix::from_diagonal(&Vector::from_vec(vec![0.2, 0.2, 0.1, 0.1])),
        Vector::from_vec(vec![-0.5]),
    );
    let initial = InitialConditions::new(
        Matrix::identity(4, 4),
        Vector::from_vec(vec![300.0, 200.0, 20.0, 20.0]),
        Some(Vector::from_vec(vec![300.0, 200.0])),
    );

    let mut kf = KalmanFilter::with_config(
        model,
        initial,
        FilterConfig::default().with_history_capacity(capacity),
    )
    .unwrap();
    for k in 1..capacity {
        let t = k as f64 * 0.1;
        kf.ingest(Some(Vector::from_vec(vec![300.0 + 2.0 * t, 200.0 + 2.0 * t])))
            .unwrap();
    }
    kf
}

fn bench_cold_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("cold_query");

    for capacity in [50, 200, 1000] {
        group.bench_function(format!("newest_of_{}", capacity), |b| {
            b.iter_batched(
                || tracker(capacity),
                |mut kf| black_box(kf.a_posteriori_state_estimate(capacity - 1).unwrap()),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_cached_query(c: &mut Criterion) {
    let mut kf = tracker(200);
    kf.a_posteriori_state_estimate(199).unwrap();

    c.bench_function("cached_query", |b| {
        b.iter(|| black_box(kf.a_posteriori_state_estimate(black_box(150)).unwrap()))
    });
}

fn bench_sliding_ingest(c: &mut Criterion) {
    // Full window: every ingest resolves and evicts the oldest record
    let mut kf = tracker(200);
    let reading = Vector::from_vec(vec![340.0, 240.0]);

    c.bench_function("ingest_at_capacity", |b| {
        b.iter(|| kf.ingest(black_box(Some(reading.clone()))).unwrap())
    });
}

fn bench_far_prediction(c: &mut Criterion) {
    let mut kf = tracker(50);
    kf.a_posteriori_state_estimate(49).unwrap();

    c.bench_function("prediction_1000_ahead", |b| {
        b.iter(|| black_box(kf.a_posteriori_state_estimate(black_box(1049)).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_cold_query,
    bench_cached_query,
    bench_sliding_ingest,
    bench_far_prediction
);
criterion_main!(benches);
