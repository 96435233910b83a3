//! Benchmarks for forest fitting and prediction
//!
//! Run with: cargo bench --package forest
//!
//! Uses a synthetic corpus shaped like the box-office design matrix
//! (10 numeric columns plus sparse indicator columns).

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use forest::{RandomForestRegressor, Regressor};

fn synthetic_matrix(rows: usize, indicators: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
    let x: Vec<Vec<f64>> = (0..rows)
        .map(|i| {
            let mut row: Vec<f64> = (0..10).map(|j| ((i * 31 + j * 17) % 97) as f64).collect();
            row.extend((0..indicators).map(|k| if (i + k) % 7 == 0 { 1.0 } else { 0.0 }));
            row
        })
        .collect();
    let y = x.iter().map(|row| row[8] * 20.0 + row[9] * 3.0 + row[0]).collect();
    (x, y)
}

fn bench_fit(c: &mut Criterion) {
    let (x, y) = synthetic_matrix(200, 30);

    c.bench_function("forest_fit_50_trees", |b| {
        b.iter(|| {
            let mut rf = RandomForestRegressor::new(50).with_random_state(123);
            rf.fit(black_box(&x), black_box(&y)).unwrap();
            black_box(rf)
        })
    });
}

fn bench_predict(c: &mut Criterion) {
    let (x, y) = synthetic_matrix(200, 30);
    let mut rf = RandomForestRegressor::new(100).with_random_state(123);
    rf.fit(&x, &y).unwrap();

    c.bench_function("forest_predict_one", |b| {
        b.iter(|| black_box(rf.predict_one(black_box(&x[17])).unwrap()))
    });
}

criterion_group!(benches, bench_fit, bench_predict);
criterion_main!(benches);
