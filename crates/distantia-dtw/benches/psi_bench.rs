//! Criterion benchmarks for distantia-dtw: distance matrix, cost matrix, and full psi.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use distantia_dtw::{
    BandConstraint, CostPolicy, Distance, DtwConfig, Sequence, cost_matrix, distance_matrix,
};

fn make_sine_sequence(n: usize, cols: usize, offset: f64) -> Sequence {
    let data: Vec<f64> = (0..n * cols)
        .map(|k| ((k / cols) as f64 * 0.1 + (k % cols) as f64).sin() + offset)
        .collect();
    Sequence::from_row_major(n, cols, data).unwrap()
}

fn bench_distance_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("distance_matrix");

    for &len in &[64usize, 256, 1024] {
        let a = make_sine_sequence(len, 4, 0.0);
        let b = make_sine_sequence(len, 4, 1.0);
        group.bench_with_input(BenchmarkId::new("euclidean", len), &(a, b), |bencher, (a, b)| {
            bencher.iter(|| distance_matrix(a, b, Distance::Euclidean).unwrap());
        });
    }

    group.finish();
}

fn bench_cost_matrix(c: &mut Criterion) {
    let a = make_sine_sequence(512, 4, 0.0);
    let b = make_sine_sequence(512, 4, 1.0);
    let dist = distance_matrix(&a, &b, Distance::Euclidean).unwrap();

    let mut group = c.benchmark_group("cost_matrix");
    for policy in [
        CostPolicy::Orthogonal,
        CostPolicy::Diagonal,
        CostPolicy::WeightedDiagonal,
    ] {
        group.bench_with_input(BenchmarkId::new("512x512", policy), &dist, |bencher, dist| {
            bencher.iter(|| cost_matrix(dist, policy));
        });
    }
    group.finish();
}

fn bench_psi(c: &mut Criterion) {
    let a = make_sine_sequence(256, 4, 0.0);
    let b = make_sine_sequence(200, 4, 0.5);
    let configs: &[(DtwConfig, &str)] = &[
        (DtwConfig::new(), "weighted"),
        (DtwConfig::new().with_trim_blocks(true), "weighted_trim"),
        (
            DtwConfig::new().with_band(BandConstraint::sakoe_chiba(0.1).unwrap()),
            "weighted_band0.1",
        ),
    ];

    let mut group = c.benchmark_group("psi");
    for (config, label) in configs {
        group.bench_function(*label, |bencher| {
            bencher.iter(|| config.psi(&a, &b).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_distance_matrix, bench_cost_matrix, bench_psi);
criterion_main!(benches);
