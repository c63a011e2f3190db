//! Benchmarks for GF(2) matrix operations
//!
//! Run with: cargo bench -p cxroute-ir

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use cxroute_ir::{CnotCircuit, GF2Matrix};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Benchmark unconstrained Gauss-Jordan elimination
fn bench_gauss(c: &mut Criterion) {
    let mut group = c.benchmark_group("gauss");
    let mut rng = StdRng::seed_from_u64(42);

    for n in &[8, 16, 64, 128] {
        let matrix = GF2Matrix::random_invertible(*n, &mut rng);
        group.bench_with_input(BenchmarkId::new("full_reduce", n), &matrix, |b, m| {
            b.iter(|| {
                let mut work = m.clone();
                let mut circuit = CnotCircuit::new(work.rows());
                black_box(work.gauss(true, Some(&mut circuit)).ok());
            });
        });
    }

    group.finish();
}

/// Benchmark matrix inversion
fn bench_inverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("inverse");
    let mut rng = StdRng::seed_from_u64(7);

    for n in &[16, 64, 256] {
        let matrix = GF2Matrix::random_invertible(*n, &mut rng);
        group.bench_with_input(BenchmarkId::new("inverse", n), &matrix, |b, m| {
            b.iter(|| black_box(m.inverse()));
        });
    }

    group.finish();
}

/// Benchmark parity map reconstruction and depth computation
fn bench_circuit_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("circuit_metrics");
    let mut rng = StdRng::seed_from_u64(1);
    let circuit = CnotCircuit::random(20, 2000, &mut rng);

    group.bench_function("parity_map", |b| {
        b.iter(|| black_box(circuit.parity_map()));
    });

    group.bench_function("cnot_depth", |b| {
        b.iter(|| black_box(circuit.cnot_depth()));
    });

    group.finish();
}

criterion_group!(benches, bench_gauss, bench_inverse, bench_circuit_metrics);
criterion_main!(benches);
