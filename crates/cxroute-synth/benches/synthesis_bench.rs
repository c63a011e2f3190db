//! Benchmarks for architecture-aware synthesis
//!
//! Run with: cargo bench -p cxroute-synth

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use cxroute_ir::{CnotCircuit, GF2Matrix};
use cxroute_synth::{
    ConnectivityGraph, EliminationMode, Eliminator, PermRowCol, RowCol, SteinerGauss,
    SteinerVariant, SynthesisConfig, Synthesizer,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn reduce(eliminator: &dyn Eliminator, arch: &ConnectivityGraph, matrix: &GF2Matrix) -> usize {
    let mut work = matrix.clone();
    let mut circuit = CnotCircuit::new(work.rows());
    eliminator
        .reduce(&mut work, Some(arch), Some(&mut circuit))
        .map(|_| circuit.count_cnots())
        .unwrap_or(0)
}

/// Benchmark both Steiner-Gauss variants on square grids
fn bench_steiner(c: &mut Criterion) {
    let mut group = c.benchmark_group("steiner_gauss");
    let mut rng = StdRng::seed_from_u64(42);

    for side in &[3, 4, 5] {
        let arch = ConnectivityGraph::grid(*side, *side);
        let matrix = GF2Matrix::random_invertible(side * side, &mut rng);
        for variant in [SteinerVariant::Iterative, SteinerVariant::Recursive] {
            let steiner = SteinerGauss::new(true).with_variant(variant);
            group.bench_with_input(
                BenchmarkId::new(format!("{variant:?}"), side * side),
                &matrix,
                |b, m| b.iter(|| black_box(reduce(&steiner, &arch, m))),
            );
        }
    }

    group.finish();
}

/// Benchmark vertex elimination
fn bench_rowcol(c: &mut Criterion) {
    let mut group = c.benchmark_group("rowcol");
    let mut rng = StdRng::seed_from_u64(7);

    for n in &[9, 16] {
        let arch = ConnectivityGraph::ring(*n);
        let matrix = GF2Matrix::random_invertible(*n, &mut rng);
        group.bench_with_input(BenchmarkId::new("row_col", n), &matrix, |b, m| {
            b.iter(|| black_box(reduce(&RowCol::new(), &arch, m)));
        });
        group.bench_with_input(BenchmarkId::new("perm_row_col", n), &matrix, |b, m| {
            b.iter(|| black_box(reduce(&PermRowCol::new(), &arch, m)));
        });
    }

    group.finish();
}

/// Benchmark a short genetic placement search
fn bench_genetic(c: &mut Criterion) {
    let mut group = c.benchmark_group("genetic_steiner");
    group.sample_size(10);
    let mut rng = StdRng::seed_from_u64(1);
    let matrix = GF2Matrix::random_invertible(9, &mut rng);

    let mut config = SynthesisConfig {
        mode: EliminationMode::GeneticSteiner,
        ..SynthesisConfig::default()
    };
    config.genetic.population_size = 16;
    config.genetic.generations = 3;
    let synthesizer = Synthesizer::builder()
        .with_config(config)
        .with_architecture(ConnectivityGraph::grid(3, 3))
        .build()
        .expect("benchmark configuration is valid");

    group.bench_function("grid_3x3", |b| {
        b.iter(|| black_box(synthesizer.synthesize(&matrix).map(|s| s.circuit.count_cnots())));
    });

    group.finish();
}

criterion_group!(benches, bench_steiner, bench_rowcol, bench_genetic);
criterion_main!(benches);
