//! Benchmarks for the packing strategies.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use foamcut_core::ga::GaConfig;
use foamcut_core::model::{Piece, StockBlock};
use foamcut_core::sa::SaConfig;
use foamcut_core::{Problem, Solver};
use foamcut_packing::{
    AnnealingOptions, AnnealingPacker, GeneticOptions, GeneticPacker, GreedyPacker,
};

fn mixed_problem() -> Problem {
    Problem::new(
        vec![
            Piece::new("A", 30.0, 20.0, 10.0).with_quantity(8),
            Piece::new("B", 25.0, 25.0, 25.0).with_quantity(6),
            Piece::new("C", 50.0, 10.0, 10.0).with_quantity(6),
        ],
        vec![StockBlock::new("S", 100.0, 100.0, 50.0).with_quantity(3)],
    )
    .expect("valid problem")
}

fn packer_benchmark(c: &mut Criterion) {
    let uniform = Problem::new(
        vec![Piece::new("B", 10.0, 10.0, 10.0).with_quantity(20)],
        vec![StockBlock::new("S", 100.0, 100.0, 100.0)],
    )
    .expect("valid problem");
    let mixed = mixed_problem();
    let greedy = GreedyPacker::new();

    c.bench_function("greedy_20_uniform_boxes", |b| {
        b.iter(|| black_box(greedy.solve(black_box(&uniform))))
    });
    c.bench_function("greedy_20_mixed_boxes", |b| {
        b.iter(|| black_box(greedy.solve(black_box(&mixed))))
    });

    let genetic = GeneticPacker::new(
        GeneticOptions::default()
            .with_ga(GaConfig::default().with_population_size(20).with_max_generations(20))
            .with_seed(42),
    );
    c.bench_function("genetic_20_mixed_boxes", |b| {
        b.iter(|| black_box(genetic.solve(black_box(&mixed))))
    });

    let annealing = AnnealingPacker::new(
        AnnealingOptions::default()
            .with_sa(SaConfig::default().with_max_iterations(1_000))
            .with_seed(42),
    );
    c.bench_function("annealing_20_mixed_boxes", |b| {
        b.iter(|| black_box(annealing.solve(black_box(&mixed))))
    });
}

criterion_group!(benches, packer_benchmark);
criterion_main!(benches);
