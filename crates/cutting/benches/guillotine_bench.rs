//! Benchmarks for the guillotine engine.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use foamcut_core::model::{Piece, StockBlock};
use foamcut_core::{Problem, Solver};
use foamcut_cutting::{GuillotineConfig, GuillotineEngine};

fn guillotine_benchmark(c: &mut Criterion) {
    let problem = Problem::new(
        vec![
            Piece::new("A", 30.0, 20.0, 10.0).with_quantity(20),
            Piece::new("B", 25.0, 25.0, 25.0).with_quantity(12),
            Piece::new("C", 50.0, 10.0, 10.0).with_quantity(12),
        ],
        vec![StockBlock::new("S", 100.0, 100.0, 50.0).with_quantity(6)],
    )
    .expect("valid problem");

    let engine = GuillotineEngine::default();
    c.bench_function("guillotine_44_mixed_boxes", |b| {
        b.iter(|| black_box(engine.solve(black_box(&problem))))
    });

    let fixed = GuillotineEngine::new(GuillotineConfig::default().with_rotation(false));
    c.bench_function("guillotine_44_mixed_boxes_no_rotation", |b| {
        b.iter(|| black_box(fixed.solve(black_box(&problem))))
    });
}

criterion_group!(benches, guillotine_benchmark);
criterion_main!(benches);
