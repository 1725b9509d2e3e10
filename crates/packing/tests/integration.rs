//! Integration tests for the packing strategies.

use approx::assert_relative_eq;
use foamcut_core::ga::GaConfig;
use foamcut_core::model::{Piece, StockBlock};
use foamcut_core::result::{UnplacedReason, Warning};
use foamcut_core::sa::SaConfig;
use foamcut_core::{OptimizationResult, Problem, Solver};
use foamcut_packing::{
    AnnealingOptions, AnnealingPacker, FeasibilityMode, GeneticOptions, GeneticPacker,
    GreedyPacker,
};
use rand::prelude::*;

fn problem(pieces: Vec<Piece>, stock: Vec<StockBlock>) -> Problem {
    Problem::new(pieces, stock).unwrap()
}

fn scenario_a() -> Problem {
    problem(
        vec![Piece::new("cube", 100.0, 100.0, 100.0)],
        vec![StockBlock::new("S", 100.0, 100.0, 100.0)],
    )
}

fn genetic(seed: u64) -> GeneticPacker {
    GeneticPacker::new(
        GeneticOptions::default()
            .with_ga(GaConfig::default().with_population_size(16).with_max_generations(15))
            .with_seed(seed),
    )
}

fn annealing(seed: u64) -> AnnealingPacker {
    AnnealingPacker::new(
        AnnealingOptions::default()
            .with_sa(SaConfig::default().with_max_iterations(300))
            .with_seed(seed),
    )
}

fn strategies(seed: u64) -> Vec<Box<dyn Solver>> {
    vec![
        Box::new(GreedyPacker::new()),
        Box::new(genetic(seed)),
        Box::new(annealing(seed)),
    ]
}

fn random_problem<R: Rng>(rng: &mut R) -> Problem {
    let pieces = (0..rng.gen_range(1..4))
        .map(|i| {
            Piece::new(
                format!("P{}", i),
                rng.gen_range(5..60) as f64,
                rng.gen_range(5..60) as f64,
                rng.gen_range(5..60) as f64,
            )
            .with_quantity(rng.gen_range(1..4))
        })
        .collect();
    let stock = (0..rng.gen_range(1..3))
        .map(|i| {
            StockBlock::new(
                format!("S{}", i),
                rng.gen_range(40..120) as f64,
                rng.gen_range(40..120) as f64,
                rng.gen_range(40..120) as f64,
            )
            .with_quantity(rng.gen_range(1..3))
        })
        .collect();
    problem(pieces, stock)
}

fn recomputed_efficiency(result: &OptimizationResult) -> f64 {
    let used: f64 = result.layouts.iter().map(|l| l.used_volume()).sum();
    let stock: f64 = result.layouts.iter().map(|l| l.stock_volume()).sum();
    if stock > 0.0 {
        used / stock * 100.0
    } else {
        0.0
    }
}

mod scenario_tests {
    use super::*;

    #[test]
    fn test_scenario_a_all_strategies() {
        let problem = scenario_a();
        for solver in strategies(1) {
            let result = solver.solve(&problem).unwrap();
            assert_eq!(result.layouts.len(), 1, "{}", solver.name());
            assert_relative_eq!(result.layouts[0].utilization, 100.0);
            assert_relative_eq!(result.efficiency, 100.0);
            assert_relative_eq!(result.total_waste, 0.0);
        }
    }

    #[test]
    fn test_scenario_b_unplaceable() {
        let problem = problem(
            vec![Piece::new("long", 150.0, 100.0, 100.0)],
            vec![StockBlock::new("S", 100.0, 100.0, 100.0)],
        );
        for solver in strategies(2) {
            let result = solver.solve(&problem).unwrap();
            assert!(result.layouts.is_empty(), "{}", solver.name());
            assert_eq!(
                result.warnings,
                vec![Warning::Unplaced {
                    piece_id: "long".into(),
                    count: 1,
                    reason: UnplacedReason::DoesNotFit,
                }]
            );
        }
    }

    #[test]
    fn test_scenario_c_grid() {
        let problem = problem(
            vec![Piece::new("P", 50.0, 50.0, 100.0).with_quantity(4)],
            vec![StockBlock::new("S", 100.0, 100.0, 100.0)],
        );
        let result = GreedyPacker::new().solve(&problem).unwrap();
        assert_eq!(result.layouts.len(), 1);
        assert_eq!(result.placed_count(), 4);
        assert_relative_eq!(result.layouts[0].utilization, 100.0);
    }

    #[test]
    fn test_scenario_e_heuristics_match_baseline() {
        let problem = scenario_a();
        let baseline = GreedyPacker::new().solve(&problem).unwrap().efficiency;
        for seed in 0..5 {
            let ga = genetic(seed).solve(&problem).unwrap();
            let sa = annealing(seed).solve(&problem).unwrap();
            assert!(ga.efficiency >= baseline - 1e-9);
            assert!(sa.efficiency >= baseline - 1e-9);
        }
    }

    #[test]
    fn test_priced_stock_reports_cost() {
        let problem = problem(
            vec![Piece::new("P", 60.0, 60.0, 60.0).with_quantity(2)],
            vec![StockBlock::new("S", 100.0, 100.0, 100.0)
                .with_quantity(3)
                .with_price(12.5)],
        );
        let result = GreedyPacker::new().solve(&problem).unwrap();
        assert_eq!(result.layouts.len(), 2);
        assert_eq!(result.total_cost, Some(25.0));
    }
}

mod property_tests {
    use super::*;

    #[test]
    fn test_results_satisfy_layout_invariants() {
        let mut rng = StdRng::seed_from_u64(2024);
        for case in 0..12 {
            let problem = random_problem(&mut rng);
            for solver in strategies(case) {
                let result = solver.solve(&problem).unwrap();
                result
                    .verify()
                    .unwrap_or_else(|e| panic!("{} case {}: {}", solver.name(), case, e));

                let expected = recomputed_efficiency(&result);
                assert!(
                    (result.efficiency - expected).abs() <= 1e-6 * expected.max(1.0),
                    "{}: {} vs {}",
                    solver.name(),
                    result.efficiency,
                    expected
                );
                assert_eq!(
                    result.placed_count() + result.unplaced_count(),
                    problem.total_pieces()
                );
            }
        }
    }

    #[test]
    fn test_greedy_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..10 {
            let problem = random_problem(&mut rng);
            let a = GreedyPacker::new().solve(&problem).unwrap();
            let b = GreedyPacker::new().solve(&problem).unwrap();
            assert_eq!(a.layouts, b.layouts);
            assert_eq!(a.warnings, b.warnings);
        }
    }

    #[test]
    fn test_seeded_heuristics_are_deterministic() {
        let mut rng = StdRng::seed_from_u64(5);
        let problem = random_problem(&mut rng);
        for seed in [1u64, 17] {
            let a = genetic(seed).solve(&problem).unwrap();
            let b = genetic(seed).solve(&problem).unwrap();
            assert_eq!(a.layouts, b.layouts);
            assert_eq!(a.algorithm_data, b.algorithm_data);

            let a = annealing(seed).solve(&problem).unwrap();
            let b = annealing(seed).solve(&problem).unwrap();
            assert_eq!(a.layouts, b.layouts);
            assert_eq!(a.algorithm_data, b.algorithm_data);
        }
    }

    #[test]
    fn test_more_stock_never_places_fewer() {
        let mut rng = StdRng::seed_from_u64(314);
        for _ in 0..15 {
            let base = random_problem(&mut rng);
            let mut stock = base.stock().to_vec();
            let extra = StockBlock::new("extra", 80.0, 80.0, 80.0).with_quantity(2);
            stock.push(extra);
            let richer = problem(base.pieces().to_vec(), stock);

            let before = GreedyPacker::new().solve(&base).unwrap().placed_count();
            let after = GreedyPacker::new().solve(&richer).unwrap().placed_count();
            assert!(after >= before, "{} < {}", after, before);
        }
    }
}

mod feasibility_tests {
    use super::*;

    #[test]
    fn test_soft_mode_flags_infeasible_best() {
        // Two full-size cubes and one stock instance: every encoding overlaps.
        let problem = problem(
            vec![Piece::new("cube", 100.0, 100.0, 100.0).with_quantity(2)],
            vec![StockBlock::new("S", 100.0, 100.0, 100.0)],
        );
        let packer = AnnealingPacker::new(
            AnnealingOptions::default()
                .with_sa(SaConfig::default().with_max_iterations(50))
                .with_feasibility(FeasibilityMode::Soft)
                .with_seed(8),
        );
        let result = packer.solve(&problem).unwrap();
        assert!(!result.feasible);
        assert!(result.efficiency <= 100.0);
        assert!(result
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::InfeasibleBest { repaired: false, .. })));
    }

    #[test]
    fn test_repair_mode_reports_out_of_stock() {
        let problem = problem(
            vec![Piece::new("cube", 100.0, 100.0, 100.0).with_quantity(2)],
            vec![StockBlock::new("S", 100.0, 100.0, 100.0)],
        );
        let result = genetic(4).solve(&problem).unwrap();
        assert!(result.feasible);
        assert!(result.verify().is_ok());
        assert_eq!(result.placed_count(), 1);
        assert_eq!(
            result.warnings[0],
            Warning::Unplaced {
                piece_id: "cube".into(),
                count: 1,
                reason: UnplacedReason::OutOfStock,
            }
        );
    }
}
