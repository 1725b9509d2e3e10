//! Strategy construction.

use crate::config::OptimizerConfig;
use crate::mode::StrategyKind;
use foamcut_core::solver::{CancellationToken, Solver};
use foamcut_cutting::GuillotineEngine;
use foamcut_packing::{AnnealingPacker, GeneticPacker, GreedyPacker};

/// Builds the solver for `kind`, seeded with the run's seed at `offset` and
/// sharing `token` for cancellation.
pub fn build_solver(
    kind: StrategyKind,
    config: &OptimizerConfig,
    offset: usize,
    token: &CancellationToken,
) -> Box<dyn Solver> {
    match kind {
        StrategyKind::Greedy => Box::new(GreedyPacker::new().with_cancellation(token.clone())),
        StrategyKind::Genetic => Box::new(
            GeneticPacker::new(config.genetic_options(offset)).with_cancellation(token.clone()),
        ),
        StrategyKind::Annealing => Box::new(
            AnnealingPacker::new(config.annealing_options(offset))
                .with_cancellation(token.clone()),
        ),
        StrategyKind::Guillotine => Box::new(
            GuillotineEngine::new(config.guillotine.clone()).with_cancellation(token.clone()),
        ),
    }
}
