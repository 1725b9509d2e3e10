//! Guillotine cutting strategy.

use crate::config::GuillotineConfig;
use crate::instructions::{estimate_time, generate_instructions};
use crate::shelf::{by_footprint_desc, fill_block, fits_upright};
use foamcut_core::problem::{PieceInstance, Problem};
use foamcut_core::report::AlgorithmData;
use foamcut_core::result::OptimizationResult;
use foamcut_core::solver::{CancellationToken, Solver};
use foamcut_core::Result;
use std::time::Instant;

/// Shelf packer whose layouts can be cut with straight through-cuts only.
#[derive(Debug, Clone, Default)]
pub struct GuillotineEngine {
    config: GuillotineConfig,
    cancelled: CancellationToken,
}

impl GuillotineEngine {
    /// Creates an engine with the given configuration.
    pub fn new(config: GuillotineConfig) -> Self {
        Self {
            config,
            cancelled: CancellationToken::new(),
        }
    }

    /// Shares an existing cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancelled = token;
        self
    }

    /// The engine configuration.
    pub fn config(&self) -> &GuillotineConfig {
        &self.config
    }
}

impl Solver for GuillotineEngine {
    fn name(&self) -> &'static str {
        "guillotine"
    }

    fn solve(&self, problem: &Problem) -> Result<OptimizationResult> {
        let start = Instant::now();
        let config = &self.config;
        let fits_some_block = |inst: &PieceInstance| {
            problem
                .stock()
                .iter()
                .any(|block| fits_upright(inst, &block.dims(), config))
        };
        let instances = problem.piece_instances();
        let order: Vec<usize> = by_footprint_desc(problem)
            .into_iter()
            .filter(|&i| fits_some_block(&instances[i]))
            .collect();
        let mut placed = vec![false; instances.len()];
        let mut layouts = Vec::new();
        let mut cancelled = false;

        for stock in problem.stock_instances() {
            if order.iter().all(|&i| placed[i]) {
                break;
            }
            if self.cancelled.is_cancelled() {
                cancelled = true;
                break;
            }
            let layout = fill_block(problem, stock, &order, &mut placed, config);
            if !layout.is_empty() {
                log::debug!(
                    "Guillotine block {}#{}: placed={}, utilization={:.2}%",
                    layout.stock_id,
                    layout.stock_ordinal,
                    layout.placements.len(),
                    layout.utilization
                );
                layouts.push(layout);
            }
        }

        let instructions = generate_instructions(&layouts, &self.config);
        let total_cuts = instructions.summary.total_cuts;

        let mut result =
            OptimizationResult::from_layouts_with(problem, layouts, self.name(), fits_some_block);
        result.cutting_instructions = Some(instructions);
        let result = result
            .with_algorithm_data(AlgorithmData::Guillotine {
                total_cuts,
                cutting_time_s: estimate_time(total_cuts, config),
            })
            .with_cancelled(cancelled)
            .with_computation_time(start.elapsed().as_millis() as u64);

        log::info!(
            "Guillotine packing: {} blocks, {} cuts, efficiency={:.2}%",
            result.layouts.len(),
            total_cuts,
            result.efficiency
        );
        Ok(result)
    }

    fn cancel(&self) {
        self.cancelled.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foamcut_core::model::{Piece, StockBlock};

    #[test]
    fn test_algorithm_data_matches_instructions() {
        let problem = Problem::new(
            vec![Piece::new("P", 30.0, 30.0, 10.0).with_quantity(5)],
            vec![StockBlock::new("S", 100.0, 100.0, 10.0).with_quantity(2)],
        )
        .unwrap();
        let result = GuillotineEngine::default().solve(&problem).unwrap();
        let instructions = result.cutting_instructions.as_ref().unwrap();

        match result.algorithm_data {
            Some(AlgorithmData::Guillotine {
                total_cuts,
                cutting_time_s,
            }) => {
                assert_eq!(total_cuts, instructions.summary.total_cuts);
                assert_eq!(cutting_time_s, total_cuts as f64 * 15.0);
            }
            ref other => panic!("unexpected data: {:?}", other),
        }
        assert_eq!(instructions.summary.total_blocks, result.layouts.len());
    }
}
