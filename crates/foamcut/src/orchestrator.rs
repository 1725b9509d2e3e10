//! Runs, compares and combines strategies.
//!
//! Every strategy of a run gets its own solver, its own seed (`seed + i`)
//! and the shared cancellation token. A strategy that returns an error or
//! panics is isolated: it is recorded as a failure and the run continues
//! with the others. The call only fails if every strategy fails.

use crate::analysis::{assign_ranks, comparison_stats, convergence_summary, ranking};
use crate::config::{OptimizerConfig, LOW_COMPLEXITY, MID_COMPLEXITY};
use crate::mode::{Mode, StrategyKind};
use crate::strategy::build_solver;
use foamcut_core::model::{Piece, StockBlock};
use foamcut_core::problem::Problem;
use foamcut_core::report::{
    AdaptiveAnalysis, AlgorithmComparison, ComplexityTier, HybridAnalysis, HybridStage,
    StrategyFailureRecord, StrategyRun,
};
use foamcut_core::result::{OptimizationResult, Warning};
use foamcut_core::solver::{CancellationToken, ProgressCallback, ProgressInfo, Solver};
use foamcut_core::{Error, Result};
use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Strategies of the hybrid pipeline, in stage order.
pub const HYBRID_STAGES: [StrategyKind; 3] = [
    StrategyKind::Greedy,
    StrategyKind::Genetic,
    StrategyKind::Annealing,
];

/// Size class of a problem for adaptive selection.
pub fn complexity_tier(complexity: usize) -> ComplexityTier {
    if complexity < LOW_COMPLEXITY {
        ComplexityTier::Small
    } else if complexity < MID_COMPLEXITY {
        ComplexityTier::Medium
    } else {
        ComplexityTier::Large
    }
}

/// Strategies adaptive mode runs for a tier.
pub fn adaptive_candidates(tier: ComplexityTier) -> Vec<StrategyKind> {
    match tier {
        ComplexityTier::Small => vec![StrategyKind::Greedy, StrategyKind::Annealing],
        ComplexityTier::Medium | ComplexityTier::Large => {
            vec![StrategyKind::Genetic, StrategyKind::Annealing]
        }
    }
}

/// Outcome of one isolated strategy.
struct Outcome {
    name: String,
    elapsed_ms: u64,
    result: std::result::Result<OptimizationResult, String>,
}

impl Outcome {
    fn efficiency(&self) -> Option<f64> {
        self.result.as_ref().ok().map(|r| r.efficiency)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

fn run_isolated(
    solver: &dyn Solver,
    problem: &Problem,
    progress: Option<ProgressCallback>,
) -> Outcome {
    let start = Instant::now();
    let run = || match progress {
        Some(callback) => solver.solve_with_progress(problem, callback),
        None => solver.solve(problem),
    };
    let result = match panic::catch_unwind(AssertUnwindSafe(run)) {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(panic_message(payload)),
    };
    Outcome {
        name: solver.name().to_string(),
        elapsed_ms: start.elapsed().as_millis() as u64,
        result,
    }
}

/// Index of the first outcome with the highest efficiency.
fn best_index(outcomes: &[Outcome]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, o) in outcomes.iter().enumerate() {
        if let Some(eff) = o.efficiency() {
            if best.map_or(true, |(_, b)| eff > b) {
                best = Some((i, eff));
            }
        }
    }
    best.map(|(i, _)| i)
}

fn failures(outcomes: &[Outcome]) -> Vec<StrategyFailureRecord> {
    outcomes
        .iter()
        .filter_map(|o| {
            o.result.as_ref().err().map(|detail| StrategyFailureRecord {
                strategy: o.name.clone(),
                detail: detail.clone(),
                execution_time_ms: o.elapsed_ms,
            })
        })
        .collect()
}

fn all_failed(outcomes: &[Outcome]) -> Error {
    let detail = outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().err().map(|e| format!("{}: {}", o.name, e)))
        .collect::<Vec<_>>()
        .join("; ");
    Error::AllStrategiesFailed(detail)
}

/// Removes the best outcome's result and attaches failure warnings.
fn take_best(outcomes: &mut [Outcome]) -> Result<(String, OptimizationResult)> {
    let index = best_index(outcomes).ok_or_else(|| all_failed(outcomes))?;
    let failed = failures(outcomes);
    let outcome = &mut outcomes[index];
    let mut result =
        std::mem::replace(&mut outcome.result, Err(String::new())).map_err(Error::Internal)?;
    for f in failed {
        result.push_warning(Warning::StrategyFailed {
            strategy: f.strategy,
            detail: f.detail,
        });
    }
    Ok((outcome.name.clone(), result))
}

/// Strategy orchestrator.
///
/// # Example
///
/// ```rust,ignore
/// use foamcut::{Mode, Optimizer, OptimizerConfig, Piece, StockBlock};
///
/// let optimizer = Optimizer::new(OptimizerConfig::new().with_mode(Mode::Multi).with_seed(7));
/// let result = optimizer.optimize(
///     vec![Piece::new("seat", 50.0, 50.0, 10.0).with_quantity(4)],
///     vec![StockBlock::new("block", 100.0, 100.0, 50.0)],
/// )?;
/// println!("{} at {:.1}%", result.strategy, result.efficiency);
/// ```
pub struct Optimizer {
    config: OptimizerConfig,
    progress: Option<ProgressCallback>,
    cancelled: CancellationToken,
}

impl Optimizer {
    /// Creates an optimizer.
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            progress: None,
            cancelled: CancellationToken::new(),
        }
    }

    /// Sets the progress callback.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Shares an existing cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancelled = token;
        self
    }

    /// Returns a handle to cancel running strategies.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancelled.clone()
    }

    /// The configuration.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Validates the input and runs the configured mode.
    pub fn optimize(&self, pieces: Vec<Piece>, stock: Vec<StockBlock>) -> Result<OptimizationResult> {
        let problem = Problem::new(pieces, stock)?;
        self.optimize_problem(&problem)
    }

    /// Runs the configured mode on an expanded problem.
    pub fn optimize_problem(&self, problem: &Problem) -> Result<OptimizationResult> {
        self.config.validate()?;
        log::info!(
            "Optimizing {} piece instances over {} stock instances (mode: {})",
            problem.total_pieces(),
            problem.stock_instances().len(),
            self.config.mode
        );

        let result = match self.config.mode {
            Mode::Multi => self.run_multi(problem, &self.config.algorithms),
            Mode::Hybrid => self.run_hybrid(problem),
            Mode::Adaptive => self.run_adaptive(problem),
            single => match single.single_strategy() {
                Some(kind) => self.run_single(problem, kind),
                None => Err(Error::UnknownStrategy(single.to_string())),
            },
        }?;

        for w in &result.warnings {
            if let Warning::Unplaced {
                piece_id,
                count,
                reason,
            } = w
            {
                log::warn!("{} instance(s) of '{}' unplaced ({:?})", count, piece_id, reason);
            }
        }
        log::info!(
            "Selected {}: efficiency={:.2}%, layouts={}, time={}ms",
            result.strategy,
            result.efficiency,
            result.layouts.len(),
            result.computation_time_ms
        );
        Ok(result)
    }

    /// Token shared by the strategies of one call, carrying the time limit.
    fn run_token(&self) -> CancellationToken {
        match self.config.time_limit() {
            Some(limit) => self.cancelled.clone().with_timeout(limit),
            None => self.cancelled.clone(),
        }
    }

    fn emit(&self, algorithm: &str, percent: f64, stage: String) {
        if let Some(callback) = &self.progress {
            callback(
                ProgressInfo::new(algorithm)
                    .with_progress(percent)
                    .with_stage(stage),
            );
        }
    }

    fn emit_finished(&self, outcome: &Outcome, done: usize, total: usize) {
        let percent = done as f64 / total as f64 * 100.0;
        let stage = match &outcome.result {
            Ok(r) => format!("{} finished ({:.1}% efficiency)", outcome.name, r.efficiency),
            Err(e) => format!("{} failed: {}", outcome.name, e),
        };
        self.emit(&outcome.name, percent, stage);
    }

    /// Relays a strategy's own events, mapping its 0..=100 onto the run's
    /// `[done, done + 1) / total` band.
    fn inner_progress(&self, done: usize, total: usize) -> Option<ProgressCallback> {
        let outer = self.progress.clone()?;
        let total = total.max(1) as f64;
        let done = done as f64;
        let relay: ProgressCallback = Arc::new(move |info: ProgressInfo| {
            let fraction = info.progress_percent.clamp(0.0, 100.0) / 100.0;
            outer(ProgressInfo {
                progress_percent: (done + fraction) / total * 100.0,
                ..info
            })
        });
        Some(relay)
    }

    /// Runs solvers in order (or on worker threads when `parallel` is set),
    /// isolating failures. Progress is emitted at strategy boundaries and
    /// relayed from inside each strategy. Parallel runs relay the
    /// strategies' own percentages unscaled, interleaved.
    fn execute(&self, problem: &Problem, solvers: &[Box<dyn Solver>]) -> Vec<Outcome> {
        let total = solvers.len();
        if self.config.parallel && total > 1 {
            for s in solvers {
                self.emit(s.name(), 0.0, format!("running {}", s.name()));
            }
            let progress = self.progress.clone();
            let outcomes: Vec<Outcome> = solvers
                .par_iter()
                .map(|s| {
                    let own = problem.clone();
                    run_isolated(s.as_ref(), &own, progress.clone())
                })
                .collect();
            for (i, o) in outcomes.iter().enumerate() {
                self.log_outcome(o);
                self.emit_finished(o, i + 1, total);
            }
            return outcomes;
        }

        let mut outcomes = Vec::with_capacity(total);
        for (i, s) in solvers.iter().enumerate() {
            self.emit(
                s.name(),
                i as f64 / total as f64 * 100.0,
                format!("running {}", s.name()),
            );
            let outcome = run_isolated(s.as_ref(), problem, self.inner_progress(i, total));
            self.log_outcome(&outcome);
            self.emit_finished(&outcome, i + 1, total);
            outcomes.push(outcome);
        }
        outcomes
    }

    fn log_outcome(&self, outcome: &Outcome) {
        match &outcome.result {
            Ok(r) => log::info!(
                "{} finished in {}ms: efficiency={:.2}%",
                outcome.name,
                outcome.elapsed_ms,
                r.efficiency
            ),
            Err(e) => log::warn!("{} failed after {}ms: {}", outcome.name, outcome.elapsed_ms, e),
        }
    }

    fn solvers(&self, kinds: &[StrategyKind], token: &CancellationToken) -> Vec<Box<dyn Solver>> {
        kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| build_solver(*kind, &self.config, i, token))
            .collect()
    }

    /// Runs a single strategy.
    pub fn run_single(&self, problem: &Problem, kind: StrategyKind) -> Result<OptimizationResult> {
        let token = self.run_token();
        let solvers = self.solvers(&[kind], &token);
        let mut outcomes = self.execute(problem, &solvers);
        match outcomes.pop().map(|o| (o.name, o.result)) {
            Some((_, Ok(result))) => Ok(result),
            Some((strategy, Err(detail))) => Err(Error::StrategyFailure { strategy, detail }),
            None => Err(Error::Internal("no strategy ran".into())),
        }
    }

    /// Runs `kinds` and returns the most efficient result with an
    /// [`AlgorithmComparison`] attached.
    pub fn run_multi(&self, problem: &Problem, kinds: &[StrategyKind]) -> Result<OptimizationResult> {
        if kinds.is_empty() {
            return Err(Error::ConfigError("no algorithms requested".into()));
        }
        let token = self.run_token();
        self.run_solvers(problem, self.solvers(kinds, &token))
    }

    /// Multi-algorithm comparison over caller-built solvers.
    pub fn run_solvers(
        &self,
        problem: &Problem,
        solvers: Vec<Box<dyn Solver>>,
    ) -> Result<OptimizationResult> {
        let start = Instant::now();
        let mut outcomes = self.execute(problem, &solvers);

        let mut runs: Vec<StrategyRun> = outcomes
            .iter()
            .filter_map(|o| {
                o.result.as_ref().ok().map(|r| StrategyRun {
                    name: o.name.clone(),
                    efficiency: r.efficiency,
                    waste: r.total_waste,
                    execution_time_ms: o.elapsed_ms,
                    rank: 0,
                })
            })
            .collect();
        assign_ranks(&mut runs);

        let convergence = outcomes
            .iter()
            .filter_map(|o| {
                let data = o.result.as_ref().ok()?.algorithm_data.as_ref()?;
                let trace = data.efficiency_trace();
                (!trace.is_empty()).then(|| convergence_summary(&o.name, &trace))
            })
            .collect();
        let failed = failures(&outcomes);

        let (best_algorithm, mut result) = take_best(&mut outcomes)?;
        let total_execution_time_ms = start.elapsed().as_millis() as u64;
        result.algorithm_comparison = Some(AlgorithmComparison {
            total_execution_time_ms,
            best_algorithm,
            ranking: ranking(&runs),
            analysis: comparison_stats(&runs),
            results: runs,
            convergence,
            failures: failed,
        });
        result.computation_time_ms = total_execution_time_ms;
        Ok(result)
    }

    /// Runs greedy, genetic and annealing as independent stages and returns
    /// the best one with a [`HybridAnalysis`] attached.
    pub fn run_hybrid(&self, problem: &Problem) -> Result<OptimizationResult> {
        let start = Instant::now();
        let token = self.run_token();
        let solvers = self.solvers(&HYBRID_STAGES, &token);
        let mut outcomes = self.execute(problem, &solvers);

        let stages: Vec<HybridStage> = outcomes
            .iter()
            .enumerate()
            .map(|(i, o)| HybridStage {
                stage: i + 1,
                algorithm: o.name.clone(),
                efficiency: o.efficiency(),
            })
            .collect();
        let baseline = stages.iter().find_map(|s| s.efficiency);

        let (best_algorithm, mut result) = take_best(&mut outcomes)?;
        result.hybrid_analysis = Some(HybridAnalysis {
            improvement: baseline.map_or(0.0, |b| result.efficiency - b),
            stages,
            best_algorithm,
        });
        result.computation_time_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    /// Picks strategies from the problem complexity and returns the better
    /// result with an [`AdaptiveAnalysis`] attached.
    pub fn run_adaptive(&self, problem: &Problem) -> Result<OptimizationResult> {
        let complexity = problem.complexity();
        let tier = complexity_tier(complexity);
        let candidates = adaptive_candidates(tier);
        log::info!(
            "Adaptive selection: complexity={} ({:?}), running {:?}",
            complexity,
            tier,
            candidates
        );

        let mut result = match tier {
            ComplexityTier::Large => self.run_multi(problem, &candidates)?,
            ComplexityTier::Small | ComplexityTier::Medium => {
                let start = Instant::now();
                let token = self.run_token();
                let solvers = self.solvers(&candidates, &token);
                let mut outcomes = self.execute(problem, &solvers);
                let (_, mut result) = take_best(&mut outcomes)?;
                result.computation_time_ms = start.elapsed().as_millis() as u64;
                result
            }
        };

        result.adaptive_analysis = Some(AdaptiveAnalysis {
            complexity,
            tier,
            candidates: candidates.iter().map(|k| k.name().to_string()).collect(),
            selected: result.strategy.clone(),
        });
        Ok(result)
    }
}

/// Runs `config.mode` on the given pieces and stock.
pub fn optimize(
    pieces: Vec<Piece>,
    stock: Vec<StockBlock>,
    config: OptimizerConfig,
) -> Result<OptimizationResult> {
    Optimizer::new(config).optimize(pieces, stock)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_tiers() {
        assert_eq!(complexity_tier(0), ComplexityTier::Small);
        assert_eq!(complexity_tier(49), ComplexityTier::Small);
        assert_eq!(complexity_tier(50), ComplexityTier::Medium);
        assert_eq!(complexity_tier(199), ComplexityTier::Medium);
        assert_eq!(complexity_tier(200), ComplexityTier::Large);
        assert_eq!(
            adaptive_candidates(ComplexityTier::Small),
            vec![StrategyKind::Greedy, StrategyKind::Annealing]
        );
    }

    #[test]
    fn test_panic_message() {
        let payload = panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(payload), "panicked: boom");
    }
}
