//! Strategy metadata and orchestration reports attached to results.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One generation of the genetic search.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GenerationRecord {
    /// Generation number (0-based).
    pub generation: u32,
    /// Best fitness seen so far.
    pub best_fitness: f64,
    /// Mean fitness of the population.
    pub avg_fitness: f64,
    /// Efficiency of the best individual, percent.
    pub efficiency: f64,
    /// Waste of the best individual, percent.
    pub waste: f64,
}

/// Sample of the annealing schedule.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoolingRecord {
    /// Iteration count at the sample.
    pub iteration: u64,
    /// Temperature after the sampled iteration, including the cooling step
    /// when that iteration closed a temperature level.
    pub temperature: f64,
    /// Energy of the current solution.
    pub current_energy: f64,
    /// Energy of the best solution so far.
    pub best_energy: f64,
    /// Efficiency of the best solution, percent.
    pub efficiency: f64,
    /// Accepted moves over attempted moves so far.
    pub acceptance_rate: f64,
}

/// Strategy-specific metadata.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum AlgorithmData {
    /// Greedy anchor packer.
    Greedy {
        /// Stock instances visited.
        stock_instances_tried: usize,
    },
    /// Genetic search.
    Genetic {
        /// Generations run.
        generations: u32,
        /// Population size at termination.
        final_population: usize,
        /// Per-generation trace.
        convergence: Vec<GenerationRecord>,
    },
    /// Simulated annealing.
    Annealing {
        /// Iterations run.
        iterations: u64,
        /// Temperature at termination.
        final_temperature: f64,
        /// Overall acceptance rate.
        acceptance_rate: f64,
        /// Trace sampled at a fixed interval.
        cooling: Vec<CoolingRecord>,
    },
    /// Guillotine shelf engine.
    Guillotine {
        /// Cuts over all layouts.
        total_cuts: usize,
        /// Estimated machine time in seconds.
        cutting_time_s: f64,
    },
}

impl AlgorithmData {
    /// Efficiency samples of the trace, oldest first. Empty for
    /// deterministic strategies.
    pub fn efficiency_trace(&self) -> Vec<f64> {
        match self {
            AlgorithmData::Genetic { convergence, .. } => {
                convergence.iter().map(|r| r.efficiency).collect()
            }
            AlgorithmData::Annealing { cooling, .. } => {
                cooling.iter().map(|r| r.efficiency).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// One strategy of a comparison run, in execution order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StrategyRun {
    /// Strategy name.
    pub name: String,
    /// Efficiency, percent.
    pub efficiency: f64,
    /// Waste, percent.
    pub waste: f64,
    /// Wall-clock time.
    pub execution_time_ms: u64,
    /// 1-based rank by efficiency.
    pub rank: usize,
}

/// Row of the ranking table, ordered by efficiency.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RankedResult {
    /// 1-based rank.
    pub rank: usize,
    /// Strategy name.
    pub algorithm: String,
    /// Efficiency, percent.
    pub efficiency: f64,
    /// Waste, percent.
    pub waste: f64,
    /// Wall-clock time.
    pub execution_time_ms: u64,
    /// `0.7 × efficiency/100 + 0.3 × max(0, 1 − time/10 s)`.
    pub score: f64,
}

/// Aggregate statistics over successful strategies.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComparisonStats {
    /// Highest efficiency.
    pub best_efficiency: f64,
    /// Lowest efficiency.
    pub worst_efficiency: f64,
    /// Mean efficiency.
    pub average_efficiency: f64,
    /// Shortest run.
    pub fastest_time_ms: u64,
    /// Longest run.
    pub slowest_time_ms: u64,
    /// Mean run time.
    pub average_time_ms: f64,
}

/// Convergence behaviour of one stochastic strategy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConvergenceSummary {
    /// Strategy name.
    pub strategy: String,
    /// Last trace efficiency minus the first.
    pub total_improvement: f64,
    /// Fraction of samples that improved on their predecessor.
    pub convergence_speed: f64,
    /// First sample index after which every 5-sample window is stable.
    pub stability_point: usize,
    /// Trace length.
    pub samples: usize,
}

/// A strategy isolated after failing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StrategyFailureRecord {
    /// Strategy name.
    pub strategy: String,
    /// Error message or panic payload.
    pub detail: String,
    /// Time spent before failing.
    pub execution_time_ms: u64,
}

/// Multi-algorithm comparison report.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlgorithmComparison {
    /// Wall-clock time of the whole comparison.
    pub total_execution_time_ms: u64,
    /// Name of the returned strategy.
    pub best_algorithm: String,
    /// Successful strategies in execution order.
    pub results: Vec<StrategyRun>,
    /// Successful strategies by efficiency.
    pub ranking: Vec<RankedResult>,
    /// Aggregate statistics.
    pub analysis: ComparisonStats,
    /// Convergence of strategies that produce a trace.
    pub convergence: Vec<ConvergenceSummary>,
    /// Isolated failures.
    pub failures: Vec<StrategyFailureRecord>,
}

/// One stage of the hybrid pipeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HybridStage {
    /// 1-based stage number.
    pub stage: usize,
    /// Strategy name.
    pub algorithm: String,
    /// Efficiency, percent. `None` if the stage failed.
    pub efficiency: Option<f64>,
}

/// Hybrid pipeline report.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HybridAnalysis {
    /// Stages in execution order.
    pub stages: Vec<HybridStage>,
    /// Best efficiency minus the first successful stage's efficiency.
    pub improvement: f64,
    /// Name of the returned stage.
    pub best_algorithm: String,
}

/// Size class used by adaptive selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ComplexityTier {
    /// Below the low threshold.
    Small,
    /// Below the mid threshold.
    Medium,
    /// Everything else.
    Large,
}

/// Adaptive selection report.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AdaptiveAnalysis {
    /// Σ piece quantities × stock block count.
    pub complexity: usize,
    /// Resulting size class.
    pub tier: ComplexityTier,
    /// Strategies run for this tier.
    pub candidates: Vec<String>,
    /// Strategy whose result was returned.
    pub selected: String,
}
