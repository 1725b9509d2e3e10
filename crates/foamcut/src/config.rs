//! Optimizer configuration.

use crate::mode::{Mode, StrategyKind};
use foamcut_core::ga::GaConfig;
use foamcut_core::sa::SaConfig;
use foamcut_core::{Error, Result};
use foamcut_cutting::GuillotineConfig;
use foamcut_packing::{AnnealingOptions, FeasibilityMode, GeneticOptions};
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Complexity below which adaptive mode runs greedy and annealing.
pub const LOW_COMPLEXITY: usize = 50;

/// Complexity below which adaptive mode runs genetic and annealing.
pub const MID_COMPLEXITY: usize = 200;

/// Configuration of an [`Optimizer`](crate::Optimizer) call.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OptimizerConfig {
    /// What to run.
    pub mode: Mode,
    /// Strategies of a multi-algorithm run, in execution order.
    pub algorithms: Vec<StrategyKind>,
    /// Genetic search parameters.
    pub ga: GaConfig,
    /// Annealing schedule parameters.
    pub sa: SaConfig,
    /// Guillotine engine parameters.
    pub guillotine: GuillotineConfig,
    /// Genetic mutation jitter, fraction of the stock dimension.
    pub ga_position_step: f64,
    /// Annealing jitter, fraction of the stock dimension.
    pub sa_position_step: f64,
    /// Handling of infeasible stochastic results.
    pub feasibility: FeasibilityMode,
    /// Base seed; strategy `i` of a run uses `seed + i`.
    pub seed: Option<u64>,
    /// Run the strategies of a multi/hybrid run on worker threads.
    pub parallel: bool,
    /// Wall-clock budget for the whole call, in milliseconds.
    pub time_limit_ms: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            algorithms: vec![
                StrategyKind::Greedy,
                StrategyKind::Genetic,
                StrategyKind::Annealing,
            ],
            ga: GaConfig::default(),
            sa: SaConfig::default(),
            guillotine: GuillotineConfig::default(),
            ga_position_step: 0.1,
            sa_position_step: 0.15,
            feasibility: FeasibilityMode::default(),
            seed: None,
            parallel: false,
            time_limit_ms: None,
        }
    }
}

impl OptimizerConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the mode.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the strategies of a multi-algorithm run.
    pub fn with_algorithms(mut self, algorithms: Vec<StrategyKind>) -> Self {
        self.algorithms = algorithms;
        self
    }

    /// Sets the genetic parameters.
    pub fn with_ga(mut self, ga: GaConfig) -> Self {
        self.ga = ga;
        self
    }

    /// Sets the annealing parameters.
    pub fn with_sa(mut self, sa: SaConfig) -> Self {
        self.sa = sa;
        self
    }

    /// Sets the guillotine parameters.
    pub fn with_guillotine(mut self, guillotine: GuillotineConfig) -> Self {
        self.guillotine = guillotine;
        self
    }

    /// Sets the feasibility mode.
    pub fn with_feasibility(mut self, feasibility: FeasibilityMode) -> Self {
        self.feasibility = feasibility;
        self
    }

    /// Sets the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enables or disables parallel dispatch.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the wall-clock budget.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms.max(1));
        self
    }

    /// The wall-clock budget as a duration.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    /// Seed of the strategy at `offset` in a run.
    pub fn seed_for(&self, offset: usize) -> Option<u64> {
        self.seed.map(|s| s.wrapping_add(offset as u64))
    }

    /// Genetic options for the strategy at `offset`.
    pub fn genetic_options(&self, offset: usize) -> GeneticOptions {
        GeneticOptions {
            ga: self.ga.clone(),
            position_step: self.ga_position_step,
            feasibility: self.feasibility,
            seed: self.seed_for(offset),
        }
    }

    /// Annealing options for the strategy at `offset`.
    pub fn annealing_options(&self, offset: usize) -> AnnealingOptions {
        AnnealingOptions {
            sa: self.sa.clone(),
            position_step: self.sa_position_step,
            feasibility: self.feasibility,
            seed: self.seed_for(offset),
        }
    }

    /// Checks values that builders cannot clamp (deserialized configs).
    pub fn validate(&self) -> Result<()> {
        if self.mode == Mode::Multi && self.algorithms.is_empty() {
            return Err(Error::ConfigError(
                "multi mode needs at least one algorithm".into(),
            ));
        }
        for (name, step) in [
            ("ga_position_step", self.ga_position_step),
            ("sa_position_step", self.sa_position_step),
        ] {
            if !(0.0..=1.0).contains(&step) {
                return Err(Error::ConfigError(format!(
                    "{} must be in [0, 1], got {}",
                    name, step
                )));
            }
        }
        if self.ga.population_size < 2 {
            return Err(Error::ConfigError("population_size must be at least 2".into()));
        }
        if !(self.sa.cooling_rate > 0.0 && self.sa.cooling_rate < 1.0) {
            return Err(Error::ConfigError(format!(
                "cooling_rate must be in (0, 1), got {}",
                self.sa.cooling_rate
            )));
        }
        if self.sa.initial_temp <= self.sa.final_temp {
            return Err(Error::ConfigError(
                "initial_temp must exceed final_temp".into(),
            ));
        }
        if self.guillotine.seconds_per_cut < 0.0 {
            return Err(Error::ConfigError("seconds_per_cut must be non-negative".into()));
        }
        Ok(())
    }
}
