//! Simulated Annealing framework for optimization.
//!
//! Energy is minimized. Neighbor moves are drawn from weighted
//! [`NeighborhoodOperator`]s and accepted by the Metropolis criterion.

use crate::solver::CancellationToken;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cooling schedule types for Simulated Annealing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CoolingSchedule {
    /// Geometric cooling: T_new = T * alpha.
    #[default]
    Geometric,
    /// Linear cooling: T_new = T - delta, reaching the floor at the iteration cap.
    Linear,
    /// Lundy-Mees: T_new = T / (1 + beta * T).
    LundyMees,
}

/// Configuration for Simulated Annealing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SaConfig {
    /// Initial temperature.
    pub initial_temp: f64,
    /// Temperature floor; the search stops below it.
    pub final_temp: f64,
    /// Cooling rate (alpha for Geometric, beta for LundyMees).
    pub cooling_rate: f64,
    /// Number of iterations at each temperature level.
    pub iterations_per_temp: usize,
    /// Maximum total iterations (None = temperature-based stopping only).
    pub max_iterations: Option<u64>,
    /// Cooling schedule type.
    pub cooling_schedule: CoolingSchedule,
    /// Maximum time limit (None = unlimited).
    pub time_limit: Option<Duration>,
    /// Iterations between trace samples (0 = no trace).
    pub trace_interval: u64,
}

impl Default for SaConfig {
    fn default() -> Self {
        Self {
            initial_temp: 1000.0,
            final_temp: 1.0,
            cooling_rate: 0.99,
            iterations_per_temp: 1,
            max_iterations: Some(10_000),
            cooling_schedule: CoolingSchedule::Geometric,
            time_limit: None,
            trace_interval: 100,
        }
    }
}

impl SaConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial temperature.
    pub fn with_initial_temp(mut self, temp: f64) -> Self {
        self.initial_temp = temp.max(0.001);
        self
    }

    /// Sets the final temperature.
    pub fn with_final_temp(mut self, temp: f64) -> Self {
        self.final_temp = temp.max(0.0001);
        self
    }

    /// Sets the cooling rate.
    pub fn with_cooling_rate(mut self, rate: f64) -> Self {
        self.cooling_rate = rate.clamp(0.001, 0.9999);
        self
    }

    /// Sets the iterations per temperature level.
    pub fn with_iterations_per_temp(mut self, iterations: usize) -> Self {
        self.iterations_per_temp = iterations.max(1);
        self
    }

    /// Sets the maximum iterations.
    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    /// Sets the cooling schedule.
    pub fn with_cooling_schedule(mut self, schedule: CoolingSchedule) -> Self {
        self.cooling_schedule = schedule;
        self
    }

    /// Sets the time limit.
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.time_limit = Some(duration);
        self
    }

    /// Sets the trace interval.
    pub fn with_trace_interval(mut self, interval: u64) -> Self {
        self.trace_interval = interval;
        self
    }
}

/// Trait for solutions in Simulated Annealing.
pub trait SaSolution: Clone + Send + Sync {
    /// Returns the cached energy (lower is better).
    fn energy(&self) -> f64;
}

/// Neighborhood operator types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborhoodOperator {
    /// Nudge one element's position.
    Jitter,
    /// Re-roll one element's orientation.
    Rotate,
    /// Exchange the assignments of two elements.
    Swap,
    /// Move one element to another container.
    Reassign,
}

/// Trait for problem-specific SA operations.
pub trait SaProblem: Send + Sync {
    /// The solution type for this problem.
    type Solution: SaSolution;

    /// Creates an initial solution.
    fn initial_solution<R: Rng>(&self, rng: &mut R) -> Self::Solution;

    /// Generates a neighbor solution using the specified operator.
    fn neighbor<R: Rng>(
        &self,
        solution: &Self::Solution,
        operator: NeighborhoodOperator,
        rng: &mut R,
    ) -> Self::Solution;

    /// Evaluates the energy of a solution.
    fn evaluate(&self, solution: &mut Self::Solution);

    /// Operators and their selection weights.
    fn operator_weights(&self) -> Vec<(NeighborhoodOperator, f64)> {
        vec![
            (NeighborhoodOperator::Jitter, 0.4),
            (NeighborhoodOperator::Rotate, 0.3),
            (NeighborhoodOperator::Swap, 0.2),
            (NeighborhoodOperator::Reassign, 0.1),
        ]
    }
}

/// Trace sample taken every `trace_interval` iterations.
#[derive(Debug, Clone)]
pub struct SaSample {
    /// Iterations completed.
    pub iteration: u64,
    /// Temperature in effect once the sampled iteration completes, i.e.
    /// after cooling when the iteration ends a temperature level.
    pub temperature: f64,
    /// Energy of the current solution.
    pub current_energy: f64,
    /// Best energy so far.
    pub best_energy: f64,
    /// Accepted over attempted moves so far.
    pub acceptance_rate: f64,
}

/// Result of a SA run.
#[derive(Debug, Clone)]
pub struct SaResult<S: SaSolution> {
    /// The best solution found.
    pub best: S,
    /// Final temperature reached.
    pub final_temperature: f64,
    /// Total iterations performed.
    pub iterations: u64,
    /// Accepted over attempted moves.
    pub acceptance_rate: f64,
    /// Total elapsed time.
    pub elapsed: Duration,
    /// Whether the run stopped on cancellation or time limit.
    pub cancelled: bool,
    /// Best energy at each trace sample.
    pub history: Vec<f64>,
}

/// Simulated Annealing runner.
pub struct SaRunner<P: SaProblem> {
    config: SaConfig,
    problem: P,
    cancelled: CancellationToken,
}

impl<P: SaProblem> SaRunner<P> {
    /// Creates a new SA runner.
    pub fn new(config: SaConfig, problem: P) -> Self {
        Self {
            config,
            problem,
            cancelled: CancellationToken::new(),
        }
    }

    /// Shares an existing cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancelled = token;
        self
    }

    /// Returns a handle to cancel the algorithm.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancelled.clone()
    }

    /// Returns the problem.
    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Runs the Simulated Annealing algorithm with a specific RNG.
    pub fn run_with_rng<R: Rng>(&self, rng: &mut R) -> SaResult<P::Solution> {
        self.run_with_rng_and_trace::<R, fn(&SaSample, &P::Solution)>(rng, None)
    }

    /// Runs with an optional observer called at every trace sample with
    /// the sample and the best solution so far.
    pub fn run_with_rng_and_trace<R: Rng, F>(
        &self,
        rng: &mut R,
        mut observer: Option<F>,
    ) -> SaResult<P::Solution>
    where
        F: FnMut(&SaSample, &P::Solution),
    {
        let start = Instant::now();
        let mut history = Vec::new();

        let mut current = self.problem.initial_solution(rng);
        self.problem.evaluate(&mut current);
        let mut best = current.clone();
        let mut best_energy = best.energy();

        let weights = self.problem.operator_weights();
        let chooser = WeightedIndex::new(weights.iter().map(|(_, w)| *w)).ok();

        let mut temperature = self.config.initial_temp;
        let mut iteration = 0u64;
        let mut accepted = 0u64;
        let mut cancelled = false;

        let temp_delta = match self.config.cooling_schedule {
            CoolingSchedule::Linear => {
                (self.config.initial_temp - self.config.final_temp)
                    / (self.config.max_iterations.unwrap_or(10_000) as f64
                        / self.config.iterations_per_temp.max(1) as f64)
            }
            _ => 0.0,
        };

        'outer: while temperature > self.config.final_temp {
            if self.cancelled.is_cancelled()
                || self.config.time_limit.is_some_and(|l| start.elapsed() > l)
            {
                cancelled = true;
                break;
            }

            let per_temp = self.config.iterations_per_temp.max(1);
            let cooled = self.cool_down(temperature, temp_delta);
            for step in 0..per_temp {
                if self.config.max_iterations.is_some_and(|max| iteration >= max) {
                    break 'outer;
                }

                let operator = match &chooser {
                    Some(dist) => weights[dist.sample(rng)].0,
                    None => NeighborhoodOperator::Jitter,
                };

                let mut neighbor = self.problem.neighbor(&current, operator, rng);
                self.problem.evaluate(&mut neighbor);

                let delta = neighbor.energy() - current.energy();
                let accept = delta <= 0.0 || rng.gen::<f64>() < (-delta / temperature).exp();

                if accept {
                    accepted += 1;
                    current = neighbor;
                    if current.energy() < best_energy {
                        best = current.clone();
                        best_energy = best.energy();
                    }
                }
                iteration += 1;

                if self.config.trace_interval > 0 && iteration % self.config.trace_interval == 0 {
                    history.push(best_energy);
                    // the last move of a level is sampled after that level's cooling step
                    let sampled = if step + 1 == per_temp {
                        cooled
                    } else {
                        temperature
                    };
                    if let Some(observer) = observer.as_mut() {
                        observer(
                            &SaSample {
                                iteration,
                                temperature: sampled,
                                current_energy: current.energy(),
                                best_energy,
                                acceptance_rate: accepted as f64 / iteration as f64,
                            },
                            &best,
                        );
                    }
                }
            }

            temperature = cooled;
        }

        SaResult {
            best,
            final_temperature: temperature,
            iterations: iteration,
            acceptance_rate: if iteration > 0 {
                accepted as f64 / iteration as f64
            } else {
                0.0
            },
            elapsed: start.elapsed(),
            cancelled,
            history,
        }
    }

    /// Apply cooling schedule.
    fn cool_down(&self, current_temp: f64, delta: f64) -> f64 {
        match self.config.cooling_schedule {
            CoolingSchedule::Geometric => current_temp * self.config.cooling_rate,
            CoolingSchedule::Linear => current_temp - delta,
            CoolingSchedule::LundyMees => {
                current_temp / (1.0 + self.config.cooling_rate * current_temp)
            }
        }
    }
}
