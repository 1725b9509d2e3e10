//! Genetic Algorithm based 3D cutting-stock optimization.
//!
//! A chromosome carries one [`Assignment`] per placeable piece instance
//! (stock instance, position, rotation). Overlaps are penalized through the
//! fitness rather than prevented; an infeasible winner is repaired or
//! flagged according to [`FeasibilityMode`].

use crate::packing_utils::{
    evaluate_assignments, finish, genetic_fitness, Assignment, FeasibilityMode, PackingMetrics,
    SearchSpace,
};
use foamcut_core::ga::{GaConfig, GaProblem, GaProgress, GaRunner, Individual};
use foamcut_core::problem::Problem;
use foamcut_core::report::{AlgorithmData, GenerationRecord};
use foamcut_core::result::OptimizationResult;
use foamcut_core::solver::{
    rng_from_seed, CancellationToken, ProgressCallback, ProgressInfo, Solver,
};
use foamcut_core::Result;
use rand::prelude::*;
use std::time::Instant;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Options of the genetic strategy.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GeneticOptions {
    /// Search parameters.
    pub ga: GaConfig,
    /// Maximum jitter per axis as a fraction of the stock dimension.
    pub position_step: f64,
    /// Handling of an infeasible best individual.
    pub feasibility: FeasibilityMode,
    /// Random seed; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for GeneticOptions {
    fn default() -> Self {
        Self {
            ga: GaConfig::default(),
            position_step: 0.1,
            feasibility: FeasibilityMode::default(),
            seed: None,
        }
    }
}

impl GeneticOptions {
    /// Sets the search parameters.
    pub fn with_ga(mut self, ga: GaConfig) -> Self {
        self.ga = ga;
        self
    }

    /// Sets the mutation jitter fraction.
    pub fn with_position_step(mut self, step: f64) -> Self {
        self.position_step = step.clamp(0.0, 1.0);
        self
    }

    /// Sets the feasibility mode.
    pub fn with_feasibility(mut self, mode: FeasibilityMode) -> Self {
        self.feasibility = mode;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Chromosome: one assignment per slot of the [`SearchSpace`].
#[derive(Debug, Clone)]
pub struct PackingChromosome {
    /// Genes in slot order.
    pub genes: Vec<Assignment>,
    fitness: f64,
    metrics: PackingMetrics,
}

impl PackingChromosome {
    /// Wraps genes with an unevaluated fitness.
    pub fn new(genes: Vec<Assignment>) -> Self {
        Self {
            genes,
            fitness: f64::NEG_INFINITY,
            metrics: PackingMetrics::default(),
        }
    }

    /// Metrics from the last evaluation.
    pub fn metrics(&self) -> &PackingMetrics {
        &self.metrics
    }
}

impl Individual for PackingChromosome {
    fn fitness(&self) -> f64 {
        self.fitness
    }
}

/// GA problem over a [`SearchSpace`].
pub struct GaPackingProblem<'a> {
    space: SearchSpace<'a>,
    position_step: f64,
}

impl<'a> GaPackingProblem<'a> {
    /// Creates the GA problem.
    pub fn new(problem: &'a Problem, position_step: f64) -> Self {
        Self {
            space: SearchSpace::new(problem),
            position_step,
        }
    }

    /// The search space.
    pub fn space(&self) -> &SearchSpace<'a> {
        &self.space
    }
}

impl GaProblem for GaPackingProblem<'_> {
    type Individual = PackingChromosome;

    fn random_individual<R: Rng>(&self, rng: &mut R) -> PackingChromosome {
        let genes = (0..self.space.len())
            .map(|slot| self.space.random_assignment(slot, rng))
            .collect();
        PackingChromosome::new(genes)
    }

    fn evaluate(&self, individual: &mut PackingChromosome) {
        let metrics = evaluate_assignments(self.space.problem(), &individual.genes);
        individual.fitness = genetic_fitness(&metrics);
        individual.metrics = metrics;
    }

    fn crossover<R: Rng>(
        &self,
        a: &PackingChromosome,
        b: &PackingChromosome,
        rng: &mut R,
    ) -> PackingChromosome {
        let n = a.genes.len();
        if n < 2 {
            return a.clone();
        }
        // Genes are slot-aligned, so a cut point never duplicates an instance.
        let point = rng.gen_range(1..n);
        let genes = a.genes[..point]
            .iter()
            .chain(&b.genes[point..])
            .copied()
            .collect();
        PackingChromosome::new(genes)
    }

    fn mutate<R: Rng>(&self, individual: &mut PackingChromosome, rng: &mut R) {
        if individual.genes.is_empty() {
            return;
        }
        let slot = rng.gen_range(0..individual.genes.len());
        let gene = &mut individual.genes[slot];
        if rng.gen_bool(0.5) {
            self.space.jitter(slot, gene, self.position_step, rng);
        } else {
            self.space.reroll_rotation(slot, gene, rng);
        }
    }
}

/// Runs the genetic search and assembles the result.
pub fn run_ga_packing(
    problem: &Problem,
    options: &GeneticOptions,
    cancel: &CancellationToken,
    progress: Option<&ProgressCallback>,
) -> OptimizationResult {
    let start = Instant::now();
    let ga_problem = GaPackingProblem::new(problem, options.position_step);
    if ga_problem.space().is_empty() {
        return OptimizationResult::from_layouts(problem, Vec::new(), "genetic")
            .with_algorithm_data(AlgorithmData::Genetic {
                generations: 0,
                final_population: 0,
                convergence: Vec::new(),
            });
    }

    let runner = GaRunner::new(options.ga.clone(), ga_problem).with_cancellation(cancel.clone());
    let mut rng = rng_from_seed(options.seed);
    let mut convergence = Vec::new();

    let observer = |p: &GaProgress, best: &PackingChromosome| {
        let m = best.metrics();
        log::debug!(
            "GA 3D Packing Gen {}: fitness={:.4}, efficiency={:.2}%, overlaps={}",
            p.generation,
            p.best_fitness,
            m.efficiency,
            m.overlaps
        );
        convergence.push(GenerationRecord {
            generation: p.generation,
            best_fitness: p.best_fitness,
            avg_fitness: p.avg_fitness,
            efficiency: m.efficiency,
            waste: m.waste,
        });
        if let Some(callback) = progress {
            let percent = p.generation as f64 / p.max_generations.max(1) as f64 * 100.0;
            callback(
                ProgressInfo::new("genetic")
                    .with_progress(percent)
                    .with_stage(format!("generation {}", p.generation)),
            );
        }
    };
    let ga_result = runner.run_with_rng_and_progress(&mut rng, Some(observer));

    let best = &ga_result.best;
    let mut result = finish(
        problem,
        &best.genes,
        best.metrics(),
        options.feasibility,
        "genetic",
    );
    result = result
        .with_algorithm_data(AlgorithmData::Genetic {
            generations: ga_result.generations,
            final_population: ga_result.final_population,
            convergence,
        })
        .with_cancelled(ga_result.cancelled)
        .with_computation_time(start.elapsed().as_millis() as u64);

    log::info!(
        "GA packing: {} generations{}, efficiency={:.2}%",
        ga_result.generations,
        if ga_result.converged { " (converged)" } else { "" },
        result.efficiency
    );
    result
}

/// Genetic strategy.
#[derive(Debug, Clone, Default)]
pub struct GeneticPacker {
    options: GeneticOptions,
    cancelled: CancellationToken,
}

impl GeneticPacker {
    /// Creates a genetic packer.
    pub fn new(options: GeneticOptions) -> Self {
        Self {
            options,
            cancelled: CancellationToken::new(),
        }
    }

    /// Shares an existing cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancelled = token;
        self
    }

    /// The strategy options.
    pub fn options(&self) -> &GeneticOptions {
        &self.options
    }
}

impl Solver for GeneticPacker {
    fn name(&self) -> &'static str {
        "genetic"
    }

    fn solve(&self, problem: &Problem) -> Result<OptimizationResult> {
        Ok(run_ga_packing(problem, &self.options, &self.cancelled, None))
    }

    fn solve_with_progress(
        &self,
        problem: &Problem,
        callback: ProgressCallback,
    ) -> Result<OptimizationResult> {
        callback(ProgressInfo::new(self.name()).with_stage("started"));
        let result = run_ga_packing(problem, &self.options, &self.cancelled, Some(&callback));
        callback(
            ProgressInfo::new(self.name())
                .with_progress(100.0)
                .with_stage("finished"),
        );
        Ok(result)
    }

    fn cancel(&self) {
        self.cancelled.cancel();
    }
}
