//! Genetic Algorithm framework for optimization.
//!
//! The runner owns the generational loop (elitism, tournament selection,
//! crossover, mutation, stagnation stop); problems supply the encoding
//! through [`GaProblem`]. Fitness is maximized.

use crate::solver::CancellationToken;
use rand::prelude::*;
use rayon::prelude::*;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the genetic algorithm.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GaConfig {
    /// Population size.
    pub population_size: usize,
    /// Maximum number of generations.
    pub max_generations: u32,
    /// Crossover rate (0.0 - 1.0).
    pub crossover_rate: f64,
    /// Mutation rate (0.0 - 1.0).
    pub mutation_rate: f64,
    /// Fraction of the population copied unchanged into the next generation.
    pub elite_fraction: f64,
    /// Tournament size for selection.
    pub tournament_size: usize,
    /// Window of generations checked for stagnation (None = never stop early).
    pub stagnation_window: Option<u32>,
    /// Minimum best-fitness spread over the window to keep going.
    pub stagnation_epsilon: f64,
    /// Maximum time limit (None = unlimited).
    pub time_limit: Option<Duration>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            max_generations: 100,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            elite_fraction: 0.2,
            tournament_size: 5,
            stagnation_window: Some(20),
            stagnation_epsilon: 1e-3,
            time_limit: None,
        }
    }
}

impl GaConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size.max(2);
        self
    }

    /// Sets the maximum generations.
    pub fn with_max_generations(mut self, gen: u32) -> Self {
        self.max_generations = gen;
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the elite fraction.
    pub fn with_elite_fraction(mut self, fraction: f64) -> Self {
        self.elite_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Sets the tournament size.
    pub fn with_tournament_size(mut self, size: usize) -> Self {
        self.tournament_size = size.max(1);
        self
    }

    /// Sets the stagnation window and epsilon.
    pub fn with_stagnation(mut self, window: u32, epsilon: f64) -> Self {
        self.stagnation_window = Some(window.max(1));
        self.stagnation_epsilon = epsilon.max(0.0);
        self
    }

    /// Disables the stagnation stop.
    pub fn without_stagnation(mut self) -> Self {
        self.stagnation_window = None;
        self
    }

    /// Sets the time limit.
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.time_limit = Some(duration);
        self
    }

    /// Number of elites for the configured population.
    pub fn elite_count(&self) -> usize {
        ((self.population_size as f64 * self.elite_fraction).floor() as usize)
            .min(self.population_size)
    }
}

/// Trait for individuals in the genetic algorithm.
pub trait Individual: Clone + Send + Sync {
    /// Returns the cached fitness (higher is better).
    fn fitness(&self) -> f64;
}

/// Trait for problem-specific GA operations.
pub trait GaProblem: Send + Sync {
    /// The individual type for this problem.
    type Individual: Individual;

    /// Creates a random individual.
    fn random_individual<R: Rng>(&self, rng: &mut R) -> Self::Individual;

    /// Evaluates the fitness of an individual.
    fn evaluate(&self, individual: &mut Self::Individual);

    /// Produces one child from two parents.
    fn crossover<R: Rng>(
        &self,
        a: &Self::Individual,
        b: &Self::Individual,
        rng: &mut R,
    ) -> Self::Individual;

    /// Mutates an individual in place.
    fn mutate<R: Rng>(&self, individual: &mut Self::Individual, rng: &mut R);

    /// Evaluates multiple individuals in parallel.
    /// Default implementation uses rayon for parallel evaluation.
    fn evaluate_parallel(&self, individuals: &mut [Self::Individual]) {
        individuals.par_iter_mut().for_each(|ind| {
            self.evaluate(ind);
        });
    }

    /// Creates an initial population.
    fn initialize_population<R: Rng>(&self, size: usize, rng: &mut R) -> Vec<Self::Individual> {
        (0..size).map(|_| self.random_individual(rng)).collect()
    }
}

/// Progress information during GA execution.
#[derive(Debug, Clone)]
pub struct GaProgress {
    /// Current generation number.
    pub generation: u32,
    /// Maximum generations configured.
    pub max_generations: u32,
    /// Best fitness so far.
    pub best_fitness: f64,
    /// Average fitness of current population.
    pub avg_fitness: f64,
    /// Elapsed time since start.
    pub elapsed: Duration,
}

/// Result of a GA run.
#[derive(Debug, Clone)]
pub struct GaResult<I: Individual> {
    /// The best individual found.
    pub best: I,
    /// Generations completed.
    pub generations: u32,
    /// Size of the last population.
    pub final_population: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
    /// Whether the run stopped on cancellation or time limit.
    pub cancelled: bool,
    /// Whether the run stopped on stagnation.
    pub converged: bool,
    /// Best fitness after each generation.
    pub history: Vec<f64>,
}

/// Genetic algorithm runner.
pub struct GaRunner<P: GaProblem> {
    config: GaConfig,
    problem: P,
    cancelled: CancellationToken,
}

impl<P: GaProblem> GaRunner<P> {
    /// Creates a new GA runner.
    pub fn new(config: GaConfig, problem: P) -> Self {
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

    /// Runs the genetic algorithm with a specific RNG.
    pub fn run_with_rng<R: Rng>(&self, rng: &mut R) -> GaResult<P::Individual> {
        self.run_with_rng_and_progress::<R, fn(&GaProgress, &P::Individual)>(rng, None)
    }

    /// Runs the genetic algorithm with a specific RNG and an optional
    /// per-generation observer receiving the progress and best individual.
    pub fn run_with_rng_and_progress<R: Rng, F>(
        &self,
        rng: &mut R,
        mut observer: Option<F>,
    ) -> GaResult<P::Individual>
    where
        F: FnMut(&GaProgress, &P::Individual),
    {
        let start = Instant::now();
        let mut history = Vec::new();
        let size = self.config.population_size.max(2);
        let elite_count = self.config.elite_count().min(size);

        let mut population = self.problem.initialize_population(size, rng);
        self.problem.evaluate_parallel(&mut population);
        sort_desc(&mut population);

        let mut best = population[0].clone();
        let mut best_fitness = best.fitness();
        let mut generation = 0u32;
        let mut cancelled = false;
        let mut converged = false;

        while generation < self.config.max_generations {
            if self.cancelled.is_cancelled()
                || self.config.time_limit.is_some_and(|l| start.elapsed() > l)
            {
                cancelled = true;
                break;
            }

            let mut next = Vec::with_capacity(size);
            next.extend(population.iter().take(elite_count).cloned());

            let mut children = Vec::with_capacity(size - next.len());
            while children.len() < size - next.len() {
                let parent1 = self.tournament_select(&population, rng);
                let parent2 = self.tournament_select(&population, rng);

                let mut child = if rng.gen::<f64>() < self.config.crossover_rate {
                    self.problem.crossover(parent1, parent2, rng)
                } else {
                    parent1.clone()
                };

                if rng.gen::<f64>() < self.config.mutation_rate {
                    self.problem.mutate(&mut child, rng);
                }

                children.push(child);
            }

            self.problem.evaluate_parallel(&mut children);
            next.extend(children);
            sort_desc(&mut next);

            if next[0].fitness() > best_fitness {
                best = next[0].clone();
                best_fitness = best.fitness();
            }
            history.push(best_fitness);

            if let Some(observer) = observer.as_mut() {
                let avg_fitness =
                    next.iter().map(Individual::fitness).sum::<f64>() / next.len() as f64;
                observer(
                    &GaProgress {
                        generation,
                        max_generations: self.config.max_generations,
                        best_fitness,
                        avg_fitness,
                        elapsed: start.elapsed(),
                    },
                    &best,
                );
            }

            population = next;
            generation += 1;

            if let Some(window) = self.config.stagnation_window {
                let window = window as usize;
                if history.len() > window {
                    let recent = &history[history.len() - window..];
                    let max = recent.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    let min = recent.iter().copied().fold(f64::INFINITY, f64::min);
                    if max - min < self.config.stagnation_epsilon {
                        converged = true;
                        break;
                    }
                }
            }
        }

        GaResult {
            best,
            generations: generation,
            final_population: population.len(),
            elapsed: start.elapsed(),
            cancelled,
            converged,
            history,
        }
    }

    fn tournament_select<'a, R: Rng>(
        &self,
        population: &'a [P::Individual],
        rng: &mut R,
    ) -> &'a P::Individual {
        let mut best_idx = rng.gen_range(0..population.len());

        for _ in 1..self.config.tournament_size {
            let idx = rng.gen_range(0..population.len());
            if population[idx].fitness() > population[best_idx].fitness() {
                best_idx = idx;
            }
        }

        &population[best_idx]
    }
}

fn sort_desc<I: Individual>(population: &mut [I]) {
    population.sort_by(|a, b| {
        b.fitness()
            .partial_cmp(&a.fitness())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Maximize the number of ones in a bit string.
    struct OneMax {
        len: usize,
    }

    #[derive(Clone)]
    struct Bits {
        bits: Vec<bool>,
        fitness: f64,
    }

    impl Individual for Bits {
        fn fitness(&self) -> f64 {
            self.fitness
        }
    }

    impl GaProblem for OneMax {
        type Individual = Bits;

        fn random_individual<R: Rng>(&self, rng: &mut R) -> Bits {
            Bits {
                bits: (0..self.len).map(|_| rng.gen()).collect(),
                fitness: f64::NEG_INFINITY,
            }
        }

        fn evaluate(&self, individual: &mut Bits) {
            individual.fitness = individual.bits.iter().filter(|b| **b).count() as f64;
        }

        fn crossover<R: Rng>(&self, a: &Bits, b: &Bits, rng: &mut R) -> Bits {
            let point = rng.gen_range(0..=self.len);
            let mut bits = a.bits[..point].to_vec();
            bits.extend_from_slice(&b.bits[point..]);
            Bits {
                bits,
                fitness: f64::NEG_INFINITY,
            }
        }

        fn mutate<R: Rng>(&self, individual: &mut Bits, rng: &mut R) {
            let i = rng.gen_range(0..self.len);
            individual.bits[i] = !individual.bits[i];
        }
    }

    #[test]
    fn test_ga_improves_onemax() {
        let config = GaConfig::default()
            .with_population_size(30)
            .with_max_generations(60)
            .with_mutation_rate(0.5)
            .without_stagnation();
        let runner = GaRunner::new(config, OneMax { len: 32 });
        let mut rng = StdRng::seed_from_u64(42);
        let result = runner.run_with_rng(&mut rng);

        assert_eq!(result.generations, 60);
        assert_eq!(result.history.len(), 60);
        assert!(result.best.fitness() >= 24.0);
        assert!(result.history.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_ga_is_deterministic_with_seed() {
        let run = || {
            let runner = GaRunner::new(GaConfig::default(), OneMax { len: 16 });
            runner
                .run_with_rng(&mut StdRng::seed_from_u64(9))
                .history
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_ga_stagnation_stop() {
        // A one-bit problem is solved immediately and then stagnates.
        let config = GaConfig::default().with_stagnation(5, 1e-3);
        let runner = GaRunner::new(config, OneMax { len: 1 });
        let result = runner.run_with_rng(&mut StdRng::seed_from_u64(1));

        assert!(result.converged);
        assert!(result.generations < 100);
    }

    #[test]
    fn test_ga_cancelled_before_start() {
        let runner = GaRunner::new(GaConfig::default(), OneMax { len: 8 });
        runner.cancel_handle().cancel();
        let result = runner.run_with_rng(&mut StdRng::seed_from_u64(1));

        assert!(result.cancelled);
        assert_eq!(result.generations, 0);
        assert!(result.best.fitness().is_finite());
    }

    #[test]
    fn test_ga_observer_sees_every_generation() {
        let config = GaConfig::default()
            .with_max_generations(10)
            .without_stagnation();
        let runner = GaRunner::new(config, OneMax { len: 8 });
        let mut seen = Vec::new();
        runner.run_with_rng_and_progress(
            &mut StdRng::seed_from_u64(3),
            Some(|p: &GaProgress, best: &Bits| {
                assert!(p.avg_fitness <= p.best_fitness + 1e-9);
                assert_eq!(best.fitness(), p.best_fitness);
                seen.push(p.generation);
            }),
        );
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_elite_count() {
        assert_eq!(GaConfig::default().elite_count(), 10);
        assert_eq!(GaConfig::default().with_elite_fraction(0.0).elite_count(), 0);
    }
}
