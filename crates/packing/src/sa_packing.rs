//! Simulated Annealing based 3D cutting-stock optimization.
//!
//! The solution is the same flat assignment list used by the genetic
//! strategy. The initial solution is a randomized anchor pass; moves jitter,
//! rotate, swap or reassign single placements.

use crate::greedy::find_anchor_position;
use crate::packing_utils::{
    annealing_energy, evaluate_assignments, finish, Assignment, FeasibilityMode, PackingMetrics,
    SearchSpace,
};
use foamcut_core::problem::Problem;
use foamcut_core::report::{AlgorithmData, CoolingRecord};
use foamcut_core::result::{Layout, OptimizationResult};
use foamcut_core::sa::{NeighborhoodOperator, SaConfig, SaProblem, SaRunner, SaSample, SaSolution};
use foamcut_core::solver::{
    rng_from_seed, CancellationToken, ProgressCallback, ProgressInfo, Solver,
};
use foamcut_core::{Placement, Result};
use rand::prelude::*;
use std::time::Instant;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Options of the annealing strategy.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnnealingOptions {
    /// Schedule parameters.
    pub sa: SaConfig,
    /// Maximum jitter per axis as a fraction of the stock dimension.
    pub position_step: f64,
    /// Handling of an infeasible best solution.
    pub feasibility: FeasibilityMode,
    /// Random seed; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for AnnealingOptions {
    fn default() -> Self {
        Self {
            sa: SaConfig::default(),
            position_step: 0.15,
            feasibility: FeasibilityMode::default(),
            seed: None,
        }
    }
}

impl AnnealingOptions {
    /// Sets the schedule parameters.
    pub fn with_sa(mut self, sa: SaConfig) -> Self {
        self.sa = sa;
        self
    }

    /// Sets the jitter fraction.
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

/// Annealing state: one assignment per slot.
#[derive(Debug, Clone)]
pub struct PackingSolution {
    /// Assignments in slot order.
    pub assignments: Vec<Assignment>,
    energy: f64,
    metrics: PackingMetrics,
}

impl PackingSolution {
    fn new(assignments: Vec<Assignment>) -> Self {
        Self {
            assignments,
            energy: f64::INFINITY,
            metrics: PackingMetrics::default(),
        }
    }

    /// Metrics from the last evaluation.
    pub fn metrics(&self) -> &PackingMetrics {
        &self.metrics
    }
}

impl SaSolution for PackingSolution {
    fn energy(&self) -> f64 {
        self.energy
    }
}

/// SA problem over a [`SearchSpace`].
pub struct SaPackingProblem<'a> {
    space: SearchSpace<'a>,
    position_step: f64,
}

impl<'a> SaPackingProblem<'a> {
    /// Creates the SA problem.
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

    fn swap<R: Rng>(&self, assignments: &mut [Assignment], rng: &mut R) {
        let n = assignments.len();
        if n < 2 {
            return;
        }
        let i = rng.gen_range(0..n);
        let j = (i + rng.gen_range(1..n)) % n;
        let (si, sj) = (assignments[i].stock, assignments[j].stock);
        if !self.space.candidates(i).contains(&sj) || !self.space.candidates(j).contains(&si) {
            return;
        }

        let (pi, pj) = (assignments[i].position, assignments[j].position);
        for (slot, stock, position) in [(i, sj, pj), (j, si, pi)] {
            let a = &mut assignments[slot];
            a.stock = stock;
            a.position = position;
            let rotations = self.space.rotations_for(slot, stock);
            if !rotations.contains(&a.rotation) {
                if let Some(r) = rotations.choose(rng) {
                    a.rotation = *r;
                }
            }
            self.space.clamp(slot, a);
        }
    }

    fn reassign<R: Rng>(&self, slot: usize, a: &mut Assignment, rng: &mut R) {
        let others: Vec<usize> = self
            .space
            .candidates(slot)
            .iter()
            .copied()
            .filter(|&s| s != a.stock)
            .collect();
        let Some(&stock) = others.choose(rng) else {
            return;
        };
        a.stock = stock;
        let rotations = self.space.rotations_for(slot, stock);
        if !rotations.contains(&a.rotation) {
            if let Some(r) = rotations.choose(rng) {
                a.rotation = *r;
            }
        }
        let slack = self.space.stock_dims(stock) - self.space.dims(slot, a.rotation);
        a.position = slack.map(|s| rng.gen::<f64>() * s.max(0.0));
    }
}

impl SaProblem for SaPackingProblem<'_> {
    type Solution = PackingSolution;

    fn initial_solution<R: Rng>(&self, rng: &mut R) -> PackingSolution {
        let problem = self.space.problem();
        let instances = problem.piece_instances();
        let mut layouts: Vec<Layout> = problem.stock_instances().iter().map(Layout::new).collect();

        let mut slots: Vec<usize> = (0..self.space.len()).collect();
        slots.sort_by(|&a, &b| {
            let va = instances[self.space.instance(a)].volume;
            let vb = instances[self.space.instance(b)].volume;
            vb.partial_cmp(&va).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut assignments: Vec<Option<Assignment>> = vec![None; self.space.len()];
        for slot in slots {
            let inst = &instances[self.space.instance(slot)];
            let mut rotations = inst.rotations.clone();
            rotations.shuffle(rng);

            let found = self.space.candidates(slot).iter().find_map(|&stock| {
                find_anchor_position(&layouts[stock], inst, &rotations)
                    .map(|(position, rotation)| (stock, position, rotation))
            });
            assignments[slot] = Some(match found {
                Some((stock, position, rotation)) => {
                    layouts[stock].push(Placement::new(inst, position, rotation));
                    Assignment {
                        instance: inst.index,
                        stock,
                        position,
                        rotation,
                    }
                }
                None => self.space.random_assignment(slot, rng),
            });
        }

        PackingSolution::new(assignments.into_iter().flatten().collect())
    }

    fn neighbor<R: Rng>(
        &self,
        solution: &PackingSolution,
        operator: NeighborhoodOperator,
        rng: &mut R,
    ) -> PackingSolution {
        let mut next = PackingSolution::new(solution.assignments.clone());
        if next.assignments.is_empty() {
            return next;
        }
        let slot = rng.gen_range(0..next.assignments.len());

        match operator {
            NeighborhoodOperator::Jitter => {
                self.space
                    .jitter(slot, &mut next.assignments[slot], self.position_step, rng);
            }
            NeighborhoodOperator::Rotate => {
                self.space
                    .reroll_rotation(slot, &mut next.assignments[slot], rng);
            }
            NeighborhoodOperator::Swap => self.swap(&mut next.assignments, rng),
            NeighborhoodOperator::Reassign => {
                self.reassign(slot, &mut next.assignments[slot], rng);
            }
        }
        next
    }

    fn evaluate(&self, solution: &mut PackingSolution) {
        let metrics = evaluate_assignments(self.space.problem(), &solution.assignments);
        solution.energy = annealing_energy(&metrics);
        solution.metrics = metrics;
    }
}

/// Runs the annealing search and assembles the result.
pub fn run_sa_packing(
    problem: &Problem,
    options: &AnnealingOptions,
    cancel: &CancellationToken,
    progress: Option<&ProgressCallback>,
) -> OptimizationResult {
    let start = Instant::now();
    let sa_problem = SaPackingProblem::new(problem, options.position_step);
    if sa_problem.space().is_empty() {
        return OptimizationResult::from_layouts(problem, Vec::new(), "annealing")
            .with_algorithm_data(AlgorithmData::Annealing {
                iterations: 0,
                final_temperature: options.sa.initial_temp,
                acceptance_rate: 0.0,
                cooling: Vec::new(),
            });
    }

    let runner = SaRunner::new(options.sa.clone(), sa_problem).with_cancellation(cancel.clone());
    let mut rng = rng_from_seed(options.seed);
    let mut cooling = Vec::new();
    let max_iterations = options.sa.max_iterations;

    let observer = |s: &SaSample, best: &PackingSolution| {
        log::debug!(
            "SA 3D Packing Iteration {}: temp={:.4}, best_energy={:.4}",
            s.iteration,
            s.temperature,
            s.best_energy
        );
        cooling.push(CoolingRecord {
            iteration: s.iteration,
            temperature: s.temperature,
            current_energy: s.current_energy,
            best_energy: s.best_energy,
            efficiency: best.metrics().efficiency,
            acceptance_rate: s.acceptance_rate,
        });
        if let (Some(callback), Some(max)) = (progress, max_iterations) {
            let percent = s.iteration as f64 / max.max(1) as f64 * 100.0;
            callback(
                ProgressInfo::new("annealing")
                    .with_progress(percent)
                    .with_stage(format!("iteration {}, T={:.2}", s.iteration, s.temperature)),
            );
        }
    };
    let sa_result = runner.run_with_rng_and_trace(&mut rng, Some(observer));

    let best = &sa_result.best;
    let result = finish(
        problem,
        &best.assignments,
        best.metrics(),
        options.feasibility,
        "annealing",
    )
    .with_algorithm_data(AlgorithmData::Annealing {
        iterations: sa_result.iterations,
        final_temperature: sa_result.final_temperature,
        acceptance_rate: sa_result.acceptance_rate,
        cooling,
    })
    .with_cancelled(sa_result.cancelled)
    .with_computation_time(start.elapsed().as_millis() as u64);

    log::info!(
        "SA packing: {} iterations, final temp={:.4}, efficiency={:.2}%",
        sa_result.iterations,
        sa_result.final_temperature,
        result.efficiency
    );
    result
}

/// Simulated annealing strategy.
#[derive(Debug, Clone, Default)]
pub struct AnnealingPacker {
    options: AnnealingOptions,
    cancelled: CancellationToken,
}

impl AnnealingPacker {
    /// Creates an annealing packer.
    pub fn new(options: AnnealingOptions) -> Self {
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
    pub fn options(&self) -> &AnnealingOptions {
        &self.options
    }
}

impl Solver for AnnealingPacker {
    fn name(&self) -> &'static str {
        "annealing"
    }

    fn solve(&self, problem: &Problem) -> Result<OptimizationResult> {
        Ok(run_sa_packing(problem, &self.options, &self.cancelled, None))
    }

    fn solve_with_progress(
        &self,
        problem: &Problem,
        callback: ProgressCallback,
    ) -> Result<OptimizationResult> {
        callback(ProgressInfo::new(self.name()).with_stage("started"));
        let result = run_sa_packing(problem, &self.options, &self.cancelled, Some(&callback));
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use foamcut_core::model::{Piece, StockBlock};

    fn problem() -> Problem {
        Problem::new(
            vec![
                Piece::new("A", 50.0, 50.0, 100.0).with_quantity(4),
                Piece::new("B", 30.0, 20.0, 10.0).with_quantity(3),
            ],
            vec![StockBlock::new("S", 100.0, 100.0, 100.0).with_quantity(2)],
        )
        .unwrap()
    }

    fn fast(seed: u64) -> AnnealingOptions {
        AnnealingOptions::default()
            .with_sa(SaConfig::default().with_max_iterations(400))
            .with_seed(seed)
    }

    #[test]
    fn test_initial_solution_is_feasible() {
        let problem = problem();
        let sa = SaPackingProblem::new(&problem, 0.15);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            let mut s = sa.initial_solution(&mut rng);
            sa.evaluate(&mut s);
            assert_eq!(s.assignments.len(), 7);
            assert!(s.metrics().is_feasible());
        }
    }

    #[test]
    fn test_neighbors_keep_slots_and_bounds() {
        let problem = problem();
        let sa = SaPackingProblem::new(&problem, 0.15);
        let mut rng = StdRng::seed_from_u64(2);
        let mut s = sa.initial_solution(&mut rng);
        let ops = [
            NeighborhoodOperator::Jitter,
            NeighborhoodOperator::Rotate,
            NeighborhoodOperator::Swap,
            NeighborhoodOperator::Reassign,
        ];
        for i in 0..400 {
            s = sa.neighbor(&s, ops[i % 4], &mut rng);
            sa.evaluate(&mut s);
            assert_eq!(s.metrics().bounds_violations, 0);
            for (slot, a) in s.assignments.iter().enumerate() {
                assert_eq!(a.instance, sa.space().instance(slot));
            }
        }
    }

    #[test]
    fn test_scenario_a() {
        let problem = Problem::new(
            vec![Piece::new("cube", 100.0, 100.0, 100.0)],
            vec![StockBlock::new("S", 100.0, 100.0, 100.0)],
        )
        .unwrap();
        let result = AnnealingPacker::new(fast(3)).solve(&problem).unwrap();
        assert_relative_eq!(result.efficiency, 100.0);
        assert_eq!(result.layouts.len(), 1);
    }

    #[test]
    fn test_trace_and_validity() {
        let problem = problem();
        let result = AnnealingPacker::new(fast(11)).solve(&problem).unwrap();
        assert!(result.verify().is_ok());
        match result.algorithm_data {
            Some(AlgorithmData::Annealing {
                iterations,
                final_temperature,
                ref cooling,
                acceptance_rate,
            }) => {
                assert_eq!(iterations, 400);
                assert_eq!(cooling.len(), 4);
                assert!((0.0..=1.0).contains(&acceptance_rate));
                assert!(cooling[0].temperature < fast(11).sa.initial_temp);
                assert!(cooling
                    .windows(2)
                    .all(|w| w[1].temperature < w[0].temperature));
                assert_eq!(cooling[3].temperature, final_temperature);
            }
            ref other => panic!("unexpected data: {:?}", other),
        }
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let problem = problem();
        let a = AnnealingPacker::new(fast(21)).solve(&problem).unwrap();
        let b = AnnealingPacker::new(fast(21)).solve(&problem).unwrap();
        assert_eq!(a.layouts, b.layouts);
    }
}
