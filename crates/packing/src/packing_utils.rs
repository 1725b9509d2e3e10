//! Shared utilities for the stochastic packing strategies.
//!
//! The genetic and annealing strategies share one encoding: an
//! [`Assignment`] per placeable piece instance (stock instance, position,
//! rotation). This module owns everything built on that encoding.
//!
//! # Components
//!
//! - [`SearchSpace`]: placeable instances and the stock/rotation options of each
//! - [`evaluate_assignments`]: volume efficiency plus overlap/bounds counts
//! - [`genetic_fitness`] / [`annealing_energy`]: the two objective functions
//! - [`repair`]: re-packs offending placements with the greedy anchor search
//! - [`finish`]: turns a best encoding into an [`OptimizationResult`]

use crate::greedy::find_anchor_position;
use foamcut_core::geometry::{self, Rotation, Vec3};
use foamcut_core::problem::Problem;
use foamcut_core::result::{Layout, OptimizationResult, Warning};
use foamcut_core::Placement;
use rand::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How an infeasible best solution is turned into a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FeasibilityMode {
    /// Remove offending placements and re-pack them with anchor search.
    #[default]
    Repair,
    /// Return the solution as found, flagged infeasible.
    Soft,
}

/// One piece instance bound to a stock instance, position and rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assignment {
    /// Piece instance index.
    pub instance: usize,
    /// Stock instance index.
    pub stock: usize,
    /// Minimum corner.
    pub position: Vec3,
    /// Orientation.
    pub rotation: Rotation,
}

/// Placeable instances with their admissible stock instances and rotations.
pub struct SearchSpace<'a> {
    problem: &'a Problem,
    pool: Vec<usize>,
    /// [slot][block] rotations fitting that block.
    fitting: Vec<Vec<Vec<Rotation>>>,
    /// [slot] stock instances the slot fits into.
    candidates: Vec<Vec<usize>>,
}

impl<'a> SearchSpace<'a> {
    /// Builds the space over every instance that fits some stock.
    pub fn new(problem: &'a Problem) -> Self {
        let (pool, _) = problem.placeable_split();
        let fitting: Vec<Vec<Vec<Rotation>>> = pool
            .iter()
            .map(|&i| {
                let inst = &problem.piece_instances()[i];
                problem
                    .stock()
                    .iter()
                    .map(|block| inst.fitting_rotations(&block.dims()))
                    .collect()
            })
            .collect();
        let candidates = fitting
            .iter()
            .map(|per_block| {
                problem
                    .stock_instances()
                    .iter()
                    .filter(|s| !per_block[s.block_index].is_empty())
                    .map(|s| s.index)
                    .collect()
            })
            .collect();

        Self {
            problem,
            pool,
            fitting,
            candidates,
        }
    }

    /// The underlying problem.
    pub fn problem(&self) -> &'a Problem {
        self.problem
    }

    /// Number of slots (placeable instances).
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Returns true if nothing can be placed.
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Piece instance index of a slot.
    pub fn instance(&self, slot: usize) -> usize {
        self.pool[slot]
    }

    /// Stock instances the slot fits into.
    pub fn candidates(&self, slot: usize) -> &[usize] {
        &self.candidates[slot]
    }

    /// Rotations of the slot that fit `stock`.
    pub fn rotations_for(&self, slot: usize, stock: usize) -> &[Rotation] {
        let block = self.problem.stock_instances()[stock].block_index;
        &self.fitting[slot][block]
    }

    /// Oriented dimensions of a slot.
    pub fn dims(&self, slot: usize, rotation: Rotation) -> Vec3 {
        self.problem.piece_instances()[self.pool[slot]].oriented(rotation)
    }

    /// Dimensions of a stock instance.
    pub fn stock_dims(&self, stock: usize) -> Vec3 {
        self.problem.stock_instances()[stock].dims
    }

    /// Uniformly random admissible assignment for a slot.
    pub fn random_assignment<R: Rng>(&self, slot: usize, rng: &mut R) -> Assignment {
        let stock = self.candidates[slot].choose(rng).copied().unwrap_or(0);
        let rotation = self
            .rotations_for(slot, stock)
            .choose(rng)
            .copied()
            .unwrap_or_default();
        let slack = self.stock_dims(stock) - self.dims(slot, rotation);
        let position = Vec3::new(
            rng.gen::<f64>() * slack.x.max(0.0),
            rng.gen::<f64>() * slack.y.max(0.0),
            rng.gen::<f64>() * slack.z.max(0.0),
        );
        Assignment {
            instance: self.pool[slot],
            stock,
            position,
            rotation,
        }
    }

    /// Moves a slot's position by up to `step` × stock dimension per axis,
    /// clamped to the stock.
    pub fn jitter<R: Rng>(&self, slot: usize, a: &mut Assignment, step: f64, rng: &mut R) {
        let stock = self.stock_dims(a.stock);
        for axis in 0..3 {
            let reach = stock[axis] * step;
            if reach > 0.0 {
                a.position[axis] += rng.gen_range(-reach..=reach);
            }
        }
        self.clamp(slot, a);
    }

    /// Re-rolls the rotation among those fitting the assigned stock.
    pub fn reroll_rotation<R: Rng>(&self, slot: usize, a: &mut Assignment, rng: &mut R) {
        if let Some(rotation) = self.rotations_for(slot, a.stock).choose(rng) {
            a.rotation = *rotation;
        }
        self.clamp(slot, a);
    }

    /// Clamps the position so the piece stays inside its stock where possible.
    pub fn clamp(&self, slot: usize, a: &mut Assignment) {
        a.position = clamp_position(
            &a.position,
            &self.dims(slot, a.rotation),
            &self.stock_dims(a.stock),
        );
    }
}

/// Clamps each coordinate to `[0, max(0, stock - dims)]`.
pub fn clamp_position(position: &Vec3, dims: &Vec3, stock: &Vec3) -> Vec3 {
    Vec3::from_fn(|i, _| position[i].clamp(0.0, (stock[i] - dims[i]).max(0.0)))
}

/// Volume and validity metrics of an encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PackingMetrics {
    /// Used volume over the volume of used stock instances, percent (≤ 100).
    pub efficiency: f64,
    /// `100 − efficiency`.
    pub waste: f64,
    /// Overlapping placement pairs within the same stock instance.
    pub overlaps: usize,
    /// Placements leaving their stock instance.
    pub bounds_violations: usize,
}

impl PackingMetrics {
    /// Returns true if the encoding decodes to valid layouts.
    pub fn is_feasible(&self) -> bool {
        self.overlaps == 0 && self.bounds_violations == 0
    }
}

/// Computes efficiency, overlaps and bounds violations of an encoding.
pub fn evaluate_assignments(problem: &Problem, assignments: &[Assignment]) -> PackingMetrics {
    let stock_instances = problem.stock_instances();
    let pieces = problem.piece_instances();

    let mut by_stock: Vec<Vec<usize>> = vec![Vec::new(); stock_instances.len()];
    for (i, a) in assignments.iter().enumerate() {
        by_stock[a.stock].push(i);
    }

    let mut used = 0.0;
    let mut stock_volume = 0.0;
    let mut overlaps = 0;
    let mut bounds_violations = 0;

    for (stock, members) in by_stock.iter().enumerate() {
        if members.is_empty() {
            continue;
        }
        let stock_dims = stock_instances[stock].dims;
        stock_volume += stock_instances[stock].volume;

        let boxes: Vec<_> = members
            .iter()
            .map(|&i| {
                let a = &assignments[i];
                let dims = pieces[a.instance].oriented(a.rotation);
                used += geometry::volume(&dims);
                if !geometry::fits(&a.position, &dims, &stock_dims) {
                    bounds_violations += 1;
                }
                geometry::Aabb3::from_origin_size(a.position, dims)
            })
            .collect();

        for (i, a) in boxes.iter().enumerate() {
            overlaps += boxes[i + 1..].iter().filter(|b| a.overlaps(b)).count();
        }
    }

    let efficiency = if stock_volume > 0.0 {
        (used / stock_volume * 100.0).min(100.0)
    } else {
        0.0
    };

    PackingMetrics {
        efficiency,
        waste: 100.0 - efficiency,
        overlaps,
        bounds_violations,
    }
}

/// Genetic fitness: `0.7·eff + 0.2·(1 − waste) + 0.1·feasible`, all in [0, 1].
pub fn genetic_fitness(metrics: &PackingMetrics) -> f64 {
    let feasible = if metrics.overlaps == 0 { 1.0 } else { 0.0 };
    0.7 * metrics.efficiency / 100.0 + 0.2 * (1.0 - metrics.waste / 100.0) + 0.1 * feasible
}

/// Annealing energy: `(100 − eff) + 100·overlaps + 50·bounds_violations`.
pub fn annealing_energy(metrics: &PackingMetrics) -> f64 {
    (100.0 - metrics.efficiency)
        + metrics.overlaps as f64 * 100.0
        + metrics.bounds_violations as f64 * 50.0
}

/// Decodes an encoding as-is into layouts, one per used stock instance.
pub fn layouts_from_assignments(problem: &Problem, assignments: &[Assignment]) -> Vec<Layout> {
    let mut layouts: Vec<Layout> = problem.stock_instances().iter().map(Layout::new).collect();
    for a in assignments {
        let inst = &problem.piece_instances()[a.instance];
        layouts[a.stock]
            .placements
            .push(Placement::new(inst, a.position, a.rotation));
    }
    layouts.retain(|l| !l.is_empty());
    layouts
}

/// Decodes an encoding, dropping placements that overlap an earlier one or
/// leave their stock, then re-inserting them by anchor search.
///
/// Used stock instances are tried before unused ones. Returns the layouts
/// and the number of placements that had to be moved.
pub fn repair(problem: &Problem, assignments: &[Assignment]) -> (Vec<Layout>, usize) {
    let pieces = problem.piece_instances();
    let mut layouts: Vec<Layout> = problem.stock_instances().iter().map(Layout::new).collect();
    let mut displaced = Vec::new();

    for a in assignments {
        let inst = &pieces[a.instance];
        let dims = inst.oriented(a.rotation);
        let layout = &mut layouts[a.stock];
        if layout.can_place(&a.position, &dims) {
            layout.push(Placement::new(inst, a.position, a.rotation));
        } else {
            displaced.push(a.instance);
        }
    }
    let moved = displaced.len();

    displaced.sort_by(|&a, &b| {
        pieces[b]
            .volume
            .partial_cmp(&pieces[a].volume)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for instance in displaced {
        let inst = &pieces[instance];
        let mut order: Vec<usize> = (0..layouts.len()).collect();
        order.sort_by_key(|&i| (layouts[i].is_empty(), i));
        for i in order {
            if let Some((position, rotation)) =
                find_anchor_position(&layouts[i], inst, &inst.rotations)
            {
                layouts[i].push(Placement::new(inst, position, rotation));
                break;
            }
        }
    }

    layouts.retain(|l| !l.is_empty());
    (layouts, moved)
}

/// Turns the best encoding of a stochastic search into a result.
pub fn finish(
    problem: &Problem,
    assignments: &[Assignment],
    metrics: &PackingMetrics,
    mode: FeasibilityMode,
    strategy: &str,
) -> OptimizationResult {
    if metrics.is_feasible() {
        let layouts = layouts_from_assignments(problem, assignments);
        return OptimizationResult::from_layouts(problem, layouts, strategy);
    }

    match mode {
        FeasibilityMode::Repair => {
            let (layouts, moved) = repair(problem, assignments);
            log::warn!(
                "{}: best solution infeasible ({} overlaps, {} out of bounds), re-packed {} placements",
                strategy,
                metrics.overlaps,
                metrics.bounds_violations,
                moved
            );
            let mut result = OptimizationResult::from_layouts(problem, layouts, strategy);
            result.push_warning(Warning::InfeasibleBest {
                overlaps: metrics.overlaps,
                bounds_violations: metrics.bounds_violations,
                repaired: true,
            });
            result
        }
        FeasibilityMode::Soft => {
            log::warn!(
                "{}: returning infeasible best solution ({} overlaps, {} out of bounds)",
                strategy,
                metrics.overlaps,
                metrics.bounds_violations
            );
            let layouts = layouts_from_assignments(problem, assignments);
            let mut result = OptimizationResult::from_layouts(problem, layouts, strategy);
            result.feasible = false;
            result.push_warning(Warning::InfeasibleBest {
                overlaps: metrics.overlaps,
                bounds_violations: metrics.bounds_violations,
                repaired: false,
            });
            result
        }
    }
}
