//! Deterministic first-fit-decreasing packer.
//!
//! Instances are visited largest volume first. Each stock instance is filled
//! at anchor points (origin plus the right/back/top corners of every
//! placement) in bottom-left-front order; pieces that do not fit are left
//! for the next stock instance.

use foamcut_core::geometry::{Rotation, Vec3, EPS};
use foamcut_core::problem::{PieceInstance, Problem};
use foamcut_core::report::AlgorithmData;
use foamcut_core::result::{Layout, OptimizationResult};
use foamcut_core::solver::{CancellationToken, Solver};
use foamcut_core::{Placement, Result};
use std::time::Instant;

/// Candidate anchor positions of a layout, ordered by (z, y, x).
pub fn anchor_candidates(layout: &Layout) -> Vec<Vec3> {
    let mut anchors = Vec::with_capacity(1 + layout.placements.len() * 3);
    anchors.push(Vec3::zeros());
    for p in &layout.placements {
        let (x, y, z) = (p.x(), p.y(), p.z());
        anchors.push(Vec3::new(x + p.dims.x, y, z));
        anchors.push(Vec3::new(x, y + p.dims.y, z));
        anchors.push(Vec3::new(x, y, z + p.dims.z));
    }

    anchors.sort_by(|a, b| {
        a.z.total_cmp(&b.z)
            .then(a.y.total_cmp(&b.y))
            .then(a.x.total_cmp(&b.x))
    });
    anchors.dedup_by(|a, b| (*a - *b).amax() < EPS);
    anchors
}

/// First anchor × rotation at which `instance` fits into `layout`.
pub fn find_anchor_position(
    layout: &Layout,
    instance: &PieceInstance,
    rotations: &[Rotation],
) -> Option<(Vec3, Rotation)> {
    anchor_candidates(layout).into_iter().find_map(|anchor| {
        rotations
            .iter()
            .find(|r| layout.can_place(&anchor, &instance.oriented(**r)))
            .map(|r| (anchor, *r))
    })
}

/// Outcome of a greedy pass.
#[derive(Debug, Clone)]
pub struct GreedyPass {
    /// Non-empty layouts in stock instance order.
    pub layouts: Vec<Layout>,
    /// Stock instances visited.
    pub stock_instances_tried: usize,
    /// Whether the pass stopped on cancellation.
    pub cancelled: bool,
}

/// Runs the first-fit-decreasing pass.
pub fn pack_greedy(problem: &Problem, cancel: &CancellationToken) -> GreedyPass {
    let instances = problem.piece_instances();
    let order: Vec<usize> = problem
        .by_volume_desc()
        .into_iter()
        .filter(|&i| problem.fits_anywhere(&instances[i]))
        .collect();
    let mut placed = vec![false; instances.len()];
    let mut remaining = order.len();

    let mut layouts = Vec::new();
    let mut tried = 0;
    let mut cancelled = false;

    for stock in problem.stock_instances() {
        if remaining == 0 {
            break;
        }
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        tried += 1;

        let mut layout = Layout::new(stock);
        for &i in &order {
            if placed[i] {
                continue;
            }
            let inst = &instances[i];
            if let Some((position, rotation)) =
                find_anchor_position(&layout, inst, &inst.rotations)
            {
                layout.push(Placement::new(inst, position, rotation));
                placed[i] = true;
                remaining -= 1;
            }
        }

        log::debug!(
            "Greedy stock {}#{}: placed={}, utilization={:.2}%",
            layout.stock_id,
            layout.stock_ordinal,
            layout.placements.len(),
            layout.utilization
        );
        if !layout.is_empty() {
            layouts.push(layout);
        }
    }

    GreedyPass {
        layouts,
        stock_instances_tried: tried,
        cancelled,
    }
}

/// Deterministic first-fit-decreasing strategy.
#[derive(Debug, Clone, Default)]
pub struct GreedyPacker {
    cancelled: CancellationToken,
}

impl GreedyPacker {
    /// Creates a new greedy packer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares an existing cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancelled = token;
        self
    }
}

impl Solver for GreedyPacker {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn solve(&self, problem: &Problem) -> Result<OptimizationResult> {
        let start = Instant::now();
        let pass = pack_greedy(problem, &self.cancelled);

        let result = OptimizationResult::from_layouts(problem, pass.layouts, self.name())
            .with_algorithm_data(AlgorithmData::Greedy {
                stock_instances_tried: pass.stock_instances_tried,
            })
            .with_cancelled(pass.cancelled)
            .with_computation_time(start.elapsed().as_millis() as u64);

        log::info!(
            "Greedy packing: {} layouts, efficiency={:.2}%, unplaced={}",
            result.layouts.len(),
            result.efficiency,
            result.unplaced_count()
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

    #[test]
    fn test_anchor_order() {
        let problem = Problem::new(
            vec![Piece::new("A", 10.0, 20.0, 30.0)],
            vec![StockBlock::new("S", 100.0, 100.0, 100.0)],
        )
        .unwrap();
        let mut layout = Layout::new(&problem.stock_instances()[0]);
        layout.push(Placement::new(
            &problem.piece_instances()[0],
            Vec3::zeros(),
            Rotation::Lwh,
        ));

        let anchors = anchor_candidates(&layout);
        assert_eq!(
            anchors,
            vec![
                Vec3::zeros(),
                Vec3::new(10.0, 0.0, 0.0),
                Vec3::new(0.0, 20.0, 0.0),
                Vec3::new(0.0, 0.0, 30.0),
            ]
        );
    }

    #[test]
    fn test_scenario_c_grid() {
        let problem = Problem::new(
            vec![Piece::new("P", 50.0, 50.0, 100.0).with_quantity(4)],
            vec![StockBlock::new("S", 100.0, 100.0, 100.0)],
        )
        .unwrap();
        let result = GreedyPacker::new().solve(&problem).unwrap();

        assert_eq!(result.layouts.len(), 1);
        assert_eq!(result.placed_count(), 4);
        assert_relative_eq!(result.layouts[0].utilization, 100.0);
        assert!(result.verify().is_ok());
    }

    #[test]
    fn test_overflow_moves_to_next_stock() {
        let problem = Problem::new(
            vec![Piece::new("P", 60.0, 60.0, 60.0).with_quantity(3)],
            vec![StockBlock::new("S", 100.0, 100.0, 100.0).with_quantity(2)],
        )
        .unwrap();
        let result = GreedyPacker::new().solve(&problem).unwrap();

        assert_eq!(result.layouts.len(), 2);
        assert_eq!(result.placed_count(), 2);
        assert_eq!(result.unplaced_for("P"), 1);
        assert!(result.verify().is_ok());
    }

    #[test]
    fn test_rotation_used_when_needed() {
        let problem = Problem::new(
            vec![Piece::new("tall", 10.0, 10.0, 80.0)],
            vec![StockBlock::new("S", 100.0, 50.0, 20.0)],
        )
        .unwrap();
        let result = GreedyPacker::new().solve(&problem).unwrap();

        assert_eq!(result.placed_count(), 1);
        let p = &result.layouts[0].placements[0];
        assert_relative_eq!(p.dims.x, 80.0);
        assert!(p.rotated);
    }

    #[test]
    fn test_cancelled_before_start() {
        let problem = Problem::new(
            vec![Piece::new("P", 10.0, 10.0, 10.0)],
            vec![StockBlock::new("S", 100.0, 100.0, 100.0)],
        )
        .unwrap();
        let packer = GreedyPacker::new();
        packer.cancel();
        let result = packer.solve(&problem).unwrap();
        assert!(result.cancelled);
        assert!(result.layouts.is_empty());
    }
}
