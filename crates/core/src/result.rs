//! Optimization result representation.

use crate::cut_plan::{CuttingInstructions, CuttingPattern};
use crate::geometry::{self, Aabb3, Vec3};
use crate::placement::Placement;
use crate::problem::{PieceInstance, Problem, StockInstance};
use crate::report::{AdaptiveAnalysis, AlgorithmComparison, AlgorithmData, HybridAnalysis};
use crate::{Error, Result};
use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// All placements inside one stock instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Layout {
    /// Source stock id.
    pub stock_id: String,
    /// Source stock label.
    pub stock_label: String,
    /// Index of the stock instance in the problem arena.
    pub stock_instance: usize,
    /// Ordinal of the stock instance within its block's quantity.
    pub stock_ordinal: usize,
    /// Stock dimensions.
    pub stock_dims: Vec3,
    /// Placements in insertion order.
    pub placements: Vec<Placement>,
    /// Used volume over stock volume, percent.
    pub utilization: f64,
    /// Cut positions (guillotine layouts only).
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub cutting_pattern: Option<CuttingPattern>,
}

impl Layout {
    /// Creates an empty layout for a stock instance.
    pub fn new(stock: &StockInstance) -> Self {
        Self {
            stock_id: stock.stock_id.clone(),
            stock_label: stock.label.clone(),
            stock_instance: stock.index,
            stock_ordinal: stock.ordinal,
            stock_dims: stock.dims,
            placements: Vec::new(),
            utilization: 0.0,
            cutting_pattern: None,
        }
    }

    /// Stock volume.
    pub fn stock_volume(&self) -> f64 {
        geometry::volume(&self.stock_dims)
    }

    /// Sum of placed piece volumes.
    pub fn used_volume(&self) -> f64 {
        self.placements.iter().map(Placement::volume).sum()
    }

    /// Bounding box of the stock.
    pub fn bounds(&self) -> Aabb3 {
        Aabb3::from_origin_size(Vec3::zeros(), self.stock_dims)
    }

    /// Returns true if a box fits the stock and overlaps no placement.
    pub fn can_place(&self, position: &Vec3, dims: &Vec3) -> bool {
        if !geometry::fits(position, dims, &self.stock_dims) {
            return false;
        }
        let candidate = Aabb3::from_origin_size(*position, *dims);
        !self.placements.iter().any(|p| p.aabb().overlaps(&candidate))
    }

    /// Appends a placement and refreshes utilization.
    pub fn push(&mut self, placement: Placement) {
        self.placements.push(placement);
        self.refresh_utilization();
    }

    /// Recomputes `utilization`, clamped to `[0, 100]`.
    pub fn refresh_utilization(&mut self) {
        let stock = self.stock_volume();
        self.utilization = if stock > 0.0 {
            (self.used_volume() / stock * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
    }

    /// Returns true if no placement was made.
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

/// Why a piece instance did not make it into the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UnplacedReason {
    /// No stock instance can hold it under any allowed rotation.
    DoesNotFit,
    /// It fits somewhere, but stock ran out.
    OutOfStock,
}

/// Recoverable problems attached to a result.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Warning {
    /// Instances of a piece were left out.
    Unplaced {
        /// Source piece id.
        piece_id: String,
        /// Number of instances left out.
        count: usize,
        /// Reason.
        reason: UnplacedReason,
    },
    /// The best stochastic solution broke a layout invariant.
    InfeasibleBest {
        /// Overlapping placement pairs in the raw best solution.
        overlaps: usize,
        /// Placements leaving their stock in the raw best solution.
        bounds_violations: usize,
        /// Whether the offending placements were re-packed.
        repaired: bool,
    },
    /// A strategy failed inside an orchestrated run.
    StrategyFailed {
        /// Strategy name.
        strategy: String,
        /// Error message or panic payload.
        detail: String,
    },
}

/// Result of one optimization call.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OptimizationResult {
    /// Non-empty layouts in production order.
    pub layouts: Vec<Layout>,

    /// Σ used volume / Σ stock volume over used instances, percent.
    pub efficiency: f64,

    /// `100 − efficiency`.
    pub total_waste: f64,

    /// Σ price of used stock instances, if any stock is priced.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub total_cost: Option<f64>,

    /// Recoverable problems.
    #[cfg_attr(feature = "serde", serde(default))]
    pub warnings: Vec<Warning>,

    /// False only if layouts may contain overlaps or out-of-bounds placements.
    pub feasible: bool,

    /// Name of the strategy that produced the layouts.
    pub strategy: String,

    /// Wall-clock time.
    pub computation_time_ms: u64,

    /// Whether the search stopped on cancellation or deadline.
    pub cancelled: bool,

    /// Strategy-specific metadata.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub algorithm_data: Option<AlgorithmData>,

    /// Multi-algorithm comparison.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub algorithm_comparison: Option<AlgorithmComparison>,

    /// Hybrid pipeline report.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub hybrid_analysis: Option<HybridAnalysis>,

    /// Adaptive selection report.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub adaptive_analysis: Option<AdaptiveAnalysis>,

    /// Cut sequence (guillotine only).
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub cutting_instructions: Option<CuttingInstructions>,
}

impl OptimizationResult {
    /// Assembles a result from raw layouts.
    ///
    /// Empty layouts are dropped, utilization and efficiency are recomputed
    /// from volumes, and every unplaced instance is reported as a
    /// [`Warning::Unplaced`]. The reason is [`UnplacedReason::DoesNotFit`]
    /// when the instance fits no stock under any canonical rotation.
    pub fn from_layouts(problem: &Problem, layouts: Vec<Layout>, strategy: impl Into<String>) -> Self {
        Self::from_layouts_with(problem, layouts, strategy, |inst| problem.fits_anywhere(inst))
    }

    /// Like [`from_layouts`](Self::from_layouts) with a custom "could ever
    /// fit" predicate, for strategies that allow fewer rotations.
    pub fn from_layouts_with<F>(
        problem: &Problem,
        layouts: Vec<Layout>,
        strategy: impl Into<String>,
        could_fit: F,
    ) -> Self
    where
        F: Fn(&PieceInstance) -> bool,
    {
        let mut layouts: Vec<Layout> = layouts.into_iter().filter(|l| !l.is_empty()).collect();
        for layout in &mut layouts {
            layout.refresh_utilization();
        }

        let used: f64 = layouts.iter().map(Layout::used_volume).sum();
        let stock: f64 = layouts.iter().map(Layout::stock_volume).sum();
        let efficiency = if stock > 0.0 {
            (used / stock * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        let total_cost = problem.has_prices().then(|| {
            layouts
                .iter()
                .filter_map(|l| problem.stock_instances().get(l.stock_instance))
                .filter_map(|s| s.price)
                .sum::<f64>()
        });

        let placed: HashSet<usize> = layouts
            .iter()
            .flat_map(|l| l.placements.iter().map(|p| p.instance_index))
            .collect();
        let warnings = unplaced_warnings(problem, &placed, could_fit);

        Self {
            layouts,
            efficiency,
            total_waste: 100.0 - efficiency,
            total_cost,
            warnings,
            feasible: true,
            strategy: strategy.into(),
            computation_time_ms: 0,
            cancelled: false,
            algorithm_data: None,
            algorithm_comparison: None,
            hybrid_analysis: None,
            adaptive_analysis: None,
            cutting_instructions: None,
        }
    }

    /// Sets the computation time.
    pub fn with_computation_time(mut self, ms: u64) -> Self {
        self.computation_time_ms = ms;
        self
    }

    /// Sets the strategy metadata.
    pub fn with_algorithm_data(mut self, data: AlgorithmData) -> Self {
        self.algorithm_data = Some(data);
        self
    }

    /// Marks the result as cancelled.
    pub fn with_cancelled(mut self, cancelled: bool) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Appends a warning.
    pub fn push_warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    /// Number of placed piece instances.
    pub fn placed_count(&self) -> usize {
        self.layouts.iter().map(|l| l.placements.len()).sum()
    }

    /// Number of piece instances reported as unplaced.
    pub fn unplaced_count(&self) -> usize {
        self.warnings
            .iter()
            .map(|w| match w {
                Warning::Unplaced { count, .. } => *count,
                _ => 0,
            })
            .sum()
    }

    /// Returns true if every piece instance was placed.
    pub fn all_placed(&self) -> bool {
        self.unplaced_count() == 0
    }

    /// Returns true if the layouts satisfy every geometric invariant.
    pub fn is_feasible(&self) -> bool {
        self.feasible
    }

    /// Unplaced warnings for one piece id.
    pub fn unplaced_for(&self, piece_id: &str) -> usize {
        self.warnings
            .iter()
            .map(|w| match w {
                Warning::Unplaced {
                    piece_id: id,
                    count,
                    ..
                } if id == piece_id => *count,
                _ => 0,
            })
            .sum()
    }

    /// Re-checks every layout invariant, returning the first violation.
    pub fn verify(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (li, layout) in self.layouts.iter().enumerate() {
            if !(0.0..=100.0).contains(&layout.utilization) {
                return Err(Error::Internal(format!(
                    "layout {} utilization {} out of range",
                    li, layout.utilization
                )));
            }
            for (i, p) in layout.placements.iter().enumerate() {
                if !seen.insert(p.instance_index) {
                    return Err(Error::Internal(format!(
                        "instance {} placed twice",
                        p.instance_id
                    )));
                }
                if !geometry::fits(&p.position, &p.dims, &layout.stock_dims) {
                    return Err(Error::Internal(format!(
                        "instance {} leaves stock {} in layout {}",
                        p.instance_id, layout.stock_id, li
                    )));
                }
                for q in &layout.placements[i + 1..] {
                    if p.aabb().overlaps(&q.aabb()) {
                        return Err(Error::Internal(format!(
                            "instances {} and {} overlap in layout {}",
                            p.instance_id, q.instance_id, li
                        )));
                    }
                }
            }
        }
        if !(0.0..=100.0).contains(&self.efficiency) {
            return Err(Error::Internal(format!(
                "efficiency {} out of range",
                self.efficiency
            )));
        }
        Ok(())
    }
}

fn unplaced_warnings<F>(problem: &Problem, placed: &HashSet<usize>, could_fit: F) -> Vec<Warning>
where
    F: Fn(&PieceInstance) -> bool,
{
    // (piece_index, reason) -> count, in piece order
    let mut counts: Vec<(usize, UnplacedReason, usize)> = Vec::new();
    for inst in problem.piece_instances() {
        if placed.contains(&inst.index) {
            continue;
        }
        let reason = if could_fit(inst) {
            UnplacedReason::OutOfStock
        } else {
            UnplacedReason::DoesNotFit
        };
        match counts
            .iter_mut()
            .find(|(pi, r, _)| *pi == inst.piece_index && *r == reason)
        {
            Some(entry) => entry.2 += 1,
            None => counts.push((inst.piece_index, reason, 1)),
        }
    }

    counts
        .into_iter()
        .map(|(piece_index, reason, count)| Warning::Unplaced {
            piece_id: problem.pieces()[piece_index].id.clone(),
            count,
            reason,
        })
        .collect()
}

/// Summary statistics for a result.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResultSummary {
    /// Piece instances placed.
    pub placed: usize,
    /// Piece instances left out.
    pub unplaced: usize,
    /// Stock instances used.
    pub blocks_used: usize,
    /// Efficiency, percent.
    pub efficiency: f64,
    /// Computation time in milliseconds.
    pub time_ms: u64,
    /// Strategy used.
    pub strategy: String,
}

impl From<&OptimizationResult> for ResultSummary {
    fn from(result: &OptimizationResult) -> Self {
        Self {
            placed: result.placed_count(),
            unplaced: result.unplaced_count(),
            blocks_used: result.layouts.len(),
            efficiency: result.efficiency,
            time_ms: result.computation_time_ms,
            strategy: result.strategy.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rotation;
    use crate::model::{Piece, StockBlock};
    use approx::assert_relative_eq;

    fn problem() -> Problem {
        Problem::new(
            vec![
                Piece::new("A", 50.0, 50.0, 100.0).with_quantity(2),
                Piece::new("huge", 500.0, 10.0, 10.0),
            ],
            vec![StockBlock::new("S", 100.0, 100.0, 100.0)
                .with_quantity(2)
                .with_price(12.5)],
        )
        .unwrap()
    }

    fn place(problem: &Problem, layout: &mut Layout, instance: usize, x: f64) {
        let inst = &problem.piece_instances()[instance];
        layout.push(Placement::new(inst, Vec3::new(x, 0.0, 0.0), Rotation::Lwh));
    }

    #[test]
    fn test_from_layouts_metrics() {
        let problem = problem();
        let mut layout = Layout::new(&problem.stock_instances()[0]);
        place(&problem, &mut layout, 0, 0.0);
        let empty = Layout::new(&problem.stock_instances()[1]);

        let result = OptimizationResult::from_layouts(&problem, vec![layout, empty], "test");

        assert_eq!(result.layouts.len(), 1);
        assert_relative_eq!(result.efficiency, 25.0);
        assert_relative_eq!(result.total_waste, 75.0);
        assert_eq!(result.total_cost, Some(12.5));
        assert_eq!(result.placed_count(), 1);
        assert_eq!(result.unplaced_count(), 2);
        assert!(result.verify().is_ok());
    }

    #[test]
    fn test_unplaced_reasons() {
        let problem = problem();
        let result = OptimizationResult::from_layouts(&problem, vec![], "test");

        assert!(result.layouts.is_empty());
        assert_relative_eq!(result.efficiency, 0.0);
        assert_eq!(
            result.warnings,
            vec![
                Warning::Unplaced {
                    piece_id: "A".into(),
                    count: 2,
                    reason: UnplacedReason::OutOfStock,
                },
                Warning::Unplaced {
                    piece_id: "huge".into(),
                    count: 1,
                    reason: UnplacedReason::DoesNotFit,
                },
            ]
        );
        assert_eq!(result.unplaced_for("A"), 2);
    }

    #[test]
    fn test_unpriced_stock_has_no_cost() {
        let problem = Problem::new(
            vec![Piece::new("A", 1.0, 1.0, 1.0)],
            vec![StockBlock::new("S", 1.0, 1.0, 1.0)],
        )
        .unwrap();
        let result = OptimizationResult::from_layouts(&problem, vec![], "test");
        assert_eq!(result.total_cost, None);
    }

    #[test]
    fn test_verify_catches_overlap() {
        let problem = problem();
        let mut layout = Layout::new(&problem.stock_instances()[0]);
        place(&problem, &mut layout, 0, 0.0);
        place(&problem, &mut layout, 1, 25.0);
        let result = OptimizationResult::from_layouts(&problem, vec![layout], "test");
        assert!(matches!(result.verify(), Err(Error::Internal(_))));
    }

    #[test]
    fn test_layout_can_place() {
        let problem = problem();
        let mut layout = Layout::new(&problem.stock_instances()[0]);
        place(&problem, &mut layout, 0, 0.0);
        let dims = Vec3::new(50.0, 50.0, 100.0);
        assert!(!layout.can_place(&Vec3::zeros(), &dims));
        assert!(layout.can_place(&Vec3::new(50.0, 0.0, 0.0), &dims));
        assert!(!layout.can_place(&Vec3::new(60.0, 0.0, 0.0), &dims));
    }

    #[test]
    fn test_summary() {
        let problem = problem();
        let mut layout = Layout::new(&problem.stock_instances()[0]);
        place(&problem, &mut layout, 0, 0.0);
        place(&problem, &mut layout, 1, 50.0);
        let result = OptimizationResult::from_layouts(&problem, vec![layout], "greedy")
            .with_computation_time(7);
        let summary = ResultSummary::from(&result);
        assert_eq!(summary.placed, 2);
        assert_eq!(summary.unplaced, 1);
        assert_eq!(summary.blocks_used, 1);
        assert_relative_eq!(summary.efficiency, 50.0);
        assert_eq!(summary.strategy, "greedy");
    }
}
