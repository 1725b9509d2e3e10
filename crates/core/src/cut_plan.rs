//! Cut plan types produced by the guillotine engine.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Direction of a straight through-cut in the footprint plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CutAxis {
    /// Cut along x at a fixed y.
    Horizontal,
    /// Cut along y at a fixed x.
    Vertical,
}

impl CutAxis {
    /// Lower-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            CutAxis::Horizontal => "horizontal",
            CutAxis::Vertical => "vertical",
        }
    }
}

/// Cut positions registered for one layout.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CuttingPattern {
    /// y positions of horizontal cuts, ascending.
    pub horizontal_cuts: Vec<f64>,
    /// x positions of vertical cuts, ascending.
    pub vertical_cuts: Vec<f64>,
    /// `horizontal_cuts.len() + vertical_cuts.len()`.
    pub total_cuts: usize,
}

impl CuttingPattern {
    /// Builds a pattern, sorting both cut lists.
    pub fn new(mut horizontal_cuts: Vec<f64>, mut vertical_cuts: Vec<f64>) -> Self {
        horizontal_cuts.sort_by(f64::total_cmp);
        vertical_cuts.sort_by(f64::total_cmp);
        let total_cuts = horizontal_cuts.len() + vertical_cuts.len();
        Self {
            horizontal_cuts,
            vertical_cuts,
            total_cuts,
        }
    }
}

/// One instruction step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cut {
    /// Cut direction.
    pub axis: CutAxis,
    /// Offset from the block origin.
    pub position: f64,
    /// Operator-facing description.
    pub description: String,
}

/// All cuts of one direction, performed together.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CuttingPhase {
    /// 1 for horizontal cuts, 2 for vertical cuts.
    pub phase: u8,
    /// Direction shared by every cut of the phase.
    pub axis: CutAxis,
    /// Phase description.
    pub description: String,
    /// Cuts in ascending position.
    pub cuts: Vec<Cut>,
}

/// Instructions for a single stock block.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlockInstructions {
    /// 1-based block number in layout order.
    pub block_number: usize,
    /// Stock id of the block.
    pub stock_id: String,
    /// Stock label of the block.
    pub stock_label: String,
    /// Phase 1 (horizontal) then phase 2 (vertical).
    pub phases: Vec<CuttingPhase>,
    /// Number of cuts on this block.
    pub total_cuts: usize,
    /// Estimated machine time in seconds.
    pub estimated_time_s: f64,
}

/// Totals across all blocks.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CuttingSummary {
    /// Blocks to cut.
    pub total_blocks: usize,
    /// Cuts across all blocks.
    pub total_cuts: usize,
    /// Estimated machine time in seconds.
    pub estimated_total_time_s: f64,
}

/// Ordered, human-followable cut sequence.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CuttingInstructions {
    /// Per-block instructions in layout order.
    pub blocks: Vec<BlockInstructions>,
    /// Totals.
    pub summary: CuttingSummary,
}
