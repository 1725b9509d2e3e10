//! Ordered cut instructions and time estimates.
//!
//! Each block is cut in two phases: every horizontal cut first, then every
//! vertical cut, both in ascending position.

use crate::config::GuillotineConfig;
use foamcut_core::cut_plan::{
    BlockInstructions, Cut, CutAxis, CuttingInstructions, CuttingPattern, CuttingPhase,
    CuttingSummary,
};
use foamcut_core::result::Layout;

/// Estimated machine time for `cuts` cuts.
pub fn estimate_time(cuts: usize, config: &GuillotineConfig) -> f64 {
    cuts as f64 * config.seconds_per_cut
}

fn phase(number: u8, axis: CutAxis, positions: &[f64]) -> CuttingPhase {
    let (description, coordinate, direction) = match axis {
        CutAxis::Horizontal => ("Horizontal cuts (along X)", "Y", "left to right"),
        CutAxis::Vertical => ("Vertical cuts (along Y)", "X", "front to back"),
    };
    CuttingPhase {
        phase: number,
        axis,
        description: description.to_string(),
        cuts: positions
            .iter()
            .map(|&position| Cut {
                axis,
                position,
                description: format!(
                    "{} cut at {}={} ({})",
                    axis.as_str(),
                    coordinate,
                    position,
                    direction
                ),
            })
            .collect(),
    }
}

/// Instructions for one block.
pub fn block_instructions(
    block_number: usize,
    layout: &Layout,
    config: &GuillotineConfig,
) -> BlockInstructions {
    let empty = CuttingPattern::default();
    let pattern = layout.cutting_pattern.as_ref().unwrap_or(&empty);
    BlockInstructions {
        block_number,
        stock_id: layout.stock_id.clone(),
        stock_label: layout.stock_label.clone(),
        phases: vec![
            phase(1, CutAxis::Horizontal, &pattern.horizontal_cuts),
            phase(2, CutAxis::Vertical, &pattern.vertical_cuts),
        ],
        total_cuts: pattern.total_cuts,
        estimated_time_s: estimate_time(pattern.total_cuts, config),
    }
}

/// Instructions for every layout carrying a cutting pattern, in layout order.
pub fn generate_instructions(layouts: &[Layout], config: &GuillotineConfig) -> CuttingInstructions {
    let blocks: Vec<BlockInstructions> = layouts
        .iter()
        .filter(|l| l.cutting_pattern.is_some())
        .enumerate()
        .map(|(i, l)| block_instructions(i + 1, l, config))
        .collect();

    let total_cuts = blocks.iter().map(|b| b.total_cuts).sum();
    let estimated_total_time_s = blocks.iter().map(|b| b.estimated_time_s).sum();
    CuttingInstructions {
        summary: CuttingSummary {
            total_blocks: blocks.len(),
            total_cuts,
            estimated_total_time_s,
        },
        blocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foamcut_core::model::{Piece, StockBlock};
    use foamcut_core::problem::Problem;

    #[test]
    fn test_phases_and_totals() {
        let problem = Problem::new(
            vec![Piece::new("P", 10.0, 10.0, 10.0)],
            vec![StockBlock::new("S", 100.0, 100.0, 100.0)
                .with_label("Foam 100")
                .with_quantity(2)],
        )
        .unwrap();
        let mut a = Layout::new(&problem.stock_instances()[0]);
        a.cutting_pattern = Some(CuttingPattern::new(vec![40.0, 20.0], vec![50.0]));
        let mut b = Layout::new(&problem.stock_instances()[1]);
        b.cutting_pattern = Some(CuttingPattern::new(vec![], vec![30.0]));

        let config = GuillotineConfig::default();
        let instructions = generate_instructions(&[a, b], &config);

        assert_eq!(instructions.summary.total_blocks, 2);
        assert_eq!(instructions.summary.total_cuts, 4);
        assert_eq!(instructions.summary.estimated_total_time_s, 60.0);

        let first = &instructions.blocks[0];
        assert_eq!(first.block_number, 1);
        assert_eq!(first.stock_label, "Foam 100");
        assert_eq!(first.phases[0].axis, CutAxis::Horizontal);
        let positions: Vec<f64> = first.phases[0].cuts.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![20.0, 40.0]);
        assert_eq!(first.phases[1].cuts[0].description, "vertical cut at X=50 (front to back)");
        assert_eq!(first.estimated_time_s, 45.0);
    }
}
