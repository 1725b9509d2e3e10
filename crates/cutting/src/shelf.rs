//! Shelf packing in the footprint plane with guillotine cut registration.
//!
//! Pieces stand on the block base (z = 0) and are laid out in rows along x.
//! Every placement edge that stops short of the block registers a straight
//! through-cut: a vertical cut at the right edge, a horizontal cut at the
//! far edge.

use crate::config::GuillotineConfig;
use foamcut_core::cut_plan::CuttingPattern;
use foamcut_core::geometry::{Rotation, Vec3, EPS};
use foamcut_core::problem::{PieceInstance, Problem, StockInstance};
use foamcut_core::result::Layout;
use foamcut_core::Placement;

const UNROTATED: [Rotation; 1] = [Rotation::Lwh];

/// Footprint orientations tried at the cursor, in order.
pub fn footprint_rotations(config: &GuillotineConfig) -> &'static [Rotation] {
    if config.allow_rotation {
        &Rotation::UPRIGHT
    } else {
        &UNROTATED
    }
}

/// Returns true if the instance can stand upright in the stock under some
/// allowed footprint orientation.
pub fn fits_upright(instance: &PieceInstance, stock: &Vec3, config: &GuillotineConfig) -> bool {
    footprint_rotations(config).iter().any(|r| {
        let d = instance.oriented(*r);
        d.x <= stock.x + EPS && d.y <= stock.y + EPS && d.z <= stock.z + EPS
    })
}

/// Instance indices by descending footprint area (stable on ties).
pub fn by_footprint_desc(problem: &Problem) -> Vec<usize> {
    let instances = problem.piece_instances();
    let mut order: Vec<usize> = (0..instances.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = instances[a].dims.x * instances[a].dims.y;
        let fb = instances[b].dims.x * instances[b].dims.y;
        fb.partial_cmp(&fa).unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

/// Row cursor of the shelf packer.
#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    x: f64,
    row_y: f64,
    row_height: f64,
}

/// Cut positions registered while filling a block, deduplicated.
#[derive(Debug, Default)]
struct CutSet {
    horizontal: Vec<f64>,
    vertical: Vec<f64>,
}

impl CutSet {
    fn register(list: &mut Vec<f64>, position: f64) {
        if !list.iter().any(|p| (p - position).abs() < EPS) {
            list.push(position);
        }
    }

    fn into_pattern(self) -> CuttingPattern {
        CuttingPattern::new(self.horizontal, self.vertical)
    }
}

/// Fills one stock instance from `order`, marking placed instances.
///
/// Stops at the first piece that fits neither at the cursor nor at the start
/// of a new row. Pieces that would not fit even an empty block are skipped.
pub fn fill_block(
    problem: &Problem,
    stock: &StockInstance,
    order: &[usize],
    placed: &mut [bool],
    config: &GuillotineConfig,
) -> Layout {
    let instances = problem.piece_instances();
    let (length, width) = (stock.dims.x, stock.dims.y);
    let mut layout = Layout::new(stock);
    let mut cursor = Cursor::default();
    let mut cuts = CutSet::default();

    for &i in order {
        if placed[i] {
            continue;
        }
        let inst = &instances[i];
        if !fits_upright(inst, &stock.dims, config) {
            continue;
        }

        let try_at = |cursor: &Cursor| {
            footprint_rotations(config).iter().copied().find(|r| {
                let d = inst.oriented(*r);
                cursor.x + d.x <= length + EPS && cursor.row_y + d.y <= width + EPS
            })
        };

        let mut rotation = try_at(&cursor);
        if rotation.is_none() && cursor.row_height > 0.0 {
            cursor = Cursor {
                x: 0.0,
                row_y: cursor.row_y + cursor.row_height,
                row_height: 0.0,
            };
            rotation = try_at(&cursor);
        }
        let Some(rotation) = rotation else {
            break;
        };

        let dims = inst.oriented(rotation);
        let right = cursor.x + dims.x;
        let far = cursor.row_y + dims.y;
        if right < length - EPS {
            CutSet::register(&mut cuts.vertical, right);
        }
        if far < width - EPS {
            CutSet::register(&mut cuts.horizontal, far);
        }

        layout.push(Placement::new(
            inst,
            Vec3::new(cursor.x, cursor.row_y, 0.0),
            rotation,
        ));
        placed[i] = true;
        cursor.x = right;
        cursor.row_height = cursor.row_height.max(dims.y);
    }

    layout.cutting_pattern = Some(cuts.into_pattern());
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use foamcut_core::model::{Piece, StockBlock};

    fn run(pieces: Vec<Piece>, stock: StockBlock) -> Layout {
        let problem = Problem::new(pieces, vec![stock]).unwrap();
        let order = by_footprint_desc(&problem);
        let mut placed = vec![false; problem.piece_instances().len()];
        fill_block(
            &problem,
            &problem.stock_instances()[0],
            &order,
            &mut placed,
            &GuillotineConfig::default(),
        )
    }

    #[test]
    fn test_two_halves_single_vertical_cut() {
        let layout = run(
            vec![Piece::new("P", 50.0, 100.0, 100.0).with_quantity(2)],
            StockBlock::new("S", 100.0, 100.0, 100.0),
        );
        let pattern = layout.cutting_pattern.unwrap();
        assert_eq!(pattern.vertical_cuts, vec![50.0]);
        assert!(pattern.horizontal_cuts.is_empty());
        assert_eq!(pattern.total_cuts, 1);
    }

    #[test]
    fn test_new_row_registers_horizontal_cut() {
        let layout = run(
            vec![Piece::new("P", 60.0, 45.0, 10.0).with_quantity(2)],
            StockBlock::new("S", 100.0, 100.0, 10.0),
        );
        assert_eq!(layout.placements.len(), 2);
        let second = &layout.placements[1];
        assert_eq!((second.x(), second.y()), (0.0, 45.0));
        assert!(!second.rotated);

        let pattern = layout.cutting_pattern.unwrap();
        assert_eq!(pattern.horizontal_cuts, vec![45.0, 90.0]);
        assert_eq!(pattern.vertical_cuts, vec![60.0]);
    }

    #[test]
    fn test_rotated_footprint_fills_remaining_row() {
        let layout = run(
            vec![
                Piece::new("big", 70.0, 100.0, 10.0),
                Piece::new("small", 100.0, 30.0, 10.0),
            ],
            StockBlock::new("S", 100.0, 100.0, 10.0),
        );
        assert_eq!(layout.placements.len(), 2);
        assert!(layout.placements[1].rotated);
        assert_eq!(layout.placements[1].x(), 70.0);
        assert!((layout.utilization - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_too_tall_piece_is_skipped() {
        let layout = run(
            vec![
                Piece::new("tall", 90.0, 90.0, 50.0),
                Piece::new("flat", 10.0, 10.0, 10.0),
            ],
            StockBlock::new("S", 100.0, 100.0, 20.0),
        );
        assert_eq!(layout.placements.len(), 1);
        assert_eq!(layout.placements[0].piece_id, "flat");
    }

    #[test]
    fn test_too_wide_piece_does_not_stop_fill() {
        let layout = run(
            vec![
                Piece::new("wide", 150.0, 150.0, 10.0),
                Piece::new("small", 10.0, 10.0, 10.0).with_quantity(2),
            ],
            StockBlock::new("S", 100.0, 100.0, 100.0),
        );
        assert_eq!(layout.placements.len(), 2);
        assert!(layout.placements.iter().all(|p| p.piece_id == "small"));
    }
}
