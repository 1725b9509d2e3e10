//! Expanded problem arena.
//!
//! Each unit of piece quantity becomes one [`PieceInstance`] and each unit of
//! stock quantity one [`StockInstance`]. Strategies address both by index and
//! never mutate the arena, so a `Problem` can be cloned into independent
//! workers freely.

use crate::geometry::{self, rotations, Rotation, Vec3};
use crate::model::{Piece, StockBlock};
use crate::{Error, Result};
use std::collections::HashSet;

/// One unit of a piece's quantity.
#[derive(Debug, Clone)]
pub struct PieceInstance {
    /// Index in [`Problem::piece_instances`].
    pub index: usize,
    /// Index of the source piece.
    pub piece_index: usize,
    /// Ordinal within the source piece's quantity.
    pub ordinal: usize,
    /// Instance id, `"{piece_id}_{ordinal}"`.
    pub id: String,
    /// Source piece id.
    pub piece_id: String,
    /// Unrotated dimensions.
    pub dims: Vec3,
    /// Volume.
    pub volume: f64,
    /// Distinct orientations of this cuboid.
    pub rotations: Vec<Rotation>,
}

impl PieceInstance {
    /// Dimensions under `rotation`.
    pub fn oriented(&self, rotation: Rotation) -> Vec3 {
        rotation.apply(&self.dims)
    }

    /// Canonical rotations under which this instance fits `container`.
    pub fn fitting_rotations(&self, container: &Vec3) -> Vec<Rotation> {
        self.rotations
            .iter()
            .copied()
            .filter(|r| geometry::fits_dims(&self.oriented(*r), container))
            .collect()
    }
}

/// One available unit of a stock block.
#[derive(Debug, Clone)]
pub struct StockInstance {
    /// Index in [`Problem::stock_instances`].
    pub index: usize,
    /// Index of the source stock block.
    pub block_index: usize,
    /// Ordinal within the block's quantity.
    pub ordinal: usize,
    /// Source stock id.
    pub stock_id: String,
    /// Source stock label.
    pub label: String,
    /// Dimensions.
    pub dims: Vec3,
    /// Volume.
    pub volume: f64,
    /// Unit price.
    pub price: Option<f64>,
}

/// Validated and expanded optimization input.
#[derive(Debug, Clone)]
pub struct Problem {
    pieces: Vec<Piece>,
    stock: Vec<StockBlock>,
    piece_instances: Vec<PieceInstance>,
    stock_instances: Vec<StockInstance>,
}

impl Problem {
    /// Validates the inputs and expands quantities into instances.
    pub fn new(pieces: Vec<Piece>, stock: Vec<StockBlock>) -> Result<Self> {
        if pieces.is_empty() {
            return Err(Error::invalid("piece list is empty"));
        }
        if stock.is_empty() {
            return Err(Error::invalid("stock list is empty"));
        }

        let mut ids = HashSet::new();
        for piece in &pieces {
            piece.validate()?;
            if !ids.insert(piece.id.as_str()) {
                return Err(Error::invalid(format!("duplicate piece id '{}'", piece.id)));
            }
        }
        let mut ids = HashSet::new();
        for block in &stock {
            block.validate()?;
            if !ids.insert(block.id.as_str()) {
                return Err(Error::invalid(format!("duplicate stock id '{}'", block.id)));
            }
        }

        let mut piece_instances = Vec::new();
        for (piece_index, piece) in pieces.iter().enumerate() {
            let dims = piece.dims();
            let rots = rotations(&dims);
            for ordinal in 0..piece.quantity {
                piece_instances.push(PieceInstance {
                    index: piece_instances.len(),
                    piece_index,
                    ordinal,
                    id: format!("{}_{}", piece.id, ordinal),
                    piece_id: piece.id.clone(),
                    dims,
                    volume: piece.volume(),
                    rotations: rots.clone(),
                });
            }
        }

        let mut stock_instances = Vec::new();
        for (block_index, block) in stock.iter().enumerate() {
            for ordinal in 0..block.quantity {
                stock_instances.push(StockInstance {
                    index: stock_instances.len(),
                    block_index,
                    ordinal,
                    stock_id: block.id.clone(),
                    label: block.label.clone(),
                    dims: block.dims(),
                    volume: block.volume(),
                    price: block.price,
                });
            }
        }

        log::debug!(
            "Expanded {} pieces into {} instances over {} stock instances",
            pieces.len(),
            piece_instances.len(),
            stock_instances.len()
        );
        Ok(Self {
            pieces,
            stock,
            piece_instances,
            stock_instances,
        })
    }

    /// Source pieces.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Source stock blocks.
    pub fn stock(&self) -> &[StockBlock] {
        &self.stock
    }

    /// Expanded piece instances.
    pub fn piece_instances(&self) -> &[PieceInstance] {
        &self.piece_instances
    }

    /// Expanded stock instances.
    pub fn stock_instances(&self) -> &[StockInstance] {
        &self.stock_instances
    }

    /// Total number of piece instances.
    pub fn total_pieces(&self) -> usize {
        self.piece_instances.len()
    }

    /// Σ piece quantities × number of stock blocks.
    pub fn complexity(&self) -> usize {
        self.piece_instances.len() * self.stock.len()
    }

    /// Returns true if any stock block carries a price.
    pub fn has_prices(&self) -> bool {
        self.stock.iter().any(|s| s.price.is_some())
    }

    /// Returns true if the instance fits some stock instance under some rotation.
    pub fn fits_anywhere(&self, instance: &PieceInstance) -> bool {
        self.stock.iter().any(|block| {
            let container = block.dims();
            instance
                .rotations
                .iter()
                .any(|r| geometry::fits_dims(&instance.oriented(*r), &container))
        })
    }

    /// Splits instance indices into (placeable, never placeable).
    pub fn placeable_split(&self) -> (Vec<usize>, Vec<usize>) {
        self.piece_instances
            .iter()
            .map(|inst| inst.index)
            .partition(|&i| self.fits_anywhere(&self.piece_instances[i]))
    }

    /// Instance indices ordered by descending volume (stable on ties).
    pub fn by_volume_desc(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.piece_instances.len()).collect();
        order.sort_by(|&a, &b| {
            self.piece_instances[b]
                .volume
                .partial_cmp(&self.piece_instances[a].volume)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock() -> Vec<StockBlock> {
        vec![StockBlock::new("S", 100.0, 100.0, 100.0).with_quantity(2)]
    }

    #[test]
    fn test_expansion() {
        let pieces = vec![
            Piece::new("A", 10.0, 20.0, 30.0).with_quantity(3),
            Piece::new("B", 10.0, 10.0, 10.0),
        ];
        let problem = Problem::new(pieces, stock()).unwrap();

        assert_eq!(problem.total_pieces(), 4);
        assert_eq!(problem.stock_instances().len(), 2);
        assert_eq!(problem.piece_instances()[2].id, "A_2");
        assert_eq!(problem.piece_instances()[3].piece_index, 1);
        assert_eq!(problem.piece_instances()[0].rotations.len(), 6);
        assert_eq!(problem.piece_instances()[3].rotations.len(), 1);
        assert_eq!(problem.stock_instances()[1].ordinal, 1);
        assert_eq!(problem.complexity(), 4);
    }

    #[test]
    fn test_rejects_empty_lists() {
        assert!(matches!(
            Problem::new(vec![], stock()),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            Problem::new(vec![Piece::new("A", 1.0, 1.0, 1.0)], vec![]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let pieces = vec![
            Piece::new("A", 1.0, 1.0, 1.0),
            Piece::new("A", 2.0, 2.0, 2.0),
        ];
        assert!(Problem::new(pieces, stock()).is_err());
    }

    #[test]
    fn test_placeable_split() {
        let pieces = vec![
            Piece::new("fits", 150.0, 50.0, 50.0).with_quantity(2),
            Piece::new("too_big", 150.0, 150.0, 10.0),
        ];
        let problem = Problem::new(pieces, vec![StockBlock::new("S", 200.0, 100.0, 100.0)])
            .unwrap();
        let (placeable, unplaceable) = problem.placeable_split();
        assert_eq!(placeable, vec![0, 1]);
        assert_eq!(unplaceable, vec![2]);
    }

    #[test]
    fn test_volume_order() {
        let pieces = vec![
            Piece::new("small", 1.0, 1.0, 1.0),
            Piece::new("large", 5.0, 5.0, 5.0),
            Piece::new("mid", 2.0, 2.0, 2.0),
        ];
        let problem = Problem::new(pieces, stock()).unwrap();
        assert_eq!(problem.by_volume_desc(), vec![1, 2, 0]);
    }
}
