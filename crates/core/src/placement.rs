//! Placement of one piece instance inside a stock instance.

use crate::geometry::{self, Aabb3, Rotation, Vec3};
use crate::problem::PieceInstance;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A piece instance bound to a position and rotation within a layout.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Placement {
    /// Source piece id.
    pub piece_id: String,

    /// Instance id (`"{piece_id}_{ordinal}"`).
    pub instance_id: String,

    /// Index of the instance in the problem arena.
    pub instance_index: usize,

    /// Minimum corner within the stock instance.
    pub position: Vec3,

    /// Orientation applied to the piece.
    pub rotation: Rotation,

    /// Oriented dimensions (x, y, z extents).
    pub dims: Vec3,

    /// Whether the rotation differs from the identity.
    pub rotated: bool,
}

impl Placement {
    /// Places `instance` at `position` under `rotation`.
    pub fn new(instance: &PieceInstance, position: Vec3, rotation: Rotation) -> Self {
        Self {
            piece_id: instance.piece_id.clone(),
            instance_id: instance.id.clone(),
            instance_index: instance.index,
            position,
            rotation,
            dims: instance.oriented(rotation),
            rotated: !rotation.is_identity(),
        }
    }

    /// Bounding box occupied by the piece.
    pub fn aabb(&self) -> Aabb3 {
        Aabb3::from_origin_size(self.position, self.dims)
    }

    /// Volume of the piece.
    pub fn volume(&self) -> f64 {
        geometry::volume(&self.dims)
    }

    /// Returns the x coordinate.
    pub fn x(&self) -> f64 {
        self.position.x
    }

    /// Returns the y coordinate.
    pub fn y(&self) -> f64 {
        self.position.y
    }

    /// Returns the z coordinate.
    pub fn z(&self) -> f64 {
        self.position.z
    }
}
