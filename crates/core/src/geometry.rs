//! Axis-aligned geometry kernel.
//!
//! Everything the strategies know about space lives here: oriented cuboid
//! dimensions, the canonical rotation set, and the two predicates every
//! layout is checked against ([`overlaps`] and [`fits`]).

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 3D vector of `f64` (positions and dimensions).
pub type Vec3 = Vector3<f64>;

/// Tolerance used by every geometric comparison.
pub const EPS: f64 = 1e-9;

/// One of the six axis permutations of a cuboid.
///
/// The name lists which source dimension (Length, Width, Height) ends up on
/// the x, y and z axes respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Rotation {
    /// Identity.
    #[default]
    Lwh,
    /// Quarter turn about the vertical axis.
    Wlh,
    /// Quarter turn about the length axis.
    Lhw,
    /// Quarter turn about the width axis.
    Hwl,
    /// Cyclic permutation (w, h, l).
    Whl,
    /// Cyclic permutation (h, l, w).
    Hlw,
}

impl Rotation {
    /// All six permutations in search order.
    pub const ALL: [Rotation; 6] = [
        Rotation::Lwh,
        Rotation::Wlh,
        Rotation::Lhw,
        Rotation::Hwl,
        Rotation::Whl,
        Rotation::Hlw,
    ];

    /// Rotations that keep the height on the z axis.
    pub const UPRIGHT: [Rotation; 2] = [Rotation::Lwh, Rotation::Wlh];

    /// Source axis placed on x, y and z.
    pub fn axes(self) -> [usize; 3] {
        match self {
            Rotation::Lwh => [0, 1, 2],
            Rotation::Wlh => [1, 0, 2],
            Rotation::Lhw => [0, 2, 1],
            Rotation::Hwl => [2, 1, 0],
            Rotation::Whl => [1, 2, 0],
            Rotation::Hlw => [2, 0, 1],
        }
    }

    /// Applies the permutation to a dimension vector.
    pub fn apply(self, dims: &Vec3) -> Vec3 {
        let [a, b, c] = self.axes();
        Vec3::new(dims[a], dims[b], dims[c])
    }

    /// Position of this rotation in [`Rotation::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`Rotation::index`].
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns true for the identity rotation.
    pub fn is_identity(self) -> bool {
        self == Rotation::Lwh
    }
}

/// Returns the distinct orientations of a cuboid.
///
/// Permutations that produce the same oriented dimensions (because two or
/// three sides are equal) are collapsed onto the first one in
/// [`Rotation::ALL`] order, so a cube yields exactly one rotation.
pub fn rotations(dims: &Vec3) -> Vec<Rotation> {
    let mut seen: Vec<Vec3> = Vec::with_capacity(6);
    let mut out = Vec::with_capacity(6);
    for rotation in Rotation::ALL {
        let oriented = rotation.apply(dims);
        if seen.iter().any(|s| approx_eq(s, &oriented)) {
            continue;
        }
        seen.push(oriented);
        out.push(rotation);
    }
    out
}

fn approx_eq(a: &Vec3, b: &Vec3) -> bool {
    (a - b).iter().all(|d| d.abs() <= EPS)
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb3 {
    /// Creates a box from its corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates a box from an origin and a size.
    pub fn from_origin_size(origin: Vec3, size: Vec3) -> Self {
        Self {
            min: origin,
            max: origin + size,
        }
    }

    /// Edge lengths.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Enclosed volume.
    pub fn volume(&self) -> f64 {
        let s = self.size();
        s.x * s.y * s.z
    }

    /// Shared interior volume test; touching faces do not count.
    pub fn overlaps(&self, other: &Aabb3) -> bool {
        (0..3).all(|i| self.min[i] < other.max[i] - EPS && other.min[i] < self.max[i] - EPS)
    }

    /// Returns true if `other` lies entirely inside this box.
    pub fn contains(&self, other: &Aabb3) -> bool {
        (0..3).all(|i| other.min[i] >= self.min[i] - EPS && other.max[i] <= self.max[i] + EPS)
    }
}

/// Returns true iff the two boxes share interior volume.
///
/// Intervals are half-open: boxes that only touch at a face, edge or corner
/// do not overlap.
pub fn overlaps(a: &Aabb3, b: &Aabb3) -> bool {
    a.overlaps(b)
}

/// Returns true iff a box of `size` placed at `origin` lies inside a
/// container of `container` dimensions anchored at the origin.
pub fn fits(origin: &Vec3, size: &Vec3, container: &Vec3) -> bool {
    (0..3).all(|i| origin[i] >= -EPS && origin[i] + size[i] <= container[i] + EPS)
}

/// Returns true iff `size` fits in `container` at all (at the origin).
pub fn fits_dims(size: &Vec3, container: &Vec3) -> bool {
    fits(&Vec3::zeros(), size, container)
}

/// Volume of a dimension vector.
pub fn volume(dims: &Vec3) -> f64 {
    dims.x * dims.y * dims.z
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cube(origin: (f64, f64, f64), side: f64) -> Aabb3 {
        Aabb3::from_origin_size(
            Vec3::new(origin.0, origin.1, origin.2),
            Vec3::new(side, side, side),
        )
    }

    #[test]
    fn test_overlap_interior() {
        assert!(overlaps(&cube((0.0, 0.0, 0.0), 10.0), &cube((5.0, 5.0, 5.0), 10.0)));
    }

    #[test]
    fn test_touching_faces_do_not_overlap() {
        let a = cube((0.0, 0.0, 0.0), 10.0);
        assert!(!overlaps(&a, &cube((10.0, 0.0, 0.0), 10.0)));
        assert!(!overlaps(&a, &cube((10.0, 10.0, 0.0), 10.0)));
        assert!(!overlaps(&a, &cube((10.0, 10.0, 10.0), 10.0)));
        assert!(!overlaps(&a, &cube((0.0, 0.0, 10.0), 10.0)));
    }

    #[test]
    fn test_separated_on_one_axis() {
        let a = cube((0.0, 0.0, 0.0), 10.0);
        let b = cube((5.0, 5.0, 20.0), 10.0);
        assert!(!overlaps(&a, &b));
        assert!(!overlaps(&b, &a));
    }

    #[test]
    fn test_fits() {
        let container = Vec3::new(100.0, 50.0, 20.0);
        assert!(fits(&Vec3::zeros(), &Vec3::new(100.0, 50.0, 20.0), &container));
        assert!(fits(&Vec3::new(50.0, 0.0, 0.0), &Vec3::new(50.0, 50.0, 20.0), &container));
        assert!(!fits(&Vec3::new(50.1, 0.0, 0.0), &Vec3::new(50.0, 50.0, 20.0), &container));
        assert!(!fits(&Vec3::new(-1.0, 0.0, 0.0), &Vec3::new(1.0, 1.0, 1.0), &container));
    }

    #[test]
    fn test_rotation_dedup() {
        assert_eq!(rotations(&Vec3::new(10.0, 10.0, 10.0)), vec![Rotation::Lwh]);
        assert_eq!(rotations(&Vec3::new(10.0, 10.0, 20.0)).len(), 3);
        assert_eq!(rotations(&Vec3::new(10.0, 20.0, 30.0)).len(), 6);
    }

    #[test]
    fn test_rotation_apply() {
        let dims = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Rotation::Lwh.apply(&dims), dims);
        assert_eq!(Rotation::Wlh.apply(&dims), Vec3::new(2.0, 1.0, 3.0));
        assert_eq!(Rotation::Hlw.apply(&dims), Vec3::new(3.0, 1.0, 2.0));
        for rotation in Rotation::ALL {
            assert_relative_eq!(volume(&rotation.apply(&dims)), 6.0);
            assert_eq!(Rotation::from_index(rotation.index()), Some(rotation));
        }
    }

    #[test]
    fn test_aabb_contains() {
        let outer = cube((0.0, 0.0, 0.0), 10.0);
        assert!(outer.contains(&cube((0.0, 0.0, 0.0), 10.0)));
        assert!(outer.contains(&cube((2.0, 2.0, 2.0), 5.0)));
        assert!(!outer.contains(&cube((6.0, 0.0, 0.0), 5.0)));
        assert_relative_eq!(outer.volume(), 1000.0);
    }
}
