//! Unit cell geometry and the minimum-image convention.
//!
//! The neighbor-list engine only talks to the [`Crystal`] trait; [`UnitCell`] is the
//! concrete triclinic implementation shipped with the library.

mod symmetry;

pub use symmetry::{SpaceGroup, SymOp};

use nalgebra::{Matrix3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CrystalError {
    #[error("Cell edge '{axis}' must be positive and finite, got {value}")]
    InvalidEdge { axis: char, value: f64 },

    #[error("Cell angle '{name}' must lie strictly between 0 and 180 degrees, got {value}")]
    InvalidAngle { name: &'static str, value: f64 },

    #[error("Cell angles ({alpha}, {beta}, {gamma}) do not describe a cell with positive volume")]
    DegenerateCell { alpha: f64, beta: f64, gamma: f64 },

    #[error("Unknown space group: '{0}'")]
    UnknownSpaceGroup(String),

    #[error("Space group '{0}' must list the identity as its first operator")]
    MissingIdentity(String),
}

/// Geometry provider consumed by the neighbor-list engine.
///
/// Coordinates are flat `[x0, y0, z0, x1, y1, z1, ...]` arrays.
pub trait Crystal: Send + Sync {
    /// Cell edge lengths (a, b, c) in Angstroms.
    fn dimensions(&self) -> [f64; 3];

    /// Distances between opposite faces of the cell along each fractional axis. These bound
    /// how far a sphere can reach across the cell and size the sub-cell grid. For an
    /// orthorhombic cell they equal the edge lengths.
    fn interplanar_widths(&self) -> [f64; 3] {
        self.dimensions()
    }

    /// Number of symmetry operators, i.e. the number of symmetry copies including the
    /// asymmetric unit.
    fn symmetry_count(&self) -> usize;

    /// Converts `xyz.len() / 3` Cartesian positions to fractional coordinates.
    fn to_fractional(&self, xyz: &[f64], frac: &mut [f64]);

    /// Squared length of the minimum-image of the displacement `(dx, dy, dz)`.
    fn image(&self, dx: f64, dy: f64, dz: f64) -> f64;
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitCell {
    edges: [f64; 3],
    angles: [f64; 3],
    to_cartesian: Matrix3<f64>,
    to_fractional: Matrix3<f64>,
    space_group: SpaceGroup,
}

impl UnitCell {
    /// Builds a cell from edge lengths (Angstroms) and angles (degrees). The a-axis lies along
    /// x and the b-axis in the xy-plane.
    pub fn new(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
        space_group: SpaceGroup,
    ) -> Result<Self, CrystalError> {
        for (axis, value) in [('a', a), ('b', b), ('c', c)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CrystalError::InvalidEdge { axis, value });
            }
        }
        for (name, value) in [("alpha", alpha), ("beta", beta), ("gamma", gamma)] {
            if !value.is_finite() || value <= 0.0 || value >= 180.0 {
                return Err(CrystalError::InvalidAngle { name, value });
            }
        }

        let (cos_a, cos_b, cos_g) = (
            alpha.to_radians().cos(),
            beta.to_radians().cos(),
            gamma.to_radians().cos(),
        );
        let sin_g = gamma.to_radians().sin();
        let cy = (cos_a - cos_b * cos_g) / sin_g;
        let cz2 = 1.0 - cos_b * cos_b - cy * cy;
        if cz2 <= f64::EPSILON {
            return Err(CrystalError::DegenerateCell { alpha, beta, gamma });
        }

        #[rustfmt::skip]
        let to_cartesian = Matrix3::new(
            a,   b * cos_g, c * cos_b,
            0.0, b * sin_g, c * cy,
            0.0, 0.0,       c * cz2.sqrt(),
        );
        let to_fractional = to_cartesian
            .try_inverse()
            .ok_or(CrystalError::DegenerateCell { alpha, beta, gamma })?;

        Ok(Self {
            edges: [a, b, c],
            angles: [alpha, beta, gamma],
            to_cartesian,
            to_fractional,
            space_group,
        })
    }

    pub fn orthorhombic(
        a: f64,
        b: f64,
        c: f64,
        space_group: SpaceGroup,
    ) -> Result<Self, CrystalError> {
        Self::new(a, b, c, 90.0, 90.0, 90.0, space_group)
    }

    /// A cubic P1 box, the usual setting for periodic boundary conditions.
    pub fn cubic(edge: f64) -> Result<Self, CrystalError> {
        Self::orthorhombic(edge, edge, edge, SpaceGroup::p1())
    }

    pub fn angles(&self) -> [f64; 3] {
        self.angles
    }

    pub fn space_group(&self) -> &SpaceGroup {
        &self.space_group
    }

    #[inline]
    pub fn fractional(&self, cart: &Vector3<f64>) -> Vector3<f64> {
        self.to_fractional * cart
    }

    #[inline]
    pub fn cartesian(&self, frac: &Vector3<f64>) -> Vector3<f64> {
        self.to_cartesian * frac
    }

    /// Generates the coordinates of every symmetry copy from the asymmetric unit. Copy 0 is
    /// the asymmetric unit unchanged.
    pub fn expand_symmetry(&self, asymmetric_unit: &[f64]) -> Vec<Vec<f64>> {
        self.space_group
            .operators()
            .iter()
            .map(|op| {
                if op.is_identity() {
                    return asymmetric_unit.to_vec();
                }
                let mut copy = Vec::with_capacity(asymmetric_unit.len());
                for xyz in asymmetric_unit.chunks_exact(3) {
                    let frac = self.fractional(&Vector3::new(xyz[0], xyz[1], xyz[2]));
                    let cart = self.cartesian(&op.apply(&frac));
                    copy.extend_from_slice(&[cart.x, cart.y, cart.z]);
                }
                copy
            })
            .collect()
    }
}

impl Crystal for UnitCell {
    fn dimensions(&self) -> [f64; 3] {
        self.edges
    }

    fn interplanar_widths(&self) -> [f64; 3] {
        [
            1.0 / self.to_fractional.row(0).norm(),
            1.0 / self.to_fractional.row(1).norm(),
            1.0 / self.to_fractional.row(2).norm(),
        ]
    }

    fn symmetry_count(&self) -> usize {
        self.space_group.len()
    }

    fn to_fractional(&self, xyz: &[f64], frac: &mut [f64]) {
        for (cart, out) in xyz.chunks_exact(3).zip(frac.chunks_exact_mut(3)) {
            let f = self.fractional(&Vector3::new(cart[0], cart[1], cart[2]));
            out.copy_from_slice(f.as_slice());
        }
    }

    /// Wraps each fractional component of the displacement into [-0.5, 0.5]. Exact for
    /// orthorhombic cells; for strongly skewed cells it is the usual nearest-image
    /// approximation.
    fn image(&self, dx: f64, dy: f64, dz: f64) -> f64 {
        let mut f = self.fractional(&Vector3::new(dx, dy, dz));
        f.apply(|v| {
            let nearest = v.round();
            *v -= nearest;
        });
        self.cartesian(&f).norm_squared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_non_positive_edges() {
        assert!(matches!(
            UnitCell::orthorhombic(0.0, 10.0, 10.0, SpaceGroup::p1()),
            Err(CrystalError::InvalidEdge { axis: 'a', .. })
        ));
        assert!(matches!(
            UnitCell::orthorhombic(10.0, -3.0, 10.0, SpaceGroup::p1()),
            Err(CrystalError::InvalidEdge { axis: 'b', .. })
        ));
        assert!(matches!(
            UnitCell::orthorhombic(10.0, 10.0, f64::NAN, SpaceGroup::p1()),
            Err(CrystalError::InvalidEdge { axis: 'c', .. })
        ));
    }

    #[test]
    fn rejects_impossible_angles() {
        assert!(matches!(
            UnitCell::new(10.0, 10.0, 10.0, 90.0, 90.0, 180.0, SpaceGroup::p1()),
            Err(CrystalError::InvalidAngle { name: "gamma", .. })
        ));
        assert!(matches!(
            UnitCell::new(10.0, 10.0, 10.0, 120.0, 30.0, 30.0, SpaceGroup::p1()),
            Err(CrystalError::DegenerateCell { .. })
        ));
    }

    #[test]
    fn fractional_round_trip_in_triclinic_cell() {
        let cell = UnitCell::new(10.0, 12.0, 14.0, 80.0, 95.0, 105.0, SpaceGroup::p1()).unwrap();
        let cart = Vector3::new(3.0, -4.0, 7.5);
        let back = cell.cartesian(&cell.fractional(&cart));
        assert_relative_eq!(back, cart, epsilon = 1e-12);
    }

    #[test]
    fn to_fractional_converts_flat_arrays() {
        let cell = UnitCell::cubic(10.0).unwrap();
        let xyz = [5.0, 2.0, 8.0, -1.0, 11.0, 0.0];
        let mut frac = [0.0; 6];
        cell.to_fractional(&xyz, &mut frac);
        assert_relative_eq!(frac.as_slice(), [0.5, 0.2, 0.8, -0.1, 1.1, 0.0].as_slice());
    }

    #[test]
    fn image_uses_nearest_periodic_copy() {
        let cell = UnitCell::cubic(10.0).unwrap();
        assert_relative_eq!(cell.image(8.0, 0.0, 0.0), 4.0);
        assert_relative_eq!(cell.image(-8.0, -8.0, -8.0), 12.0);
        assert_relative_eq!(cell.image(21.0, 0.0, 0.0), 1.0);
        assert_relative_eq!(cell.image(1.0, 2.0, 2.0), 9.0);
    }

    #[test]
    fn interplanar_widths_match_edges_for_orthorhombic_cells() {
        let cell = UnitCell::orthorhombic(10.0, 20.0, 30.0, SpaceGroup::p1()).unwrap();
        let widths = cell.interplanar_widths();
        assert_relative_eq!(widths.as_slice(), [10.0, 20.0, 30.0].as_slice(), epsilon = 1e-12);
    }

    #[test]
    fn interplanar_widths_shrink_for_skewed_cells() {
        let cell = UnitCell::new(10.0, 10.0, 10.0, 90.0, 90.0, 60.0, SpaceGroup::p1()).unwrap();
        let widths = cell.interplanar_widths();
        assert!(widths[0] < 10.0);
        assert!(widths[1] < 10.0);
        assert_relative_eq!(widths[2], 10.0, epsilon = 1e-12);
    }

    #[test]
    fn expand_symmetry_applies_every_operator() {
        let cell = UnitCell::orthorhombic(10.0, 20.0, 30.0, SpaceGroup::p_1()).unwrap();
        let copies = cell.expand_symmetry(&[1.0, 2.0, 3.0]);
        assert_eq!(copies.len(), 2);
        assert_eq!(copies[0], vec![1.0, 2.0, 3.0]);
        assert_relative_eq!(copies[1].as_slice(), [-1.0, -2.0, -3.0].as_slice(), epsilon = 1e-12);
        assert_eq!(cell.symmetry_count(), 2);
    }
}
