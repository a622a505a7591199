use crate::core::crystal::UnitCell;
use nalgebra::Vector3;
use rand::prelude::*;

/// A random asymmetric unit in a unit cell, reproducible from its seed.
#[derive(Debug, Clone)]
pub struct SyntheticSystem {
    pub cell: UnitCell,
    pub asymmetric_unit: Vec<f64>,
    rng: StdRng,
}

impl SyntheticSystem {
    pub fn new(cell: UnitCell, n_atoms: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let asymmetric_unit = random_coordinates(&cell, n_atoms, &mut rng);
        Self {
            cell,
            asymmetric_unit,
            rng,
        }
    }

    pub fn atom_count(&self) -> usize {
        self.asymmetric_unit.len() / 3
    }

    /// Coordinates of every symmetry copy, asymmetric unit first.
    pub fn copies(&self) -> Vec<Vec<f64>> {
        self.cell.expand_symmetry(&self.asymmetric_unit)
    }

    /// Moves every atom by a random displacement of at most `max_step` per axis.
    pub fn drift(&mut self, max_step: f64) {
        perturb(&mut self.asymmetric_unit, max_step, &mut self.rng);
    }
}

/// Positions drawn uniformly over the cell volume.
pub fn random_coordinates(cell: &UnitCell, n_atoms: usize, rng: &mut impl Rng) -> Vec<f64> {
    (0..n_atoms)
        .flat_map(|_| {
            let frac = Vector3::new(rng.r#gen::<f64>(), rng.r#gen::<f64>(), rng.r#gen::<f64>());
            let cart = cell.cartesian(&frac);
            [cart.x, cart.y, cart.z]
        })
        .collect()
}

pub fn perturb(coordinates: &mut [f64], max_step: f64, rng: &mut impl Rng) {
    if max_step <= 0.0 {
        return;
    }
    for x in coordinates.iter_mut() {
        *x += rng.gen_range(-max_step..=max_step);
    }
}

/// Bonds of a linear chain `0-1-2-...`.
pub fn chain_bonds(n_atoms: usize) -> Vec<(usize, usize)> {
    (1..n_atoms).map(|i| (i - 1, i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crystal::{Crystal, SpaceGroup};

    #[test]
    fn same_seed_gives_the_same_system() {
        let cell = UnitCell::cubic(20.0).unwrap();
        let a = SyntheticSystem::new(cell.clone(), 25, 7);
        let b = SyntheticSystem::new(cell, 25, 7);
        assert_eq!(a.asymmetric_unit, b.asymmetric_unit);
        assert_eq!(a.atom_count(), 25);
    }

    #[test]
    fn atoms_lie_inside_the_cell() {
        let cell = UnitCell::new(15.0, 18.0, 21.0, 80.0, 95.0, 100.0, SpaceGroup::p1()).unwrap();
        let system = SyntheticSystem::new(cell, 40, 11);
        let mut frac = vec![0.0; system.asymmetric_unit.len()];
        system.cell.to_fractional(&system.asymmetric_unit, &mut frac);
        assert!(frac.iter().all(|f| (-1e-9..1.0 + 1e-9).contains(f)));
    }

    #[test]
    fn drift_is_bounded() {
        let cell = UnitCell::cubic(20.0).unwrap();
        let mut system = SyntheticSystem::new(cell, 10, 3);
        let before = system.asymmetric_unit.clone();
        system.drift(0.1);
        assert!(
            before
                .iter()
                .zip(&system.asymmetric_unit)
                .all(|(a, b)| (a - b).abs() <= 0.1)
        );
        assert_ne!(before, system.asymmetric_unit);
    }

    #[test]
    fn chain_bonds_link_neighbors() {
        assert_eq!(chain_bonds(4), vec![(0, 1), (1, 2), (2, 3)]);
        assert!(chain_bonds(1).is_empty());
    }
}
