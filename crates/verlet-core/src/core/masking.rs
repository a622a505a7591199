use itertools::Itertools;
use thiserror::Error;

/// Capability used to exclude partners of one atom from its asymmetric-unit pair search.
///
/// The engine owns one mask array per worker, initialised to `1.0`. Before searching pairs
/// for `atom` it calls [`apply_mask`](MaskingRules::apply_mask); every partner whose entry
/// is `<= 0.0` afterwards is skipped. [`remove_mask`](MaskingRules::remove_mask) must restore
/// exactly the entries that `apply_mask` changed.
pub trait MaskingRules: Send + Sync {
    fn apply_mask(&self, mask: &mut [f64], atom: usize);
    fn remove_mask(&self, mask: &mut [f64], atom: usize);

    /// Number of atoms the rules were built for, if they are tied to one.
    fn atom_count(&self) -> Option<usize> {
        None
    }
}

/// Masking rules for systems without exclusions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMasking;

impl MaskingRules for NoMasking {
    #[inline]
    fn apply_mask(&self, _mask: &mut [f64], _atom: usize) {}

    #[inline]
    fn remove_mask(&self, _mask: &mut [f64], _atom: usize) {}
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MaskError {
    #[error("Atom index {atom} is out of range for a system of {n_atoms} atoms")]
    AtomOutOfRange { atom: usize, n_atoms: usize },

    #[error("Atom {0} cannot be excluded from itself")]
    SelfExclusion(usize),
}

/// Symmetric exclusion lists, typically the 1-2 and 1-3 partners of a bonded topology.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionMask {
    partners: Vec<Vec<usize>>,
}

impl ExclusionMask {
    pub fn new(n_atoms: usize) -> Self {
        Self {
            partners: vec![Vec::new(); n_atoms],
        }
    }

    /// Excludes directly bonded atoms (1-2) and atoms sharing a bonded neighbor (1-3).
    pub fn from_bonds(n_atoms: usize, bonds: &[(usize, usize)]) -> Result<Self, MaskError> {
        let mut bonded: Vec<Vec<usize>> = vec![Vec::new(); n_atoms];
        for &(i, j) in bonds {
            for atom in [i, j] {
                if atom >= n_atoms {
                    return Err(MaskError::AtomOutOfRange { atom, n_atoms });
                }
            }
            if i == j {
                return Err(MaskError::SelfExclusion(i));
            }
            bonded[i].push(j);
            bonded[j].push(i);
        }

        let mut mask = Self::new(n_atoms);
        for &(i, j) in bonds {
            mask.exclude(i, j)?;
        }
        for neighbors in &bonded {
            for (&i, &k) in neighbors.iter().tuple_combinations() {
                if i != k {
                    mask.exclude(i, k)?;
                }
            }
        }
        Ok(mask)
    }

    pub fn exclude(&mut self, i: usize, j: usize) -> Result<(), MaskError> {
        let n_atoms = self.partners.len();
        for atom in [i, j] {
            if atom >= n_atoms {
                return Err(MaskError::AtomOutOfRange { atom, n_atoms });
            }
        }
        if i == j {
            return Err(MaskError::SelfExclusion(i));
        }
        if !self.partners[i].contains(&j) {
            self.partners[i].push(j);
            self.partners[j].push(i);
        }
        Ok(())
    }

    pub fn partners(&self, atom: usize) -> &[usize] {
        self.partners.get(atom).map_or([].as_slice(), |p| p.as_slice())
    }

    pub fn is_excluded(&self, i: usize, j: usize) -> bool {
        self.partners(i).contains(&j)
    }

    pub fn atom_count(&self) -> usize {
        self.partners.len()
    }
}

impl MaskingRules for ExclusionMask {
    fn apply_mask(&self, mask: &mut [f64], atom: usize) {
        for &partner in self.partners(atom) {
            mask[partner] = 0.0;
        }
    }

    fn remove_mask(&self, mask: &mut [f64], atom: usize) {
        for &partner in self.partners(atom) {
            mask[partner] = 1.0;
        }
    }

    fn atom_count(&self) -> Option<usize> {
        Some(self.partners.len())
    }
}
