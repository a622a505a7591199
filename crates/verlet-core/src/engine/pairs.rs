use super::driver::WorkerScratch;
use super::error::NeighborListError;
use super::grid::{CellBuckets, GridPartition};
use super::lists::CellSpan;
use crate::core::crystal::Crystal;
use crate::core::masking::MaskingRules;

/// Growable pair buffer with an explicit capacity check before every write.
#[derive(Debug, Clone, Default)]
pub(crate) struct PairBuffer {
    pairs: Vec<usize>,
    len: usize,
    growths: usize,
}

impl PairBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pairs: vec![0; capacity.max(1)],
            len: 0,
            growths: 0,
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    #[inline]
    pub fn push(&mut self, atom: usize) {
        if self.len == self.pairs.len() {
            self.grow();
        }
        self.pairs[self.len] = atom;
        self.len += 1;
    }

    fn grow(&mut self) {
        let capacity = (self.pairs.len() * 2).max(1);
        self.pairs.resize(capacity, 0);
        self.growths += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn capacity(&self) -> usize {
        self.pairs.len()
    }

    /// Number of times the buffer has doubled since it was created.
    pub fn growths(&self) -> usize {
        self.growths
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.pairs[..self.len]
    }
}

/// Neighbors of one asymmetric-unit atom, one exact-length list per symmetry copy.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AtomPairs {
    pub atom: usize,
    pub neighbors: Vec<Vec<usize>>,
    pub spans: Option<Vec<Vec<CellSpan>>>,
    pub buffer_growths: usize,
}

/// Read-only view of everything the pair search needs. Shared by reference across workers.
pub(crate) struct PairSearch<'a> {
    pub crystal: &'a dyn Crystal,
    pub masking: &'a dyn MaskingRules,
    pub grid: &'a GridPartition,
    pub buckets: &'a [CellBuckets],
    pub coordinates: &'a [&'a [f64]],
    pub radius_squared: f64,
    pub cell_lists: bool,
}

impl PairSearch<'_> {
    /// Collects the neighbors of `atom` in every symmetry copy.
    ///
    /// Copy 0 visits the half block around the atom's sub-cell and, in its own sub-cell, only
    /// atoms bucketed after it; together these find each unordered pair exactly once. Mates
    /// visit the full block. Masking applies to copy 0 only and is always removed before
    /// returning, including on error.
    pub fn search_atom(
        &self,
        atom: usize,
        scratch: &mut WorkerScratch,
    ) -> Result<AtomPairs, NeighborListError> {
        let growths_before = scratch.pairs.growths();
        let center = self.buckets[0].cell_coordinates(atom);
        let symmetry_count = self.buckets.len();

        let mut neighbors = Vec::with_capacity(symmetry_count);
        let mut spans = self.cell_lists.then(|| Vec::with_capacity(symmetry_count));

        for symmetry in 0..symmetry_count {
            let result = if symmetry == 0 {
                self.grid.half_block(center, &mut scratch.cells);
                self.masking.apply_mask(&mut scratch.mask, atom);
                let result = self.scan_block(atom, symmetry, scratch);
                self.masking.remove_mask(&mut scratch.mask, atom);
                result
            } else {
                self.grid.full_block(center, &mut scratch.cells);
                self.scan_block(atom, symmetry, scratch)
            };
            result?;

            neighbors.push(scratch.pairs.as_slice().to_vec());
            if let Some(spans) = spans.as_mut() {
                spans.push(scratch.spans.clone());
            }
        }

        Ok(AtomPairs {
            atom,
            neighbors,
            spans,
            buffer_growths: scratch.pairs.growths() - growths_before,
        })
    }

    fn scan_block(
        &self,
        atom: usize,
        symmetry: usize,
        scratch: &mut WorkerScratch,
    ) -> Result<(), NeighborListError> {
        let WorkerScratch {
            pairs,
            mask,
            cells,
            spans,
        } = scratch;
        pairs.clear();
        spans.clear();

        let bucket = &self.buckets[symmetry];
        let xyz = self.coordinates[symmetry];
        let xi = &self.coordinates[0][3 * atom..3 * atom + 3];
        let asymmetric = symmetry == 0;

        for (k, &cell) in cells.iter().enumerate() {
            let candidates = bucket.atoms_in(cell);
            let first = if asymmetric && k == 0 {
                (bucket.offset(atom) + 1).min(candidates.len())
            } else {
                0
            };
            let start = pairs.len();

            for &j in &candidates[first..] {
                if asymmetric && mask[j] <= 0.0 {
                    continue;
                }
                let xj = &xyz[3 * j..3 * j + 3];
                let r2 = self
                    .crystal
                    .image(xi[0] - xj[0], xi[1] - xj[1], xi[2] - xj[2]);
                if !r2.is_finite() {
                    return Err(NeighborListError::BuildFailed {
                        reason: format!(
                            "non-finite distance between atom {atom} and atom {j} of symmetry copy {symmetry}"
                        ),
                    });
                }
                if r2 <= self.radius_squared {
                    pairs.push(j);
                }
            }

            if self.cell_lists {
                spans.push(CellSpan {
                    cell,
                    start,
                    end: pairs.len(),
                });
            }
        }
        Ok(())
    }
}
