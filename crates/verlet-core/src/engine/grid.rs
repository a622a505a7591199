use super::error::NeighborListError;
use crate::core::crystal::Crystal;
use tracing::instrument;

/// Partition of the unit cell into `nA x nB x nC` sub-cells.
///
/// Each sub-cell is at least `(cutoff + buffer) / nEdge` wide along its axis, so all neighbors
/// of an atom lie in the block of `(2 nEdge + 1)` sub-cells centred on its own. An axis that
/// cannot hold a full block is not divided; its effective search edge is then zero and the
/// search along it degenerates to the whole cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPartition {
    divisions: [usize; 3],
    search_edge: [usize; 3],
}

impl GridPartition {
    pub fn new(widths: [f64; 3], total: f64, search_edge: [usize; 3]) -> Self {
        let mut divisions = [1; 3];
        let mut effective = [0; 3];
        for axis in 0..3 {
            let edge = search_edge[axis];
            let min_length = total / edge as f64;
            let n = (widths[axis] / min_length).floor() as usize;
            if n >= 2 * edge + 1 {
                divisions[axis] = n;
                effective[axis] = edge;
            }
        }
        Self {
            divisions,
            search_edge: effective,
        }
    }

    /// Sub-cells along a, b and c.
    pub fn divisions(&self) -> [usize; 3] {
        self.divisions
    }

    /// Effective half-width of the search block; zero along collapsed axes.
    pub fn search_edge(&self) -> [usize; 3] {
        self.search_edge
    }

    pub fn n_cells(&self) -> usize {
        self.divisions.iter().product()
    }

    pub fn neighbor_cell_count(&self) -> usize {
        self.search_edge.iter().map(|e| 2 * e + 1).product()
    }

    /// Cells visited for an asymmetric-unit atom: its own cell plus one of every mirrored pair.
    pub fn asymmetric_cell_count(&self) -> usize {
        self.neighbor_cell_count() / 2 + 1
    }

    /// Sub-cell of a wrapped fractional position in `[0, 1)`.
    #[inline]
    pub fn cell_coordinates(&self, frac: [f64; 3]) -> [usize; 3] {
        let mut cell = [0; 3];
        for axis in 0..3 {
            let n = self.divisions[axis];
            cell[axis] = ((frac[axis] * n as f64).floor() as usize).min(n - 1);
        }
        cell
    }

    #[inline]
    pub fn flatten(&self, [a, b, c]: [usize; 3]) -> usize {
        let [n_a, n_b, _] = self.divisions;
        a + b * n_a + c * n_a * n_b
    }

    /// Maps possibly out-of-range sub-cell indices back into the cell. The search block never
    /// spans more than one wrap, so a single addition or subtraction suffices.
    #[inline]
    pub fn image(&self, a: isize, b: isize, c: isize) -> usize {
        let wrap = |i: isize, n: usize| -> usize {
            let n = n as isize;
            if i >= n {
                (i - n) as usize
            } else if i < 0 {
                (i + n) as usize
            } else {
                i as usize
            }
        };
        let [n_a, n_b, n_c] = self.divisions;
        self.flatten([wrap(a, n_a), wrap(b, n_b), wrap(c, n_c)])
    }

    /// Canonical half of the search block around `center`, own cell first:
    /// `(a, b+1..b+e, c)`, then `(a, b-e..b+e, c+1..c+e)`, then `(a+1..a+e, b-e..b+e, c-e..c+e)`.
    /// For every non-zero block offset exactly one of `d` and `-d` is visited.
    pub fn half_block(&self, center: [usize; 3], cells: &mut Vec<usize>) {
        let [a, b, c] = center.map(|i| i as isize);
        let [e_a, e_b, e_c] = self.search_edge.map(|e| e as isize);

        cells.clear();
        cells.push(self.image(a, b, c));
        for bi in b + 1..=b + e_b {
            cells.push(self.image(a, bi, c));
        }
        for bi in b - e_b..=b + e_b {
            for ci in c + 1..=c + e_c {
                cells.push(self.image(a, bi, ci));
            }
        }
        for bi in b - e_b..=b + e_b {
            for ci in c - e_c..=c + e_c {
                for ai in a + 1..=a + e_a {
                    cells.push(self.image(ai, bi, ci));
                }
            }
        }
    }

    /// The whole search block around `center`.
    pub fn full_block(&self, center: [usize; 3], cells: &mut Vec<usize>) {
        let [a, b, c] = center.map(|i| i as isize);
        let [e_a, e_b, e_c] = self.search_edge.map(|e| e as isize);

        cells.clear();
        for ai in a - e_a..=a + e_a {
            for bi in b - e_b..=b + e_b {
                for ci in c - e_c..=c + e_c {
                    cells.push(self.image(ai, bi, ci));
                }
            }
        }
    }
}

/// Moves a finite fractional coordinate into `[0, 1)`.
#[inline]
pub fn wrap_unit(x: f64) -> f64 {
    let mut u = x - x.floor();
    if u >= 1.0 {
        u -= 1.0;
    }
    u
}

/// Counting-sort index of the atoms of one symmetry copy by sub-cell.
#[derive(Debug, Clone)]
pub struct CellBuckets {
    cell_index: Vec<usize>,
    cell_coordinates: Vec<[usize; 3]>,
    cell_offset: Vec<usize>,
    cell_count: Vec<usize>,
    cell_start: Vec<usize>,
    cell_list: Vec<usize>,
}

impl CellBuckets {
    pub fn new(n_atoms: usize, n_cells: usize) -> Self {
        Self {
            cell_index: vec![0; n_atoms],
            cell_coordinates: vec![[0; 3]; n_atoms],
            cell_offset: vec![0; n_atoms],
            cell_count: vec![0; n_cells],
            cell_start: vec![0; n_cells],
            cell_list: vec![0; n_atoms],
        }
    }

    /// Rebuilds the index from fractional coordinates `[a0, b0, c0, a1, ...]`.
    pub fn assign(
        &mut self,
        grid: &GridPartition,
        frac: &[f64],
        symmetry: usize,
    ) -> Result<(), NeighborListError> {
        self.cell_count.fill(0);

        for (atom, f) in frac.chunks_exact(3).enumerate() {
            if !(f[0].is_finite() && f[1].is_finite() && f[2].is_finite()) {
                return Err(NeighborListError::NonFiniteCoordinate { symmetry, atom });
            }
            let coords = grid.cell_coordinates([wrap_unit(f[0]), wrap_unit(f[1]), wrap_unit(f[2])]);
            let index = grid.flatten(coords);
            self.cell_index[atom] = index;
            self.cell_coordinates[atom] = coords;
            self.cell_offset[atom] = self.cell_count[index];
            self.cell_count[index] += 1;
        }

        let mut start = 0;
        for (cell_start, count) in self.cell_start.iter_mut().zip(&self.cell_count) {
            *cell_start = start;
            start += count;
        }

        for (atom, (&index, &offset)) in self.cell_index.iter().zip(&self.cell_offset).enumerate() {
            self.cell_list[self.cell_start[index] + offset] = atom;
        }
        Ok(())
    }

    #[inline]
    pub fn cell_index(&self, atom: usize) -> usize {
        self.cell_index[atom]
    }

    #[inline]
    pub fn cell_coordinates(&self, atom: usize) -> [usize; 3] {
        self.cell_coordinates[atom]
    }

    /// Position of `atom` within the run of its sub-cell in [`cell_list`](Self::cell_list).
    #[inline]
    pub fn offset(&self, atom: usize) -> usize {
        self.cell_offset[atom]
    }

    #[inline]
    pub fn atoms_in(&self, cell: usize) -> &[usize] {
        let start = self.cell_start[cell];
        &self.cell_list[start..start + self.cell_count[cell]]
    }

    /// All atoms ordered by sub-cell.
    pub fn cell_list(&self) -> &[usize] {
        &self.cell_list
    }

    pub fn cell_counts(&self) -> &[usize] {
        &self.cell_count
    }

    pub fn cell_starts(&self) -> &[usize] {
        &self.cell_start
    }
}

/// Buckets the atoms of every symmetry copy. Runs single-threaded; it is cheap next to the
/// pair search and must finish before the search reads the buckets.
#[instrument(level = "debug", skip_all, fields(n_copies = buckets.len()))]
pub(crate) fn assign_atoms_to_cells<C: AsRef<[f64]>>(
    crystal: &dyn Crystal,
    grid: &GridPartition,
    coordinates: &[C],
    frac: &mut [f64],
    buckets: &mut [CellBuckets],
) -> Result<(), NeighborListError> {
    for (symmetry, (xyz, bucket)) in coordinates.iter().zip(buckets.iter_mut()).enumerate() {
        crystal.to_fractional(xyz.as_ref(), frac);
        bucket.assign(grid, frac, symmetry)?;
    }
    Ok(())
}
