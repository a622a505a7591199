use super::config::NeighborListConfig;
use super::driver::{self, ScratchPool};
use super::error::NeighborListError;
use super::grid::{self, CellBuckets, GridPartition};
use super::lists::{CellNeighborLists, ListStamp, VerletLists};
use super::motion::{MotionDetector, MotionState};
use super::pairs::{AtomPairs, PairSearch};
use super::report::BuildReport;
use crate::core::crystal::Crystal;
use crate::core::masking::{MaskingRules, NoMasking};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Relative slack on the half-width limit; cell widths come out of a matrix inverse.
const WIDTH_TOLERANCE: f64 = 1e-9;

static NEXT_BUILDER_ID: AtomicU64 = AtomicU64::new(0);

/// Result of a [`NeighborList::build_list`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    /// The lists were rebuilt from the given coordinates.
    Rebuilt(BuildReport),
    /// No atom moved far enough; the lists passed in were left as they are.
    Reused,
}

impl BuildOutcome {
    pub fn is_rebuilt(&self) -> bool {
        matches!(self, BuildOutcome::Rebuilt(_))
    }

    pub fn report(&self) -> Option<&BuildReport> {
        match self {
            BuildOutcome::Rebuilt(report) => Some(report),
            BuildOutcome::Reused => None,
        }
    }
}

/// Cell-list Verlet neighbor list builder for a fixed crystal and atom count.
///
/// Owns the sub-cell grid, the per-copy bucket arrays and the motion snapshot; the lists
/// themselves belong to the caller and are only written after a build has fully succeeded.
pub struct NeighborList {
    crystal: Arc<dyn Crystal>,
    masking: Arc<dyn MaskingRules>,
    config: NeighborListConfig,
    n_atoms: usize,
    symmetry_count: usize,
    grid: GridPartition,
    buckets: Vec<CellBuckets>,
    frac: Vec<f64>,
    motion: MotionDetector,
    cell_neighbor_lists: Option<CellNeighborLists>,
    scratch: ScratchPool,
    pool: Option<Arc<ThreadPool>>,
    id: u64,
    /// Stamp written into the caller's lists by the last successful rebuild.
    committed: Option<ListStamp>,
}

impl NeighborList {
    /// Validates the geometry against the list radius and sizes the sub-cell grid.
    ///
    /// `masking` defaults to [`NoMasking`]. Fails if the cell is degenerate, if the masking
    /// rules were built for a different number of atoms, or if cutoff plus buffer exceeds half
    /// the shortest distance between opposite cell faces, beyond which the minimum image no
    /// longer identifies a unique partner.
    pub fn new(
        masking: Option<Arc<dyn MaskingRules>>,
        crystal: Arc<dyn Crystal>,
        n_atoms: usize,
        config: NeighborListConfig,
    ) -> Result<Self, NeighborListError> {
        config.validate()?;

        if let Some(found) = masking.as_ref().and_then(|rules| rules.atom_count()) {
            if found != n_atoms {
                return Err(NeighborListError::MaskSizeMismatch {
                    expected: n_atoms,
                    found,
                });
            }
        }

        let dimensions = crystal.dimensions();
        if dimensions.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(NeighborListError::InvalidGeometry(format!(
                "cell edges must be positive and finite, got {dimensions:?}"
            )));
        }
        let widths = crystal.interplanar_widths();
        if widths.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(NeighborListError::InvalidGeometry(format!(
                "cell widths must be positive and finite, got {widths:?}"
            )));
        }
        let symmetry_count = crystal.symmetry_count();
        if symmetry_count == 0 {
            return Err(NeighborListError::InvalidGeometry(
                "the crystal must have at least one symmetry operator".to_string(),
            ));
        }

        let total = config.total();
        let limit = 0.5 * widths.iter().copied().fold(f64::INFINITY, f64::min);
        if total > limit * (1.0 + WIDTH_TOLERANCE) {
            return Err(NeighborListError::CutoffTooLarge { total, limit });
        }

        let grid = GridPartition::new(widths, total, config.search_edge);
        let buckets = (0..symmetry_count)
            .map(|_| CellBuckets::new(n_atoms, grid.n_cells()))
            .collect();

        let [n_a, n_b, n_c] = grid.divisions();
        info!(
            n_atoms,
            symmetry_count,
            cutoff = config.cutoff,
            buffer = config.buffer,
            "Neighbor list builder: unit cell partitioned into {} volumes ({}x{}x{}, {} atoms/cell); neighbors located in {} neighboring cells.",
            grid.n_cells(),
            n_a,
            n_b,
            n_c,
            n_atoms * symmetry_count / grid.n_cells(),
            grid.neighbor_cell_count(),
        );

        Ok(Self {
            crystal,
            masking: masking.unwrap_or_else(|| Arc::new(NoMasking)),
            motion: MotionDetector::new(config.buffer),
            config,
            n_atoms,
            symmetry_count,
            grid,
            buckets,
            frac: vec![0.0; 3 * n_atoms],
            cell_neighbor_lists: None,
            scratch: ScratchPool::default(),
            pool: None,
            id: NEXT_BUILDER_ID.fetch_add(1, Ordering::Relaxed),
            committed: None,
        })
    }

    /// Runs builds inside `pool` instead of the global rayon pool.
    pub fn with_thread_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Runs builds inside a dedicated pool of `num_threads` workers.
    pub fn with_threads(self, num_threads: usize) -> Result<Self, NeighborListError> {
        let pool = ThreadPoolBuilder::new().num_threads(num_threads).build()?;
        Ok(self.with_thread_pool(Arc::new(pool)))
    }

    /// Brings `lists` up to date with `coordinates`, one flat `3 * n_atoms` array per symmetry
    /// copy with the asymmetric unit first.
    ///
    /// The lists are rebuilt when `force_rebuild` is set, on the first call, after a failed
    /// build, when `lists` was not filled by this builder's most recent rebuild, or when some
    /// asymmetric-unit atom moved more than half the buffer since the last rebuild. Otherwise nothing is
    /// touched and [`BuildOutcome::Reused`] is returned. With `verbose` the build summary is
    /// logged at INFO.
    ///
    /// On error `lists` is left exactly as it was and the next call rebuilds.
    #[instrument(skip_all, name = "neighbor_list_build", fields(force = force_rebuild))]
    pub fn build_list<C: AsRef<[f64]>>(
        &mut self,
        coordinates: &[C],
        lists: &mut VerletLists,
        force_rebuild: bool,
        verbose: bool,
    ) -> Result<BuildOutcome, NeighborListError> {
        self.check_coordinates(coordinates)?;
        let asymmetric_unit = coordinates[0].as_ref();

        let owned = self.committed.is_some() && lists.stamp() == self.committed;
        let rebuild = !owned
            || self
                .motion
                .needs_rebuild(self.crystal.as_ref(), asymmetric_unit, force_rebuild);
        if !rebuild {
            return Ok(BuildOutcome::Reused);
        }

        match self.rebuild(coordinates, lists) {
            Ok(report) => {
                self.motion.record(asymmetric_unit);
                if verbose {
                    info!("Neighbor list rebuilt.\n{report}");
                } else {
                    debug!(
                        asymmetric_pairs = report.asymmetric_pairs,
                        mate_pairs = report.mate_pairs,
                        seconds = report.total_time().as_secs_f64(),
                        "Neighbor list rebuilt."
                    );
                }
                Ok(BuildOutcome::Rebuilt(report))
            }
            Err(error) => {
                self.motion.invalidate();
                warn!(%error, "Neighbor list build failed; previous lists are kept.");
                Err(error)
            }
        }
    }

    fn check_coordinates<C: AsRef<[f64]>>(
        &self,
        coordinates: &[C],
    ) -> Result<(), NeighborListError> {
        if coordinates.len() != self.symmetry_count {
            return Err(NeighborListError::SymmetryCountMismatch {
                expected: self.symmetry_count,
                found: coordinates.len(),
            });
        }
        let expected = 3 * self.n_atoms;
        for (symmetry, xyz) in coordinates.iter().enumerate() {
            let found = xyz.as_ref().len();
            if found != expected {
                return Err(NeighborListError::CoordinateShape {
                    symmetry,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }

    fn rebuild<C: AsRef<[f64]>>(
        &mut self,
        coordinates: &[C],
        lists: &mut VerletLists,
    ) -> Result<BuildReport, NeighborListError> {
        let assignment_start = Instant::now();
        grid::assign_atoms_to_cells(
            self.crystal.as_ref(),
            &self.grid,
            coordinates,
            &mut self.frac,
            &mut self.buckets,
        )?;
        let assignment_time = assignment_start.elapsed();

        let search_start = Instant::now();
        let xyz: Vec<&[f64]> = coordinates.iter().map(AsRef::as_ref).collect();
        let total = self.config.total();
        let search = PairSearch {
            crystal: self.crystal.as_ref(),
            masking: self.masking.as_ref(),
            grid: &self.grid,
            buckets: &self.buckets,
            coordinates: &xyz,
            radius_squared: total * total,
            cell_lists: self.config.cell_lists,
        };
        let results = driver::search_all(
            &search,
            &self.scratch,
            self.n_atoms,
            self.config.pair_capacity,
            self.config.chunk_size,
            self.pool.as_deref(),
        )?;

        let (symmetry_count, n_atoms) = (self.symmetry_count, self.n_atoms);
        lists.ensure_shape(symmetry_count, n_atoms);
        let mut cell_lists = if self.config.cell_lists {
            Some(
                self.cell_neighbor_lists
                    .get_or_insert_with(|| CellNeighborLists::with_shape(symmetry_count, n_atoms)),
            )
        } else {
            None
        };
        let mut asymmetric_pairs = 0;
        let mut mate_pairs = 0;
        let mut buffer_growths = 0;

        for AtomPairs {
            atom,
            neighbors,
            spans,
            buffer_growths: growths,
        } in results
        {
            buffer_growths += growths;
            for (symmetry, list) in neighbors.into_iter().enumerate() {
                if symmetry == 0 {
                    asymmetric_pairs += list.len();
                } else {
                    mate_pairs += list.len();
                }
                lists.set(symmetry, atom, list);
            }
            if let (Some(cells), Some(spans)) = (cell_lists.as_deref_mut(), spans) {
                for (symmetry, spans) in spans.into_iter().enumerate() {
                    cells.set(symmetry, atom, spans);
                }
            }
        }

        let stamp = ListStamp {
            builder: self.id,
            generation: self.committed.map_or(1, |stamp| stamp.generation + 1),
        };
        lists.set_stamp(stamp);
        self.committed = Some(stamp);

        Ok(BuildReport {
            cutoff: self.config.cutoff,
            assignment_time,
            search_time: search_start.elapsed(),
            symmetry_count: self.symmetry_count,
            asymmetric_pairs,
            mate_pairs,
            buffer_growths,
        })
    }

    /// Number of sub-cells the unit cell is divided into.
    pub fn cell_count(&self) -> usize {
        self.grid.n_cells()
    }

    /// Bucketed atoms of every symmetry copy as of the last successful assignment.
    pub fn cell_atom_lists(&self) -> &[CellBuckets] {
        &self.buckets
    }

    pub fn grid(&self) -> &GridPartition {
        &self.grid
    }

    /// Per-sub-cell partition of the last built lists, if enabled in the configuration.
    pub fn cell_neighbor_lists(&self) -> Option<&CellNeighborLists> {
        self.cell_neighbor_lists.as_ref()
    }

    pub fn symmetry_count(&self) -> usize {
        self.symmetry_count
    }

    pub fn atom_count(&self) -> usize {
        self.n_atoms
    }

    pub fn config(&self) -> &NeighborListConfig {
        &self.config
    }

    pub fn motion_state(&self) -> &MotionState {
        self.motion.state()
    }
}
