use super::error::NeighborListError;
use super::lists::CellSpan;
use super::pairs::{AtomPairs, PairBuffer, PairSearch};
use rayon::ThreadPool;
use rayon::prelude::*;
use std::any::Any;
use std::ops::{Deref, DerefMut};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;
use std::thread;
use tracing::{instrument, warn};

/// Scratch owned by a single worker while it searches a run of atoms.
#[derive(Default)]
pub(crate) struct WorkerScratch {
    pub pairs: PairBuffer,
    /// Exclusion mask over all atoms; `1.0` means "may pair".
    pub mask: Vec<f64>,
    pub cells: Vec<usize>,
    pub spans: Vec<CellSpan>,
}

impl WorkerScratch {
    pub fn new(n_atoms: usize, pair_capacity: usize, block_len: usize) -> Self {
        Self {
            pairs: PairBuffer::with_capacity(pair_capacity),
            mask: vec![1.0; n_atoms],
            cells: Vec::with_capacity(block_len),
            spans: Vec::with_capacity(block_len),
        }
    }
}

/// Idle worker scratch kept across rebuilds.
///
/// rayon calls the `map_init` initializer once per split rather than once per thread, so each
/// split checks a scratch out of the pool and hands it back when the split is done. The pool
/// never holds more scratch than there were concurrently running splits.
#[derive(Default)]
pub(crate) struct ScratchPool {
    idle: Mutex<Vec<WorkerScratch>>,
}

impl ScratchPool {
    fn checkout(&self, n_atoms: usize, pair_capacity: usize, block_len: usize) -> PooledScratch<'_> {
        let reused = self.idle.lock().ok().and_then(|mut idle| idle.pop());
        PooledScratch {
            scratch: reused
                .unwrap_or_else(|| WorkerScratch::new(n_atoms, pair_capacity, block_len)),
            pool: self,
        }
    }

    #[cfg(test)]
    pub fn idle_count(&self) -> usize {
        self.idle.lock().map_or(0, |idle| idle.len())
    }
}

struct PooledScratch<'a> {
    scratch: WorkerScratch,
    pool: &'a ScratchPool,
}

impl Deref for PooledScratch<'_> {
    type Target = WorkerScratch;

    fn deref(&self) -> &WorkerScratch {
        &self.scratch
    }
}

impl DerefMut for PooledScratch<'_> {
    fn deref_mut(&mut self) -> &mut WorkerScratch {
        &mut self.scratch
    }
}

impl Drop for PooledScratch<'_> {
    fn drop(&mut self) {
        // A panicking worker may have left its mask applied.
        if thread::panicking() {
            return;
        }
        if let Ok(mut idle) = self.pool.idle.lock() {
            idle.push(std::mem::take(&mut self.scratch));
        }
    }
}

/// Runs the pair search for every atom, in `pool` if given and the global rayon pool
/// otherwise, drawing worker scratch from `scratch`. Results come back ordered by atom. Any
/// error or panic inside a worker fails the whole run.
#[instrument(level = "debug", skip_all, fields(n_atoms = n_atoms))]
pub(crate) fn search_all(
    search: &PairSearch<'_>,
    scratch: &ScratchPool,
    n_atoms: usize,
    pair_capacity: usize,
    chunk_size: usize,
    pool: Option<&ThreadPool>,
) -> Result<Vec<AtomPairs>, NeighborListError> {
    let block_len = search.grid.neighbor_cell_count();
    let job = || {
        (0..n_atoms)
            .into_par_iter()
            .with_min_len(chunk_size)
            .map_init(
                || scratch.checkout(n_atoms, pair_capacity, block_len),
                |worker, atom| search.search_atom(atom, worker),
            )
            .collect::<Result<Vec<_>, _>>()
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| match pool {
        Some(pool) => pool.install(job),
        None => job(),
    }));

    match outcome {
        Ok(result) => result,
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            warn!(%reason, "Worker panicked during pair search");
            Err(NeighborListError::BuildFailed { reason })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("worker panicked: {message}")
    } else {
        "worker panicked".to_string()
    }
}
