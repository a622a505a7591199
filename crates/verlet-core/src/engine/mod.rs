//! # Engine Module
//!
//! The neighbor-list engine: everything between a set of coordinates and the per-atom Verlet
//! lists consumed by a pairwise energy loop.
//!
//! ## Overview
//!
//! A build runs in three phases. The grid assigner buckets the atoms of every symmetry copy
//! into sub-cells of the unit cell, the pair enumerator walks the block of sub-cells around
//! each atom collecting partners within the cutoff plus buffer, and the parallel driver spreads
//! that walk over a rayon pool and merges the per-atom results. A motion detector in front of
//! all three skips the build while no atom has drifted more than half the buffer.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Cutoff, buffer, search block size and tuning knobs
//! - **Grid** ([`grid`]) - Sub-cell partition and counting-sort buckets
//! - **Pairs** ([`pairs`]) - Per-atom pair search with masking
//! - **Driver** ([`driver`]) - Worker scratch, parallel fan-out, failure capture
//! - **Motion** ([`motion`]) - Rebuild-on-motion state machine
//! - **Lists** ([`lists`]) - Output containers
//! - **Report** ([`report`]) - Build statistics and the verbose summary
//! - **Error Handling** ([`error`]) - Engine error taxonomy
//!
//! [`neighbor_list::NeighborList`] ties these together and is the only type most callers need.

pub mod config;
pub(crate) mod driver;
pub mod error;
pub mod grid;
pub mod lists;
pub mod motion;
pub mod neighbor_list;
pub(crate) mod pairs;
pub mod report;
