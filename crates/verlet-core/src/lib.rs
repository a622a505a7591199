//! # verletpp Core Library
//!
//! Parallel construction of Verlet neighbor lists for periodic crystals, including the
//! symmetry mates generated by the crystal's space group.
//!
//! ## Architectural Philosophy
//!
//! The library follows a layered architecture:
//!
//! - **[`core`]: The Foundation.** Geometry and masking collaborators: the [`core::crystal::Crystal`]
//!   trait (fractional conversion and minimum-image distances), a concrete
//!   [`core::crystal::UnitCell`] with space-group operators, and the
//!   [`core::masking::MaskingRules`] capability used to exclude bonded partners.
//!
//! - **[`engine`]: The Logic Core.** The stateful neighbor-list builder. It partitions the unit
//!   cell into sub-cells, buckets every atom of every symmetry copy, enumerates pairs in parallel
//!   with per-worker scratch state, and skips rebuilding while atoms stay within half the buffer
//!   of the positions that produced the current lists.
//!
//! - **[`utils`]: Support Code.** A brute-force reference search and seeded synthetic systems,
//!   used for verification and benchmarking.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use verletpp::core::crystal::UnitCell;
//! use verletpp::engine::config::NeighborListConfig;
//! use verletpp::engine::lists::VerletLists;
//! use verletpp::engine::neighbor_list::NeighborList;
//!
//! let crystal = Arc::new(UnitCell::cubic(30.0).unwrap());
//! let coordinates = vec![vec![1.0, 1.0, 1.0, 3.0, 1.0, 1.0, 20.0, 20.0, 20.0]];
//! let config = NeighborListConfig::new(7.0, 1.0);
//!
//! let mut builder = NeighborList::new(None, crystal, 3, config).unwrap();
//! let mut lists = VerletLists::new();
//! builder.build_list(&coordinates, &mut lists, true, false).unwrap();
//!
//! assert_eq!(lists.pair_count(0), 1);
//! ```

pub mod core;
pub mod engine;
pub mod utils;
