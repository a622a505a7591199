//! # Core Module
//!
//! Collaborators consumed by the neighbor-list engine through narrow interfaces.
//!
//! - **Crystal Geometry** ([`crystal`]) - Unit cell metrics, fractional coordinates, the
//!   minimum-image convention and space-group symmetry operators
//! - **Masking Rules** ([`masking`]) - Per-atom exclusion of partners (e.g. bonded atoms)
//!   from the asymmetric-unit pair search

pub mod crystal;
pub mod masking;
