//! Reference and test-support code that sits beside the engine: an exhaustive pair search to
//! check the cell-list lists against, and seeded random systems to run both on.

pub mod brute_force;
pub mod synthetic;
