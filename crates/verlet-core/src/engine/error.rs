use super::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NeighborListError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Invalid crystal geometry: {0}")]
    InvalidGeometry(String),

    #[error(
        "Cutoff plus buffer ({total:.3} A) exceeds half the shortest cell width ({limit:.3} A)"
    )]
    CutoffTooLarge { total: f64, limit: f64 },

    #[error("Masking rules cover {found} atoms, but the builder was created for {expected}")]
    MaskSizeMismatch { expected: usize, found: usize },

    #[error("Expected coordinates for {expected} symmetry copies, got {found}")]
    SymmetryCountMismatch { expected: usize, found: usize },

    #[error(
        "Coordinates of symmetry copy {symmetry} have length {found}, expected {expected} (3 x atoms)"
    )]
    CoordinateShape {
        symmetry: usize,
        expected: usize,
        found: usize,
    },

    #[error("Non-finite fractional coordinate for atom {atom} in symmetry copy {symmetry}")]
    NonFiniteCoordinate { symmetry: usize, atom: usize },

    #[error("Neighbor list build failed: {reason}")]
    BuildFailed { reason: String },

    #[error("Failed to create worker thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
