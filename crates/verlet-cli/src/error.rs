use std::path::PathBuf;
use thiserror::Error;
use verletpp::core::crystal::CrystalError;
use verletpp::core::masking::MaskError;
use verletpp::engine::config::ConfigError;
use verletpp::engine::error::NeighborListError;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    NeighborList(#[from] NeighborListError),

    #[error("Invalid unit cell: {0}")]
    Crystal(#[from] CrystalError),

    #[error("Invalid exclusions: {0}")]
    Mask(#[from] MaskError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}
