//! Domain error taxonomy
//!
//! Recoverable caller errors (bad input, unknown asset, too little data) are
//! distinct variants; unexpected failures inside a simulation run are wrapped
//! with their cause.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed parameters rejected before any work begins
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Historical series too short to form a single training example
    #[error("insufficient data: {have} samples cannot fill a window of {need}")]
    InsufficientData { have: usize, need: usize },

    /// No market record exists for the requested asset
    #[error("no market data for asset '{0}'")]
    AssetNotFound(String),

    /// No simulation record with the requested id
    #[error("simulation {0} not found")]
    NotFound(i64),

    /// Unexpected failure during forecast/estimation, cause attached
    #[error("simulation failed")]
    SimulationFailed(#[from] anyhow::Error),
}

impl Error {
    /// Stable machine-readable kind for API consumers
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "InvalidInput",
            Error::InsufficientData { .. } => "InsufficientData",
            Error::AssetNotFound(_) => "AssetNotFound",
            Error::NotFound(_) => "NotFound",
            Error::SimulationFailed(_) => "SimulationFailed",
        }
    }
}
