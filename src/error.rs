//! Simulation error taxonomy

use thiserror::Error;

use crate::sim::ColliderHandle;

#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid stats or world parameters; never clamped
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A collider did not resolve to a pop (terrain or unknown)
    #[error("collider {0:?} does not belong to a pop")]
    LookupMiss(ColliderHandle),

    /// Zero-length direction handed to steering or bisection
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(&'static str),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
