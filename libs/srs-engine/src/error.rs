//! Error handling for the scheduling engine.

use thiserror::Error;

use crate::store::StoreError;

/// Engine error types.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Rating value outside {0, 3, 4, 5}; rejected before any mutation.
    #[error("invalid rating value: {0}")]
    InvalidRating(u8),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
