//! Error types for RLE volume operations

use thiserror::Error;

/// Main error type for volume operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VolumeError {
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Run line invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Specialized Result type for volume operations
pub type Result<T> = std::result::Result<T, VolumeError>;

impl From<serde_json::Error> for VolumeError {
    fn from(err: serde_json::Error) -> Self {
        VolumeError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for VolumeError {
    fn from(err: ndarray::ShapeError) -> Self {
        VolumeError::InvalidDimensions(err.to_string())
    }
}
