//! Error types for vector staging.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while staging geometry records.
#[derive(Error, Debug)]
pub enum VectorStagingError {
    /// The well-known-byte geometry at the given record index could not be
    /// converted into a polygon feature.
    #[error("failed to convert geometry at record {index}: {message}")]
    GeometryConversion { index: usize, message: String },

    /// The shapefile could not be written.
    #[error("failed to write shapefile {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for vector staging operations.
pub type Result<T> = std::result::Result<T, VectorStagingError>;
