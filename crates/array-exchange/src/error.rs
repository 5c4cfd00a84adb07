//! Error types for the array exchange container.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building or reading the exchange container.
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// The processing directory already exists. Creation refuses to proceed
    /// rather than silently mixing the artifacts of two runs.
    #[error("cannot create exchange container in a path that already exists: {0}")]
    ContainerExists(PathBuf),

    /// Zarr format error.
    #[error("Zarr format error: {0}")]
    Zarr(String),

    /// Storage/IO error from the underlying store.
    #[error("storage error: {0}")]
    Storage(String),

    /// The container does not satisfy the exchange schema after the model
    /// reported success: the output dataset is missing or shaped
    /// unexpectedly. Distinct from a model process failure.
    #[error("exchange contract violation: {0}")]
    ContractViolation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ExchangeError {
    pub fn zarr(error: impl ToString) -> Self {
        Self::Zarr(error.to_string())
    }

    pub fn storage(error: impl ToString) -> Self {
        Self::Storage(error.to_string())
    }
}

/// Result type for exchange container operations.
pub type Result<T> = std::result::Result<T, ExchangeError>;
