//! Error type for the run pipeline.

use thiserror::Error;

use crate::invoker::InvokerError;
use crate::params::ParameterError;
use crate::sink::SinkError;

/// Any failure of a run. Nothing in the pipeline is locally recovered;
/// every error propagates to the caller as a failed run with no usable
/// output.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Time(#[from] drift_common::TimeWindowError),

    #[error(transparent)]
    Extent(#[from] drift_common::ExtentError),

    #[error(transparent)]
    Staging(#[from] vector_staging::VectorStagingError),

    #[error(transparent)]
    Exchange(#[from] array_exchange::ExchangeError),

    #[error(transparent)]
    Invoker(#[from] InvokerError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    /// Host inputs that are individually valid but mutually inconsistent,
    /// e.g. application lists of differing lengths.
    #[error("inconsistent input: {0}")]
    Input(String),
}

pub type Result<T> = std::result::Result<T, OrchestrationError>;
