//! Orchestration of a spray-drift exposure run.
//!
//! A run reads its inputs through a [`ParameterSource`] capability, stages
//! vector inputs and builds the exchange container, blocks on the external
//! model process, and streams the produced exposure array into an
//! [`OutputSink`] capability. Both capabilities are explicit arguments of
//! [`run`], so the whole pipeline is testable without the host framework.
//!
//! The pipeline is single threaded with one blocking child-process call and
//! no cancellation; a caller that needs a deadline must terminate the child
//! externally, which is then reported like any other nonzero exit.

pub mod error;
pub mod invoker;
pub mod params;
pub mod runner;
pub mod sink;

pub use error::{OrchestrationError, Result};
pub use invoker::{InvokerError, ModelRuntime, LIBRARY_PATH_VARS};
pub use params::{
    names, InMemoryParameterSource, Parameter, ParameterError, ParameterSource, ParameterValue,
};
pub use runner::{run, RunOptions, RunSummary};
pub use sink::{InMemorySink, OutputSink, SinkError};
