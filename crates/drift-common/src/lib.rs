//! Shared domain types for the spray-drift exchange pipeline.
//!
//! These types are the vocabulary of the run: the spatial extent of the
//! simulated landscape, the simulated time window, the control parameters
//! that are written into the exchange container, and the application records
//! that are staged as vector features for the external model.

pub mod extent;
pub mod params;
pub mod records;
pub mod time;

pub use extent::{ExtentError, SpatialExtent};
pub use params::{DriftParameters, Generation, OutputLayout, WindDirection};
pub use records::Application;
pub use time::{TimeWindow, TimeWindowError};
