//! Vector staging for the spray-drift exchange.
//!
//! The external model consumes the landscape and the applied areas as
//! single-layer ESRI shapefiles. This crate writes those files from the
//! host's well-known-byte polygon records:
//!
//! - landscape geometries are staged without attributes;
//! - applied areas carry four attribute columns (field id, application
//!   date, rate, technology drift reduction).
//!
//! Both call shapes tag the file with the run's coordinate reference by
//! writing the well-known-text definition into the `.prj` sidecar. All
//! records are converted before the first byte hits disk, so a malformed
//! geometry never leaves a partial file behind.

mod error;
mod writer;

pub use error::{Result, VectorStagingError};
pub use writer::{stage_applications, stage_landscape};
