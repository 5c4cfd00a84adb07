//! The array exchange container shared with the external spray-drift model.
//!
//! The container is a hierarchical Zarr store that acts as the wire format
//! between this orchestration and the opaque numerical model:
//!
//! ```text
//! <processing dir>/sim.x3df
//!      │
//!      ├─► /dims/…      dimension declarations (time, space)
//!      ├─► /scales/…    coordinate arrays (day, region, base_geometry, 1sqm)
//!      ├─► /data/simulation/…   one node per control parameter, all "set"
//!      └─► /data/day/…/spray_drift/exposure
//!                       the pre-allocated output dataset, written only by
//!                       the external model
//! ```
//!
//! This crate builds the container (refusing to touch a path that already
//! exists), reopens it read-only after the model has run, derives the output
//! descriptor from the dataset's own metadata, and partitions the output
//! shape into contiguous blocks for memory-bounded streaming.

pub mod blocks;
pub mod builder;
pub mod dataset;
pub mod descriptor;
pub mod error;
pub mod schema;
pub mod testdata;

pub use blocks::block_slices;
pub use builder::ExchangeContainer;
pub use dataset::ExposureDataset;
pub use descriptor::{AxisOffset, ExposureDescriptor};
pub use error::{ExchangeError, Result};
