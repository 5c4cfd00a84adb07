//! Spatial extent of the simulated landscape.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The bounding box for which exposure is simulated, in the coordinate
/// reference system shared by all geometries of a run.
///
/// One coordinate unit corresponds to one raster cell, so the raster
/// column and row counts are derived directly from the extent widths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialExtent {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl SpatialExtent {
    /// Create a new extent from its corner coordinates.
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Self, ExtentError> {
        if x_max <= x_min || y_max <= y_min {
            return Err(ExtentError::Degenerate {
                x_min,
                x_max,
                y_min,
                y_max,
            });
        }
        Ok(Self {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }

    /// Parse an extent from the host's four-value form
    /// (x-min, x-max, y-min, y-max).
    pub fn from_slice(values: &[f64]) -> Result<Self, ExtentError> {
        if values.len() != 4 {
            return Err(ExtentError::WrongLength(values.len()));
        }
        Self::new(values[0], values[1], values[2], values[3])
    }

    /// Number of raster columns, at one cell per coordinate unit.
    pub fn columns(&self) -> u64 {
        (self.x_max - self.x_min).round() as u64
    }

    /// Number of raster rows, at one cell per coordinate unit.
    pub fn rows(&self) -> u64 {
        (self.y_max - self.y_min).round() as u64
    }
}

#[derive(Debug, Error)]
pub enum ExtentError {
    #[error("extent must hold exactly four values (x-min, x-max, y-min, y-max), got {0}")]
    WrongLength(usize),

    #[error("degenerate extent: x {x_min}..{x_max}, y {y_min}..{y_max}")]
    Degenerate {
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_size_rounds_extent_widths() {
        let extent = SpatialExtent::new(100.0, 350.4, 20.0, 120.6).unwrap();
        assert_eq!(extent.columns(), 250);
        assert_eq!(extent.rows(), 101);
    }

    #[test]
    fn test_from_slice() {
        let extent = SpatialExtent::from_slice(&[0.0, 10.0, 5.0, 25.0]).unwrap();
        assert_eq!(extent.columns(), 10);
        assert_eq!(extent.rows(), 20);

        assert!(matches!(
            SpatialExtent::from_slice(&[0.0, 10.0]),
            Err(ExtentError::WrongLength(2))
        ));
    }

    #[test]
    fn test_degenerate_extent_rejected() {
        assert!(SpatialExtent::new(10.0, 10.0, 0.0, 5.0).is_err());
        assert!(SpatialExtent::new(0.0, 10.0, 5.0, 5.0).is_err());
    }
}
