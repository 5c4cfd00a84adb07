//! Output descriptor metadata derived from the exposure dataset.

use drift_common::OutputLayout;

/// Origin offset of one output axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisOffset {
    /// Days since the 1970-01-01 epoch, for the time axis.
    Days(i64),
    /// Coordinate of the raster origin in CRS distance units.
    Distance(f64),
}

/// Everything the output sink needs to know about the exposure array before
/// any data is transferred.
///
/// The descriptor is declared once; all subsequent block writes only fill
/// cells inside the declared shape and never resize it.
#[derive(Debug, Clone)]
pub struct ExposureDescriptor {
    pub name: String,
    pub shape: Vec<u64>,
    pub chunk_shape: Vec<u64>,
    /// One `dimension/scale` label per axis, in axis order.
    pub scale_labels: Vec<String>,
    /// Physical unit, inherited from the application-rate input.
    pub unit: String,
    /// Per-axis origin offsets. Empty for the legacy raster layout, which
    /// never carried offset metadata.
    pub offsets: Vec<Option<AxisOffset>>,
    /// Names of the elements along the spatial axis. Populated only for the
    /// per-geometry layout.
    pub element_names: Option<Vec<String>>,
    /// Binary geometries of the elements along the spatial axis. Populated
    /// only for the per-geometry layout.
    pub element_geometries: Option<Vec<Vec<u8>>>,
}

impl ExposureDescriptor {
    /// The layout this descriptor was derived from, recovered from its scale
    /// labels.
    pub fn layout(&self) -> OutputLayout {
        if self
            .scale_labels
            .iter()
            .any(|label| label.ends_with("/base_geometry"))
        {
            OutputLayout::BaseGeometry
        } else {
            OutputLayout::Raster1Sqm
        }
    }
}
