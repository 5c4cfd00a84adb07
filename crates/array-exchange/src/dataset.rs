//! Read-only access to the exposure dataset after the model has run.

use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use zarrs::array::Array;
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use drift_common::{Generation, OutputLayout, SpatialExtent, TimeWindow};

use crate::descriptor::{AxisOffset, ExposureDescriptor};
use crate::error::{ExchangeError, Result};
use crate::schema;

/// The populated exposure dataset, reopened read-only.
pub struct ExposureDataset {
    array: Array<FilesystemStore>,
    layout: OutputLayout,
}

impl ExposureDataset {
    /// Open the exposure dataset inside a completed container.
    ///
    /// A missing dataset is a contract violation rather than a process
    /// failure: the model can exit successfully yet leave the container
    /// unusable.
    pub fn open(container_path: &Path, layout: OutputLayout) -> Result<Self> {
        let store =
            Arc::new(FilesystemStore::new(container_path).map_err(ExchangeError::storage)?);
        let node = schema::exposure_node(layout);
        let array = Array::open(store, node).map_err(|e| {
            ExchangeError::ContractViolation(format!(
                "exposure dataset {node} cannot be opened: {e}"
            ))
        })?;
        Ok(Self { array, layout })
    }

    pub fn layout(&self) -> OutputLayout {
        self.layout
    }

    pub fn shape(&self) -> &[u64] {
        self.array.shape()
    }

    /// Fail unless the dataset kept the shape it was allocated with.
    pub fn ensure_shape(&self, expected: &[u64]) -> Result<()> {
        if self.array.shape() != expected {
            return Err(ExchangeError::ContractViolation(format!(
                "exposure dataset has shape {:?}, expected {:?}",
                self.array.shape(),
                expected
            )));
        }
        Ok(())
    }

    /// Native chunk shape of the dataset, from its own metadata.
    pub fn chunk_shape(&self) -> Result<Vec<u64>> {
        let origin = vec![0; self.array.shape().len()];
        let chunk_shape = self
            .array
            .chunk_grid()
            .chunk_shape(&origin, self.array.shape())
            .map_err(ExchangeError::zarr)?
            .ok_or_else(|| {
                ExchangeError::ContractViolation(
                    "exposure dataset has no chunk at the array origin".to_string(),
                )
            })?;
        Ok(chunk_shape.iter().map(|n| n.get()).collect())
    }

    /// Read one contiguous block, addressed by absolute per-axis ranges.
    pub fn read_block(&self, block: &[Range<u64>]) -> Result<Vec<f32>> {
        let start: Vec<u64> = block.iter().map(|r| r.start).collect();
        let shape: Vec<u64> = block.iter().map(|r| r.end - r.start).collect();
        let subset =
            ArraySubset::new_with_start_shape(start, shape).map_err(ExchangeError::zarr)?;
        self.array
            .retrieve_array_subset_elements::<f32>(&subset)
            .map_err(ExchangeError::storage)
    }

    /// Derive the output descriptor from the dataset's own metadata plus
    /// layout-dependent scale labels, offsets and element metadata.
    ///
    /// `elements` carries the per-geometry names and geometries and is used
    /// only for the per-geometry layout. The legacy generation never carried
    /// offset or element metadata for any layout and reports none here
    /// either.
    pub fn describe(
        &self,
        unit: &str,
        window: &TimeWindow,
        extent: &SpatialExtent,
        generation: Generation,
        elements: Option<(Vec<String>, Vec<Vec<u8>>)>,
    ) -> Result<ExposureDescriptor> {
        let (scale_labels, offsets, element_names, element_geometries) =
            match (self.layout, generation) {
                (OutputLayout::BaseGeometry, Generation::Current) => {
                    let (names, geometries) = match elements {
                        Some((names, geometries)) => (Some(names), Some(geometries)),
                        None => (None, None),
                    };
                    (
                        vec!["time/day".to_string(), "space/base_geometry".to_string()],
                        vec![Some(AxisOffset::Days(window.epoch_offset_days())), None],
                        names,
                        geometries,
                    )
                }
                (OutputLayout::BaseGeometry, Generation::Legacy) => (
                    vec!["time/day".to_string(), "space/base_geometry".to_string()],
                    Vec::new(),
                    None,
                    None,
                ),
                (OutputLayout::Raster1Sqm, Generation::Current) => (
                    vec![
                        "space_y/1sqm".to_string(),
                        "space_x/1sqm".to_string(),
                        "time/day".to_string(),
                    ],
                    vec![
                        Some(AxisOffset::Distance(extent.y_min)),
                        Some(AxisOffset::Distance(extent.x_min)),
                        Some(AxisOffset::Days(window.epoch_offset_days())),
                    ],
                    None,
                    None,
                ),
                (OutputLayout::Raster1Sqm, Generation::Legacy) => (
                    vec![
                        "time/day".to_string(),
                        "space_x/1sqm".to_string(),
                        "space_y/1sqm".to_string(),
                    ],
                    Vec::new(),
                    None,
                    None,
                ),
            };
        Ok(ExposureDescriptor {
            name: "exposure".to_string(),
            shape: self.array.shape().to_vec(),
            chunk_shape: self.chunk_shape()?,
            scale_labels,
            unit: unit.to_string(),
            offsets,
            element_names,
            element_geometries,
        })
    }
}
