//! Helpers for populating containers in tests, standing in for the external
//! model.

use std::path::Path;
use std::sync::Arc;

use zarrs::array::Array;
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use drift_common::OutputLayout;

use crate::error::{ExchangeError, Result};
use crate::schema;

/// Write `values` over the full extent of the exposure dataset, in row-major
/// element order. `values` must match the dataset's element count.
pub fn fill_exposure(container_path: &Path, layout: OutputLayout, values: &[f32]) -> Result<()> {
    let store = Arc::new(FilesystemStore::new(container_path).map_err(ExchangeError::storage)?);
    let array =
        Array::open(store, schema::exposure_node(layout)).map_err(ExchangeError::zarr)?;
    let expected: u64 = array.shape().iter().product();
    if values.len() as u64 != expected {
        return Err(ExchangeError::ContractViolation(format!(
            "exposure fill has {} values, dataset holds {expected}",
            values.len()
        )));
    }
    let subset = ArraySubset::new_with_start_shape(
        vec![0; array.shape().len()],
        array.shape().to_vec(),
    )
    .map_err(ExchangeError::zarr)?;
    array
        .store_array_subset_elements(&subset, values)
        .map_err(ExchangeError::storage)?;
    Ok(())
}
