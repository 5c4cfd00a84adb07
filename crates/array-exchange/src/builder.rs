//! Construction of the array exchange container.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::info;
use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::{Array, ArrayBuilder, ChunkGrid, DataType, Element, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::group::GroupBuilder;
use zarrs_filesystem::FilesystemStore;

use drift_common::{
    DriftParameters, Generation, OutputLayout, SpatialExtent, TimeWindow, WindDirection,
};

use crate::error::{ExchangeError, Result};
use crate::schema;

type Store = FilesystemStore;

/// A freshly created exchange container rooted in its processing directory.
///
/// Creation writes the dimension, scale and parameter nodes and
/// pre-allocates the exposure dataset; after that the container is handed
/// over to the external model, which populates only the exposure dataset.
pub struct ExchangeContainer {
    processing_dir: PathBuf,
    container_path: PathBuf,
}

impl ExchangeContainer {
    /// Create the container for one run.
    ///
    /// `processing_dir` must not exist. Refusing an existing path keeps a
    /// rerun from silently mixing with the artifacts of an earlier run and
    /// makes concurrent runs against the same directory mutually exclusive.
    pub fn create(
        processing_dir: &Path,
        window: &TimeWindow,
        extent: &SpatialExtent,
        geometry_count: usize,
        layout: OutputLayout,
        params: &DriftParameters,
        generation: Generation,
    ) -> Result<Self> {
        if processing_dir.exists() {
            return Err(ExchangeError::ContainerExists(processing_dir.to_path_buf()));
        }
        let container_path = processing_dir.join(schema::CONTAINER_DIR);
        std::fs::create_dir_all(container_path.join(schema::GEOMETRY_DIR))?;

        let store =
            Arc::new(FilesystemStore::new(&container_path).map_err(ExchangeError::storage)?);

        create_group(&store, "/", Map::new())?;
        create_group(&store, "/dims", Map::new())?;
        create_group(&store, schema::DIM_TIME, attrs([("id", json!(0))]))?;
        create_group(&store, schema::DIM_SPACE, attrs([("id", json!(1))]))?;

        write_scales(&store, window, extent, geometry_count)?;
        let ppm_shapefile = processing_dir.join(schema::PPM_SHAPEFILE);
        write_parameters(&store, &ppm_shapefile, layout, params)?;
        allocate_exposure(&store, window, extent, geometry_count, layout, generation)?;

        info!(
            container = %container_path.display(),
            layout = %layout,
            days = window.num_days(),
            geometries = geometry_count,
            "created exchange container"
        );
        Ok(Self {
            processing_dir: processing_dir.to_path_buf(),
            container_path,
        })
    }

    /// Root of the container (the model's sole positional argument).
    pub fn container_path(&self) -> &Path {
        &self.container_path
    }

    /// Directory where the landscape shapefile is staged.
    pub fn geometry_dir(&self) -> PathBuf {
        self.container_path.join(schema::GEOMETRY_DIR)
    }

    /// Path of the landscape shapefile.
    pub fn base_shapefile(&self) -> PathBuf {
        self.geometry_dir().join(schema::BASE_SHAPEFILE)
    }

    /// Path of the applied-area shapefile, also recorded as a parameter node
    /// inside the container.
    pub fn ppm_shapefile(&self) -> PathBuf {
        self.processing_dir.join(schema::PPM_SHAPEFILE)
    }
}

fn attrs<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn set_attrs() -> Map<String, Value> {
    attrs([("set", json!(true))])
}

fn create_group(store: &Arc<Store>, path: &str, attributes: Map<String, Value>) -> Result<()> {
    let mut builder = GroupBuilder::new();
    builder.attributes(attributes);
    let group = builder
        .build(store.clone(), path)
        .map_err(ExchangeError::zarr)?;
    group.store_metadata().map_err(ExchangeError::storage)?;
    Ok(())
}

fn create_array(
    store: &Arc<Store>,
    path: &str,
    shape: Vec<u64>,
    chunks: Vec<u64>,
    data_type: DataType,
    fill_value: FillValue,
    attributes: Map<String, Value>,
) -> Result<Array<Store>> {
    let chunk_grid: ChunkGrid = chunks
        .try_into()
        .map_err(|e| ExchangeError::Zarr(format!("{e:?}")))?;
    let mut binding = ArrayBuilder::new(shape, data_type, chunk_grid, fill_value);
    let builder = binding.attributes(attributes);
    let array = builder
        .build(store.clone(), path)
        .map_err(ExchangeError::zarr)?;
    array.store_metadata().map_err(ExchangeError::storage)?;
    Ok(array)
}

fn store_elements<T: Element>(
    array: &Array<Store>,
    start: Vec<u64>,
    shape: Vec<u64>,
    elements: &[T],
) -> Result<()> {
    let subset = ArraySubset::new_with_start_shape(start, shape).map_err(ExchangeError::zarr)?;
    array
        .store_array_subset_elements(&subset, elements)
        .map_err(ExchangeError::storage)?;
    Ok(())
}

fn write_scales(
    store: &Arc<Store>,
    window: &TimeWindow,
    extent: &SpatialExtent,
    geometry_count: usize,
) -> Result<()> {
    create_array(
        store,
        schema::SCALE_SIMULATION,
        vec![1],
        vec![1],
        DataType::Float32,
        FillValue::from(f32::NAN),
        Map::new(),
    )?;

    let days = window.num_days();
    let day = create_array(
        store,
        schema::SCALE_DAY,
        vec![days],
        vec![days],
        DataType::Float32,
        FillValue::from(f32::NAN),
        attrs([
            ("transform", json!("Day")),
            ("t_offset", json!(window.epoch_offset_days())),
        ]),
    )?;
    let indices: Vec<f32> = (0..days).map(|d| d as f32).collect();
    store_elements(&day, vec![0], vec![days], &indices)?;

    create_array(
        store,
        schema::SCALE_REGION,
        vec![1],
        vec![1],
        DataType::Float32,
        FillValue::from(f32::NAN),
        Map::new(),
    )?;
    create_array(
        store,
        schema::SCALE_BASE_GEOMETRY,
        vec![geometry_count as u64],
        vec![(geometry_count as u64).max(1)],
        DataType::Float32,
        FillValue::from(f32::NAN),
        attrs([("geometries", json!(schema::BASE_SHAPEFILE))]),
    )?;
    create_array(
        store,
        schema::SCALE_1SQM,
        vec![extent.columns(), extent.rows()],
        vec![extent.columns().max(1), extent.rows().max(1)],
        DataType::Float32,
        FillValue::from(f32::NAN),
        attrs([
            ("transform", json!("Geographic")),
            ("t_offset", json!([extent.x_min, extent.y_min])),
        ]),
    )?;
    Ok(())
}

fn write_parameters(
    store: &Arc<Store>,
    ppm_shapefile: &Path,
    layout: OutputLayout,
    params: &DriftParameters,
) -> Result<()> {
    write_string(
        store,
        schema::PPM_SHAPEFILE_NODE,
        &ppm_shapefile.to_string_lossy(),
    )?;
    write_string(
        store,
        &schema::param_node("habitat_types"),
        &params.habitat_types,
    )?;
    // The exposure-path width and angular deviation are fixed by the model.
    write_f32(store, &schema::param_node("ep_width"), 3.0)?;
    write_f32(store, &schema::param_node("max_angular_deviation"), 0.0)?;
    write_f32(
        store,
        &schema::param_node("field_dist_sd"),
        params.field_distance_sd,
    )?;
    write_f32(
        store,
        &schema::param_node("ep_dist_sd"),
        params.ep_distance_sd,
    )?;
    write_f32(
        store,
        &schema::param_node("min_dist"),
        params.minimum_distance,
    )?;
    write_string(
        store,
        &schema::param_node("source_exposure"),
        &params.source_exposure,
    )?;
    write_string(store, &schema::param_node("pdf_type"), "gamma")?;
    write_string(store, &schema::param_node("crop"), &params.crop_class)?;
    write_f32(
        store,
        &schema::param_node("reporting_threshold"),
        params.reporting_threshold,
    )?;
    write_bool(
        store,
        &schema::param_node("apply_simple1_drift_filtering"),
        params.apply_simple_drift_filtering,
    )?;
    write_string(store, &schema::param_node("model"), &params.model)?;
    write_string(
        store,
        &schema::param_node("spatial_output_scale"),
        layout.as_str(),
    )?;
    write_u16_row(store, schema::FEATURE_TYPE_NODE, &params.feature_types)?;
    match &params.wind_direction {
        WindDirection::Global(direction) => {
            write_u16_row(store, schema::WIND_DIRECTION_NODE, &[*direction])?
        }
        WindDirection::PerApplication(directions) => {
            write_u16_row(store, schema::WIND_DIRECTION_NODE, directions)?
        }
    }
    write_i64(
        store,
        &schema::param_node("random_seed"),
        params.random_seed,
    )?;
    // The model expects a single-space placeholder for "no filtering types".
    let filtering_types = if params.filtering_types.is_empty() {
        " ".to_string()
    } else {
        params
            .filtering_types
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    };
    write_string(
        store,
        &schema::param_node("filtering_types"),
        &filtering_types,
    )?;
    write_f32(
        store,
        &schema::param_node("filtering_min_width"),
        params.filtering_min_width,
    )?;
    write_f32(
        store,
        &schema::param_node("filtering_fraction"),
        params.filtering_fraction,
    )?;
    write_string(
        store,
        &schema::param_node("boom_height"),
        &params.boom_height,
    )?;
    write_string(
        store,
        &schema::param_node("droplet_size"),
        &params.droplet_size,
    )?;
    write_f32(
        store,
        &schema::param_node("ag_drift_quantile"),
        params.ag_drift_quantile,
    )?;
    Ok(())
}

/// Pre-allocate the exposure dataset in its final shape and chunking. The
/// external model fills it; nothing is written here beyond metadata.
fn allocate_exposure(
    store: &Arc<Store>,
    window: &TimeWindow,
    extent: &SpatialExtent,
    geometry_count: usize,
    layout: OutputLayout,
    generation: Generation,
) -> Result<()> {
    let days = window.num_days();
    let (rows, cols) = (extent.rows(), extent.columns());
    // Per-geometry output streams one geometry column at a time; raster
    // output keeps one full spatial slice per day in a chunk to bound the
    // model's peak memory while populating.
    let (shape, chunks) = match (layout, generation) {
        (OutputLayout::BaseGeometry, _) => {
            (vec![days, geometry_count as u64], vec![days, 1])
        }
        (OutputLayout::Raster1Sqm, Generation::Current) => (
            vec![rows, cols, days],
            vec![rows.max(1), cols.max(1), 1],
        ),
        (OutputLayout::Raster1Sqm, Generation::Legacy) => (
            vec![days, cols, rows],
            vec![1, cols.max(1), rows.max(1)],
        ),
    };

    let chunk_grid: ChunkGrid = chunks
        .try_into()
        .map_err(|e| ExchangeError::Zarr(format!("{e:?}")))?;
    let mut binding = ArrayBuilder::new(
        shape,
        DataType::Float32,
        chunk_grid,
        FillValue::from(f32::NAN),
    );
    let builder = binding.bytes_to_bytes_codecs(vec![exposure_codec()?]);
    let array = builder
        .build(store.clone(), schema::exposure_node(layout))
        .map_err(ExchangeError::zarr)?;
    array.store_metadata().map_err(ExchangeError::storage)?;
    Ok(())
}

fn exposure_codec() -> Result<Arc<dyn zarrs::array::codec::BytesToBytesCodecTraits>> {
    let level = BloscCompressionLevel::try_from(5u8)
        .map_err(|_| ExchangeError::Zarr("invalid compression level".to_string()))?;
    let codec = BloscCodec::new(
        BloscCompressor::Zstd,
        level,
        None,
        BloscShuffleMode::Shuffle,
        Some(std::mem::size_of::<f32>()),
    )
    .map_err(ExchangeError::zarr)?;
    Ok(Arc::new(codec))
}

fn write_f32(store: &Arc<Store>, path: &str, value: f32) -> Result<()> {
    let array = create_array(
        store,
        path,
        vec![1, 1],
        vec![1, 1],
        DataType::Float32,
        FillValue::from(f32::NAN),
        set_attrs(),
    )?;
    store_elements(&array, vec![0, 0], vec![1, 1], &[value])
}

fn write_bool(store: &Arc<Store>, path: &str, value: bool) -> Result<()> {
    let array = create_array(
        store,
        path,
        vec![1, 1],
        vec![1, 1],
        DataType::Bool,
        FillValue::from(false),
        set_attrs(),
    )?;
    store_elements(&array, vec![0, 0], vec![1, 1], &[value])
}

fn write_i64(store: &Arc<Store>, path: &str, value: i64) -> Result<()> {
    let array = create_array(
        store,
        path,
        vec![1, 1],
        vec![1, 1],
        DataType::Int64,
        FillValue::from(0i64),
        set_attrs(),
    )?;
    store_elements(&array, vec![0, 0], vec![1, 1], &[value])
}

fn write_string(store: &Arc<Store>, path: &str, value: &str) -> Result<()> {
    let array = create_array(
        store,
        path,
        vec![1, 1],
        vec![1, 1],
        DataType::String,
        FillValue::from(""),
        set_attrs(),
    )?;
    store_elements(&array, vec![0, 0], vec![1, 1], &[value.to_string()])
}

fn write_u16_row(store: &Arc<Store>, path: &str, values: &[u16]) -> Result<()> {
    let count = values.len() as u64;
    let array = create_array(
        store,
        path,
        vec![1, count],
        vec![1, count.max(1)],
        DataType::UInt16,
        FillValue::from(0u16),
        set_attrs(),
    )?;
    if !values.is_empty() {
        store_elements(&array, vec![0, 0], vec![1, count], values)?;
    }
    Ok(())
}
