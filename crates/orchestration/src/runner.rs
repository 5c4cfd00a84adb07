//! The run pipeline: stage inputs, build the container, invoke the model,
//! stream the result to the output sink.

use std::path::PathBuf;

use rand::Rng;
use tracing::info;

use array_exchange::{block_slices, ExchangeContainer, ExposureDataset};
use drift_common::{
    Application, DriftParameters, Generation, OutputLayout, SpatialExtent, TimeWindow,
    WindDirection,
};
use vector_staging::{stage_applications, stage_landscape};

use crate::error::{OrchestrationError, Result};
use crate::invoker::ModelRuntime;
use crate::params::{names, wrong_type, ParameterError, ParameterSource, ParameterValue};
use crate::sink::OutputSink;

/// Tunables of a run that are not host parameters.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Container schema generation to produce.
    pub generation: Generation,
    /// Streaming block size, as a multiple of the dataset's native chunk
    /// shape per axis. Larger blocks raise peak memory and lower per-call
    /// overhead; the block cover stays exact either way.
    pub block_multiple: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            generation: Generation::default(),
            block_multiple: 5,
        }
    }
}

/// What a completed run produced, for logging and QA.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub shape: Vec<u64>,
    pub blocks_transferred: usize,
    /// The seed actually written to the container, after resolution.
    pub random_seed: i64,
    /// The wind direction actually written, after resolution.
    pub wind_direction: WindDirection,
}

/// Execute one full run against the given parameter source and output sink.
///
/// The pipeline is strictly sequential: landscape staging, container
/// construction, applied-area staging, the blocking model call, then
/// chunked readback. A failure at any step aborts the run with no usable
/// output.
pub fn run(
    source: &impl ParameterSource,
    sink: &mut impl OutputSink,
    runtime: &ModelRuntime,
    options: &RunOptions,
) -> Result<RunSummary> {
    let processing_dir = PathBuf::from(source.text(names::PROCESSING_PATH)?);
    let window = TimeWindow::new(
        source.date(names::SIMULATION_START)?,
        source.date(names::SIMULATION_END)?,
    )?;
    let extent = SpatialExtent::from_slice(&source.reals(names::EXTENT)?)?;
    let crs = source.text(names::GEOMETRY_CRS)?;
    // One read delivers the geometry records and any element names the host
    // declared for them.
    let geometry_parameter = source.read(names::GEOMETRIES)?;
    let declared_names = geometry_parameter.element_names;
    let geometries = match geometry_parameter.value {
        ParameterValue::Geometries(values) => values,
        other => return Err(wrong_type(names::GEOMETRIES, "geometries", &other).into()),
    };
    let layout = read_layout(source)?;
    let (applications, rate_unit) = read_applications(source)?;

    let random_seed = resolve_random_seed(source)?;
    let wind_direction = resolve_wind_direction(source, applications.len())?;
    let params = DriftParameters {
        habitat_types: source.text(names::HABITAT_TYPES)?,
        field_distance_sd: source.real(names::FIELD_DISTANCE_SD)? as f32,
        ep_distance_sd: source.real(names::EP_DISTANCE_SD)? as f32,
        reporting_threshold: source.real(names::REPORTING_THRESHOLD)? as f32,
        apply_simple_drift_filtering: source.bool(names::APPLY_SIMPLE_DRIFT_FILTERING)?,
        model: source.text(names::SPRAY_DRIFT_MODEL)?,
        source_exposure: source.text(names::SOURCE_EXPOSURE)?,
        crop_class: source.text(names::RAUTMANN_CLASS)?,
        minimum_distance: source.real(names::MINIMUM_DISTANCE_TO_FIELD)? as f32,
        filtering_types: read_u16_list(source, names::FILTERING_TYPES)?,
        filtering_min_width: source.real(names::FILTERING_MIN_WIDTH)? as f32,
        filtering_fraction: source.real(names::FILTERING_FRACTION)? as f32,
        boom_height: source.text(names::AG_DRIFT_BOOM_HEIGHT)?,
        droplet_size: source.text(names::AG_DRIFT_DROPLET_SIZE)?,
        ag_drift_quantile: source.real(names::AG_DRIFT_QUANTILE)? as f32,
        random_seed,
        wind_direction: wind_direction.clone(),
        feature_types: read_feature_types(source, geometries.len())?,
    };

    let container = ExchangeContainer::create(
        &processing_dir,
        &window,
        &extent,
        geometries.len(),
        layout,
        &params,
        options.generation,
    )?;
    stage_landscape(&container.base_shapefile(), &crs, &geometries)?;
    stage_applications(&container.ppm_shapefile(), &crs, &applications)?;

    runtime.invoke(container.container_path())?;

    let dataset = ExposureDataset::open(container.container_path(), layout)?;
    dataset.ensure_shape(&expected_shape(
        layout,
        options.generation,
        &window,
        &extent,
        geometries.len(),
    ))?;

    let elements = match layout {
        OutputLayout::BaseGeometry => {
            let names = resolve_element_names(declared_names, geometries.len())?;
            Some((names, geometries))
        }
        OutputLayout::Raster1Sqm => None,
    };
    let descriptor = dataset.describe(
        &rate_unit,
        &window,
        &extent,
        options.generation,
        elements,
    )?;
    sink.declare(&descriptor)?;

    let chunk_shape = dataset.chunk_shape()?;
    let block_shape: Vec<u64> = chunk_shape
        .iter()
        .map(|&c| c * options.block_multiple.max(1))
        .collect();
    let blocks = block_slices(dataset.shape(), &block_shape);
    let blocks_transferred = blocks.len();
    for block in &blocks {
        let values = dataset.read_block(block)?;
        sink.write_block(block, &values, true)?;
    }

    info!(
        shape = ?dataset.shape(),
        blocks = blocks_transferred,
        layout = %layout,
        "run complete, exposure streamed to sink"
    );
    Ok(RunSummary {
        shape: dataset.shape().to_vec(),
        blocks_transferred,
        random_seed,
        wind_direction,
    })
}

fn read_layout(source: &impl ParameterSource) -> Result<OutputLayout> {
    let value = source.text(names::SPATIAL_OUTPUT_SCALE)?;
    OutputLayout::parse(&value).ok_or_else(|| {
        ParameterError::Invalid {
            name: names::SPATIAL_OUTPUT_SCALE.to_string(),
            message: format!("unknown output layout {value:?}"),
        }
        .into()
    })
}

/// Read the application lists and pair them into records. The rate
/// parameter is read once; its declared unit rides along for the output
/// descriptor.
fn read_applications(source: &impl ParameterSource) -> Result<(Vec<Application>, String)> {
    let areas = source.geometries(names::APPLIED_AREAS)?;
    let fields = source.ints(names::APPLIED_FIELDS)?;
    let dates = source.dates(names::APPLICATION_DATES)?;
    let rate_parameter = source.read(names::APPLICATION_RATES)?;
    let rate_unit = rate_parameter.unit.unwrap_or_default();
    let rates = match rate_parameter.value {
        ParameterValue::RealList(values) => values,
        other => return Err(wrong_type(names::APPLICATION_RATES, "real list", &other).into()),
    };
    let reductions = source.reals(names::TECHNOLOGY_DRIFT_REDUCTIONS)?;
    if [fields.len(), dates.len(), rates.len(), reductions.len()]
        .iter()
        .any(|&len| len != areas.len())
    {
        return Err(OrchestrationError::Input(format!(
            "application lists disagree in length: {} areas, {} fields, {} dates, {} rates, \
             {} drift reductions",
            areas.len(),
            fields.len(),
            dates.len(),
            rates.len(),
            reductions.len()
        )));
    }
    let mut applications = Vec::with_capacity(areas.len());
    for (index, geometry) in areas.into_iter().enumerate() {
        let field_id = i32::try_from(fields[index]).map_err(|_| {
            OrchestrationError::Input(format!(
                "field identifier {} at index {index} out of range",
                fields[index]
            ))
        })?;
        applications.push(Application {
            geometry,
            field_id,
            date: dates[index],
            rate: rates[index],
            drift_reduction: reductions[index],
        });
    }
    Ok((applications, rate_unit))
}

/// Spatial-axis element names for the per-geometry descriptor: the host's
/// declared names when present, 1-based indices otherwise.
fn resolve_element_names(declared: Option<Vec<String>>, count: usize) -> Result<Vec<String>> {
    match declared {
        Some(names) if names.len() == count => Ok(names),
        Some(names) => Err(OrchestrationError::Input(format!(
            "{} element names for {count} geometries",
            names.len()
        ))),
        None => Ok((1..=count).map(|i| i.to_string()).collect()),
    }
}

fn read_u16_list(source: &impl ParameterSource, name: &str) -> Result<Vec<u16>> {
    source
        .ints(name)?
        .into_iter()
        .map(|value| {
            u16::try_from(value).map_err(|_| {
                ParameterError::Invalid {
                    name: name.to_string(),
                    message: format!("value {value} out of range for a type code"),
                }
                .into()
            })
        })
        .collect()
}

fn read_feature_types(source: &impl ParameterSource, geometry_count: usize) -> Result<Vec<u16>> {
    let types = read_u16_list(source, names::LAND_USE_LAND_COVER_TYPES)?;
    if types.len() != geometry_count {
        return Err(OrchestrationError::Input(format!(
            "{} land-use types for {geometry_count} geometries",
            types.len()
        )));
    }
    Ok(types)
}

/// A seed of `0`, or an absent seed parameter, asks for a fresh one; any
/// nonzero seed is recorded unchanged so the run stays reproducible.
fn resolve_random_seed(source: &impl ParameterSource) -> Result<i64> {
    let requested = match source.int(names::RANDOM_SEED) {
        Ok(value) => value,
        Err(ParameterError::Missing(_)) => 0,
        Err(error) => return Err(error.into()),
    };
    if requested != 0 {
        return Ok(requested);
    }
    let seed = rand::thread_rng().gen_range(1..i64::MAX);
    info!(seed, "no random seed given, drew a fresh one");
    Ok(seed)
}

/// A direction of `-1` asks for one uniformly sampled direction per
/// application; anything in [0, 360) applies globally and unchanged.
fn resolve_wind_direction(
    source: &impl ParameterSource,
    application_count: usize,
) -> Result<WindDirection> {
    let requested = source.int(names::WIND_DIRECTION)?;
    match requested {
        -1 => {
            let mut rng = rand::thread_rng();
            let directions = (0..application_count)
                .map(|_| rng.gen_range(0..360u16))
                .collect();
            Ok(WindDirection::PerApplication(directions))
        }
        0..=359 => Ok(WindDirection::Global(requested as u16)),
        other => Err(ParameterError::Invalid {
            name: names::WIND_DIRECTION.to_string(),
            message: format!("direction {other} outside [0, 360) and not -1"),
        }
        .into()),
    }
}

fn expected_shape(
    layout: OutputLayout,
    generation: Generation,
    window: &TimeWindow,
    extent: &SpatialExtent,
    geometry_count: usize,
) -> Vec<u64> {
    let days = window.num_days();
    match (layout, generation) {
        (OutputLayout::BaseGeometry, _) => vec![days, geometry_count as u64],
        (OutputLayout::Raster1Sqm, Generation::Current) => {
            vec![extent.rows(), extent.columns(), days]
        }
        (OutputLayout::Raster1Sqm, Generation::Legacy) => {
            vec![days, extent.columns(), extent.rows()]
        }
    }
}
