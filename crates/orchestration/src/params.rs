//! The typed parameter-read capability provided by the host.
//!
//! The host framework owns parameter declaration and validation; this side
//! only reads. Every value arrives with an optional physical unit, which
//! matters for exactly one parameter: the application rate, whose unit is
//! carried through to the output descriptor.

use std::collections::HashMap;

use chrono::NaiveDate;
use thiserror::Error;

/// Names of the host parameters read by the run pipeline.
pub mod names {
    pub const PROCESSING_PATH: &str = "ProcessingPath";
    pub const SIMULATION_START: &str = "SimulationStart";
    pub const SIMULATION_END: &str = "SimulationEnd";
    pub const GEOMETRIES: &str = "Geometries";
    pub const GEOMETRY_CRS: &str = "GeometryCrs";
    pub const EXTENT: &str = "Extent";
    pub const HABITAT_TYPES: &str = "HabitatTypes";
    pub const FIELD_DISTANCE_SD: &str = "FieldDistanceSD";
    pub const EP_DISTANCE_SD: &str = "EPDistanceSD";
    pub const REPORTING_THRESHOLD: &str = "ReportingThreshold";
    pub const APPLY_SIMPLE_DRIFT_FILTERING: &str = "ApplySimpleDriftFiltering";
    pub const LAND_USE_LAND_COVER_TYPES: &str = "LandUseLandCoverTypes";
    pub const WIND_DIRECTION: &str = "WindDirection";
    pub const SPRAY_DRIFT_MODEL: &str = "SprayDriftModel";
    pub const SOURCE_EXPOSURE: &str = "SourceExposure";
    pub const RAUTMANN_CLASS: &str = "RautmannClass";
    pub const APPLIED_FIELDS: &str = "AppliedFields";
    pub const APPLICATION_DATES: &str = "ApplicationDates";
    pub const APPLICATION_RATES: &str = "ApplicationRates";
    pub const TECHNOLOGY_DRIFT_REDUCTIONS: &str = "TechnologyDriftReductions";
    pub const APPLIED_AREAS: &str = "AppliedAreas";
    pub const SPATIAL_OUTPUT_SCALE: &str = "SpatialOutputScale";
    pub const RANDOM_SEED: &str = "RandomSeed";
    pub const FILTERING_TYPES: &str = "FilteringTypes";
    pub const FILTERING_MIN_WIDTH: &str = "FilteringMinWidth";
    pub const FILTERING_FRACTION: &str = "FilteringFraction";
    pub const MINIMUM_DISTANCE_TO_FIELD: &str = "MinimumDistanceToField";
    pub const AG_DRIFT_BOOM_HEIGHT: &str = "AgDriftBoomHeight";
    pub const AG_DRIFT_DROPLET_SIZE: &str = "AgDriftDropletSize";
    pub const AG_DRIFT_QUANTILE: &str = "AgDriftQuantile";
}

/// A parameter value as delivered by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Text(String),
    Real(f64),
    RealList(Vec<f64>),
    Int(i64),
    IntList(Vec<i64>),
    Bool(bool),
    Date(NaiveDate),
    DateList(Vec<NaiveDate>),
    /// Binary geometries in well-known-byte encoding.
    Geometries(Vec<Vec<u8>>),
}

impl ParameterValue {
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Real(_) => "real",
            Self::RealList(_) => "real list",
            Self::Int(_) => "integer",
            Self::IntList(_) => "integer list",
            Self::Bool(_) => "boolean",
            Self::Date(_) => "date",
            Self::DateList(_) => "date list",
            Self::Geometries(_) => "geometries",
        }
    }
}

/// A value plus the metadata the host declared for it: an optional physical
/// unit, the scale it applies at, and per-element names for list-shaped
/// values.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub value: ParameterValue,
    pub unit: Option<String>,
    pub scale: Option<String>,
    pub element_names: Option<Vec<String>>,
}

impl Parameter {
    pub fn new(value: ParameterValue) -> Self {
        Self {
            value,
            unit: None,
            scale: None,
            element_names: None,
        }
    }

    pub fn with_unit(value: ParameterValue, unit: &str) -> Self {
        Self {
            unit: Some(unit.to_string()),
            ..Self::new(value)
        }
    }

    pub fn named_elements(mut self, names: Vec<String>) -> Self {
        self.element_names = Some(names);
        self
    }

    pub fn at_scale(mut self, scale: &str) -> Self {
        self.scale = Some(scale.to_string());
        self
    }
}

#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("parameter {0} is not available from the host")]
    Missing(String),

    #[error("parameter {name} has type {actual}, expected {expected}")]
    WrongType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("parameter {name} is invalid: {message}")]
    Invalid { name: String, message: String },
}

/// Read access to host parameters, keyed by name.
///
/// Implemented by the host adapter in production and by
/// [`InMemoryParameterSource`] in tests.
pub trait ParameterSource {
    fn read(&self, name: &str) -> Result<Parameter, ParameterError>;

    fn text(&self, name: &str) -> Result<String, ParameterError> {
        match self.read(name)?.value {
            ParameterValue::Text(value) => Ok(value),
            other => Err(wrong_type(name, "text", &other)),
        }
    }

    fn real(&self, name: &str) -> Result<f64, ParameterError> {
        match self.read(name)?.value {
            ParameterValue::Real(value) => Ok(value),
            ParameterValue::Int(value) => Ok(value as f64),
            other => Err(wrong_type(name, "real", &other)),
        }
    }

    fn reals(&self, name: &str) -> Result<Vec<f64>, ParameterError> {
        match self.read(name)?.value {
            ParameterValue::RealList(values) => Ok(values),
            other => Err(wrong_type(name, "real list", &other)),
        }
    }

    fn int(&self, name: &str) -> Result<i64, ParameterError> {
        match self.read(name)?.value {
            ParameterValue::Int(value) => Ok(value),
            other => Err(wrong_type(name, "integer", &other)),
        }
    }

    fn ints(&self, name: &str) -> Result<Vec<i64>, ParameterError> {
        match self.read(name)?.value {
            ParameterValue::IntList(values) => Ok(values),
            other => Err(wrong_type(name, "integer list", &other)),
        }
    }

    fn bool(&self, name: &str) -> Result<bool, ParameterError> {
        match self.read(name)?.value {
            ParameterValue::Bool(value) => Ok(value),
            other => Err(wrong_type(name, "boolean", &other)),
        }
    }

    fn date(&self, name: &str) -> Result<NaiveDate, ParameterError> {
        match self.read(name)?.value {
            ParameterValue::Date(value) => Ok(value),
            other => Err(wrong_type(name, "date", &other)),
        }
    }

    fn dates(&self, name: &str) -> Result<Vec<NaiveDate>, ParameterError> {
        match self.read(name)?.value {
            ParameterValue::DateList(values) => Ok(values),
            other => Err(wrong_type(name, "date list", &other)),
        }
    }

    fn geometries(&self, name: &str) -> Result<Vec<Vec<u8>>, ParameterError> {
        match self.read(name)?.value {
            ParameterValue::Geometries(values) => Ok(values),
            other => Err(wrong_type(name, "geometries", &other)),
        }
    }

    /// The unit declared for a parameter, if any.
    fn unit(&self, name: &str) -> Result<Option<String>, ParameterError> {
        Ok(self.read(name)?.unit)
    }

    /// The per-element names declared for a list-shaped parameter, if any.
    fn element_names(&self, name: &str) -> Result<Option<Vec<String>>, ParameterError> {
        Ok(self.read(name)?.element_names)
    }
}

pub(crate) fn wrong_type(
    name: &str,
    expected: &'static str,
    actual: &ParameterValue,
) -> ParameterError {
    ParameterError::WrongType {
        name: name.to_string(),
        expected,
        actual: actual.type_name(),
    }
}

/// Map-backed parameter source for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryParameterSource {
    parameters: HashMap<String, Parameter>,
}

impl InMemoryParameterSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: ParameterValue) -> &mut Self {
        self.parameters
            .insert(name.to_string(), Parameter::new(value));
        self
    }

    pub fn set_with_unit(&mut self, name: &str, value: ParameterValue, unit: &str) -> &mut Self {
        self.parameters
            .insert(name.to_string(), Parameter::with_unit(value, unit));
        self
    }

    pub fn set_parameter(&mut self, name: &str, parameter: Parameter) -> &mut Self {
        self.parameters.insert(name.to_string(), parameter);
        self
    }
}

impl ParameterSource for InMemoryParameterSource {
    fn read(&self, name: &str) -> Result<Parameter, ParameterError> {
        self.parameters
            .get(name)
            .cloned()
            .ok_or_else(|| ParameterError::Missing(name.to_string()))
    }
}
