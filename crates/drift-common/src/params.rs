//! Simulation-control parameters written into the exchange container.

use std::fmt;

/// Spatial layout of the exposure output dataset.
///
/// Exposure is either reported per 1-square-unit raster cell across the
/// extent, or aggregated per input geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// One value per raster cell of the extent.
    Raster1Sqm,
    /// One value per landscape geometry.
    BaseGeometry,
}

impl OutputLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raster1Sqm => "1sqm",
            Self::BaseGeometry => "base_geometry",
        }
    }

    /// Parse the host's spatial-output-scale value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "1sqm" => Some(Self::Raster1Sqm),
            "base_geometry" => Some(Self::BaseGeometry),
            _ => None,
        }
    }
}

impl fmt::Display for OutputLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Schema generation of the exchange container.
///
/// `Legacy` keeps the (days, columns, rows) raster axis order and omits
/// offset and element-name metadata from the output descriptor. `Current`
/// orders raster axes as (rows, columns, days) and reports full metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Generation {
    Legacy,
    #[default]
    Current,
}

/// Wind direction applied during the run, in meteorological notation
/// (direction the wind blows from, degrees).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindDirection {
    /// One direction for every application.
    Global(u16),
    /// One sampled direction per application.
    PerApplication(Vec<u16>),
}

/// Every simulation-control input written as a parameter node into the
/// exchange container. The external model reads all of these; none of them
/// is interpreted here.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftParameters {
    /// Land-use/land-cover classes considered habitats.
    pub habitat_types: String,
    /// Distance variation (standard deviation) at the field scale, in
    /// coordinate units.
    pub field_distance_sd: f32,
    /// Distance variation (standard deviation) at the exposure-path scale.
    pub ep_distance_sd: f32,
    /// Exposure below this value is reported as zero by the model.
    pub reporting_threshold: f32,
    /// Whether the fixed probabilistic drift-filtering model is applied.
    pub apply_simple_drift_filtering: bool,
    /// Drift model choice ("XSprayDrift", "90thRautmann" or "AgDrift").
    pub model: String,
    /// Exposure reported for cells inside applied areas.
    pub source_exposure: String,
    /// Rautmann field-trial crop class.
    pub crop_class: String,
    /// Lower bound applied to nonzero source-sink distances.
    pub minimum_distance: f32,
    /// Land-use/land-cover classes of drift-filtering landscape features.
    pub filtering_types: Vec<u16>,
    /// Minimum intersection length before a filtering feature takes effect.
    pub filtering_min_width: f32,
    /// Magnitude of the filtering effect, in [0, 1].
    pub filtering_fraction: f32,
    /// AgDrift boom height ("low" or "high").
    pub boom_height: String,
    /// AgDrift droplet size spectrum ("fine" or "medium").
    pub droplet_size: String,
    /// AgDrift deposition quantile (0.5 or 0.9).
    pub ag_drift_quantile: f32,
    /// Random seed for the model; already resolved to a nonzero value.
    pub random_seed: i64,
    /// Wind direction, global or sampled per application.
    pub wind_direction: WindDirection,
    /// Land-use/land-cover type code of each landscape geometry, in
    /// geometry order.
    pub feature_types: Vec<u16>,
}

impl Default for DriftParameters {
    fn default() -> Self {
        Self {
            habitat_types: String::new(),
            field_distance_sd: 0.0,
            ep_distance_sd: 0.0,
            reporting_threshold: 0.0,
            apply_simple_drift_filtering: false,
            model: "XSprayDrift".to_string(),
            source_exposure: "NA".to_string(),
            crop_class: "arable".to_string(),
            minimum_distance: 0.0,
            filtering_types: Vec::new(),
            filtering_min_width: 0.0,
            filtering_fraction: 0.0,
            boom_height: "low".to_string(),
            droplet_size: "fine".to_string(),
            ag_drift_quantile: 0.9,
            random_seed: 1,
            wind_direction: WindDirection::Global(270),
            feature_types: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_layout_parse() {
        assert_eq!(OutputLayout::parse("1sqm"), Some(OutputLayout::Raster1Sqm));
        assert_eq!(
            OutputLayout::parse("base_geometry"),
            Some(OutputLayout::BaseGeometry)
        );
        assert_eq!(OutputLayout::parse("per_field"), None);
    }

    #[test]
    fn test_generation_default_is_current() {
        assert_eq!(Generation::default(), Generation::Current);
    }
}
