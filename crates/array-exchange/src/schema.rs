//! On-disk node layout of the exchange container.
//!
//! These paths are the wire format shared with the external model: the model
//! reads every scale and parameter node and writes only the pre-declared
//! exposure dataset. A missing node or an unexpected shape is a fatal
//! contract violation on either side.

use drift_common::OutputLayout;

/// Name of the container directory inside the processing directory.
pub const CONTAINER_DIR: &str = "sim.x3df";
/// Subdirectory holding the staged landscape shapefile.
pub const GEOMETRY_DIR: &str = "geom";
/// File name of the landscape shapefile, referenced by the base_geometry
/// scale.
pub const BASE_SHAPEFILE: &str = "base.shp";
/// File name of the applied-area shapefile in the processing directory.
pub const PPM_SHAPEFILE: &str = "ppm.shp";

pub const DIM_TIME: &str = "/dims/time";
pub const DIM_SPACE: &str = "/dims/space";

pub const SCALE_SIMULATION: &str = "/scales/0/simulation";
pub const SCALE_DAY: &str = "/scales/0/day";
pub const SCALE_REGION: &str = "/scales/1/region";
pub const SCALE_BASE_GEOMETRY: &str = "/scales/1/base_geometry";
pub const SCALE_1SQM: &str = "/scales/1/1sqm";

pub const PPM_SHAPEFILE_NODE: &str = "/data/simulation/region/ppm/shapefile";
pub const FEATURE_TYPE_NODE: &str = "/data/simulation/base_geometry/landscape/feature_type";
pub const WIND_DIRECTION_NODE: &str = "/data/simulation/region/weather/wind_direction";

pub const EXPOSURE_BASE_GEOMETRY: &str = "/data/day/base_geometry/spray_drift/exposure";
pub const EXPOSURE_1SQM: &str = "/data/day/1sqm/spray_drift/exposure";

/// Node path of a spray-drift control parameter.
pub fn param_node(name: &str) -> String {
    format!("/data/simulation/region/spray_drift/params/{name}")
}

/// Node path of the exposure dataset for the chosen output layout.
pub fn exposure_node(layout: OutputLayout) -> &'static str {
    match layout {
        OutputLayout::BaseGeometry => EXPOSURE_BASE_GEOMETRY,
        OutputLayout::Raster1Sqm => EXPOSURE_1SQM,
    }
}
