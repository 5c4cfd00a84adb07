//! Shapefile writing from well-known-byte geometry records.

use std::path::Path;

use chrono::Datelike;
use geozero::wkb::Wkb;
use geozero::ToGeo;
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing, ShapeWriter, Writer};
use tracing::debug;

use drift_common::Application;

use crate::error::{Result, VectorStagingError};

/// Stage the landscape geometries as a single-layer polygon shapefile
/// without attributes.
///
/// One feature is written per record, in record order. The `.prj` sidecar
/// carries `crs_wkt` so the file is tagged with the coordinate reference of
/// the run.
pub fn stage_landscape(path: &Path, crs_wkt: &str, geometries: &[Vec<u8>]) -> Result<()> {
    let polygons = convert_all(geometries.iter().map(Vec::as_slice))?;

    let mut writer = ShapeWriter::from_path(path).map_err(|e| write_error(path, e))?;
    for polygon in &polygons {
        writer.write_shape(polygon).map_err(|e| write_error(path, e))?;
    }
    drop(writer);
    write_prj(path, crs_wkt)?;

    debug!(
        path = %path.display(),
        features = polygons.len(),
        "staged landscape geometries"
    );
    Ok(())
}

/// Stage the applied areas with their four attribute columns: integer field
/// id, application date, application rate and technology drift reduction.
pub fn stage_applications(path: &Path, crs_wkt: &str, applications: &[Application]) -> Result<()> {
    let polygons = convert_all(applications.iter().map(|a| a.geometry.as_slice()))?;

    let table = TableWriterBuilder::new()
        .add_integer_field(field_name("Field"))
        .add_date_field(field_name("Date"))
        .add_numeric_field(field_name("Rate"), 18, 6)
        .add_numeric_field(field_name("DriftRed"), 18, 6);
    let mut writer = Writer::from_path(path, table).map_err(|e| write_error(path, e))?;

    for (application, polygon) in applications.iter().zip(&polygons) {
        let mut record = Record::default();
        record.insert(
            "Field".to_string(),
            FieldValue::Integer(application.field_id),
        );
        record.insert(
            "Date".to_string(),
            FieldValue::Date(Some(dbase_date(application.date))),
        );
        record.insert(
            "Rate".to_string(),
            FieldValue::Numeric(Some(application.rate)),
        );
        record.insert(
            "DriftRed".to_string(),
            FieldValue::Numeric(Some(application.drift_reduction)),
        );
        writer
            .write_shape_and_record(polygon, &record)
            .map_err(|e| write_error(path, e))?;
    }
    drop(writer);
    write_prj(path, crs_wkt)?;

    debug!(
        path = %path.display(),
        features = applications.len(),
        "staged applied areas"
    );
    Ok(())
}

/// Convert every record up front so a conversion failure happens before any
/// file is created.
fn convert_all<'a>(geometries: impl Iterator<Item = &'a [u8]>) -> Result<Vec<Polygon>> {
    geometries
        .enumerate()
        .map(|(index, wkb)| convert(index, wkb))
        .collect()
}

fn convert(index: usize, wkb: &[u8]) -> Result<Polygon> {
    let geometry = Wkb(wkb.to_vec())
        .to_geo()
        .map_err(|e| VectorStagingError::GeometryConversion {
            index,
            message: e.to_string(),
        })?;
    let polygon = match geometry {
        geo_types::Geometry::Polygon(polygon) => polygon,
        _ => {
            return Err(VectorStagingError::GeometryConversion {
                index,
                message: "expected a polygon geometry".to_string(),
            })
        }
    };

    let mut rings = vec![PolygonRing::Outer(ring_points(polygon.exterior()))];
    for interior in polygon.interiors() {
        rings.push(PolygonRing::Inner(ring_points(interior)));
    }
    Ok(Polygon::with_rings(rings))
}

fn ring_points(ring: &geo_types::LineString<f64>) -> Vec<Point> {
    ring.coords().map(|c| Point::new(c.x, c.y)).collect()
}

fn dbase_date(date: chrono::NaiveDate) -> shapefile::dbase::Date {
    shapefile::dbase::Date::new(date.day(), date.month(), date.year() as u32)
}

fn field_name(name: &str) -> FieldName {
    FieldName::try_from(name).expect("static field name")
}

fn write_prj(path: &Path, crs_wkt: &str) -> Result<()> {
    std::fs::write(path.with_extension("prj"), crs_wkt)?;
    Ok(())
}

fn write_error(path: &Path, error: shapefile::Error) -> VectorStagingError {
    VectorStagingError::Write {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}
