//! Geometry records exchanged with the host.

use chrono::NaiveDate;

/// One spray application: the applied area in well-known-byte encoding plus
/// the attributes staged alongside it for the external model.
///
/// Records are immutable once read from the host and are written exactly
/// once into the applied-area vector file.
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    /// Applied-area polygon, well-known-byte encoded.
    pub geometry: Vec<u8>,
    /// Identifier of the applied field.
    pub field_id: i32,
    /// Day on which the application takes place.
    pub date: NaiveDate,
    /// Application rate; its physical unit is carried by the host parameter
    /// and propagated into the output descriptor.
    pub rate: f64,
    /// Technology drift reduction as a fraction in [0, 1].
    pub drift_reduction: f64,
}
