//! The chunked array-write capability provided by the host.

use std::ops::Range;

use thiserror::Error;

use array_exchange::ExposureDescriptor;

#[derive(Debug, Error)]
#[error("output sink error: {0}")]
pub struct SinkError(pub String);

/// Write access to the host's output store.
///
/// The descriptor must be declared exactly once before any block write.
/// Block writes address pre-declared cells by absolute slice and never
/// resize the dataset.
pub trait OutputSink {
    fn declare(&mut self, descriptor: &ExposureDescriptor) -> Result<(), SinkError>;

    /// Write one block of values at the given absolute per-axis ranges.
    /// When `track_maximum` is set the sink keeps a running maximum over all
    /// written values for later reporting.
    fn write_block(
        &mut self,
        slices: &[Range<u64>],
        values: &[f32],
        track_maximum: bool,
    ) -> Result<(), SinkError>;
}

/// Sink that assembles the output in memory, for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemorySink {
    descriptor: Option<ExposureDescriptor>,
    data: Vec<f32>,
    written: Vec<bool>,
    maximum: Option<f32>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn descriptor(&self) -> Option<&ExposureDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Running maximum over all values written with maximum tracking.
    pub fn maximum(&self) -> Option<f32> {
        self.maximum
    }

    /// Whether every declared cell has been written exactly once.
    pub fn is_complete(&self) -> bool {
        self.descriptor.is_some() && self.written.iter().all(|&w| w)
    }

    fn shape(&self) -> &[u64] {
        self.descriptor
            .as_ref()
            .map(|d| d.shape.as_slice())
            .unwrap_or(&[])
    }

    fn flat_index(&self, cell: &[u64]) -> usize {
        let mut index = 0u64;
        for (&extent, &coordinate) in self.shape().iter().zip(cell) {
            index = index * extent + coordinate;
        }
        index as usize
    }
}

impl OutputSink for InMemorySink {
    fn declare(&mut self, descriptor: &ExposureDescriptor) -> Result<(), SinkError> {
        if self.descriptor.is_some() {
            return Err(SinkError("descriptor declared twice".to_string()));
        }
        let cells: u64 = descriptor.shape.iter().product();
        self.data = vec![f32::NAN; cells as usize];
        self.written = vec![false; cells as usize];
        self.descriptor = Some(descriptor.clone());
        Ok(())
    }

    fn write_block(
        &mut self,
        slices: &[Range<u64>],
        values: &[f32],
        track_maximum: bool,
    ) -> Result<(), SinkError> {
        let shape = self.shape().to_vec();
        if self.descriptor.is_none() {
            return Err(SinkError("block written before declaration".to_string()));
        }
        if slices.len() != shape.len() {
            return Err(SinkError(format!(
                "block has {} axes, declared shape has {}",
                slices.len(),
                shape.len()
            )));
        }
        for (slice, &extent) in slices.iter().zip(&shape) {
            if slice.end > extent || slice.start >= slice.end {
                return Err(SinkError(format!(
                    "slice {slice:?} out of bounds for extent {extent}"
                )));
            }
        }
        let count: u64 = slices.iter().map(|s| s.end - s.start).product();
        if values.len() as u64 != count {
            return Err(SinkError(format!(
                "block holds {} values for {count} cells",
                values.len()
            )));
        }

        // Row-major walk over the block, mirroring the reader's ordering.
        let mut cell: Vec<u64> = slices.iter().map(|s| s.start).collect();
        for &value in values {
            let index = self.flat_index(&cell);
            if self.written[index] {
                return Err(SinkError(format!("cell {cell:?} written twice")));
            }
            self.data[index] = value;
            self.written[index] = true;
            if track_maximum {
                self.maximum = Some(match self.maximum {
                    Some(current) if current >= value => current,
                    _ => value,
                });
            }
            for axis in (0..cell.len()).rev() {
                cell[axis] += 1;
                if cell[axis] < slices[axis].end {
                    break;
                }
                cell[axis] = slices[axis].start;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use array_exchange::ExposureDescriptor;

    fn descriptor(shape: Vec<u64>) -> ExposureDescriptor {
        ExposureDescriptor {
            name: "exposure".to_string(),
            chunk_shape: shape.iter().map(|_| 1).collect(),
            shape,
            scale_labels: Vec::new(),
            unit: "g/ha".to_string(),
            offsets: Vec::new(),
            element_names: None,
            element_geometries: None,
        }
    }

    #[test]
    fn test_blocks_assemble_row_major() {
        let mut sink = InMemorySink::new();
        sink.declare(&descriptor(vec![2, 2])).unwrap();
        sink.write_block(&[0..2, 0..1], &[1.0, 3.0], true).unwrap();
        sink.write_block(&[0..2, 1..2], &[2.0, 4.0], true).unwrap();

        assert_eq!(sink.data(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(sink.maximum(), Some(4.0));
        assert!(sink.is_complete());
    }

    #[test]
    fn test_rejects_overlap_and_overflow() {
        let mut sink = InMemorySink::new();
        sink.declare(&descriptor(vec![2, 2])).unwrap();
        sink.write_block(&[0..1, 0..2], &[1.0, 2.0], false).unwrap();

        assert!(sink.write_block(&[0..1, 1..2], &[9.0], false).is_err());
        assert!(sink.write_block(&[1..3, 0..1], &[9.0, 9.0], false).is_err());
        assert!(!sink.is_complete());
    }

    #[test]
    fn test_write_before_declare_fails() {
        let mut sink = InMemorySink::new();
        assert!(sink.write_block(&[0..1], &[1.0], false).is_err());
    }
}
