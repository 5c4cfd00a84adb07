//! Partitioning of an array shape into contiguous streaming blocks.

use std::ops::Range;

/// Split `shape` into non-overlapping blocks of at most `block_shape` per
/// axis, iterated in row-major order over the block grid.
///
/// Blocks at the upper edge of an axis are clamped to the array bound, so
/// the union of all returned blocks covers the shape exactly once. A zero
/// extent on any axis yields no blocks.
pub fn block_slices(shape: &[u64], block_shape: &[u64]) -> Vec<Vec<Range<u64>>> {
    assert_eq!(shape.len(), block_shape.len());
    if shape.iter().any(|&extent| extent == 0) {
        return Vec::new();
    }
    let counts: Vec<u64> = shape
        .iter()
        .zip(block_shape)
        .map(|(&extent, &block)| extent.div_ceil(block.max(1)))
        .collect();
    let total: u64 = counts.iter().product();

    let mut blocks = Vec::with_capacity(total as usize);
    let mut index = vec![0u64; shape.len()];
    for _ in 0..total {
        let block = index
            .iter()
            .zip(block_shape)
            .zip(shape)
            .map(|((&i, &block), &extent)| {
                let start = i * block.max(1);
                start..(start + block.max(1)).min(extent)
            })
            .collect();
        blocks.push(block);
        // Row-major increment: last axis varies fastest.
        for axis in (0..index.len()).rev() {
            index[axis] += 1;
            if index[axis] < counts[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(block: &[Range<u64>]) -> Vec<Vec<u64>> {
        let mut out = vec![Vec::new()];
        for range in block {
            let mut next = Vec::new();
            for cell in &out {
                for value in range.clone() {
                    let mut cell = cell.clone();
                    cell.push(value);
                    next.push(cell);
                }
            }
            out = next;
        }
        out
    }

    #[test]
    fn exact_cover_without_overlap() {
        for multiple in [1u64, 5, 20] {
            let shape = [10u64, 3];
            let block_shape = [multiple * 2, multiple];
            let blocks = block_slices(&shape, &block_shape);

            let mut seen = std::collections::HashSet::new();
            for block in &blocks {
                for cell in cells(block) {
                    assert!(seen.insert(cell), "cell covered twice");
                }
            }
            assert_eq!(seen.len(), 30);
        }
    }

    #[test]
    fn row_major_block_order() {
        let blocks = block_slices(&[4, 4], &[2, 2]);
        let starts: Vec<Vec<u64>> = blocks
            .iter()
            .map(|block| block.iter().map(|r| r.start).collect())
            .collect();
        assert_eq!(
            starts,
            vec![vec![0, 0], vec![0, 2], vec![2, 0], vec![2, 2]]
        );
    }

    #[test]
    fn edge_blocks_are_clamped() {
        let blocks = block_slices(&[7], &[5]);
        assert_eq!(blocks, vec![vec![0..5], vec![5..7]]);
    }

    #[test]
    fn empty_axis_yields_no_blocks() {
        assert!(block_slices(&[0, 4], &[2, 2]).is_empty());
    }
}
