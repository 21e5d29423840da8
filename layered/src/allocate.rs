//! Row allocation: bucket assignment and exact-size storage
//!
//! Rows are assigned to the bucket of their width class in ascending row
//! order. Each bucket's row boundaries are the running sum of its rows'
//! counts, so once every row has been seen the final boundary is the exact
//! number of entries to allocate.

use crate::stats::ChunkStatistics;
use layered_core::{ColumnOffset, StoredValue, WidthClass};
use std::ops::Range;

/// Ragged storage for the rows of one chunk assigned to one width class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket<V, C> {
    /// Stored values, grouped by row
    pub values: Vec<V>,
    /// Intra-chunk column offset of each value
    pub offsets: Vec<C>,
    /// Row boundaries; row `k` occupies `pointers[k]..pointers[k + 1]`
    pub pointers: Vec<usize>,
}

impl<V: StoredValue, C: ColumnOffset> Bucket<V, C> {
    fn new() -> Self {
        Self {
            values: Vec::new(),
            offsets: Vec::new(),
            pointers: vec![0],
        }
    }

    /// Append a row of `count` entries, returning its position
    fn push_row(&mut self, count: usize) -> usize {
        let position = self.pointers.len() - 1;
        let end = self.pointers[position] + count;
        self.pointers.push(end);
        position
    }

    /// Allocate value and offset storage for exactly the recorded entries
    fn allocate(&mut self) {
        let total = self.total();
        self.values = vec![V::default(); total];
        self.offsets = vec![C::default(); total];
    }

    /// Number of rows assigned
    pub fn nrow(&self) -> usize {
        self.pointers.len() - 1
    }

    /// Number of entries across all rows
    pub fn total(&self) -> usize {
        *self.pointers.last().unwrap_or(&0)
    }

    /// Entry range of the row at `position`
    #[inline]
    pub fn row_range(&self, position: usize) -> Range<usize> {
        self.pointers[position]..self.pointers[position + 1]
    }

    /// Sort every row by column offset, skipping rows already in order
    pub fn sort_rows(&mut self) {
        let mut buffer: Vec<(C, V)> = Vec::new();
        for position in 0..self.nrow() {
            let range = self.row_range(position);
            let offsets = &self.offsets[range.clone()];
            if offsets.windows(2).all(|w| w[0] <= w[1]) {
                continue;
            }

            buffer.clear();
            buffer.extend(
                offsets
                    .iter()
                    .copied()
                    .zip(self.values[range.clone()].iter().copied()),
            );
            buffer.sort_unstable();
            for (i, (offset, value)) in range.zip(buffer.iter().copied()) {
                self.offsets[i] = offset;
                self.values[i] = value;
            }
        }
    }
}

/// Bucket and position of every row in a chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowAssignment {
    pub widths: Vec<WidthClass>,
    pub positions: Vec<usize>,
}

/// Everything built for one chunk by the allocator
#[derive(Debug, Clone)]
pub struct ChunkAllocation<C> {
    pub assignment: RowAssignment,
    /// Original rows of each bucket, indexed by [`WidthClass::index`]
    pub identities: [Vec<usize>; 3],
    pub bucket8: Bucket<u8, C>,
    pub bucket16: Bucket<u16, C>,
    pub bucket32: Bucket<u32, C>,
}

impl<C: ColumnOffset> ChunkAllocation<C> {
    /// Number of rows in the chunk
    pub fn nrow(&self) -> usize {
        self.assignment.widths.len()
    }

    /// Entry range reserved for `row`
    #[inline]
    pub fn row_range(&self, row: usize) -> Range<usize> {
        let position = self.assignment.positions[row];
        match self.assignment.widths[row] {
            WidthClass::U8 => self.bucket8.row_range(position),
            WidthClass::U16 => self.bucket16.row_range(position),
            WidthClass::U32 => self.bucket32.row_range(position),
        }
    }

    /// Sort every bucket's rows by column offset
    pub fn sort_rows(&mut self) {
        self.bucket8.sort_rows();
        self.bucket16.sort_rows();
        self.bucket32.sort_rows();
    }
}

/// Assign rows to buckets and allocate each bucket once
///
/// Rows without entries in a chunk land in the 8-bit bucket with an empty
/// slice, so every row keeps a place in every chunk.
pub fn allocate_rows<C: ColumnOffset>(stats: Vec<ChunkStatistics>) -> Vec<ChunkAllocation<C>> {
    stats.into_iter().map(allocate_chunk).collect()
}

fn allocate_chunk<C: ColumnOffset>(stats: ChunkStatistics) -> ChunkAllocation<C> {
    let nrow = stats.nrow();
    let mut bucket8 = Bucket::<u8, C>::new();
    let mut bucket16 = Bucket::<u16, C>::new();
    let mut bucket32 = Bucket::<u32, C>::new();
    let mut identities: [Vec<usize>; 3] = Default::default();
    let mut positions = Vec::with_capacity(nrow);

    for (row, (&width, &count)) in stats.widths.iter().zip(&stats.counts).enumerate() {
        let position = match width {
            WidthClass::U8 => bucket8.push_row(count),
            WidthClass::U16 => bucket16.push_row(count),
            WidthClass::U32 => bucket32.push_row(count),
        };
        identities[width.index()].push(row);
        positions.push(position);
    }

    bucket8.allocate();
    bucket16.allocate();
    bucket32.allocate();

    ChunkAllocation {
        assignment: RowAssignment {
            widths: stats.widths,
            positions,
        },
        identities,
        bucket8,
        bucket16,
        bucket32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(widths: &[WidthClass], counts: &[usize]) -> ChunkStatistics {
        ChunkStatistics {
            widths: widths.to_vec(),
            counts: counts.to_vec(),
        }
    }

    #[test]
    fn test_assignment_and_exact_allocation() {
        use WidthClass::*;
        let chunk = stats(&[U8, U32, U8, U16, U32], &[2, 1, 0, 3, 4]);
        let alloc = allocate_rows::<u16>(vec![chunk]).remove(0);

        assert_eq!(alloc.identities[0], vec![0, 2]);
        assert_eq!(alloc.identities[1], vec![3]);
        assert_eq!(alloc.identities[2], vec![1, 4]);
        assert_eq!(alloc.assignment.positions, vec![0, 0, 1, 0, 1]);

        assert_eq!(alloc.bucket8.pointers, vec![0, 2, 2]);
        assert_eq!(alloc.bucket16.pointers, vec![0, 3]);
        assert_eq!(alloc.bucket32.pointers, vec![0, 1, 5]);
        assert_eq!(alloc.bucket8.values.len(), 2);
        assert_eq!(alloc.bucket16.offsets.len(), 3);
        assert_eq!(alloc.bucket32.values.len(), 5);

        assert_eq!(alloc.row_range(4), 1..5);
        assert_eq!(alloc.row_range(2), 2..2);
    }

    #[test]
    fn test_empty_rows_stay_visible() {
        let chunk = ChunkStatistics::new(3);
        let alloc = allocate_rows::<u8>(vec![chunk]).remove(0);
        assert_eq!(alloc.identities[0], vec![0, 1, 2]);
        assert_eq!(alloc.bucket8.nrow(), 3);
        assert_eq!(alloc.bucket8.total(), 0);
        assert_eq!(alloc.bucket32.nrow(), 0);
    }

    #[test]
    fn test_sort_rows_only_touches_unsorted() {
        let mut bucket = Bucket::<u16, u16> {
            values: vec![1, 2, 30, 10, 20],
            offsets: vec![0, 5, 9, 1, 4],
            pointers: vec![0, 2, 5],
        };
        bucket.sort_rows();
        assert_eq!(bucket.offsets, vec![0, 5, 1, 4, 9]);
        assert_eq!(bucket.values, vec![1, 2, 10, 20, 30]);
    }
}
