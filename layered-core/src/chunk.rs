//! Column chunk planning
//!
//! Columns are split into contiguous chunks so that a few large values only
//! widen the rows of the chunk they fall in. Columns are stored as offsets
//! from the start of their chunk, so the chunk size is bounded by the
//! offset type.

use crate::error::{LayeredError, Result};

/// Unsigned integer type used for intra-chunk column offsets
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OffsetWidth {
    U8,
    #[default]
    U16,
    U32,
}

impl OffsetWidth {
    /// Number of bits in the offset type
    pub const fn bits(self) -> u32 {
        match self {
            OffsetWidth::U8 => 8,
            OffsetWidth::U16 => 16,
            OffsetWidth::U32 => 32,
        }
    }

    /// Largest chunk size addressable with this offset type, saturated to
    /// `usize::MAX` on targets where it does not fit
    pub const fn max_chunk_size(self) -> usize {
        let limit = 1u64 << self.bits();
        if limit > usize::MAX as u64 {
            usize::MAX
        } else {
            limit as usize
        }
    }

    /// Parse from the bit count (8, 16 or 32)
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(OffsetWidth::U8),
            16 => Some(OffsetWidth::U16),
            32 => Some(OffsetWidth::U32),
            _ => None,
        }
    }
}

impl core::fmt::Display for OffsetWidth {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "u{}", self.bits())
    }
}

/// Validate a requested chunk size against the offset type
///
/// Sizes the offset type cannot index are silently reduced to
/// `max(offset) + 1`. A zero size is an error.
pub const fn check_chunk_size(requested: usize, offset: OffsetWidth) -> Result<usize> {
    if requested == 0 {
        return Err(LayeredError::NonPositiveChunkSize);
    }
    let limit = offset.max_chunk_size();
    if requested > limit {
        Ok(limit)
    } else {
        Ok(requested)
    }
}

/// Partitioning of the columns of a matrix into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    ncol: usize,
    chunk_size: usize,
    num_chunks: usize,
    last_width: usize,
}

impl ChunkPlan {
    /// Plan the chunks for `ncol` columns
    pub const fn new(ncol: usize, requested: usize, offset: OffsetWidth) -> Result<Self> {
        let chunk_size = match check_chunk_size(requested, offset) {
            Ok(size) => size,
            Err(e) => return Err(e),
        };

        let leftovers = ncol % chunk_size;
        let full = ncol / chunk_size;
        let num_chunks = if leftovers != 0 { full + 1 } else { full };
        let num_chunks = if num_chunks == 0 { 1 } else { num_chunks };
        let last_width = if leftovers != 0 { leftovers } else if ncol == 0 { 0 } else { chunk_size };

        Ok(Self {
            ncol,
            chunk_size,
            num_chunks,
            last_width,
        })
    }

    /// Total number of columns
    pub const fn ncol(&self) -> usize {
        self.ncol
    }

    /// Effective chunk size after capping
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of chunks, at least one
    pub const fn num_chunks(&self) -> usize {
        self.num_chunks
    }

    /// Width of the final chunk
    pub const fn last_width(&self) -> usize {
        self.last_width
    }

    /// First column of `chunk`
    pub const fn chunk_start(&self, chunk: usize) -> usize {
        chunk * self.chunk_size
    }

    /// Number of columns in `chunk`
    pub const fn chunk_width(&self, chunk: usize) -> usize {
        if chunk + 1 == self.num_chunks {
            self.last_width
        } else {
            self.chunk_size
        }
    }

    /// Map a column to its chunk and intra-chunk offset
    #[inline]
    pub const fn locate(&self, column: usize) -> (usize, usize) {
        (column / self.chunk_size, column % self.chunk_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_chunk_size() {
        assert_eq!(check_chunk_size(10, OffsetWidth::U8), Ok(10));
        assert_eq!(check_chunk_size(1000, OffsetWidth::U8), Ok(256));
        assert_eq!(check_chunk_size(256, OffsetWidth::U8), Ok(256));
        assert_eq!(check_chunk_size(1000, OffsetWidth::U16), Ok(1000));
        assert_eq!(check_chunk_size(100_000, OffsetWidth::U16), Ok(65536));
        assert_eq!(check_chunk_size(65536, OffsetWidth::U16), Ok(65536));
        assert_eq!(
            check_chunk_size(0, OffsetWidth::U16),
            Err(LayeredError::NonPositiveChunkSize)
        );
        assert_eq!(
            check_chunk_size(0, OffsetWidth::U32),
            Err(LayeredError::NonPositiveChunkSize)
        );
    }

    #[test]
    fn test_plan_with_remainder() {
        let plan = ChunkPlan::new(5, 3, OffsetWidth::U16).unwrap();
        assert_eq!(plan.num_chunks(), 2);
        assert_eq!(plan.chunk_width(0), 3);
        assert_eq!(plan.chunk_width(1), 2);
        assert_eq!(plan.locate(4), (1, 1));
        assert_eq!(plan.chunk_start(1), 3);
    }

    #[test]
    fn test_plan_divides_evenly() {
        let plan = ChunkPlan::new(9, 3, OffsetWidth::U16).unwrap();
        assert_eq!(plan.num_chunks(), 3);
        assert_eq!(plan.last_width(), 3);
    }

    #[test]
    fn test_plan_capped_by_offset() {
        let plan = ChunkPlan::new(1000, 5000, OffsetWidth::U8).unwrap();
        assert_eq!(plan.chunk_size(), 256);
        assert_eq!(plan.num_chunks(), 4);
        assert_eq!(plan.last_width(), 1000 - 3 * 256);
        assert_eq!(plan.locate(999), (3, 999 - 768));
    }

    #[test]
    fn test_plan_empty_matrix() {
        let plan = ChunkPlan::new(0, 10, OffsetWidth::U16).unwrap();
        assert_eq!(plan.num_chunks(), 1);
        assert_eq!(plan.chunk_width(0), 0);
    }

    #[test]
    fn test_every_column_maps_once() {
        let plan = ChunkPlan::new(20, 7, OffsetWidth::U16).unwrap();
        let mut seen = [0usize; 20];
        for chunk in 0..plan.num_chunks() {
            for offset in 0..plan.chunk_width(chunk) {
                seen[plan.chunk_start(chunk) + offset] += 1;
            }
        }
        assert!(seen.iter().all(|&n| n == 1));
        for c in 0..20 {
            let (chunk, offset) = plan.locate(c);
            assert_eq!(plan.chunk_start(chunk) + offset, c);
        }
    }
}
