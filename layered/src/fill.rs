//! Second pass: writing values and offsets into the allocated buckets
//!
//! Rows are assigned to bucket positions in ascending order, so the rows of
//! a contiguous row range occupy one contiguous entry range of every
//! bucket. Before the parallel region the bucket arrays are split into one
//! disjoint mutable slice per worker; each worker then writes through
//! cursors that start at its rows' boundaries and only move forward.

use crate::allocate::{Bucket, ChunkAllocation, RowAssignment};
use crate::parallel::WorkerPool;
use layered_core::{
    ChunkPlan, ColumnOffset, Dimension, ExtractOptions, LayeredError, Matrix, Result,
    SourceValue, StoredValue, WidthClass,
};
use std::ops::Range;

/// Next slot to write for one row of one chunk
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Cursor {
    next: usize,
    end: usize,
}

impl Cursor {
    fn new(range: Range<usize>) -> Self {
        Self {
            next: range.start,
            end: range.end,
        }
    }

    /// Whether every reserved slot has been written
    pub(crate) fn is_complete(&self) -> bool {
        self.next == self.end
    }
}

/// Mutable window onto part of a bucket's entries
struct BucketSlice<'a, V, C> {
    values: &'a mut [V],
    offsets: &'a mut [C],
    /// Bucket-level index of the first entry in this window
    base: usize,
}

impl<V: StoredValue, C: ColumnOffset> BucketSlice<'_, V, C> {
    #[inline]
    fn write(&mut self, at: usize, offset: C, value: u32) -> Result<()> {
        // The row's class was computed as its maximum; a wider value means
        // the source changed between passes.
        let value = V::narrow(value).ok_or(LayeredError::InconsistentSource)?;
        let i = at - self.base;
        self.values[i] = value;
        self.offsets[i] = offset;
        Ok(())
    }
}

/// One worker's writable share of one chunk
pub(crate) struct ChunkTarget<'a, C> {
    assignment: &'a RowAssignment,
    pointers: [&'a [usize]; 3],
    slice8: BucketSlice<'a, u8, C>,
    slice16: BucketSlice<'a, u16, C>,
    slice32: BucketSlice<'a, u32, C>,
}

impl<C: ColumnOffset> ChunkTarget<'_, C> {
    /// Cursor positioned at the start of `row`'s reserved entries
    #[inline]
    pub(crate) fn cursor(&self, row: usize) -> Cursor {
        let width = self.assignment.widths[row];
        let position = self.assignment.positions[row];
        let pointers = self.pointers[width.index()];
        Cursor::new(pointers[position]..pointers[position + 1])
    }

    /// Write one entry of `row` at its cursor and advance the cursor
    #[inline]
    pub(crate) fn write(
        &mut self,
        row: usize,
        cursor: &mut Cursor,
        offset: usize,
        value: u32,
    ) -> Result<()> {
        if cursor.next >= cursor.end {
            return Err(LayeredError::InconsistentSource);
        }
        let offset = C::from_usize(offset);
        match self.assignment.widths[row] {
            WidthClass::U8 => self.slice8.write(cursor.next, offset, value)?,
            WidthClass::U16 => self.slice16.write(cursor.next, offset, value)?,
            WidthClass::U32 => self.slice32.write(cursor.next, offset, value)?,
        }
        cursor.next += 1;
        Ok(())
    }
}

fn split_bucket<'a, V, C>(
    bucket: &'a mut Bucket<V, C>,
    identities: &[usize],
    ranges: &[Range<usize>],
) -> (&'a [usize], Vec<BucketSlice<'a, V, C>>) {
    let Bucket {
        values,
        offsets,
        pointers,
    } = bucket;
    let pointers: &'a [usize] = pointers;
    let mut rest_values: &'a mut [V] = values;
    let mut rest_offsets: &'a mut [C] = offsets;
    let mut consumed = 0;
    let mut slices = Vec::with_capacity(ranges.len());

    for range in ranges {
        let first = identities.partition_point(|&r| r < range.start);
        let last = identities.partition_point(|&r| r < range.end);
        debug_assert_eq!(pointers[first], consumed);
        let end = pointers[last];

        let (values, tail_values) = std::mem::take(&mut rest_values).split_at_mut(end - consumed);
        let (offsets, tail_offsets) =
            std::mem::take(&mut rest_offsets).split_at_mut(end - consumed);
        slices.push(BucketSlice {
            values,
            offsets,
            base: consumed,
        });

        rest_values = tail_values;
        rest_offsets = tail_offsets;
        consumed = end;
    }

    (pointers, slices)
}

/// Split every chunk's buckets into one writable target per row range
///
/// `ranges` must be contiguous, ascending and start at row zero. The result
/// is indexed by range, then by chunk.
pub(crate) fn split_targets<'a, C: ColumnOffset>(
    allocations: &'a mut [ChunkAllocation<C>],
    ranges: &[Range<usize>],
) -> Vec<Vec<ChunkTarget<'a, C>>> {
    let mut targets: Vec<Vec<ChunkTarget<'a, C>>> = (0..ranges.len())
        .map(|_| Vec::with_capacity(allocations.len()))
        .collect();

    for allocation in allocations.iter_mut() {
        let ChunkAllocation {
            assignment,
            identities,
            bucket8,
            bucket16,
            bucket32,
        } = allocation;
        let assignment: &'a RowAssignment = assignment;

        let (pointers8, slices8) = split_bucket(bucket8, &identities[0], ranges);
        let (pointers16, slices16) = split_bucket(bucket16, &identities[1], ranges);
        let (pointers32, slices32) = split_bucket(bucket32, &identities[2], ranges);

        let slices = slices8.into_iter().zip(slices16).zip(slices32);
        for (worker, ((slice8, slice16), slice32)) in targets.iter_mut().zip(slices) {
            worker.push(ChunkTarget {
                assignment,
                pointers: [pointers8, pointers16, pointers32],
                slice8,
                slice16,
                slice32,
            });
        }
    }

    targets
}

/// Fill the buckets, mirroring the traversal the statistics pass used
pub fn fill_buckets<M, C>(
    matrix: &M,
    plan: &ChunkPlan,
    allocations: &mut [ChunkAllocation<C>],
    workers: &WorkerPool,
) -> Result<()>
where
    M: Matrix + ?Sized,
    M::Value: SourceValue,
    C: ColumnOffset,
{
    let ranges = workers.partition(matrix.nrow());
    let targets = split_targets(allocations, &ranges);
    let work: Vec<_> = ranges.into_iter().zip(targets).collect();

    if matrix.prefer_rows() {
        workers.run(work, |_, (rows, targets)| {
            fill_row_worker(matrix, plan, rows, targets)
        })?;
    } else {
        workers.run(work, |_, (rows, targets)| {
            fill_column_worker(matrix, plan, rows, targets)
        })?;
    }
    Ok(())
}

fn fill_row_worker<M, C>(
    matrix: &M,
    plan: &ChunkPlan,
    rows: Range<usize>,
    mut targets: Vec<ChunkTarget<'_, C>>,
) -> Result<()>
where
    M: Matrix + ?Sized,
    M::Value: SourceValue,
    C: ColumnOffset,
{
    let ncol = matrix.ncol();
    let mut values = vec![M::Value::default(); ncol];
    let mut cursors = vec![Cursor::default(); targets.len()];

    let mut sparse = if matrix.is_sparse() {
        Some((
            matrix.sparse_extractor(Dimension::Row, 0..ncol, ExtractOptions::default()),
            vec![0usize; ncol],
        ))
    } else {
        None
    };
    let mut dense = if sparse.is_none() {
        Some(matrix.dense_extractor(Dimension::Row, 0..ncol))
    } else {
        None
    };

    for r in rows {
        for (cursor, target) in cursors.iter_mut().zip(&targets) {
            *cursor = target.cursor(r);
        }

        if let Some((ext, indices)) = sparse.as_mut() {
            let count = ext.fetch(r, &mut values, indices);
            for (&value, &c) in values[..count].iter().zip(&indices[..count]) {
                if !value.is_zero() {
                    let (chunk, offset) = plan.locate(c);
                    targets[chunk].write(r, &mut cursors[chunk], offset, value.to_u32()?)?;
                }
            }
        } else if let Some(ext) = dense.as_mut() {
            ext.fetch(r, &mut values);
            for (c, &value) in values.iter().enumerate() {
                if !value.is_zero() {
                    let (chunk, offset) = plan.locate(c);
                    targets[chunk].write(r, &mut cursors[chunk], offset, value.to_u32()?)?;
                }
            }
        }

        if !cursors.iter().all(Cursor::is_complete) {
            return Err(LayeredError::InconsistentSource);
        }
    }

    Ok(())
}

fn fill_column_worker<M, C>(
    matrix: &M,
    plan: &ChunkPlan,
    rows: Range<usize>,
    mut targets: Vec<ChunkTarget<'_, C>>,
) -> Result<()>
where
    M: Matrix + ?Sized,
    M::Value: SourceValue,
    C: ColumnOffset,
{
    let first = rows.start;
    let length = rows.len();

    // Rows are visited interleaved across columns, so every (chunk, row)
    // pair needs its own cursor.
    let mut cursors: Vec<Vec<Cursor>> = targets
        .iter()
        .map(|target| rows.clone().map(|r| target.cursor(r)).collect())
        .collect();

    let mut values = vec![M::Value::default(); length];
    if matrix.is_sparse() {
        let mut indices = vec![0usize; length];
        let mut ext =
            matrix.sparse_extractor(Dimension::Column, rows.clone(), ExtractOptions::default());
        for c in 0..matrix.ncol() {
            let (chunk, offset) = plan.locate(c);
            let target = &mut targets[chunk];
            let chunk_cursors = &mut cursors[chunk];
            let count = ext.fetch(c, &mut values, &mut indices);
            for (&value, &r) in values[..count].iter().zip(&indices[..count]) {
                if !value.is_zero() {
                    target.write(r, &mut chunk_cursors[r - first], offset, value.to_u32()?)?;
                }
            }
        }
    } else {
        let mut ext = matrix.dense_extractor(Dimension::Column, rows.clone());
        for c in 0..matrix.ncol() {
            let (chunk, offset) = plan.locate(c);
            let target = &mut targets[chunk];
            let chunk_cursors = &mut cursors[chunk];
            ext.fetch(c, &mut values);
            for (i, &value) in values.iter().enumerate() {
                if !value.is_zero() {
                    target.write(first + i, &mut chunk_cursors[i], offset, value.to_u32()?)?;
                }
            }
        }
    }

    if !cursors.iter().flatten().all(Cursor::is_complete) {
        return Err(LayeredError::InconsistentSource);
    }
    Ok(())
}
