//! First pass: per-chunk, per-row width classes and entry counts
//!
//! Row-major sources are split over row ranges; each worker owns its rows
//! outright and the pieces are stitched back together in range order.
//! Column-major sources are split over column ranges; workers may touch the
//! same rows, so each keeps a private table and the tables are merged
//! afterwards with an elementwise max of classes and sum of counts.

use crate::parallel::WorkerPool;
use layered_core::{
    categorize, ChunkPlan, Dimension, ExtractOptions, Matrix, Result, SourceValue, WidthClass,
};
use std::ops::Range;

/// Statistics of every row within one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkStatistics {
    /// Widest class needed by each row
    pub widths: Vec<WidthClass>,
    /// Number of nonzero entries of each row
    pub counts: Vec<usize>,
}

impl ChunkStatistics {
    /// Empty statistics for `nrow` rows
    pub fn new(nrow: usize) -> Self {
        Self {
            widths: vec![WidthClass::default(); nrow],
            counts: vec![0; nrow],
        }
    }

    /// Number of rows covered
    pub fn nrow(&self) -> usize {
        self.widths.len()
    }

    /// Record one nonzero entry of class `width` in `row`
    #[inline]
    pub fn record(&mut self, row: usize, width: WidthClass) {
        if width > self.widths[row] {
            self.widths[row] = width;
        }
        self.counts[row] += 1;
    }

    /// Fold another table over the same rows into this one
    pub fn merge(&mut self, other: &ChunkStatistics) {
        debug_assert_eq!(self.nrow(), other.nrow());
        for (mine, theirs) in self.widths.iter_mut().zip(&other.widths) {
            *mine = (*mine).max(*theirs);
        }
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            *mine += *theirs;
        }
    }

    /// Append the rows of `other` after the rows of this table
    fn extend(&mut self, other: ChunkStatistics) {
        self.widths.extend(other.widths);
        self.counts.extend(other.counts);
    }
}

/// Fresh per-chunk tables for `nrow` rows
pub fn empty_statistics(plan: &ChunkPlan, nrow: usize) -> Vec<ChunkStatistics> {
    (0..plan.num_chunks())
        .map(|_| ChunkStatistics::new(nrow))
        .collect()
}

/// Collect statistics, choosing the traversal the source prefers
pub fn collect_statistics<M>(
    matrix: &M,
    plan: &ChunkPlan,
    workers: &WorkerPool,
) -> Result<Vec<ChunkStatistics>>
where
    M: Matrix + ?Sized,
    M::Value: SourceValue,
{
    if matrix.prefer_rows() {
        collect_by_row(matrix, plan, workers)
    } else {
        collect_by_column(matrix, plan, workers)
    }
}

/// Row-major statistics pass
pub fn collect_by_row<M>(
    matrix: &M,
    plan: &ChunkPlan,
    workers: &WorkerPool,
) -> Result<Vec<ChunkStatistics>>
where
    M: Matrix + ?Sized,
    M::Value: SourceValue,
{
    let ranges = workers.partition(matrix.nrow());
    let pieces = workers.run(ranges, |_, rows| {
        row_worker(matrix, plan, rows)
    })?;

    let mut stats = empty_statistics(plan, 0);
    for piece in pieces {
        for (chunk, part) in stats.iter_mut().zip(piece) {
            chunk.extend(part);
        }
    }
    Ok(stats)
}

fn row_worker<M>(matrix: &M, plan: &ChunkPlan, rows: Range<usize>) -> Result<Vec<ChunkStatistics>>
where
    M: Matrix + ?Sized,
    M::Value: SourceValue,
{
    let ncol = matrix.ncol();
    let first = rows.start;
    let mut stats = empty_statistics(plan, rows.len());
    let mut values = vec![M::Value::default(); ncol];

    if matrix.is_sparse() {
        let mut indices = vec![0usize; ncol];
        let mut ext = matrix.sparse_extractor(Dimension::Row, 0..ncol, ExtractOptions::unordered());
        for r in rows {
            let count = ext.fetch(r, &mut values, &mut indices);
            for (&value, &c) in values[..count].iter().zip(&indices[..count]) {
                if !value.is_zero() {
                    let (chunk, _) = plan.locate(c);
                    stats[chunk].record(r - first, categorize(value)?);
                }
            }
        }
    } else {
        let mut ext = matrix.dense_extractor(Dimension::Row, 0..ncol);
        for r in rows {
            ext.fetch(r, &mut values);
            for (c, &value) in values.iter().enumerate() {
                if !value.is_zero() {
                    let (chunk, _) = plan.locate(c);
                    stats[chunk].record(r - first, categorize(value)?);
                }
            }
        }
    }

    Ok(stats)
}

/// Column-major statistics pass
pub fn collect_by_column<M>(
    matrix: &M,
    plan: &ChunkPlan,
    workers: &WorkerPool,
) -> Result<Vec<ChunkStatistics>>
where
    M: Matrix + ?Sized,
    M::Value: SourceValue,
{
    let nrow = matrix.nrow();
    let ranges = workers.partition(matrix.ncol());
    let tables = workers.run(ranges, |_, columns| {
        column_worker(matrix, plan, columns)
    })?;

    let mut tables = tables.into_iter();
    let mut stats = match tables.next() {
        Some(first) => first,
        None => return Ok(empty_statistics(plan, nrow)),
    };
    for table in tables {
        for (mine, theirs) in stats.iter_mut().zip(&table) {
            mine.merge(theirs);
        }
    }
    Ok(stats)
}

fn column_worker<M>(
    matrix: &M,
    plan: &ChunkPlan,
    columns: Range<usize>,
) -> Result<Vec<ChunkStatistics>>
where
    M: Matrix + ?Sized,
    M::Value: SourceValue,
{
    let nrow = matrix.nrow();
    let mut stats = empty_statistics(plan, nrow);
    let mut values = vec![M::Value::default(); nrow];

    if matrix.is_sparse() {
        let mut indices = vec![0usize; nrow];
        let mut ext =
            matrix.sparse_extractor(Dimension::Column, 0..nrow, ExtractOptions::unordered());
        for c in columns {
            let chunk = &mut stats[plan.locate(c).0];
            let count = ext.fetch(c, &mut values, &mut indices);
            for (&value, &r) in values[..count].iter().zip(&indices[..count]) {
                if !value.is_zero() {
                    chunk.record(r, categorize(value)?);
                }
            }
        }
    } else {
        let mut ext = matrix.dense_extractor(Dimension::Column, 0..nrow);
        for c in columns {
            let chunk = &mut stats[plan.locate(c).0];
            ext.fetch(c, &mut values);
            for (r, &value) in values.iter().enumerate() {
                if !value.is_zero() {
                    chunk.record(r, categorize(value)?);
                }
            }
        }
    }

    Ok(stats)
}
