//! Conversion of an extractable matrix into a layered matrix
//!
//! The build runs in strict phases: plan the chunks, collect statistics,
//! allocate every bucket once, fill, then consolidate into views. The
//! engine is generic over the column offset type; the configured
//! [`OffsetWidth`] picks the instantiation.

use crate::allocate::{allocate_rows, ChunkAllocation};
use crate::config::LayeredConfig;
use crate::consolidate::consolidate;
use crate::fill::fill_buckets;
use crate::parallel::WorkerPool;
use crate::layered_matrix::{LayeredMatrix, LayeredStorage};
use crate::stats::{collect_statistics, ChunkStatistics};
use crate::view::View;
use layered_core::{
    ChunkPlan, ColumnOffset, Matrix, MatrixElement, OffsetWidth, Result, SourceValue,
};
use log::{debug, info, warn};

/// Build a layered matrix from any matrix of non-negative integers
///
/// Both passes read `matrix` in its preferred traversal order. Negative,
/// NaN, or too-large values abort the build.
///
/// # Examples
///
/// ```
/// use layered::{convert_to_layered, DenseMatrix, LayeredConfig, LayeredMatrix, MatrixOperations};
///
/// let dense = DenseMatrix::row_major(2, 3, vec![0u32, 7, 0, 300, 0, 1]).unwrap();
/// let config = LayeredConfig::default().with_chunk_size(2);
/// let layered: LayeredMatrix<f64> = convert_to_layered(&dense, &config).unwrap();
/// assert_eq!(layered.dense_row(1), vec![300.0, 0.0, 1.0]);
/// ```
pub fn convert_to_layered<T, M>(matrix: &M, config: &LayeredConfig) -> Result<LayeredMatrix<T>>
where
    T: MatrixElement,
    M: Matrix + ?Sized,
    M::Value: SourceValue,
{
    config.validate()?;
    let plan = plan_chunks(matrix.ncol(), config)?;
    let workers = WorkerPool::new(config.num_threads)?;

    let storage = match config.offset_width {
        OffsetWidth::U8 => LayeredStorage::U8(build::<M, u8>(matrix, &plan, &workers)?),
        OffsetWidth::U16 => LayeredStorage::U16(build::<M, u16>(matrix, &plan, &workers)?),
        OffsetWidth::U32 => LayeredStorage::U32(build::<M, u32>(matrix, &plan, &workers)?),
    };

    let layered = LayeredMatrix::new(storage, plan);
    info!(
        "built {} x {} layered matrix in {} chunks using {} threads",
        matrix.nrow(),
        matrix.ncol(),
        plan.num_chunks(),
        workers.num_threads()
    );
    Ok(layered)
}

/// Plan the chunks, reporting when the offset width caps the chunk size
pub(crate) fn plan_chunks(ncol: usize, config: &LayeredConfig) -> Result<ChunkPlan> {
    let plan = ChunkPlan::new(ncol, config.chunk_size, config.offset_width)?;
    if plan.chunk_size() < config.chunk_size {
        warn!(
            "chunk size {} cannot be addressed by {} offsets, using {}",
            config.chunk_size,
            config.offset_width,
            plan.chunk_size()
        );
    }
    debug!(
        "planned {} chunks of {} columns, last chunk {} wide",
        plan.num_chunks(),
        plan.chunk_size(),
        plan.last_width()
    );
    Ok(plan)
}

fn build<M, C>(matrix: &M, plan: &ChunkPlan, workers: &WorkerPool) -> Result<View<C>>
where
    M: Matrix + ?Sized,
    M::Value: SourceValue,
    C: ColumnOffset,
{
    let stats = collect_statistics(matrix, plan, workers)?;
    debug!(
        "collected statistics over {} rows ({})",
        matrix.nrow(),
        if matrix.prefer_rows() { "row-major" } else { "column-major" }
    );

    let mut allocations = allocate(stats);
    fill_buckets(matrix, plan, &mut allocations, workers)?;
    debug!("filled {} chunks", allocations.len());

    Ok(finish(allocations, plan, matrix.nrow()))
}

/// Allocate every bucket, logging the total size
pub(crate) fn allocate<C: ColumnOffset>(stats: Vec<ChunkStatistics>) -> Vec<ChunkAllocation<C>> {
    let allocations = allocate_rows::<C>(stats);
    let entries: usize = allocations
        .iter()
        .map(|a| a.bucket8.total() + a.bucket16.total() + a.bucket32.total())
        .sum();
    debug!("allocated {entries} entries");
    allocations
}

/// Sort rows that arrived out of order and compose the final view
pub(crate) fn finish<C: ColumnOffset>(
    mut allocations: Vec<ChunkAllocation<C>>,
    plan: &ChunkPlan,
    nrow: usize,
) -> View<C> {
    for allocation in &mut allocations {
        allocation.sort_rows();
    }
    let view = consolidate(allocations, plan, nrow);
    debug!("consolidated {} chunks", plan.num_chunks());
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CompressedSparseMatrix, DenseMatrix};
    use layered_core::{LayeredError, MatrixOperations, WidthClass};

    fn scenario() -> DenseMatrix<u32> {
        let mut values = vec![0u32; 20];
        values[0] = 10;
        values[5 + 3] = 300;
        values[2 * 5 + 1] = 70000;
        values[3 * 5 + 4] = 1;
        DenseMatrix::row_major(4, 5, values).unwrap()
    }

    #[test]
    fn test_scenario_widths() {
        let config = LayeredConfig::default().with_chunk_size(3);
        let layered: LayeredMatrix = convert_to_layered(&scenario(), &config).unwrap();

        assert_eq!(layered.chunk_count(), 2);
        assert_eq!(layered.row_width(0, 2), Ok(WidthClass::U32));
        assert_eq!(layered.row_width(1, 1), Ok(WidthClass::U16));
        for (chunk, row) in [(0, 0), (0, 1), (0, 3), (1, 0), (1, 2), (1, 3)] {
            assert_eq!(layered.row_width(chunk, row), Ok(WidthClass::U8));
        }
        assert_eq!(layered.row_width(2, 0), Err(LayeredError::IndexOutOfBounds));

        assert_eq!(layered.dense_row(0), vec![10.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(layered.dense_row(1), vec![0.0, 0.0, 0.0, 300.0, 0.0]);
        assert_eq!(layered.dense_row(2), vec![0.0, 70000.0, 0.0, 0.0, 0.0]);
        assert_eq!(layered.dense_row(3), vec![0.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(layered.nnz(), 4);
    }

    #[test]
    fn test_offset_widths_agree() {
        let source = scenario();
        let expected: Vec<Vec<f64>> = (0..4)
            .map(|r| source.dense_row(r).iter().map(|&v| v as f64).collect())
            .collect();
        for width in [OffsetWidth::U8, OffsetWidth::U16, OffsetWidth::U32] {
            let config = LayeredConfig::default().with_offset_width(width);
            let layered: LayeredMatrix = convert_to_layered(&source, &config).unwrap();
            assert_eq!(layered.offset_width(), width);
            for (r, row) in expected.iter().enumerate() {
                assert_eq!(&layered.dense_row(r), row);
            }
        }
    }

    #[test]
    fn test_capped_chunk_size() {
        let source = CompressedSparseMatrix::<u32>::from_triplets(1, 600, &[(0, 599, 3)], true)
            .unwrap();
        let config = LayeredConfig::default()
            .with_chunk_size(1000)
            .with_offset_width(OffsetWidth::U8);
        let layered: LayeredMatrix<u32> = convert_to_layered(&source, &config).unwrap();
        assert_eq!(layered.chunk_size(), 256);
        assert_eq!(layered.chunk_count(), 3);
        assert_eq!(layered.get(0, 599), Ok(3));
    }

    #[test]
    fn test_invalid_values_abort() {
        let source = DenseMatrix::row_major(1, 2, vec![1i32, -4]).unwrap();
        let result: Result<LayeredMatrix> =
            convert_to_layered(&source, &LayeredConfig::default());
        assert_eq!(result.unwrap_err(), LayeredError::NegativeValue);

        let source = DenseMatrix::column_major(1, 1, vec![f64::NAN]).unwrap();
        let result: Result<LayeredMatrix> =
            convert_to_layered(&source, &LayeredConfig::default());
        assert_eq!(result.unwrap_err(), LayeredError::NonFiniteValue);

        let source = DenseMatrix::row_major(1, 1, vec![1u64 << 32]).unwrap();
        let result: Result<LayeredMatrix> =
            convert_to_layered(&source, &LayeredConfig::default());
        assert_eq!(result.unwrap_err(), LayeredError::ValueOutOfRange);
    }

    #[test]
    fn test_invalid_configuration() {
        let config = LayeredConfig::default().with_chunk_size(0);
        let result: Result<LayeredMatrix> = convert_to_layered(&scenario(), &config);
        assert_eq!(result.unwrap_err(), LayeredError::NonPositiveChunkSize);
    }
}
