//! Building a layered matrix from a streamed triplet source
//!
//! The source is read twice, sequentially: once for statistics and once to
//! fill. A factory re-creates it for the second pass. Entries may arrive in
//! any order, so every row is sorted by column once filling is done.

use crate::config::LayeredConfig;
use crate::convert::{allocate, finish, plan_chunks};
use crate::fill::{split_targets, Cursor};
use crate::layered_matrix::{LayeredMatrix, LayeredStorage};
use crate::stats::empty_statistics;
use crate::view::View;
use layered_core::{
    categorize, require_numeric, ChunkPlan, ColumnOffset, LayeredError, MatrixElement,
    OffsetWidth, Preamble, Result, SourceValue, TripletSource,
};
use log::{debug, info};

/// Build a layered matrix from a triplet source
///
/// `create` is called once per pass and must yield the same entries each
/// time. A second pass that disagrees with the first fails with
/// [`LayeredError::InconsistentSource`].
pub fn read_layered_sparse<T, S, F>(mut create: F, config: &LayeredConfig) -> Result<LayeredMatrix<T>>
where
    T: MatrixElement,
    S: TripletSource,
    F: FnMut() -> Result<S>,
{
    config.validate()?;
    let mut source = create()?;
    let preamble = source.preamble()?;
    require_numeric(&preamble)?;
    debug!(
        "triplet source reports {} x {} with {} entries ({:?})",
        preamble.nrow, preamble.ncol, preamble.nnz, preamble.field
    );
    let plan = plan_chunks(preamble.ncol, config)?;

    let storage = match config.offset_width {
        OffsetWidth::U8 => {
            LayeredStorage::U8(build::<S, F, u8>(source, &mut create, &preamble, &plan)?)
        }
        OffsetWidth::U16 => {
            LayeredStorage::U16(build::<S, F, u16>(source, &mut create, &preamble, &plan)?)
        }
        OffsetWidth::U32 => {
            LayeredStorage::U32(build::<S, F, u32>(source, &mut create, &preamble, &plan)?)
        }
    };

    info!(
        "built {} x {} layered matrix from triplets in {} chunks",
        preamble.nrow,
        preamble.ncol,
        plan.num_chunks()
    );
    Ok(LayeredMatrix::new(storage, plan))
}

/// Convert 1-based coordinates, checking them against the preamble
#[inline]
fn zero_based(row: usize, column: usize, preamble: &Preamble) -> Result<(usize, usize)> {
    if row == 0 || column == 0 || row > preamble.nrow || column > preamble.ncol {
        return Err(LayeredError::IndexOutOfBounds);
    }
    Ok((row - 1, column - 1))
}

fn build<S, F, C>(
    mut source: S,
    create: &mut F,
    preamble: &Preamble,
    plan: &ChunkPlan,
) -> Result<View<C>>
where
    S: TripletSource,
    F: FnMut() -> Result<S>,
    C: ColumnOffset,
{
    let nrow = preamble.nrow;

    let mut stats = empty_statistics(plan, nrow);
    source.scan(|r, c, value| {
        let (row, column) = zero_based(r, c, preamble)?;
        if !value.is_zero() {
            let (chunk, _) = plan.locate(column);
            stats[chunk].record(row, categorize(value)?);
        }
        Ok(())
    })?;
    drop(source);
    debug!("collected statistics from triplets");

    let mut allocations = allocate::<C>(stats);
    {
        let mut source = create()?;
        if source.preamble()? != *preamble {
            return Err(LayeredError::InconsistentSource);
        }

        let mut targets = split_targets(&mut allocations, &[0..nrow])
            .into_iter()
            .next()
            .unwrap_or_default();
        let mut cursors: Vec<Vec<Cursor>> = targets
            .iter()
            .map(|target| (0..nrow).map(|r| target.cursor(r)).collect())
            .collect();

        source.scan(|r, c, value| {
            let (row, column) = zero_based(r, c, preamble)?;
            if !value.is_zero() {
                let (chunk, offset) = plan.locate(column);
                targets[chunk].write(row, &mut cursors[chunk][row], offset, value.to_u32()?)?;
            }
            Ok(())
        })?;

        if !cursors.iter().flatten().all(Cursor::is_complete) {
            return Err(LayeredError::InconsistentSource);
        }
    }
    debug!("filled buckets from triplets");

    Ok(finish(allocations, plan, nrow))
}

#[cfg(test)]
mod tests {
    use super::*;
    use layered_core::{FieldType, MatrixOperations, Scalar, WidthClass};

    /// Triplets held in memory, replayed on every scan
    #[derive(Clone)]
    struct Replay {
        preamble: Preamble,
        entries: Vec<(usize, usize, Scalar)>,
    }

    impl TripletSource for Replay {
        fn preamble(&mut self) -> Result<Preamble> {
            Ok(self.preamble)
        }

        fn scan<H>(&mut self, mut handler: H) -> Result<()>
        where
            H: FnMut(usize, usize, Scalar) -> Result<()>,
        {
            for &(r, c, v) in &self.entries {
                handler(r, c, v)?;
            }
            Ok(())
        }
    }

    fn replay(nrow: usize, ncol: usize, entries: &[(usize, usize, i64)]) -> Replay {
        Replay {
            preamble: Preamble {
                nrow,
                ncol,
                nnz: entries.len(),
                field: FieldType::Integer,
            },
            entries: entries
                .iter()
                .map(|&(r, c, v)| (r, c, Scalar::Integer(v)))
                .collect(),
        }
    }

    #[test]
    fn test_scenario_from_unordered_triplets() {
        let source = replay(4, 5, &[(4, 5, 1), (2, 4, 300), (3, 2, 70000), (1, 1, 10)]);
        let config = LayeredConfig::default().with_chunk_size(3);
        let layered: LayeredMatrix =
            read_layered_sparse(|| Ok(source.clone()), &config).unwrap();

        assert_eq!(layered.row_width(0, 2), Ok(WidthClass::U32));
        assert_eq!(layered.row_width(1, 1), Ok(WidthClass::U16));
        assert_eq!(layered.dense_row(2), vec![0.0, 70000.0, 0.0, 0.0, 0.0]);
        assert_eq!(layered.dense_column(3), vec![0.0, 300.0, 0.0, 0.0]);
    }

    #[test]
    fn test_rows_sorted_after_fill() {
        let source = replay(1, 6, &[(1, 6, 3), (1, 2, 1), (1, 4, 2)]);
        let layered: LayeredMatrix<u32> =
            read_layered_sparse(|| Ok(source.clone()), &LayeredConfig::default()).unwrap();
        assert_eq!(layered.sparse_row(0), (vec![1, 3, 5], vec![1, 2, 3]));
    }

    #[test]
    fn test_explicit_zeros_are_skipped() {
        let source = replay(2, 2, &[(1, 1, 0), (2, 2, 5)]);
        let layered: LayeredMatrix<u32> =
            read_layered_sparse(|| Ok(source.clone()), &LayeredConfig::default()).unwrap();
        assert_eq!(layered.nnz(), 1);
    }

    #[test]
    fn test_coordinates_are_checked() {
        for entries in [[(0, 1, 1)], [(3, 1, 1)], [(1, 3, 1)]] {
            let source = replay(2, 2, &entries);
            let result: Result<LayeredMatrix> =
                read_layered_sparse(|| Ok(source.clone()), &LayeredConfig::default());
            assert_eq!(result.unwrap_err(), LayeredError::IndexOutOfBounds);
        }
    }

    #[test]
    fn test_non_numeric_field() {
        let mut source = replay(1, 1, &[]);
        source.preamble.field = FieldType::Pattern;
        let result: Result<LayeredMatrix> =
            read_layered_sparse(|| Ok(source.clone()), &LayeredConfig::default());
        assert_eq!(result.unwrap_err(), LayeredError::UnsupportedField);
    }

    #[test]
    fn test_changing_source_is_detected() {
        let first = replay(2, 2, &[(1, 1, 5), (2, 2, 6)]);
        let widened = replay(2, 2, &[(1, 1, 500), (2, 2, 6)]);
        let extra = replay(2, 2, &[(1, 1, 5), (1, 2, 1), (2, 2, 6)]);
        let missing = replay(2, 2, &[(1, 1, 5)]);

        for second in [widened, extra, missing] {
            let mut calls = 0;
            let result: Result<LayeredMatrix> = read_layered_sparse(
                || {
                    calls += 1;
                    Ok(if calls == 1 { first.clone() } else { second.clone() })
                },
                &LayeredConfig::default(),
            );
            assert_eq!(result.unwrap_err(), LayeredError::InconsistentSource);
        }
    }

    #[test]
    fn test_negative_triplet() {
        let source = replay(1, 1, &[(1, 1, -2)]);
        let result: Result<LayeredMatrix> =
            read_layered_sparse(|| Ok(source.clone()), &LayeredConfig::default());
        assert_eq!(result.unwrap_err(), LayeredError::NegativeValue);
    }
}
