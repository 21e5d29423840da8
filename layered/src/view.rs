//! Lazy composition of row stores
//!
//! Nothing here copies entries. Binding and subsetting only record how the
//! children are arranged; lookups and visits walk down to the leaves and
//! translate indices on the way back up.

use crate::store::Store;
use layered_core::ColumnOffset;
use std::ops::Range;

/// A matrix assembled lazily from compact row stores
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View<C> {
    /// A single store
    Leaf(Store<C>),
    /// Children stacked on top of each other
    RowBind {
        parts: Vec<View<C>>,
        /// First row of each child, followed by the total row count
        starts: Vec<usize>,
        ncol: usize,
    },
    /// Children placed side by side
    ColumnBind {
        parts: Vec<View<C>>,
        /// First column of each child, followed by the total column count
        starts: Vec<usize>,
        nrow: usize,
    },
    /// Row `i` of this view is row `rows[i]` of `inner`
    RowSubset { inner: Box<View<C>>, rows: Vec<usize> },
}

fn boundaries(extents: impl Iterator<Item = usize>) -> Vec<usize> {
    let mut starts = vec![0];
    let mut total = 0;
    for extent in extents {
        total += extent;
        starts.push(total);
    }
    starts
}

/// Child containing `index` given cumulative starts
#[inline]
fn locate(starts: &[usize], index: usize) -> usize {
    starts.partition_point(|&s| s <= index) - 1
}

impl<C: ColumnOffset> View<C> {
    /// Stack views sharing `ncol` columns
    pub fn row_bind(parts: Vec<View<C>>, ncol: usize) -> Self {
        debug_assert!(parts.iter().all(|p| p.ncol() == ncol));
        let starts = boundaries(parts.iter().map(View::nrow));
        View::RowBind {
            parts,
            starts,
            ncol,
        }
    }

    /// Place views sharing `nrow` rows side by side
    pub fn column_bind(parts: Vec<View<C>>, nrow: usize) -> Self {
        debug_assert!(parts.iter().all(|p| p.nrow() == nrow));
        let starts = boundaries(parts.iter().map(View::ncol));
        View::ColumnBind {
            parts,
            starts,
            nrow,
        }
    }

    /// Reorder or select rows of `inner`
    pub fn row_subset(inner: View<C>, rows: Vec<usize>) -> Self {
        debug_assert!(rows.iter().all(|&r| r < inner.nrow()));
        View::RowSubset {
            inner: Box::new(inner),
            rows,
        }
    }

    pub fn nrow(&self) -> usize {
        match self {
            View::Leaf(store) => store.nrow(),
            View::RowBind { starts, .. } => starts[starts.len() - 1],
            View::ColumnBind { nrow, .. } => *nrow,
            View::RowSubset { rows, .. } => rows.len(),
        }
    }

    pub fn ncol(&self) -> usize {
        match self {
            View::Leaf(store) => store.ncol(),
            View::RowBind { ncol, .. } => *ncol,
            View::ColumnBind { starts, .. } => starts[starts.len() - 1],
            View::RowSubset { inner, .. } => inner.ncol(),
        }
    }

    /// Value at (`row`, `column`), zero when absent
    pub fn get(&self, row: usize, column: usize) -> u32 {
        match self {
            View::Leaf(store) => store.get(row, column),
            View::RowBind { parts, starts, .. } => {
                let k = locate(starts, row);
                parts[k].get(row - starts[k], column)
            }
            View::ColumnBind { parts, starts, .. } => {
                let k = locate(starts, column);
                parts[k].get(row, column - starts[k])
            }
            View::RowSubset { inner, rows } => inner.get(rows[row], column),
        }
    }

    /// Call `f(column, value)` for the nonzeros of `row` inside `columns`,
    /// in ascending column order
    pub fn visit_row(&self, row: usize, columns: Range<usize>, f: &mut dyn FnMut(usize, u32)) {
        match self {
            View::Leaf(store) => store.visit_row(row, columns, f),
            View::RowBind { parts, starts, .. } => {
                let k = locate(starts, row);
                parts[k].visit_row(row - starts[k], columns, f);
            }
            View::ColumnBind { parts, starts, .. } => {
                for (k, part) in parts.iter().enumerate() {
                    let (start, end) = (starts[k], starts[k + 1]);
                    if end <= columns.start {
                        continue;
                    }
                    if start >= columns.end {
                        break;
                    }
                    let local = columns.start.saturating_sub(start)..columns.end.min(end) - start;
                    part.visit_row(row, local, &mut |c, v| f(c + start, v));
                }
            }
            View::RowSubset { inner, rows } => inner.visit_row(rows[row], columns, f),
        }
    }

    /// Call `f(row, value)` for the nonzeros of `column` inside `rows`, in
    /// ascending row order
    pub fn visit_column(&self, column: usize, rows: Range<usize>, f: &mut dyn FnMut(usize, u32)) {
        match self {
            View::Leaf(store) => store.visit_column(column, rows, f),
            View::RowBind { parts, starts, .. } => {
                for (k, part) in parts.iter().enumerate() {
                    let (start, end) = (starts[k], starts[k + 1]);
                    if end <= rows.start {
                        continue;
                    }
                    if start >= rows.end {
                        break;
                    }
                    let local = rows.start.saturating_sub(start)..rows.end.min(end) - start;
                    part.visit_column(column, local, &mut |r, v| f(r + start, v));
                }
            }
            View::ColumnBind { parts, starts, .. } => {
                let k = locate(starts, column);
                parts[k].visit_column(column - starts[k], rows, f);
            }
            View::RowSubset { inner, rows: mapping } => {
                // A permutation breaks row order, so look rows up one by one.
                for row in rows {
                    let value = inner.get(mapping[row], column);
                    if value != 0 {
                        f(row, value);
                    }
                }
            }
        }
    }

    /// Store holding `row`, if the view does not split rows across columns
    pub fn leaf_for_row(&self, row: usize) -> Option<&Store<C>> {
        match self {
            View::Leaf(store) => Some(store),
            View::RowBind { parts, starts, .. } => {
                let k = locate(starts, row);
                parts[k].leaf_for_row(row - starts[k])
            }
            View::ColumnBind { .. } => None,
            View::RowSubset { inner, rows } => inner.leaf_for_row(rows[row]),
        }
    }

    /// Children of a column binding, or the view itself
    pub fn column_parts(&self) -> &[View<C>] {
        match self {
            View::ColumnBind { parts, .. } => parts,
            other => std::slice::from_ref(other),
        }
    }

    /// Call `f` on every store, left to right
    pub fn for_each_leaf(&self, f: &mut dyn FnMut(&Store<C>)) {
        match self {
            View::Leaf(store) => f(store),
            View::RowBind { parts, .. } | View::ColumnBind { parts, .. } => {
                for part in parts {
                    part.for_each_leaf(f);
                }
            }
            View::RowSubset { inner, .. } => inner.for_each_leaf(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocate::Bucket;
    use crate::store::CompressedRows;

    fn leaf8(rows: &[&[(u16, u8)]], ncol: usize) -> View<u16> {
        let mut bucket = Bucket::<u8, u16> {
            values: Vec::new(),
            offsets: Vec::new(),
            pointers: vec![0],
        };
        for row in rows {
            for &(offset, value) in *row {
                bucket.offsets.push(offset);
                bucket.values.push(value);
            }
            bucket.pointers.push(bucket.values.len());
        }
        View::Leaf(Store::U8(CompressedRows::from_bucket(bucket, ncol)))
    }

    fn dense(view: &View<u16>) -> Vec<Vec<u32>> {
        (0..view.nrow())
            .map(|r| (0..view.ncol()).map(|c| view.get(r, c)).collect())
            .collect()
    }

    #[test]
    fn test_row_bind_and_subset() {
        let top = leaf8(&[&[(0, 1)], &[(1, 2)]], 2);
        let bottom = leaf8(&[&[(0, 3), (1, 4)]], 2);
        let bound = View::row_bind(vec![top, bottom], 2);
        assert_eq!(bound.nrow(), 3);
        assert_eq!(dense(&bound), vec![vec![1, 0], vec![0, 2], vec![3, 4]]);

        let subset = View::row_subset(bound, vec![2, 0, 1]);
        assert_eq!(dense(&subset), vec![vec![3, 4], vec![1, 0], vec![0, 2]]);

        let mut seen = Vec::new();
        subset.visit_column(1, 0..3, &mut |r, v| seen.push((r, v)));
        assert_eq!(seen, vec![(0, 4), (2, 2)]);
    }

    #[test]
    fn test_column_bind_translates_columns() {
        let left = leaf8(&[&[(0, 1), (2, 5)], &[]], 3);
        let right = leaf8(&[&[(1, 7)], &[(0, 9)]], 2);
        let bound = View::column_bind(vec![left, right], 2);
        assert_eq!(bound.ncol(), 5);
        assert_eq!(dense(&bound), vec![vec![1, 0, 5, 0, 7], vec![0, 0, 0, 9, 0]]);

        let mut seen = Vec::new();
        bound.visit_row(0, 1..5, &mut |c, v| seen.push((c, v)));
        assert_eq!(seen, vec![(2, 5), (4, 7)]);

        seen.clear();
        bound.visit_row(1, 0..3, &mut |c, v| seen.push((c, v)));
        assert!(seen.is_empty());

        assert!(bound.leaf_for_row(0).is_none());
        assert_eq!(bound.column_parts().len(), 2);
    }

    #[test]
    fn test_leaf_walk() {
        let a = leaf8(&[&[(0, 1)]], 1);
        let b = leaf8(&[&[]], 1);
        let bound = View::column_bind(vec![a, b], 1);
        let mut nnz = Vec::new();
        bound.for_each_leaf(&mut |s| nnz.push(s.nnz()));
        assert_eq!(nnz, vec![1, 0]);
    }
}
