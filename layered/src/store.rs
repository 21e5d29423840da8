//! Compact row stores, the leaves of a layered matrix
//!
//! A store is a filled bucket frozen into compressed sparse rows: values of
//! one width class, intra-chunk column offsets, and row boundaries. Offsets
//! within a row are ascending, which lets lookups use binary search.

use crate::allocate::Bucket;
use layered_core::{ColumnOffset, StoredValue, WidthClass};
use std::ops::Range;

/// Compressed sparse rows with narrow values and narrow column offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedRows<V, C> {
    values: Vec<V>,
    offsets: Vec<C>,
    pointers: Vec<usize>,
    ncol: usize,
}

impl<V: StoredValue, C: ColumnOffset> CompressedRows<V, C> {
    /// Freeze a filled and sorted bucket spanning `ncol` columns
    pub fn from_bucket(bucket: Bucket<V, C>, ncol: usize) -> Self {
        Self {
            values: bucket.values,
            offsets: bucket.offsets,
            pointers: bucket.pointers,
            ncol,
        }
    }

    pub fn nrow(&self) -> usize {
        self.pointers.len() - 1
    }

    pub fn ncol(&self) -> usize {
        self.ncol
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Bytes held by the value, offset and boundary arrays
    pub fn storage_bytes(&self) -> usize {
        bytemuck::cast_slice::<V, u8>(&self.values).len()
            + bytemuck::cast_slice::<C, u8>(&self.offsets).len()
            + bytemuck::cast_slice::<usize, u8>(&self.pointers).len()
    }

    /// Offsets and values of `row`
    #[inline]
    pub fn row(&self, row: usize) -> (&[C], &[V]) {
        let range = self.pointers[row]..self.pointers[row + 1];
        (&self.offsets[range.clone()], &self.values[range])
    }

    /// Value at (`row`, `column`), zero when absent
    pub fn get(&self, row: usize, column: usize) -> u32 {
        let (offsets, values) = self.row(row);
        match offsets.binary_search_by(|o| o.to_usize().cmp(&column)) {
            Ok(i) => values[i].widen(),
            Err(_) => 0,
        }
    }

    /// Call `f(column, value)` for the entries of `row` inside `columns`,
    /// in ascending column order
    pub fn visit_row(&self, row: usize, columns: Range<usize>, f: &mut dyn FnMut(usize, u32)) {
        let (offsets, values) = self.row(row);
        let first = offsets.partition_point(|o| o.to_usize() < columns.start);
        for (offset, value) in offsets[first..].iter().zip(&values[first..]) {
            let column = offset.to_usize();
            if column >= columns.end {
                break;
            }
            f(column, value.widen());
        }
    }

    /// Call `f(row, value)` for the entries of `column` in `rows`, in
    /// ascending row order
    pub fn visit_column(&self, column: usize, rows: Range<usize>, f: &mut dyn FnMut(usize, u32)) {
        for row in rows {
            let value = self.get(row, column);
            if value != 0 {
                f(row, value);
            }
        }
    }
}

/// A compact row store of any width class
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Store<C> {
    U8(CompressedRows<u8, C>),
    U16(CompressedRows<u16, C>),
    U32(CompressedRows<u32, C>),
}

impl<C: ColumnOffset> Store<C> {
    /// Width class of the stored values
    pub fn width(&self) -> WidthClass {
        match self {
            Store::U8(_) => WidthClass::U8,
            Store::U16(_) => WidthClass::U16,
            Store::U32(_) => WidthClass::U32,
        }
    }

    pub fn nrow(&self) -> usize {
        match self {
            Store::U8(s) => s.nrow(),
            Store::U16(s) => s.nrow(),
            Store::U32(s) => s.nrow(),
        }
    }

    pub fn ncol(&self) -> usize {
        match self {
            Store::U8(s) => s.ncol(),
            Store::U16(s) => s.ncol(),
            Store::U32(s) => s.ncol(),
        }
    }

    pub fn nnz(&self) -> usize {
        match self {
            Store::U8(s) => s.nnz(),
            Store::U16(s) => s.nnz(),
            Store::U32(s) => s.nnz(),
        }
    }

    pub fn storage_bytes(&self) -> usize {
        match self {
            Store::U8(s) => s.storage_bytes(),
            Store::U16(s) => s.storage_bytes(),
            Store::U32(s) => s.storage_bytes(),
        }
    }

    pub fn get(&self, row: usize, column: usize) -> u32 {
        match self {
            Store::U8(s) => s.get(row, column),
            Store::U16(s) => s.get(row, column),
            Store::U32(s) => s.get(row, column),
        }
    }

    pub fn visit_row(&self, row: usize, columns: Range<usize>, f: &mut dyn FnMut(usize, u32)) {
        match self {
            Store::U8(s) => s.visit_row(row, columns, f),
            Store::U16(s) => s.visit_row(row, columns, f),
            Store::U32(s) => s.visit_row(row, columns, f),
        }
    }

    pub fn visit_column(&self, column: usize, rows: Range<usize>, f: &mut dyn FnMut(usize, u32)) {
        match self {
            Store::U8(s) => s.visit_column(column, rows, f),
            Store::U16(s) => s.visit_column(column, rows, f),
            Store::U32(s) => s.visit_column(column, rows, f),
        }
    }
}
