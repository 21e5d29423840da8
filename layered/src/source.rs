//! In-memory matrices that can be converted
//!
//! [`DenseMatrix`] stores every element in row- or column-major order.
//! [`CompressedSparseMatrix`] stores compressed rows or columns and keeps
//! entries within a row (or column) in insertion order, so it can stand in
//! for sources whose indices are not sorted.

use layered_core::{
    DenseExtractor, Dimension, ExtractOptions, LayeredError, Matrix, Result, SourceValue,
    SparseExtractor,
};
use std::ops::Range;

/// Element bounds shared by the in-memory matrices
pub trait SourceElement: SourceValue + Default {}

impl<V: SourceValue + Default> SourceElement for V {}

/// Dense matrix in a single contiguous buffer
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix<V> {
    nrow: usize,
    ncol: usize,
    values: Vec<V>,
    row_major: bool,
}

impl<V: SourceElement> DenseMatrix<V> {
    /// Wrap `values` laid out row after row
    pub fn row_major(nrow: usize, ncol: usize, values: Vec<V>) -> Result<Self> {
        Self::new(nrow, ncol, values, true)
    }

    /// Wrap `values` laid out column after column
    pub fn column_major(nrow: usize, ncol: usize, values: Vec<V>) -> Result<Self> {
        Self::new(nrow, ncol, values, false)
    }

    fn new(nrow: usize, ncol: usize, values: Vec<V>, row_major: bool) -> Result<Self> {
        let expected = nrow
            .checked_mul(ncol)
            .ok_or(LayeredError::MalformedInput("dense dimensions overflow"))?;
        if values.len() != expected {
            return Err(LayeredError::MalformedInput(
                "dense value count does not match the dimensions",
            ));
        }
        Ok(Self {
            nrow,
            ncol,
            values,
            row_major,
        })
    }

    #[inline]
    fn at(&self, row: usize, column: usize) -> V {
        if self.row_major {
            self.values[row * self.ncol + column]
        } else {
            self.values[column * self.nrow + row]
        }
    }
}

struct DenseFetch<'a, V> {
    matrix: &'a DenseMatrix<V>,
    dimension: Dimension,
    block: Range<usize>,
}

impl<V: SourceElement> DenseFetch<'_, V> {
    #[inline]
    fn element(&self, i: usize, j: usize) -> V {
        match self.dimension {
            Dimension::Row => self.matrix.at(i, j),
            Dimension::Column => self.matrix.at(j, i),
        }
    }
}

impl<V: SourceElement> DenseExtractor<V> for DenseFetch<'_, V> {
    fn fetch(&mut self, i: usize, buffer: &mut [V]) {
        let start = self.block.start;
        for j in self.block.clone() {
            buffer[j - start] = self.element(i, j);
        }
    }
}

impl<V: SourceElement> SparseExtractor<V> for DenseFetch<'_, V> {
    fn fetch(&mut self, i: usize, values: &mut [V], indices: &mut [usize]) -> usize {
        let mut count = 0;
        for j in self.block.clone() {
            let value = self.element(i, j);
            if !value.is_zero() {
                values[count] = value;
                indices[count] = j;
                count += 1;
            }
        }
        count
    }
}

impl<V: SourceElement> Matrix for DenseMatrix<V> {
    type Value = V;

    fn nrow(&self) -> usize {
        self.nrow
    }

    fn ncol(&self) -> usize {
        self.ncol
    }

    fn is_sparse(&self) -> bool {
        false
    }

    fn prefer_rows(&self) -> bool {
        self.row_major
    }

    fn dense_extractor(
        &self,
        dimension: Dimension,
        block: Range<usize>,
    ) -> Box<dyn DenseExtractor<V> + '_> {
        Box::new(DenseFetch {
            matrix: self,
            dimension,
            block,
        })
    }

    fn sparse_extractor(
        &self,
        dimension: Dimension,
        block: Range<usize>,
        _options: ExtractOptions,
    ) -> Box<dyn SparseExtractor<V> + '_> {
        Box::new(DenseFetch {
            matrix: self,
            dimension,
            block,
        })
    }
}

/// Compressed sparse rows (`by_row`) or columns
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedSparseMatrix<V> {
    nrow: usize,
    ncol: usize,
    values: Vec<V>,
    indices: Vec<usize>,
    pointers: Vec<usize>,
    by_row: bool,
}

impl<V: SourceElement> CompressedSparseMatrix<V> {
    /// Wrap compressed arrays, checking their consistency
    ///
    /// `pointers` has one entry per row (or column) plus one. Indices within
    /// a row (or column) may appear in any order.
    pub fn new(
        nrow: usize,
        ncol: usize,
        values: Vec<V>,
        indices: Vec<usize>,
        pointers: Vec<usize>,
        by_row: bool,
    ) -> Result<Self> {
        let (primary, secondary) = if by_row { (nrow, ncol) } else { (ncol, nrow) };
        if pointers.len() != primary + 1 || pointers[0] != 0 {
            return Err(LayeredError::MalformedInput("pointer array has the wrong length"));
        }
        if pointers.windows(2).any(|w| w[0] > w[1]) || pointers[primary] != values.len() {
            return Err(LayeredError::MalformedInput("pointers are not a valid partition"));
        }
        if indices.len() != values.len() {
            return Err(LayeredError::MalformedInput("index and value counts differ"));
        }
        if indices.iter().any(|&i| i >= secondary) {
            return Err(LayeredError::IndexOutOfBounds);
        }
        Ok(Self {
            nrow,
            ncol,
            values,
            indices,
            pointers,
            by_row,
        })
    }

    /// Build from 0-based `(row, column, value)` triplets
    ///
    /// Entries keep their relative order within each row (or column).
    pub fn from_triplets(
        nrow: usize,
        ncol: usize,
        triplets: &[(usize, usize, V)],
        by_row: bool,
    ) -> Result<Self> {
        let primary_len = if by_row { nrow } else { ncol };
        let split = |&(r, c, _): &(usize, usize, V)| if by_row { (r, c) } else { (c, r) };

        let mut pointers = vec![0usize; primary_len + 1];
        for triplet in triplets {
            let (r, c, _) = *triplet;
            if r >= nrow || c >= ncol {
                return Err(LayeredError::IndexOutOfBounds);
            }
            pointers[split(triplet).0 + 1] += 1;
        }
        for p in 0..primary_len {
            pointers[p + 1] += pointers[p];
        }

        let mut cursors = pointers[..primary_len].to_vec();
        let mut values = vec![V::default(); triplets.len()];
        let mut indices = vec![0usize; triplets.len()];
        for triplet in triplets {
            let (primary, secondary) = split(triplet);
            let at = cursors[primary];
            values[at] = triplet.2;
            indices[at] = secondary;
            cursors[primary] += 1;
        }

        Self::new(nrow, ncol, values, indices, pointers, by_row)
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }
}

struct SparseFetch<'a, V> {
    matrix: &'a CompressedSparseMatrix<V>,
    /// Whether the iterated dimension is the compressed one
    primary: bool,
    block: Range<usize>,
    ordered: bool,
    scratch: Vec<(usize, V)>,
}

impl<V: SourceElement> SparseFetch<'_, V> {
    /// Visit the entries of element `i` inside the block
    fn collect(&mut self, i: usize) {
        self.scratch.clear();
        let m = self.matrix;
        if self.primary {
            let range = m.pointers[i]..m.pointers[i + 1];
            for (&index, &value) in m.indices[range.clone()].iter().zip(&m.values[range]) {
                if self.block.contains(&index) {
                    self.scratch.push((index, value));
                }
            }
            if self.ordered {
                self.scratch.sort_by_key(|&(index, _)| index);
            }
        } else {
            for p in self.block.clone() {
                let range = m.pointers[p]..m.pointers[p + 1];
                if let Some(k) = m.indices[range.clone()].iter().position(|&s| s == i) {
                    self.scratch.push((p, m.values[range.start + k]));
                }
            }
        }
    }
}

impl<V: SourceElement> DenseExtractor<V> for SparseFetch<'_, V> {
    fn fetch(&mut self, i: usize, buffer: &mut [V]) {
        self.collect(i);
        let start = self.block.start;
        buffer[..self.block.len()].fill(V::default());
        for &(index, value) in &self.scratch {
            buffer[index - start] = value;
        }
    }
}

impl<V: SourceElement> SparseExtractor<V> for SparseFetch<'_, V> {
    fn fetch(&mut self, i: usize, values: &mut [V], indices: &mut [usize]) -> usize {
        self.collect(i);
        for (k, &(index, value)) in self.scratch.iter().enumerate() {
            values[k] = value;
            indices[k] = index;
        }
        self.scratch.len()
    }
}

impl<V: SourceElement> CompressedSparseMatrix<V> {
    fn fetcher(
        &self,
        dimension: Dimension,
        block: Range<usize>,
        ordered: bool,
    ) -> SparseFetch<'_, V> {
        SparseFetch {
            matrix: self,
            primary: (dimension == Dimension::Row) == self.by_row,
            block,
            ordered,
            scratch: Vec::new(),
        }
    }
}

impl<V: SourceElement> Matrix for CompressedSparseMatrix<V> {
    type Value = V;

    fn nrow(&self) -> usize {
        self.nrow
    }

    fn ncol(&self) -> usize {
        self.ncol
    }

    fn is_sparse(&self) -> bool {
        true
    }

    fn prefer_rows(&self) -> bool {
        self.by_row
    }

    fn dense_extractor(
        &self,
        dimension: Dimension,
        block: Range<usize>,
    ) -> Box<dyn DenseExtractor<V> + '_> {
        Box::new(self.fetcher(dimension, block, false))
    }

    fn sparse_extractor(
        &self,
        dimension: Dimension,
        block: Range<usize>,
        options: ExtractOptions,
    ) -> Box<dyn SparseExtractor<V> + '_> {
        Box::new(self.fetcher(dimension, block, options.ordered_index))
    }
}
