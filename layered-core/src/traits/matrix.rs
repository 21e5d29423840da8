//! Matrix extraction contract
//!
//! Both the inputs of a conversion and the finished layered matrix speak
//! this interface: dimensions, a preferred traversal order, and extractors
//! that fetch one row or column at a time restricted to a contiguous block
//! of the other dimension.

#[cfg(feature = "alloc")]
use alloc::{boxed::Box, vec, vec::Vec};

#[cfg(feature = "alloc")]
use core::ops::Range;

/// Dimension an extractor iterates over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Row,
    Column,
}

impl Dimension {
    /// The other dimension
    pub const fn other(self) -> Self {
        match self {
            Dimension::Row => Dimension::Column,
            Dimension::Column => Dimension::Row,
        }
    }
}

/// Options for sparse extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Whether returned indices must be in increasing order. Sources may
    /// skip sorting when this is `false`.
    pub ordered_index: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            ordered_index: true,
        }
    }
}

impl ExtractOptions {
    /// Options allowing indices in any order
    pub const fn unordered() -> Self {
        Self {
            ordered_index: false,
        }
    }
}

/// Fetches dense rows or columns
pub trait DenseExtractor<V> {
    /// Fill `buffer` with element `i` of the iterated dimension
    ///
    /// `buffer` must be at least as long as the extractor's block; entry
    /// `j` receives the value at position `block.start + j`.
    fn fetch(&mut self, i: usize, buffer: &mut [V]);
}

/// Fetches sparse rows or columns
pub trait SparseExtractor<V> {
    /// Write the nonzero entries of element `i` within the block into
    /// `values` and `indices`, returning how many were written
    ///
    /// Indices are absolute positions in the other dimension. Both buffers
    /// must be at least as long as the extractor's block.
    fn fetch(&mut self, i: usize, values: &mut [V], indices: &mut [usize]) -> usize;
}

/// Core matrix trait consumed and produced by the layered engine
#[cfg(feature = "alloc")]
pub trait Matrix: Sync {
    /// The element type handed out by extractors
    type Value: Copy + Default + Send + Sync;

    /// Number of rows
    fn nrow(&self) -> usize;

    /// Number of columns
    fn ncol(&self) -> usize;

    /// Whether the matrix stores its data sparsely
    fn is_sparse(&self) -> bool;

    /// Whether row-wise traversal is cheaper than column-wise traversal
    fn prefer_rows(&self) -> bool;

    /// Create a dense extractor over `dimension`, restricted to `block`
    /// of the other dimension
    fn dense_extractor(
        &self,
        dimension: Dimension,
        block: Range<usize>,
    ) -> Box<dyn DenseExtractor<Self::Value> + '_>;

    /// Create a sparse extractor over `dimension`, restricted to `block`
    /// of the other dimension
    fn sparse_extractor(
        &self,
        dimension: Dimension,
        block: Range<usize>,
        options: ExtractOptions,
    ) -> Box<dyn SparseExtractor<Self::Value> + '_>;

    /// Extent of `dimension`
    fn extent(&self, dimension: Dimension) -> usize {
        match dimension {
            Dimension::Row => self.nrow(),
            Dimension::Column => self.ncol(),
        }
    }
}

/// Convenience operations returning owned vectors
///
/// These allocate a fresh extractor per call; loops should hold on to an
/// extractor instead.
#[cfg(feature = "alloc")]
pub trait MatrixOperations: Matrix {
    /// Get a full row as a dense vector
    fn dense_row(&self, row: usize) -> Vec<Self::Value> {
        dense_along(self, Dimension::Row, row)
    }

    /// Get a full column as a dense vector
    fn dense_column(&self, column: usize) -> Vec<Self::Value> {
        dense_along(self, Dimension::Column, column)
    }

    /// Get the nonzero entries of a row as `(columns, values)`
    fn sparse_row(&self, row: usize) -> (Vec<usize>, Vec<Self::Value>) {
        sparse_along(self, Dimension::Row, row)
    }

    /// Get the nonzero entries of a column as `(rows, values)`
    fn sparse_column(&self, column: usize) -> (Vec<usize>, Vec<Self::Value>) {
        sparse_along(self, Dimension::Column, column)
    }
}

#[cfg(feature = "alloc")]
impl<M: Matrix + ?Sized> MatrixOperations for M {}

#[cfg(feature = "alloc")]
fn dense_along<M: Matrix + ?Sized>(matrix: &M, dimension: Dimension, i: usize) -> Vec<M::Value> {
    let len = matrix.extent(dimension.other());
    let mut buffer = vec![M::Value::default(); len];
    matrix.dense_extractor(dimension, 0..len).fetch(i, &mut buffer);
    buffer
}

#[cfg(feature = "alloc")]
fn sparse_along<M: Matrix + ?Sized>(
    matrix: &M,
    dimension: Dimension,
    i: usize,
) -> (Vec<usize>, Vec<M::Value>) {
    let len = matrix.extent(dimension.other());
    let mut values = vec![M::Value::default(); len];
    let mut indices = vec![0usize; len];
    let count = matrix
        .sparse_extractor(dimension, 0..len, ExtractOptions::default())
        .fetch(i, &mut values, &mut indices);
    values.truncate(count);
    indices.truncate(count);
    (indices, values)
}
