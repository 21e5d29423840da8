//! The finished layered matrix and its extraction interface

use crate::store::Store;
use crate::view::View;
use layered_core::{
    ChunkPlan, ColumnOffset, DenseExtractor, Dimension, ExtractOptions, LayeredError, Matrix,
    MatrixElement, OffsetWidth, Result, SparseExtractor, WidthClass,
};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Range;

/// Composed view, keyed by the type of its column offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayeredStorage {
    U8(View<u8>),
    U16(View<u16>),
    U32(View<u32>),
}

impl LayeredStorage {
    /// Width of the column offsets
    pub fn offset_width(&self) -> OffsetWidth {
        match self {
            LayeredStorage::U8(_) => OffsetWidth::U8,
            LayeredStorage::U16(_) => OffsetWidth::U16,
            LayeredStorage::U32(_) => OffsetWidth::U32,
        }
    }

    pub fn nrow(&self) -> usize {
        match self {
            LayeredStorage::U8(v) => v.nrow(),
            LayeredStorage::U16(v) => v.nrow(),
            LayeredStorage::U32(v) => v.nrow(),
        }
    }

    pub fn ncol(&self) -> usize {
        match self {
            LayeredStorage::U8(v) => v.ncol(),
            LayeredStorage::U16(v) => v.ncol(),
            LayeredStorage::U32(v) => v.ncol(),
        }
    }

    pub fn get(&self, row: usize, column: usize) -> u32 {
        match self {
            LayeredStorage::U8(v) => v.get(row, column),
            LayeredStorage::U16(v) => v.get(row, column),
            LayeredStorage::U32(v) => v.get(row, column),
        }
    }

    pub fn visit_row(&self, row: usize, columns: Range<usize>, f: &mut dyn FnMut(usize, u32)) {
        match self {
            LayeredStorage::U8(v) => v.visit_row(row, columns, f),
            LayeredStorage::U16(v) => v.visit_row(row, columns, f),
            LayeredStorage::U32(v) => v.visit_row(row, columns, f),
        }
    }

    pub fn visit_column(&self, column: usize, rows: Range<usize>, f: &mut dyn FnMut(usize, u32)) {
        match self {
            LayeredStorage::U8(v) => v.visit_column(column, rows, f),
            LayeredStorage::U16(v) => v.visit_column(column, rows, f),
            LayeredStorage::U32(v) => v.visit_column(column, rows, f),
        }
    }

    fn row_width(&self, chunk: usize, row: usize) -> Option<WidthClass> {
        match self {
            LayeredStorage::U8(v) => chunk_row_width(v, chunk, row),
            LayeredStorage::U16(v) => chunk_row_width(v, chunk, row),
            LayeredStorage::U32(v) => chunk_row_width(v, chunk, row),
        }
    }

    fn class_summaries(&self, chunk: usize) -> Vec<ClassSummary> {
        match self {
            LayeredStorage::U8(v) => chunk_classes(v, chunk),
            LayeredStorage::U16(v) => chunk_classes(v, chunk),
            LayeredStorage::U32(v) => chunk_classes(v, chunk),
        }
    }
}

fn chunk_row_width<C: ColumnOffset>(view: &View<C>, chunk: usize, row: usize) -> Option<WidthClass> {
    view.column_parts()
        .get(chunk)?
        .leaf_for_row(row)
        .map(Store::width)
}

fn chunk_classes<C: ColumnOffset>(view: &View<C>, chunk: usize) -> Vec<ClassSummary> {
    let mut classes = Vec::new();
    if let Some(part) = view.column_parts().get(chunk) {
        part.for_each_leaf(&mut |store| {
            classes.push(ClassSummary {
                width: store.width(),
                rows: store.nrow(),
                nnz: store.nnz(),
                bytes: store.storage_bytes(),
            })
        });
    }
    classes
}

/// Storage used by one width class of one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ClassSummary {
    pub width: WidthClass,
    pub rows: usize,
    pub nnz: usize,
    pub bytes: usize,
}

/// Layout of one column chunk
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChunkSummary {
    pub start: usize,
    pub width: usize,
    pub classes: Vec<ClassSummary>,
}

/// Layout of a whole layered matrix
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LayeredSummary {
    pub nrow: usize,
    pub ncol: usize,
    pub chunk_size: usize,
    pub offset_width: OffsetWidth,
    pub chunks: Vec<ChunkSummary>,
}

impl LayeredSummary {
    /// Nonzeros across all chunks
    pub fn nnz(&self) -> usize {
        self.classes().map(|c| c.nnz).sum()
    }

    /// Bytes across all chunks
    pub fn bytes(&self) -> usize {
        self.classes().map(|c| c.bytes).sum()
    }

    fn classes(&self) -> impl Iterator<Item = &ClassSummary> {
        self.chunks.iter().flat_map(|chunk| chunk.classes.iter())
    }
}

impl fmt::Display for LayeredSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} x {} matrix, {} nonzeros, {} bytes",
            self.nrow,
            self.ncol,
            self.nnz(),
            self.bytes()
        )?;
        writeln!(
            f,
            "{} chunks of up to {} columns, {} offsets",
            self.chunks.len(),
            self.chunk_size,
            self.offset_width
        )?;
        for (index, chunk) in self.chunks.iter().enumerate() {
            writeln!(
                f,
                "chunk {index}: columns {}..{}",
                chunk.start,
                chunk.start + chunk.width
            )?;
            for class in &chunk.classes {
                writeln!(
                    f,
                    "  {}: {} rows, {} nonzeros, {} bytes",
                    class.width, class.rows, class.nnz, class.bytes
                )?;
            }
        }
        Ok(())
    }
}

/// A sparse matrix of non-negative integers stored in layers of the
/// narrowest width each row needs, per column chunk
///
/// Values are handed out as `T` by the [`Matrix`] extractors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayeredMatrix<T = f64> {
    storage: LayeredStorage,
    plan: ChunkPlan,
    _element: PhantomData<fn() -> T>,
}

impl<T: MatrixElement> LayeredMatrix<T> {
    pub(crate) fn new(storage: LayeredStorage, plan: ChunkPlan) -> Self {
        Self {
            storage,
            plan,
            _element: PhantomData,
        }
    }

    /// Composed storage
    pub fn storage(&self) -> &LayeredStorage {
        &self.storage
    }

    /// Number of column chunks
    pub fn chunk_count(&self) -> usize {
        self.plan.num_chunks()
    }

    /// Effective chunk size
    pub fn chunk_size(&self) -> usize {
        self.plan.chunk_size()
    }

    /// Width of the column offsets
    pub fn offset_width(&self) -> OffsetWidth {
        self.storage.offset_width()
    }

    /// Width class holding `row` within `chunk`
    pub fn row_width(&self, chunk: usize, row: usize) -> Result<WidthClass> {
        if chunk >= self.chunk_count() || row >= self.storage.nrow() {
            return Err(LayeredError::IndexOutOfBounds);
        }
        self.storage
            .row_width(chunk, row)
            .ok_or(LayeredError::IndexOutOfBounds)
    }

    /// Value at (`row`, `column`)
    pub fn get(&self, row: usize, column: usize) -> Result<T> {
        if row >= self.storage.nrow() || column >= self.storage.ncol() {
            return Err(LayeredError::IndexOutOfBounds);
        }
        Ok(T::from_u32(self.storage.get(row, column)))
    }

    /// Layout of every chunk and width class
    pub fn summary(&self) -> LayeredSummary {
        let chunks = (0..self.chunk_count())
            .map(|chunk| ChunkSummary {
                start: self.plan.chunk_start(chunk),
                width: self.plan.chunk_width(chunk),
                classes: self.storage.class_summaries(chunk),
            })
            .collect();
        LayeredSummary {
            nrow: self.storage.nrow(),
            ncol: self.storage.ncol(),
            chunk_size: self.chunk_size(),
            offset_width: self.offset_width(),
            chunks,
        }
    }

    /// Number of stored nonzeros
    pub fn nnz(&self) -> usize {
        self.summary().nnz()
    }
}

impl<T: MatrixElement> Matrix for LayeredMatrix<T> {
    type Value = T;

    fn nrow(&self) -> usize {
        self.storage.nrow()
    }

    fn ncol(&self) -> usize {
        self.storage.ncol()
    }

    fn is_sparse(&self) -> bool {
        true
    }

    fn prefer_rows(&self) -> bool {
        true
    }

    fn dense_extractor(
        &self,
        dimension: Dimension,
        block: Range<usize>,
    ) -> Box<dyn DenseExtractor<T> + '_> {
        Box::new(LayeredExtractor {
            storage: &self.storage,
            dimension,
            block,
            _element: PhantomData::<fn() -> T>,
        })
    }

    fn sparse_extractor(
        &self,
        dimension: Dimension,
        block: Range<usize>,
        _options: ExtractOptions,
    ) -> Box<dyn SparseExtractor<T> + '_> {
        // Visits are always ordered.
        Box::new(LayeredExtractor {
            storage: &self.storage,
            dimension,
            block,
            _element: PhantomData::<fn() -> T>,
        })
    }
}

struct LayeredExtractor<'a, T> {
    storage: &'a LayeredStorage,
    dimension: Dimension,
    block: Range<usize>,
    _element: PhantomData<fn() -> T>,
}

impl<T> LayeredExtractor<'_, T> {
    fn visit(&self, i: usize, f: &mut dyn FnMut(usize, u32)) {
        match self.dimension {
            Dimension::Row => self.storage.visit_row(i, self.block.clone(), f),
            Dimension::Column => self.storage.visit_column(i, self.block.clone(), f),
        }
    }
}

impl<T: MatrixElement> DenseExtractor<T> for LayeredExtractor<'_, T> {
    fn fetch(&mut self, i: usize, buffer: &mut [T]) {
        let start = self.block.start;
        let buffer = &mut buffer[..self.block.len()];
        buffer.fill(T::default());
        self.visit(i, &mut |index, value| buffer[index - start] = T::from_u32(value));
    }
}

impl<T: MatrixElement> SparseExtractor<T> for LayeredExtractor<'_, T> {
    fn fetch(&mut self, i: usize, values: &mut [T], indices: &mut [usize]) -> usize {
        let mut count = 0;
        self.visit(i, &mut |index, value| {
            values[count] = T::from_u32(value);
            indices[count] = index;
            count += 1;
        });
        count
    }
}
