//! Abstract interfaces for layered matrices
//!
//! This module defines the element constraints and the two input
//! contracts: extractable matrices and streamed triplet sources.

pub mod element;
pub mod matrix;
pub mod source;

pub use element::{ColumnOffset, MatrixElement, SourceValue, StoredValue};
pub use matrix::{DenseExtractor, Dimension, ExtractOptions, SparseExtractor};
#[cfg(feature = "alloc")]
pub use matrix::{Matrix, MatrixOperations};
pub use source::{require_numeric, FieldType, Preamble, Scalar, TripletSource};
