//! Layered - memory-efficient sparse matrices of non-negative integers
//!
//! Each row's nonzeros are stored in the narrowest unsigned type that holds
//! them (8, 16 or 32 bits), decided separately for every chunk of columns,
//! so a few large counts only widen the rows and chunks they occur in. The
//! result is exposed through the same [`Matrix`] extraction interface as
//! its inputs.
//!
//! ## Architecture
//!
//! - **layered-core**: width classes, chunk planning, errors, and the input
//!   contracts (no I/O, no threads)
//! - **layered**: the two-pass build, lazy views, in-memory sources, and the
//!   Matrix Market reader
//!
//! ## Quick Start
//!
//! ```rust
//! use layered::{
//!     read_layered_sparse_from_matrix_market_buffer, LayeredConfig, LayeredMatrix,
//!     MatrixOperations, WidthClass,
//! };
//!
//! fn example() -> layered::Result<()> {
//!     let text = "%%MatrixMarket matrix coordinate integer general\n\
//!                 2 4 3\n\
//!                 1 1 5\n\
//!                 2 2 300\n\
//!                 2 4 1\n";
//!     let config = LayeredConfig::default().with_chunk_size(2);
//!     let matrix: LayeredMatrix<f64> =
//!         read_layered_sparse_from_matrix_market_buffer(text.as_bytes(), &config)?;
//!
//!     assert_eq!(matrix.row_width(0, 1)?, WidthClass::U16);
//!     assert_eq!(matrix.row_width(1, 1)?, WidthClass::U8);
//!     assert_eq!(matrix.dense_row(1), vec![0.0, 300.0, 0.0, 1.0]);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub use layered_core::{
    // Width classes and planning
    categorize, check_chunk_size, ChunkPlan, OffsetWidth, WidthClass,
    // Matrix contract
    DenseExtractor, Dimension, ExtractOptions, Matrix, MatrixOperations, SparseExtractor,
    // Element traits
    ColumnOffset, MatrixElement, SourceValue, StoredValue,
    // Triplet sources
    FieldType, Preamble, Scalar, TripletSource,
    // Error handling
    ErrorCategory, LayeredError, Result,
};

pub mod allocate;
pub mod config;
pub mod consolidate;
pub mod convert;
pub mod fill;
pub mod layered_matrix;
pub mod matrix_market;
pub mod parallel;
pub mod source;
pub mod stats;
pub mod store;
pub mod triplets;
pub mod view;

pub use config::{LayeredConfig, DEFAULT_CHUNK_SIZE};
pub use convert::convert_to_layered;
pub use layered_matrix::{ChunkSummary, ClassSummary, LayeredMatrix, LayeredStorage, LayeredSummary};
pub use matrix_market::{read_layered_sparse_from_matrix_market_buffer, MatrixMarketReader};
pub use source::{CompressedSparseMatrix, DenseMatrix, SourceElement};
pub use store::{CompressedRows, Store};
pub use triplets::read_layered_sparse;
pub use view::View;

#[cfg(feature = "mmap")]
pub use matrix_market::read_layered_sparse_from_matrix_market_file;
