#![no_std]

//! Layered Core - definitions for layered sparse integer matrices
//!
//! This crate provides the pieces of the layered encoding that need no I/O
//! and no threads: width classes and the value categorizer, column chunk
//! planning, the error type, and the traits that input matrices and
//! triplet sources implement.

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod chunk;
pub mod error;
pub mod traits;
pub mod width;

pub use chunk::{check_chunk_size, ChunkPlan, OffsetWidth};
pub use error::*;
pub use traits::*;
pub use width::{categorize, WidthClass};
