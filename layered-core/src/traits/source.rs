//! Triplet source contract
//!
//! A triplet source is a streamed coordinate list such as a Matrix Market
//! file. It announces its shape and field type up front, then feeds every
//! entry to a handler as `(row, column, value)` with 1-based coordinates.

use crate::error::{LayeredError, Result};
use crate::traits::SourceValue;

/// Numeric field type announced by a triplet source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Real,
    Double,
    Complex,
    Pattern,
}

impl FieldType {
    /// Whether entries of this field carry a single numeric value
    pub const fn is_numeric(self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Real | FieldType::Double)
    }
}

/// Shape and field information read before any entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preamble {
    pub nrow: usize,
    pub ncol: usize,
    /// Number of entries announced by the source
    pub nnz: usize,
    pub field: FieldType,
}

/// A single value emitted by a triplet source
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Integer(i64),
    Real(f64),
}

impl SourceValue for Scalar {
    #[inline]
    fn is_zero(self) -> bool {
        match self {
            Scalar::Integer(v) => v.is_zero(),
            Scalar::Real(v) => v.is_zero(),
        }
    }

    #[inline]
    fn to_u32(self) -> Result<u32> {
        match self {
            Scalar::Integer(v) => v.to_u32(),
            Scalar::Real(v) => v.to_u32(),
        }
    }
}

/// Streamed coordinate-list input
pub trait TripletSource {
    /// Read the preamble. Must be called before [`TripletSource::scan`].
    fn preamble(&mut self) -> Result<Preamble>;

    /// Feed every entry to `handler` as `(row, column, value)`, with 1-based
    /// coordinates. Stops at the first error returned by the handler.
    fn scan<F>(&mut self, handler: F) -> Result<()>
    where
        F: FnMut(usize, usize, Scalar) -> Result<()>;
}

/// Check that a preamble describes numeric data
pub fn require_numeric(preamble: &Preamble) -> Result<()> {
    if preamble.field.is_numeric() {
        Ok(())
    } else {
        Err(LayeredError::UnsupportedField)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{categorize, WidthClass};

    #[test]
    fn test_scalar_values() {
        assert_eq!(categorize(Scalar::Integer(300)), Ok(WidthClass::U16));
        assert_eq!(categorize(Scalar::Real(12.0)), Ok(WidthClass::U8));
        assert_eq!(
            categorize(Scalar::Integer(-5)),
            Err(LayeredError::NegativeValue)
        );
        assert!(Scalar::Real(0.0).is_zero());
    }

    #[test]
    fn test_require_numeric() {
        let mut preamble = Preamble {
            nrow: 1,
            ncol: 1,
            nnz: 0,
            field: FieldType::Integer,
        };
        assert!(require_numeric(&preamble).is_ok());
        preamble.field = FieldType::Pattern;
        assert_eq!(
            require_numeric(&preamble),
            Err(LayeredError::UnsupportedField)
        );
    }
}
