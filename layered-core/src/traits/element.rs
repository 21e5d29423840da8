//! Element type constraints for layered matrices
//!
//! Four families of types meet in a layered matrix:
//! - source values read from the input ([`SourceValue`]),
//! - stored values kept in the buckets ([`StoredValue`]),
//! - intra-chunk column offsets ([`ColumnOffset`]),
//! - output values handed back by extraction ([`MatrixElement`]).

use crate::chunk::OffsetWidth;
use crate::error::{LayeredError, Result};
use crate::width::WidthClass;

/// Trait for types that can be read from an input matrix or triplet source
///
/// Implementors decide whether a value is zero and how it converts to
/// `u32`. The conversion must reject negative values, NaN, and anything
/// above `u32::MAX`.
pub trait SourceValue: Copy + Send + Sync {
    /// Whether this value is zero (and therefore not stored)
    fn is_zero(self) -> bool;

    /// Convert to `u32`, truncating any fractional part
    fn to_u32(self) -> Result<u32>;
}

macro_rules! impl_source_unsigned {
    ($($t:ty),*) => {$(
        impl SourceValue for $t {
            #[inline]
            fn is_zero(self) -> bool {
                self == 0
            }

            #[inline]
            #[allow(clippy::unnecessary_fallible_conversions)]
            fn to_u32(self) -> Result<u32> {
                u32::try_from(self).map_err(|_| LayeredError::ValueOutOfRange)
            }
        }
    )*};
}

macro_rules! impl_source_signed {
    ($($t:ty),*) => {$(
        impl SourceValue for $t {
            #[inline]
            fn is_zero(self) -> bool {
                self == 0
            }

            #[inline]
            fn to_u32(self) -> Result<u32> {
                if self < 0 {
                    return Err(LayeredError::NegativeValue);
                }
                u32::try_from(self).map_err(|_| LayeredError::ValueOutOfRange)
            }
        }
    )*};
}

macro_rules! impl_source_float {
    ($($t:ty),*) => {$(
        impl SourceValue for $t {
            #[inline]
            fn is_zero(self) -> bool {
                self == 0.0
            }

            #[inline]
            fn to_u32(self) -> Result<u32> {
                if self.is_nan() {
                    return Err(LayeredError::NonFiniteValue);
                }
                if self < 0.0 {
                    return Err(LayeredError::NegativeValue);
                }
                // 2^32 is exact in both float types, unlike u32::MAX in f32
                if self >= 4_294_967_296.0 {
                    return Err(LayeredError::ValueOutOfRange);
                }
                Ok(self as u32)
            }
        }
    )*};
}

impl_source_unsigned!(u8, u16, u32, u64, usize);
impl_source_signed!(i8, i16, i32, i64);
impl_source_float!(f32, f64);

/// Trait for the unsigned types backing a bucket's values
pub trait StoredValue: bytemuck::Pod + Default + Ord + Send + Sync + 'static {
    /// Width class this type stores
    const WIDTH: WidthClass;

    /// Narrow a value, failing if it does not fit
    fn narrow(value: u32) -> Option<Self>;

    /// Widen back to `u32`
    fn widen(self) -> u32;
}

macro_rules! impl_stored {
    ($($t:ty => $w:expr),*) => {$(
        impl StoredValue for $t {
            const WIDTH: WidthClass = $w;

            #[inline]
            #[allow(clippy::unnecessary_fallible_conversions)]
            fn narrow(value: u32) -> Option<Self> {
                <$t>::try_from(value).ok()
            }

            #[inline]
            fn widen(self) -> u32 {
                self as u32
            }
        }
    )*};
}

impl_stored!(u8 => WidthClass::U8, u16 => WidthClass::U16, u32 => WidthClass::U32);

/// Trait for the unsigned types holding intra-chunk column offsets
pub trait ColumnOffset: bytemuck::Pod + Default + Ord + Send + Sync + 'static {
    /// Offset width this type represents
    const WIDTH: OffsetWidth;

    /// Narrow an offset. Callers guarantee `offset < chunk_size`, which the
    /// chunk planner bounds by the offset type.
    fn from_usize(offset: usize) -> Self;

    /// Widen back to `usize`
    fn to_usize(self) -> usize;
}

macro_rules! impl_offset {
    ($($t:ty => $w:expr),*) => {$(
        impl ColumnOffset for $t {
            const WIDTH: OffsetWidth = $w;

            #[inline]
            fn from_usize(offset: usize) -> Self {
                debug_assert!(offset <= <$t>::MAX as usize);
                offset as $t
            }

            #[inline]
            fn to_usize(self) -> usize {
                self as usize
            }
        }
    )*};
}

impl_offset!(u8 => OffsetWidth::U8, u16 => OffsetWidth::U16, u32 => OffsetWidth::U32);

/// Trait for types that extraction can hand back to callers
pub trait MatrixElement: Copy + Default + PartialEq + Send + Sync + 'static {
    /// Convert a stored value to this type
    fn from_u32(value: u32) -> Self;

    /// Convert to f64 for generic operations
    fn to_f64(self) -> f64;
}

macro_rules! impl_element {
    ($($t:ty),*) => {$(
        impl MatrixElement for $t {
            #[inline]
            fn from_u32(value: u32) -> Self {
                value as $t
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    )*};
}

impl_element!(f32, f64, i32, i64, u32, u64);
