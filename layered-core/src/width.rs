//! Width classes and the value categorizer
//!
//! Every stored value lives in the narrowest unsigned integer type that can
//! hold it. A row's width class within a chunk is the maximum over its
//! entries in that chunk.

use crate::error::Result;
use crate::traits::SourceValue;

/// Unsigned integer width used to store the values of one bucket
///
/// Variants are declared in increasing order so that the derived `Ord`
/// matches the width order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WidthClass {
    /// 8-bit unsigned
    #[default]
    U8 = 0,
    /// 16-bit unsigned
    U16 = 1,
    /// 32-bit unsigned
    U32 = 2,
}

impl WidthClass {
    /// All width classes in increasing order
    pub const ALL: [WidthClass; 3] = [WidthClass::U8, WidthClass::U16, WidthClass::U32];

    /// Smallest width class able to hold `value`
    pub const fn of(value: u32) -> Self {
        if value <= u8::MAX as u32 {
            WidthClass::U8
        } else if value <= u16::MAX as u32 {
            WidthClass::U16
        } else {
            WidthClass::U32
        }
    }

    /// Largest value representable in this class
    pub const fn max_value(self) -> u32 {
        match self {
            WidthClass::U8 => u8::MAX as u32,
            WidthClass::U16 => u16::MAX as u32,
            WidthClass::U32 => u32::MAX,
        }
    }

    /// Number of bits in this class
    pub const fn bits(self) -> u32 {
        match self {
            WidthClass::U8 => 8,
            WidthClass::U16 => 16,
            WidthClass::U32 => 32,
        }
    }

    /// Position of this class in [`WidthClass::ALL`]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl core::fmt::Display for WidthClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            WidthClass::U8 => write!(f, "u8"),
            WidthClass::U16 => write!(f, "u16"),
            WidthClass::U32 => write!(f, "u32"),
        }
    }
}

/// Determine the width class needed to store `value`
///
/// Fails for negative values, NaN, and anything above `u32::MAX`.
pub fn categorize<V: SourceValue>(value: V) -> Result<WidthClass> {
    Ok(WidthClass::of(value.to_u32()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LayeredError;

    #[test]
    fn test_categorize_cutoffs() {
        assert_eq!(categorize(0i32), Ok(WidthClass::U8));
        assert_eq!(categorize(100i32), Ok(WidthClass::U8));
        assert_eq!(categorize(255u32), Ok(WidthClass::U8));
        assert_eq!(categorize(256u32), Ok(WidthClass::U16));
        assert_eq!(categorize(1000i64), Ok(WidthClass::U16));
        assert_eq!(categorize(65535u16), Ok(WidthClass::U16));
        assert_eq!(categorize(65536u64), Ok(WidthClass::U32));
        assert_eq!(categorize(100_000i32), Ok(WidthClass::U32));
        assert_eq!(categorize(u32::MAX), Ok(WidthClass::U32));
    }

    #[test]
    fn test_categorize_floats() {
        assert_eq!(categorize(10.0f64), Ok(WidthClass::U8));
        assert_eq!(categorize(255.5f64), Ok(WidthClass::U8));
        assert_eq!(categorize(300.0f32), Ok(WidthClass::U16));
        assert_eq!(categorize(4_294_967_295.0f64), Ok(WidthClass::U32));
        assert_eq!(categorize(1e10f64), Err(LayeredError::ValueOutOfRange));
        assert_eq!(categorize(-1.0f64), Err(LayeredError::NegativeValue));
        assert_eq!(categorize(f64::NAN), Err(LayeredError::NonFiniteValue));
        assert_eq!(categorize(f64::INFINITY), Err(LayeredError::ValueOutOfRange));
    }

    #[test]
    fn test_categorize_floats_at_the_32_bit_edge() {
        assert_eq!(
            categorize(4_294_967_296.0f32),
            Err(LayeredError::ValueOutOfRange)
        );
        assert_eq!(
            4_294_967_296.0f32.to_u32(),
            Err(LayeredError::ValueOutOfRange)
        );
        assert_eq!(
            categorize(4_294_967_296.0f64),
            Err(LayeredError::ValueOutOfRange)
        );
        assert_eq!(4_294_967_295.5f64.to_u32(), Ok(u32::MAX));
        // Largest f32 below 2^32
        assert_eq!(4_294_967_040.0f32.to_u32(), Ok(4_294_967_040));
        assert_eq!(categorize(4_294_967_040.0f32), Ok(WidthClass::U32));
    }

    #[test]
    fn test_categorize_rejects_invalid_integers() {
        assert_eq!(categorize(-1i32), Err(LayeredError::NegativeValue));
        assert_eq!(categorize(-1i8), Err(LayeredError::NegativeValue));
        assert_eq!(categorize(1u64 << 32), Err(LayeredError::ValueOutOfRange));
        assert_eq!(
            categorize(10_000_000_000u64),
            Err(LayeredError::ValueOutOfRange)
        );
    }

    #[test]
    fn test_smallest_class_property() {
        for value in [0u32, 1, 254, 255, 256, 65534, 65535, 65536, u32::MAX] {
            let class = WidthClass::of(value);
            assert!(value <= class.max_value());
            for smaller in WidthClass::ALL.iter().filter(|w| **w < class) {
                assert!(value > smaller.max_value());
            }
        }
    }

    #[test]
    fn test_order() {
        assert!(WidthClass::U8 < WidthClass::U16);
        assert!(WidthClass::U16 < WidthClass::U32);
        assert_eq!(WidthClass::default(), WidthClass::U8);
        assert_eq!(WidthClass::U16.index(), 1);
    }
}
