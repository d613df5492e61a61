//! Numeric element types accepted as grid intensities.

use num_traits::{NumCast, ToPrimitive, WrappingAdd, Zero};
use std::fmt::{Debug, Display};

/// Element type of an intensity grid.
///
/// Implemented for the primitive integer and float types. `SIGNED` is the
/// only piece of type metadata the threshold search needs.
pub trait Intensity:
    Copy + PartialOrd + Zero + NumCast + ToPrimitive + Debug + Display + Send + Sync + 'static
{
    /// Whether the type can represent negative values.
    const SIGNED: bool;

    /// Running-sum step for cluster intensities.
    ///
    /// Integer types wrap on overflow, the same as an accumulator of the
    /// grid's own element type. Floats add normally.
    fn accumulate(self, rhs: Self) -> Self;

    /// Lossy conversion used for centroid and ratio math.
    #[inline]
    fn as_f64(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

macro_rules! impl_intensity {
    (int $signed:expr => $($t:ty),+) => {
        $(
            impl Intensity for $t {
                const SIGNED: bool = $signed;

                #[inline]
                fn accumulate(self, rhs: Self) -> Self {
                    WrappingAdd::wrapping_add(&self, &rhs)
                }
            }
        )+
    };
    (float => $($t:ty),+) => {
        $(
            impl Intensity for $t {
                const SIGNED: bool = true;

                #[inline]
                fn accumulate(self, rhs: Self) -> Self {
                    self + rhs
                }
            }
        )+
    };
}

impl_intensity!(int false => u8, u16, u32, u64);
impl_intensity!(int true => i8, i16, i32, i64);
impl_intensity!(float => f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signedness() {
        assert!(!u8::SIGNED);
        assert!(!u64::SIGNED);
        assert!(i16::SIGNED);
        assert!(f32::SIGNED);
    }

    #[test]
    fn test_as_f64() {
        assert!((7u16.as_f64() - 7.0).abs() < f64::EPSILON);
        assert!((-3i32.as_f64() + 3.0).abs() < f64::EPSILON);
        assert!(f64::NAN.as_f64().is_nan());
    }

    #[test]
    fn test_accumulate_wraps_integers() {
        assert_eq!(40_000u16.accumulate(40_000), 14_464);
        assert_eq!(200u8.accumulate(100), 44);
        assert_eq!(i8::MAX.accumulate(1), i8::MIN);
        assert!((1.5f32.accumulate(2.25) - 3.75).abs() < f32::EPSILON);
    }
}
