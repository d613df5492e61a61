//! Rate-driven threshold search and thresholding.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]

use log::debug;
use ndarray::{Array2, ArrayView2};
use spotpix_core::error::{Error, Result};
use spotpix_core::Intensity;

/// Upper bound on histogram bins for the threshold search.
///
/// Covers the full `u16` range with room to spare while keeping the
/// histogram and survival function to a few megabytes each.
pub const MAX_HISTOGRAM_BINS: usize = 1 << 20;

/// Elementwise `grid > threshold`.
#[must_use]
pub fn apply_threshold<T: Intensity>(grid: ArrayView2<'_, T>, threshold: T) -> Array2<bool> {
    grid.mapv(|value| value > threshold)
}

/// Finds the threshold whose exceedance rate matches `rate`.
///
/// Values are binned by `floor(value)` into an integer histogram spanning
/// the grid's range, turned into a survival function
/// `S[i] = P(value >= min + i)` and bisected for a bin whose survival value
/// equals `rate` exactly. Without an exact match the search settles on the
/// upper end of the final bracket. The returned threshold is the value one
/// below that bin, so `grid > threshold` selects the bin and everything
/// above it.
///
/// Boundary rates short-circuit: `0.0` returns the (floored) grid maximum,
/// `1.0` returns one below the minimum for signed types and zero for
/// unsigned ones. Thresholds for unsigned types never go below zero.
///
/// Only meaningful for integer-valued data: fractional parts are floored
/// away before binning.
///
/// # Errors
/// - `InvalidRate` when `rate` is outside `[0, 1]` or NaN
/// - `EmptyGrid` when the grid has no elements
/// - `UnbinnableIntensity` for non-finite values or a range beyond `i32`
/// - `HistogramTooWide` when the floored range spans more than
///   [`MAX_HISTOGRAM_BINS`] bins
/// - `ThresholdOutOfRange` when the result does not fit `T`
pub fn generate_threshold<T: Intensity>(grid: ArrayView2<'_, T>, rate: f64) -> Result<T> {
    if !(0.0..=1.0).contains(&rate) {
        return Err(Error::InvalidRate(rate));
    }

    let (min_value, max_value) = floored_range(grid)?;

    if rate == 0.0 {
        return cast(i64::from(max_value));
    }
    if rate == 1.0 {
        return if T::SIGNED {
            cast(i64::from(min_value) - 1)
        } else {
            Ok(T::zero())
        };
    }

    let hist_size = (i64::from(max_value) - i64::from(min_value) + 1) as usize;
    if hist_size > MAX_HISTOGRAM_BINS {
        return Err(Error::HistogramTooWide {
            min: min_value,
            max: max_value,
            bins: hist_size,
            limit: MAX_HISTOGRAM_BINS,
        });
    }
    let mut histogram = vec![0u64; hist_size];
    for &value in grid.iter() {
        let bin = (floor_value(value)? - i64::from(min_value)) as usize;
        histogram[bin] += 1;
    }

    let num_pixels = grid.len() as f64;
    let mut survival = vec![0.0f64; hist_size + 1];
    for i in (0..hist_size).rev() {
        survival[i] = survival[i + 1] + histogram[i] as f64 / num_pixels;
    }

    let mut index_low = 0usize;
    let mut index_high = hist_size - 1;
    let mut index = index_high / 2;
    loop {
        let value = survival[index];
        if value < rate {
            index_high = index;
        } else if value > rate {
            index_low = index;
        } else {
            debug!("exact survival match at bin {index} for rate {rate}");
            return bin_threshold(index, min_value);
        }

        if index_high - index_low < 2 {
            debug!(
                "threshold search settled at bin {index_high} (S = {}) for rate {rate}",
                survival[index_high]
            );
            return bin_threshold(index_high, min_value);
        }
        index = index_low + (index_high - index_low) / 2;
    }
}

/// Threshold just below histogram bin `index`.
fn bin_threshold<T: Intensity>(index: usize, min_value: i32) -> Result<T> {
    let threshold = index as i64 + i64::from(min_value) - 1;
    if !T::SIGNED && threshold < 0 {
        return Ok(T::zero());
    }
    cast(threshold)
}

fn cast<T: Intensity>(value: i64) -> Result<T> {
    <T as num_traits::NumCast>::from(value).ok_or(Error::ThresholdOutOfRange(value))
}

fn floor_value<T: Intensity>(value: T) -> Result<i64> {
    let floored = value.as_f64().floor();
    if !floored.is_finite() || floored < f64::from(i32::MIN) || floored > f64::from(i32::MAX) {
        return Err(Error::UnbinnableIntensity(value.as_f64()));
    }
    Ok(floored as i64)
}

fn floored_range<T: Intensity>(grid: ArrayView2<'_, T>) -> Result<(i32, i32)> {
    let mut values = grid.iter();
    let Some(&first) = values.next() else {
        return Err(Error::EmptyGrid);
    };
    let first = floor_value(first)?;
    let (min_value, max_value) = values.try_fold((first, first), |(lo, hi), &value| {
        let floored = floor_value(value)?;
        Ok::<_, Error>((lo.min(floored), hi.max(floored)))
    })?;
    Ok((min_value as i32, max_value as i32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn ramp() -> Array2<i32> {
        // values 0..=9, one each
        Array2::from_shape_fn((2, 5), |(r, c)| (r * 5 + c) as i32)
    }

    fn exceedance_rate<T: Intensity>(grid: &Array2<T>, threshold: T) -> f64 {
        let mask = apply_threshold(grid.view(), threshold);
        mask.iter().filter(|&&flag| flag).count() as f64 / grid.len() as f64
    }

    #[test]
    fn test_apply_threshold() {
        let grid = array![[1u8, 5, 6], [7, 5, 0]];
        let mask = apply_threshold(grid.view(), 5);
        assert_eq!(mask, array![[false, false, true], [true, false, false]]);
    }

    #[test]
    fn test_invalid_rate() {
        let grid = ramp();
        assert_eq!(
            generate_threshold(grid.view(), -0.1),
            Err(Error::InvalidRate(-0.1))
        );
        assert_eq!(
            generate_threshold(grid.view(), 1.5),
            Err(Error::InvalidRate(1.5))
        );
        assert!(matches!(
            generate_threshold(grid.view(), f64::NAN),
            Err(Error::InvalidRate(_))
        ));
    }

    #[test]
    fn test_empty_grid() {
        let grid = Array2::<u16>::zeros((0, 3));
        assert_eq!(generate_threshold(grid.view(), 0.5), Err(Error::EmptyGrid));
    }

    #[test]
    fn test_rate_zero_returns_max() {
        let grid = ramp();
        assert_eq!(generate_threshold(grid.view(), 0.0).unwrap(), 9);
        assert_eq!(exceedance_rate(&grid, 9), 0.0);
    }

    #[test]
    fn test_rate_one_signed() {
        let grid = ramp();
        let threshold = generate_threshold(grid.view(), 1.0).unwrap();
        assert_eq!(threshold, -1);
        assert!(grid.iter().all(|&v| v > threshold));
    }

    #[test]
    fn test_rate_one_unsigned() {
        let grid = array![[3u16, 4], [5, 9]];
        assert_eq!(generate_threshold(grid.view(), 1.0).unwrap(), 0);
    }

    #[test]
    fn test_rate_one_out_of_range() {
        let grid = array![[i8::MIN, 0i8]];
        assert_eq!(
            generate_threshold(grid.view(), 1.0),
            Err(Error::ThresholdOutOfRange(-129))
        );
    }

    #[test]
    fn test_exact_rate_match() {
        let grid = ramp();
        // S[5] = P(v >= 5) sums to exactly 0.5
        let threshold = generate_threshold(grid.view(), 0.5).unwrap();
        assert_eq!(threshold, 4);
        assert_eq!(exceedance_rate(&grid, threshold), 0.5);
    }

    #[test]
    fn test_inexact_rate_settles_on_upper_bracket() {
        let grid = array![[0i32, 0, 0, 1], [1, 1, 2, 3]];
        // S = [1.0, 0.625, 0.25, 0.125, 0]
        let threshold = generate_threshold(grid.view(), 0.3).unwrap();
        assert_eq!(threshold, 1);
        assert_eq!(exceedance_rate(&grid, threshold), 0.25);
    }

    #[test]
    fn test_constant_grid() {
        let grid = Array2::from_elem((3, 3), 7u16);
        let threshold = generate_threshold(grid.view(), 0.5).unwrap();
        assert_eq!(threshold, 6);
        assert_eq!(exceedance_rate(&grid, threshold), 1.0);
    }

    #[test]
    fn test_unsigned_clamps_to_zero() {
        let grid = Array2::from_elem((2, 2), 0u8);
        assert_eq!(generate_threshold(grid.view(), 0.5).unwrap(), 0);
    }

    #[test]
    fn test_float_values_are_floored() {
        let grid = array![[0.2f64, 1.7], [2.5, 3.9]];
        assert_eq!(generate_threshold(grid.view(), 0.0).unwrap(), 3.0);
        // S = [1.0, 0.75, 0.5, 0.25, 0]; bin 2 matches
        assert_eq!(generate_threshold(grid.view(), 0.5).unwrap(), 1.0);
    }

    #[test]
    fn test_wide_range_rejected() {
        let grid = array![[-2_000_000_000i32, 2_000_000_000]];
        assert!(matches!(
            generate_threshold(grid.view(), 0.5),
            Err(Error::HistogramTooWide {
                min: -2_000_000_000,
                max: 2_000_000_000,
                limit: MAX_HISTOGRAM_BINS,
                ..
            })
        ));
        // boundary rates never build the histogram
        assert_eq!(generate_threshold(grid.view(), 0.0).unwrap(), 2_000_000_000);
    }

    #[test]
    fn test_full_u16_range_fits() {
        let grid = array![[0u16, u16::MAX], [0, 0]];
        // S[0] = 1.0, S[1..] = 0.25
        let threshold = generate_threshold(grid.view(), 0.25).unwrap();
        assert_eq!(exceedance_rate(&grid, threshold), 0.25);
    }

    #[test]
    fn test_non_finite_values() {
        let grid = array![[1.0f32, f32::NAN]];
        assert!(matches!(
            generate_threshold(grid.view(), 0.5),
            Err(Error::UnbinnableIntensity(_))
        ));
    }
}
