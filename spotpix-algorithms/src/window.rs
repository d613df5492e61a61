//! Exceedance mask windowing.

use ndarray::{Array2, ArrayView2};
use spotpix_core::clamped_neighbors;

/// Dilates `mask` by `border_width` pixels of 8-connectivity.
///
/// Each pass reads the previous pass's result and marks every clamped
/// neighbor of every true cell, so `border_width = 2` grows regions by two
/// pixels. A width of zero returns an unchanged copy.
#[must_use]
pub fn window_exceedances(mask: ArrayView2<'_, bool>, border_width: u8) -> Array2<bool> {
    let shape = mask.dim();
    let mut current = mask.to_owned();
    for _ in 0..border_width {
        let mut next = current.clone();
        for ((row, col), _) in current.indexed_iter().filter(|(_, &exceeds)| exceeds) {
            for coord in clamped_neighbors(row, col, shape) {
                next[coord] = true;
            }
        }
        current = next;
    }
    current
}
