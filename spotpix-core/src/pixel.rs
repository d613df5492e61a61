//! Pixel types for exceedance grids.

use crate::Intensity;
use std::cmp::Ordering;
use std::fmt;

/// A single grid cell: position plus the intensity sampled there.
///
/// Pixels are immutable once built. Cluster membership is tracked outside
/// the pixel (see [`PixelBatch`](crate::PixelBatch)), so equality only
/// looks at position and intensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pixel<T> {
    row: usize,
    col: usize,
    intensity: T,
}

impl<T: Intensity> Pixel<T> {
    /// Creates a new pixel.
    #[inline]
    #[must_use]
    pub fn new(row: usize, col: usize, intensity: T) -> Self {
        Self {
            row,
            col,
            intensity,
        }
    }

    /// Row index on the grid.
    #[inline]
    #[must_use]
    pub fn row(&self) -> usize {
        self.row
    }

    /// Column index on the grid.
    #[inline]
    #[must_use]
    pub fn col(&self) -> usize {
        self.col
    }

    /// Sampled intensity.
    #[inline]
    #[must_use]
    pub fn intensity(&self) -> T {
        self.intensity
    }

    /// `(row, col)` coordinate.
    #[inline]
    #[must_use]
    pub fn coord(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    /// Row-major ordering by position.
    ///
    /// Only used for deterministic iteration and deduplication; intensity
    /// does not take part.
    #[inline]
    #[must_use]
    pub fn cmp_row_major(&self, other: &Self) -> Ordering {
        self.coord().cmp(&other.coord())
    }

    /// 8-neighborhood of this pixel on a grid of `shape` (rows, cols).
    ///
    /// See [`clamped_neighbors`].
    #[must_use]
    pub fn neighbors(&self, shape: (usize, usize)) -> Vec<(usize, usize)> {
        clamped_neighbors(self.row, self.col, shape)
    }
}

impl<T: Intensity> fmt::Display for Pixel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row = {} col = {} intensity = {}",
            self.row, self.col, self.intensity
        )
    }
}

/// The 8 neighbors of `(row, col)` clamped into a `shape` grid.
///
/// Out-of-range coordinates are clamped to the nearest edge rather than
/// dropped, so a pixel on the border can appear in its own neighborhood.
/// The result is deduplicated and sorted row-major.
#[must_use]
pub fn clamped_neighbors(row: usize, col: usize, shape: (usize, usize)) -> Vec<(usize, usize)> {
    let (rows, cols) = shape;
    let last_row = rows.saturating_sub(1);
    let last_col = cols.saturating_sub(1);

    let up = row.saturating_sub(1);
    let down = (row + 1).min(last_row);
    let left = col.saturating_sub(1);
    let right = (col + 1).min(last_col);
    let row = row.min(last_row);
    let col = col.min(last_col);

    let mut neighbors = vec![
        (up, left),
        (up, col),
        (up, right),
        (row, left),
        (row, right),
        (down, left),
        (down, col),
        (down, right),
    ];
    neighbors.sort_unstable();
    neighbors.dedup();
    neighbors
}
