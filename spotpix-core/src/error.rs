//! Error types for spotpix-core.

use thiserror::Error;

/// Result type alias for spotpix operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Invalid-argument conditions raised by spotpix operations.
///
/// Every variant is raised synchronously at the violated precondition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Mask and intensity arrays differ in shape.
    #[error("mask shape {mask:?} does not match intensity shape {intensities:?}")]
    ShapeMismatch {
        mask: (usize, usize),
        intensities: (usize, usize),
    },

    /// Bounds-checked index access past the end of a collection.
    #[error("index {index} exceeds {what} size {len}")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// Cluster ids must be non-negative.
    #[error("cluster id must be greater than or equal to 0, got {0}")]
    NegativeClusterId(i32),

    /// Exceedance rate outside `[0, 1]`.
    #[error("rate must be in the range [0, 1], got {0}")]
    InvalidRate(f64),

    /// Unknown window placement mode.
    #[error("unknown window placement '{0}', expected one of ['pre', 'post']")]
    InvalidWindowPlacement(String),

    /// Threshold search over a grid with no elements.
    #[error("cannot compute a threshold for an empty grid")]
    EmptyGrid,

    /// Intensity that cannot be placed into an integer histogram bin.
    #[error("intensity {0} cannot be binned into an integer histogram")]
    UnbinnableIntensity(f64),

    /// Floored intensity range needs more histogram bins than allowed.
    #[error("intensity range [{min}, {max}] needs {bins} histogram bins, limit is {limit}")]
    HistogramTooWide {
        min: i32,
        max: i32,
        bins: usize,
        limit: usize,
    },

    /// Threshold value not representable in the grid element type.
    #[error("threshold {0} is not representable in the grid element type")]
    ThresholdOutOfRange(i64),

    /// Centroid requested for a cluster without pixels.
    #[error("cannot compute centroid of empty cluster")]
    EmptyCluster,
}
