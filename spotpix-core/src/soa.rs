//! Flat exceedance list with a parallel cluster-label array.
//!
//! `PixelBatch` keeps the exceedance pixels in grid scan order and stores
//! cluster assignments in a separate `cluster_id` column, so labeling never
//! touches pixel identity.

use crate::error::{Error, Result};
use crate::{Intensity, Pixel};

/// Label value for a pixel that has not been assigned to a cluster.
pub const UNASSIGNED: i32 = -1;

/// Exceedance pixels plus their cluster assignments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PixelBatch<T> {
    pixels: Vec<Pixel<T>>,
    cluster_id: Vec<i32>,
}

impl<T: Intensity> PixelBatch<T> {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pixels: Vec::new(),
            cluster_id: Vec::new(),
        }
    }

    /// Creates a new empty batch with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pixels: Vec::with_capacity(capacity),
            cluster_id: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of pixels in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Returns true if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Appends a pixel, unassigned.
    pub fn push(&mut self, pixel: Pixel<T>) {
        self.pixels.push(pixel);
        self.cluster_id.push(UNASSIGNED);
    }

    /// Pixel at `index`, if any.
    #[must_use]
    pub fn pixel(&self, index: usize) -> Option<&Pixel<T>> {
        self.pixels.get(index)
    }

    /// Cluster id at `index`; `Some(-1)` means unassigned.
    #[must_use]
    pub fn cluster_id(&self, index: usize) -> Option<i32> {
        self.cluster_id.get(index).copied()
    }

    /// Whether the pixel at `index` still awaits a cluster.
    #[must_use]
    pub fn is_unassigned(&self, index: usize) -> bool {
        self.cluster_id(index) == Some(UNASSIGNED)
    }

    /// Assigns the pixel at `index` to `cluster_id`.
    ///
    /// # Errors
    /// `NegativeClusterId` for ids below zero, `IndexOutOfRange` when
    /// `index` is past the end of the batch.
    pub fn set_cluster_id(&mut self, index: usize, cluster_id: i32) -> Result<()> {
        if cluster_id < 0 {
            return Err(Error::NegativeClusterId(cluster_id));
        }
        let len = self.cluster_id.len();
        let slot = self.cluster_id.get_mut(index).ok_or(Error::IndexOutOfRange {
            what: "pixel batch",
            index,
            len,
        })?;
        *slot = cluster_id;
        Ok(())
    }

    /// Pixels in scan order.
    #[must_use]
    pub fn pixels(&self) -> &[Pixel<T>] {
        &self.pixels
    }

    /// Cluster labels, parallel to [`pixels`](Self::pixels).
    #[must_use]
    pub fn cluster_ids(&self) -> &[i32] {
        &self.cluster_id
    }

    /// Iterates `(pixel, cluster_id)` pairs in scan order.
    pub fn iter(&self) -> impl Iterator<Item = (&Pixel<T>, i32)> {
        self.pixels.iter().zip(self.cluster_id.iter().copied())
    }
}
