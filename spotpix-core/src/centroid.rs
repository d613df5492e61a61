//! Centroid reduction of finished clusters.
#![allow(clippy::cast_precision_loss)]

use crate::error::{Error, Result};
use crate::{Cluster, Intensity};
use ndarray::Array2;
use std::cmp::Ordering;
use std::fmt;

/// Sub-pixel position and photometry of one cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centroid<T> {
    row: f64,
    col: f64,
    intensity: T,
    eod: f64,
}

impl<T: Intensity> Centroid<T> {
    /// Reduces a finished cluster to its intensity-weighted center of mass.
    ///
    /// The cluster is rasterized onto a zeroed grid covering its bounding
    /// box. Cells inside the box that hold no member pixel contribute zero;
    /// they are never sampled from the source image, which matters for
    /// concave or sparse clusters.
    ///
    /// Weights are summed in `f64`, so the position stays inside the bounding
    /// box when an integer cluster's `T` intensity has wrapped. The reported
    /// intensity is the cluster's own (possibly wrapped) sum.
    ///
    /// The result is not finite when the cluster intensity sums to zero,
    /// including when positive and negative pixels cancel out. Callers
    /// feeding signed data own that case.
    ///
    /// # Panics
    /// Panics on an empty cluster; use [`try_from_cluster`](Self::try_from_cluster)
    /// for clusters that may have no pixels.
    #[must_use]
    pub fn from_cluster(cluster: &Cluster<T>) -> Self {
        assert!(!cluster.is_empty(), "cannot compute centroid of empty cluster");
        let (row, col) = center_of_mass(cluster);
        Self {
            row,
            col,
            intensity: cluster.intensity(),
            eod: cluster.eod(),
        }
    }

    /// Like [`from_cluster`](Self::from_cluster), rejecting empty clusters.
    ///
    /// # Errors
    /// `EmptyCluster` when the cluster holds no pixels.
    pub fn try_from_cluster(cluster: &Cluster<T>) -> Result<Self> {
        if cluster.is_empty() {
            return Err(Error::EmptyCluster);
        }
        Ok(Self::from_cluster(cluster))
    }

    /// Centroid row (sub-pixel).
    #[must_use]
    pub fn row(&self) -> f64 {
        self.row
    }

    /// Centroid column (sub-pixel).
    #[must_use]
    pub fn col(&self) -> f64 {
        self.col
    }

    /// Summed cluster intensity.
    #[must_use]
    pub fn intensity(&self) -> T {
        self.intensity
    }

    /// Energy on detector of the source cluster.
    #[must_use]
    pub fn eod(&self) -> f64 {
        self.eod
    }

    /// Brightest-first ordering by intensity.
    ///
    /// Incomparable intensities (NaN) compare equal.
    #[must_use]
    pub fn cmp_intensity_desc(&self, other: &Self) -> Ordering {
        other
            .intensity
            .partial_cmp(&self.intensity)
            .unwrap_or(Ordering::Equal)
    }
}

impl<T: Intensity> From<&Cluster<T>> for Centroid<T> {
    fn from(cluster: &Cluster<T>) -> Self {
        Self::from_cluster(cluster)
    }
}

impl<T: Intensity> fmt::Display for Centroid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row = {} col = {} intensity = {} eod = {}",
            self.row, self.col, self.intensity, self.eod
        )
    }
}

/// Sorts centroids brightest first. Ties keep their discovery order.
pub fn sort_by_intensity_desc<T: Intensity>(centroids: &mut [Centroid<T>]) {
    centroids.sort_by(Centroid::cmp_intensity_desc);
}

fn center_of_mass<T: Intensity>(cluster: &Cluster<T>) -> (f64, f64) {
    let row_min = cluster.row_min();
    let col_min = cluster.col_min();
    let mut raster = Array2::<f64>::zeros((cluster.height(), cluster.width()));
    for pixel in cluster {
        raster[[pixel.row() - row_min, pixel.col() - col_min]] = pixel.intensity().as_f64();
    }

    let intensity = raster.sum();

    let row = raster
        .rows()
        .into_iter()
        .enumerate()
        .map(|(offset, line)| line.sum() * (row_min + offset) as f64)
        .sum::<f64>()
        / intensity;

    let col = raster
        .columns()
        .into_iter()
        .enumerate()
        .map(|(offset, line)| line.sum() * (col_min + offset) as f64)
        .sum::<f64>()
        / intensity;

    (row, col)
}
