//! High-level pipeline: threshold search, windowing, clustering, centroiding.

use crate::{apply_threshold, generate_threshold, window_exceedances, ClusterMaker};
use log::debug;
use ndarray::ArrayView2;
use spotpix_core::error::{Error, Result};
use spotpix_core::{Centroid, Cluster, Intensity};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where the border dilation is applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WindowPlacement {
    /// Dilate the mask before clustering; windows can merge clusters.
    Pre,
    /// Dilate each cluster after labeling; merging follows the raw mask.
    #[default]
    Post,
}

impl FromStr for WindowPlacement {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "pre" => Ok(Self::Pre),
            "post" => Ok(Self::Post),
            other => Err(Error::InvalidWindowPlacement(other.to_string())),
        }
    }
}

impl fmt::Display for WindowPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pre => f.write_str("pre"),
            Self::Post => f.write_str("post"),
        }
    }
}

/// Configuration for [`generate_centroids_with`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CentroidConfig {
    /// Target fraction of pixels that exceed the threshold, in `[0, 1]`.
    pub rate: f64,
    /// Whether the border dilation runs before or after clustering.
    pub window_placement: WindowPlacement,
    /// Dilation border in pixels (0 = disabled).
    pub border_width: u8,
}

impl Default for CentroidConfig {
    fn default() -> Self {
        Self {
            rate: 0.01,
            window_placement: WindowPlacement::Post,
            border_width: 0,
        }
    }
}

impl CentroidConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target exceedance rate.
    #[must_use]
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    /// Set the window placement.
    #[must_use]
    pub fn with_window_placement(mut self, placement: WindowPlacement) -> Self {
        self.window_placement = placement;
        self
    }

    /// Set the dilation border width.
    #[must_use]
    pub fn with_border_width(mut self, border_width: u8) -> Self {
        self.border_width = border_width;
        self
    }
}

/// Clusters the exceedances of `mask`, dilating each cluster by
/// `border_width` pixels.
///
/// # Errors
/// `ShapeMismatch` when `grid` and `mask` differ in shape.
pub fn cluster_pixels<T: Intensity>(
    grid: ArrayView2<'_, T>,
    mask: ArrayView2<'_, bool>,
    border_width: u8,
) -> Result<Vec<Cluster<T>>> {
    Ok(ClusterMaker::new(mask, grid, border_width)?.into_clusters())
}

/// Reduces each cluster to its centroid, preserving order.
#[must_use]
pub fn centroid_clusters<T: Intensity>(clusters: &[Cluster<T>]) -> Vec<Centroid<T>> {
    clusters.iter().map(Centroid::from_cluster).collect()
}

/// Full pipeline from an intensity grid to centroids.
///
/// threshold search → threshold → (`Pre`) mask windowing → clustering →
/// (`Post`) cluster windowing → centroids. Centroids come back in cluster
/// discovery order; use [`spotpix_core::sort_by_intensity_desc`] for
/// brightest-first.
///
/// # Errors
/// Any error from [`generate_threshold`].
pub fn generate_centroids<T: Intensity>(
    grid: ArrayView2<'_, T>,
    rate: f64,
    window_placement: WindowPlacement,
    border_width: u8,
) -> Result<Vec<Centroid<T>>> {
    let (pre_border, post_border) = match window_placement {
        WindowPlacement::Pre => (border_width, 0),
        WindowPlacement::Post => (0, border_width),
    };

    let threshold = generate_threshold(grid, rate)?;
    let mut mask = apply_threshold(grid, threshold);
    debug!(
        "rate {rate} -> threshold {threshold}, {} exceedances",
        mask.iter().filter(|&&exceeds| exceeds).count()
    );

    if pre_border > 0 {
        mask = window_exceedances(mask.view(), pre_border);
    }

    let clusters = cluster_pixels(grid, mask.view(), post_border)?;
    let centroids = centroid_clusters(&clusters);
    debug!(
        "{} centroids ({window_placement} window, border {border_width})",
        centroids.len()
    );
    Ok(centroids)
}

/// [`generate_centroids`] driven by a [`CentroidConfig`].
///
/// # Errors
/// See [`generate_centroids`].
pub fn generate_centroids_with<T: Intensity>(
    grid: ArrayView2<'_, T>,
    config: &CentroidConfig,
) -> Result<Vec<Centroid<T>>> {
    generate_centroids(grid, config.rate, config.window_placement, config.border_width)
}
