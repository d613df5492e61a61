//! spotpix-algorithms: Exceedance clustering and threshold algorithms.
//!
//! This crate provides:
//! - **`ClusterMaker`** - 8-connected component labeling with optional
//!   per-cluster border dilation
//! - **Threshold search** - survival-function bisection for a target
//!   exceedance rate
//! - **Mask windowing** - border dilation of a boolean exceedance mask
//! - **Pipeline** - threshold → window → cluster → centroid
//!
#![warn(missing_docs)]

mod cluster_maker;
mod processing;
mod threshold;
mod window;

pub use cluster_maker::ClusterMaker;
pub use processing::{
    centroid_clusters, cluster_pixels, generate_centroids, generate_centroids_with,
    CentroidConfig, WindowPlacement,
};
pub use threshold::{apply_threshold, generate_threshold, MAX_HISTOGRAM_BINS};
pub use window::window_exceedances;

// Re-export core types
pub use spotpix_core::{sort_by_intensity_desc, Centroid, Cluster, Error, Pixel, Result};
