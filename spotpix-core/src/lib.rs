//! spotpix-core: Core types for exceedance clustering and centroiding.
//!
//! This crate provides the pixel, cluster and centroid data types shared by
//! the labeling and threshold algorithms in `spotpix-algorithms`.
//!

pub mod centroid;
pub mod cluster;
pub mod error;
pub mod intensity;
pub mod pixel;
pub mod soa;

pub use centroid::{sort_by_intensity_desc, Centroid};
pub use cluster::Cluster;
pub use error::{Error, Result};
pub use intensity::Intensity;
pub use pixel::{clamped_neighbors, Pixel};
pub use soa::{PixelBatch, UNASSIGNED};
