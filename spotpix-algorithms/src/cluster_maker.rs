//! Connected-component labeling of exceedance masks.
//!
//! Mask-true pixels are grouped into 8-connected clusters with a work-list
//! flood fill, then optionally dilated ("windowed") by a pixel border to
//! pull in low-signal wings.
//!
//! Key characteristics:
//! - Pixels are processed in row-major scan order; this order fixes cluster
//!   numbering and is reproducible for a given mask/intensity pair
//! - Neighbor lookups clamp to the grid edge, so border pixels see themselves
//! - Work-list membership uses a per-pixel flag instead of a linear scan;
//!   discovery order and cluster contents are unchanged by this
//! - Dilation only appends; overlapping windows may duplicate a pixel into
//!   more than one cluster

use log::{debug, trace};
use ndarray::{Array2, ArrayView2};
use spotpix_core::error::{Error, Result};
use spotpix_core::{clamped_neighbors, Cluster, Intensity, Pixel, PixelBatch};
use std::collections::HashSet;
use std::ops::Index;

/// Labels exceedance pixels into clusters.
///
/// All work happens in [`ClusterMaker::new`]; the input arrays are only
/// borrowed for the duration of that call.
#[derive(Debug, Clone)]
pub struct ClusterMaker<T> {
    shape: (usize, usize),
    exceedances: PixelBatch<T>,
    clusters: Vec<Cluster<T>>,
}

impl<T: Intensity> ClusterMaker<T> {
    /// Clusters the mask-true pixels of `mask`, then runs `border_width`
    /// dilation passes over every cluster.
    ///
    /// # Errors
    /// `ShapeMismatch` when `mask` and `intensities` differ in shape.
    pub fn new(
        mask: ArrayView2<'_, bool>,
        intensities: ArrayView2<'_, T>,
        border_width: u8,
    ) -> Result<Self> {
        if mask.dim() != intensities.dim() {
            return Err(Error::ShapeMismatch {
                mask: mask.dim(),
                intensities: intensities.dim(),
            });
        }
        let shape = mask.dim();

        // Flat exceedance list in scan order, plus a grid back to it
        let mut exceedances = PixelBatch::new();
        let mut index_grid: Array2<Option<usize>> = Array2::from_elem(shape, None);
        for ((row, col), &exceeds) in mask.indexed_iter() {
            if exceeds {
                index_grid[[row, col]] = Some(exceedances.len());
                exceedances.push(Pixel::new(row, col, intensities[[row, col]]));
            }
        }

        let mut maker = Self {
            shape,
            exceedances,
            clusters: Vec::new(),
        };
        maker.label(&index_grid)?;

        for pass in 0..border_width {
            maker.expand_clusters(mask, intensities);
            trace!("dilation pass {} complete", pass + 1);
        }

        debug!(
            "clustered {} exceedances into {} clusters (border {})",
            maker.exceedances.len(),
            maker.clusters.len(),
            border_width
        );
        Ok(maker)
    }

    /// Single traversal of the exceedance list.
    ///
    /// Each unassigned pixel seeds a new cluster; the work-list then grows
    /// with the mask-true neighbors of every entry it reaches, and each
    /// entry joins the cluster when processed.
    #[allow(clippy::cast_possible_wrap)]
    fn label(&mut self, index_grid: &Array2<Option<usize>>) -> Result<()> {
        let mut queued = vec![false; self.exceedances.len()];
        let mut work: Vec<usize> = Vec::new();
        let mut next_id: u32 = 0;

        for seed in 0..self.exceedances.len() {
            if !self.exceedances.is_unassigned(seed) {
                continue;
            }

            let label = next_id as i32;
            let mut cluster = Cluster::new(next_id);
            self.assign(seed, label, &mut cluster)?;
            queued[seed] = true;

            work.clear();
            self.queue_neighbors(seed, index_grid, &mut queued, &mut work);

            let mut cursor = 0;
            while cursor < work.len() {
                let index = work[cursor];
                cursor += 1;
                self.queue_neighbors(index, index_grid, &mut queued, &mut work);
                if self.exceedances.is_unassigned(index) {
                    self.assign(index, label, &mut cluster)?;
                }
            }

            self.clusters.push(cluster);
            next_id += 1;
        }
        Ok(())
    }

    fn assign(&mut self, index: usize, label: i32, cluster: &mut Cluster<T>) -> Result<()> {
        self.exceedances.set_cluster_id(index, label)?;
        if let Some(&pixel) = self.exceedances.pixel(index) {
            cluster.add_pixel(pixel);
        }
        Ok(())
    }

    /// Appends the not-yet-queued exceedance neighbors of `index`, row-major.
    fn queue_neighbors(
        &self,
        index: usize,
        index_grid: &Array2<Option<usize>>,
        queued: &mut [bool],
        work: &mut Vec<usize>,
    ) {
        let Some(pixel) = self.exceedances.pixel(index) else {
            return;
        };
        for coord in pixel.neighbors(self.shape) {
            if let Some(neighbor) = index_grid[coord] {
                if !queued[neighbor] {
                    queued[neighbor] = true;
                    work.push(neighbor);
                }
            }
        }
    }

    /// One dilation pass.
    ///
    /// For the pixels each cluster held when the pass began, mask-false
    /// neighbors that are not yet members are appended.
    fn expand_clusters(&mut self, mask: ArrayView2<'_, bool>, intensities: ArrayView2<'_, T>) {
        let shape = self.shape;
        for cluster in &mut self.clusters {
            let mut members: HashSet<(usize, usize)> = cluster.iter().map(Pixel::coord).collect();
            let pass_len = cluster.len();
            for i in 0..pass_len {
                let pixel = cluster[i];
                for coord in clamped_neighbors(pixel.row(), pixel.col(), shape) {
                    if mask[coord] || !members.insert(coord) {
                        continue;
                    }
                    cluster.add_pixel(Pixel::new(coord.0, coord.1, intensities[coord]));
                }
            }
        }
    }

    /// Grid shape `(rows, cols)` the clusters were built from.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Number of clusters found.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Returns true if no clusters were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Cluster at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Cluster<T>> {
        self.clusters.get(index)
    }

    /// Bounds-checked cluster access.
    ///
    /// # Errors
    /// `IndexOutOfRange` when `index >= len()`.
    pub fn at(&self, index: usize) -> Result<&Cluster<T>> {
        self.clusters.get(index).ok_or(Error::IndexOutOfRange {
            what: "cluster list",
            index,
            len: self.clusters.len(),
        })
    }

    /// Clusters in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, Cluster<T>> {
        self.clusters.iter()
    }

    /// Exceedance pixels in scan order with their cluster labels.
    #[must_use]
    pub fn pixels(&self) -> &PixelBatch<T> {
        &self.exceedances
    }

    /// Consumes the maker, returning its clusters.
    #[must_use]
    pub fn into_clusters(self) -> Vec<Cluster<T>> {
        self.clusters
    }
}

/// Unchecked access; panics when `index` is out of range.
impl<T> Index<usize> for ClusterMaker<T> {
    type Output = Cluster<T>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.clusters[index]
    }
}

impl<'a, T: Intensity> IntoIterator for &'a ClusterMaker<T> {
    type Item = &'a Cluster<T>;
    type IntoIter = std::slice::Iter<'a, Cluster<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use spotpix_core::UNASSIGNED;

    fn maker(mask: &Array2<bool>, grid: &Array2<u16>, border: u8) -> ClusterMaker<u16> {
        ClusterMaker::new(mask.view(), grid.view(), border).unwrap()
    }

    #[test]
    fn test_shape_mismatch() {
        let mask = Array2::from_elem((3, 3), false);
        let grid = Array2::<u16>::zeros((3, 4));
        let result = ClusterMaker::new(mask.view(), grid.view(), 0);
        assert_eq!(
            result.unwrap_err(),
            Error::ShapeMismatch {
                mask: (3, 3),
                intensities: (3, 4)
            }
        );
    }

    #[test]
    fn test_empty_mask() {
        let mask = Array2::from_elem((4, 4), false);
        let grid = Array2::<u16>::zeros((4, 4));
        let clusters = maker(&mask, &grid, 2);
        assert!(clusters.is_empty());
        assert!(clusters.pixels().is_empty());
    }

    #[test]
    fn test_single_cluster_labeling_order() {
        let mask = array![
            [true, true, false],
            [false, true, false],
            [true, false, false]
        ];
        let grid = array![[1u16, 2, 0], [0, 3, 0], [4, 0, 0]];
        let clusters = maker(&mask, &grid, 0);

        assert_eq!(clusters.len(), 1);
        let cluster = &clusters[0];
        // seed (0,0); its neighbors (0,1),(1,1) in row-major order; then (2,0) via (1,1)
        let coords: Vec<_> = cluster.iter().map(Pixel::coord).collect();
        assert_eq!(coords, vec![(0, 0), (0, 1), (1, 1), (2, 0)]);
        assert_eq!(cluster.intensity(), 10);
        assert_eq!(cluster.peak_intensity(), 4);
    }

    #[test]
    fn test_cluster_numbering_follows_seed_scan_order() {
        let mask = array![
            [false, false, false, true],
            [true, false, false, true],
            [true, false, false, false]
        ];
        let grid = Array2::from_elem((3, 4), 5u16);
        let clusters = maker(&mask, &grid, 0);

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].id(), 0);
        assert_eq!(clusters[0][0].coord(), (0, 3));
        assert_eq!(clusters[1].id(), 1);
        assert_eq!(clusters[1][0].coord(), (1, 0));

        // labels are parallel to the scan-order exceedance list
        assert_eq!(clusters.pixels().cluster_ids(), &[0, 1, 0, 1]);
        assert!(!clusters.pixels().cluster_ids().contains(&UNASSIGNED));
    }

    #[test]
    fn test_diagonal_pixels_connect() {
        let mask = array![[true, false], [false, true]];
        let grid = array![[1u16, 0], [0, 1]];
        assert_eq!(maker(&mask, &grid, 0).len(), 1);
    }

    #[test]
    fn test_dilation_adds_border() {
        let mut mask = Array2::from_elem((5, 5), false);
        mask[[2, 2]] = true;
        let grid = Array2::from_elem((5, 5), 1u16);

        let one = maker(&mask, &grid, 1);
        assert_eq!(one[0].len(), 9);
        assert_eq!(one[0][0].coord(), (2, 2));

        let two = maker(&mask, &grid, 2);
        assert_eq!(two[0].len(), 25);
        assert_eq!(two[0].intensity(), 25);
    }

    #[test]
    fn test_dilation_duplicates_between_clusters() {
        // two exceedances with a one-pixel gap share their window
        let mask = array![[true, false, true]];
        let grid = array![[9u16, 1, 9]];
        let clusters = maker(&mask, &grid, 1);

        assert_eq!(clusters.len(), 2);
        assert!(clusters[0].contains(&Pixel::new(0, 1, 1)));
        assert!(clusters[1].contains(&Pixel::new(0, 1, 1)));
        assert_eq!(clusters[0].len(), 2);
        assert_eq!(clusters[1].len(), 2);
    }

    #[test]
    fn test_dilation_skips_other_exceedances() {
        let mask = array![[true, false, false], [false, false, false], [false, false, true]];
        let grid = Array2::from_elem((3, 3), 2u16);
        let clusters = maker(&mask, &grid, 2);

        assert_eq!(clusters.len(), 2);
        // never absorbs the other cluster's exceedance
        assert!(!clusters[0].contains(&Pixel::new(2, 2, 2)));
        assert!(!clusters[1].contains(&Pixel::new(0, 0, 2)));
        assert_eq!(clusters[0].len(), 8);
    }

    #[test]
    fn test_checked_access() {
        let mask = array![[true]];
        let grid = array![[3u16]];
        let clusters = maker(&mask, &grid, 0);
        assert!(clusters.at(0).is_ok());
        assert!(matches!(
            clusters.at(1),
            Err(Error::IndexOutOfRange { index: 1, len: 1, .. })
        ));
        assert!(clusters.get(1).is_none());
        assert_eq!((&clusters).into_iter().count(), 1);
        assert_eq!(clusters.into_clusters().len(), 1);
    }
}
