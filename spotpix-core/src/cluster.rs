//! Cluster accumulator.

use crate::error::{Error, Result};
use crate::{Intensity, Pixel};
use std::fmt;
use std::ops::Index;

/// An append-only group of pixels with running summary statistics.
///
/// Every [`add_pixel`](Self::add_pixel) keeps the bounding box, intensity
/// sum, peak intensity and energy-on-detector ratio in step with the
/// pixel list.
///
/// The intensity sum is kept in `T` and wraps on integer overflow. The
/// energy-on-detector ratio is computed from an exact `f64` total, so it
/// stays meaningful when the `T` sum has wrapped.
#[derive(Debug, Clone)]
pub struct Cluster<T> {
    id: u32,
    pixels: Vec<Pixel<T>>,
    row_min: usize,
    row_max: usize,
    col_min: usize,
    col_max: usize,
    intensity: T,
    total: f64,
    peak_intensity: T,
    eod: f64,
}

impl<T: Intensity> Cluster<T> {
    /// Creates an empty cluster.
    ///
    /// The bounding box starts inverted (`min = usize::MAX`, `max = 0`) so
    /// the first pixel establishes real bounds.
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self {
            id,
            pixels: Vec::new(),
            row_min: usize::MAX,
            row_max: 0,
            col_min: usize::MAX,
            col_max: 0,
            intensity: T::zero(),
            total: 0.0,
            peak_intensity: T::zero(),
            eod: 1.0,
        }
    }

    /// Appends a pixel and updates the running statistics.
    pub fn add_pixel(&mut self, pixel: Pixel<T>) {
        let first = self.pixels.is_empty();
        self.pixels.push(pixel);
        self.intensity = self.intensity.accumulate(pixel.intensity());
        self.total += pixel.intensity().as_f64();

        self.row_min = self.row_min.min(pixel.row());
        self.row_max = self.row_max.max(pixel.row());
        self.col_min = self.col_min.min(pixel.col());
        self.col_max = self.col_max.max(pixel.col());

        if first || pixel.intensity() > self.peak_intensity {
            self.peak_intensity = pixel.intensity();
        }
        self.eod = self.peak_intensity.as_f64() / self.total;
    }

    /// Cluster id assigned at creation.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the number of pixels in the cluster.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Returns true if the cluster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[must_use]
    pub fn row_min(&self) -> usize {
        self.row_min
    }

    #[must_use]
    pub fn row_max(&self) -> usize {
        self.row_max
    }

    #[must_use]
    pub fn col_min(&self) -> usize {
        self.col_min
    }

    #[must_use]
    pub fn col_max(&self) -> usize {
        self.col_max
    }

    /// Bounding box height. Only meaningful for a non-empty cluster.
    #[must_use]
    pub fn height(&self) -> usize {
        self.row_max.wrapping_sub(self.row_min).wrapping_add(1)
    }

    /// Bounding box width. Only meaningful for a non-empty cluster.
    #[must_use]
    pub fn width(&self) -> usize {
        self.col_max.wrapping_sub(self.col_min).wrapping_add(1)
    }

    /// Summed intensity of all member pixels.
    ///
    /// Wraps for integer types when the sum exceeds `T`'s range.
    #[must_use]
    pub fn intensity(&self) -> T {
        self.intensity
    }

    /// Brightest member intensity.
    #[must_use]
    pub fn peak_intensity(&self) -> T {
        self.peak_intensity
    }

    /// Energy on detector: `peak_intensity / intensity`.
    #[must_use]
    pub fn eod(&self) -> f64 {
        self.eod
    }

    /// Pixel at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Pixel<T>> {
        self.pixels.get(index)
    }

    /// Bounds-checked pixel access.
    ///
    /// # Errors
    /// `IndexOutOfRange` when `index >= len()`.
    pub fn at(&self, index: usize) -> Result<&Pixel<T>> {
        self.pixels.get(index).ok_or(Error::IndexOutOfRange {
            what: "cluster",
            index,
            len: self.pixels.len(),
        })
    }

    /// Whether a pixel with the same position and intensity is a member.
    #[must_use]
    pub fn contains(&self, pixel: &Pixel<T>) -> bool {
        self.pixels.contains(pixel)
    }

    /// Member pixels in insertion order.
    #[must_use]
    pub fn pixels(&self) -> &[Pixel<T>] {
        &self.pixels
    }

    /// Iterates member pixels in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Pixel<T>> {
        self.pixels.iter()
    }
}

/// Unchecked access; panics when `index` is out of range.
impl<T> Index<usize> for Cluster<T> {
    type Output = Pixel<T>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.pixels[index]
    }
}

impl<'a, T: Intensity> IntoIterator for &'a Cluster<T> {
    type Item = &'a Pixel<T>;
    type IntoIter = std::slice::Iter<'a, Pixel<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Strict sequence equality: same pixels in the same insertion order.
impl<T: PartialEq> PartialEq for Cluster<T> {
    fn eq(&self, other: &Self) -> bool {
        self.pixels == other.pixels
    }
}

impl<T: Intensity> fmt::Display for Cluster<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, pixel) in self.pixels.iter().enumerate() {
            writeln!(f, "Pixel {i}:{pixel}")?;
        }
        Ok(())
    }
}
