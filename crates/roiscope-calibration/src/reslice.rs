//! Oblique 2D slices through a volume.

use glam::{DVec2, DVec3};

use crate::volume::ImageVolume;

/// A square image sampled on an oblique plane at 1 mm pixel spacing.
///
/// Pixel `(u, v)` lies at `origin + (u - half) * x_axis + (v - half) * y_axis`,
/// so the plane origin is the center pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceImage {
    origin: DVec3,
    x_axis: DVec3,
    y_axis: DVec3,
    half_size: usize,
    pixels: Vec<f64>,
}

impl SliceImage {
    /// Samples `volume` around `origin` on the plane spanned by the unit axes.
    pub fn reslice(
        volume: &ImageVolume,
        origin: DVec3,
        x_axis: DVec3,
        y_axis: DVec3,
        half_size: usize,
        background: f64,
    ) -> Self {
        let size = 2 * half_size + 1;
        let ras_to_ijk = volume.ras_to_ijk();
        let mut pixels = Vec::with_capacity(size * size);
        let half = half_size as f64;
        for v in 0..size {
            for u in 0..size {
                let ras = origin + (u as f64 - half) * x_axis + (v as f64 - half) * y_axis;
                pixels.push(volume.sample(ras_to_ijk.transform_point3(ras), background));
            }
        }
        Self {
            origin,
            x_axis,
            y_axis,
            half_size,
            pixels,
        }
    }

    /// Creates a slice from pixel values, row by row.
    ///
    /// Returns `None` when the pixel count does not match `half_size`.
    pub fn from_pixels(half_size: usize, pixels: Vec<f64>) -> Option<Self> {
        let size = 2 * half_size + 1;
        (pixels.len() == size * size).then_some(Self {
            origin: DVec3::ZERO,
            x_axis: DVec3::X,
            y_axis: DVec3::Y,
            half_size,
            pixels,
        })
    }

    /// Pixels along each side.
    pub fn size(&self) -> usize {
        2 * self.half_size + 1
    }

    /// Pixels from the center to the border.
    pub fn half_size(&self) -> usize {
        self.half_size
    }

    /// Pixel values, row by row.
    pub fn pixels(&self) -> &[f64] {
        &self.pixels
    }

    /// Value of a pixel.
    pub fn pixel(&self, u: usize, v: usize) -> f64 {
        self.pixels[v * self.size() + u]
    }

    /// Smallest and largest pixel values.
    pub fn range(&self) -> (f64, f64) {
        self.pixels
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| {
                (lo.min(p), hi.max(p))
            })
    }

    /// World position of an offset from the center pixel, in pixels.
    pub fn to_world(&self, offset: DVec2) -> DVec3 {
        self.origin + offset.x * self.x_axis + offset.y * self.y_axis
    }
}
