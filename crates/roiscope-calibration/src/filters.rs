//! Volume-of-interest preprocessing: median denoising, thresholding and
//! cylindrical cropping around a marker axis.

use glam::DVec3;
use roiscope_core::math::distance_to_line;

use crate::volume::ImageVolume;

/// Value of voxels at or above the threshold in a binary volume.
pub const BINARY_INSIDE: f32 = 255.0;
/// Value of voxels below the threshold in a binary volume.
pub const BINARY_OUTSIDE: f32 = 0.0;

/// 3x3x3 median filter.
///
/// At the border the kernel is truncated to the voxels inside the volume.
#[must_use]
pub fn median3(volume: &ImageVolume) -> ImageVolume {
    let dims = volume.dims();
    let mut out = volume.clone();
    let mut window: Vec<f32> = Vec::with_capacity(27);
    for k in 0..dims.z {
        for j in 0..dims.y {
            for i in 0..dims.x {
                window.clear();
                for kk in k.saturating_sub(1)..=(k + 1).min(dims.z - 1) {
                    for jj in j.saturating_sub(1)..=(j + 1).min(dims.y - 1) {
                        for ii in i.saturating_sub(1)..=(i + 1).min(dims.x - 1) {
                            window.push(volume.voxel(ii, jj, kk));
                        }
                    }
                }
                window.sort_by(f32::total_cmp);
                out.set_voxel(i, j, k, window[window.len() / 2]);
            }
        }
    }
    out
}

/// Intensity at `percent` of the way from `min` to `max`.
pub fn threshold_level(range: (f32, f32), percent: f64) -> f64 {
    let (lo, hi) = (f64::from(range.0), f64::from(range.1));
    lo + (hi - lo) * percent / 100.0
}

/// Binarizes a volume: voxels at or above `level` become [`BINARY_INSIDE`].
#[must_use]
pub fn threshold(volume: &ImageVolume, level: f64) -> ImageVolume {
    volume.map(|v| {
        if f64::from(v) >= level {
            BINARY_INSIDE
        } else {
            BINARY_OUTSIDE
        }
    })
}

/// Clears every voxel farther than `radius` from a line.
///
/// Returns the number of voxels cleared.
pub fn crop_with_cylinder(
    volume: &mut ImageVolume,
    line_point: DVec3,
    line_direction: DVec3,
    radius: f64,
) -> usize {
    let direction = line_direction.normalize_or_zero();
    let dims = volume.dims();
    let mut cleared = 0;
    for k in 0..dims.z {
        for j in 0..dims.y {
            for i in 0..dims.x {
                let ras = volume.voxel_to_ras(i, j, k);
                if distance_to_line(ras, line_point, direction) > radius {
                    let index = volume.index(i, j, k);
                    volume.data_mut()[index] = BINARY_OUTSIDE;
                    cleared += 1;
                }
            }
        }
    }
    cleared
}
