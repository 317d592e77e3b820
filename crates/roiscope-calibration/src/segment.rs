//! Marker segmentation: per-marker slice detection and per-axis line fitting.

use glam::{DVec3, UVec3};
use roiscope_core::math::centroid;
use roiscope_core::slice_plane::in_plane_axes;
use roiscope_core::{MarkerGeometry, SegmentationOptions};

use crate::circle::detect_center;
use crate::filters::{crop_with_cylinder, median3, threshold, threshold_level};
use crate::line_fit::{remove_outliers, Line3, LineFit};
use crate::reslice::SliceImage;
use crate::volume::{ImageVolume, VoxelExtent};

/// Slice positions closer than this (in voxels) to the VOI border still count as inside.
const EXTENT_TOLERANCE: f64 = 0.1;

/// Markers closer than this (mm) are treated as coincident.
const COINCIDENT_MARKERS_MM: f64 = 0.1;

/// Result of segmenting one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSegmentation {
    /// Whether at least one slice produced a center.
    pub found: bool,
    /// Mean of the detected centers, or the guess when nothing was detected.
    pub position: DVec3,
    /// Detected centers in world coordinates.
    pub centerpoints: Vec<DVec3>,
    /// The median-filtered, thresholded and cylinder-cropped VOI.
    pub preprocessed: ImageVolume,
}

/// VOI around `center` holding a marker in any orientation, clamped to the volume.
pub fn marker_voi(volume: &ImageVolume, center: DVec3, dims_mm: DVec3) -> VoxelExtent {
    let center_ijk = volume.ras_to_ijk().transform_point3(center);
    let half = 2.0 * dims_mm / volume.spacing();
    let last = (volume.dims() - UVec3::ONE).as_dvec3();
    // Truncation toward zero, then clamping into the volume.
    let clamp = |v: DVec3| v.trunc().clamp(DVec3::ZERO, last);
    let lo = clamp(center_ijk - half);
    let hi = clamp(center_ijk + half);
    VoxelExtent {
        min: lo.as_uvec3(),
        max: hi.as_uvec3(),
    }
}

/// Segments one marker around its guessed center.
///
/// The VOI is median filtered, binarized at `threshold_percent` of the
/// volume's intensity range and cropped to a cylinder around the guess
/// line. With centerpoint adjustment enabled, the VOI is then sliced every
/// millimetre perpendicular to `normal` and the cross-section center of
/// each slice becomes a candidate point.
pub fn segment_marker(
    volume: &ImageVolume,
    guess: DVec3,
    normal: DVec3,
    threshold_percent: f64,
    geometry: &MarkerGeometry,
    options: &SegmentationOptions,
) -> MarkerSegmentation {
    let extent = marker_voi(volume, guess, geometry.dimensions_mm);
    let voi = volume.extract(&extent);
    let level = threshold_level(volume.scalar_range(), threshold_percent);
    let mut preprocessed = threshold(&median3(&voi), level);
    crop_with_cylinder(
        &mut preprocessed,
        guess,
        normal,
        geometry.radius_mm * options.max_radius_tolerance,
    );

    if !options.enable_centerpoint_adjustment {
        return MarkerSegmentation {
            found: true,
            position: guess,
            centerpoints: vec![guess],
            preprocessed,
        };
    }

    let (x_axis, y_axis) = in_plane_axes(normal);
    let ras_to_ijk = volume.ras_to_ijk();
    let inside = |p: DVec3| extent.contains(ras_to_ijk.transform_point3(p), EXTENT_TOLERANCE);

    // Walk back to the first slice position inside the VOI.
    let mut origin = guess;
    if inside(origin) {
        while inside(origin - normal) {
            origin -= normal;
        }
    }

    let mut centerpoints = Vec::new();
    let mut slices = 0;
    while inside(origin) {
        slices += 1;
        let slice = SliceImage::reslice(
            &preprocessed,
            origin,
            x_axis,
            y_axis,
            options.slice_half_size_pixels,
            0.0,
        );
        let (min, _) = slice.range();
        let found = detect_center(
            &slice,
            options.circle_detection,
            min + 1.0,
            geometry.radius_mm,
            options.min_circle_pixel_count,
        );
        if let Some(offset) = found {
            centerpoints.push(slice.to_world(offset));
        }
        origin += normal;
    }
    log::debug!(
        "marker at {guess}: {} centers in {slices} slices",
        centerpoints.len()
    );

    let position = centroid(&centerpoints);
    MarkerSegmentation {
        found: position.is_some(),
        position: position.unwrap_or(guess),
        centerpoints,
        preprocessed,
    }
}

fn guess_fit(guesses: [DVec3; 2]) -> LineFit {
    LineFit {
        line: Line3::through(guesses[0], guesses[1]),
        inliers: guesses.to_vec(),
    }
}

/// Result of segmenting one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSegmentation {
    /// The fitted axis, `None` when a required marker was not found.
    pub line: Option<Line3>,
    /// Per-marker detection results.
    pub markers: [MarkerSegmentation; 2],
    /// Points the axis was fitted through.
    pub centerpoints: Vec<DVec3>,
}

impl AxisSegmentation {
    /// Per-marker found flags.
    pub fn found(&self) -> [bool; 2] {
        [self.markers[0].found, self.markers[1].found]
    }
}

/// Direction from the second guess to the first, or +Z when they coincide.
pub fn axis_normal(guess1: DVec3, guess2: DVec3) -> DVec3 {
    let normal = guess1 - guess2;
    if normal.length() < COINCIDENT_MARKERS_MM {
        log::warn!("markers at {guess1} and {guess2} are coincident");
        return DVec3::Z;
    }
    normal.normalize()
}

/// Segments both markers of an axis and fits a line through their centers.
///
/// When a marker is missed and detection is not required, or when the fit
/// degenerates, the axis falls back to the line through the two guesses.
pub fn segment_axis(
    volume: &ImageVolume,
    guesses: [DVec3; 2],
    thresholds: [f64; 2],
    geometry: &MarkerGeometry,
    options: &SegmentationOptions,
) -> AxisSegmentation {
    let normal = axis_normal(guesses[0], guesses[1]);
    let first = segment_marker(volume, guesses[0], normal, thresholds[0], geometry, options);
    let second = segment_marker(volume, guesses[1], normal, thresholds[1], geometry, options);
    let all_found = first.found && second.found;

    if !all_found && options.require_marker_detection {
        return AxisSegmentation {
            line: None,
            markers: [first, second],
            centerpoints: Vec::new(),
        };
    }

    let fit = if all_found {
        let mut candidates = first.centerpoints.clone();
        candidates.extend_from_slice(&second.centerpoints);
        remove_outliers(
            &candidates,
            guesses[0],
            guesses[1],
            options.coarse_outlier_threshold_mm,
            options.outlier_threshold_mm,
        )
    } else {
        log::info!("marker not detected, using the clicked positions for the axis");
        guess_fit(guesses)
    };

    let fit = if fit.line.is_degenerate() {
        log::warn!("axis fit degenerated, using the clicked positions");
        guess_fit(guesses)
    } else {
        fit
    };

    AxisSegmentation {
        line: Some(fit.line),
        markers: [first, second],
        centerpoints: fit.inliers,
    }
}
