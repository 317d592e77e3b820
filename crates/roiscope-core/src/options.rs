//! Configuration options for roiscope.
//!
//! Every option struct has a `Default` matching the behavior of the
//! interactive widget and the trans-rectal calibration device, and can be
//! round-tripped through JSON.

use glam::DVec3;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::Result;

/// JSON helpers shared by all option structs.
pub trait JsonOptions: Serialize + DeserializeOwned {
    /// Serializes the options to a pretty-printed JSON string.
    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses options from a JSON string.
    ///
    /// Missing fields fall back to their defaults.
    fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Options controlling the interactive ROI box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManipulatorOptions {
    /// Factor applied to the bounds (about their center) by `place_widget`.
    pub place_factor: f64,
    /// Nominal handle size in pixels.
    pub handle_size_pixels: f64,
    /// Multiplier applied to `handle_size_pixels` when sizing handles.
    pub handle_size_factor: f64,
    /// Scale factor applied when the pointer moves up while scaling.
    pub scale_up_factor: f64,
    /// Scale factor applied when the pointer moves down while scaling.
    pub scale_down_factor: f64,
    /// Flip face-plane normals so they point inwards.
    pub inside_out: bool,
    /// Draw the two diagonals of every face.
    pub outline_face_wires: bool,
    /// Draw the three lines joining opposite face centers.
    pub outline_cursor_wires: bool,
}

impl Default for ManipulatorOptions {
    fn default() -> Self {
        Self {
            place_factor: 1.0,
            handle_size_pixels: 5.0,
            handle_size_factor: 1.5,
            scale_up_factor: 1.03,
            scale_down_factor: 0.97,
            inside_out: false,
            outline_face_wires: false,
            outline_cursor_wires: true,
        }
    }
}

impl JsonOptions for ManipulatorOptions {}

impl ManipulatorOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the placement factor.
    #[must_use]
    pub fn with_place_factor(mut self, factor: f64) -> Self {
        self.place_factor = factor;
        self
    }

    /// Sets the handle size in pixels.
    #[must_use]
    pub fn with_handle_size_pixels(mut self, pixels: f64) -> Self {
        self.handle_size_pixels = pixels;
        self
    }

    /// Sets whether face normals point inwards.
    #[must_use]
    pub fn with_inside_out(mut self, inside_out: bool) -> Self {
        self.inside_out = inside_out;
        self
    }

    /// Sets which outline wires are generated.
    #[must_use]
    pub fn with_outline_wires(mut self, face_wires: bool, cursor_wires: bool) -> Self {
        self.outline_face_wires = face_wires;
        self.outline_cursor_wires = cursor_wires;
        self
    }
}

/// Algorithm used to find the marker cross-section center on a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CircleDetection {
    /// Intensity-weighted centroid of the pixels above threshold.
    #[default]
    Mean,
    /// Vote accumulation over candidate centers on a circle of the marker radius.
    Hough {
        /// Minimum number of votes the best center must collect.
        votes_needed: u32,
    },
}

/// Votes the best Hough center needs by default.
pub const DEFAULT_HOUGH_VOTES: u32 = 18;

impl CircleDetection {
    /// Hough detection with the default vote count.
    pub fn hough() -> Self {
        CircleDetection::Hough {
            votes_needed: DEFAULT_HOUGH_VOTES,
        }
    }
}

/// Options controlling marker segmentation and line fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationOptions {
    /// Refine the clicked marker positions from the image.
    pub enable_centerpoint_adjustment: bool,
    /// Fail the calibration when a marker cannot be detected.
    ///
    /// When disabled, an undetected marker falls back to its initial guess.
    pub require_marker_detection: bool,
    /// Per-slice center detection algorithm.
    pub circle_detection: CircleDetection,
    /// Voxels farther than `radius * max_radius_tolerance` from the guess line are ignored.
    pub max_radius_tolerance: f64,
    /// Minimum number of bright pixels for the mean detector.
    pub min_circle_pixel_count: usize,
    /// Half size (in 1mm pixels) of the resliced images.
    pub slice_half_size_pixels: usize,
    /// Candidates farther than this from the guess line are dropped before fitting.
    pub coarse_outlier_threshold_mm: f64,
    /// Fitting stops once every candidate is within this distance of the line.
    pub outlier_threshold_mm: f64,
    /// Calibration is rejected when the two axes are closer to parallel than this.
    ///
    /// Zero only rejects the numerically singular case.
    pub min_axes_angle_degrees: f64,
}

impl Default for SegmentationOptions {
    fn default() -> Self {
        Self {
            enable_centerpoint_adjustment: true,
            require_marker_detection: true,
            circle_detection: CircleDetection::Mean,
            max_radius_tolerance: 1.8,
            min_circle_pixel_count: 5,
            slice_half_size_pixels: 16,
            coarse_outlier_threshold_mm: 4.0,
            outlier_threshold_mm: 0.5,
            min_axes_angle_degrees: 0.0,
        }
    }
}

impl JsonOptions for SegmentationOptions {}

impl SegmentationOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables automatic centerpoint adjustment.
    #[must_use]
    pub fn with_centerpoint_adjustment(mut self, enable: bool) -> Self {
        self.enable_centerpoint_adjustment = enable;
        self
    }

    /// Sets whether every marker must be detected.
    #[must_use]
    pub fn with_required_detection(mut self, require: bool) -> Self {
        self.require_marker_detection = require;
        self
    }

    /// Sets the circle detection algorithm.
    #[must_use]
    pub fn with_circle_detection(mut self, detection: CircleDetection) -> Self {
        self.circle_detection = detection;
        self
    }

    /// Sets the minimum accepted angle between the two axes.
    #[must_use]
    pub fn with_min_axes_angle_degrees(mut self, degrees: f64) -> Self {
        self.min_axes_angle_degrees = degrees;
        self
    }
}

/// Physical description of the calibration markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerGeometry {
    /// Bounding dimensions of a marker in mm.
    pub dimensions_mm: DVec3,
    /// Radius of the cylindrical marker in mm.
    pub radius_mm: f64,
}

impl Default for MarkerGeometry {
    fn default() -> Self {
        Self {
            dimensions_mm: DVec3::new(8.0, 5.0, 5.0),
            radius_mm: 3.5,
        }
    }
}

impl JsonOptions for MarkerGeometry {}

/// Default segmentation threshold of a marker, in percent of the intensity range.
pub const DEFAULT_MARKER_THRESHOLD_PERCENT: f64 = 9.0;

/// Mechanical constants of the trans-rectal needle guide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotGeometry {
    /// Offset between the probe axis and the needle hinge in mm.
    pub hinge_offset_mm: f64,
    /// Length of the needle arm in mm.
    pub arm_length_mm: f64,
    /// Length of the needle guide in mm.
    pub needle_guide_mm: f64,
    /// Needle angle the device was built for, in degrees.
    pub nominal_needle_angle_degrees: f64,
    /// Smallest reachable (compensated) needle angle.
    pub min_reach_degrees: f64,
    /// Largest reachable (compensated) needle angle.
    pub max_reach_degrees: f64,
}

impl Default for RobotGeometry {
    fn default() -> Self {
        Self {
            hinge_offset_mm: 14.5,
            arm_length_mm: 29.16,
            needle_guide_mm: 4.0,
            nominal_needle_angle_degrees: 37.0,
            min_reach_degrees: 17.5,
            max_reach_degrees: 37.0 + 1.8,
        }
    }
}

impl JsonOptions for RobotGeometry {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manipulator_defaults() {
        let options = ManipulatorOptions::default();
        assert_eq!(options.scale_up_factor, 1.03);
        assert_eq!(options.scale_down_factor, 0.97);
        assert!(options.outline_cursor_wires);
        assert!(!options.outline_face_wires);
    }

    #[test]
    fn test_segmentation_json_roundtrip() {
        let options = SegmentationOptions::new()
            .with_centerpoint_adjustment(false)
            .with_circle_detection(CircleDetection::Hough { votes_needed: 12 });
        let json = options.to_json().unwrap();
        let back = SegmentationOptions::from_json(&json).unwrap();
        assert_eq!(back, options);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let geometry = RobotGeometry::from_json(r#"{ "hinge_offset_mm": 15.0 }"#).unwrap();
        assert_eq!(geometry.hinge_offset_mm, 15.0);
        assert_eq!(geometry.arm_length_mm, 29.16);
        assert!((geometry.max_reach_degrees - 38.8).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(MarkerGeometry::from_json("not json").is_err());
    }
}
