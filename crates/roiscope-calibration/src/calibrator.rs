//! Fiducial calibration of the trans-rectal needle guide.
//!
//! Two pairs of cylindrical markers are segmented from a volume. Each pair
//! defines an axis of the device (probe and needle); the closest approach
//! of the two axes registers the device to the image.

use glam::DVec3;
use roiscope_core::{MarkerGeometry, Result, RoiscopeError, SegmentationOptions};
use serde::{Deserialize, Serialize};

use crate::markers::{CalibrationMarkerSet, AXIS_MARKERS, MARKER_COUNT};
use crate::probe::find_probe;
use crate::segment::{segment_axis, AxisSegmentation};
use crate::volume::ImageVolume;

/// Registration of the device axes in world (RAS) coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationResult {
    /// Whether all markers were found and the axes are not parallel.
    pub valid: bool,
    /// Shortest distance between the two axes, or -1 when not calibrated.
    pub axes_distance: f64,
    /// Unsigned angle between the axes.
    pub axes_angle_degrees: f64,
    /// Rotation of the device when the calibration image was taken.
    pub registration_angle_degrees: f64,
    /// Closest point on the probe axis.
    pub i1: DVec3,
    /// Closest point on the needle axis.
    pub i2: DVec3,
    /// Probe axis direction.
    pub v1: DVec3,
    /// Needle axis direction.
    pub v2: DVec3,
    /// Frame of reference UID of the calibration image.
    pub frame_of_reference: String,
}

impl Default for CalibrationResult {
    fn default() -> Self {
        Self {
            valid: false,
            axes_distance: -1.0,
            axes_angle_degrees: 0.0,
            registration_angle_degrees: 0.0,
            i1: DVec3::ZERO,
            i2: DVec3::ZERO,
            v1: DVec3::ZERO,
            v2: DVec3::ZERO,
            frame_of_reference: String::new(),
        }
    }
}

impl CalibrationResult {
    /// Clears the registration.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Lifecycle of a [`MarkerCalibrator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationState {
    /// No calibration has been attempted since the last reset.
    #[default]
    Unsegmented,
    /// Markers are being segmented.
    Segmenting,
    /// The last calibration succeeded.
    Registered,
    /// The last calibration failed.
    Failed,
}

/// Per-calibration request data.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationInput {
    /// Marker guesses and thresholds.
    pub markers: CalibrationMarkerSet,
    /// Device rotation at imaging time, stored verbatim in the result.
    pub registration_angle_degrees: f64,
    /// Frame of reference UID of the volume.
    pub frame_of_reference: String,
}

impl CalibrationInput {
    /// Creates an input with zero registration angle and no frame of reference.
    pub fn new(markers: CalibrationMarkerSet) -> Self {
        Self {
            markers,
            registration_angle_degrees: 0.0,
            frame_of_reference: String::new(),
        }
    }

    /// Sets the registration angle.
    #[must_use]
    pub fn with_registration_angle(mut self, degrees: f64) -> Self {
        self.registration_angle_degrees = degrees;
        self
    }

    /// Sets the frame of reference UID.
    #[must_use]
    pub fn with_frame_of_reference(mut self, uid: impl Into<String>) -> Self {
        self.frame_of_reference = uid.into();
        self
    }
}

/// Outcome of a successful calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationOutput {
    /// The registration.
    pub result: CalibrationResult,
    /// Which markers were detected in the image.
    pub marker_found: [bool; MARKER_COUNT],
    /// Refined marker positions; undetected markers keep their guess.
    pub marker_positions: [DVec3; MARKER_COUNT],
}

/// Segments the calibration markers and registers the device axes.
#[derive(Debug, Clone, Default)]
pub struct MarkerCalibrator {
    geometry: MarkerGeometry,
    options: SegmentationOptions,
    state: CalibrationState,
    result: CalibrationResult,
    axes: [Option<AxisSegmentation>; 2],
}

impl MarkerCalibrator {
    /// Creates a calibrator with default marker geometry and options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the segmentation options.
    #[must_use]
    pub fn with_options(mut self, options: SegmentationOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the marker geometry.
    #[must_use]
    pub fn with_geometry(mut self, geometry: MarkerGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn options(&self) -> &SegmentationOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: SegmentationOptions) {
        self.options = options;
    }

    pub fn geometry(&self) -> &MarkerGeometry {
        &self.geometry
    }

    pub fn set_geometry(&mut self, geometry: MarkerGeometry) {
        self.geometry = geometry;
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// The latest registration; invalid unless the state is `Registered`.
    pub fn result(&self) -> &CalibrationResult {
        &self.result
    }

    /// Forgets the registration and all intermediate data.
    pub fn reset(&mut self) {
        self.state = CalibrationState::Unsegmented;
        self.result.reset();
        self.axes = [None, None];
    }

    /// Detection flags of the last calibration attempt.
    pub fn marker_found(&self) -> [bool; MARKER_COUNT] {
        let mut found = [false; MARKER_COUNT];
        for (axis, markers) in self.axes.iter().zip(AXIS_MARKERS) {
            if let Some(axis) = axis {
                for (slot, flag) in markers.into_iter().zip(axis.found()) {
                    found[slot] = flag;
                }
            }
        }
        found
    }

    /// Preprocessed VOI of a marker from the last calibration attempt.
    pub fn preprocessed_voi(&self, marker: usize) -> Option<&ImageVolume> {
        let axis = self.axes.get(marker / 2)?.as_ref()?;
        Some(&axis.markers[marker % 2].preprocessed)
    }

    /// Points the given axis was fitted through.
    pub fn axis_centerpoints(&self, axis: usize) -> Result<&[DVec3]> {
        let segmentation = self
            .axes
            .get(axis)
            .ok_or(RoiscopeError::OutOfRange { index: axis, len: 2 })?;
        Ok(segmentation
            .as_ref()
            .map_or(&[][..], |s| s.centerpoints.as_slice()))
    }

    /// Segments all four markers and registers the two axes.
    ///
    /// Fails with [`RoiscopeError::MarkersNotFound`] when a required marker
    /// is missed and with [`RoiscopeError::DegenerateGeometry`] when the
    /// axes are parallel. A failed attempt leaves the result invalid.
    pub fn calibrate_from_image(
        &mut self,
        volume: &ImageVolume,
        input: &CalibrationInput,
    ) -> Result<CalibrationOutput> {
        self.state = CalibrationState::Segmenting;
        self.result.reset();
        log::info!("segmenting calibration markers");

        let positions = input.markers.positions();
        let thresholds = input.markers.thresholds();
        self.axes = AXIS_MARKERS.map(|[a, b]| {
            Some(segment_axis(
                volume,
                [positions[a], positions[b]],
                [thresholds[a], thresholds[b]],
                &self.geometry,
                &self.options,
            ))
        });

        let marker_found = self.marker_found();
        let mut marker_positions = positions;
        for (axis, markers) in self.axes.iter().zip(AXIS_MARKERS) {
            if let Some(axis) = axis {
                for (slot, marker) in markers.into_iter().zip(&axis.markers) {
                    marker_positions[slot] = marker.position;
                }
            }
        }

        let lines = match &self.axes {
            [Some(AxisSegmentation {
                line: Some(probe), ..
            }), Some(AxisSegmentation {
                line: Some(needle), ..
            })] => (*probe, *needle),
            _ => {
                let missing: Vec<usize> = (0..MARKER_COUNT).filter(|&i| !marker_found[i]).collect();
                log::warn!("calibration failed, markers not detected: {missing:?}");
                self.state = CalibrationState::Failed;
                return Err(RoiscopeError::MarkersNotFound(missing));
            }
        };

        let Some(approach) = find_probe(lines.0.point, lines.0.direction, lines.1.point, lines.1.direction)
        else {
            self.state = CalibrationState::Failed;
            return Err(RoiscopeError::DegenerateGeometry(
                "calibration axes are parallel".to_string(),
            ));
        };
        if approach.axes_angle_degrees < self.options.min_axes_angle_degrees {
            self.state = CalibrationState::Failed;
            return Err(RoiscopeError::DegenerateGeometry(format!(
                "calibration axes are {:.2} degrees apart, below {:.2}",
                approach.axes_angle_degrees, self.options.min_axes_angle_degrees
            )));
        }

        self.result = CalibrationResult {
            valid: true,
            axes_distance: approach.axes_distance,
            axes_angle_degrees: approach.axes_angle_degrees,
            registration_angle_degrees: input.registration_angle_degrees,
            i1: approach.i1,
            i2: approach.i2,
            v1: approach.v1,
            v2: approach.v2,
            frame_of_reference: input.frame_of_reference.clone(),
        };
        self.state = CalibrationState::Registered;
        log::info!(
            "calibration registered: axes {:.3} mm apart at {:.2} degrees",
            approach.axes_distance,
            approach.axes_angle_degrees
        );

        Ok(CalibrationOutput {
            result: self.result.clone(),
            marker_found,
            marker_positions,
        })
    }
}
