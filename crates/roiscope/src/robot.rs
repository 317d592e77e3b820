//! The trans-rectal robot node: calibration markers, registration and targeting.

use glam::DVec3;
use roiscope_calibration::{
    CalibrationInput, CalibrationMarkerSet, CalibrationResult, ImageVolume, MarkerCalibrator,
    TargetSolver, TargetingParams, MARKER_COUNT,
};
use roiscope_core::{MarkerGeometry, Result, RobotGeometry, RoiscopeError, SegmentationOptions};
use serde::{Deserialize, Serialize};

/// Outcome of [`RobotNode::segment_register_markers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationReport {
    /// Whether a valid calibration was produced.
    pub success: bool,
    /// Human-readable summary for the user.
    pub details: String,
    /// Which markers were detected in the image.
    pub marker_found: [bool; MARKER_COUNT],
}

impl RegistrationReport {
    fn failure(details: impl Into<String>) -> Self {
        Self {
            success: false,
            details: details.into(),
            marker_found: [false; MARKER_COUNT],
        }
    }
}

/// Device state shared between the calibration and targeting steps.
///
/// Markers, the calibration result and the device geometry are persisted
/// as JSON; intermediate segmentation data is not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotNode {
    name: String,
    markers: CalibrationMarkerSet,
    #[serde(default)]
    calibration: CalibrationResult,
    #[serde(default)]
    frame_of_reference: String,
    #[serde(default)]
    registration_angle_degrees: f64,
    #[serde(default)]
    geometry: RobotGeometry,
    #[serde(default)]
    marker_geometry: MarkerGeometry,
    #[serde(skip)]
    calibrator: MarkerCalibrator,
}

impl RobotNode {
    /// Creates a node with no markers and no calibration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            markers: CalibrationMarkerSet::new(),
            calibration: CalibrationResult::default(),
            frame_of_reference: String::new(),
            registration_angle_degrees: 0.0,
            geometry: RobotGeometry::default(),
            marker_geometry: MarkerGeometry::default(),
            calibrator: MarkerCalibrator::new(),
        }
    }

    /// Sets the mechanical constants of the device.
    #[must_use]
    pub fn with_geometry(mut self, geometry: RobotGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Sets the size of the calibration markers used for segmentation.
    #[must_use]
    pub fn with_marker_geometry(mut self, marker_geometry: MarkerGeometry) -> Self {
        self.marker_geometry = marker_geometry;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> &RobotGeometry {
        &self.geometry
    }

    pub fn marker_geometry(&self) -> &MarkerGeometry {
        &self.marker_geometry
    }

    pub fn set_marker_geometry(&mut self, marker_geometry: MarkerGeometry) {
        self.marker_geometry = marker_geometry;
    }

    pub fn markers(&self) -> &CalibrationMarkerSet {
        &self.markers
    }

    /// Places a calibration marker.
    pub fn set_marker_position(&mut self, index: usize, position: DVec3) -> Result<()> {
        self.markers.set_position(index, position)
    }

    /// Removes a calibration marker.
    pub fn clear_marker(&mut self, index: usize) -> Result<()> {
        self.markers.clear(index)
    }

    /// Sets the segmentation threshold of a marker, in percent.
    pub fn set_marker_threshold(&mut self, index: usize, percent: f64) -> Result<()> {
        self.markers.set_threshold(index, percent)
    }

    pub fn frame_of_reference(&self) -> &str {
        &self.frame_of_reference
    }

    /// Sets the frame of reference UID of the calibration image.
    pub fn set_frame_of_reference(&mut self, uid: impl Into<String>) {
        self.frame_of_reference = uid.into();
    }

    pub fn registration_angle_degrees(&self) -> f64 {
        self.registration_angle_degrees
    }

    /// Sets the device rotation at the time the calibration image was taken.
    pub fn set_registration_angle_degrees(&mut self, degrees: f64) {
        self.registration_angle_degrees = degrees;
    }

    pub fn calibration(&self) -> &CalibrationResult {
        &self.calibration
    }

    /// Replaces the calibration, e.g. with one loaded from storage.
    pub fn set_calibration(&mut self, calibration: CalibrationResult) {
        self.calibration = calibration;
    }

    pub fn is_calibration_valid(&self) -> bool {
        self.calibration.valid
    }

    /// Intermediate data of the last segmentation.
    pub fn calibrator(&self) -> &MarkerCalibrator {
        &self.calibrator
    }

    /// Invalidates the calibration.
    pub fn reset_calibration_data(&mut self) {
        self.calibration.reset();
        self.calibrator.reset();
    }

    /// Segments the markers in `volume` and registers the device.
    ///
    /// With centerpoint adjustment enabled, successful calibration moves the
    /// markers to their detected positions. A failure resets the calibration.
    pub fn segment_register_markers(
        &mut self,
        volume: Option<&ImageVolume>,
        options: &SegmentationOptions,
    ) -> RegistrationReport {
        if let Some(index) = self.markers.first_undefined() {
            log::warn!("{}", RoiscopeError::MarkerUndefined(index));
            return RegistrationReport::failure("Not all calibration markers are defined");
        }
        let Some(volume) = volume else {
            return RegistrationReport::failure("Calibration volume is invalid");
        };

        self.calibrator.set_options(options.clone());
        self.calibrator.set_geometry(self.marker_geometry.clone());
        let input = CalibrationInput::new(self.markers)
            .with_registration_angle(self.registration_angle_degrees)
            .with_frame_of_reference(self.frame_of_reference.clone());

        match self.calibrator.calibrate_from_image(volume, &input) {
            Ok(output) => {
                self.calibration = output.result;
                if options.enable_centerpoint_adjustment {
                    self.markers.set_positions(output.marker_positions);
                }
                RegistrationReport {
                    success: true,
                    details: "Calibration is successfully completed.".to_string(),
                    marker_found: output.marker_found,
                }
            }
            Err(err) => {
                log::warn!("calibration of {} failed: {err}", self.name);
                let marker_found = self.calibrator.marker_found();
                self.calibration.reset();
                let mut details: String = marker_found
                    .into_iter()
                    .enumerate()
                    .filter(|&(_, found)| !found)
                    .map(|(i, _)| format!("Marker {} cannot be detected. ", i + 1))
                    .collect();
                details.push_str("Calibration failed.");
                RegistrationReport {
                    success: false,
                    details,
                    marker_found,
                }
            }
        }
    }

    /// Device settings for a target, using the current calibration.
    pub fn find_targeting_params(&self, target_ras: DVec3, overshoot_mm: f64) -> TargetingParams {
        TargetSolver::new(self.geometry.clone()).find_targeting_params(
            &self.calibration,
            target_ras,
            overshoot_mm,
        )
    }

    /// Serializes the persistent state to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restores a node from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DMat4, UVec3};

    fn flat_volume() -> ImageVolume {
        ImageVolume::from_fn(UVec3::splat(8), DMat4::IDENTITY, |_, _, _| 0.0).unwrap()
    }

    fn placed() -> RobotNode {
        let mut node = RobotNode::new("robot");
        let positions = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(20.0, 0.0, 0.0),
            DVec3::new(5.0, 5.0, 5.0),
            DVec3::new(5.0, 25.0, 5.0),
        ];
        for (i, p) in positions.into_iter().enumerate() {
            node.set_marker_position(i, p).unwrap();
        }
        node
    }

    #[test]
    fn test_undefined_markers() {
        let mut node = RobotNode::new("robot");
        node.set_marker_position(0, DVec3::ZERO).unwrap();
        let report = node.segment_register_markers(Some(&flat_volume()), &SegmentationOptions::default());
        assert!(!report.success);
        assert_eq!(report.details, "Not all calibration markers are defined");
    }

    #[test]
    fn test_missing_volume() {
        let mut node = placed();
        let report = node.segment_register_markers(None, &SegmentationOptions::default());
        assert!(!report.success);
        assert_eq!(report.details, "Calibration volume is invalid");
    }

    #[test]
    fn test_registration_without_adjustment() {
        let mut node = placed();
        node.set_frame_of_reference("1.2.3.4");
        node.set_registration_angle_degrees(-5.0);
        let options = SegmentationOptions::new().with_centerpoint_adjustment(false);
        let report = node.segment_register_markers(Some(&flat_volume()), &options);
        assert!(report.success, "{}", report.details);
        assert_eq!(report.details, "Calibration is successfully completed.");
        assert!(node.is_calibration_valid());
        assert_eq!(node.calibration().frame_of_reference, "1.2.3.4");
        assert_eq!(node.calibration().registration_angle_degrees, -5.0);
        assert_eq!(node.markers().positions()[1], DVec3::new(20.0, 0.0, 0.0));
    }

    #[test]
    fn test_reset_calibration_data() {
        let mut node = placed();
        let options = SegmentationOptions::new().with_centerpoint_adjustment(false);
        node.segment_register_markers(Some(&flat_volume()), &options);
        node.reset_calibration_data();
        let calibration = node.calibration();
        assert!(!calibration.valid);
        assert_eq!(calibration.axes_distance, -1.0);
        assert_eq!(calibration.v1, DVec3::ZERO);
        assert!(!node.find_targeting_params(DVec3::ONE, 0.0).valid);
    }

    #[test]
    fn test_json_roundtrip_keeps_calibration() {
        let mut node = placed();
        node.set_marker_threshold(2, 15.0).unwrap();
        node.set_marker_geometry(MarkerGeometry {
            dimensions_mm: DVec3::new(10.0, 4.0, 4.0),
            radius_mm: 2.0,
        });
        let options = SegmentationOptions::new().with_centerpoint_adjustment(false);
        node.segment_register_markers(Some(&flat_volume()), &options);
        let json = node.to_json().unwrap();
        let back = RobotNode::from_json(&json).unwrap();
        assert_eq!(back.name(), "robot");
        assert_eq!(back.markers(), node.markers());
        assert_eq!(back.marker_geometry().radius_mm, 2.0);
        assert_eq!(back.marker_geometry().dimensions_mm, DVec3::new(10.0, 4.0, 4.0));
        assert!(back.is_calibration_valid());
        assert!((back.calibration().axes_distance - node.calibration().axes_distance).abs() < 1e-12);
        assert!((back.calibration().i1 - node.calibration().i1).length() < 1e-12);
        assert_eq!(back.calibrator().state(), roiscope_calibration::CalibrationState::Unsegmented);
    }
}
