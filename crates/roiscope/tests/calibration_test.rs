//! End-to-end calibration on a synthetic volume.
//!
//! The volume holds four short cylindrical markers: two along the probe
//! axis (z, through the origin) and two along the needle axis (x, 10 mm
//! above it in y).

use glam::UVec3;
use roiscope::*;

const MARKER_HALF_LENGTH: f64 = 4.0;
const MARKER_RADIUS: f64 = 3.0;

fn true_markers() -> [(DVec3, DVec3); 4] {
    [
        (DVec3::new(0.0, 0.0, -15.0), DVec3::Z),
        (DVec3::new(0.0, 0.0, 15.0), DVec3::Z),
        (DVec3::new(-15.0, 10.0, 0.0), DVec3::X),
        (DVec3::new(15.0, 10.0, 0.0), DVec3::X),
    ]
}

fn phantom() -> ImageVolume {
    let ijk_to_ras = DMat4::from_translation(DVec3::splat(-30.0));
    let markers = true_markers();
    ImageVolume::from_fn(UVec3::splat(61), ijk_to_ras, |i, j, k| {
        let p = DVec3::new(f64::from(i), f64::from(j), f64::from(k)) - DVec3::splat(30.0);
        let inside = markers.iter().any(|&(center, axis)| {
            let d = p - center;
            let t = d.dot(axis);
            t.abs() <= MARKER_HALF_LENGTH && d.length_squared() - t * t <= MARKER_RADIUS * MARKER_RADIUS
        });
        if inside {
            1000.0
        } else {
            0.0
        }
    })
    .unwrap()
}

/// Clicked positions, 1 mm off the true centers.
fn guesses() -> [DVec3; 4] {
    [
        DVec3::new(1.0, 0.0, -15.0),
        DVec3::new(1.0, 0.0, 15.0),
        DVec3::new(-15.0, 11.0, 0.0),
        DVec3::new(15.0, 11.0, 0.0),
    ]
}

fn node_with(guesses: [DVec3; 4]) -> RobotNode {
    let mut node = RobotNode::new("TransRectalRobot");
    node.set_frame_of_reference("1.2.840.113619");
    for (i, p) in guesses.into_iter().enumerate() {
        node.set_marker_position(i, p).unwrap();
    }
    node
}

#[test]
fn test_calibrator_registers_axes() {
    let mut set = CalibrationMarkerSet::new();
    for (i, p) in guesses().into_iter().enumerate() {
        set.set_position(i, p).unwrap();
    }
    let mut calibrator = MarkerCalibrator::new();
    let output = calibrator
        .calibrate_from_image(&phantom(), &CalibrationInput::new(set))
        .unwrap();

    assert_eq!(calibrator.state(), CalibrationState::Registered);
    assert_eq!(output.marker_found, [true; 4]);
    for (found, (expected, _)) in output.marker_positions.iter().zip(true_markers()) {
        assert!((*found - expected).length() < 1e-6, "{found} != {expected}");
    }

    let result = &output.result;
    assert!(result.valid);
    assert!((result.axes_distance - 10.0).abs() < 1e-6);
    assert!((result.axes_angle_degrees - 90.0).abs() < 1e-6);
    assert!(result.i1.length() < 1e-6);
    assert!((result.i2 - DVec3::new(0.0, 10.0, 0.0)).length() < 1e-6);
    assert!(result.v1.cross(DVec3::Z).length() < 1e-6);
    assert!(result.v2.cross(DVec3::X).length() < 1e-6);

    // One center per millimetre of marker length on each axis.
    assert_eq!(calibrator.axis_centerpoints(0).unwrap().len(), 18);
    let voi = calibrator.preprocessed_voi(0).unwrap();
    assert!(voi.data().iter().any(|&v| v == 255.0));
}

#[test]
fn test_node_refines_markers_and_targets() {
    let mut node = node_with(guesses());
    let report = node.segment_register_markers(Some(&phantom()), &SegmentationOptions::default());
    assert!(report.success, "{}", report.details);
    assert_eq!(report.details, "Calibration is successfully completed.");
    assert_eq!(report.marker_found, [true; 4]);
    for (refined, (expected, _)) in node.markers().positions().iter().zip(true_markers()) {
        assert!((*refined - expected).length() < 1e-6);
    }

    let params = node.find_targeting_params(DVec3::new(5.0, 30.0, 20.0), 0.0);
    assert!(params.valid);
    assert_eq!(params.calibration_frame_of_reference, "1.2.840.113619");
    assert!((params.depth_cm * 10.0 - params.insertion_depth_mm).abs() < 1e-9);
}

#[test]
fn test_node_reports_undetected_marker() {
    let mut positions = guesses();
    positions[3] = DVec3::new(15.0, -20.0, 20.0);
    let mut node = node_with(positions);
    let report = node.segment_register_markers(Some(&phantom()), &SegmentationOptions::default());
    assert!(!report.success);
    assert!(!report.marker_found[3]);
    assert!(report.details.contains("Marker 4 cannot be detected. "));
    assert!(report.details.ends_with("Calibration failed."));
    assert!(!node.is_calibration_valid());
    assert_eq!(node.calibration().axes_distance, -1.0);
    assert_eq!(node.markers().positions()[3], positions[3]);
}

#[test]
fn test_guesses_are_used_without_adjustment() {
    let mut node = node_with(guesses());
    let options = SegmentationOptions::new().with_centerpoint_adjustment(false);
    let report = node.segment_register_markers(Some(&phantom()), &options);
    assert!(report.success);
    assert_eq!(node.markers().positions(), guesses());
    // The clicked probe axis is offset by 1 mm in x and the needle axis by 1 mm in y.
    assert!((node.calibration().axes_distance - 11.0).abs() < 1e-6);
}

#[test]
fn test_marker_radius_bounds_the_crop() {
    // A 0.36 mm crop around the clicked axis leaves one voxel per slice,
    // below the pixel count a cross-section needs.
    let thin = MarkerGeometry {
        radius_mm: 0.2,
        ..MarkerGeometry::default()
    };
    let mut node = node_with(guesses()).with_marker_geometry(thin);
    let report = node.segment_register_markers(Some(&phantom()), &SegmentationOptions::default());
    assert!(!report.success);
    assert_eq!(report.marker_found, [false; 4]);
    assert!(report.details.starts_with("Marker 1 cannot be detected. "));
    assert_eq!(node.calibrator().geometry().radius_mm, 0.2);

    node.set_marker_geometry(MarkerGeometry::default());
    let report = node.segment_register_markers(Some(&phantom()), &SegmentationOptions::default());
    assert!(report.success, "{}", report.details);
}
