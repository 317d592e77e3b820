//! Needle targeting for the calibrated trans-rectal device.
//!
//! The device rotates about the probe axis and inserts the needle through a
//! hinge whose position depends on that rotation. Computation happens in LPS
//! coordinates; inputs and outputs are RAS.

use glam::{DMat3, DVec3};
use roiscope_core::math::ras_to_lps;
use roiscope_core::RobotGeometry;
use serde::{Deserialize, Serialize};

use crate::calibrator::CalibrationResult;

/// Device settings that reach a target.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingParams {
    /// False when no valid calibration was available.
    pub valid: bool,
    /// Rotation of the device about the probe axis.
    pub axis_rotation_degrees: f64,
    /// Needle angle to the probe axis, compensated for the calibrated axes angle.
    pub needle_angle_degrees: f64,
    /// Insertion depth in centimetres.
    pub depth_cm: f64,
    /// Insertion depth in millimetres.
    pub insertion_depth_mm: f64,
    /// Hinge position after rotation, in RAS.
    pub hinge_position_ras: DVec3,
    /// The needle angle falls outside the mechanical range of the device.
    pub is_outside_reach: bool,
    /// Frame of reference UID of the calibration used.
    pub calibration_frame_of_reference: String,
}

/// Cross-product matrix of `v`.
fn skew(v: DVec3) -> DMat3 {
    DMat3::from_cols(
        DVec3::new(0.0, v.z, -v.y),
        DVec3::new(-v.z, 0.0, v.x),
        DVec3::new(v.y, -v.x, 0.0),
    )
}

/// Solves targeting parameters from a calibration.
#[derive(Debug, Clone, Default)]
pub struct TargetSolver {
    geometry: RobotGeometry,
}

impl TargetSolver {
    pub fn new(geometry: RobotGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &RobotGeometry {
        &self.geometry
    }

    /// Rotates `point` by `-rotation_rad` about `axis`.
    ///
    /// The pivot lies on the axis, `hinge_offset / tan(alpha)` before `origin`.
    pub fn rotate_point(
        &self,
        point: DVec3,
        rotation_rad: f64,
        alpha_rad: f64,
        axis: DVec3,
        origin: DVec3,
    ) -> DVec3 {
        let k = skew(axis);
        let angle = -rotation_rad;
        let rotation = DMat3::IDENTITY + k * angle.sin() + k * k * (1.0 - angle.cos());
        let pivot = origin - self.geometry.hinge_offset_mm / alpha_rad.tan() * axis;
        rotation * (point - pivot) + pivot
    }

    /// Rotation, needle angle and depth that bring the needle to `target_ras`.
    ///
    /// `overshoot_mm` extends the insertion past the target (negative values
    /// stop short of it). Unreachable targets still get a solution, flagged
    /// with `is_outside_reach`.
    pub fn find_targeting_params(
        &self,
        calibration: &CalibrationResult,
        target_ras: DVec3,
        overshoot_mm: f64,
    ) -> TargetingParams {
        if !calibration.valid {
            log::warn!("targeting requested without a valid calibration");
            return TargetingParams::default();
        }
        let g = &self.geometry;

        let target = ras_to_lps(target_ras);
        let i1 = ras_to_lps(calibration.i1);
        // The probe direction is flipped before conversion.
        let v1 = ras_to_lps(-calibration.v1);
        let v2 = ras_to_lps(calibration.v2);

        let alpha_degrees = calibration.axes_angle_degrees;
        let alpha = alpha_degrees.to_radians();

        let hinge_measured = i1 - g.hinge_offset_mm / alpha.sin() * v2;
        let hinge_zero = self.rotate_point(
            hinge_measured,
            calibration.registration_angle_degrees.to_radians(),
            alpha,
            v1,
            i1,
        );

        let v2_zero = (i1 - hinge_zero).normalize_or_zero();
        let n1 = v1.cross(v2_zero).normalize_or_zero();
        let n2 = v1.cross(n1).normalize_or_zero();
        let to_target = target - i1;
        let x = -n2.dot(to_target);
        let y = -n1.dot(to_target);
        let rotation = y.atan2(x);

        let hinge = self.rotate_point(hinge_zero, rotation, alpha, v1, i1);
        let needle = (target - hinge).normalize_or_zero();
        let needle_angle = needle.dot(v1).clamp(-1.0, 1.0).acos();
        let needle_angle_degrees =
            needle_angle.to_degrees() - (alpha_degrees - g.nominal_needle_angle_degrees);
        let is_outside_reach = needle_angle_degrees < g.min_reach_degrees
            || needle_angle_degrees > g.max_reach_degrees;
        if is_outside_reach {
            log::info!("target {target_ras} is outside reach at {needle_angle_degrees:.1} degrees");
        }

        let needle_length = g.arm_length_mm + g.needle_guide_mm + g.hinge_offset_mm / alpha.sin();
        let slide = needle_length - g.hinge_offset_mm / needle_angle.sin();
        let insertion_depth_mm = hinge.distance(target) + slide + overshoot_mm;

        TargetingParams {
            valid: true,
            axis_rotation_degrees: -rotation.to_degrees(),
            needle_angle_degrees,
            depth_cm: insertion_depth_mm / 10.0,
            insertion_depth_mm,
            hinge_position_ras: ras_to_lps(hinge),
            is_outside_reach,
            calibration_frame_of_reference: calibration.frame_of_reference.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Probe along +S, needle axis at 37 degrees in the coronal plane.
    fn calibration() -> CalibrationResult {
        let alpha = 37f64.to_radians();
        CalibrationResult {
            valid: true,
            axes_distance: 0.0,
            axes_angle_degrees: 37.0,
            registration_angle_degrees: 0.0,
            i1: DVec3::ZERO,
            i2: DVec3::ZERO,
            v1: DVec3::Z,
            v2: DVec3::new(alpha.sin(), 0.0, -alpha.cos()),
            frame_of_reference: "1.2.840".to_string(),
        }
    }

    #[test]
    fn test_invalid_calibration() {
        let solver = TargetSolver::default();
        let params = solver.find_targeting_params(&CalibrationResult::default(), DVec3::ONE, 0.0);
        assert!(!params.valid);
        assert!(params.calibration_frame_of_reference.is_empty());
    }

    #[test]
    fn test_rotate_point_keeps_axis_points() {
        let solver = TargetSolver::default();
        let on_axis = DVec3::new(0.0, 0.0, 7.0);
        let rotated = solver.rotate_point(on_axis, 1.0, 0.6, DVec3::Z, DVec3::ZERO);
        assert!((rotated - on_axis).length() < 1e-12);
    }

    #[test]
    fn test_rotate_point_quarter_turn() {
        let solver = TargetSolver::default();
        let pivot = DVec3::new(0.0, 0.0, -RobotGeometry::default().hinge_offset_mm);
        // alpha = 45 degrees puts the pivot hinge_offset before the origin.
        let p = pivot + DVec3::X;
        let rotated = solver.rotate_point(p, std::f64::consts::FRAC_PI_2, 45f64.to_radians(), DVec3::Z, DVec3::ZERO);
        assert!((rotated - (pivot - DVec3::Y)).length() < 1e-9, "{rotated}");
    }

    #[test]
    fn test_target_in_needle_plane() {
        let solver = TargetSolver::default();
        let calibration = calibration();
        let alpha = 37f64.to_radians();
        let hinge_ras = -14.5 / alpha.sin() * calibration.v2;
        // 40 mm down the needle from the hinge, past the probe axis.
        let target = hinge_ras + 40.0 * calibration.v2;
        let params = solver.find_targeting_params(&calibration, target, 0.0);
        assert!(params.valid);
        assert_eq!(params.calibration_frame_of_reference, "1.2.840");
        assert!(params.axis_rotation_degrees.abs() < 1e-9, "{}", params.axis_rotation_degrees);
        assert!((params.hinge_position_ras - hinge_ras).length() < 1e-9);
        assert!((params.needle_angle_degrees - 37.0).abs() < 1e-9);
        assert!(!params.is_outside_reach);
        // No slide compensation at the nominal angle.
        assert!((params.insertion_depth_mm - (40.0 + 29.16 + 4.0)).abs() < 1e-9);
        assert!((params.depth_cm * 10.0 - params.insertion_depth_mm).abs() < 1e-12);
    }

    #[test]
    fn test_overshoot_adds_to_depth() {
        let solver = TargetSolver::default();
        let target = DVec3::new(20.0, 0.0, 30.0);
        let base = solver.find_targeting_params(&calibration(), target, 0.0);
        let deeper = solver.find_targeting_params(&calibration(), target, 5.0);
        assert!((deeper.insertion_depth_mm - base.insertion_depth_mm - 5.0).abs() < 1e-9);
        assert_eq!(deeper.axis_rotation_degrees, base.axis_rotation_degrees);
    }

    #[test]
    fn test_target_along_probe_is_out_of_reach() {
        let solver = TargetSolver::default();
        let params = solver.find_targeting_params(&calibration(), DVec3::new(0.0, 0.0, 200.0), 0.0);
        assert!(params.valid);
        assert!(params.is_outside_reach);
    }

    proptest! {
        #[test]
        fn prop_hinge_stays_on_circle(rotation in -3.0..3.0f64) {
            let solver = TargetSolver::default();
            let c = calibration();
            let alpha = 37f64.to_radians();
            let v1 = ras_to_lps(-c.v1);
            let hinge = ras_to_lps(-14.5 / alpha.sin() * c.v2);
            let rotated = solver.rotate_point(hinge, rotation, alpha, v1, DVec3::ZERO);
            let pivot = -14.5 / alpha.tan() * v1;
            prop_assert!(((rotated - pivot).length() - (hinge - pivot).length()).abs() < 1e-9);
            prop_assert!(((rotated - pivot).dot(v1)).abs() < 1e-9);
        }
    }
}
