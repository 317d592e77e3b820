//! Decomposed affine transforms.

use glam::{DMat4, DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};

/// A transformation represented as separate components.
///
/// Used to present a box pose as translation, rotation and per-axis scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation component.
    pub translation: DVec3,
    /// Rotation component as a quaternion.
    pub rotation: DQuat,
    /// Scale component.
    pub scale: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: DVec3::ZERO,
            rotation: DQuat::IDENTITY,
            scale: DVec3::ONE,
        }
    }
}

impl Transform {
    /// Creates a new identity transform.
    #[must_use]
    pub fn identity() -> Self {
        Self::default()
    }

    /// Creates a transform from a translation.
    #[must_use]
    pub fn from_translation(translation: DVec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Creates a transform from a rotation.
    #[must_use]
    pub fn from_rotation(rotation: DQuat) -> Self {
        Self {
            rotation,
            ..Default::default()
        }
    }

    /// Creates a transform from a scale.
    #[must_use]
    pub fn from_scale(scale: DVec3) -> Self {
        Self {
            scale,
            ..Default::default()
        }
    }

    /// Creates a transform from a matrix.
    ///
    /// This decomposition may not be exact for matrices with shear.
    #[must_use]
    pub fn from_matrix(matrix: DMat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Converts this transform to a matrix (scale, then rotate, then translate).
    #[must_use]
    pub fn to_matrix(&self) -> DMat4 {
        DMat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Applies the transform to a point.
    #[must_use]
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.rotation * (point * self.scale) + self.translation
    }

    /// Returns the rotation as XYZ Euler angles in degrees.
    #[must_use]
    pub fn euler_angles_degrees(&self) -> DVec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        DVec3::new(x, y, z) * (180.0 / std::f64::consts::PI)
    }

    /// Sets the rotation from XYZ Euler angles in degrees.
    pub fn set_euler_angles_degrees(&mut self, degrees: DVec3) {
        let r = degrees * (std::f64::consts::PI / 180.0);
        self.rotation = DQuat::from_euler(EulerRot::XYZ, r.x, r.y, r.z);
    }

    /// Translates the transform.
    pub fn translate(&mut self, delta: DVec3) {
        self.translation += delta;
    }

    /// Rotates the transform.
    pub fn rotate(&mut self, delta: DQuat) {
        self.rotation = delta * self.rotation;
    }

    /// Scales the transform.
    pub fn scale_by(&mut self, factor: DVec3) {
        self.scale *= factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_matrix_roundtrip() {
        let mut t = Transform::from_translation(DVec3::new(1.0, 2.0, 3.0));
        t.set_euler_angles_degrees(DVec3::new(0.0, 30.0, 0.0));
        t.scale_by(DVec3::new(2.0, 1.0, 0.5));
        let back = Transform::from_matrix(t.to_matrix());
        assert!((back.translation - t.translation).length() < 1e-9);
        assert!((back.scale - t.scale).length() < 1e-9);
        assert!(back.rotation.angle_between(t.rotation) < 1e-6);
    }

    #[test]
    fn test_transform_point_matches_matrix() {
        let mut t = Transform::from_scale(DVec3::new(2.0, 3.0, 4.0));
        t.rotate(DQuat::from_rotation_z(0.7));
        t.translate(DVec3::new(-1.0, 0.0, 5.0));
        let p = DVec3::new(0.3, -0.4, 1.2);
        let a = t.transform_point(p);
        let b = t.to_matrix().transform_point3(p);
        assert!((a - b).length() < 1e-12);
    }

    #[test]
    fn test_euler_angles_degrees() {
        let mut t = Transform::from_rotation(DQuat::IDENTITY);
        t.set_euler_angles_degrees(DVec3::new(0.0, 45.0, 0.0));
        assert!((t.euler_angles_degrees().y - 45.0).abs() < 1e-9);
    }
}
