//! Small geometry helpers shared by the widgets and the calibration code.

use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum corner.
    pub min: DVec3,
    /// Maximum corner.
    pub max: DVec3,
}

impl Default for Bounds {
    /// The unit cube centered at the origin.
    fn default() -> Self {
        Self {
            min: DVec3::splat(-0.5),
            max: DVec3::splat(0.5),
        }
    }
}

impl Bounds {
    /// Creates bounds from two corners.
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Creates bounds from `[xmin, xmax, ymin, ymax, zmin, zmax]`.
    pub fn from_array(b: [f64; 6]) -> Self {
        Self {
            min: DVec3::new(b[0], b[2], b[4]),
            max: DVec3::new(b[1], b[3], b[5]),
        }
    }

    /// Returns `[xmin, xmax, ymin, ymax, zmin, zmax]`.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.min.x, self.max.x, self.min.y, self.max.y, self.min.z, self.max.z,
        ]
    }

    /// Smallest bounds containing every point, or `None` for an empty set.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = DVec3>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), |b, p| {
            Self::new(b.min.min(p), b.max.max(p))
        }))
    }

    /// Center of the bounds.
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths along x, y and z.
    pub fn extents(&self) -> DVec3 {
        self.max - self.min
    }

    /// Bounds scaled by `factor` about their center.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        let center = self.center();
        let half = self.extents() * 0.5 * factor;
        Self::new(center - half, center + half)
    }

    /// Returns whether the point lies inside (borders included).
    pub fn contains(&self, point: DVec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Rotation by `degrees` about `axis`, pivoting about `center`.
///
/// `axis` must be a unit vector.
pub fn rotation_about_point(center: DVec3, axis: DVec3, degrees: f64) -> DMat4 {
    DMat4::from_translation(center)
        * DMat4::from_axis_angle(axis, degrees.to_radians())
        * DMat4::from_translation(-center)
}

/// Uniform scale by `factor` about `center`.
pub fn scale_about_point(center: DVec3, factor: f64) -> DMat4 {
    DMat4::from_translation(center)
        * DMat4::from_scale(DVec3::splat(factor))
        * DMat4::from_translation(-center)
}

/// Distance from `point` to the line through `origin` along the unit vector `direction`.
pub fn distance_to_line(point: DVec3, origin: DVec3, direction: DVec3) -> f64 {
    (point - origin).cross(direction).length()
}

/// Flips the first two axes, converting between RAS and LPS.
pub fn ras_to_lps(v: DVec3) -> DVec3 {
    DVec3::new(-v.x, -v.y, v.z)
}

/// Mean of a set of points, or `None` for an empty set.
#[allow(clippy::cast_precision_loss)]
pub fn centroid(points: &[DVec3]) -> Option<DVec3> {
    if points.is_empty() {
        return None;
    }
    let sum: DVec3 = points.iter().copied().sum();
    Some(sum / points.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_array_order() {
        let b = Bounds::from_array([0.0, 10.0, 1.0, 11.0, 2.0, 12.0]);
        assert_eq!(b.min, DVec3::new(0.0, 1.0, 2.0));
        assert_eq!(b.max, DVec3::new(10.0, 11.0, 12.0));
        assert_eq!(b.to_array(), [0.0, 10.0, 1.0, 11.0, 2.0, 12.0]);
    }

    #[test]
    fn test_bounds_scaled_keeps_center() {
        let b = Bounds::from_array([0.0, 10.0, 0.0, 4.0, 0.0, 2.0]).scaled(0.5);
        assert_eq!(b.center(), DVec3::new(5.0, 2.0, 1.0));
        assert_eq!(b.extents(), DVec3::new(5.0, 2.0, 1.0));
    }

    #[test]
    fn test_bounds_from_points() {
        let b = Bounds::from_points([DVec3::new(1.0, -1.0, 0.0), DVec3::new(-2.0, 3.0, 1.0)])
            .unwrap();
        assert_eq!(b.min, DVec3::new(-2.0, -1.0, 0.0));
        assert_eq!(b.max, DVec3::new(1.0, 3.0, 1.0));
        assert!(Bounds::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_rotation_about_point_fixes_center() {
        let center = DVec3::new(1.0, 2.0, 3.0);
        let m = rotation_about_point(center, DVec3::Z, 90.0);
        assert!((m.transform_point3(center) - center).length() < 1e-12);

        let p = m.transform_point3(center + DVec3::X);
        assert!((p - (center + DVec3::Y)).length() < 1e-12);
    }

    #[test]
    fn test_distance_to_line() {
        let d = distance_to_line(DVec3::new(3.0, 4.0, 7.0), DVec3::ZERO, DVec3::Z);
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_ras_lps_is_involution() {
        let v = DVec3::new(1.0, -2.0, 3.0);
        assert_eq!(ras_to_lps(v), DVec3::new(-1.0, 2.0, 3.0));
        assert_eq!(ras_to_lps(ras_to_lps(v)), v);
    }
}
