//! Closest approach between the probe and needle axes.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Below this value of `1 - dot(v1, v2)^2` the axes count as parallel.
pub const PARALLEL_TOLERANCE: f64 = 1e-9;

/// The registration of two skew lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosestApproach {
    /// Closest point on the probe axis.
    pub i1: DVec3,
    /// Closest point on the needle axis.
    pub i2: DVec3,
    /// Probe axis direction, pointing from the needle axis toward the probe tip.
    pub v1: DVec3,
    /// Needle axis direction, pointing toward the hinge.
    pub v2: DVec3,
    /// Distance between `i1` and `i2`.
    pub axes_distance: f64,
    /// Unsigned angle between the axes in degrees.
    pub axes_angle_degrees: f64,
}

/// Closest approach between the line `(p1, v1)` and the line `(p2, v2)`.
///
/// The directions are normalized and their signs fixed: `v1` ends up with
/// a positive component along `p2 - p1`, `v2` with a negative one. Returns
/// `None` when a direction is zero or the lines are parallel.
pub fn find_probe(p1: DVec3, v1: DVec3, p2: DVec3, v2: DVec3) -> Option<ClosestApproach> {
    let mut v1 = v1.try_normalize()?;
    let mut v2 = v2.try_normalize()?;
    let p12 = p2 - p1;
    if p12.dot(v1) <= 0.0 {
        v1 = -v1;
    }
    if p12.dot(v2) >= 0.0 {
        v2 = -v2;
    }

    let d = v1.dot(v2);
    let denom = 1.0 - d * d;
    if denom <= PARALLEL_TOLERANCE {
        log::warn!("calibration axes are parallel (dot = {d})");
        return None;
    }
    let t1 = (p12.dot(v1) - p12.dot(v2) * d) / denom;
    let t2 = -(p12.dot(v2) - p12.dot(v1) * d) / denom;
    let i1 = p1 + t1 * v1;
    let i2 = p2 + t2 * v2;

    Some(ClosestApproach {
        i1,
        i2,
        v1,
        v2,
        axes_distance: i1.distance(i2),
        axes_angle_degrees: d.abs().min(1.0).acos().to_degrees(),
    })
}
