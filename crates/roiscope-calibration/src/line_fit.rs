//! Robust 3D line fitting.
//!
//! Lines are fitted by total least squares: the direction is the dominant
//! right singular vector of the mean-centered point matrix, so lines with
//! any orientation are handled alike.

use glam::DVec3;
use nalgebra::DMatrix;
use roiscope_core::math::{centroid, distance_to_line};
use serde::{Deserialize, Serialize};

/// Points closer than this to the largest distance are dropped together.
const OUTLIER_EPSILON: f64 = 0.001;

/// A line through `point` along the unit vector `direction`.
///
/// A zero `direction` marks a line that could not be determined.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Line3 {
    /// A point on the line.
    pub point: DVec3,
    /// Unit direction, or zero.
    pub direction: DVec3,
}

impl Line3 {
    /// Creates a line, normalizing the direction.
    pub fn new(point: DVec3, direction: DVec3) -> Self {
        Self {
            point,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Line through two points.
    pub fn through(a: DVec3, b: DVec3) -> Self {
        Self::new(a, b - a)
    }

    /// Distance from a point to the line.
    pub fn distance(&self, p: DVec3) -> f64 {
        distance_to_line(p, self.point, self.direction)
    }

    /// Returns whether the direction is too short to define a line.
    pub fn is_degenerate(&self) -> bool {
        self.direction.length() < 0.001
    }
}

/// Total least squares line through a point set.
///
/// Returns `None` for fewer than two points or when all points coincide.
pub fn fit_line(points: &[DVec3]) -> Option<Line3> {
    if points.len() < 2 {
        return None;
    }
    let mean = centroid(points)?;
    let a = DMatrix::<f64>::from_fn(points.len(), 3, |r, c| (points[r] - mean)[c]);
    let svd = a.svd(false, true);
    let v_t = svd.v_t?;
    let dominant = svd.singular_values.imax();
    if svd.singular_values[dominant] <= f64::EPSILON {
        return None;
    }
    let row = v_t.row(dominant);
    Some(Line3::new(mean, DVec3::new(row[0], row[1], row[2])))
}

/// Outcome of [`remove_outliers`].
#[derive(Debug, Clone, PartialEq)]
pub struct LineFit {
    /// The fitted line; degenerate when too few points survived.
    pub line: Line3,
    /// Points the final line was fitted through.
    pub inliers: Vec<DVec3>,
}

/// Fits a line through `points`, iteratively discarding outliers.
///
/// Points farther than `coarse_threshold` from the line through the two
/// guesses are dropped first. The remaining points are refitted until
/// every one lies within `threshold` of the line; each round drops the
/// points at the largest distance.
pub fn remove_outliers(
    points: &[DVec3],
    guess1: DVec3,
    guess2: DVec3,
    coarse_threshold: f64,
    threshold: f64,
) -> LineFit {
    let guess_line = Line3::through(guess1, guess2);
    let mut kept: Vec<DVec3> = points
        .iter()
        .copied()
        .filter(|&p| guess_line.distance(p) <= coarse_threshold)
        .collect();
    log::debug!(
        "line fit: {} of {} candidates within {coarse_threshold} mm of the guess line",
        kept.len(),
        points.len()
    );

    loop {
        let Some(line) = fit_line(&kept) else {
            return LineFit {
                line: Line3::default(),
                inliers: kept,
            };
        };
        let max = kept
            .iter()
            .map(|&p| line.distance(p))
            .fold(0.0, f64::max);
        if max <= threshold {
            return LineFit {
                line,
                inliers: kept,
            };
        }
        kept.retain(|&p| line.distance(p) <= max - OUTLIER_EPSILON);
        log::trace!("line fit: dropped outliers at {max:.3} mm, {} left", kept.len());
    }
}
