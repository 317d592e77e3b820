//! The 15-point box geometry.
//!
//! Points 0-7 are the corners, 8-13 the face midpoints
//! (-x, +x, -y, +y, -z, +z) and 14 the center:
//!
//! ```text
//! 0: (xmin,ymin,zmin)  1: (xmax,ymin,zmin)  2: (xmax,ymax,zmin)  3: (xmin,ymax,zmin)
//! 4: (xmin,ymin,zmax)  5: (xmax,ymin,zmax)  6: (xmax,ymax,zmax)  7: (xmin,ymax,zmax)
//! ```

use glam::{DMat4, DVec3};
use roiscope_core::Bounds;

/// Number of points describing a box.
pub const NUM_POINTS: usize = 15;
/// Number of corners.
pub const NUM_CORNERS: usize = 8;
/// Index of the first face midpoint.
pub const FIRST_MIDPOINT: usize = 8;
/// Index of the center point.
pub const CENTER: usize = 14;

/// Corners of each face quad, with consistent winding.
pub const FACE_CORNERS: [[usize; 4]; 6] = [
    [3, 0, 4, 7],
    [1, 2, 6, 5],
    [0, 1, 5, 4],
    [2, 3, 7, 6],
    [0, 3, 2, 1],
    [4, 5, 6, 7],
];

/// The 12 edges of the box.
pub const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Both diagonals of every face, in face order.
pub const FACE_WIRES: [(usize, usize); 12] = [
    (0, 7),
    (3, 4),
    (1, 6),
    (2, 5),
    (1, 4),
    (0, 5),
    (3, 6),
    (2, 7),
    (0, 2),
    (1, 3),
    (4, 6),
    (5, 7),
];

/// Lines joining opposite face midpoints.
pub const CURSOR_WIRES: [(usize, usize); 3] = [(8, 9), (10, 11), (12, 13)];

// Diagonal corner pairs averaged into points 8..=14.
const DERIVED: [(usize, usize); 7] = [(0, 7), (1, 6), (0, 5), (2, 7), (1, 3), (5, 7), (0, 6)];

/// An oriented box described by its corners and derived handle points.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxGeometry {
    points: [DVec3; NUM_POINTS],
    normals: [DVec3; 6],
}

impl Default for BoxGeometry {
    fn default() -> Self {
        Self::from_bounds(&Bounds::default())
    }
}

impl BoxGeometry {
    /// Creates an axis-aligned box from bounds.
    pub fn from_bounds(bounds: &Bounds) -> Self {
        let mut geometry = Self {
            points: [DVec3::ZERO; NUM_POINTS],
            normals: [DVec3::ZERO; 6],
        };
        geometry.set_corners(corners_of(bounds));
        geometry
    }

    /// All 15 points.
    pub fn points(&self) -> &[DVec3; NUM_POINTS] {
        &self.points
    }

    /// A single point.
    pub fn point(&self, index: usize) -> DVec3 {
        self.points[index]
    }

    /// The 8 corners.
    pub fn corners(&self) -> [DVec3; NUM_CORNERS] {
        let mut corners = [DVec3::ZERO; NUM_CORNERS];
        corners.copy_from_slice(&self.points[..NUM_CORNERS]);
        corners
    }

    /// Replaces the corners and re-derives handles and normals.
    pub fn set_corners(&mut self, corners: [DVec3; NUM_CORNERS]) {
        self.points[..NUM_CORNERS].copy_from_slice(&corners);
        self.position_handles();
        self.compute_normals();
    }

    pub(crate) fn points_mut(&mut self) -> &mut [DVec3; NUM_POINTS] {
        &mut self.points
    }

    /// Recomputes face midpoints and the center from the corners.
    pub fn position_handles(&mut self) {
        for (offset, &(a, b)) in DERIVED.iter().enumerate() {
            self.points[FIRST_MIDPOINT + offset] = (self.points[a] + self.points[b]) * 0.5;
        }
    }

    /// Recomputes the six outward face normals.
    ///
    /// A collapsed axis yields zero normals for both of its faces.
    pub fn compute_normals(&mut self) {
        let p0 = self.points[0];
        for (axis, adjacent) in [1, 3, 4].into_iter().enumerate() {
            let n = (p0 - self.points[adjacent]).normalize_or_zero();
            self.normals[2 * axis] = n;
            self.normals[2 * axis + 1] = -n;
        }
    }

    /// Face normals as of the last `compute_normals`.
    pub fn normals(&self) -> &[DVec3; 6] {
        &self.normals
    }

    /// Box center (point 14).
    pub fn center(&self) -> DVec3 {
        self.points[CENTER]
    }

    /// Edge lengths along the box's own x, y and z axes.
    pub fn extents(&self) -> DVec3 {
        let p0 = self.points[0];
        DVec3::new(
            p0.distance(self.points[1]),
            p0.distance(self.points[3]),
            p0.distance(self.points[4]),
        )
    }

    /// World-aligned bounds of the corners.
    pub fn bounds(&self) -> Bounds {
        let c = self.corners();
        let mut bounds = Bounds::new(c[0], c[0]);
        for p in &c[1..] {
            bounds = Bounds::new(bounds.min.min(*p), bounds.max.max(*p));
        }
        bounds
    }

    /// Moves every corner by `delta`.
    pub fn translate_corners(&mut self, delta: DVec3) {
        for p in &mut self.points[..NUM_CORNERS] {
            *p += delta;
        }
        self.position_handles();
    }

    /// Applies an affine matrix to every corner.
    pub fn transform_corners(&mut self, matrix: &DMat4) {
        for p in &mut self.points[..NUM_CORNERS] {
            *p = matrix.transform_point3(*p);
        }
        self.position_handles();
    }
}

/// Corners of an axis-aligned box in the canonical order.
pub fn corners_of(bounds: &Bounds) -> [DVec3; NUM_CORNERS] {
    let (lo, hi) = (bounds.min, bounds.max);
    [
        DVec3::new(lo.x, lo.y, lo.z),
        DVec3::new(hi.x, lo.y, lo.z),
        DVec3::new(hi.x, hi.y, lo.z),
        DVec3::new(lo.x, hi.y, lo.z),
        DVec3::new(lo.x, lo.y, hi.z),
        DVec3::new(hi.x, lo.y, hi.z),
        DVec3::new(hi.x, hi.y, hi.z),
        DVec3::new(lo.x, hi.y, hi.z),
    ]
}
