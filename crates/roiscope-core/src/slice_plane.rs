//! Cutting planes for reformatted (oblique) slice views.
//!
//! A cutting plane is described by its xy-to-world matrix: the x and y
//! columns span the plane, the translation column is the plane origin.

use glam::{DMat4, DVec2, DVec3, DVec4};

use crate::renderer::SceneRenderer;

/// An oriented plane with an in-plane coordinate frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CuttingPlane {
    xy_to_world: DMat4,
}

impl Default for CuttingPlane {
    /// The z = 0 plane with identity in-plane coordinates.
    fn default() -> Self {
        Self {
            xy_to_world: DMat4::IDENTITY,
        }
    }
}

impl CuttingPlane {
    /// Creates a plane from its xy-to-world matrix.
    pub fn new(xy_to_world: DMat4) -> Self {
        Self { xy_to_world }
    }

    /// Creates a plane through `origin` with the given normal.
    ///
    /// The in-plane axes are chosen orthonormal to the normal.
    pub fn from_origin_normal(origin: DVec3, normal: DVec3) -> Self {
        let normal = normal.try_normalize().unwrap_or_else(|| {
            log::warn!("cutting plane normal is degenerate, using +Z");
            DVec3::Z
        });
        let (x, y) = in_plane_axes(normal);
        Self {
            xy_to_world: DMat4::from_cols(
                x.extend(0.0),
                y.extend(0.0),
                normal.extend(0.0),
                origin.extend(1.0),
            ),
        }
    }

    /// Returns the xy-to-world matrix.
    pub fn xy_to_world(&self) -> DMat4 {
        self.xy_to_world
    }

    /// Replaces the xy-to-world matrix.
    pub fn set_xy_to_world(&mut self, xy_to_world: DMat4) {
        self.xy_to_world = xy_to_world;
    }

    /// Returns the plane origin.
    pub fn origin(&self) -> DVec3 {
        self.xy_to_world.w_axis.truncate()
    }

    /// Returns the unit plane normal.
    pub fn normal(&self) -> DVec3 {
        let x = self.xy_to_world.x_axis.truncate();
        let y = self.xy_to_world.y_axis.truncate();
        x.cross(y)
            .try_normalize()
            .unwrap_or_else(|| self.xy_to_world.z_axis.truncate().normalize_or_zero())
    }

    /// Returns the signed distance from a point to the plane.
    pub fn signed_distance(&self, point: DVec3) -> f64 {
        (point - self.origin()).dot(self.normal())
    }

    /// Projects a point onto the plane.
    pub fn project(&self, point: DVec3) -> DVec3 {
        point - self.signed_distance(point) * self.normal()
    }

    /// Maps in-plane coordinates to world.
    pub fn xy_to_world_point(&self, xy: DVec2) -> DVec3 {
        self.xy_to_world.transform_point3(xy.extend(0.0))
    }

    /// Maps a world point to in-plane coordinates (z is the out-of-plane offset).
    pub fn world_to_xy_point(&self, world: DVec3) -> DVec3 {
        self.xy_to_world.inverse().transform_point3(world)
    }
}

/// Two unit vectors spanning the plane orthogonal to `normal`.
pub fn in_plane_axes(normal: DVec3) -> (DVec3, DVec3) {
    let helper = if normal.x.abs() > normal.y.abs() {
        DVec3::Y
    } else {
        DVec3::X
    };
    let x = normal.cross(helper).normalize_or_zero();
    let y = normal.cross(x).normalize_or_zero();
    (x, y)
}

/// A slice view whose display coordinates are the plane's xy coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceRenderer {
    /// The plane shown by the view.
    pub plane: CuttingPlane,
    size: DVec2,
}

impl SliceRenderer {
    /// Creates a slice view of the given pixel size.
    pub fn new(plane: CuttingPlane, width: f64, height: f64) -> Self {
        Self {
            plane,
            size: DVec2::new(width, height),
        }
    }
}

impl SceneRenderer for SliceRenderer {
    fn viewport_size(&self) -> DVec2 {
        self.size
    }

    fn display_to_world(&self, display: DVec3) -> DVec3 {
        (self.plane.xy_to_world() * DVec4::new(display.x, display.y, display.z, 1.0)).truncate()
    }

    fn world_to_display(&self, world: DVec3) -> DVec3 {
        self.plane.world_to_xy_point(world)
    }

    fn view_plane_normal(&self) -> Option<DVec3> {
        let normal = self.plane.normal();
        (normal != DVec3::ZERO).then_some(normal)
    }
}
