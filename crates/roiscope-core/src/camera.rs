//! Camera and view management.

use glam::{DMat4, DVec2, DVec3, DVec4};

use crate::math::Bounds;
use crate::renderer::SceneRenderer;

/// Camera projection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    /// Perspective projection.
    #[default]
    Perspective,
    /// Orthographic projection.
    Orthographic,
}

/// A 3D camera for viewing the scene.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space.
    pub position: DVec3,
    /// Point the camera is looking at.
    pub target: DVec3,
    /// Up vector.
    pub up: DVec3,
    /// Field of view in radians.
    pub fov: f64,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f64,
    /// Near clipping plane.
    pub near: f64,
    /// Far clipping plane.
    pub far: f64,
    /// Projection mode.
    pub projection_mode: ProjectionMode,
    /// Orthographic half height (used when `projection_mode` is Orthographic).
    pub ortho_scale: f64,
}

impl Camera {
    /// Creates a new camera with default settings.
    #[must_use]
    pub fn new(aspect_ratio: f64) -> Self {
        Self {
            position: DVec3::new(0.0, 0.0, 3.0),
            target: DVec3::ZERO,
            up: DVec3::Y,
            fov: std::f64::consts::FRAC_PI_4,
            aspect_ratio,
            near: 0.01,
            far: 1000.0,
            projection_mode: ProjectionMode::Perspective,
            ortho_scale: 1.0,
        }
    }

    /// Sets the aspect ratio.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f64) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Returns the projection matrix.
    ///
    /// Depth is mapped to `[0, 1]`.
    #[must_use]
    pub fn projection_matrix(&self) -> DMat4 {
        match self.projection_mode {
            ProjectionMode::Perspective => {
                DMat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let half_height = self.ortho_scale;
                let half_width = half_height * self.aspect_ratio;
                DMat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Returns the combined view-projection matrix.
    #[must_use]
    pub fn view_projection_matrix(&self) -> DMat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Returns the camera's forward direction.
    #[must_use]
    pub fn forward(&self) -> DVec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Returns the camera's right direction.
    #[must_use]
    pub fn right(&self) -> DVec3 {
        self.forward().cross(self.up).normalize_or_zero()
    }

    /// Unit vector from the target toward the camera.
    #[must_use]
    pub fn view_plane_normal(&self) -> DVec3 {
        -self.forward()
    }

    /// Orbits the camera around the target.
    pub fn orbit(&mut self, delta_x: f64, delta_y: f64) {
        let radius = (self.position - self.target).length();
        if radius == 0.0 {
            return;
        }
        let mut theta = (self.position.x - self.target.x).atan2(self.position.z - self.target.z);
        let mut phi = ((self.position.y - self.target.y) / radius).acos();

        theta -= delta_x;
        phi = (phi - delta_y).clamp(0.01, std::f64::consts::PI - 0.01);

        self.position = self.target
            + DVec3::new(
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
                radius * phi.sin() * theta.cos(),
            );
    }

    /// Resets the camera to look at the given bounding box.
    pub fn look_at_bounds(&mut self, bounds: &Bounds) {
        let center = bounds.center();
        let extents = bounds.extents();
        let size = extents.length().max(1e-6);

        self.target = center;
        self.position = center + DVec3::new(0.0, 0.0, size * 1.5);
        self.near = size * 0.001;
        self.far = size * 100.0;

        let half_height = extents.y.max(extents.x / self.aspect_ratio) * 0.6;
        self.ortho_scale = half_height.max(0.1);
    }

    /// Sets the projection mode.
    pub fn set_projection_mode(&mut self, mode: ProjectionMode) {
        self.projection_mode = mode;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}

/// A camera rendering into a viewport of a given pixel size.
#[derive(Debug, Clone)]
pub struct CameraRenderer {
    /// The viewing camera.
    pub camera: Camera,
    size: DVec2,
}

impl CameraRenderer {
    /// Creates a renderer with the given viewport size in pixels.
    pub fn new(camera: Camera, width: f64, height: f64) -> Self {
        let mut camera = camera;
        if height > 0.0 {
            camera.set_aspect_ratio(width / height);
        }
        Self {
            camera,
            size: DVec2::new(width, height),
        }
    }

    /// Resizes the viewport.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.size = DVec2::new(width, height);
        if height > 0.0 {
            self.camera.set_aspect_ratio(width / height);
        }
    }
}

impl SceneRenderer for CameraRenderer {
    fn viewport_size(&self) -> DVec2 {
        self.size
    }

    fn display_to_world(&self, display: DVec3) -> DVec3 {
        let ndc = DVec3::new(
            2.0 * display.x / self.size.x - 1.0,
            2.0 * display.y / self.size.y - 1.0,
            display.z,
        );
        let inverse = self.camera.view_projection_matrix().inverse();
        let world = inverse * DVec4::new(ndc.x, ndc.y, ndc.z, 1.0);
        if world.w == 0.0 {
            return world.truncate();
        }
        world.truncate() / world.w
    }

    fn world_to_display(&self, world: DVec3) -> DVec3 {
        let clip = self.camera.view_projection_matrix() * world.extend(1.0);
        let ndc = if clip.w == 0.0 {
            clip.truncate()
        } else {
            clip.truncate() / clip.w
        };
        DVec3::new(
            (ndc.x + 1.0) * 0.5 * self.size.x,
            (ndc.y + 1.0) * 0.5 * self.size.y,
            ndc.z,
        )
    }

    fn view_plane_normal(&self) -> Option<DVec3> {
        let normal = self.camera.view_plane_normal();
        (normal != DVec3::ZERO).then_some(normal)
    }
}
