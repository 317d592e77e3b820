//! The scene collaborator used by interactive widgets.

use glam::{DVec2, DVec3};

/// Display/world conversions provided by the host renderer.
///
/// Display coordinates have their origin at the bottom-left of the viewport
/// and carry a depth component in `[0, 1]`.
pub trait SceneRenderer {
    /// Viewport size in pixels.
    fn viewport_size(&self) -> DVec2;

    /// Returns whether a display position falls inside the viewport.
    fn is_in_viewport(&self, x: f64, y: f64) -> bool {
        let size = self.viewport_size();
        x >= 0.0 && y >= 0.0 && x < size.x && y < size.y
    }

    /// Converts a display position (with depth) to world coordinates.
    fn display_to_world(&self, display: DVec3) -> DVec3;

    /// Converts a world position to display coordinates (with depth).
    fn world_to_display(&self, world: DVec3) -> DVec3;

    /// Unit normal of the view plane, pointing toward the viewer.
    ///
    /// `None` when there is no active camera; interaction is then a no-op.
    fn view_plane_normal(&self) -> Option<DVec3>;

    /// World-space length of `pixels` display pixels at `world` position.
    fn pixels_to_world(&self, world: DVec3, pixels: f64) -> f64 {
        let display = self.world_to_display(world);
        let a = self.display_to_world(display);
        let b = self.display_to_world(display + DVec3::new(pixels, 0.0, 0.0));
        (b - a).length()
    }
}
