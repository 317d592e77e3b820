//! Handle picking.

use glam::DVec3;

use crate::renderer::SceneRenderer;

/// A spherical handle glyph as seen by a picker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleGlyph {
    /// World position of the glyph center.
    pub center: DVec3,
    /// World radius of the glyph.
    pub radius: f64,
    /// Hidden glyphs are never picked.
    pub visible: bool,
}

impl HandleGlyph {
    /// Creates a visible glyph.
    pub fn new(center: DVec3, radius: f64) -> Self {
        Self {
            center,
            radius,
            visible: true,
        }
    }
}

/// Result of a pick operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickResult {
    /// Index of the picked glyph.
    pub handle: usize,
    /// The world position of the pick point.
    pub world_position: DVec3,
    /// Display depth of the pick point.
    pub depth: f64,
}

/// Picks a handle glyph under a display position.
pub trait HandlePicker {
    /// Returns the glyph hit at display position `(x, y)`, if any.
    fn pick(
        &self,
        renderer: &dyn SceneRenderer,
        x: f64,
        y: f64,
        glyphs: &[HandleGlyph],
    ) -> Option<PickResult>;
}

/// Picks glyphs by comparing projected centers against their on-screen radius.
///
/// When several glyphs overlap the one closest to the viewer wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenSpacePicker {
    /// Extra slack added to every glyph radius, in pixels.
    pub tolerance_pixels: f64,
}

impl Default for ScreenSpacePicker {
    fn default() -> Self {
        Self {
            tolerance_pixels: 1.0,
        }
    }
}

impl ScreenSpacePicker {
    /// Creates a picker with the given pixel tolerance.
    pub fn new(tolerance_pixels: f64) -> Self {
        Self { tolerance_pixels }
    }
}

impl HandlePicker for ScreenSpacePicker {
    fn pick(
        &self,
        renderer: &dyn SceneRenderer,
        x: f64,
        y: f64,
        glyphs: &[HandleGlyph],
    ) -> Option<PickResult> {
        let mut best: Option<PickResult> = None;
        for (handle, glyph) in glyphs.iter().enumerate() {
            if !glyph.visible || glyph.radius <= 0.0 {
                continue;
            }
            let display = renderer.world_to_display(glyph.center);
            let world_per_pixel = renderer.pixels_to_world(glyph.center, 1.0);
            if world_per_pixel <= 0.0 {
                continue;
            }
            let radius_pixels = glyph.radius / world_per_pixel + self.tolerance_pixels;
            let dx = display.x - x;
            let dy = display.y - y;
            if dx * dx + dy * dy > radius_pixels * radius_pixels {
                continue;
            }
            if best.map_or(true, |b| display.z < b.depth) {
                best = Some(PickResult {
                    handle,
                    world_position: glyph.center,
                    depth: display.z,
                });
            }
        }
        best
    }
}
