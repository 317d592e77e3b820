//! The box manipulator as seen on an oblique slice.
//!
//! The box is drawn as the segments where its faces cut the slice plane;
//! face handles sit at the segment midpoints. All box math is delegated to
//! the wrapped [`BoxManipulator`].

use glam::{DMat4, DVec2, DVec3};
use roiscope_core::{
    Bounds, CuttingPlane, HandleGlyph, HandlePicker, ManipulatorOptions, SceneRenderer,
};

use super::geometry::NUM_CORNERS;
use super::interaction::{Face, Handle, Highlight, InteractionState};
use super::representation::BoxManipulator;

/// Intersection points closer than this are merged.
pub const INTERSECTION_MERGE_DISTANCE: f64 = 0.001;

/// A face/plane intersection segment.
pub type Segment = (DVec3, DVec3);

/// Intersects one face quad with a plane.
///
/// Returns a segment when the face crosses the plane at two distinct
/// points; touching at a single vertex or lying in the plane yields `None`.
pub fn intersection_line(
    corners: &[DVec3; NUM_CORNERS],
    face: Face,
    plane: &CuttingPlane,
) -> Option<Segment> {
    let quad = face.corners();
    let mut found: Vec<DVec3> = Vec::with_capacity(2);
    for k in 0..4 {
        let a = corners[quad[k]];
        let b = corners[quad[(k + 1) % 4]];
        let da = plane.signed_distance(a);
        let db = plane.signed_distance(b);
        if da == db {
            continue;
        }
        let t = da / (da - db);
        if !(0.0..=1.0).contains(&t) {
            continue;
        }
        let p = a + (b - a) * t;
        if found
            .iter()
            .all(|q| q.distance(p) > INTERSECTION_MERGE_DISTANCE)
        {
            found.push(p);
        }
    }
    match found.as_slice() {
        [a, b] => Some((*a, *b)),
        _ => None,
    }
}

/// A box manipulator projected onto a cutting plane.
#[derive(Debug, Clone)]
pub struct BoxManipulator2D {
    base: BoxManipulator,
    plane: CuttingPlane,
    intersections: [Option<Segment>; 6],
    handle_positions: [DVec3; Handle::COUNT],
    handle_visible: [bool; Handle::COUNT],
    handle_radius: f64,
}

impl BoxManipulator2D {
    /// Creates a 2D manipulator on the given plane.
    pub fn new(plane: CuttingPlane) -> Self {
        Self::with_options(ManipulatorOptions::default(), plane)
    }

    /// Creates a 2D manipulator with options on the given plane.
    pub fn with_options(options: ManipulatorOptions, plane: CuttingPlane) -> Self {
        let mut manipulator = Self {
            base: BoxManipulator::with_options(options),
            plane,
            intersections: [None; 6],
            handle_positions: [DVec3::ZERO; Handle::COUNT],
            handle_visible: [false; Handle::COUNT],
            handle_radius: 0.0,
        };
        manipulator.size_handles();
        manipulator.position_handles();
        manipulator
    }

    /// The wrapped 3D manipulator.
    pub fn manipulator(&self) -> &BoxManipulator {
        &self.base
    }

    /// The cutting plane.
    pub fn plane(&self) -> &CuttingPlane {
        &self.plane
    }

    /// Moves the cutting plane and re-derives the handles.
    pub fn set_plane(&mut self, plane: CuttingPlane) {
        self.plane = plane;
        self.size_handles();
        self.position_handles();
    }

    /// Places the box on an axis-aligned bounding box.
    pub fn place_widget(&mut self, bounds: &Bounds) {
        self.base.place_widget(bounds);
        self.position_handles();
    }

    /// Positions the box by transforming the placement bounds.
    pub fn set_transform(&mut self, matrix: &DMat4) {
        self.base.set_transform(matrix);
        self.position_handles();
    }

    /// Recomputes the slice segments and handle positions.
    pub fn position_handles(&mut self) {
        self.base.position_handles();
        let corners = self.base.geometry().corners();
        for face in Face::ALL {
            let i = face.index();
            self.intersections[i] = intersection_line(&corners, face, &self.plane);
            match self.intersections[i] {
                Some((a, b)) => {
                    self.handle_positions[i] = (a + b) * 0.5;
                    self.handle_visible[i] = true;
                }
                None => self.handle_visible[i] = false,
            }
        }
        let center = Handle::Center.index();
        self.handle_positions[center] = self.plane.project(self.base.center());
        self.handle_visible[center] = self.intersections.iter().any(Option::is_some);
    }

    /// Face/plane segments in face order.
    pub fn intersections(&self) -> &[Option<Segment>; 6] {
        &self.intersections
    }

    /// Returns whether a handle is shown on the slice.
    pub fn is_handle_visible(&self, handle: Handle) -> bool {
        self.handle_visible[handle.index()]
    }

    /// World position of a handle on the slice.
    pub fn handle_position(&self, handle: Handle) -> DVec3 {
        self.handle_positions[handle.index()]
    }

    /// Handle glyphs; hidden handles have zero radius.
    pub fn handles(&self) -> [HandleGlyph; Handle::COUNT] {
        std::array::from_fn(|i| {
            let visible = self.handle_visible[i] && self.base.handles_visible();
            HandleGlyph {
                center: self.handle_positions[i],
                radius: if visible { self.handle_radius } else { 0.0 },
                visible,
            }
        })
    }

    /// World length of `pixels` slice pixels.
    pub fn compute_handle_radius_in_world(&self, pixels: f64) -> f64 {
        let a = self.plane.xy_to_world_point(DVec2::ZERO);
        let b = self.plane.xy_to_world_point(DVec2::new(pixels, 0.0));
        a.distance(b)
    }

    /// Sizes the handles to the configured on-screen radius.
    pub fn size_handles(&mut self) {
        let options = self.base.options();
        let pixels = options.handle_size_pixels * options.handle_size_factor;
        self.handle_radius = self.compute_handle_radius_in_world(pixels);
    }

    /// World radius of the handle glyphs.
    pub fn handle_radius(&self) -> f64 {
        self.handle_radius
    }

    /// The current interaction state.
    pub fn interaction_state(&self) -> InteractionState {
        self.base.interaction_state()
    }

    /// Sets the interaction state.
    pub fn set_interaction_state(&mut self, state: InteractionState) {
        self.base.set_interaction_state(state);
    }

    /// Highlight state for the display layer.
    pub fn highlight(&self) -> Highlight {
        self.base.highlight()
    }

    /// Picks among the slice handles at a display position.
    pub fn compute_interaction_state(
        &mut self,
        renderer: &dyn SceneRenderer,
        picker: &dyn HandlePicker,
        x: f64,
        y: f64,
    ) -> InteractionState {
        let glyphs = self.handles();
        self.base.pick_state(renderer, picker, x, y, &glyphs)
    }

    /// Starts a gesture at a display position.
    pub fn start_widget_interaction(
        &mut self,
        renderer: &dyn SceneRenderer,
        picker: &dyn HandlePicker,
        position: DVec2,
    ) -> InteractionState {
        let glyphs = self.handles();
        self.base.begin_gesture(position);
        self.base
            .pick_state(renderer, picker, position.x, position.y, &glyphs)
    }

    /// Continues a gesture; slice positions map to world through the plane.
    pub fn widget_interaction(&mut self, renderer: &dyn SceneRenderer, position: DVec2) {
        let normal = self.plane.normal();
        if normal == DVec3::ZERO {
            return;
        }
        let last = self.base.last_event_position();
        let prev = self.plane.xy_to_world_point(last);
        let curr = self.plane.xy_to_world_point(position);
        self.base
            .apply_motion(prev, curr, position, normal, renderer.viewport_size());
        self.position_handles();
    }

    /// Ends the gesture.
    pub fn end_widget_interaction(&mut self) {
        self.base.end_widget_interaction();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roiscope_core::{ScreenSpacePicker, SliceRenderer};

    fn axial(z: f64) -> CuttingPlane {
        CuttingPlane::new(DMat4::from_translation(DVec3::new(0.0, 0.0, z)))
    }

    fn manipulator(z: f64) -> BoxManipulator2D {
        let options = ManipulatorOptions::new().with_handle_size_pixels(1.0);
        let mut m = BoxManipulator2D::with_options(options, axial(z));
        m.place_widget(&Bounds::from_array([0.0, 10.0, 0.0, 10.0, 0.0, 10.0]));
        m
    }

    #[test]
    fn test_mid_slice_shows_four_side_faces() {
        let m = manipulator(5.0);
        let visible: Vec<bool> = m.intersections().iter().map(Option::is_some).collect();
        assert_eq!(visible, vec![true, true, true, true, false, false]);
        assert_eq!(
            m.handle_position(Handle::Face(Face::MinusX)),
            DVec3::new(0.0, 5.0, 5.0)
        );
        assert!(m.is_handle_visible(Handle::Center));
        assert_eq!(m.handle_position(Handle::Center), DVec3::splat(5.0));
        assert!(m.handles()[4].radius == 0.0);
    }

    #[test]
    fn test_slice_outside_box_hides_everything() {
        let m = manipulator(20.0);
        assert!(m.intersections().iter().all(Option::is_none));
        assert!(m.handles().iter().all(|h| !h.visible && h.radius == 0.0));
    }

    #[test]
    fn test_corner_on_plane_is_merged() {
        let corners = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(1.0, 0.0, 1.0),
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(0.0, 1.0, 1.0),
        ];
        // Cuts the -x face along its 0-7 diagonal; each corner is crossed twice.
        let plane = CuttingPlane::from_origin_normal(
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, -1.0),
        );
        let segment = intersection_line(&corners, Face::MinusX, &plane).unwrap();
        let ends = [segment.0, segment.1];
        assert!(ends.iter().any(|p| p.distance(DVec3::ZERO) < 1e-9));
        assert!(ends
            .iter()
            .any(|p| p.distance(DVec3::new(0.0, 1.0, 1.0)) < 1e-9));
    }

    #[test]
    fn test_single_vertex_contact_is_empty() {
        let corners = super::super::geometry::corners_of(&Bounds::from_array([
            0.0, 1.0, 0.0, 1.0, 0.0, 1.0,
        ]));
        let plane = CuttingPlane::from_origin_normal(DVec3::ZERO, DVec3::new(1.0, 1.0, 1.0));
        assert!(intersection_line(&corners, Face::MinusX, &plane).is_none());
    }

    #[test]
    fn test_handle_radius_in_world() {
        let mut plane = axial(0.0);
        plane.set_xy_to_world(DMat4::from_scale(DVec3::splat(0.5)));
        let m = BoxManipulator2D::new(plane);
        assert!((m.compute_handle_radius_in_world(10.0) - 5.0).abs() < 1e-12);
        assert!((m.handle_radius() - 3.75).abs() < 1e-12);
    }

    #[test]
    fn test_drag_face_on_slice() {
        let mut m = manipulator(5.0);
        let view = SliceRenderer::new(*m.plane(), 100.0, 100.0);
        let picker = ScreenSpacePicker::new(0.0);

        let state = m.start_widget_interaction(&view, &picker, DVec2::new(10.0, 5.0));
        assert_eq!(state, InteractionState::MoveFace(Face::PlusX));

        m.widget_interaction(&view, DVec2::new(13.0, 9.0));
        assert_eq!(m.manipulator().extents(), DVec3::new(13.0, 10.0, 10.0));
        assert_eq!(
            m.handle_position(Handle::Face(Face::PlusX)),
            DVec3::new(13.0, 5.0, 5.0)
        );
        m.end_widget_interaction();
        assert_eq!(m.interaction_state(), InteractionState::Outside);
    }

    #[test]
    fn test_translate_on_slice_moves_in_plane() {
        let mut m = manipulator(5.0);
        let view = SliceRenderer::new(*m.plane(), 100.0, 100.0);
        let picker = ScreenSpacePicker::new(0.0);
        m.start_widget_interaction(&view, &picker, DVec2::new(5.0, 5.0));
        assert_eq!(m.interaction_state(), InteractionState::Translating);
        m.widget_interaction(&view, DVec2::new(7.0, 4.0));
        assert_eq!(m.manipulator().center(), DVec3::new(7.0, 4.0, 5.0));
    }
}
