//! The 3D box manipulator.

use glam::{DMat3, DMat4, DVec2, DVec3};
use roiscope_core::math::{rotation_about_point, scale_about_point};
use roiscope_core::{
    Bounds, HandleGlyph, HandlePicker, ManipulatorOptions, SceneRenderer, Transform,
};

use super::geometry::{corners_of, BoxGeometry, CURSOR_WIRES, FACE_WIRES, NUM_POINTS};
use super::interaction::{Face, Handle, Highlight, InteractionState};

/// A face plane of the box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacePlane {
    /// The face midpoint.
    pub origin: DVec3,
    /// Unit normal (outward unless the manipulator is inside-out).
    pub normal: DVec3,
}

/// Resolves the direction a face slides along.
///
/// `own` is the face's normal, `a` and `b` two normals spanning the face.
/// When the box has collapsed along some axes the missing direction is
/// rebuilt from the normals that remain, starting from `seed` (the face's
/// nominal world axis).
pub fn slide_direction(own: DVec3, a: DVec3, b: DVec3, seed: DVec3) -> DVec3 {
    if own.dot(own) != 0.0 {
        return own;
    }
    let da = a.dot(a);
    let db = b.dot(b);
    if da != 0.0 && db != 0.0 {
        a.cross(b)
    } else if da != 0.0 {
        a.cross(seed).cross(a)
    } else if db != 0.0 {
        b.cross(seed).cross(b)
    } else {
        seed
    }
}

/// An interactive oriented box with seven handles.
///
/// The manipulator owns the box geometry and turns pointer gestures into
/// face moves, translations, rotations and uniform scaling. None of its
/// operations fail: degenerate input leaves the box unchanged or collapsed,
/// never invalid.
#[derive(Debug, Clone)]
pub struct BoxManipulator {
    geometry: BoxGeometry,
    options: ManipulatorOptions,
    initial_bounds: Bounds,
    initial_length: f64,
    state: InteractionState,
    current_handle: Option<Handle>,
    last_pick_position: Option<DVec3>,
    start_event_position: DVec2,
    last_event_position: DVec2,
    world_to_local: DMat4,
    handle_radius: f64,
    handles_visible: bool,
}

impl Default for BoxManipulator {
    fn default() -> Self {
        Self::new()
    }
}

impl BoxManipulator {
    /// Creates a manipulator around the unit cube centered at the origin.
    pub fn new() -> Self {
        Self::with_options(ManipulatorOptions::default())
    }

    /// Creates a manipulator with the given options.
    pub fn with_options(options: ManipulatorOptions) -> Self {
        let mut manipulator = Self {
            geometry: BoxGeometry::default(),
            options,
            initial_bounds: Bounds::default(),
            initial_length: 0.0,
            state: InteractionState::Outside,
            current_handle: None,
            last_pick_position: None,
            start_event_position: DVec2::ZERO,
            last_event_position: DVec2::ZERO,
            world_to_local: DMat4::IDENTITY,
            handle_radius: 0.0,
            handles_visible: true,
        };
        manipulator.place_widget(&Bounds::default());
        manipulator
    }

    /// Returns the options.
    pub fn options(&self) -> &ManipulatorOptions {
        &self.options
    }

    /// Replaces the options.
    pub fn set_options(&mut self, options: ManipulatorOptions) {
        self.options = options;
    }

    /// Places the box on an axis-aligned bounding box.
    ///
    /// The bounds are scaled about their center by the placement factor and
    /// become the reference frame of [`Self::get_transform`].
    pub fn place_widget(&mut self, bounds: &Bounds) {
        let bounds = if self.options.place_factor == 1.0 {
            *bounds
        } else {
            bounds.scaled(self.options.place_factor)
        };
        self.geometry.set_corners(corners_of(&bounds));
        self.initial_bounds = bounds;
        self.initial_length = bounds.extents().length();
        self.size_handles(None);
        log::debug!("placed ROI box on {:?}", bounds.to_array());
    }

    /// Recomputes face midpoints and the center from the corners.
    pub fn position_handles(&mut self) {
        self.geometry.position_handles();
    }

    /// Recomputes the face normals from the corners.
    pub fn compute_normals(&mut self) {
        self.geometry.compute_normals();
    }

    /// The box geometry.
    pub fn geometry(&self) -> &BoxGeometry {
        &self.geometry
    }

    /// All 15 box points.
    pub fn points(&self) -> &[DVec3; NUM_POINTS] {
        self.geometry.points()
    }

    /// The box center.
    pub fn center(&self) -> DVec3 {
        self.geometry.center()
    }

    /// Edge lengths along the box's own axes.
    pub fn extents(&self) -> DVec3 {
        self.geometry.extents()
    }

    /// World-aligned bounds of the box.
    pub fn bounds(&self) -> Bounds {
        self.geometry.bounds()
    }

    /// Bounds the box was last placed on.
    pub fn initial_bounds(&self) -> Bounds {
        self.initial_bounds
    }

    /// Diagonal length of the placement bounds.
    pub fn initial_length(&self) -> f64 {
        self.initial_length
    }

    /// The six face planes.
    pub fn planes(&mut self) -> [FacePlane; 6] {
        self.compute_normals();
        let factor = if self.options.inside_out { -1.0 } else { 1.0 };
        let normals = *self.geometry.normals();
        std::array::from_fn(|i| FacePlane {
            origin: self.geometry.point(8 + i),
            normal: normals[i] * factor,
        })
    }

    /// Point index pairs of the outline wires.
    pub fn outline_segments(&self) -> Vec<(usize, usize)> {
        let mut segments = Vec::new();
        if self.options.outline_face_wires {
            segments.extend_from_slice(&FACE_WIRES);
        }
        if self.options.outline_cursor_wires {
            segments.extend_from_slice(&CURSOR_WIRES);
        }
        segments
    }

    /// Handle glyphs in handle order.
    pub fn handles(&self) -> [HandleGlyph; Handle::COUNT] {
        std::array::from_fn(|i| {
            let center = self.geometry.point(8 + i);
            HandleGlyph {
                center,
                radius: if self.handles_visible {
                    self.handle_radius
                } else {
                    0.0
                },
                visible: self.handles_visible,
            }
        })
    }

    /// Shows all handles.
    pub fn handles_on(&mut self) {
        self.handles_visible = true;
    }

    /// Hides all handles.
    pub fn handles_off(&mut self) {
        self.handles_visible = false;
    }

    /// Returns whether handles are shown.
    pub fn handles_visible(&self) -> bool {
        self.handles_visible
    }

    /// World radius of the handle glyphs.
    pub fn handle_radius(&self) -> f64 {
        self.handle_radius
    }

    /// Sizes the handles to a fixed on-screen radius at the box center.
    ///
    /// Without a renderer the pixel size is taken as hundredths of the
    /// placement diagonal.
    pub fn size_handles(&mut self, renderer: Option<&dyn SceneRenderer>) {
        let pixels = self.options.handle_size_pixels * self.options.handle_size_factor;
        self.handle_radius = match renderer {
            Some(renderer) => renderer.pixels_to_world(self.center(), pixels),
            None => pixels * self.initial_length / 100.0,
        };
    }

    /// The current interaction state.
    pub fn interaction_state(&self) -> InteractionState {
        self.state
    }

    /// Sets the interaction state.
    pub fn set_interaction_state(&mut self, state: InteractionState) {
        if self.state != state {
            log::debug!("ROI interaction state {:?} -> {:?}", self.state, state);
        }
        self.state = state;
    }

    /// Sets the interaction state from its numeric value (clamped).
    pub fn set_interaction_state_index(&mut self, index: i32) {
        self.set_interaction_state(InteractionState::from_index(index));
    }

    /// The handle hit by the last pick.
    pub fn current_handle(&self) -> Option<Handle> {
        self.current_handle
    }

    /// Highlight state for the display layer.
    pub fn highlight(&self) -> Highlight {
        Highlight::for_state(self.state, self.current_handle)
    }

    /// Matrix applied to drag points before they move the box.
    pub fn world_to_local(&self) -> DMat4 {
        self.world_to_local
    }

    /// Sets the matrix applied to drag points before they move the box.
    pub fn set_world_to_local(&mut self, matrix: DMat4) {
        self.world_to_local = matrix;
    }

    /// Display position where the current gesture started.
    pub fn start_event_position(&self) -> DVec2 {
        self.start_event_position
    }

    /// Display position of the previous event.
    pub fn last_event_position(&self) -> DVec2 {
        self.last_event_position
    }

    /// Picks among the handles at a display position.
    ///
    /// A face handle selects the matching face move, the center handle
    /// selects translation, anything else is `Outside`.
    pub fn compute_interaction_state(
        &mut self,
        renderer: &dyn SceneRenderer,
        picker: &dyn HandlePicker,
        x: f64,
        y: f64,
    ) -> InteractionState {
        let glyphs = self.handles();
        self.pick_state(renderer, picker, x, y, &glyphs)
    }

    pub(crate) fn pick_state(
        &mut self,
        renderer: &dyn SceneRenderer,
        picker: &dyn HandlePicker,
        x: f64,
        y: f64,
        glyphs: &[HandleGlyph],
    ) -> InteractionState {
        self.current_handle = None;
        if !renderer.is_in_viewport(x, y) {
            self.set_interaction_state(InteractionState::Outside);
            return self.state;
        }
        let hit = picker
            .pick(renderer, x, y, glyphs)
            .and_then(|hit| Handle::from_index(hit.handle).map(|handle| (handle, hit)));
        match hit {
            Some((handle, hit)) => {
                self.current_handle = Some(handle);
                self.last_pick_position = Some(hit.world_position);
                self.set_interaction_state(InteractionState::for_handle(handle));
            }
            None => self.set_interaction_state(InteractionState::Outside),
        }
        self.state
    }

    /// Starts a gesture at a display position.
    pub fn start_widget_interaction(
        &mut self,
        renderer: &dyn SceneRenderer,
        picker: &dyn HandlePicker,
        position: DVec2,
    ) -> InteractionState {
        self.begin_gesture(position);
        self.compute_interaction_state(renderer, picker, position.x, position.y)
    }

    pub(crate) fn begin_gesture(&mut self, position: DVec2) {
        self.start_event_position = position;
        self.last_event_position = position;
    }

    /// Continues a gesture: moves the box according to the interaction state.
    ///
    /// Drag points are unprojected at the display depth of the last pick.
    pub fn widget_interaction(&mut self, renderer: &dyn SceneRenderer, position: DVec2) {
        let Some(vpn) = renderer.view_plane_normal() else {
            return;
        };
        let anchor = self.last_pick_position.unwrap_or_else(|| self.center());
        let z = renderer.world_to_display(anchor).z;
        let last = self.last_event_position;
        let prev = renderer.display_to_world(DVec3::new(last.x, last.y, z));
        let curr = renderer.display_to_world(DVec3::new(position.x, position.y, z));
        self.apply_motion(prev, curr, position, vpn, renderer.viewport_size());
    }

    /// Ends the gesture.
    pub fn end_widget_interaction(&mut self) {
        self.set_interaction_state(InteractionState::Outside);
    }

    pub(crate) fn apply_motion(
        &mut self,
        prev_world: DVec3,
        curr_world: DVec3,
        position: DVec2,
        view_plane_normal: DVec3,
        viewport: DVec2,
    ) {
        let prev = self.world_to_local.transform_point3(prev_world);
        let curr = self.world_to_local.transform_point3(curr_world);
        match self.state {
            InteractionState::MoveFace(face) => self.move_face(face, prev, curr),
            InteractionState::Translating => self.translate(prev, curr),
            InteractionState::Scaling => self.scale(position),
            InteractionState::Rotating => {
                self.rotate(position, prev, curr, view_plane_normal, viewport);
            }
            InteractionState::Outside => {}
        }
        self.last_event_position = position;
    }

    /// Slides one face along its normal by the projection of `p2 - p1`.
    pub fn move_face(&mut self, face: Face, p1: DVec3, p2: DVec3) {
        self.compute_normals();
        let normals = self.geometry.normals();
        let [own, a, b] = face.slide_normals();
        let dir = slide_direction(normals[own], normals[a], normals[b], face.axis())
            .normalize_or_zero();
        let delta = dir * (p2 - p1).dot(dir);

        let points = self.geometry.points_mut();
        for corner in face.corners() {
            points[corner] += delta;
        }
        points[face.midpoint()] += delta;
        self.position_handles();
    }

    /// Moves the whole box by `p2 - p1`.
    pub fn translate(&mut self, p1: DVec3, p2: DVec3) {
        self.geometry.translate_corners(p2 - p1);
    }

    /// Scales the box about its center by a fixed step.
    ///
    /// The box grows when the pointer moved up since the last event and
    /// shrinks otherwise.
    pub fn scale(&mut self, position: DVec2) {
        let factor = if position.y > self.last_event_position.y {
            self.options.scale_up_factor
        } else {
            self.options.scale_down_factor
        };
        let matrix = scale_about_point(self.center(), factor);
        self.geometry.transform_corners(&matrix);
    }

    /// Rotates the box about its center.
    ///
    /// The axis is perpendicular to the view plane normal and the drag
    /// vector; a full viewport diagonal of pointer travel is 360 degrees.
    pub fn rotate(
        &mut self,
        position: DVec2,
        p1: DVec3,
        p2: DVec3,
        view_plane_normal: DVec3,
        viewport: DVec2,
    ) {
        let Some(axis) = view_plane_normal.cross(p2 - p1).try_normalize() else {
            return;
        };
        let diagonal2 = viewport.length_squared();
        if diagonal2 == 0.0 {
            return;
        }
        let l2 = (position - self.last_event_position).length_squared();
        let theta = 360.0 * (l2 / diagonal2).sqrt();
        let matrix = rotation_about_point(self.center(), axis, theta);
        self.geometry.transform_corners(&matrix);
    }

    /// The box pose relative to the placement bounds.
    ///
    /// Composed as translate(center) * rotate(normals) * scale(extents ratio)
    /// * translate(-initial center).
    pub fn get_transform(&mut self) -> DMat4 {
        self.position_handles();
        self.compute_normals();
        let normals = *self.geometry.normals();
        let rotation = DMat4::from_mat3(DMat3::from_cols(normals[1], normals[3], normals[5]));

        let extents = self.extents();
        let initial = self.initial_bounds.extents();
        let ratio = |current: f64, reference: f64| {
            if reference == 0.0 {
                current
            } else {
                current / reference
            }
        };
        let scale = DVec3::new(
            ratio(extents.x, initial.x),
            ratio(extents.y, initial.y),
            ratio(extents.z, initial.z),
        );

        DMat4::from_translation(self.center())
            * rotation
            * DMat4::from_scale(scale)
            * DMat4::from_translation(-self.initial_bounds.center())
    }

    /// The box pose as translation, rotation and scale.
    pub fn transform(&mut self) -> Transform {
        Transform::from_matrix(self.get_transform())
    }

    /// Positions the box by transforming the placement bounds.
    pub fn set_transform(&mut self, matrix: &DMat4) {
        let corners = corners_of(&self.initial_bounds).map(|c| matrix.transform_point3(c));
        self.geometry.set_corners(corners);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roi::geometry::FACE_CORNERS;
    use proptest::prelude::*;
    use roiscope_core::{Camera, CameraRenderer, ProjectionMode, ScreenSpacePicker};

    const EPS: f64 = 1e-9;

    fn cube(lo: f64, hi: f64) -> BoxManipulator {
        let mut m = BoxManipulator::new();
        m.place_widget(&Bounds::from_array([lo, hi, lo, hi, lo, hi]));
        m
    }

    fn front_view() -> CameraRenderer {
        let mut camera = Camera::new(1.0);
        camera.position = DVec3::new(0.0, 0.0, 50.0);
        camera.projection_mode = ProjectionMode::Orthographic;
        camera.ortho_scale = 10.0;
        CameraRenderer::new(camera, 200.0, 200.0)
    }

    fn assert_close(a: DVec3, b: DVec3) {
        assert!((a - b).length() < 1e-6, "{a:?} != {b:?}");
    }

    fn assert_derived_points(m: &BoxManipulator) {
        let p = m.points();
        let pairs = [(0, 7), (1, 6), (0, 5), (2, 7), (1, 3), (5, 7), (0, 6)];
        for (i, (a, b)) in pairs.into_iter().enumerate() {
            assert_close(p[8 + i], (p[a] + p[b]) * 0.5);
        }
    }

    #[test]
    fn test_place_widget_extents_and_center() {
        let m = cube(0.0, 10.0);
        assert_eq!(m.extents(), DVec3::splat(10.0));
        assert_eq!(m.center(), DVec3::splat(5.0));
        assert!((m.initial_length() - 300.0_f64.sqrt()).abs() < EPS);
    }

    #[test]
    fn test_default_placement_is_unit_cube() {
        let m = BoxManipulator::new();
        assert_eq!(m.bounds().to_array(), [-0.5, 0.5, -0.5, 0.5, -0.5, 0.5]);
    }

    #[test]
    fn test_place_factor_scales_about_center() {
        let mut m = BoxManipulator::with_options(ManipulatorOptions::new().with_place_factor(0.5));
        m.place_widget(&Bounds::from_array([0.0, 10.0, 0.0, 10.0, 0.0, 10.0]));
        assert_eq!(m.bounds().to_array(), [2.5, 7.5, 2.5, 7.5, 2.5, 7.5]);
    }

    #[test]
    fn test_move_plus_x_face() {
        let mut m = cube(0.0, 10.0);
        m.move_face(Face::PlusX, DVec3::ZERO, DVec3::new(2.0, 7.0, -3.0));
        assert_eq!(m.extents(), DVec3::new(12.0, 10.0, 10.0));
        assert_eq!(m.points()[0], DVec3::ZERO);
        assert_eq!(m.points()[9], DVec3::new(12.0, 5.0, 5.0));
        assert_derived_points(&m);
    }

    #[test]
    fn test_move_minus_x_face_only_moves_its_corners() {
        let mut m = cube(0.0, 10.0);
        let before = *m.points();
        m.move_face(Face::MinusX, DVec3::ZERO, DVec3::new(3.0, 1.0, 1.0));
        let moved = FACE_CORNERS[0];
        for corner in 0..8 {
            let delta = m.points()[corner] - before[corner];
            if moved.contains(&corner) {
                assert_close(delta, DVec3::new(3.0, 0.0, 0.0));
            } else {
                assert_eq!(delta, DVec3::ZERO);
            }
        }
    }

    #[test]
    fn test_collapsed_face_still_slides() {
        let mut m = cube(0.0, 10.0);
        m.move_face(Face::PlusX, DVec3::ZERO, DVec3::new(-10.0, 0.0, 0.0));
        assert!(m.extents().x.abs() < EPS);
        m.move_face(Face::PlusX, DVec3::ZERO, DVec3::new(4.0, 0.0, 0.0));
        assert_close(m.points()[9], DVec3::new(4.0, 5.0, 5.0));
    }

    #[test]
    fn test_slide_direction_fallbacks() {
        let seed = DVec3::X;
        assert_eq!(slide_direction(DVec3::X, DVec3::Y, DVec3::Z, seed), DVec3::X);
        assert_eq!(slide_direction(DVec3::ZERO, DVec3::Y, DVec3::Z, seed), DVec3::X);
        let only_y = slide_direction(DVec3::ZERO, DVec3::Y, DVec3::ZERO, DVec3::new(1.0, 1.0, 0.0));
        assert_close(only_y, DVec3::X);
        let only_z = slide_direction(DVec3::ZERO, DVec3::ZERO, DVec3::Z, DVec3::new(1.0, 0.0, 1.0));
        assert_close(only_z, DVec3::X);
        assert_eq!(slide_direction(DVec3::ZERO, DVec3::ZERO, DVec3::ZERO, seed), seed);
    }

    #[test]
    fn test_scale_step_follows_pointer() {
        let mut m = cube(0.0, 10.0);
        m.scale(DVec2::new(0.0, 5.0));
        assert_close(m.extents(), DVec3::splat(10.3));
        assert_close(m.center(), DVec3::splat(5.0));

        let mut m = cube(0.0, 10.0);
        m.scale(DVec2::new(0.0, -5.0));
        assert_close(m.extents(), DVec3::splat(9.7));
    }

    #[test]
    fn test_rotate_degenerate_axis_is_noop() {
        let mut m = cube(0.0, 10.0);
        let before = *m.points();
        m.rotate(
            DVec2::new(10.0, 0.0),
            DVec3::ZERO,
            DVec3::Z,
            DVec3::Z,
            DVec2::new(100.0, 100.0),
        );
        assert_eq!(*m.points(), before);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let mut m = cube(-1.0, 1.0);
        // A drag of a quarter of the viewport diagonal turns 90 degrees.
        let viewport = DVec2::new(300.0, 400.0);
        m.rotate(
            DVec2::new(125.0, 0.0),
            DVec3::ZERO,
            DVec3::X,
            DVec3::Z,
            viewport,
        );
        // Axis is z x x = +y.
        assert_close(m.points()[9], DVec3::new(0.0, 0.0, -1.0));
        assert_close(m.extents(), DVec3::splat(2.0));
    }

    #[test]
    fn test_planes_respect_inside_out() {
        let mut m = cube(0.0, 10.0);
        let planes = m.planes();
        assert_eq!(planes[1].origin, DVec3::new(10.0, 5.0, 5.0));
        assert_eq!(planes[1].normal, DVec3::X);

        m.set_options(ManipulatorOptions::new().with_inside_out(true));
        assert_eq!(m.planes()[1].normal, DVec3::NEG_X);
    }

    #[test]
    fn test_outline_segments() {
        let mut m = cube(0.0, 1.0);
        assert_eq!(m.outline_segments(), vec![(8, 9), (10, 11), (12, 13)]);
        m.set_options(ManipulatorOptions::new().with_outline_wires(true, false));
        assert_eq!(m.outline_segments().len(), 12);
        m.set_options(ManipulatorOptions::new().with_outline_wires(false, false));
        assert!(m.outline_segments().is_empty());
    }

    #[test]
    fn test_transform_of_placed_box_is_identity() {
        let mut m = cube(0.0, 10.0);
        let t = m.get_transform();
        assert!(t.abs_diff_eq(DMat4::IDENTITY, EPS));
    }

    #[test]
    fn test_transform_tracks_translation_and_scale() {
        let mut m = cube(0.0, 10.0);
        m.translate(DVec3::ZERO, DVec3::new(1.0, 2.0, 3.0));
        m.move_face(Face::PlusZ, DVec3::ZERO, DVec3::new(0.0, 0.0, 10.0));
        let t = m.transform();
        assert_close(t.scale, DVec3::new(1.0, 1.0, 2.0));
        let corner = m.get_transform().transform_point3(DVec3::new(10.0, 10.0, 10.0));
        assert_close(corner, m.points()[6]);
    }

    #[test]
    fn test_set_transform_moves_initial_corners() {
        let mut m = cube(0.0, 10.0);
        m.set_transform(&DMat4::from_translation(DVec3::new(5.0, 0.0, 0.0)));
        assert_eq!(m.center(), DVec3::new(10.0, 5.0, 5.0));
        assert_eq!(m.initial_bounds().center(), DVec3::splat(5.0));
    }

    #[test]
    fn test_zero_extent_placement_transform_is_finite() {
        let mut m = BoxManipulator::new();
        m.place_widget(&Bounds::from_array([0.0, 0.0, 0.0, 1.0, 0.0, 1.0]));
        let t = m.get_transform();
        assert!(t.is_finite());
    }

    #[test]
    fn test_set_interaction_state_clamps() {
        let mut m = BoxManipulator::new();
        m.set_interaction_state_index(100);
        assert_eq!(m.interaction_state(), InteractionState::Scaling);
        assert!(m.highlight().outline);
        m.set_interaction_state_index(-1);
        assert_eq!(m.interaction_state(), InteractionState::Outside);
        assert_eq!(m.highlight(), Highlight::default());
    }

    #[test]
    fn test_handles_off_hides_glyphs() {
        let mut m = cube(0.0, 10.0);
        assert!(m.handles().iter().all(|h| h.radius > 0.0));
        m.handles_off();
        assert!(m.handles().iter().all(|h| h.radius == 0.0 && !h.visible));
        m.handles_on();
        assert!(m.handles_visible());
    }

    #[test]
    fn test_pick_face_handle_and_drag() {
        let view = front_view();
        let picker = ScreenSpacePicker::new(0.0);
        let mut m = cube(-2.0, 2.0);
        m.size_handles(Some(&view));
        assert!((m.handle_radius() - 0.75).abs() < 1e-6);

        let state = m.start_widget_interaction(&view, &picker, DVec2::new(120.0, 100.0));
        assert_eq!(state, InteractionState::MoveFace(Face::PlusX));
        assert_eq!(m.current_handle(), Some(Handle::Face(Face::PlusX)));

        m.widget_interaction(&view, DVec2::new(130.0, 104.0));
        assert_close(m.extents(), DVec3::new(5.0, 4.0, 4.0));
        assert_eq!(m.last_event_position(), DVec2::new(130.0, 104.0));
        assert_eq!(m.start_event_position(), DVec2::new(120.0, 100.0));

        m.end_widget_interaction();
        assert_eq!(m.interaction_state(), InteractionState::Outside);
    }

    #[test]
    fn test_pick_misses_outside_viewport_and_empty_space() {
        let view = front_view();
        let picker = ScreenSpacePicker::default();
        let mut m = cube(-2.0, 2.0);
        m.size_handles(Some(&view));
        assert_eq!(
            m.compute_interaction_state(&view, &picker, -5.0, 100.0),
            InteractionState::Outside
        );
        assert_eq!(
            m.compute_interaction_state(&view, &picker, 10.0, 10.0),
            InteractionState::Outside
        );
        assert_eq!(m.current_handle(), None);
    }

    #[test]
    fn test_translate_through_view() {
        let view = front_view();
        let mut m = cube(-2.0, 2.0);
        m.start_widget_interaction(&view, &ScreenSpacePicker::default(), DVec2::new(100.0, 100.0));
        m.set_interaction_state(InteractionState::Translating);
        m.widget_interaction(&view, DVec2::new(110.0, 80.0));
        assert_close(m.center(), DVec3::new(1.0, -2.0, 0.0));
    }

    #[test]
    fn test_world_to_local_applies_to_drags() {
        let view = front_view();
        let mut m = cube(-2.0, 2.0);
        m.set_world_to_local(DMat4::from_scale(DVec3::splat(2.0)));
        m.start_widget_interaction(&view, &ScreenSpacePicker::default(), DVec2::new(100.0, 100.0));
        m.set_interaction_state(InteractionState::Translating);
        m.widget_interaction(&view, DVec2::new(110.0, 100.0));
        assert_close(m.center(), DVec3::new(2.0, 0.0, 0.0));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Translate(DVec3),
        Scale(bool),
        Rotate(DVec3, f64),
        MoveFace(usize, DVec3),
    }

    fn vec3() -> impl Strategy<Value = DVec3> {
        (-5.0..5.0f64, -5.0..5.0f64, -5.0..5.0f64).prop_map(|(x, y, z)| DVec3::new(x, y, z))
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            vec3().prop_map(Op::Translate),
            any::<bool>().prop_map(Op::Scale),
            (vec3(), 1.0..50.0f64).prop_map(|(v, d)| Op::Rotate(v, d)),
            (0..6usize, vec3()).prop_map(|(f, v)| Op::MoveFace(f, v)),
        ]
    }

    fn apply(m: &mut BoxManipulator, op: &Op) {
        match *op {
            Op::Translate(v) => m.translate(DVec3::ZERO, v),
            Op::Scale(up) => m.scale(DVec2::new(0.0, if up { 1.0 } else { -1.0 })),
            Op::Rotate(v, d) => m.rotate(
                DVec2::new(d, 0.0),
                DVec3::ZERO,
                v,
                DVec3::Z,
                DVec2::new(300.0, 400.0),
            ),
            Op::MoveFace(f, v) => {
                if let Some(face) = Face::from_index(f) {
                    // Keep faces from crossing over.
                    m.move_face(face, DVec3::ZERO, v * 0.1);
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_derived_points_follow_corners(ops in prop::collection::vec(op(), 0..12)) {
            let mut m = cube(0.0, 10.0);
            for op in &ops {
                apply(&mut m, op);
            }
            let p = m.points();
            let pairs = [(0, 7), (1, 6), (0, 5), (2, 7), (1, 3), (5, 7), (0, 6)];
            for (i, (a, b)) in pairs.into_iter().enumerate() {
                prop_assert!((p[8 + i] - (p[a] + p[b]) * 0.5).length() < 1e-9);
            }
        }

        #[test]
        fn prop_translate_inverse_restores_corners(ops in prop::collection::vec(op(), 0..6), v in vec3(), p in vec3()) {
            let mut m = cube(0.0, 10.0);
            for op in &ops {
                apply(&mut m, op);
            }
            let before = *m.points();
            m.translate(p, p + v);
            m.translate(p + v, p);
            for i in 0..8 {
                prop_assert!((m.points()[i] - before[i]).length() < 1e-9);
            }
        }

        #[test]
        fn prop_face_move_is_along_normal(ops in prop::collection::vec(op(), 0..6), f in 0..6usize, drag in vec3()) {
            let mut m = cube(0.0, 10.0);
            for op in &ops {
                apply(&mut m, op);
            }
            let face = Face::from_index(f).unwrap();
            m.compute_normals();
            let normal = m.geometry().normals()[f];
            let before = *m.points();
            m.move_face(face, DVec3::ZERO, drag);
            for corner in face.corners() {
                let delta = m.points()[corner] - before[corner];
                prop_assert!(delta.cross(normal).length() < 1e-9);
            }
        }

        #[test]
        fn prop_rotation_preserves_extents(ops in prop::collection::vec(op(), 0..6), v in vec3(), d in 1.0..300.0f64) {
            let mut m = cube(0.0, 10.0);
            for op in &ops {
                apply(&mut m, op);
            }
            let before = m.extents();
            apply(&mut m, &Op::Rotate(v, d));
            prop_assert!((m.extents() - before).length() < 1e-9);
        }

        #[test]
        fn prop_set_transform_reproduces_pose(ops in prop::collection::vec(op(), 0..8)) {
            let mut m = cube(0.0, 10.0);
            for op in &ops {
                apply(&mut m, op);
            }
            let before = *m.points();
            let t = m.get_transform();
            m.set_transform(&t);
            for i in 0..8 {
                prop_assert!((m.points()[i] - before[i]).length() < 1e-6);
            }
        }
    }
}
