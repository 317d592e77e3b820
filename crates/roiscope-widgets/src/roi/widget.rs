//! Pointer-event controller for the ROI box.
//!
//! The controller owns the collaborators (renderer and picker) and drives a
//! representation through a narrow command interface. Representations never
//! hold a reference back to their controller.

use glam::DVec2;
use roiscope_core::{HandlePicker, SceneRenderer, ScreenSpacePicker};

use super::interaction::InteractionState;
use super::representation::BoxManipulator;
use super::slice::BoxManipulator2D;

/// Commands a controller issues to a box representation.
pub trait RoiInteraction {
    /// Picks a handle at a display position and updates the state.
    fn compute_interaction_state(
        &mut self,
        renderer: &dyn SceneRenderer,
        picker: &dyn HandlePicker,
        x: f64,
        y: f64,
    ) -> InteractionState;

    /// Records the gesture origin and picks.
    fn start_interaction(
        &mut self,
        renderer: &dyn SceneRenderer,
        picker: &dyn HandlePicker,
        position: DVec2,
    ) -> InteractionState;

    /// Applies pointer motion according to the current state.
    fn interact(&mut self, renderer: &dyn SceneRenderer, position: DVec2);

    /// Ends the gesture.
    fn end_interaction(&mut self);

    /// The current interaction state.
    fn interaction_state(&self) -> InteractionState;

    /// Overrides the interaction state.
    fn set_interaction_state(&mut self, state: InteractionState);

    /// Resizes the handle glyphs for a renderer.
    fn size_handles(&mut self, renderer: &dyn SceneRenderer);

    /// The underlying 3D box.
    fn manipulator(&self) -> &BoxManipulator;
}

impl RoiInteraction for BoxManipulator {
    fn compute_interaction_state(
        &mut self,
        renderer: &dyn SceneRenderer,
        picker: &dyn HandlePicker,
        x: f64,
        y: f64,
    ) -> InteractionState {
        BoxManipulator::compute_interaction_state(self, renderer, picker, x, y)
    }

    fn start_interaction(
        &mut self,
        renderer: &dyn SceneRenderer,
        picker: &dyn HandlePicker,
        position: DVec2,
    ) -> InteractionState {
        self.start_widget_interaction(renderer, picker, position)
    }

    fn interact(&mut self, renderer: &dyn SceneRenderer, position: DVec2) {
        self.widget_interaction(renderer, position);
    }

    fn end_interaction(&mut self) {
        self.end_widget_interaction();
    }

    fn interaction_state(&self) -> InteractionState {
        BoxManipulator::interaction_state(self)
    }

    fn set_interaction_state(&mut self, state: InteractionState) {
        BoxManipulator::set_interaction_state(self, state);
    }

    fn size_handles(&mut self, renderer: &dyn SceneRenderer) {
        BoxManipulator::size_handles(self, Some(renderer));
    }

    fn manipulator(&self) -> &BoxManipulator {
        self
    }
}

impl RoiInteraction for BoxManipulator2D {
    fn compute_interaction_state(
        &mut self,
        renderer: &dyn SceneRenderer,
        picker: &dyn HandlePicker,
        x: f64,
        y: f64,
    ) -> InteractionState {
        BoxManipulator2D::compute_interaction_state(self, renderer, picker, x, y)
    }

    fn start_interaction(
        &mut self,
        renderer: &dyn SceneRenderer,
        picker: &dyn HandlePicker,
        position: DVec2,
    ) -> InteractionState {
        self.start_widget_interaction(renderer, picker, position)
    }

    fn interact(&mut self, renderer: &dyn SceneRenderer, position: DVec2) {
        self.widget_interaction(renderer, position);
    }

    fn end_interaction(&mut self) {
        self.end_widget_interaction();
    }

    fn interaction_state(&self) -> InteractionState {
        BoxManipulator2D::interaction_state(self)
    }

    fn set_interaction_state(&mut self, state: InteractionState) {
        BoxManipulator2D::set_interaction_state(self, state);
    }

    // Slice handles are sized in plane pixels.
    fn size_handles(&mut self, _renderer: &dyn SceneRenderer) {
        BoxManipulator2D::size_handles(self);
    }

    fn manipulator(&self) -> &BoxManipulator {
        BoxManipulator2D::manipulator(self)
    }
}

/// Pointer buttons understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Picks a handle; with control held, rotates; with shift held, translates.
    Left,
    /// Translates the box.
    Middle,
    /// Scales the box.
    Right,
}

/// Keyboard modifiers held during a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Shift key.
    pub shift: bool,
    /// Control key.
    pub control: bool,
}

impl Modifiers {
    /// No modifiers.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
    };

    /// Control held.
    pub const CONTROL: Self = Self {
        shift: false,
        control: true,
    };

    /// Shift held.
    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
    };
}

/// Drives a box representation from pointer events.
pub struct RoiWidget<R: RoiInteraction, P: HandlePicker = ScreenSpacePicker> {
    representation: R,
    picker: P,
    renderer: Option<Box<dyn SceneRenderer>>,
    enabled: bool,
    active: Option<PointerButton>,
}

impl<R: RoiInteraction> RoiWidget<R> {
    /// Creates an enabled widget with the default screen-space picker.
    pub fn new(representation: R) -> Self {
        Self::with_picker(representation, ScreenSpacePicker::default())
    }
}

impl<R: RoiInteraction, P: HandlePicker> RoiWidget<R, P> {
    /// Creates an enabled widget with a custom picker.
    pub fn with_picker(representation: R, picker: P) -> Self {
        Self {
            representation,
            picker,
            renderer: None,
            enabled: true,
            active: None,
        }
    }

    /// Attaches the renderer and resizes the handles for it.
    pub fn set_renderer(&mut self, renderer: Box<dyn SceneRenderer>) {
        self.representation.size_handles(renderer.as_ref());
        self.renderer = Some(renderer);
    }

    /// Detaches the renderer; pointer events are ignored until a new one is set.
    pub fn clear_renderer(&mut self) -> Option<Box<dyn SceneRenderer>> {
        self.cancel();
        self.renderer.take()
    }

    /// The attached renderer.
    pub fn renderer(&self) -> Option<&dyn SceneRenderer> {
        self.renderer.as_deref()
    }

    /// The representation.
    pub fn representation(&self) -> &R {
        &self.representation
    }

    /// Mutable access to the representation.
    pub fn representation_mut(&mut self) -> &mut R {
        &mut self.representation
    }

    /// The picker.
    pub fn picker(&self) -> &P {
        &self.picker
    }

    /// Returns whether the widget reacts to pointer events.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables the widget; disabling ends any gesture.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.cancel();
        }
        self.enabled = enabled;
    }

    /// Returns whether a gesture is in progress.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// The current interaction state of the representation.
    pub fn interaction_state(&self) -> InteractionState {
        self.representation.interaction_state()
    }

    /// Handles a button press at a display position.
    ///
    /// A press that misses every handle leaves the widget idle.
    pub fn on_press(
        &mut self,
        button: PointerButton,
        modifiers: Modifiers,
        position: DVec2,
    ) -> InteractionState {
        let Some(renderer) = self.renderer.as_deref() else {
            return InteractionState::Outside;
        };
        if !self.enabled || self.active.is_some() {
            return self.representation.interaction_state();
        }
        let picked = self
            .representation
            .start_interaction(renderer, &self.picker, position);
        if picked == InteractionState::Outside {
            return picked;
        }
        let state = match button {
            PointerButton::Left if modifiers.control => InteractionState::Rotating,
            PointerButton::Left if modifiers.shift => InteractionState::Translating,
            PointerButton::Left => picked,
            PointerButton::Middle => InteractionState::Translating,
            PointerButton::Right => InteractionState::Scaling,
        };
        self.representation.set_interaction_state(state);
        self.active = Some(button);
        log::debug!("ROI gesture {button:?} started as {state:?}");
        state
    }

    /// Handles pointer motion; returns whether the box was updated.
    pub fn on_move(&mut self, position: DVec2) -> bool {
        let Some(renderer) = self.renderer.as_deref() else {
            return false;
        };
        if self.active.is_none() {
            return false;
        }
        self.representation.interact(renderer, position);
        true
    }

    /// Handles a button release; only the button that started the gesture ends it.
    pub fn on_release(&mut self, button: PointerButton) {
        if self.active == Some(button) {
            self.cancel();
        }
    }

    fn cancel(&mut self) {
        if self.active.take().is_some() {
            self.representation.end_interaction();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roi::interaction::Face;
    use glam::{DMat4, DVec3};
    use roiscope_core::{Bounds, Camera, CameraRenderer, CuttingPlane, ProjectionMode, SliceRenderer};

    fn front_view() -> CameraRenderer {
        let mut camera = Camera::new(1.0);
        camera.position = DVec3::new(0.0, 0.0, 50.0);
        camera.projection_mode = ProjectionMode::Orthographic;
        camera.ortho_scale = 10.0;
        CameraRenderer::new(camera, 200.0, 200.0)
    }

    fn widget() -> RoiWidget<BoxManipulator> {
        let mut m = BoxManipulator::new();
        m.place_widget(&Bounds::from_array([-2.0, 2.0, -2.0, 2.0, -2.0, 2.0]));
        let mut w = RoiWidget::with_picker(m, ScreenSpacePicker::new(0.0));
        w.set_renderer(Box::new(front_view()));
        w
    }

    #[test]
    fn test_without_renderer_nothing_happens() {
        let mut w = RoiWidget::new(BoxManipulator::new());
        let state = w.on_press(PointerButton::Left, Modifiers::NONE, DVec2::new(100.0, 100.0));
        assert_eq!(state, InteractionState::Outside);
        assert!(!w.on_move(DVec2::new(120.0, 100.0)));
        assert!(!w.is_active());
    }

    #[test]
    fn test_left_drag_moves_face() {
        let mut w = widget();
        assert!((w.representation().handle_radius() - 0.75).abs() < 1e-6);

        let state = w.on_press(PointerButton::Left, Modifiers::NONE, DVec2::new(120.0, 100.0));
        assert_eq!(state, InteractionState::MoveFace(Face::PlusX));
        assert!(w.is_active());
        assert!(w.on_move(DVec2::new(130.0, 100.0)));
        let extents = w.representation().extents();
        assert!((extents - DVec3::new(5.0, 4.0, 4.0)).length() < 1e-6);

        w.on_release(PointerButton::Left);
        assert!(!w.is_active());
        assert_eq!(w.interaction_state(), InteractionState::Outside);
    }

    #[test]
    fn test_press_in_empty_space_stays_idle() {
        let mut w = widget();
        let state = w.on_press(PointerButton::Left, Modifiers::NONE, DVec2::new(10.0, 10.0));
        assert_eq!(state, InteractionState::Outside);
        assert!(!w.on_move(DVec2::new(20.0, 20.0)));
    }

    #[test]
    fn test_middle_translates() {
        let mut w = widget();
        let state = w.on_press(PointerButton::Middle, Modifiers::NONE, DVec2::new(120.0, 100.0));
        assert_eq!(state, InteractionState::Translating);
        w.on_move(DVec2::new(130.0, 100.0));
        let center = w.representation().center();
        assert!((center - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_right_scales_up_when_moving_up() {
        let mut w = widget();
        assert_eq!(
            w.on_press(PointerButton::Right, Modifiers::NONE, DVec2::new(100.0, 100.0)),
            InteractionState::Scaling
        );
        w.on_move(DVec2::new(100.0, 110.0));
        assert!((w.representation().extents().x - 4.0 * 1.03).abs() < 1e-9);
        w.on_move(DVec2::new(100.0, 105.0));
        assert!((w.representation().extents().x - 4.0 * 1.03 * 0.97).abs() < 1e-9);
    }

    #[test]
    fn test_control_left_rotates() {
        let mut w = widget();
        assert_eq!(
            w.on_press(PointerButton::Left, Modifiers::CONTROL, DVec2::new(100.0, 100.0)),
            InteractionState::Rotating
        );
        w.on_move(DVec2::new(110.0, 100.0));
        let m = w.representation();
        assert!((m.extents() - DVec3::splat(4.0)).length() < 1e-9);
        assert!(m.bounds().max.x > 2.0 + 1e-3);
        assert!((m.center() - DVec3::ZERO).length() < 1e-9);
    }

    #[test]
    fn test_release_of_other_button_keeps_gesture() {
        let mut w = widget();
        w.on_press(PointerButton::Left, Modifiers::SHIFT, DVec2::new(100.0, 100.0));
        assert_eq!(w.interaction_state(), InteractionState::Translating);
        w.on_release(PointerButton::Right);
        assert!(w.is_active());
        w.set_enabled(false);
        assert!(!w.is_active());
        assert_eq!(
            w.on_press(PointerButton::Left, Modifiers::NONE, DVec2::new(100.0, 100.0)),
            InteractionState::Outside
        );
    }

    #[test]
    fn test_slice_widget_drags_face() {
        let plane = CuttingPlane::new(DMat4::from_translation(DVec3::new(0.0, 0.0, 5.0)));
        let mut m = BoxManipulator2D::new(plane);
        m.place_widget(&Bounds::from_array([0.0, 10.0, 0.0, 10.0, 0.0, 10.0]));
        let mut w = RoiWidget::with_picker(m, ScreenSpacePicker::new(0.0));
        w.set_renderer(Box::new(SliceRenderer::new(plane, 100.0, 100.0)));

        let state = w.on_press(PointerButton::Left, Modifiers::NONE, DVec2::new(0.0, 5.0));
        assert_eq!(state, InteractionState::MoveFace(Face::MinusX));
        w.on_move(DVec2::new(-2.0, 5.0));
        assert_eq!(w.representation().manipulator().extents().x, 12.0);
        w.on_release(PointerButton::Left);
        assert_eq!(w.interaction_state(), InteractionState::Outside);
    }
}
