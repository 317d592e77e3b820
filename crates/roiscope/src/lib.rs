//! roiscope: interactive ROI box manipulation and trans-rectal fiducial calibration.
//!
//! # Quick Start
//!
//! ```no_run
//! use roiscope::*;
//!
//! fn main() -> Result<()> {
//!     init();
//!
//!     // A 10 mm box manipulated through a front-facing camera
//!     let mut widget = RoiWidget::new(BoxManipulator::new());
//!     widget.representation_mut().place_widget(&Bounds::from_array([0.0, 10.0, 0.0, 10.0, 0.0, 10.0]));
//!     widget.set_renderer(Box::new(CameraRenderer::new(Camera::default(), 800.0, 600.0)));
//!     widget.on_press(PointerButton::Left, Modifiers::NONE, DVec2::new(400.0, 300.0));
//!
//!     // Calibration markers clicked by the user
//!     let mut robot = RobotNode::new("TransRectalRobot");
//!     robot.set_marker_position(0, DVec3::new(0.0, 0.0, 0.0))?;
//!     Ok(())
//! }
//! ```
//!
//! # Crates
//!
//! - `roiscope-core` - errors, options, camera and picking collaborators
//! - `roiscope-widgets` - [`BoxManipulator`], [`BoxManipulator2D`] and [`RoiWidget`]
//! - `roiscope-calibration` - [`MarkerCalibrator`] and [`TargetSolver`]
//!
//! [`RobotNode`] ties markers, calibration and targeting together.

mod robot;

pub use robot::{RegistrationReport, RobotNode};

pub use roiscope_core::{
    Bounds, Camera, CameraRenderer, CircleDetection, CuttingPlane, DMat3, DMat4, DVec2, DVec3,
    HandleGlyph, HandlePicker, JsonOptions, ManipulatorOptions, MarkerGeometry, PickResult,
    ProjectionMode, Result, RobotGeometry, RoiscopeError, SceneRenderer, ScreenSpacePicker,
    SegmentationOptions, SliceRenderer, Transform,
};

pub use roiscope_widgets::{
    BoxGeometry, BoxManipulator, BoxManipulator2D, Face, FacePlane, Handle, Highlight,
    InteractionState, Modifiers, PointerButton, RoiInteraction, RoiWidget,
};

pub use roiscope_calibration::{
    CalibrationInput, CalibrationMarker, CalibrationMarkerSet, CalibrationOutput,
    CalibrationResult, CalibrationState, ClosestApproach, ImageVolume, Line3, MarkerCalibrator,
    TargetSolver, TargetingParams, MARKER_COUNT,
};

/// Initializes logging.
///
/// Installs `env_logger` (configured through `RUST_LOG`). Calling it more
/// than once, or after another logger was installed, has no effect.
pub fn init() {
    let _ = env_logger::try_init();
    log::info!("roiscope {} initialized", env!("CARGO_PKG_VERSION"));
}
