//! Core abstractions for roiscope.
//!
//! This crate provides the fundamental types used throughout roiscope:
//! - [`RoiscopeError`] and the [`Result`] alias
//! - Configuration options for the box widget, segmentation and the needle guide
//! - The [`SceneRenderer`] and [`HandlePicker`] collaborators used by interactive widgets
//! - An f64 [`Camera`], [`CuttingPlane`] and small geometry helpers

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Options structs legitimately have many boolean flags
#![allow(clippy::struct_excessive_bools)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Geometry code compares against exact zero on purpose
#![allow(clippy::float_cmp)]

pub mod camera;
pub mod error;
pub mod math;
pub mod options;
pub mod pick;
pub mod renderer;
pub mod slice_plane;
pub mod transform;

pub use camera::{Camera, CameraRenderer, ProjectionMode};
pub use error::{Result, RoiscopeError};
pub use math::Bounds;
pub use options::{
    CircleDetection, JsonOptions, ManipulatorOptions, MarkerGeometry, RobotGeometry,
    SegmentationOptions, DEFAULT_HOUGH_VOTES, DEFAULT_MARKER_THRESHOLD_PERCENT,
};
pub use pick::{HandleGlyph, HandlePicker, PickResult, ScreenSpacePicker};
pub use renderer::SceneRenderer;
pub use slice_plane::{CuttingPlane, SliceRenderer};
pub use transform::Transform;

// Re-export glam types for convenience
pub use glam::{DMat3, DMat4, DVec2, DVec3};
