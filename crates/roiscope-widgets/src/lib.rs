//! Interactive ROI widgets for roiscope.
//!
//! This crate provides the oriented region-of-interest box:
//! - [`BoxManipulator`]: the 15-point box with face moves, translation,
//!   rotation and scaling driven by pointer gestures
//! - [`BoxManipulator2D`]: the same box seen on an oblique slice
//! - [`RoiWidget`]: a controller turning pointer events into gestures

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Accessors and builders return values callers may legitimately ignore
#![allow(clippy::must_use_candidate)]
// Degenerate-geometry checks compare against exact zero on purpose
#![allow(clippy::float_cmp)]
#![allow(clippy::module_name_repetitions)]

pub mod roi;

pub use roi::{
    BoxGeometry, BoxManipulator, BoxManipulator2D, Face, FacePlane, Handle, Highlight,
    InteractionState, Modifiers, PointerButton, RoiInteraction, RoiWidget,
};
