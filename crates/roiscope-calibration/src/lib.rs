//! Fiducial calibration and needle targeting for roiscope.
//!
//! This crate provides:
//! - [`ImageVolume`], a scalar volume with an index-to-world matrix
//! - VOI preprocessing filters, oblique reslicing and circle detection
//! - Robust total-least-squares line fitting and the closest approach of two axes
//! - [`MarkerCalibrator`], which registers the device from four markers
//! - [`TargetSolver`], which turns a registration and a target into device settings

// Voxel indexing converts between integer indices and f64 positions
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::float_cmp)]
#![allow(clippy::module_name_repetitions)]
// Geometry formulas read best with their usual one-letter names
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]

pub mod calibrator;
pub mod circle;
pub mod filters;
pub mod line_fit;
pub mod markers;
pub mod probe;
pub mod reslice;
pub mod segment;
pub mod targeting;
pub mod volume;

pub use calibrator::{
    CalibrationInput, CalibrationOutput, CalibrationResult, CalibrationState, MarkerCalibrator,
};
pub use line_fit::{fit_line, remove_outliers, Line3, LineFit};
pub use markers::{CalibrationMarker, CalibrationMarkerSet, AXIS_MARKERS, MARKER_COUNT};
pub use probe::{find_probe, ClosestApproach};
pub use reslice::SliceImage;
pub use segment::{segment_axis, segment_marker, AxisSegmentation, MarkerSegmentation};
pub use targeting::{TargetSolver, TargetingParams};
pub use volume::{ImageVolume, VoxelExtent};
