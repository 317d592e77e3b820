//! Error types for roiscope.

use thiserror::Error;

/// The main error type for roiscope operations.
///
/// Interactive box manipulation never produces errors; these are raised by
/// calibration, targeting and the robot node.
#[derive(Error, Debug)]
pub enum RoiscopeError {
    /// A calibration marker has not been placed yet.
    #[error("calibration marker {} is undefined", .0 + 1)]
    MarkerUndefined(usize),

    /// One or more calibration markers could not be segmented.
    #[error("calibration markers not detected: {}", format_marker_list(.0))]
    MarkersNotFound(Vec<usize>),

    /// A geometric configuration that has no meaningful answer.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// The calibration data is not valid.
    #[error("calibration is not valid")]
    InvalidCalibration,

    /// An index was outside of the allowed range.
    #[error("index {index} out of range (expected < {len})")]
    OutOfRange { index: usize, len: usize },

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The image volume cannot be used.
    #[error("invalid volume: {0}")]
    InvalidVolume(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

fn format_marker_list(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|i| (i + 1).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A specialized Result type for roiscope operations.
pub type Result<T> = std::result::Result<T, RoiscopeError>;
