//! The four calibration markers.

use glam::DVec3;
use roiscope_core::{Result, RoiscopeError, DEFAULT_MARKER_THRESHOLD_PERCENT};
use serde::{Deserialize, Serialize};

/// Number of calibration markers.
pub const MARKER_COUNT: usize = 4;

/// Markers defining each axis: probe axis first, then needle axis.
pub const AXIS_MARKERS: [[usize; 2]; 2] = [[0, 1], [2, 3]];

/// A marker position clicked by the user or refined from the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationMarker {
    /// World (RAS) position in millimetres.
    pub position: DVec3,
    /// Whether the position has been set.
    pub defined: bool,
    /// Segmentation threshold in percent of the intensity range.
    pub threshold_percent: f64,
}

impl Default for CalibrationMarker {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            defined: false,
            threshold_percent: DEFAULT_MARKER_THRESHOLD_PERCENT,
        }
    }
}

/// The four calibration markers, paired into two axes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CalibrationMarkerSet {
    markers: [CalibrationMarker; MARKER_COUNT],
}

impl CalibrationMarkerSet {
    /// Creates a set with no marker defined.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a marker.
    pub fn get(&self, index: usize) -> Result<&CalibrationMarker> {
        self.markers.get(index).ok_or(RoiscopeError::OutOfRange {
            index,
            len: MARKER_COUNT,
        })
    }

    fn get_mut(&mut self, index: usize) -> Result<&mut CalibrationMarker> {
        self.markers.get_mut(index).ok_or(RoiscopeError::OutOfRange {
            index,
            len: MARKER_COUNT,
        })
    }

    /// Sets a marker position and marks it defined.
    pub fn set_position(&mut self, index: usize, position: DVec3) -> Result<()> {
        let marker = self.get_mut(index)?;
        marker.position = position;
        marker.defined = true;
        Ok(())
    }

    /// Moves every marker, marking all of them defined.
    pub fn set_positions(&mut self, positions: [DVec3; MARKER_COUNT]) {
        for (marker, position) in self.markers.iter_mut().zip(positions) {
            marker.position = position;
            marker.defined = true;
        }
    }

    /// Marks a marker undefined.
    pub fn clear(&mut self, index: usize) -> Result<()> {
        self.get_mut(index)?.defined = false;
        Ok(())
    }

    /// Sets the segmentation threshold of a marker.
    pub fn set_threshold(&mut self, index: usize, percent: f64) -> Result<()> {
        self.get_mut(index)?.threshold_percent = percent;
        Ok(())
    }

    /// All markers.
    pub fn markers(&self) -> &[CalibrationMarker; MARKER_COUNT] {
        &self.markers
    }

    /// Marker positions.
    pub fn positions(&self) -> [DVec3; MARKER_COUNT] {
        self.markers.map(|m| m.position)
    }

    /// Segmentation thresholds.
    pub fn thresholds(&self) -> [f64; MARKER_COUNT] {
        self.markers.map(|m| m.threshold_percent)
    }

    /// The first undefined marker, if any.
    pub fn first_undefined(&self) -> Option<usize> {
        self.markers.iter().position(|m| !m.defined)
    }

    /// Returns whether every marker is defined.
    pub fn all_defined(&self) -> bool {
        self.first_undefined().is_none()
    }
}
