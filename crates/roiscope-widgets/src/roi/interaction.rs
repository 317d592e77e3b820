//! Interaction states, handles and highlight bookkeeping.

use glam::DVec3;

use super::geometry::{CENTER, FACE_CORNERS, FIRST_MIDPOINT};

/// One of the six box faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    /// The -x face.
    MinusX,
    /// The +x face.
    PlusX,
    /// The -y face.
    MinusY,
    /// The +y face.
    PlusY,
    /// The -z face.
    MinusZ,
    /// The +z face.
    PlusZ,
}

impl Face {
    /// All faces in index order.
    pub const ALL: [Face; 6] = [
        Face::MinusX,
        Face::PlusX,
        Face::MinusY,
        Face::PlusY,
        Face::MinusZ,
        Face::PlusZ,
    ];

    /// Face index (0-5).
    pub fn index(self) -> usize {
        match self {
            Face::MinusX => 0,
            Face::PlusX => 1,
            Face::MinusY => 2,
            Face::PlusY => 3,
            Face::MinusZ => 4,
            Face::PlusZ => 5,
        }
    }

    /// Face from its index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Corners of the face quad.
    pub fn corners(self) -> [usize; 4] {
        FACE_CORNERS[self.index()]
    }

    /// Index of the face midpoint.
    pub fn midpoint(self) -> usize {
        FIRST_MIDPOINT + self.index()
    }

    /// Nominal world direction the face slides along.
    pub fn axis(self) -> DVec3 {
        match self {
            Face::MinusX => DVec3::NEG_X,
            Face::PlusX => DVec3::X,
            Face::MinusY => DVec3::NEG_Y,
            Face::PlusY => DVec3::Y,
            Face::MinusZ => DVec3::NEG_Z,
            Face::PlusZ => DVec3::Z,
        }
    }

    /// Normal indices used to resolve the slide direction: the face's own
    /// normal followed by two normals spanning the face.
    pub(crate) fn slide_normals(self) -> [usize; 3] {
        match self {
            Face::MinusX => [0, 4, 2],
            Face::PlusX => [1, 3, 5],
            Face::MinusY => [2, 0, 4],
            Face::PlusY => [3, 5, 1],
            Face::MinusZ => [4, 2, 0],
            Face::PlusZ => [5, 1, 3],
        }
    }
}

/// One of the seven draggable handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    /// A face-center handle.
    Face(Face),
    /// The box-center handle.
    Center,
}

impl Handle {
    /// Number of handles.
    pub const COUNT: usize = 7;

    /// Handle index (0-6).
    pub fn index(self) -> usize {
        match self {
            Handle::Face(face) => face.index(),
            Handle::Center => 6,
        }
    }

    /// Handle from its index.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            6 => Some(Handle::Center),
            i => Face::from_index(i).map(Handle::Face),
        }
    }

    /// Index of the box point the handle sits on.
    pub fn point_index(self) -> usize {
        match self {
            Handle::Face(face) => face.midpoint(),
            Handle::Center => CENTER,
        }
    }

    /// Default display color.
    pub fn color(self) -> DVec3 {
        HANDLE_COLORS[self.index()]
    }
}

/// Per-handle colors: lavender, dark violet, dark red, orange,
/// dark turquoise, cyan and yellow.
pub const HANDLE_COLORS: [DVec3; Handle::COUNT] = [
    DVec3::new(0.781, 0.633, 0.867),
    DVec3::new(0.5585, 0.343, 0.91),
    DVec3::new(0.75, 0.121, 0.269_53),
    DVec3::new(0.9765, 0.588, 0.1133),
    DVec3::new(0.1328, 0.4531, 0.5351),
    DVec3::new(0.582, 0.898, 0.871),
    DVec3::new(0.973_125, 0.898_281, 0.2),
];

/// Color of the selected handle (green).
pub const SELECTED_HANDLE_COLOR: DVec3 = DVec3::new(0.453_125, 0.967_96, 0.335_93);

/// What a pointer gesture does to the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    /// Nothing is being manipulated.
    #[default]
    Outside,
    /// A face slides along its normal.
    MoveFace(Face),
    /// The whole box follows the pointer.
    Translating,
    /// The box rotates about its center.
    Rotating,
    /// The box scales uniformly about its center.
    Scaling,
}

impl InteractionState {
    /// Numeric state: 0 outside, 1-6 face moves, 7 translating, 8 rotating, 9 scaling.
    pub fn index(self) -> i32 {
        match self {
            InteractionState::Outside => 0,
            InteractionState::MoveFace(face) => match face {
                Face::MinusX => 1,
                Face::PlusX => 2,
                Face::MinusY => 3,
                Face::PlusY => 4,
                Face::MinusZ => 5,
                Face::PlusZ => 6,
            },
            InteractionState::Translating => 7,
            InteractionState::Rotating => 8,
            InteractionState::Scaling => 9,
        }
    }

    /// State from a numeric value, clamped to the valid range.
    pub fn from_index(index: i32) -> Self {
        match index.clamp(0, 9) {
            0 => InteractionState::Outside,
            7 => InteractionState::Translating,
            8 => InteractionState::Rotating,
            9 => InteractionState::Scaling,
            i => usize::try_from(i - 1)
                .ok()
                .and_then(Face::from_index)
                .map_or(InteractionState::Outside, InteractionState::MoveFace),
        }
    }

    /// State entered when `handle` is picked.
    pub fn for_handle(handle: Handle) -> Self {
        match handle {
            Handle::Face(face) => InteractionState::MoveFace(face),
            Handle::Center => InteractionState::Translating,
        }
    }
}

/// Which parts of the representation are drawn highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Highlight {
    /// Highlighted handle.
    pub handle: Option<Handle>,
    /// Highlighted face.
    pub face: Option<Face>,
    /// Whether the outline is highlighted.
    pub outline: bool,
}

impl Highlight {
    /// Highlight for an interaction state and the handle picked last.
    pub fn for_state(state: InteractionState, current: Option<Handle>) -> Self {
        match state {
            InteractionState::MoveFace(face) => {
                let handle = current.unwrap_or(Handle::Face(face));
                let face = match handle {
                    Handle::Face(f) => Some(f),
                    Handle::Center => None,
                };
                Self {
                    handle: Some(handle),
                    face,
                    outline: false,
                }
            }
            InteractionState::Translating | InteractionState::Scaling => Self {
                handle: Some(Handle::Center),
                face: None,
                outline: true,
            },
            InteractionState::Rotating | InteractionState::Outside => Self::default(),
        }
    }

    /// Display color of a handle under this highlight.
    pub fn handle_color(&self, handle: Handle) -> DVec3 {
        if self.handle == Some(handle) {
            SELECTED_HANDLE_COLOR
        } else {
            handle.color()
        }
    }
}
