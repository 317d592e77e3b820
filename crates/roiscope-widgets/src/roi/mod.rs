//! The oriented ROI box and its interaction.

pub mod geometry;
pub mod interaction;
pub mod representation;
pub mod slice;
pub mod widget;

pub use geometry::BoxGeometry;
pub use interaction::{Face, Handle, Highlight, InteractionState};
pub use representation::{BoxManipulator, FacePlane};
pub use slice::BoxManipulator2D;
pub use widget::{Modifiers, PointerButton, RoiInteraction, RoiWidget};
