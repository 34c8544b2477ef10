//! Mock peripheral implementations for testing and development.
//!
//! Each mock is created together with a cloneable handle that observes what
//! the controller did to it, so the mock itself can be moved into the
//! controller.

pub mod display;
pub mod door;
pub mod sounder;

// Re-export commonly used types
pub use display::{DisplayCall, MockDisplay, MockDisplayHandle};
pub use door::{MockDoorPanel, MockDoorPanelHandle};
pub use sounder::{MockSounder, MockSounderHandle};
