//! Terminal user interface: the plate view, footer, key handling and error
//! overlay.

pub mod error;
pub mod visualizer;

pub use visualizer::{ChladniTui, StatusLine, UiCommand};
