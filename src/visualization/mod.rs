//! Chladni plate visualization driven by spectral snapshots.
//!
//! Each frame smooths a byte spectrum, reads two fixed bins as the modal
//! parameters (m, n), evaluates the standing-wave field over a fixed grid and
//! paints it onto a [`Surface`].

pub mod field;
pub mod frame_loop;
pub mod modal;
pub mod renderer;
pub mod smoothing;
pub mod surface;

pub use frame_loop::FrameLoop;
pub use modal::{ModalParams, MIN_BIN_COUNT};
pub use renderer::{FrameRenderer, SpectralSource};
pub use surface::{Raster, Rgb, Surface};
