//! Audio-reactive Chladni plate patterns rendered in the terminal.
//!
//! The [`visualization`] core turns byte spectra into painted frames, the
//! [`audio`] and [`playback`] layers produce and analyse sound, and the
//! remaining modules make up the `chladni` command-line application.

pub mod app;
pub mod audio;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod playback;
pub mod setup;
pub mod ui;
pub mod visualization;
