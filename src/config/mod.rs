//! Configuration management for chladni.
//!
//! Settings are loaded from a TOML file in the user's config directory. The
//! file is created from an embedded template on first run.

pub mod file;

pub use file::{config_path, AudioConfig, ChladniConfig, VisualConfig};
