//! Application command handlers for chladni.
//!
//! # Commands
//! - `visualize`: play the test tone or a file and render the plate (default)
//! - `config`: open the configuration file in the user's preferred editor
//! - `list_devices`: list available audio output devices
//! - `logs`: display recent log entries

pub mod config;
pub mod list_devices;
pub mod logs;
pub mod visualize;

pub use config::handle_config;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use visualize::handle_visualize;
