//! Error types shared by the visualization core and the playback session.

use thiserror::Error;

/// Errors raised by the visualization pipeline and playback session.
#[derive(Debug, Error)]
pub enum ChladniError {
    /// A configuration value is outside its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The analysis window yields too few bins for modal parameter extraction.
    #[error("analysis window of {fft_size} samples yields {bins} bins, at least {required} are needed")]
    WindowTooSmall {
        fft_size: usize,
        bins: usize,
        required: usize,
    },

    /// A spectral snapshot is too short to read the requested bin.
    #[error("spectral bin {index} is out of range for a snapshot of {len} bins")]
    BinOutOfRange { index: usize, len: usize },

    /// The audio backend failed to open or drive a source.
    #[error("audio backend error: {0}")]
    Backend(String),
}
