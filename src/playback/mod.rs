//! Playback lifecycle shared by the CLI and the visualizer.

pub mod session;

pub use session::{AudioBackend, PlaybackSession, PlaybackState, SourceNode, StartOutcome};
