//! Playback session: the Stopped/Playing state machine, the active source
//! node and the analyser that observes it.
//!
//! The session is owned by the UI thread and passed explicitly to whatever
//! needs it; there is no process-wide audio state.

use std::fmt;

use crate::audio::analyser::{validate_fft_size, AnalyserConfig, SampleTap, SpectrumAnalyser};
use crate::audio::source::SourceRequest;
use crate::error::ChladniError;
use crate::visualization::MIN_BIN_COUNT;

/// A connected signal source in the audio graph.
pub trait SourceNode {
    /// Silences the source. The node stays connected until [`disconnect`](Self::disconnect).
    fn stop(&mut self);
    /// Removes the node from the audio graph, releasing its resources.
    fn disconnect(&mut self);
    /// Whether a finite source has played to its end.
    fn has_ended(&self) -> bool;
}

/// Creates source nodes routed to the output and to an analysis tap.
pub trait AudioBackend {
    type Node: SourceNode;

    fn connect(&mut self, request: &SourceRequest, tap: SampleTap) -> Result<Self::Node, ChladniError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Playing => write!(f, "playing"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new source was connected and playback began
    Started,
    /// Playback was already running; nothing changed
    AlreadyPlaying,
}

pub struct PlaybackSession<B: AudioBackend> {
    backend: B,
    analyser_config: AnalyserConfig,
    state: PlaybackState,
    node: Option<B::Node>,
    analyser: Option<SpectrumAnalyser>,
    last_request: Option<SourceRequest>,
}

impl<B: AudioBackend> PlaybackSession<B> {
    pub fn new(backend: B, analyser_config: AnalyserConfig) -> Self {
        Self {
            backend,
            analyser_config,
            state: PlaybackState::Stopped,
            node: None,
            analyser: None,
            last_request: None,
        }
    }

    /// Starts `request` unless something is already playing.
    ///
    /// A node left over from an earlier, paused source is stopped and
    /// disconnected before the new one is connected, and a fresh analyser is
    /// built from the current analysis window size.
    ///
    /// # Errors
    /// - `WindowTooSmall` if the analysis window yields fewer than 201 bins
    /// - `InvalidConfig` if the analyser configuration is invalid
    /// - Backend errors from connecting the source
    pub fn start(&mut self, request: SourceRequest) -> Result<StartOutcome, ChladniError> {
        if self.state == PlaybackState::Playing {
            tracing::info!("Ignoring start of {request}: {} is already playing", self.source_label());
            return Ok(StartOutcome::AlreadyPlaying);
        }

        let bins = self.analyser_config.frequency_bin_count();
        if bins < MIN_BIN_COUNT {
            return Err(ChladniError::WindowTooSmall {
                fft_size: self.analyser_config.fft_size,
                bins,
                required: MIN_BIN_COUNT,
            });
        }

        if let Some(mut prior) = self.node.take() {
            prior.stop();
            prior.disconnect();
            tracing::debug!("Disconnected previous source");
        }
        self.analyser = None;

        let analyser = SpectrumAnalyser::new(self.analyser_config)?;
        let node = self.backend.connect(&request, analyser.tap())?;

        tracing::info!(
            "Started {} (analysis window {}, {} bins)",
            request,
            self.analyser_config.fft_size,
            bins
        );

        self.node = Some(node);
        self.analyser = Some(analyser);
        self.last_request = Some(request);
        self.state = PlaybackState::Playing;
        Ok(StartOutcome::Started)
    }

    /// Stops the active source. Returns false when already stopped.
    pub fn pause(&mut self) -> bool {
        if self.state == PlaybackState::Stopped {
            tracing::debug!("Pause requested while stopped");
            return false;
        }

        if let Some(node) = self.node.as_mut() {
            node.stop();
        }
        self.state = PlaybackState::Stopped;
        tracing::info!("Audio stopped");
        true
    }

    /// Pauses when playing, otherwise restarts the most recent source.
    ///
    /// # Errors
    /// - Same as [`start`](Self::start)
    pub fn toggle(&mut self) -> Result<PlaybackState, ChladniError> {
        match (self.state, self.last_request.clone()) {
            (PlaybackState::Playing, _) => {
                self.pause();
            }
            (PlaybackState::Stopped, Some(request)) => {
                self.start(request)?;
            }
            (PlaybackState::Stopped, None) => {
                tracing::debug!("Nothing to resume");
            }
        }
        Ok(self.state)
    }

    /// Stops the node and moves to Stopped once a finite source has played
    /// out.
    ///
    /// Returns true on that transition.
    pub fn poll_ended(&mut self) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        let Some(node) = self.node.as_mut().filter(|node| node.has_ended()) else {
            return false;
        };

        node.stop();
        tracing::info!("{} finished", self.source_label());
        self.state = PlaybackState::Stopped;
        true
    }

    /// Changes the analysis window used by the next [`start`](Self::start).
    ///
    /// # Errors
    /// - `InvalidConfig` if `fft_size` is not an accepted window size
    pub fn set_fft_size(&mut self, fft_size: usize) -> Result<(), ChladniError> {
        validate_fft_size(fft_size)?;
        self.analyser_config.fft_size = fft_size;
        tracing::debug!("Analysis window set to {fft_size}, applies to the next source");
        Ok(())
    }

    pub fn fft_size(&self) -> usize {
        self.analyser_config.fft_size
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Analyser for the most recently started source.
    pub fn analyser_mut(&mut self) -> Option<&mut SpectrumAnalyser> {
        self.analyser.as_mut()
    }

    pub fn current_source(&self) -> Option<&SourceRequest> {
        self.last_request.as_ref()
    }

    fn source_label(&self) -> String {
        self.last_request
            .as_ref()
            .map_or_else(|| "nothing".to_string(), ToString::to_string)
    }
}
