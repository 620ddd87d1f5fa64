//! Plays the test tone or an audio file and renders the Chladni plate live.
//!
//! Supports external triggers via SIGUSR1, which toggles playback.

use anyhow::Context;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::audio::{decode_file, CpalBackend, DecodedAudio, SourceRequest, FFT_SIZE_MENU};
use crate::config::ChladniConfig;
use crate::error::ChladniError;
use crate::playback::{AudioBackend, PlaybackSession, PlaybackState, StartOutcome};
use crate::ui::{ChladniTui, StatusLine, UiCommand};
use crate::visualization::{FrameLoop, FrameRenderer, ModalParams, Raster, SpectralSource};

/// Runs the visualizer until the user quits.
///
/// With `file`, the file is decoded first and played; otherwise the test tone
/// starts. `fft_size` overrides the configured analysis window.
///
/// # Errors
/// - If the configuration cannot be loaded or the override is invalid
/// - If the file cannot be decoded
/// - If the output device cannot be opened
/// - If the terminal cannot be driven
pub async fn handle_visualize(file: Option<PathBuf>, fft_size: Option<usize>) -> anyhow::Result<()> {
    tracing::info!("=== chladni visualizer started ===");

    let mut config = ChladniConfig::load()?;
    if let Some(size) = fft_size {
        config = config.with_fft_size(size)?;
    }
    tracing::info!(
        "Configuration loaded: device={}, fft_size={}, canvas={}x{}, frame_rate={}",
        config.audio.device,
        config.audio.fft_size,
        config.visual.canvas_width,
        config.visual.canvas_height,
        config.visual.frame_rate
    );

    let decoded = match &file {
        Some(path) => Some(Arc::new(
            decode_file(path)
                .await
                .with_context(|| format!("Cannot play {}", path.display()))?,
        )),
        None => None,
    };

    let backend = CpalBackend::new(&config.audio.device, config.mix_settings())?;
    let session = PlaybackSession::new(backend, config.analyser_config());
    let mut visualizer = Visualizer::new(session, &config, decoded);

    let sigusr1 = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&sigusr1))
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    let mut tui = ChladniTui::new()?;
    visualizer.start(visualizer.initial_request());

    let frame_interval = Duration::from_millis(config.visual.frame_interval_ms());
    let result = run_loop(&mut tui, &mut visualizer, &sigusr1, frame_interval);

    visualizer.shutdown();
    tui.cleanup()?;
    tracing::info!("Visualizer exited after {} frames", visualizer.frames_drawn());
    result
}

fn run_loop<B: AudioBackend>(
    tui: &mut ChladniTui,
    visualizer: &mut Visualizer<B>,
    sigusr1: &AtomicBool,
    frame_interval: Duration,
) -> anyhow::Result<()> {
    let mut clock = FrameClock::new(frame_interval, Instant::now());
    loop {
        let command = tui.handle_input(clock.remaining(Instant::now()))?;
        if !visualizer.apply(command) {
            return Ok(());
        }

        if sigusr1.swap(false, Ordering::Relaxed) {
            tracing::info!("Received SIGUSR1: toggling playback");
            visualizer.toggle();
        }

        if clock.take_due(Instant::now()) {
            visualizer.tick();
            tui.draw(visualizer.raster(), &visualizer.status(), visualizer.error())?;
        }
    }
}

/// Frame deadlines at a fixed interval, independent of how often input
/// wakes the loop.
struct FrameClock {
    interval: Duration,
    next: Instant,
}

impl FrameClock {
    /// The first frame is due immediately.
    fn new(interval: Duration, now: Instant) -> Self {
        Self { interval, next: now }
    }

    /// Time left until the next frame is due.
    fn remaining(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    /// Consumes the current deadline if it has passed.
    fn take_due(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next += self.interval;
        // Skip missed frames instead of bursting to catch up
        if self.next <= now {
            self.next = now + self.interval;
        }
        true
    }
}

/// Ties the playback session to the frame loop and the raster it paints.
pub struct Visualizer<B: AudioBackend> {
    session: PlaybackSession<B>,
    frame_loop: Option<FrameLoop>,
    frames_before: u64,
    raster: Raster,
    smoothing_factor: f64,
    tone_frequency_hz: f32,
    file: Option<Arc<DecodedAudio>>,
    last_params: Option<ModalParams>,
    error: Option<String>,
}

impl<B: AudioBackend> Visualizer<B> {
    pub fn new(session: PlaybackSession<B>, config: &ChladniConfig, file: Option<Arc<DecodedAudio>>) -> Self {
        Self {
            session,
            frame_loop: None,
            frames_before: 0,
            raster: Raster::new(config.visual.canvas_width, config.visual.canvas_height),
            smoothing_factor: config.visual.smoothing_factor,
            tone_frequency_hz: config.audio.tone_frequency_hz,
            file,
            last_params: None,
            error: None,
        }
    }

    /// The loaded file if there is one, else the test tone.
    pub fn initial_request(&self) -> SourceRequest {
        self.file
            .as_ref()
            .map_or_else(|| self.tone_request(), |audio| SourceRequest::Buffer(Arc::clone(audio)))
    }

    fn tone_request(&self) -> SourceRequest {
        SourceRequest::Tone {
            frequency_hz: self.tone_frequency_hz,
        }
    }

    /// Applies a UI command. Returns false when the user asked to quit.
    pub fn apply(&mut self, command: UiCommand) -> bool {
        if command != UiCommand::Continue {
            self.error = None;
        }

        match command {
            UiCommand::Continue => {}
            UiCommand::Quit => return false,
            UiCommand::StartTone => self.start(self.tone_request()),
            UiCommand::StartFile => match self.file.clone() {
                Some(audio) => self.start(SourceRequest::Buffer(audio)),
                None => self.error = Some("No file loaded. Use `chladni play <FILE>`.".to_string()),
            },
            UiCommand::Pause => {
                self.session.pause();
            }
            UiCommand::PreviousFftSize => self.step_fft_size(false),
            UiCommand::NextFftSize => self.step_fft_size(true),
        }
        true
    }

    /// Starts `request` and, when it actually starts, replaces the frame loop.
    pub fn start(&mut self, request: SourceRequest) {
        match self.session.start(request) {
            Ok(StartOutcome::Started) => self.restart_frames(),
            Ok(StartOutcome::AlreadyPlaying) => {}
            Err(e) => self.report(e),
        }
    }

    /// Pauses when playing, otherwise restarts the last source.
    pub fn toggle(&mut self) {
        let was_playing = self.session.is_playing();
        match self.session.toggle() {
            Ok(PlaybackState::Playing) if !was_playing => self.restart_frames(),
            Ok(_) => {}
            Err(e) => self.report(e),
        }
    }

    /// Notices finished sources and runs the frame loop once.
    pub fn tick(&mut self) {
        self.session.poll_ended();

        let playing = self.session.is_playing();
        let (Some(frame_loop), Some(analyser)) = (self.frame_loop.as_mut(), self.session.analyser_mut())
        else {
            return;
        };

        match frame_loop.tick(playing, analyser, &mut self.raster) {
            Ok(Some(summary)) => self.last_params = Some(summary.params),
            Ok(None) => {}
            Err(e) => {
                frame_loop.cancel();
                self.report(e);
            }
        }
    }

    /// Stops the frame loop and playback.
    pub fn shutdown(&mut self) {
        if let Some(frame_loop) = self.frame_loop.as_mut() {
            frame_loop.cancel();
        }
        self.session.pause();
    }

    pub fn status(&self) -> StatusLine {
        StatusLine {
            state: self.session.state(),
            source: self.session.current_source().map(ToString::to_string),
            params: self.last_params,
            fft_size: self.session.fft_size(),
            file_loaded: self.file.is_some(),
        }
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Frames drawn across every frame loop so far.
    pub fn frames_drawn(&self) -> u64 {
        self.frames_before + self.frame_loop.as_ref().map_or(0, FrameLoop::frames_drawn)
    }

    fn restart_frames(&mut self) {
        if let Some(mut prior) = self.frame_loop.take() {
            prior.cancel();
            self.frames_before += prior.frames_drawn();
        }

        let Some(bins) = self.session.analyser_mut().map(|a| a.frequency_bin_count()) else {
            return;
        };
        let renderer = FrameRenderer::new(bins, self.smoothing_factor);
        self.frame_loop = Some(FrameLoop::start(renderer));
        tracing::debug!("Frame loop started with {} bins", bins);
    }

    fn step_fft_size(&mut self, larger: bool) {
        let next = next_fft_size(self.session.fft_size(), larger);
        if let Err(e) = self.session.set_fft_size(next) {
            self.report(e);
        }
    }

    fn report(&mut self, error: ChladniError) {
        tracing::error!("{}", error);
        self.error = Some(error.to_string());
    }
}

/// Neighbouring window size in the menu, or `current` at either end.
fn next_fft_size(current: usize, larger: bool) -> usize {
    let found = if larger {
        FFT_SIZE_MENU.iter().copied().find(|&size| size > current)
    } else {
        FFT_SIZE_MENU.iter().rev().copied().find(|&size| size < current)
    };
    found.unwrap_or(current)
}
