//! Real-time spectrum analysis producing byte magnitudes per frequency bin.
//!
//! The audio callback pushes samples into a [`SampleTap`]; the UI thread
//! reads them through [`SpectrumAnalyser`], which windows, transforms and
//! maps the latest block onto a 0-255 decibel scale.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::ChladniError;
use crate::visualization::SpectralSource;

/// Smallest analysis window accepted.
pub const MIN_FFT_SIZE: usize = 32;
/// Largest analysis window accepted.
pub const MAX_FFT_SIZE: usize = 32768;

/// Analysis window sizes offered for interactive selection.
pub const FFT_SIZE_MENU: [usize; 8] = [256, 512, 1024, 2048, 4096, 8192, 16384, 32768];

/// Analysis parameters. Decibel bounds define the range mapped onto 0-255.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyserConfig {
    pub fft_size: usize,
    pub min_decibels: f32,
    pub max_decibels: f32,
    /// Weight of the previous magnitude in the per-bin temporal average
    pub smoothing_time_constant: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            min_decibels: -100.0,
            max_decibels: -30.0,
            smoothing_time_constant: 0.8,
        }
    }
}

impl AnalyserConfig {
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate analysis parameters.
    ///
    /// # Errors
    /// - If the window is not a power of two within [32, 32768]
    /// - If the decibel range is empty
    /// - If the smoothing constant is outside [0, 1]
    pub fn validate(&self) -> Result<(), ChladniError> {
        validate_fft_size(self.fft_size)?;
        if self.min_decibels >= self.max_decibels {
            return Err(ChladniError::InvalidConfig(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        if !(0.0..=1.0).contains(&self.smoothing_time_constant) {
            return Err(ChladniError::InvalidConfig(format!(
                "smoothing_time_constant must be within [0, 1], got {}",
                self.smoothing_time_constant
            )));
        }
        Ok(())
    }
}

/// Checks that `fft_size` is a power of two within the accepted bounds.
pub fn validate_fft_size(fft_size: usize) -> Result<(), ChladniError> {
    if !fft_size.is_power_of_two() || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&fft_size) {
        return Err(ChladniError::InvalidConfig(format!(
            "fft_size must be a power of two between {MIN_FFT_SIZE} and {MAX_FFT_SIZE}, got {fft_size}"
        )));
    }
    Ok(())
}

/// Bounded buffer of the most recent time-domain samples.
///
/// Cloning shares the underlying buffer, so one clone lives in the audio
/// callback and another in the analyser.
#[derive(Debug, Clone)]
pub struct SampleTap {
    samples: Arc<Mutex<VecDeque<f32>>>,
    capacity: usize,
}

impl SampleTap {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<f32>> {
        // A panicking audio callback must not take the visualizer down with it
        self.samples.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends samples, discarding the oldest beyond capacity.
    pub fn push(&self, block: &[f32]) {
        let tail = &block[block.len().saturating_sub(self.capacity)..];
        let mut samples = self.lock();
        let overflow = (samples.len() + tail.len()).saturating_sub(self.capacity);
        let len = samples.len();
        samples.drain(..overflow.min(len));
        samples.extend(tail.iter().copied());
    }

    /// Copies the latest `out.len()` samples into `out`, zero-padding the
    /// front when fewer are available.
    pub fn copy_latest(&self, out: &mut [f32]) {
        let samples = self.lock();
        let available = samples.len().min(out.len());
        let pad = out.len() - available;
        out[..pad].fill(0.0);
        for (dst, src) in out[pad..]
            .iter_mut()
            .zip(samples.iter().skip(samples.len() - available))
        {
            *dst = *src;
        }
    }
}

/// Stateful analyser with a cached FFT plan and per-bin temporal smoothing.
pub struct SpectrumAnalyser {
    config: AnalyserConfig,
    tap: SampleTap,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    time_domain: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

impl SpectrumAnalyser {
    /// Creates an analyser and the tap that feeds it.
    ///
    /// # Errors
    /// - If `config` fails validation
    pub fn new(config: AnalyserConfig) -> Result<Self, ChladniError> {
        config.validate()?;

        let size = config.fft_size;
        let fft = FftPlanner::new().plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Ok(Self {
            config,
            tap: SampleTap::new(size),
            fft,
            window: blackman_window(size),
            time_domain: vec![0.0; size],
            buffer: vec![Complex::new(0.0, 0.0); size],
            scratch,
            magnitudes: vec![0.0; size / 2],
        })
    }

    /// Handle for the producer side.
    pub fn tap(&self) -> SampleTap {
        self.tap.clone()
    }

    /// Transforms the latest block and updates the smoothed magnitudes.
    fn analyse(&mut self) {
        self.tap.copy_latest(&mut self.time_domain);

        for ((slot, &sample), &w) in self
            .buffer
            .iter_mut()
            .zip(&self.time_domain)
            .zip(&self.window)
        {
            *slot = Complex::new(sample * w, 0.0);
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let tau = self.config.smoothing_time_constant;
        let scale = 1.0 / self.config.fft_size as f32;
        for (previous, bin) in self.magnitudes.iter_mut().zip(&self.buffer) {
            let current = bin.norm() * scale;
            let blended = tau * *previous + (1.0 - tau) * current;
            *previous = if blended.is_finite() { blended } else { 0.0 };
        }
    }

    fn to_byte(&self, magnitude: f32) -> u8 {
        let db = 20.0 * magnitude.log10();
        let range = self.config.max_decibels - self.config.min_decibels;
        let scaled = (255.0 / range) * (db - self.config.min_decibels);
        if scaled.is_nan() {
            return 0;
        }
        scaled.floor().clamp(0.0, 255.0) as u8
    }
}

impl SpectralSource for SpectrumAnalyser {
    fn frequency_bin_count(&self) -> usize {
        self.config.frequency_bin_count()
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.analyse();
        for (dst, &magnitude) in out.iter_mut().zip(&self.magnitudes) {
            *dst = self.to_byte(magnitude);
        }
    }
}

/// Blackman window with alpha = 0.16.
fn blackman_window(size: usize) -> Vec<f32> {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    let n = size as f32;
    (0..size)
        .map(|i| {
            let phase = 2.0 * PI * i as f32 / n;
            A0 - A1 * phase.cos() + A2 * (2.0 * phase).cos()
        })
        .collect()
}
