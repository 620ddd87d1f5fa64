//! Signal generators feeding the output stream: a sine test tone and a
//! one-shot player for decoded audio.

use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;

use super::decode::DecodedAudio;

/// Frequency of the built-in test tone.
pub const DEFAULT_TONE_HZ: f32 = 440.0;

/// What to connect to the output.
#[derive(Clone)]
pub enum SourceRequest {
    Tone { frequency_hz: f32 },
    Buffer(Arc<DecodedAudio>),
}

impl SourceRequest {
    /// Builds the generator for a device running at `sample_rate`.
    pub fn generator(&self, sample_rate: u32) -> Box<dyn SignalGenerator> {
        match self {
            Self::Tone { frequency_hz } => Box::new(Oscillator::new(*frequency_hz, sample_rate)),
            Self::Buffer(audio) => Box::new(BufferPlayer::new(Arc::clone(audio), sample_rate)),
        }
    }
}

impl fmt::Display for SourceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tone { frequency_hz } => write!(f, "test tone {frequency_hz}Hz"),
            Self::Buffer(audio) => write!(f, "{}", audio.name),
        }
    }
}

impl fmt::Debug for SourceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceRequest({self})")
    }
}

/// Mono sample producer pulled by the audio callback.
pub trait SignalGenerator: Send {
    /// Next sample, or `None` once the signal has ended.
    fn next_sample(&mut self) -> Option<f32>;
}

/// Phase-accumulating sine oscillator.
pub struct Oscillator {
    phase: f64,
    step: f64,
}

impl Oscillator {
    pub fn new(frequency_hz: f32, sample_rate: u32) -> Self {
        Self {
            phase: 0.0,
            step: f64::from(frequency_hz) / f64::from(sample_rate.max(1)),
        }
    }
}

impl SignalGenerator for Oscillator {
    fn next_sample(&mut self) -> Option<f32> {
        let sample = (TAU * self.phase).sin() as f32;
        self.phase = (self.phase + self.step).fract();
        Some(sample)
    }
}

/// Plays a decoded buffer once, resampled linearly to the device rate.
pub struct BufferPlayer {
    audio: Arc<DecodedAudio>,
    position: f64,
    step: f64,
}

impl BufferPlayer {
    pub fn new(audio: Arc<DecodedAudio>, sample_rate: u32) -> Self {
        let step = f64::from(audio.sample_rate) / f64::from(sample_rate.max(1));
        Self {
            audio,
            position: 0.0,
            step,
        }
    }
}

impl SignalGenerator for BufferPlayer {
    fn next_sample(&mut self) -> Option<f32> {
        let samples = &self.audio.samples;
        let index = self.position as usize;
        let current = *samples.get(index)?;
        let next = samples.get(index + 1).copied().unwrap_or(current);
        let frac = (self.position - index as f64) as f32;

        self.position += self.step;
        Some(current + (next - current) * frac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(samples: Vec<f32>, sample_rate: u32) -> Arc<DecodedAudio> {
        Arc::new(DecodedAudio {
            name: "clip.wav".to_string(),
            sample_rate,
            samples,
        })
    }

    #[test]
    fn test_oscillator_period() {
        // 1 kHz at 8 kHz: period of 8 samples
        let mut osc = Oscillator::new(1000.0, 8000);
        let first: Vec<f32> = (0..8).map(|_| osc.next_sample().unwrap()).collect();
        let second: Vec<f32> = (0..8).map(|_| osc.next_sample().unwrap()).collect();

        assert!(first[0].abs() < 1e-6);
        assert!((first[2] - 1.0).abs() < 1e-6);
        assert!((first[6] + 1.0).abs() < 1e-6);
        for (a, b) in first.iter().zip(&second) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_buffer_player_ends() {
        let mut player = BufferPlayer::new(decoded(vec![0.1, 0.2, 0.3], 48000), 48000);
        assert_eq!(player.next_sample(), Some(0.1));
        assert_eq!(player.next_sample(), Some(0.2));
        assert_eq!(player.next_sample(), Some(0.3));
        assert_eq!(player.next_sample(), None);
    }

    #[test]
    fn test_buffer_player_upsamples() {
        let mut player = BufferPlayer::new(decoded(vec![0.0, 1.0], 24000), 48000);
        let out: Vec<f32> = std::iter::from_fn(|| player.next_sample()).collect();
        assert_eq!(out, vec![0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_request_labels() {
        let tone = SourceRequest::Tone { frequency_hz: 440.0 };
        assert_eq!(tone.to_string(), "test tone 440Hz");
        let file = SourceRequest::Buffer(decoded(vec![0.0], 44100));
        assert_eq!(file.to_string(), "clip.wav");
    }
}
