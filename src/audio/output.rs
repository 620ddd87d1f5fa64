//! cpal output backend.
//!
//! Each connected source gets its own output stream. The stream callback pulls
//! the source's generator, writes the volume-scaled signal to every channel of
//! the device and pushes the gain-scaled signal into the analysis tap.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::analyser::SampleTap;
use super::device::{find_output_device, suppress_alsa_warnings};
use super::source::{SignalGenerator, SourceRequest};
use crate::error::ChladniError;
use crate::playback::{AudioBackend, SourceNode};

/// Levels applied in the stream callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixSettings {
    /// Output level, applied before clipping to [-1, 1]
    pub volume: f32,
    /// Gain on the signal routed to the analyser only
    pub analysis_gain: f32,
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            volume: 0.5,
            analysis_gain: 20.0,
        }
    }
}

impl MixSettings {
    /// Computes the speaker sample and the analysis sample for one input sample.
    pub fn split(&self, sample: f32) -> (f32, f32) {
        ((sample * self.volume).clamp(-1.0, 1.0), sample * self.analysis_gain)
    }
}

pub struct CpalBackend {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
    mix: MixSettings,
}

impl CpalBackend {
    /// Opens the output device named by `device_spec`.
    ///
    /// # Errors
    /// - If the device cannot be found
    /// - If the device reports no usable output configuration
    pub fn new(device_spec: &str, mix: MixSettings) -> Result<Self> {
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();
            find_output_device(&host, device_spec)
        })?;

        let config = device
            .default_output_config()
            .map_err(|e| anyhow!("Failed to query output configuration: {e}"))?;

        let name = device.name().unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!(
            "Output device: {} ({}Hz, {} channels, {:?})",
            name,
            config.sample_rate().0,
            config.channels(),
            config.sample_format()
        );

        Ok(Self { device, config, mix })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate().0
    }

    fn build_stream<T>(
        &self,
        generator: Box<dyn SignalGenerator>,
        tap: SampleTap,
        ended: Arc<AtomicBool>,
    ) -> Result<cpal::Stream, cpal::BuildStreamError>
    where
        T: SizedSample + FromSample<f32>,
    {
        let stream_config: cpal::StreamConfig = self.config.clone().into();
        let channels = usize::from(stream_config.channels.max(1));
        let mix = self.mix;
        let mut generator = generator;
        let mut analysis: Vec<f32> = Vec::new();

        self.device.build_output_stream(
            &stream_config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                analysis.clear();
                for frame in data.chunks_mut(channels) {
                    let sample = generator.next_sample().unwrap_or_else(|| {
                        ended.store(true, Ordering::Relaxed);
                        0.0
                    });
                    let (out, analysed) = mix.split(sample);
                    analysis.push(analysed);
                    let value = T::from_sample(out);
                    for slot in frame.iter_mut() {
                        *slot = value;
                    }
                }
                tap.push(&analysis);
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )
    }
}

impl AudioBackend for CpalBackend {
    type Node = CpalNode;

    fn connect(&mut self, request: &SourceRequest, tap: SampleTap) -> Result<CpalNode, ChladniError> {
        let generator = request.generator(self.sample_rate());
        let ended = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ended);

        let stream = match self.config.sample_format() {
            cpal::SampleFormat::F32 => self.build_stream::<f32>(generator, tap, flag),
            cpal::SampleFormat::I16 => self.build_stream::<i16>(generator, tap, flag),
            cpal::SampleFormat::U16 => self.build_stream::<u16>(generator, tap, flag),
            cpal::SampleFormat::I32 => self.build_stream::<i32>(generator, tap, flag),
            other => {
                return Err(ChladniError::Backend(format!(
                    "unsupported output sample format {other:?}"
                )))
            }
        }
        .map_err(|e| ChladniError::Backend(format!("failed to build output stream: {e}")))?;

        stream
            .play()
            .map_err(|e| ChladniError::Backend(format!("failed to start output stream: {e}")))?;
        tracing::debug!("Output stream started for {}", request);

        Ok(CpalNode {
            stream: Some(stream),
            ended,
        })
    }
}

/// A source playing through its own output stream.
pub struct CpalNode {
    stream: Option<cpal::Stream>,
    ended: Arc<AtomicBool>,
}

impl SourceNode for CpalNode {
    fn stop(&mut self) {
        pause_or_close(&mut self.stream, |stream| stream.pause());
    }

    fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Output stream closed");
        }
    }

    fn has_ended(&self) -> bool {
        self.ended.load(Ordering::Relaxed)
    }
}

/// Pauses the stream in `slot`, dropping it when pausing fails so it cannot
/// keep sounding.
fn pause_or_close<S, E: std::fmt::Display>(
    slot: &mut Option<S>,
    pause: impl FnOnce(&S) -> Result<(), E>,
) {
    let Some(stream) = slot.as_ref() else {
        return;
    };
    if let Err(e) = pause(stream) {
        tracing::warn!("Failed to pause output stream, closing it: {}", e);
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_scales_and_clips_output() {
        let mix = MixSettings::default();
        assert_eq!(mix.split(0.5), (0.25, 10.0));
        assert_eq!(mix.split(-4.0), (-1.0, -80.0));
    }

    #[test]
    fn test_split_with_full_volume() {
        let mix = MixSettings {
            volume: 1.0,
            analysis_gain: 1.0,
        };
        assert_eq!(mix.split(1.5), (1.0, 1.5));
        assert_eq!(mix.split(-0.3), (-0.3, -0.3));
    }

    #[test]
    fn test_failed_pause_closes_stream() {
        let mut slot = Some("stream");
        pause_or_close(&mut slot, |_| Ok::<(), String>(()));
        assert_eq!(slot, Some("stream"));

        pause_or_close(&mut slot, |_| Err("device busy".to_string()));
        assert_eq!(slot, None);

        pause_or_close(&mut slot, |_| -> Result<(), String> { panic!("nothing to pause") });
    }

    #[test]
    fn test_disconnected_node_reports_end_flag() {
        let ended = Arc::new(AtomicBool::new(false));
        let mut node = CpalNode {
            stream: None,
            ended: Arc::clone(&ended),
        };
        node.stop();
        node.disconnect();
        assert!(!node.has_ended());
        ended.store(true, Ordering::Relaxed);
        assert!(node.has_ended());
    }
}
