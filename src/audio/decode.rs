//! Decoding audio files into mono sample buffers.
//!
//! PCM and float WAV files are read directly with hound. Anything else hound
//! cannot read (other containers, compressed WAV codecs, files too short to
//! hold a RIFF header) goes through ffmpeg into a temporary WAV first.

use hound::{SampleFormat, WavReader};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::ffmpeg::transcode_to_wav;

/// Fully decoded mono audio.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Display name, usually the file name
    pub name: String,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl DecodedAudio {
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate.max(1) as f32
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid WAV data: {0}")]
    Wav(#[from] hound::Error),

    #[error("unsupported audio file: {0}")]
    Transcode(String),

    #[error("{0} contains no audio samples")]
    Empty(String),

    #[error("decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Decodes `path` on the blocking thread pool.
///
/// # Errors
/// - See [`decode_file_blocking`]
/// - `Task` if the blocking task panics or is cancelled
pub async fn decode_file(path: &Path) -> Result<DecodedAudio, DecodeError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || decode_file_blocking(&path)).await?
}

/// Decodes `path` into mono samples.
///
/// # Errors
/// - `Io` if the file does not exist or cannot be read
/// - `Transcode` if hound cannot read the file and ffmpeg cannot convert it
/// - `Wav` if WAV data is corrupt
/// - `Empty` if the file holds no samples
pub fn decode_file_blocking(path: &Path) -> Result<DecodedAudio, DecodeError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let file = File::open(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let (sample_rate, samples) = match WavReader::new(BufReader::new(file)) {
        Ok(reader) => read_mono(reader)?,
        Err(hound::Error::FormatError(reason)) => {
            tracing::debug!("{} is not WAV ({reason}), transcoding with ffmpeg", path.display());
            decode_via_ffmpeg(path)?
        }
        Err(hound::Error::Unsupported) => {
            tracing::debug!("{} uses a WAV encoding hound cannot read, transcoding with ffmpeg", path.display());
            decode_via_ffmpeg(path)?
        }
        // The file opened, so a failed header read means it is too short for RIFF
        Err(hound::Error::IoError(e)) => {
            tracing::debug!("{} has no readable WAV header ({e}), transcoding with ffmpeg", path.display());
            decode_via_ffmpeg(path)?
        }
        Err(e) => return Err(e.into()),
    };

    if samples.is_empty() {
        return Err(DecodeError::Empty(name));
    }

    let decoded = DecodedAudio {
        name,
        sample_rate,
        samples,
    };
    tracing::info!(
        "Decoded {}: {:.2}s at {}Hz",
        decoded.name,
        decoded.duration_secs(),
        decoded.sample_rate
    );
    Ok(decoded)
}

fn decode_via_ffmpeg(path: &Path) -> Result<(u32, Vec<f32>), DecodeError> {
    let temp_wav = std::env::temp_dir().join(format!("chladni_{}.wav", std::process::id()));

    let result = transcode_to_wav(path, &temp_wav)
        .map_err(|e| DecodeError::Transcode(e.to_string()))
        .and_then(|()| read_mono(WavReader::open(&temp_wav)?));

    if let Err(e) = std::fs::remove_file(&temp_wav) {
        tracing::debug!("Failed to remove temp file: {}", e);
    }

    result
}

/// Reads every frame and averages the channels down to mono.
fn read_mono<R: Read>(reader: WavReader<R>) -> Result<(u32, Vec<f32>), DecodeError> {
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<_, _>>()?
        }
    };

    let mono = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok((spec.sample_rate, mono))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn temp_path(label: &str, ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!("chladni_test_{label}_{}.{ext}", std::process::id()))
    }

    #[tokio::test]
    async fn test_decodes_stereo_int_wav_to_mono() {
        let path = temp_path("stereo", "wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for (left, right) in [(16384i16, 0i16), (-32768, -32768), (8192, 8192)] {
            writer.write_sample(left).unwrap();
            writer.write_sample(right).unwrap();
        }
        writer.finalize().unwrap();

        let decoded = decode_file(&path).await.unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(decoded.sample_rate, 22050);
        assert_eq!(decoded.samples, vec![0.25, -1.0, 0.25]);
        assert!(decoded.name.starts_with("chladni_test_stereo"));
    }

    #[tokio::test]
    async fn test_decodes_float_wav() {
        let path = temp_path("float", "wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for s in [0.5f32, -0.25, 0.0] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let decoded = decode_file(&path).await.unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(decoded.samples, vec![0.5, -0.25, 0.0]);
        assert!((decoded.duration_secs() - 3.0 / 48000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_empty_wav_is_rejected() {
        let path = temp_path("empty", "wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        WavWriter::create(&path, spec).unwrap().finalize().unwrap();

        let result = decode_file(&path).await;
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(DecodeError::Empty(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let result = decode_file(&temp_path("missing", "wav")).await;
        assert!(matches!(result, Err(DecodeError::Io { .. })));
    }

    #[tokio::test]
    async fn test_garbage_is_not_played() {
        let path = temp_path("garbage", "mp3");
        std::fs::write(&path, b"definitely not audio").unwrap();

        let result = decode_file(&path).await;
        std::fs::remove_file(&path).ok();
        // Without ffmpeg this is a transcode error, with ffmpeg it fails to decode
        assert!(matches!(result, Err(DecodeError::Transcode(_))));
    }

    #[tokio::test]
    async fn test_truncated_file_goes_to_ffmpeg() {
        let path = temp_path("id3", "mp3");
        std::fs::write(&path, b"ID3").unwrap();

        let result = decode_file(&path).await;
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(DecodeError::Transcode(_))));
    }

    #[tokio::test]
    async fn test_mu_law_wav_goes_to_ffmpeg() {
        let data = [0xffu8, 0x80, 0x00, 0x7f, 0xff, 0x80, 0x00, 0x7f];
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&7u16.to_le_bytes()); // WAVE_FORMAT_MULAW
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&8000u32.to_le_bytes());
        bytes.extend_from_slice(&8000u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&8u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&data);

        let path = temp_path("mulaw", "wav");
        std::fs::write(&path, &bytes).unwrap();

        let result = decode_file(&path).await;
        std::fs::remove_file(&path).ok();
        // Decodes when ffmpeg is installed, otherwise reports the failed transcode
        match result {
            Ok(decoded) => assert_eq!(decoded.sample_rate, 8000),
            Err(e) => assert!(matches!(e, DecodeError::Transcode(_)), "unexpected error: {e}"),
        }
    }
}
