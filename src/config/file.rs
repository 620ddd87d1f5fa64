//! Configuration file management for chladni.
//!
//! Configuration is stored as TOML in the user's config directory. Every field
//! has a default, so a partial file (or an empty one) is valid.

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::audio::analyser::{validate_fft_size, AnalyserConfig};
use crate::audio::output::MixSettings;
use crate::error::ChladniError;

/// Audio output and analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `chladni list-devices`
    /// - device name from `chladni list-devices`
    pub device: String,
    /// Analysis window in samples
    pub fft_size: usize,
    pub tone_frequency_hz: f32,
    /// Gain on the analysed signal only
    pub analysis_gain: f32,
    /// Speaker level (0.0-1.0)
    pub volume: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
    pub smoothing_time_constant: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        let analyser = AnalyserConfig::default();
        let mix = MixSettings::default();
        Self {
            device: "default".to_string(),
            fft_size: analyser.fft_size,
            tone_frequency_hz: crate::audio::DEFAULT_TONE_HZ,
            analysis_gain: mix.analysis_gain,
            volume: mix.volume,
            min_decibels: analyser.min_decibels,
            max_decibels: analyser.max_decibels,
            smoothing_time_constant: analyser.smoothing_time_constant,
        }
    }
}

/// Canvas and animation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Weight of the current bin in the cross-bin smoothing pass
    pub smoothing_factor: f64,
    /// Target frames per second
    pub frame_rate: u32,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            canvas_width: 600,
            canvas_height: 1064,
            smoothing_factor: crate::visualization::smoothing::DEFAULT_SMOOTHING_FACTOR,
            frame_rate: 60,
        }
    }
}

impl VisualConfig {
    /// Milliseconds between frames at the configured rate.
    pub fn frame_interval_ms(&self) -> u64 {
        1000 / u64::from(self.frame_rate.max(1))
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChladniConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub visual: VisualConfig,
}

impl ChladniConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed or a value is out of range
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads and validates configuration from `path`.
    ///
    /// # Errors
    /// - If the file cannot be read
    /// - If the TOML is malformed or a value is out of range
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    /// - If the TOML is malformed or a value is out of range
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: ChladniConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    /// - `InvalidConfig` naming the first offending field
    pub fn validate(&self) -> Result<(), ChladniError> {
        self.analyser_config().validate()?;

        let visual = &self.visual;
        if !(visual.smoothing_factor > 0.0 && visual.smoothing_factor <= 1.0) {
            return Err(ChladniError::InvalidConfig(format!(
                "visual.smoothing_factor must be within (0, 1], got {}",
                visual.smoothing_factor
            )));
        }
        if visual.canvas_width == 0 || visual.canvas_height == 0 {
            return Err(ChladniError::InvalidConfig(
                "visual.canvas_width and visual.canvas_height must be nonzero".to_string(),
            ));
        }
        if visual.frame_rate == 0 {
            return Err(ChladniError::InvalidConfig(
                "visual.frame_rate must be nonzero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.audio.volume) {
            return Err(ChladniError::InvalidConfig(format!(
                "audio.volume must be within [0, 1], got {}",
                self.audio.volume
            )));
        }
        if !(self.audio.tone_frequency_hz > 0.0) {
            return Err(ChladniError::InvalidConfig(format!(
                "audio.tone_frequency_hz must be positive, got {}",
                self.audio.tone_frequency_hz
            )));
        }
        Ok(())
    }

    /// Returns a copy with the analysis window replaced, validated.
    ///
    /// # Errors
    /// - `InvalidConfig` if `fft_size` is not an accepted window size
    pub fn with_fft_size(mut self, fft_size: usize) -> Result<Self, ChladniError> {
        validate_fft_size(fft_size)?;
        self.audio.fft_size = fft_size;
        Ok(self)
    }

    pub fn analyser_config(&self) -> AnalyserConfig {
        AnalyserConfig {
            fft_size: self.audio.fft_size,
            min_decibels: self.audio.min_decibels,
            max_decibels: self.audio.max_decibels,
            smoothing_time_constant: self.audio.smoothing_time_constant,
        }
    }

    pub fn mix_settings(&self) -> MixSettings {
        MixSettings {
            volume: self.audio.volume,
            analysis_gain: self.audio.analysis_gain,
        }
    }
}

/// Retrieves the path to the config file, creating its directory.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn config_path() -> anyhow::Result<PathBuf> {
    let config_dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not find home directory"))?
        .join(".config")
        .join("chladni");
    fs::create_dir_all(&config_dir)?;
    Ok(config_dir.join("chladni.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = include_str!("../../environments/chladni.toml");

    #[test]
    fn test_template_matches_defaults() {
        let parsed = ChladniConfig::from_toml_str(TEMPLATE).unwrap();
        assert_eq!(parsed, ChladniConfig::default());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let parsed = ChladniConfig::from_toml_str("").unwrap();
        assert_eq!(parsed.audio.fft_size, 2048);
        assert_eq!(parsed.visual.canvas_width, 600);
        assert_eq!(parsed.visual.canvas_height, 1064);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let parsed = ChladniConfig::from_toml_str("[audio]\nfft_size = 4096\n").unwrap();
        assert_eq!(parsed.audio.fft_size, 4096);
        assert_eq!(parsed.audio.device, "default");
        assert_eq!(parsed.audio.volume, 0.5);
        assert_eq!(parsed.visual, VisualConfig::default());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(ChladniConfig::from_toml_str("[audio]\nfft_size = 3000\n").is_err());
        assert!(ChladniConfig::from_toml_str("[audio]\nvolume = 1.5\n").is_err());
        assert!(ChladniConfig::from_toml_str("[visual]\nsmoothing_factor = 0.0\n").is_err());
        assert!(ChladniConfig::from_toml_str("[visual]\nframe_rate = 0\n").is_err());
        assert!(ChladniConfig::from_toml_str("[visual]\ncanvas_width = 0\n").is_err());
    }

    #[test]
    fn test_with_fft_size() {
        let config = ChladniConfig::default().with_fft_size(8192).unwrap();
        assert_eq!(config.analyser_config().fft_size, 8192);
        assert!(ChladniConfig::default().with_fft_size(100).is_err());
    }

    #[test]
    fn test_frame_interval() {
        assert_eq!(VisualConfig::default().frame_interval_ms(), 16);
        let slow = VisualConfig {
            frame_rate: 10,
            ..VisualConfig::default()
        };
        assert_eq!(slow.frame_interval_ms(), 100);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("chladni_config_{}.toml", std::process::id()));
        fs::write(&path, "[visual]\nframe_rate = 30\n").unwrap();
        let loaded = ChladniConfig::load_from(&path);
        fs::remove_file(&path).ok();
        assert_eq!(loaded.unwrap().visual.frame_rate, 30);
    }
}
