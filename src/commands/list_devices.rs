//! List available audio output devices.

use anyhow::anyhow;
use cpal::traits::{DeviceTrait, HostTrait};

use crate::audio::device::suppress_alsa_warnings;

/// Lists all audio output devices with their index and default configuration.
///
/// # Errors
/// - If the audio host cannot enumerate devices
pub fn handle_list_devices() -> Result<(), anyhow::Error> {
    let (default_name, devices) = suppress_alsa_warnings(|| {
        let host = cpal::default_host();
        let devices: Vec<cpal::Device> = host
            .output_devices()
            .map_err(|e| anyhow!("Failed to enumerate audio devices: {e}"))?
            .filter(|d| d.name().is_ok())
            .collect();
        let default_name = host.default_output_device().and_then(|d| d.name().ok());
        Ok((default_name, devices))
    })?;

    if devices.is_empty() {
        println!("No audio output devices found on this system.");
        return Ok(());
    }

    println!("Available audio output devices:");
    println!();

    for (index, device) in devices.iter().enumerate() {
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let is_default = default_name.as_deref() == Some(name.as_str());

        let config_info = match device.default_output_config() {
            Ok(config) => describe_config(config.sample_rate().0, config.channels()),
            Err(_) => "configuration unavailable".to_string(),
        };

        println!("  ID: {index}");
        println!("    Name: {}{}", name, if is_default { " [DEFAULT]" } else { "" });
        println!("    Config: {config_info}");
        println!();
    }

    println!("Set [audio] device in the config file to an ID or name.");
    Ok(())
}

fn describe_config(sample_rate: u32, channels: u16) -> String {
    let layout = match channels {
        1 => "mono".to_string(),
        2 => "stereo".to_string(),
        n => format!("{n} channels"),
    };
    format!("{sample_rate}Hz, {layout}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_config() {
        assert_eq!(describe_config(48000, 2), "48000Hz, stereo");
        assert_eq!(describe_config(44100, 1), "44100Hz, mono");
        assert_eq!(describe_config(96000, 6), "96000Hz, 6 channels");
    }
}
