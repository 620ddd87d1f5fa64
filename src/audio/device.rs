//! Output device selection.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait};

/// Resolves an output device from a config value: `"default"`, a numeric
/// index as printed by `chladni list-devices`, or an exact device name.
///
/// # Errors
/// - If no default device exists, the index is out of range, or no device
///   carries the given name
pub fn find_output_device(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    if device_spec == "default" {
        return host
            .default_output_device()
            .ok_or_else(|| anyhow!("No audio output device available"));
    }

    let devices: Vec<cpal::Device> = host
        .output_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
        .collect();

    if let Ok(index) = device_spec.parse::<usize>() {
        let count = devices.len();
        return devices.into_iter().nth(index).ok_or_else(|| {
            anyhow!(
                "Device index {} is out of range (0-{})",
                index,
                count.saturating_sub(1)
            )
        });
    }

    devices
        .into_iter()
        .find(|d| d.name().is_ok_and(|name| name == device_spec))
        .ok_or_else(|| {
            anyhow!(
                "Audio output device '{device_spec}' not found. Use 'chladni list-devices' to see available devices."
            )
        })
}

/// Runs `f` with stderr pointed at /dev/null so ALSA's probing noise does not
/// land on the terminal.
#[cfg(target_os = "linux")]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let _silenced = StderrSilencer::new()?;
    f()
}

#[cfg(not(target_os = "linux"))]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

/// Restores the original stderr descriptor when dropped.
#[cfg(target_os = "linux")]
struct StderrSilencer {
    saved_fd: libc::c_int,
}

#[cfg(target_os = "linux")]
impl StderrSilencer {
    fn new() -> Result<Self> {
        use std::os::unix::io::AsRawFd;

        let dev_null = std::fs::OpenOptions::new()
            .write(true)
            .open("/dev/null")
            .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

        // SAFETY: plain descriptor duplication on valid fds owned by this process
        let saved_fd = unsafe { libc::dup(libc::STDERR_FILENO) };
        if saved_fd == -1 {
            return Err(anyhow!("Failed to duplicate stderr"));
        }
        if unsafe { libc::dup2(dev_null.as_raw_fd(), libc::STDERR_FILENO) } == -1 {
            unsafe { libc::close(saved_fd) };
            return Err(anyhow!("Failed to redirect stderr"));
        }

        Ok(Self { saved_fd })
    }
}

#[cfg(target_os = "linux")]
impl Drop for StderrSilencer {
    fn drop(&mut self) {
        // SAFETY: saved_fd was obtained from dup() in new()
        unsafe {
            libc::dup2(self.saved_fd, libc::STDERR_FILENO);
            libc::close(self.saved_fd);
        }
    }
}
