//! FFmpeg discovery and transcoding of arbitrary audio files to PCM WAV.
//!
//! Checks standard installation locations before falling back to a PATH search,
//! so ffmpeg is found even from launchers with a minimal PATH.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

#[cfg(target_os = "macos")]
const CANDIDATES: &[&str] = &[
    "/opt/homebrew/bin/ffmpeg",
    "/usr/local/bin/ffmpeg",
    "/usr/bin/ffmpeg",
];

#[cfg(target_os = "linux")]
const CANDIDATES: &[&str] = &["/usr/bin/ffmpeg", "/usr/local/bin/ffmpeg", "/snap/bin/ffmpeg"];

#[cfg(target_os = "windows")]
const CANDIDATES: &[&str] = &[
    "C:\\ffmpeg\\bin\\ffmpeg.exe",
    "C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const CANDIDATES: &[&str] = &[];

/// Locates the ffmpeg binary.
///
/// # Errors
/// - If ffmpeg is neither in a known location nor on PATH
pub fn find_ffmpeg() -> Result<PathBuf> {
    if let Some(path) = CANDIDATES.iter().map(PathBuf::from).find(|p| p.exists()) {
        tracing::debug!("Found ffmpeg at: {}", path.display());
        return Ok(path);
    }

    let lookup = if cfg!(target_os = "windows") { "where" } else { "which" };
    let output = Command::new(lookup)
        .arg("ffmpeg")
        .output()
        .map_err(|e| anyhow!("Failed to search PATH for ffmpeg: {e}"))?;

    let found = String::from_utf8_lossy(&output.stdout);
    let first = found.lines().next().unwrap_or("").trim();
    if output.status.success() && !first.is_empty() {
        tracing::debug!("Found ffmpeg in PATH at: {first}");
        return Ok(PathBuf::from(first));
    }

    Err(anyhow!(
        "ffmpeg not found; it is required to play non-WAV files.\n\
         macOS: brew install ffmpeg\n\
         Linux: apt install ffmpeg (Debian/Ubuntu) or dnf install ffmpeg (Fedora)"
    ))
}

/// Converts `input` into a mono 16-bit PCM WAV at `output`, keeping the
/// source sample rate.
///
/// # Errors
/// - If ffmpeg cannot be found or started
/// - If ffmpeg reports a failure (unsupported or corrupt input)
pub fn transcode_to_wav(input: &Path, output: &Path) -> Result<()> {
    let ffmpeg = find_ffmpeg()?;

    let result = Command::new(&ffmpeg)
        .args(["-loglevel", "error", "-i"])
        .arg(input)
        .args(["-vn", "-ac", "1", "-acodec", "pcm_s16le", "-f", "wav", "-y"])
        .arg(output)
        .output()
        .map_err(|e| anyhow!("Failed to run ffmpeg: {e}"))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        tracing::error!("ffmpeg could not decode {}: {}", input.display(), stderr.trim());
        return Err(anyhow!("ffmpeg could not decode the file: {}", stderr.trim()));
    }

    tracing::debug!("Transcoded {} to {}", input.display(), output.display());
    Ok(())
}
