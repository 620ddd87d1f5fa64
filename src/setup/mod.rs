//! First-run setup: writes the default configuration file when none exists.

use std::path::Path;

/// Embedded default configuration template.
const DEFAULT_CONFIG: &str = include_str!("../../environments/chladni.toml");

/// Writes the default config to the user's config directory unless a config
/// file is already present.
///
/// Returns true if a new file was written.
///
/// # Errors
/// Returns an error if the config directory or file cannot be created.
pub fn ensure_config() -> anyhow::Result<bool> {
    let config_path = crate::config::config_path()?;
    write_default_config(&config_path)
}

fn write_default_config(path: &Path) -> anyhow::Result<bool> {
    if path.exists() {
        tracing::debug!("Config file present at {}", path.display());
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG)?;
    tracing::info!("Wrote default configuration to {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_template_once() {
        let dir = std::env::temp_dir().join(format!("chladni_setup_{}", std::process::id()));
        let path = dir.join("chladni.toml");
        std::fs::remove_dir_all(&dir).ok();

        assert!(write_default_config(&path).unwrap());
        std::fs::write(&path, "[visual]\nframe_rate = 24\n").unwrap();
        assert!(!write_default_config(&path).unwrap());

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_dir_all(&dir).ok();
        assert!(content.contains("frame_rate = 24"));
    }

    #[test]
    fn test_template_is_valid_config() {
        assert!(crate::config::ChladniConfig::from_toml_str(DEFAULT_CONFIG).is_ok());
    }
}
