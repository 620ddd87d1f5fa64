//! Configuration file editor command.
//!
//! Opens the chladni configuration file in the user's preferred editor, then
//! checks that the edited file still loads.

use std::process::Command;

use crate::config::ChladniConfig;

/// Opens the configuration file in the user's preferred editor.
///
/// Tries editors in this order:
/// 1. $EDITOR environment variable
/// 2. nano (most user-friendly fallback)
/// 3. vi (ultimate fallback, always available)
///
/// # Errors
/// - If no editor can be found or executed
pub fn handle_config() -> anyhow::Result<()> {
    crate::setup::ensure_config()?;
    let config_path = crate::config::config_path()?;

    tracing::info!("Opening config file: {}", config_path.display());

    let editor = find_editor()?;
    tracing::debug!("Using editor: {}", editor);

    let status = Command::new(&editor)
        .arg(&config_path)
        .status()
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to open editor '{editor}': {e}. Make sure the editor is installed and accessible."
            )
        })?;

    if !status.success() {
        return Err(anyhow::anyhow!(
            "Editor exited with error code: {}",
            status.code().unwrap_or(-1)
        ));
    }

    match ChladniConfig::load_from(&config_path) {
        Ok(_) => tracing::info!("Config file edited successfully"),
        Err(e) => {
            tracing::warn!("Edited config does not load: {e:#}");
            eprintln!("Warning: {e:#}");
        }
    }
    Ok(())
}

/// Editors tried when $EDITOR is unset, in order.
const FALLBACK_EDITORS: [&str; 2] = ["nano", "vi"];

fn find_editor() -> anyhow::Result<String> {
    choose_editor(std::env::var("EDITOR").ok(), is_editor_available).ok_or_else(|| {
        anyhow::anyhow!("No editor found. Please set the $EDITOR environment variable.")
    })
}

/// Picks $EDITOR when set, otherwise the first fallback that is installed.
fn choose_editor(env_editor: Option<String>, available: impl Fn(&str) -> bool) -> Option<String> {
    env_editor
        .filter(|editor| !editor.trim().is_empty())
        .or_else(|| {
            FALLBACK_EDITORS
                .into_iter()
                .find(|editor| available(editor))
                .map(str::to_string)
        })
}

/// Checks if an editor is available in the system PATH.
fn is_editor_available(editor: &str) -> bool {
    Command::new("which")
        .arg(editor)
        .output()
        .is_ok_and(|output| output.status.success())
}
