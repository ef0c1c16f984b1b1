//! Configuration file editor command.

use anyhow::anyhow;
use std::process::Command;

use crate::config::{self, SpectroConfig};

/// Opens spectro.toml in the user's editor, then re-validates it.
///
/// Tries $EDITOR, then nano, then vi. The file is created with defaults first
/// if it does not exist yet.
///
/// # Errors
/// - If the config file cannot be created
/// - If no editor can be found or it exits unsuccessfully
pub fn handle_config() -> anyhow::Result<()> {
    let config_path = config::get_config_path()?;
    if !config_path.exists() {
        SpectroConfig::default().save_to(&config_path)?;
    }
    tracing::info!("Opening config file: {}", config_path.display());

    let editor = find_editor()?;
    tracing::debug!("Using editor: {}", editor);

    let status = Command::new(&editor)
        .arg(&config_path)
        .status()
        .map_err(|e| anyhow!("Failed to open editor '{editor}': {e}"))?;

    if !status.success() {
        return Err(anyhow!(
            "Editor exited with error code: {}",
            status.code().unwrap_or(-1)
        ));
    }

    match SpectroConfig::load_from(&config_path) {
        Ok(_) => tracing::info!("Config file edited successfully"),
        Err(e) => {
            tracing::warn!("Edited config does not validate: {e}");
            eprintln!("Warning: {e}");
        }
    }
    Ok(())
}

fn find_editor() -> anyhow::Result<String> {
    if let Ok(editor) = std::env::var("EDITOR") {
        if !editor.is_empty() {
            return Ok(editor);
        }
    }

    ["nano", "vi"]
        .into_iter()
        .find(|editor| is_editor_available(editor))
        .map(str::to_string)
        .ok_or_else(|| anyhow!("No editor found. Please set the $EDITOR environment variable."))
}

fn is_editor_available(editor: &str) -> bool {
    Command::new("which")
        .arg(editor)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
