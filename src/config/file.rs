//! Configuration file management for spectro.
//!
//! The file lives at `~/.config/spectro/spectro.toml` and is created with
//! defaults the first time spectro runs.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::AnalyserSettings;

/// Audio input and analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `spectro list-devices`
    /// - device name from `spectro list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Weight of the previous spectrum when smoothing (0.0 disables smoothing)
    #[serde(default)]
    pub smoothing_time_constant: f32,
    /// Level in dB drawn as black
    #[serde(default = "default_min_decibels")]
    pub min_decibels: f32,
    /// Level in dB drawn as full red
    #[serde(default = "default_max_decibels")]
    pub max_decibels: f32,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_min_decibels() -> f32 {
    -100.0
}

fn default_max_decibels() -> f32 {
    -30.0
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            smoothing_time_constant: 0.0,
            min_decibels: default_min_decibels(),
            max_decibels: default_max_decibels(),
        }
    }
}

impl AudioConfig {
    pub fn analyser_settings(&self) -> AnalyserSettings {
        AnalyserSettings {
            smoothing_time_constant: self.smoothing_time_constant,
            min_decibels: self.min_decibels,
            max_decibels: self.max_decibels,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectroConfig {
    #[serde(default)]
    pub audio: AudioConfig,
}

impl SpectroConfig {
    /// Loads the configuration, writing a default file first if none exists.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the file cannot be read or written
    /// - If the TOML is malformed or holds out-of-range values
    pub fn load_or_create() -> anyhow::Result<Self> {
        let path = get_config_path()?;
        if !path.exists() {
            let config = Self::default();
            config.save_to(&path)?;
            tracing::info!("Created default configuration at {}", path.display());
            return Ok(config);
        }
        Self::load_from(&path)
    }

    /// Loads and validates the configuration at `path`.
    ///
    /// # Errors
    /// - If the file cannot be read
    /// - If the TOML is malformed or holds out-of-range values
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read {}: {e}", path.display()))?;
        let config = Self::parse(&content)
            .map_err(|e| anyhow!("Invalid configuration in {}: {e}", path.display()))?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses and validates configuration TOML.
    ///
    /// # Errors
    /// - If the TOML is malformed
    /// - If a value is out of range
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: SpectroConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    /// - If the smoothing constant is outside 0.0..=1.0
    /// - If min_decibels is not below max_decibels
    pub fn validate(&self) -> anyhow::Result<()> {
        let audio = &self.audio;
        if !(0.0..=1.0).contains(&audio.smoothing_time_constant) {
            return Err(anyhow!(
                "audio.smoothing_time_constant must be between 0.0 and 1.0, got {}",
                audio.smoothing_time_constant
            ));
        }
        if !(audio.min_decibels < audio.max_decibels) {
            return Err(anyhow!(
                "audio.min_decibels ({}) must be below audio.max_decibels ({})",
                audio.min_decibels,
                audio.max_decibels
            ));
        }
        Ok(())
    }

    /// Writes the configuration to `path`, creating parent directories.
    ///
    /// # Errors
    /// - If the directory cannot be created or the file cannot be written
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| anyhow!("Failed to create config directory: {e}"))?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Retrieves the path to the config file.
///
/// # Errors
/// - If the home directory cannot be determined
pub fn get_config_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home.join(".config").join("spectro").join("spectro.toml"))
}
