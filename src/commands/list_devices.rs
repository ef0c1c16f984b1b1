//! List available audio input devices.

use anyhow::anyhow;
use cpal::traits::{DeviceTrait, HostTrait};

use crate::analysis::capture::suppress_alsa_warnings;

/// Prints every input device with its index, default marker and native format.
///
/// The index and name are both accepted by `audio.device` in spectro.toml.
///
/// # Errors
/// - If the audio host cannot enumerate devices
pub fn handle_list_devices() -> anyhow::Result<()> {
    let (default_name, devices) = suppress_alsa_warnings(|| {
        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());
        let devices: Vec<cpal::Device> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate audio devices: {e}"))?
            .filter(|d| d.name().is_ok())
            .collect();
        Ok((default_name, devices))
    })?;

    if devices.is_empty() {
        println!("No audio input devices found on this system.");
        return Ok(());
    }

    println!("Available audio input devices:");
    println!();

    for (index, device) in devices.iter().enumerate() {
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let marker = if default_name.as_deref() == Some(name.as_str()) {
            " [DEFAULT]"
        } else {
            ""
        };

        let format = match device.default_input_config() {
            Ok(config) => format!(
                "{} Hz, {} channels, nyquist {:.1} kHz",
                config.sample_rate().0,
                config.channels(),
                config.sample_rate().0 as f64 / 2000.0
            ),
            Err(_) => "configuration unavailable".to_string(),
        };

        println!("  {index}: {name}{marker}");
        println!("     {format}");
    }
    println!();
    println!("Set audio.device in spectro.toml to an index or name above.");

    Ok(())
}
