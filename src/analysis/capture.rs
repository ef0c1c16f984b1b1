//! Audio input capture.
//!
//! Opens the configured input device, downmixes every callback to mono and keeps
//! only the most recent window of samples for analysis.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// The newest `capacity` mono samples, oldest first.
#[derive(Debug)]
pub struct SampleWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends interleaved frames, averaging channels down to mono.
    pub fn push_interleaved<T>(&mut self, data: &[T], channels: usize)
    where
        T: Sample,
        f32: FromSample<T>,
    {
        let channels = channels.max(1);
        for frame in data.chunks_exact(channels) {
            let sum: f32 = frame.iter().map(|s| s.to_sample::<f32>()).sum();
            self.push(sum / channels as f32);
        }
    }

    fn push(&mut self, sample: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Copies the window into `out`, replacing its contents.
    pub fn copy_into(&self, out: &mut Vec<f32>) {
        out.clear();
        out.extend(self.samples.iter().copied());
    }
}

/// A running input stream feeding a shared [`SampleWindow`].
pub struct AudioCapture {
    /// Kept alive for as long as capture should run
    _stream: cpal::Stream,
    window: Arc<Mutex<SampleWindow>>,
    sample_rate: u32,
    device_name: String,
}

impl AudioCapture {
    /// Starts capturing from `device_spec` into a window of `window_size` samples.
    ///
    /// # Arguments
    /// * `device_spec` - "default", a numeric index or a device name from `spectro list-devices`
    /// * `window_size` - Number of most recent mono samples to retain
    ///
    /// # Errors
    /// - If the device is not available
    /// - If the device's sample format is unsupported
    /// - If the input stream cannot be built or started
    pub fn start(device_spec: &str, window_size: usize) -> Result<Self> {
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();
            if device_spec == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device_by_name(&host, device_spec)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Input device: {}", device_name);

        let supported = device.default_input_config()?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let channels = config.channels as usize;
        let sample_rate = config.sample_rate.0;

        tracing::debug!(
            "Device configuration: {}Hz, {} channels, {:?}",
            sample_rate,
            channels,
            sample_format
        );

        let window = Arc::new(Mutex::new(SampleWindow::new(window_size)));
        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, &window, channels)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, &window, channels)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, &window, channels)?,
            cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, &window, channels)?,
            other => return Err(anyhow!("Unsupported sample format: {other:?}")),
        };
        stream.play()?;
        tracing::debug!("Audio stream started");

        Ok(Self {
            _stream: stream,
            window,
            sample_rate,
            device_name,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Copies the current window into `out` if the audio thread is not holding
    /// it. Returns false, leaving `out` untouched, when it is.
    pub fn try_snapshot(&self, out: &mut Vec<f32>) -> bool {
        snapshot_window(&self.window, out)
    }
}

/// Copies `window` into `out` unless another thread holds the lock. A poisoned
/// window is still read.
fn snapshot_window(window: &Mutex<SampleWindow>, out: &mut Vec<f32>) -> bool {
    match window.try_lock() {
        Ok(window) => {
            window.copy_into(out);
            true
        }
        Err(TryLockError::Poisoned(poisoned)) => {
            tracing::warn!("Sample window lock was poisoned, recovering");
            poisoned.into_inner().copy_into(out);
            true
        }
        Err(TryLockError::WouldBlock) => false,
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    window: &Arc<Mutex<SampleWindow>>,
    channels: usize,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let window = Arc::clone(window);
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            window
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_interleaved(data, channels);
        },
        |err| {
            tracing::error!("Audio stream error: {}", err);
        },
        None,
    )?;
    Ok(stream)
}

/// Finds an audio input device by name or numeric index.
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    if let Ok(index) = device_spec.parse::<usize>() {
        let devices: Vec<_> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
            .collect();
        let count = devices.len();

        return devices.into_iter().nth(index).ok_or_else(|| {
            anyhow!(
                "Device index {} is out of range (0-{})",
                index,
                count.saturating_sub(1)
            )
        });
    }

    let devices = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?;

    for device in devices {
        if let Ok(name) = device.name() {
            if name == device_spec {
                return Ok(device);
            }
        }
    }

    Err(anyhow!(
        "Audio input device '{device_spec}' not found. Use 'spectro list-devices' to see available devices."
    ))
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
#[cfg(target_os = "linux")]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    if unsafe { libc::dup2(dev_null.as_raw_fd(), libc::STDERR_FILENO) } == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// ALSA only exists on Linux.
#[cfg(not(target_os = "linux"))]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_recovers_poisoned_window() {
        let window = Arc::new(Mutex::new(SampleWindow::new(2)));
        window.lock().unwrap().push_interleaved(&[0.25f32, 0.5], 1);

        let writer = Arc::clone(&window);
        let panicked = std::thread::spawn(move || {
            let _guard = writer.lock().unwrap();
            panic!("writer failed");
        })
        .join();
        assert!(panicked.is_err());
        assert!(window.is_poisoned());

        let mut out = Vec::new();
        assert!(snapshot_window(&window, &mut out));
        assert_eq!(out, vec![0.25, 0.5]);
    }

    #[test]
    fn test_snapshot_skips_locked_window() {
        let window = Mutex::new(SampleWindow::new(2));
        let _held = window.lock().unwrap();
        let mut out = vec![1.0];
        assert!(!snapshot_window(&window, &mut out));
        assert_eq!(out, vec![1.0]);
    }

    #[test]
    fn test_window_keeps_newest_samples() {
        let mut window = SampleWindow::new(3);
        window.push_interleaved(&[0.1f32, 0.2, 0.3, 0.4, 0.5], 1);

        let mut out = Vec::new();
        window.copy_into(&mut out);
        assert_eq!(out, vec![0.3, 0.4, 0.5]);
    }

    #[test]
    fn test_stereo_is_averaged() {
        let mut window = SampleWindow::new(4);
        window.push_interleaved(&[0.5f32, -0.5, 1.0, 0.0], 2);

        let mut out = Vec::new();
        window.copy_into(&mut out);
        assert_eq!(out, vec![0.0, 0.5]);
    }

    #[test]
    fn test_integer_samples_are_normalised() {
        let mut window = SampleWindow::new(2);
        window.push_interleaved(&[i16::MIN, 0], 1);

        let mut out = Vec::new();
        window.copy_into(&mut out);
        assert_eq!(out, vec![-1.0, 0.0]);
    }
}
