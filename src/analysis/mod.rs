//! Live frequency analysis of an audio input device.
//!
//! Provides the [`SpectrumSource`] the spectrogram samples from: audio capture
//! on the device's own thread, FFT analysis on demand.

pub mod analyser;
pub mod capture;

pub use analyser::{AnalyserSettings, SpectrumAnalyser};
pub use capture::AudioCapture;

use crate::spectrogram::SpectrumSource;

/// Microphone input analysed into byte spectra.
pub struct MicrophoneAnalyser {
    capture: AudioCapture,
    analyser: SpectrumAnalyser,
    /// Last window copied from the capture thread
    scratch: Vec<f32>,
}

impl MicrophoneAnalyser {
    /// Opens `device_spec` and prepares an analyser of `fft_size` samples.
    ///
    /// # Errors
    /// - If the input device cannot be opened or started
    pub fn open(device_spec: &str, fft_size: usize, settings: AnalyserSettings) -> anyhow::Result<Self> {
        let capture = AudioCapture::start(device_spec, fft_size)?;
        tracing::info!(
            "Analysing '{}' with FFT size {} ({} bins)",
            capture.device_name(),
            fft_size,
            fft_size / 2
        );

        Ok(Self {
            capture,
            analyser: SpectrumAnalyser::new(fft_size, settings),
            scratch: Vec::with_capacity(fft_size),
        })
    }
}

impl SpectrumSource for MicrophoneAnalyser {
    fn resolution(&self) -> usize {
        self.analyser.frequency_bin_count()
    }

    fn sample_rate(&self) -> u32 {
        self.capture.sample_rate()
    }

    fn read_frequency_data(&mut self, out: &mut [u8]) {
        // If the audio thread holds the window, analyse the previous copy
        if !self.capture.try_snapshot(&mut self.scratch) {
            tracing::trace!("Sample window busy, reusing previous snapshot");
        }
        self.analyser.analyse(&self.scratch, out);
    }
}
