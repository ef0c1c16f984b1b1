//! Byte-scaled frequency analysis using FFT.
//!
//! Turns the most recent window of mono samples into one byte per frequency bin,
//! with optional smoothing over time and a configurable decibel window.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Decibel window and smoothing applied to each analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyserSettings {
    /// Weight of the previous spectrum when smoothing, 0.0 (none) to 1.0
    pub smoothing_time_constant: f32,
    /// Level mapped to byte 0
    pub min_decibels: f32,
    /// Level mapped to byte 255
    pub max_decibels: f32,
}

impl Default for AnalyserSettings {
    fn default() -> Self {
        Self {
            smoothing_time_constant: 0.0,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

/// Stateful analyser with a planned FFT and smoothing memory.
pub struct SpectrumAnalyser {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    settings: AnalyserSettings,
}

impl SpectrumAnalyser {
    /// Creates an analyser for `fft_size` samples, yielding `fft_size / 2` bins.
    pub fn new(fft_size: usize, settings: AnalyserSettings) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(fft_size),
            fft_size,
            window: blackman_window(fft_size),
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; fft_size / 2],
            settings,
        }
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Analyses the newest `fft_size` entries of `samples` into `out`.
    ///
    /// Missing history is treated as silence. `out` may be shorter than the bin
    /// count, in which case only the lowest bins are written; extra entries are
    /// zeroed.
    pub fn analyse(&mut self, samples: &[f32], out: &mut [u8]) {
        let available = samples.len().min(self.fft_size);
        let padding = self.fft_size - available;
        let recent = &samples[samples.len() - available..];

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < padding { 0.0 } else { recent[i - padding] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.buffer);

        let tau = self.settings.smoothing_time_constant;
        let scale = 1.0 / self.fft_size as f32;
        for (smoothed, bin) in self.smoothed.iter_mut().zip(self.buffer.iter()) {
            *smoothed = tau * *smoothed + (1.0 - tau) * bin.norm() * scale;
        }

        for (i, byte) in out.iter_mut().enumerate() {
            *byte = match self.smoothed.get(i) {
                Some(magnitude) => decibels_to_byte(
                    20.0 * magnitude.log10(),
                    self.settings.min_decibels,
                    self.settings.max_decibels,
                ),
                None => 0,
            };
        }
    }
}

/// Maps `db` linearly from `[min_db, max_db]` onto `0..=255`, clamping outside.
pub fn decibels_to_byte(db: f32, min_db: f32, max_db: f32) -> u8 {
    if db.is_nan() {
        return 0;
    }
    let scaled = ((db - min_db) / (max_db - min_db) * 255.0).floor();
    scaled.clamp(0.0, 255.0) as u8
}

fn blackman_window(size: usize) -> Vec<f32> {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    (0..size)
        .map(|n| {
            let phase = 2.0 * PI * n as f32 / size as f32;
            A0 - A1 * phase.cos() + A2 * (2.0 * phase).cos()
        })
        .collect()
}
