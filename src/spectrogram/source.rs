//! The analysis capability the spectrogram pulls spectra from.

/// Produces byte-scaled frequency power snapshots on demand.
pub trait SpectrumSource {
    /// Number of frequency bins in every snapshot. Fixed for the session.
    fn resolution(&self) -> usize;

    /// Sample rate of the analysed signal in Hz.
    fn sample_rate(&self) -> u32;

    /// Writes the current spectrum into `out`, one byte per bin, lowest
    /// frequency first. Must not block.
    fn read_frequency_data(&mut self, out: &mut [u8]);
}

