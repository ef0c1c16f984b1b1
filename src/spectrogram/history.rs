//! The timestamp and spectrum buffers, advanced together.

use chrono::{DateTime, Local};
use std::time::Duration;

use super::error::{IndexError, SpectrogramError};
use super::rolling::RollingBuffer;

/// Rolling window of spectra and the moments they were captured.
///
/// Both buffers share one capacity and only move through [`Self::advance`], so
/// `timestamp(i)` is always the capture time of `spectrum(i)`.
#[derive(Debug, Clone)]
pub struct SpectrumHistory {
    timestamps: RollingBuffer<DateTime<Local>>,
    spectra: RollingBuffer<Vec<u8>>,
}

impl SpectrumHistory {
    /// Creates a full window of silent spectra whose timestamps step back from
    /// `now` by `sample_interval`.
    ///
    /// # Errors
    /// - If `capacity` or `frequency_bins` is zero
    pub fn prefilled(
        capacity: usize,
        frequency_bins: usize,
        now: DateTime<Local>,
        sample_interval: Duration,
    ) -> Result<Self, SpectrogramError> {
        if frequency_bins == 0 {
            return Err(SpectrogramError::NoFrequencyBins);
        }
        let step = chrono::Duration::from_std(sample_interval).unwrap_or_else(|_| chrono::Duration::zero());

        Ok(Self {
            timestamps: RollingBuffer::filled_with(capacity, |i| now - step * i as i32)?,
            spectra: RollingBuffer::filled_with(capacity, |_| vec![0u8; frequency_bins])?,
        })
    }

    pub fn capacity(&self) -> usize {
        self.timestamps.len()
    }

    pub fn frequency_bins(&self) -> usize {
        self.spectra.get(0).map(Vec::len).unwrap_or(0)
    }

    /// Recycles the oldest entry as the newest one.
    ///
    /// The spectrum slot is handed to `fill` with its stale contents still in
    /// place; `fill` must overwrite every bin.
    pub fn advance<F>(&mut self, timestamp: DateTime<Local>, fill: F)
    where
        F: FnOnce(&mut [u8]),
    {
        self.timestamps.insert_front(timestamp);
        fill(self.spectra.rotate_alignment().as_mut_slice());
    }

    pub fn timestamp(&self, index: usize) -> Result<&DateTime<Local>, IndexError> {
        self.timestamps.get(index)
    }

    /// Iterates `(timestamp, spectrum)` pairs from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = (&DateTime<Local>, &[u8])> + '_ {
        self.timestamps
            .iter()
            .zip(self.spectra.iter().map(Vec::as_slice))
    }
}
