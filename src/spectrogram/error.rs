//! Error types for the spectrogram core.

use super::controller::SessionState;

/// Out-of-range access into a [`RollingBuffer`](super::RollingBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("index {index} is out of range for rolling buffer of capacity {capacity}")]
pub struct IndexError {
    pub index: usize,
    pub capacity: usize,
}

/// Everything the spectrogram core can fail with.
///
/// None of these are transient: each one ends the session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpectrogramError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("rolling buffer capacity must be greater than zero")]
    ZeroCapacity,

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },

    #[error("the session has ended and cannot be restarted")]
    SessionEnded,

    #[error("canvas of {width}x{height} pixels is too small to hold a spectrogram")]
    GeometryTooSmall { width: u32, height: u32 },

    #[error("spectrum source reports zero frequency bins")]
    NoFrequencyBins,
}
