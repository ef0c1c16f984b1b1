//! Terminal presentation: the half-block canvas, the live view and the error screen.

pub mod canvas;
pub mod error;
pub mod spectrogram;

pub use error::ErrorScreen;
pub use spectrogram::{FooterStatus, SpectrogramTui, ViewCommand};
