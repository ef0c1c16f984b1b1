//! Scrolling spectrogram core.
//!
//! A [`Controller`] samples a [`SpectrumSource`] on a fixed clock into a rolling
//! [`SpectrumHistory`], and every few samples redraws the history through a
//! [`Renderer`] onto any [`Surface`].

pub mod axis;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod history;
pub mod render;
pub mod rolling;
pub mod scheduler;
pub mod source;
pub mod surface;

pub use controller::{Controller, SessionState, TickOutcome};
pub use geometry::{AxisMargins, PlotGeometry};
pub use render::AxisStyle;
pub use source::SpectrumSource;
pub use surface::{PixelRect, Point, Rgb, Surface, TextAlign, TextStyle};
