//! Static plot geometry, derived once per session from the surface size.

use super::error::SpectrogramError;

/// Upper bound on the number of time steps kept in history.
pub const MAX_TIME_STEPS: usize = 128;

/// Horizontal pixels each time step should occupy before capping at
/// [`MAX_TIME_STEPS`].
pub const PIXELS_PER_TIME_STEP: f64 = 2.0;

pub const MIN_FFT_SIZE: usize = 16;
pub const MAX_FFT_SIZE: usize = 1024;

/// Space reserved around the plot for axis labels, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisMargins {
    /// Band on the left holding the frequency axis
    pub y_axis_width: u32,
    /// Band along the bottom holding the time axis
    pub x_axis_height: u32,
}

impl AxisMargins {
    /// Margins sized for the half-block terminal canvas, where a cell is one
    /// pixel wide and two pixels tall.
    pub const TERMINAL: AxisMargins = AxisMargins {
        y_axis_width: 8,
        x_axis_height: 24,
    };
}

/// Canvas and plot dimensions for one session.
///
/// The plot occupies the top-right of the canvas; the frequency axis sits to its
/// left and the time axis below it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotGeometry {
    canvas_width: u32,
    canvas_height: u32,
    margins: AxisMargins,
    time_steps: usize,
    fft_size: usize,
}

impl PlotGeometry {
    /// Derives the plot layout for a canvas of the given pixel size.
    ///
    /// # Errors
    /// - If the plot area would not hold a single time step or pixel row
    pub fn new(
        canvas_width: u32,
        canvas_height: u32,
        margins: AxisMargins,
    ) -> Result<Self, SpectrogramError> {
        let too_small = SpectrogramError::GeometryTooSmall {
            width: canvas_width,
            height: canvas_height,
        };

        let plot_width = canvas_width.checked_sub(margins.y_axis_width).ok_or(too_small.clone())?;
        let plot_height = canvas_height
            .checked_sub(margins.x_axis_height)
            .filter(|h| *h > 0)
            .ok_or(too_small.clone())?;

        let time_steps = time_steps_for_width(plot_width as f64);
        if time_steps == 0 {
            return Err(too_small);
        }

        Ok(Self {
            canvas_width,
            canvas_height,
            margins,
            time_steps,
            fft_size: fft_size_for_height(plot_height),
        })
    }

    pub fn canvas_width(&self) -> f64 {
        self.canvas_width as f64
    }

    pub fn canvas_height(&self) -> f64 {
        self.canvas_height as f64
    }

    pub fn y_axis_width(&self) -> f64 {
        self.margins.y_axis_width as f64
    }

    pub fn x_axis_height(&self) -> f64 {
        self.margins.x_axis_height as f64
    }

    pub fn plot_width(&self) -> f64 {
        (self.canvas_width - self.margins.y_axis_width) as f64
    }

    pub fn plot_height(&self) -> f64 {
        (self.canvas_height - self.margins.x_axis_height) as f64
    }

    /// Capacity of the rolling history.
    pub fn time_steps(&self) -> usize {
        self.time_steps
    }

    /// FFT size giving roughly one frequency bin per plot pixel row.
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of frequency bins an analyser sized by [`Self::fft_size`] yields.
    pub fn frequency_bins(&self) -> usize {
        self.fft_size / 2
    }
}

fn time_steps_for_width(plot_width: f64) -> usize {
    ((plot_width / PIXELS_PER_TIME_STEP).round() as usize).min(MAX_TIME_STEPS)
}

/// Smallest power of two above the plot height, clamped to the supported range.
fn fft_size_for_height(plot_height: u32) -> usize {
    let size = 1usize << (plot_height.ilog2() + 1);
    size.clamp(MIN_FFT_SIZE, MAX_FFT_SIZE)
}
