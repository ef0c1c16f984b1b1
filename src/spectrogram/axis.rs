//! Coordinate math for the heatmap and both axes.
//!
//! Frequency grows upward from the bottom of the plot. Time runs right to left:
//! logical index 0 (the newest sample) sits at the right edge of the canvas.

use chrono::{DateTime, Local};

use super::geometry::PlotGeometry;

/// Distance between labelled frequency ticks.
pub const FREQUENCY_TICK_SPACING_HZ: f64 = 2_000.0;

/// A time tick is drawn at every n-th logical index.
pub const TIME_TICK_STRIDE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyTick {
    pub frequency_hz: f64,
    /// Vertical pixel position within the plot
    pub y: f64,
}

impl FrequencyTick {
    /// Whole kilohertz, e.g. "4".
    pub fn label(&self) -> String {
        format!("{}", (self.frequency_hz / 1_000.0).round() as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeTick {
    /// Logical history index the tick labels
    pub index: usize,
    /// Horizontal pixel position at the centre of that column
    pub x: f64,
}

/// Maps history indices and frequency bins to canvas pixels for one session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisScaler {
    canvas_width: f64,
    plot_width: f64,
    plot_height: f64,
    time_steps: usize,
    frequency_bins: usize,
    sample_rate: u32,
}

impl AxisScaler {
    pub fn new(geometry: &PlotGeometry, sample_rate: u32, frequency_bins: usize) -> Self {
        Self {
            canvas_width: geometry.canvas_width(),
            plot_width: geometry.plot_width(),
            plot_height: geometry.plot_height(),
            time_steps: geometry.time_steps(),
            frequency_bins,
            sample_rate,
        }
    }

    pub fn nyquist_hz(&self) -> f64 {
        nyquist_hz(self.sample_rate)
    }

    pub fn pixels_per_hertz(&self) -> f64 {
        self.plot_height / self.nyquist_hz()
    }

    pub fn frequency_to_y(&self, frequency_hz: f64) -> f64 {
        self.plot_height - frequency_hz * self.pixels_per_hertz()
    }

    /// Ticks at 0, 2 kHz, 4 kHz, ... up to the Nyquist frequency.
    pub fn frequency_ticks(&self) -> Vec<FrequencyTick> {
        (0..frequency_tick_count(self.sample_rate, FREQUENCY_TICK_SPACING_HZ))
            .map(|n| {
                let frequency_hz = n as f64 * FREQUENCY_TICK_SPACING_HZ;
                FrequencyTick {
                    frequency_hz,
                    y: self.frequency_to_y(frequency_hz),
                }
            })
            .collect()
    }

    /// Width of one history column.
    pub fn column_width(&self) -> f64 {
        self.plot_width / self.time_steps as f64
    }

    /// Height of one frequency bin row.
    pub fn row_height(&self) -> f64 {
        self.plot_height / self.frequency_bins as f64
    }

    /// Left edge of the column for logical index `index`.
    pub fn column_x(&self, index: usize) -> f64 {
        self.canvas_width - (index + 1) as f64 * self.column_width()
    }

    /// Top edge of the row for frequency bin `bin`.
    pub fn row_y(&self, bin: usize) -> f64 {
        self.plot_height - (bin + 1) as f64 * self.row_height()
    }

    /// Centre of the column for logical index `index`.
    pub fn time_tick_x(&self, index: usize) -> f64 {
        let dx = self.column_width();
        self.canvas_width - dx / 2.0 - index as f64 * dx
    }

    /// Ticks at every [`TIME_TICK_STRIDE`]-th index, skipping the newest column.
    pub fn time_ticks(&self) -> Vec<TimeTick> {
        (TIME_TICK_STRIDE..self.time_steps)
            .step_by(TIME_TICK_STRIDE)
            .map(|index| TimeTick {
                index,
                x: self.time_tick_x(index),
            })
            .collect()
    }
}

pub fn nyquist_hz(sample_rate: u32) -> f64 {
    sample_rate as f64 / 2.0
}

/// Number of ticks from 0 Hz up to and including the last multiple of
/// `spacing_hz` below the Nyquist frequency.
pub fn frequency_tick_count(sample_rate: u32, spacing_hz: f64) -> usize {
    (nyquist_hz(sample_rate) / spacing_hz).floor() as usize + 1
}

/// Formats a sample time as `MM:SS.mmm`.
pub fn format_timestamp(timestamp: &DateTime<Local>) -> String {
    timestamp.format("%M:%S%.3f").to_string()
}
