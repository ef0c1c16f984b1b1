//! Rasterizes the spectrum history onto a [`Surface`].
//!
//! Every call redraws the whole frame: heatmap, frequency axis, then the time
//! axis band. The band under the plot is cleared first so nothing from the
//! heatmap bleeds into it; the corner below the frequency axis is left alone so
//! a vertical title taller than the plot survives.

use std::f64::consts::PI;

use super::axis::{format_timestamp, AxisScaler};
use super::geometry::PlotGeometry;
use super::history::SpectrumHistory;
use super::surface::{PixelRect, Point, Rgb, Surface, TextAlign, TextStyle};

const FREQUENCY_AXIS_TITLE: &str = "Frequency [kHz]";
const TIME_AXIS_TITLE: &str = "Time [min:sec]";

/// Sizes and offsets used when drawing axes, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisStyle {
    pub tick_length: f64,
    /// Space between the end of a tick and its label
    pub label_gap: f64,
    /// Distance of axis titles from the canvas edge
    pub title_inset: f64,
    pub title_size_px: f64,
    pub tick_label_size_px: f64,
    pub color: Rgb,
}

impl AxisStyle {
    /// Spacing for the half-block terminal canvas, where titles come out bold.
    pub const TERMINAL: AxisStyle = AxisStyle {
        tick_length: 2.0,
        label_gap: 2.0,
        title_inset: 0.5,
        title_size_px: 3.0,
        tick_label_size_px: 2.0,
        color: Rgb::AXIS,
    };
}

impl Default for AxisStyle {
    fn default() -> Self {
        AxisStyle {
            tick_length: 10.0,
            label_gap: 5.0,
            title_inset: 10.0,
            title_size_px: 14.0,
            tick_label_size_px: 10.0,
            color: Rgb::AXIS,
        }
    }
}

/// Heatmap colour for a bin magnitude: the byte drives the red channel.
pub fn magnitude_color(magnitude: u8) -> Rgb {
    Rgb(magnitude, 0, 0)
}

/// Draws complete spectrogram frames for one session's geometry.
#[derive(Debug, Clone)]
pub struct Renderer {
    geometry: PlotGeometry,
    scaler: AxisScaler,
    style: AxisStyle,
}

impl Renderer {
    pub fn new(geometry: PlotGeometry, sample_rate: u32, frequency_bins: usize, style: AxisStyle) -> Self {
        Self {
            geometry,
            scaler: AxisScaler::new(&geometry, sample_rate, frequency_bins),
            style,
        }
    }

    pub fn render<D: Surface + ?Sized>(&self, surface: &mut D, history: &SpectrumHistory) {
        let g = &self.geometry;
        surface.clear_rect(PixelRect::new(0.0, 0.0, g.canvas_width(), g.canvas_height()));

        self.draw_heatmap(surface, history);
        self.draw_frequency_axis(surface);
        self.draw_time_axis(surface, history);
    }

    fn draw_heatmap<D: Surface + ?Sized>(&self, surface: &mut D, history: &SpectrumHistory) {
        let g = &self.geometry;
        surface.fill_rect(
            PixelRect::new(g.y_axis_width(), 0.0, g.plot_width(), g.plot_height()),
            Rgb::BLACK,
        );

        let width = self.scaler.column_width().ceil();
        let height = self.scaler.row_height().ceil();

        for (index, (_, spectrum)) in history.iter().enumerate() {
            let x = self.scaler.column_x(index);
            for (bin, magnitude) in spectrum.iter().enumerate() {
                let rect = PixelRect::new(x, self.scaler.row_y(bin), width, height);
                surface.fill_rect(rect, magnitude_color(*magnitude));
            }
        }
    }

    fn draw_time_axis<D: Surface + ?Sized>(&self, surface: &mut D, history: &SpectrumHistory) {
        let g = &self.geometry;
        let s = &self.style;
        let plot_height = g.plot_height();

        surface.clear_rect(PixelRect::new(
            g.y_axis_width(),
            plot_height,
            g.plot_width(),
            g.x_axis_height(),
        ));

        surface.fill_text(
            TIME_AXIS_TITLE,
            Point::new(g.canvas_width() / 2.0, g.canvas_height() - s.title_inset),
            self.text_style(s.title_size_px, TextAlign::Center, 0.0),
        );

        for tick in self.scaler.time_ticks() {
            surface.stroke_line(
                Point::new(tick.x, plot_height),
                Point::new(tick.x, plot_height + s.tick_length),
                s.color,
            );

            let Ok(timestamp) = history.timestamp(tick.index) else {
                continue;
            };
            surface.fill_text(
                &format_timestamp(timestamp),
                Point::new(tick.x, plot_height + s.tick_length + s.label_gap),
                self.text_style(s.tick_label_size_px, TextAlign::Right, -PI / 4.0),
            );
        }
    }

    fn draw_frequency_axis<D: Surface + ?Sized>(&self, surface: &mut D) {
        let g = &self.geometry;
        let s = &self.style;
        let axis_x = g.y_axis_width();

        surface.fill_text(
            FREQUENCY_AXIS_TITLE,
            Point::new(s.title_inset, g.canvas_height() / 2.0),
            self.text_style(s.title_size_px, TextAlign::Center, -PI / 2.0),
        );

        for tick in self.scaler.frequency_ticks() {
            surface.stroke_line(
                Point::new(axis_x, tick.y),
                Point::new(axis_x - s.tick_length, tick.y),
                s.color,
            );
            surface.fill_text(
                &tick.label(),
                Point::new(axis_x - s.tick_length - s.label_gap, tick.y),
                self.text_style(s.tick_label_size_px, TextAlign::Right, 0.0),
            );
        }
    }

    fn text_style(&self, size_px: f64, align: TextAlign, rotation: f64) -> TextStyle {
        TextStyle {
            size_px,
            align,
            rotation,
            color: self.style.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrogram::geometry::AxisMargins;
    use crate::spectrogram::surface::recording::{DrawCall, RecordingSurface};
    use chrono::{Local, TimeZone};
    use std::time::Duration;

    const MARGINS: AxisMargins = AxisMargins {
        y_axis_width: 50,
        x_axis_height: 80,
    };

    /// 250x380 canvas: a 200x300 plot holding 100 columns of 2 px.
    fn fixture(frequency_bins: usize) -> (Renderer, SpectrumHistory, RecordingSurface) {
        let geometry = PlotGeometry::new(250, 380, MARGINS).unwrap();
        let renderer = Renderer::new(geometry, 44_100, frequency_bins, AxisStyle::default());
        let now = Local.with_ymd_and_hms(2024, 6, 1, 10, 30, 15).unwrap();
        let history = SpectrumHistory::prefilled(
            geometry.time_steps(),
            frequency_bins,
            now,
            Duration::from_millis(10),
        )
        .unwrap();
        (renderer, history, RecordingSurface::new(250, 380))
    }

    #[test]
    fn test_frame_starts_with_full_clear() {
        let (renderer, history, mut surface) = fixture(4);
        renderer.render(&mut surface, &history);
        assert_eq!(
            surface.calls[0],
            DrawCall::Clear(PixelRect::new(0.0, 0.0, 250.0, 380.0))
        );
    }

    #[test]
    fn test_heatmap_cells_and_colors() {
        let (renderer, mut history, mut surface) = fixture(4);
        let at = *history.timestamp(0).unwrap() + chrono::Duration::milliseconds(10);
        history.advance(at, |bins| bins.copy_from_slice(&[0, 64, 128, 255]));

        renderer.render(&mut surface, &history);

        let fills: Vec<_> = surface.fills().collect();
        // plot background plus one cell per column and bin
        assert_eq!(fills.len(), 1 + 100 * 4);
        assert_eq!(*fills[0].0, PixelRect::new(50.0, 0.0, 200.0, 300.0));
        assert_eq!(*fills[0].1, Rgb::BLACK);

        // the newest column hugs the right edge, lowest bin at the bottom
        let newest: Vec<_> = fills[1..5].to_vec();
        assert_eq!(*newest[0].0, PixelRect::new(248.0, 225.0, 2.0, 75.0));
        assert_eq!(*newest[0].1, Rgb(0, 0, 0));
        assert_eq!(*newest[1].1, Rgb(64, 0, 0));
        assert_eq!(*newest[3].0, PixelRect::new(248.0, 0.0, 2.0, 75.0));
        assert_eq!(*newest[3].1, Rgb(255, 0, 0));

        // the oldest column ends at the plot's left edge
        let (oldest, _) = fills.last().unwrap();
        assert_eq!(oldest.x, 50.0);
    }

    #[test]
    fn test_cell_sizes_round_up() {
        let geometry = PlotGeometry::new(250, 380, MARGINS).unwrap();
        let renderer = Renderer::new(geometry, 44_100, 7, AxisStyle::default());
        let now = Local.with_ymd_and_hms(2024, 6, 1, 10, 30, 15).unwrap();
        let history = SpectrumHistory::prefilled(100, 7, now, Duration::from_millis(10)).unwrap();
        let mut surface = RecordingSurface::new(250, 380);

        renderer.render(&mut surface, &history);
        let (cell, _) = surface.fills().nth(1).unwrap();
        // 300 / 7 = 42.86 rounds up to cover gaps
        assert_eq!(cell.height, 43.0);
    }

    #[test]
    fn test_axis_labels() {
        let (renderer, history, mut surface) = fixture(4);
        renderer.render(&mut surface, &history);

        let texts: Vec<_> = surface.texts().collect();
        let titles: Vec<&str> = texts
            .iter()
            .filter(|(_, _, style)| style.size_px == 14.0)
            .map(|(text, _, _)| *text)
            .collect();
        assert_eq!(titles, vec!["Frequency [kHz]", "Time [min:sec]"]);

        // nine time labels at indices 10..=90, 10 ms apart going back in time
        let time_labels: Vec<_> = texts
            .iter()
            .filter(|(_, _, style)| style.rotation == -PI / 4.0)
            .collect();
        assert_eq!(time_labels.len(), 9);
        assert_eq!(time_labels[0].0, "30:14.900");
        assert_eq!(time_labels[0].1.x, 229.0);
        assert_eq!(time_labels[0].2.align, TextAlign::Right);

        // twelve frequency labels for 44.1 kHz, right aligned left of the ticks
        let frequency_labels: Vec<_> = texts
            .iter()
            .filter(|(_, _, style)| style.size_px == 10.0 && style.rotation == 0.0)
            .collect();
        assert_eq!(frequency_labels.len(), 12);
        assert_eq!(frequency_labels[0].0, "0");
        assert_eq!(frequency_labels[0].1, &Point::new(35.0, 300.0));
        assert_eq!(frequency_labels[11].0, "22");

        assert_eq!(surface.lines().count(), 9 + 12);
    }

    #[test]
    fn test_time_band_cleared_after_plot_and_frequency_axis() {
        let (renderer, history, mut surface) = fixture(2);
        renderer.render(&mut surface, &history);

        let band_clear = surface
            .calls
            .iter()
            .position(|call| *call == DrawCall::Clear(PixelRect::new(50.0, 300.0, 200.0, 80.0)))
            .unwrap();
        let last_fill = surface
            .calls
            .iter()
            .rposition(|call| matches!(call, DrawCall::Fill(..)))
            .unwrap();
        assert!(band_clear > last_fill);

        let frequency_title = surface
            .calls
            .iter()
            .position(|call| matches!(call, DrawCall::Text(text, _, _) if text == FREQUENCY_AXIS_TITLE))
            .unwrap();
        assert!(band_clear > frequency_title);
    }
}
