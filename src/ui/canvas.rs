//! Pixel canvas backed by terminal cells.
//!
//! Each cell shows two vertically stacked pixels through an upper-half block
//! glyph, so a `w x h` cell area is a `w x 2h` pixel raster. Text is kept in a
//! separate per-cell overlay and drawn in place of the pixels it covers.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier},
    widgets::Widget,
};
use std::ops::Range;

use crate::spectrogram::{PixelRect, Point, Rgb, Surface, TextAlign, TextStyle};

const UPPER_HALF: &str = "▀";
const LOWER_HALF: &str = "▄";

/// Cells are a fixed size, so text at least this tall is set in bold instead.
const BOLD_TEXT_PX: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Glyph {
    ch: char,
    color: Rgb,
    bold: bool,
}

/// Off-screen raster that implements [`Surface`] and renders as a widget.
#[derive(Debug, Clone)]
pub struct TerminalCanvas {
    columns: u16,
    rows: u16,
    /// `None` is the terminal's own background
    pixels: Vec<Option<Rgb>>,
    glyphs: Vec<Option<Glyph>>,
}

impl TerminalCanvas {
    /// Creates a blank canvas covering `columns x rows` cells.
    pub fn new(columns: u16, rows: u16) -> Self {
        let cells = columns as usize * rows as usize;
        Self {
            columns,
            rows,
            pixels: vec![None; cells * 2],
            glyphs: vec![None; cells],
        }
    }

    fn pixel_width(&self) -> u32 {
        self.columns as u32
    }

    fn pixel_height(&self) -> u32 {
        self.rows as u32 * 2
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.pixel_width() || y >= self.pixel_height() {
            return None;
        }
        self.pixels[(y * self.pixel_width() + x) as usize]
    }

    fn cell_index(&self, column: i64, row: i64) -> Option<usize> {
        if column < 0 || row < 0 || column >= self.columns as i64 || row >= self.rows as i64 {
            return None;
        }
        Some(row as usize * self.columns as usize + column as usize)
    }

    /// Pixels whose centres fall inside `[start, start + len)`, clipped to `limit`.
    fn span(start: f64, len: f64, limit: u32) -> Range<u32> {
        let from = start.round().max(0.0).min(limit as f64) as u32;
        let to = (start + len).round().max(0.0).min(limit as f64) as u32;
        from..to.max(from)
    }

    fn paint_rect(&mut self, rect: PixelRect, color: Option<Rgb>) {
        let xs = Self::span(rect.x, rect.width, self.pixel_width());
        let ys = Self::span(rect.y, rect.height, self.pixel_height());
        for y in ys.clone() {
            for x in xs.clone() {
                self.set_pixel(x as i64, y as i64, color);
            }
        }
    }

    fn set_pixel(&mut self, x: i64, y: i64, color: Option<Rgb>) {
        if x < 0 || y < 0 || x >= self.pixel_width() as i64 || y >= self.pixel_height() as i64 {
            return;
        }
        let width = self.pixel_width() as i64;
        self.pixels[(y * width + x) as usize] = color;
        if let Some(cell) = self.cell_index(x, y / 2) {
            self.glyphs[cell] = None;
        }
    }
}

/// Unit cell step for a rotation, quantised to the nearest 45 degrees.
fn cell_direction(rotation: f64) -> (i64, i64) {
    (rotation.cos().round() as i64, rotation.sin().round() as i64)
}

impl Surface for TerminalCanvas {
    fn size(&self) -> (u32, u32) {
        (self.pixel_width(), self.pixel_height())
    }

    fn clear_rect(&mut self, rect: PixelRect) {
        self.paint_rect(rect, None);
    }

    fn fill_rect(&mut self, rect: PixelRect, color: Rgb) {
        self.paint_rect(rect, Some(color));
    }

    fn stroke_line(&mut self, from: Point, to: Point, color: Rgb) {
        let (mut x0, mut y0) = (from.x.floor() as i64, from.y.floor() as i64);
        let (x1, y1) = (to.x.floor() as i64, to.y.floor() as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.set_pixel(x0, y0, Some(color));
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn fill_text(&mut self, text: &str, anchor: Point, style: TextStyle) {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return;
        }

        let bold = style.size_px >= BOLD_TEXT_PX;
        let (step_x, step_y) = cell_direction(style.rotation);
        // The text sits on the anchor like a baseline: the cell just above it
        let anchor_row = (anchor.y / 2.0).ceil() as i64 - 1;
        let (anchor_column, shift) = match style.align {
            TextAlign::Left => (anchor.x.floor() as i64, 0),
            TextAlign::Center => (anchor.x.floor() as i64, chars.len() as i64 / 2),
            TextAlign::Right => (anchor.x.ceil() as i64 - 1, chars.len() as i64 - 1),
        };

        for (k, ch) in chars.into_iter().enumerate() {
            let offset = k as i64 - shift;
            let column = anchor_column + offset * step_x;
            let row = anchor_row + offset * step_y;
            if let Some(cell) = self.cell_index(column, row) {
                self.glyphs[cell] = Some(Glyph {
                    ch,
                    color: style.color,
                    bold,
                });
            }
        }
    }
}

fn to_color(rgb: Option<Rgb>) -> Color {
    match rgb {
        Some(Rgb(r, g, b)) => Color::Rgb(r, g, b),
        None => Color::Reset,
    }
}

impl Widget for &TerminalCanvas {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let columns = self.columns.min(area.width);
        let rows = self.rows.min(area.height);

        for row in 0..rows {
            for column in 0..columns {
                let Some(cell) = buf.cell_mut((area.x + column, area.y + row)) else {
                    continue;
                };
                let index = row as usize * self.columns as usize + column as usize;

                if let Some(glyph) = self.glyphs[index] {
                    cell.set_char(glyph.ch)
                        .set_fg(to_color(Some(glyph.color)))
                        .set_bg(Color::Reset);
                    if glyph.bold {
                        cell.modifier.insert(Modifier::BOLD);
                    } else {
                        cell.modifier.remove(Modifier::BOLD);
                    }
                    continue;
                }

                let upper = self.pixel(column as u32, row as u32 * 2);
                let lower = self.pixel(column as u32, row as u32 * 2 + 1);
                cell.modifier.remove(Modifier::BOLD);
                match (upper, lower) {
                    (None, None) => {
                        cell.set_char(' ').set_fg(Color::Reset).set_bg(Color::Reset);
                    }
                    (None, Some(_)) => {
                        cell.set_symbol(LOWER_HALF)
                            .set_fg(to_color(lower))
                            .set_bg(Color::Reset);
                    }
                    _ => {
                        cell.set_symbol(UPPER_HALF)
                            .set_fg(to_color(upper))
                            .set_bg(to_color(lower));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrogram::history::SpectrumHistory;
    use crate::spectrogram::render::Renderer;
    use crate::spectrogram::{AxisMargins, AxisStyle, PlotGeometry};
    use chrono::Local;
    use std::f64::consts::PI;
    use std::time::Duration;

    fn glyph(canvas: &TerminalCanvas, column: i64, row: i64) -> Option<char> {
        canvas
            .cell_index(column, row)
            .and_then(|i| canvas.glyphs[i])
            .map(|g| g.ch)
    }

    fn style(align: TextAlign, rotation: f64) -> TextStyle {
        TextStyle {
            size_px: 2.0,
            align,
            rotation,
            color: Rgb::AXIS,
        }
    }

    #[test]
    fn test_size_is_two_pixels_per_row() {
        let canvas = TerminalCanvas::new(10, 4);
        assert_eq!(canvas.size(), (10, 8));
    }

    #[test]
    fn test_fill_rect_covers_pixel_centres() {
        let mut canvas = TerminalCanvas::new(10, 4);
        canvas.fill_rect(PixelRect::new(1.2, 0.6, 2.0, 2.0), Rgb(9, 0, 0));

        assert_eq!(canvas.pixel(0, 1), None);
        assert_eq!(canvas.pixel(1, 1), Some(Rgb(9, 0, 0)));
        assert_eq!(canvas.pixel(2, 2), Some(Rgb(9, 0, 0)));
        assert_eq!(canvas.pixel(3, 2), None);
        assert_eq!(canvas.pixel(1, 3), None);
    }

    #[test]
    fn test_fill_rect_is_clipped() {
        let mut canvas = TerminalCanvas::new(4, 2);
        canvas.fill_rect(PixelRect::new(-3.0, 2.0, 100.0, 100.0), Rgb(1, 2, 3));
        assert_eq!(canvas.pixel(0, 2), Some(Rgb(1, 2, 3)));
        assert_eq!(canvas.pixel(3, 3), Some(Rgb(1, 2, 3)));
        assert_eq!(canvas.pixel(0, 1), None);
    }

    #[test]
    fn test_right_aligned_text_ends_at_anchor() {
        let mut canvas = TerminalCanvas::new(10, 4);
        canvas.fill_text("12", Point::new(5.0, 4.0), style(TextAlign::Right, 0.0));
        assert_eq!(glyph(&canvas, 3, 1), Some('1'));
        assert_eq!(glyph(&canvas, 4, 1), Some('2'));
        assert_eq!(glyph(&canvas, 5, 1), None);
    }

    #[test]
    fn test_vertical_text_reads_upward() {
        let mut canvas = TerminalCanvas::new(4, 6);
        canvas.fill_text("abc", Point::new(0.5, 6.0), style(TextAlign::Center, -PI / 2.0));
        // centred on row 2: 'a' below, 'c' above
        assert_eq!(glyph(&canvas, 0, 3), Some('a'));
        assert_eq!(glyph(&canvas, 0, 2), Some('b'));
        assert_eq!(glyph(&canvas, 0, 1), Some('c'));
    }

    #[test]
    fn test_diagonal_text_climbs_to_anchor() {
        let mut canvas = TerminalCanvas::new(10, 10);
        canvas.fill_text("xyz", Point::new(6.0, 4.0), style(TextAlign::Right, -PI / 4.0));
        assert_eq!(glyph(&canvas, 5, 1), Some('z'));
        assert_eq!(glyph(&canvas, 4, 2), Some('y'));
        assert_eq!(glyph(&canvas, 3, 3), Some('x'));
    }

    #[test]
    fn test_painting_removes_text() {
        let mut canvas = TerminalCanvas::new(10, 4);
        canvas.fill_text("hi", Point::new(0.0, 2.0), style(TextAlign::Left, 0.0));
        assert_eq!(glyph(&canvas, 0, 0), Some('h'));
        canvas.clear_rect(PixelRect::new(0.0, 0.0, 10.0, 8.0));
        assert_eq!(glyph(&canvas, 0, 0), None);
        assert_eq!(glyph(&canvas, 1, 0), None);
    }

    #[test]
    fn test_stroke_line_horizontal_and_vertical() {
        let mut canvas = TerminalCanvas::new(10, 4);
        canvas.stroke_line(Point::new(8.0, 3.0), Point::new(6.0, 3.0), Rgb::AXIS);
        assert_eq!(canvas.pixel(6, 3), Some(Rgb::AXIS));
        assert_eq!(canvas.pixel(8, 3), Some(Rgb::AXIS));
        assert_eq!(canvas.pixel(5, 3), None);

        canvas.stroke_line(Point::new(2.5, 4.0), Point::new(2.5, 6.0), Rgb::AXIS);
        assert_eq!(canvas.pixel(2, 4), Some(Rgb::AXIS));
        assert_eq!(canvas.pixel(2, 6), Some(Rgb::AXIS));
    }

    #[test]
    fn test_large_text_is_bold() {
        let mut canvas = TerminalCanvas::new(6, 2);
        let title = TextStyle {
            size_px: 3.0,
            ..style(TextAlign::Left, 0.0)
        };
        canvas.fill_text("T", Point::new(0.0, 2.0), title);
        canvas.fill_text("t", Point::new(2.0, 2.0), style(TextAlign::Left, 0.0));

        let area = Rect::new(0, 0, 6, 2);
        let mut buffer = Buffer::empty(area);
        (&canvas).render(area, &mut buffer);

        assert_eq!(buffer[(0, 0)].symbol(), "T");
        assert!(buffer[(0, 0)].modifier.contains(Modifier::BOLD));
        assert_eq!(buffer[(2, 0)].symbol(), "t");
        assert!(!buffer[(2, 0)].modifier.contains(Modifier::BOLD));
        assert_eq!(buffer[(2, 0)].fg, Color::Rgb(0xee, 0xee, 0xee));
    }

    #[test]
    fn test_widget_uses_half_blocks() {
        let mut canvas = TerminalCanvas::new(2, 1);
        canvas.fill_rect(PixelRect::new(0.0, 0.0, 1.0, 1.0), Rgb(255, 0, 0));
        canvas.fill_rect(PixelRect::new(0.0, 1.0, 1.0, 1.0), Rgb(10, 0, 0));

        let area = Rect::new(0, 0, 2, 1);
        let mut buffer = Buffer::empty(area);
        (&canvas).render(area, &mut buffer);

        let cell = &buffer[(0, 0)];
        assert_eq!(cell.symbol(), UPPER_HALF);
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(10, 0, 0));
        assert_eq!(buffer[(1, 0)].symbol(), " ");
    }

    #[test]
    fn test_full_frame_keeps_both_axis_titles() {
        // an 80x24 terminal minus the footer row
        let mut canvas = TerminalCanvas::new(80, 23);
        let (width, height) = canvas.size();
        let geometry = PlotGeometry::new(width, height, AxisMargins::TERMINAL).unwrap();
        let bins = geometry.frequency_bins();
        let history = SpectrumHistory::prefilled(
            geometry.time_steps(),
            bins,
            Local::now(),
            Duration::from_millis(10),
        )
        .unwrap();
        Renderer::new(geometry, 44_100, bins, AxisStyle::TERMINAL).render(&mut canvas, &history);

        let area = Rect::new(0, 0, 80, 23);
        let mut buffer = Buffer::empty(area);
        (&canvas).render(area, &mut buffer);

        let left_column: String = (0..23).map(|row| buffer[(0, row)].symbol()).collect();
        assert!(left_column.contains("]zHk[ ycneuqerF"), "{left_column:?}");

        let bottom_row: String = (0..80).map(|column| buffer[(column, 22)].symbol()).collect();
        assert!(bottom_row.contains("Time [min:sec]"), "{bottom_row:?}");
    }
}
