//! Minimal drawing interface the renderer targets.
//!
//! Coordinates are in pixels with the origin at the top-left corner, like an
//! HTML canvas. Implementations decide how fractional coordinates rasterize.

/// An RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    /// Light grey used for axis lines and labels
    pub const AXIS: Rgb = Rgb(0xee, 0xee, 0xee);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Where the anchor point sits relative to the text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    /// Text starts at the anchor
    #[default]
    Left,
    /// Text is centred on the anchor
    Center,
    /// Text ends at the anchor
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Nominal glyph height in pixels; surfaces with fixed-size glyphs ignore it
    pub size_px: f64,
    pub align: TextAlign,
    /// Clockwise rotation about the anchor in radians (negative turns the
    /// baseline upward)
    pub rotation: f64,
    pub color: Rgb,
}

/// 2D raster target.
pub trait Surface {
    /// Width and height in pixels.
    fn size(&self) -> (u32, u32);

    /// Resets a region to the background.
    fn clear_rect(&mut self, rect: PixelRect);

    fn fill_rect(&mut self, rect: PixelRect, color: Rgb);

    fn stroke_line(&mut self, from: Point, to: Point, color: Rgb);

    fn fill_text(&mut self, text: &str, anchor: Point, style: TextStyle);
}
