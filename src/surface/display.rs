//! Display lists: what a surface asks the rasteriser to draw.
//!
//! Coordinates are CSS px relative to the surface's border box, before any
//! transform, margin or output scale is applied.

use super::font::GlyphRun;
use crate::raster::RasterImage;
use image::Rgba;
use std::fmt;
use std::str::FromStr;

/// An sRGB colour with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if !self.is_opaque() {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl FromStr for Color {
    type Err = String;

    /// Accepts `#rgb`, `#rrggbb` and `#rrggbbaa` (leading `#` optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("'{s}' is not a hex colour"));
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map(|n| n * 17);
        let parsed = match hex.len() {
            3 => (nibble(0), nibble(1), nibble(2), Ok(255)),
            6 => (byte(0), byte(2), byte(4), Ok(255)),
            8 => (byte(0), byte(2), byte(4), byte(6)),
            _ => return Err(format!("'{s}' must have 3, 6 or 8 hex digits")),
        };
        match parsed {
            (Ok(r), Ok(g), Ok(b), Ok(a)) => Ok(Color::rgba(r, g, b, a)),
            _ => Err(format!("'{s}' is not a hex colour")),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

/// An axis-aligned rectangle in CSS px.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Shrink by `d` on every side.
    pub fn inset(&self, d: f32) -> Rect {
        Rect::new(
            self.x + d,
            self.y + d,
            (self.width - 2.0 * d).max(0.0),
            (self.height - 2.0 * d).max(0.0),
        )
    }
}

/// One drawing command.
#[derive(Debug, Clone)]
pub enum DrawOp {
    /// Fill a rectangle, alpha-blended over what is below.
    Fill { rect: Rect, color: Color },
    /// Draw a border of `width` px inside `rect`.
    Stroke { rect: Rect, color: Color, width: f32 },
    /// Draw an image scaled to cover `rect`, cropped to its centre.
    Image { rect: Rect, image: RasterImage },
    /// Draw shaped glyphs. Glyph positions are relative to `x` on the
    /// baseline at `baseline`.
    Glyphs {
        x: f32,
        baseline: f32,
        run: GlyphRun,
        color: Color,
    },
}

/// The laid-out surface: its border-box size and the ops that paint it.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    pub width: f32,
    pub height: f32,
    pub ops: Vec<DrawOp>,
}

impl DisplayList {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn fill(&mut self, rect: Rect, color: Color) {
        self.ops.push(DrawOp::Fill { rect, color });
    }

    pub fn stroke(&mut self, rect: Rect, color: Color, width: f32) {
        self.ops.push(DrawOp::Stroke { rect, color, width });
    }

    pub fn image(&mut self, rect: Rect, image: RasterImage) {
        self.ops.push(DrawOp::Image { rect, image });
    }

    pub fn glyphs(&mut self, x: f32, baseline: f32, run: GlyphRun, color: Color) {
        if !run.glyphs.is_empty() {
            self.ops.push(DrawOp::Glyphs {
                x,
                baseline,
                run,
                color,
            });
        }
    }

    /// Images referenced by this list, in paint order.
    pub fn images(&self) -> impl Iterator<Item = &RasterImage> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Image { image, .. } => Some(image),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!("#f0f0eb".parse::<Color>().unwrap(), Color::rgb(0xf0, 0xf0, 0xeb));
        assert_eq!("fff".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!(
            "#00000080".parse::<Color>().unwrap(),
            Color::rgba(0, 0, 0, 0x80)
        );
        assert!("#12345".parse::<Color>().is_err());
        assert!("#gggggg".parse::<Color>().is_err());
        assert!("#ঢাকা".parse::<Color>().is_err());
    }

    #[test]
    fn display_omits_opaque_alpha() {
        assert_eq!(Color::rgb(1, 2, 3).to_string(), "#010203");
        assert_eq!(Color::rgba(1, 2, 3, 4).to_string(), "#01020304");
    }

    #[test]
    fn serde_uses_hex_string() {
        let json = serde_json::to_string(&Color::rgb(0xf0, 0xf0, 0xeb)).unwrap();
        assert_eq!(json, "\"#f0f0eb\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::rgb(0xf0, 0xf0, 0xeb));
    }

    #[test]
    fn inset_never_goes_negative() {
        let r = Rect::new(0.0, 0.0, 4.0, 4.0).inset(3.0);
        assert_eq!(r.width, 0.0);
        assert_eq!(r.height, 0.0);
    }
}
