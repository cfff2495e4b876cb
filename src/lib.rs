//! Core of the pixel panel: colors, the 32×32 grid model, and the pieces
//! that move images in and out of it.
//!
//! - [`raster`] turns arbitrary images into a [`grid::PixelGrid`]
//! - [`editor`] applies pencil/eraser tools and drag-painting to a grid
//! - [`export`] turns a grid back into a PNG for upload
//! - [`glyph`] renders a single emoji/glyph into a grid
//! - [`client`] talks to the backend service that owns the device
//! - [`session`] gates actions on connection state and in-flight work
//! - [`server`] exposes all of it as an HTTP API
//!
//! The binary (`main.rs`) wires these together behind a CLI.

pub mod client;
pub mod editor;
pub mod error;
pub mod export;
pub mod glyph;
pub mod grid;
pub mod presets;
pub mod raster;
pub mod server;
pub mod session;

#[cfg(test)]
mod testing;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width and height of the display, in cells.
pub const GRID_SIZE: usize = 32;

// ── Color ──────────────────────────────────────────────────────────

/// An opaque RGB color.
///
/// Alpha is never stored: transparent source pixels are mapped to
/// [`BACKGROUND`] before they reach a grid. On the wire a color is its
/// `#RRGGBB` string.
///
/// # Rust concept: serde `try_from` / `into`
/// Rather than hand-writing `Serialize`/`Deserialize`, we route through
/// `String` and reuse the `FromStr`/`Display` impls below.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels as an `[r, g, b]` array, the layout `image::Rgb` expects.
    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Format as `#RRGGBB`, each channel zero-padded to two digits.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Color of transparent or erased cells.
pub const BACKGROUND: Color = Color::new(0, 0, 0);

/// Color the pencil starts with.
pub const DEFAULT_PENCIL_COLOR: Color = Color::new(0xFF, 0, 0);

/// The fixed drawing palette: brights, grays, then darks.
pub const PALETTE: [Color; 16] = [
    Color::new(0xFF, 0x00, 0x00),
    Color::new(0x00, 0xFF, 0x00),
    Color::new(0x00, 0x00, 0xFF),
    Color::new(0xFF, 0xFF, 0x00),
    Color::new(0x00, 0xFF, 0xFF),
    Color::new(0xFF, 0x00, 0xFF),
    Color::new(0xFF, 0xFF, 0xFF),
    Color::new(0x00, 0x00, 0x00),
    Color::new(0x80, 0x80, 0x80),
    Color::new(0xC0, 0xC0, 0xC0),
    Color::new(0xFF, 0xA5, 0x00),
    Color::new(0x80, 0x00, 0x80),
    Color::new(0x00, 0x80, 0x00),
    Color::new(0x80, 0x00, 0x00),
    Color::new(0x00, 0x00, 0x80),
    Color::new(0x80, 0x80, 0x00),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {0:?}: expected #RRGGBB or #RGB")]
pub struct ColorParseError(pub String);

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        let err = || ColorParseError(s.to_string());

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }

        match digits.len() {
            6 => {
                let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| err());
                Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
            }
            // #RGB shorthand: each digit is doubled (#F80 == #FF8800)
            3 => {
                let channel = |i: usize| {
                    u8::from_str_radix(&digits[i..i + 1], 16)
                        .map(|v| v * 0x11)
                        .map_err(|_| err())
                };
                Ok(Self::new(channel(0)?, channel(1)?, channel(2)?))
            }
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<image::Rgb<u8>> for Color {
    fn from(p: image::Rgb<u8>) -> Self {
        Self::new(p[0], p[1], p[2])
    }
}

impl From<Color> for image::Rgb<u8> {
    fn from(c: Color) -> Self {
        image::Rgb(c.to_array())
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn color_new() {
        let c = Color::new(10, 20, 30);
        assert_eq!(c.r, 10);
        assert_eq!(c.g, 20);
        assert_eq!(c.b, 30);
    }

    #[rstest]
    #[case(Color::new(0, 0, 0), "#000000")]
    #[case(Color::new(255, 0, 0), "#FF0000")]
    #[case(Color::new(1, 2, 3), "#010203")]
    #[case(Color::new(0xAB, 0xCD, 0xEF), "#ABCDEF")]
    fn to_hex_zero_pads_each_channel(#[case] c: Color, #[case] expected: &str) {
        assert_eq!(c.to_hex(), expected);
    }

    #[rstest]
    #[case("#FF0000", Color::new(255, 0, 0))]
    #[case("#ff8800", Color::new(255, 0x88, 0))]
    #[case("00ff00", Color::new(0, 255, 0))]
    #[case("#F80", Color::new(0xFF, 0x88, 0x00))]
    #[case("  #0000FF  ", Color::new(0, 0, 255))]
    fn parse_accepts_common_forms(#[case] input: &str, #[case] expected: Color) {
        assert_eq!(input.parse::<Color>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("#")]
    #[case("#12345")]
    #[case("#GG0000")]
    #[case("#FF00000")]
    #[case("red")]
    #[case("#+1+2+3")]
    fn parse_rejects_malformed(#[case] input: &str) {
        assert!(input.parse::<Color>().is_err());
    }

    #[test]
    fn serde_uses_hex_string() {
        let json = serde_json::to_string(&Color::new(0x12, 0x34, 0x56)).unwrap();
        assert_eq!(json, "\"#123456\"");

        let back: Color = serde_json::from_str("\"#123456\"").unwrap();
        assert_eq!(back, Color::new(0x12, 0x34, 0x56));

        assert!(serde_json::from_str::<Color>("\"nope\"").is_err());
    }

    #[test]
    fn background_is_black() {
        assert_eq!(BACKGROUND.to_hex(), "#000000");
    }

    #[test]
    fn palette_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for c in PALETTE {
            assert!(seen.insert(c), "duplicate palette entry {c}");
        }
        assert!(PALETTE.contains(&DEFAULT_PENCIL_COLOR));
    }
}
