//! Emoji/glyph → [`PixelGrid`].
//!
//! The glyph is drawn straight onto a 32×32 black canvas instead of going
//! through the rasterizer's resampling: size 26 px, centered horizontally on
//! x = 16 and vertically on y = 18.
//!
//! `ab_glyph` renders outlines only, so color-bitmap emoji fonts produce
//! nothing; the glyph is filled with a single color instead.

use crate::grid::PixelGrid;
use crate::raster::grid_from_rgba;
use crate::{BACKGROUND, Color, GRID_SIZE};
use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use std::path::{Path, PathBuf};

/// Glyph size in pixels.
pub const GLYPH_SIZE: f32 = 26.0;

/// Point the glyph is centered on, as `(x, y)`.
pub const GLYPH_CENTER: (f32, f32) = (16.0, 18.0);

/// Default fill for rendered glyphs.
pub const DEFAULT_GLYPH_COLOR: Color = Color::new(0xFF, 0xFF, 0xFF);

#[derive(Debug, thiserror::Error)]
pub enum GlyphError {
    #[error("failed to read font {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid font data: {0}")]
    InvalidFont(#[from] ab_glyph::InvalidFont),

    #[error("nothing to render")]
    EmptyText,
}

pub struct GlyphRenderer {
    font: FontVec,
}

impl GlyphRenderer {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, GlyphError> {
        let font = FontVec::try_from_vec(data)?;
        Ok(Self { font })
    }

    pub fn from_file(path: &Path) -> Result<Self, GlyphError> {
        let data = std::fs::read(path).map_err(|source| GlyphError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(data)
    }

    /// Render `text` into a fresh grid.
    pub fn render(&self, text: &str, color: Color) -> Result<PixelGrid, GlyphError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GlyphError::EmptyText);
        }

        let size = GRID_SIZE as u32;
        let [br, bg, bb] = BACKGROUND.to_array();
        let mut canvas = RgbaImage::from_pixel(size, size, Rgba([br, bg, bb, 255]));

        let scale = PxScale::from(GLYPH_SIZE);
        let scaled = self.font.as_scaled(scale);
        let width = measure_width(&self.font, scale, text);
        let height = scaled.ascent() - scaled.descent();
        let (x, y) = glyph_origin(width, height);

        let [r, g, b] = color.to_array();
        draw_text_mut(&mut canvas, Rgba([r, g, b, 255]), x, y, scale, &self.font, text);

        Ok(grid_from_rgba(&canvas))
    }
}

/// Horizontal advance of `text`, kerning included.
fn measure_width(font: &FontVec, scale: PxScale, text: &str) -> f32 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0f32;
    let mut prev = None;

    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }

    width
}

/// Top-left draw position that centers a `width`×`height` box on
/// [`GLYPH_CENTER`].
fn glyph_origin(width: f32, height: f32) -> (i32, i32) {
    let (cx, cy) = GLYPH_CENTER;
    ((cx - width / 2.0).round() as i32, (cy - height / 2.0).round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(26.0, 26.0, (3, 5))]
    #[case(0.0, 0.0, (16, 18))]
    #[case(40.0, 30.0, (-4, 3))]
    fn origin_centers_on_16_18(#[case] w: f32, #[case] h: f32, #[case] expected: (i32, i32)) {
        assert_eq!(glyph_origin(w, h), expected);
    }

    #[test]
    fn glyph_is_centered_on_black_in_the_requested_color() {
        let red = Color::new(255, 0, 0);
        let grid = crate::testing::glyph_renderer().render("O", red).unwrap();

        let lit: Vec<(usize, usize, Color)> =
            grid.cells().filter(|&(_, _, c)| c != BACKGROUND).collect();
        assert!(!lit.is_empty());

        // Edge pixels are anti-aliased: some share of red over black.
        for &(r, c, color) in &lit {
            assert_eq!((color.g, color.b), (0, 0), "cell ({r}, {c}) is {color}");
        }
        assert!(lit.iter().any(|&(_, _, color)| color == red));

        let rows = lit.iter().map(|l| l.0);
        let cols = lit.iter().map(|l| l.1);
        let (min_r, max_r) = (rows.clone().min().unwrap(), rows.max().unwrap());
        let (min_c, max_c) = (cols.clone().min().unwrap(), cols.max().unwrap());
        assert!((32..=38).contains(&(min_r + max_r)), "rows {min_r}..={max_r}");
        assert!((28..=34).contains(&(min_c + max_c)), "cols {min_c}..={max_c}");

        for (r, c) in [(0, 0), (0, 31), (31, 0), (31, 31)] {
            assert_eq!(grid.get(r, c).unwrap(), BACKGROUND, "corner ({r}, {c})");
        }
    }

    #[test]
    fn default_color_is_white() {
        let grid = crate::testing::glyph_renderer()
            .render("X", DEFAULT_GLYPH_COLOR)
            .unwrap();
        assert!(grid.cells().any(|(_, _, c)| c == Color::new(255, 255, 255)));
    }

    #[rstest]
    #[case("")]
    #[case("  ")]
    #[case("\n\t")]
    fn blank_text_is_rejected(#[case] text: &str) {
        let err = crate::testing::glyph_renderer()
            .render(text, DEFAULT_GLYPH_COLOR)
            .unwrap_err();
        assert!(matches!(err, GlyphError::EmptyText), "got {err:?}");
    }

    #[test]
    fn garbage_font_is_rejected() {
        let err = GlyphRenderer::from_bytes(b"not a font".to_vec()).err().unwrap();
        assert!(matches!(err, GlyphError::InvalidFont(_)), "got {err:?}");
    }

    #[test]
    fn missing_font_file_is_an_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = GlyphRenderer::from_file(&dir.path().join("nope.ttf")).err().unwrap();
        assert!(matches!(err, GlyphError::Io { .. }), "got {err:?}");
    }
}
