//! Exporter: [`PixelGrid`] → 32×32 PNG, one pixel per cell.
//!
//! No scaling and no lossy encoding happen here, so the device shows exactly
//! what was edited.

use crate::grid::PixelGrid;
use crate::{BACKGROUND, GRID_SIZE};
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, RgbImage};

/// Upload file name for hand-drawn grids.
pub const DRAWING_FILE_NAME: &str = "drawing.png";

/// Upload file name for rendered emoji/glyphs.
pub const EMOJI_FILE_NAME: &str = "emoji.png";

/// Upload file name for rasterized image uploads.
pub const IMAGE_FILE_NAME: &str = "image.png";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Paint the grid onto a fresh 32×32 raster, `(row, col)` → `(y, x)`.
pub fn to_image(grid: &PixelGrid) -> RgbImage {
    let size = GRID_SIZE as u32;
    let mut img = RgbImage::from_pixel(size, size, BACKGROUND.into());
    for (row, col, color) in grid.cells() {
        img.put_pixel(col as u32, row as u32, color.into());
    }
    img
}

/// Encode the grid as an in-memory PNG.
pub fn encode_png(grid: &PixelGrid) -> Result<Vec<u8>, ExportError> {
    let img = to_image(grid);
    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;
    use crate::raster::{Rasterizer, Resample};
    use image::ImageFormat;
    use pretty_assertions::assert_eq;

    const RED: Color = Color::new(255, 0, 0);

    #[test]
    fn single_red_cell_exports_single_red_pixel() {
        let mut grid = PixelGrid::new();
        grid.paint(0, 0, RED).unwrap();

        let png = encode_png(&grid).unwrap();
        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .unwrap()
            .to_rgb8();

        assert_eq!(decoded.dimensions(), (32, 32));
        for (x, y, pixel) in decoded.enumerate_pixels() {
            let expected = if (x, y) == (0, 0) { RED } else { BACKGROUND };
            assert_eq!(Color::from(*pixel), expected, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn rows_map_to_y_and_columns_to_x() {
        let mut grid = PixelGrid::new();
        grid.paint(2, 9, RED).unwrap();

        let img = to_image(&grid);
        assert_eq!(Color::from(*img.get_pixel(9, 2)), RED);
        assert_eq!(Color::from(*img.get_pixel(2, 9)), BACKGROUND);
    }

    #[test]
    fn export_then_rasterize_reproduces_grid() {
        let grid = PixelGrid::from_fn(|r, c| Color::new((r * 8) as u8, (c * 8) as u8, ((r + c) * 4) as u8));

        let png = encode_png(&grid).unwrap();
        // 32×32 input is never resampled, whatever the filter.
        let back = Rasterizer::new(Resample::Lanczos).rasterize(&png).unwrap();

        assert_eq!(back, grid);
    }

    #[test]
    fn output_is_png() {
        let png = encode_png(&PixelGrid::new()).unwrap();
        assert_eq!(image::guess_format(&png).unwrap(), ImageFormat::Png);
    }
}
