//! Rasterizer: arbitrary image → 32×32 [`PixelGrid`].
//!
//! ## Pipeline
//! 1. Decode (format sniffed from the bytes; animated GIFs yield their
//!    first frame).
//! 2. Scale to 32×32 with a fixed [`Resample`] filter, on premultiplied
//!    alpha. Sources that are already 32×32 skip this step so they
//!    round-trip exactly.
//! 3. Per pixel: alpha below [`ALPHA_THRESHOLD`] becomes [`BACKGROUND`],
//!    anything else keeps its RGB and drops the alpha.

use crate::grid::PixelGrid;
use crate::{BACKGROUND, Color, GRID_SIZE};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use std::fmt;

/// Pixels with alpha below this (on 0-255) are treated as transparent.
pub const ALPHA_THRESHOLD: u8 = 128;

const SIZE: u32 = GRID_SIZE as u32;

/// Resampling filter used when a source isn't already 32×32.
///
/// Bilinear is the default: it is cheap, deterministic, and has no negative
/// lobes, so a fully transparent region stays below the alpha threshold
/// right up to its edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Resample {
    Nearest,
    #[default]
    Bilinear,
    Lanczos,
}

impl Resample {
    fn filter(self) -> FilterType {
        match self {
            Resample::Nearest => FilterType::Nearest,
            Resample::Bilinear => FilterType::Triangle,
            Resample::Lanczos => FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for Resample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resample::Nearest => "nearest",
            Resample::Bilinear => "bilinear",
            Resample::Lanczos => "lanczos",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image has no pixels")]
    Empty,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Rasterizer {
    resample: Resample,
}

impl Rasterizer {
    pub fn new(resample: Resample) -> Self {
        Self { resample }
    }

    pub fn resample(&self) -> Resample {
        self.resample
    }

    /// Decode an encoded image and rasterize it.
    pub fn rasterize(&self, bytes: &[u8]) -> Result<PixelGrid, RasterError> {
        if bytes.is_empty() {
            return Err(RasterError::Empty);
        }
        let img = image::load_from_memory(bytes)?;
        self.rasterize_image(&img)
    }

    /// Rasterize an already-decoded image.
    pub fn rasterize_image(&self, img: &DynamicImage) -> Result<PixelGrid, RasterError> {
        if img.width() == 0 || img.height() == 0 {
            return Err(RasterError::Empty);
        }

        let mut rgba = img.to_rgba8();
        let scaled = if rgba.dimensions() == (SIZE, SIZE) {
            rgba
        } else {
            // Filter in premultiplied space so hidden RGB under alpha 0
            // can't bleed into visible neighbours.
            premultiply(&mut rgba);
            let mut out = imageops::resize(&rgba, SIZE, SIZE, self.resample.filter());
            unpremultiply(&mut out);
            out
        };

        Ok(grid_from_rgba(&scaled))
    }
}

/// Apply the transparency policy to one RGBA pixel.
pub fn cell_color(pixel: Rgba<u8>) -> Color {
    let [r, g, b, a] = pixel.0;
    if a < ALPHA_THRESHOLD {
        BACKGROUND
    } else {
        Color::new(r, g, b)
    }
}

fn premultiply(img: &mut RgbaImage) {
    for p in img.pixels_mut() {
        let a = u16::from(p[3]);
        for c in 0..3 {
            p[c] = ((u16::from(p[c]) * a + 127) / 255) as u8;
        }
    }
}

fn unpremultiply(img: &mut RgbaImage) {
    for p in img.pixels_mut() {
        let a = u16::from(p[3]);
        if a == 0 {
            continue;
        }
        for c in 0..3 {
            // Lanczos ringing can leave a channel above its alpha.
            p[c] = ((u16::from(p[c]) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

/// Read a 32×32 RGBA surface into a grid. Cells outside a smaller surface
/// are left as background.
pub(crate) fn grid_from_rgba(img: &RgbaImage) -> PixelGrid {
    PixelGrid::from_fn(|row, col| {
        img.get_pixel_checked(col as u32, row as u32)
            .map_or(BACKGROUND, |p| cell_color(*p))
    })
}
