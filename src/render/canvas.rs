//! Raster canvas with float coordinates and RGBA pixels

use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};
use tracing::{debug, info};

use super::color::Color;
use super::shapes::Shape;
use crate::errors::{from_image_error, FractalError, Result};

/// Largest framebuffer accepted, in pixels (8192 x 8192)
pub const MAX_PIXELS: u64 = 1 << 26;

/// In-memory framebuffer
///
/// Pixels are RGBA with alpha compositing; the background is opaque so the
/// flattened RGB output never depends on the alpha channel.
#[derive(Debug, Clone)]
pub struct Canvas {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel data (row-major, RGBA)
    pixels: Vec<Color>,
    bg_color: Color,
}

impl Canvas {
    /// Create canvas with background color
    pub fn with_background(width: u32, height: u32, bg: Color) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(FractalError::invalid(
                "figure size",
                format!("width and height must be >= 1, got {width}x{height}"),
            ));
        }
        let size = u64::from(width) * u64::from(height);
        if size > MAX_PIXELS {
            return Err(FractalError::invalid(
                "figure size",
                format!("{width}x{height} exceeds the {MAX_PIXELS} pixel limit"),
            ));
        }
        let size = size as usize;
        Ok(Self {
            width,
            height,
            pixels: vec![bg; size],
            bg_color: bg,
        })
    }

    /// Get pixel at coordinates
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// Draw a shape onto the canvas
    pub fn draw<S: Shape>(&mut self, shape: &S) {
        shape.rasterize(self.width, self.height, &mut self.pixels);
    }

    /// Number of pixels that differ from the background
    pub fn painted_pixels(&self) -> usize {
        self.pixels.iter().filter(|c| **c != self.bg_color).count()
    }

    /// Flatten onto the background and convert to an 8-bit image
    pub fn to_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let c = self
                .get_pixel(x, y)
                .unwrap_or(self.bg_color)
                .blend_over(&self.bg_color);
            let (r, g, b) = c.to_rgb8();
            Rgb([r, g, b])
        })
    }

    /// Encode to `path`, format chosen from the extension
    ///
    /// Missing parent directories are created; an existing file is overwritten.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        debug!(
            path = %path.display(),
            width = self.width,
            height = self.height,
            painted = self.painted_pixels(),
            "encoding image"
        );
        self.to_image()
            .save(path)
            .map_err(|e| from_image_error(path, e))?;
        info!(path = %path.display(), "wrote image");
        Ok(())
    }
}
