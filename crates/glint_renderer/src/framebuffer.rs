//! Output image owned by the platform layer.
//!
//! Pixels are packed 8-bit RGBA words, `r | g << 8 | b << 16 | a << 24`,
//! stored row-major from the top-left corner.

use std::path::Path;

use image::ImageError;

/// Pixel formats the renderer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Packed 8-bit RGBA (display)
    Rgba8,
    /// Linear float RGBA (accumulation)
    Rgba32F,
}

impl PixelFormat {
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8 => 4,
            PixelFormat::Rgba32F => 16,
        }
    }
}

/// Row-major packed RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl Image {
    /// Create a new image filled with transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Change the resolution. Contents are cleared.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width as usize * height as usize, 0);
    }

    /// Get the pixel at (x, y).
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Set the pixel at (x, y).
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, pixel: u32) {
        self.pixels[(y * self.width + x) as usize] = pixel;
    }

    /// Unpack into an RGBA byte stream (for display or saving).
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|pixel| pixel.to_le_bytes())
            .collect()
    }

    /// Write the image as PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), ImageError> {
        image::save_buffer(
            path,
            &self.to_rgba_bytes(),
            self.width,
            self.height,
            image::ColorType::Rgba8,
        )
    }
}
