//! Progressive accumulation and display buffers.
//!
//! Every pixel keeps a linear RGBA running average of all samples since the
//! last reset, plus the gamma-encoded RGBA8 word shown to the user. Storage
//! is tile-major: each tile owns the pixel runs of both buffers behind its own
//! lock, and a job claims each tile exactly once, so locks are never
//! contended.

use std::sync::Arc;

use glint_core::Color;
use glint_math::Vec4;
use parking_lot::{Mutex, MutexGuard};

use crate::arena::{ArenaError, FrameArena};
use crate::framebuffer::{Image, PixelFormat};
use crate::tile::{Tile, TileGrid};

/// Linear and display samples of one tile, row-major within the tile.
#[derive(Debug, Clone)]
pub struct TileSamples {
    pub tile: Tile,
    pub linear: Vec<Vec4>,
    pub display: Vec<u32>,
}

impl TileSamples {
    fn new(tile: Tile) -> Self {
        Self {
            tile,
            linear: vec![Vec4::ZERO; tile.pixel_count()],
            display: vec![0; tile.pixel_count()],
        }
    }

    /// Fold a new sample into pixel (x, y), given `previous` samples already
    /// averaged. Returns the updated display word.
    #[inline]
    pub fn commit(&mut self, x: u32, y: u32, sample: Color, previous: u32) -> u32 {
        let offset = self.tile.local_offset(x, y);
        let average = blend_sample(self.linear[offset], sample, previous);
        self.linear[offset] = average;
        let pixel = pack_rgba(color_to_rgba(average));
        self.display[offset] = pixel;
        pixel
    }
}

/// Running-average buffers for one resolution.
#[derive(Debug)]
pub struct AccumulationBuffer {
    grid: TileGrid,
    tiles: Vec<Mutex<TileSamples>>,
}

impl AccumulationBuffer {
    /// Allocate zeroed buffers for `grid`, charging both to `arena`.
    pub fn new(grid: TileGrid, arena: &mut FrameArena) -> Result<Self, ArenaError> {
        let pixels = grid.pixel_count();
        arena.push(
            pixels * PixelFormat::Rgba32F.bytes_per_pixel(),
            std::mem::align_of::<Vec4>(),
        )?;
        arena.push(
            pixels * PixelFormat::Rgba8.bytes_per_pixel(),
            std::mem::align_of::<u32>(),
        )?;

        let tiles = grid.tiles().map(|tile| Mutex::new(TileSamples::new(tile))).collect();
        Ok(Self { grid, tiles })
    }

    #[inline]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Lock one tile's samples.
    #[inline]
    pub fn lock_tile(&self, index: usize) -> MutexGuard<'_, TileSamples> {
        self.tiles[index].lock()
    }

    /// Fold a sample into pixel (x, y). See [`TileSamples::commit`].
    pub fn commit(&self, x: u32, y: u32, sample: Color, previous: u32) -> u32 {
        let index = self.grid.tile_index_of(x, y);
        self.lock_tile(index).commit(x, y, sample, previous)
    }

    /// Linear running average at pixel (x, y).
    pub fn average(&self, x: u32, y: u32) -> Vec4 {
        let tile = self.lock_tile(self.grid.tile_index_of(x, y));
        tile.linear[tile.tile.local_offset(x, y)]
    }

    /// Display word at pixel (x, y).
    pub fn display_pixel(&self, x: u32, y: u32) -> u32 {
        let tile = self.lock_tile(self.grid.tile_index_of(x, y));
        tile.display[tile.tile.local_offset(x, y)]
    }

    /// Copy the display buffer into a row-major image of the same size.
    pub fn copy_display_to(&self, image: &mut Image) {
        debug_assert_eq!((image.width, image.height), (self.grid.width, self.grid.height));
        let stride = image.width as usize;
        for tile in &self.tiles {
            let samples = tile.lock();
            let Tile { x, y, width, .. } = samples.tile;
            let width = width as usize;
            for (row, run) in samples.display.chunks_exact(width).enumerate() {
                let start = (y as usize + row) * stride + x as usize;
                image.pixels[start..start + width].copy_from_slice(run);
            }
        }
    }
}

/// Accumulation buffers plus the number of completed frames they hold.
#[derive(Debug)]
pub struct Accumulator {
    buffer: Arc<AccumulationBuffer>,
    samples: u32,
}

impl Accumulator {
    /// Zero-sized accumulator; the first reset allocates.
    pub fn empty() -> Self {
        Self {
            buffer: Arc::new(AccumulationBuffer {
                grid: TileGrid::new(0, 0, 1),
                tiles: Vec::new(),
            }),
            samples: 0,
        }
    }

    /// Drop all accumulated samples and reallocate for a new resolution.
    ///
    /// The arena is reset first; on error the accumulator keeps its previous
    /// buffers and sample count.
    pub fn reset(
        &mut self,
        width: u32,
        height: u32,
        tile_size: u32,
        arena: &mut FrameArena,
    ) -> Result<(), ArenaError> {
        arena.reset();
        let grid = TileGrid::new(width, height, tile_size);
        self.buffer = Arc::new(AccumulationBuffer::new(grid, arena)?);
        self.samples = 0;
        log::debug!(
            "Accumulation buffers {}x{}: {} tiles, arena {} / {} bytes",
            width,
            height,
            grid.tile_count(),
            arena.used(),
            arena.capacity()
        );
        Ok(())
    }

    /// Count one fully rendered frame.
    #[inline]
    pub fn finish_frame(&mut self) {
        self.samples += 1;
    }

    /// Samples per pixel accumulated since the last reset.
    #[inline]
    pub fn sample_count(&self) -> u32 {
        self.samples
    }

    #[inline]
    pub fn buffer(&self) -> &Arc<AccumulationBuffer> {
        &self.buffer
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.buffer.grid.width, self.buffer.grid.height)
    }
}

/// Incremental mean: `sample / (n + 1) + old * n / (n + 1)`. Alpha is 1.
#[inline]
pub fn blend_sample(old: Vec4, sample: Color, previous: u32) -> Vec4 {
    let total = previous as f32 + 1.0;
    let blended = sample.extend(1.0) / total + old * (previous as f32 / total);
    blended.truncate().extend(1.0)
}

/// Approximate sRGB encoding: linear below 0.0031308, square root above.
#[inline]
pub fn linear_to_srgb(linear: f32) -> f32 {
    let linear = linear.clamp(0.0, 1.0);
    if linear < 0.0031308 {
        linear * 12.92
    } else {
        linear.sqrt()
    }
}

/// Gamma-encode a linear color and quantize to 8-bit RGBA with opaque alpha.
#[inline]
pub fn color_to_rgba(color: Vec4) -> [u8; 4] {
    let quantize = |c: f32| (linear_to_srgb(c).clamp(0.0, 1.0) * 255.0) as u8;
    [quantize(color.x), quantize(color.y), quantize(color.z), 255]
}

/// Pack as `r | g << 8 | b << 16 | a << 24`.
#[inline]
pub fn pack_rgba(rgba: [u8; 4]) -> u32 {
    u32::from_le_bytes(rgba)
}
