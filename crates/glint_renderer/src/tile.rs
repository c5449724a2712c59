//! Tile grid for the work queue.
//!
//! The image is cut into square tiles that are rendered independently. A tile
//! index is the unit of work handed to the scheduler; tiles are numbered in
//! row-major order across the grid.

/// Default tile size in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 128;

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// X coordinate of the tile's top-left corner
    pub x: u32,
    /// Y coordinate of the tile's top-left corner
    pub y: u32,
    /// Width of the tile in pixels
    pub width: u32,
    /// Height of the tile in pixels
    pub height: u32,
    /// Index of this tile in the grid
    pub index: usize,
}

impl Tile {
    /// Get the total number of pixels in this tile.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Offset of a global pixel inside this tile's row-major pixel run.
    #[inline]
    pub fn local_offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(x >= self.x && x < self.x + self.width);
        debug_assert!(y >= self.y && y < self.y + self.height);
        ((y - self.y) * self.width + (x - self.x)) as usize
    }

    /// Global pixel coordinates covered by this tile, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.y..self.y + self.height)
            .flat_map(move |y| (self.x..self.x + self.width).map(move |x| (x, y)))
    }
}

/// Partition of an image into tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub width: u32,
    pub height: u32,
    pub tile_size: u32,
    pub tiles_x: u32,
    pub tiles_y: u32,
}

impl TileGrid {
    /// Create a grid covering `width` x `height`. Partial tiles cover the
    /// right and bottom edges.
    pub fn new(width: u32, height: u32, tile_size: u32) -> Self {
        let tile_size = tile_size.max(1);
        Self {
            width,
            height,
            tile_size,
            tiles_x: width.div_ceil(tile_size),
            tiles_y: height.div_ceil(tile_size),
        }
    }

    #[inline]
    pub fn tile_count(&self) -> usize {
        self.tiles_x as usize * self.tiles_y as usize
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// The tile with the given index.
    pub fn tile(&self, index: usize) -> Tile {
        debug_assert!(index < self.tile_count());
        let tile_x = index as u32 % self.tiles_x;
        let tile_y = index as u32 / self.tiles_x;
        let x = tile_x * self.tile_size;
        let y = tile_y * self.tile_size;
        Tile {
            x,
            y,
            width: self.tile_size.min(self.width - x),
            height: self.tile_size.min(self.height - y),
            index,
        }
    }

    /// Index of the tile containing pixel (x, y).
    #[inline]
    pub fn tile_index_of(&self, x: u32, y: u32) -> usize {
        (y / self.tile_size * self.tiles_x + x / self.tile_size) as usize
    }

    /// All tiles in index order.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        (0..self.tile_count()).map(move |index| self.tile(index))
    }
}
