//! Splitting a raster into square tiles, optionally read with a halo.

use crate::error::{DisaggError, Result};
use log::debug;
use std::ops::Range;

/// Rectangle of pixels, origin at the upper-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Window {
    pub fn offset(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn rows(&self) -> Range<usize> {
        self.y..self.y + self.height
    }

    pub fn cols(&self) -> Range<usize> {
        self.x..self.x + self.width
    }

    /// Same window scaled by whole pixel groups.
    pub fn scaled(&self, cols: usize, rows: usize) -> Window {
        Window {
            x: self.x * cols,
            y: self.y * rows,
            width: self.width * cols,
            height: self.height * rows,
        }
    }
}

/// The cells a tile produces (`core`) and the cells it has to read (`halo`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub core: Window,
    pub halo: Window,
}

impl Tile {
    /// Rows and columns of the core, relative to the halo window.
    pub fn core_in_halo(&self) -> (Range<usize>, Range<usize>) {
        let top = self.core.y - self.halo.y;
        let left = self.core.x - self.halo.x;
        (top..top + self.core.height, left..left + self.core.width)
    }
}

/// Row-major tiling of a `width x height` raster.
#[derive(Debug, Clone, Copy)]
pub struct Tiling {
    width: usize,
    height: usize,
    tile_size: usize,
    halo: usize,
}

impl Tiling {
    pub fn new(width: usize, height: usize, tile_size: usize) -> Result<Self> {
        if tile_size == 0 {
            return Err(DisaggError::InvalidTileSize(tile_size));
        }
        Ok(Self {
            width,
            height,
            tile_size,
            halo: 0,
        })
    }

    /// Grow every read window by `halo` pixels, clipped to the raster.
    pub fn with_halo(mut self, halo: usize) -> Self {
        self.halo = halo;
        self
    }

    pub fn tiles_x(&self) -> usize {
        self.width.div_ceil(self.tile_size)
    }

    pub fn tiles_y(&self) -> usize {
        self.height.div_ceil(self.tile_size)
    }

    pub fn len(&self) -> usize {
        self.tiles_x() * self.tiles_y()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn tile_at(&self, tx: usize, ty: usize) -> Tile {
        let x = tx * self.tile_size;
        let y = ty * self.tile_size;
        let core = Window {
            x,
            y,
            width: self.tile_size.min(self.width - x),
            height: self.tile_size.min(self.height - y),
        };

        let halo_x = x.saturating_sub(self.halo);
        let halo_y = y.saturating_sub(self.halo);
        let halo = Window {
            x: halo_x,
            y: halo_y,
            width: (x + core.width + self.halo).min(self.width) - halo_x,
            height: (y + core.height + self.halo).min(self.height) - halo_y,
        };
        Tile { core, halo }
    }

    pub fn iter(&self) -> impl Iterator<Item = Tile> + '_ {
        debug!(
            "Tiling {}x{} raster into {}x{} tiles of {} (halo {})",
            self.width,
            self.height,
            self.tiles_x(),
            self.tiles_y(),
            self.tile_size,
            self.halo
        );
        (0..self.tiles_y())
            .flat_map(move |ty| (0..self.tiles_x()).map(move |tx| self.tile_at(tx, ty)))
    }
}
