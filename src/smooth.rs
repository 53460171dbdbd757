use crate::error::Result;
use crate::raster::{check_band, RasterSource};
use crate::tiles::Tiling;
use clap::ValueEnum;
use log::{debug, info};
use ndarray::parallel::prelude::*;
use ndarray::{s, Array2, ArrayView2, Axis};

/// Binomial 3x3 kernel, row-major.
const KERNEL: [[f64; 3]; 3] = [[1.0, 2.0, 1.0], [2.0, 4.0, 2.0], [1.0, 2.0, 1.0]];

/// How the 3x3 window is completed outside the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BorderMode {
    /// Repeat the edge cell (`a a | a b c | c c`).
    #[default]
    Replicate,
    /// Reflect about the edge cell (`b a | a b c | c b`).
    Mirror,
    /// Cells outside the field are missing.
    Invalid,
}

/// Map a neighbour index onto the field, or `None` when it is missing.
fn resolve(index: isize, len: usize, mode: BorderMode) -> Option<usize> {
    let last = len as isize - 1;
    if (0..=last).contains(&index) {
        return Some(index as usize);
    }
    match mode {
        BorderMode::Replicate => Some(index.clamp(0, last) as usize),
        BorderMode::Mirror => {
            let mirrored = if index < 0 { -index } else { 2 * last - index };
            Some(mirrored.clamp(0, last) as usize)
        }
        BorderMode::Invalid => None,
    }
}

fn smooth_cell(data: &ArrayView2<f64>, row: usize, col: usize, mode: BorderMode) -> f64 {
    let center = data[[row, col]];
    // Invalid cells are never smoothed
    if center.is_nan() {
        return center;
    }

    let (nrows, ncols) = data.dim();
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    for (dr, kernel_row) in KERNEL.iter().enumerate() {
        let Some(r) = resolve(row as isize + dr as isize - 1, nrows, mode) else {
            continue;
        };
        for (dc, &weight) in kernel_row.iter().enumerate() {
            let Some(c) = resolve(col as isize + dc as isize - 1, ncols, mode) else {
                continue;
            };
            let value = data[[r, c]];
            if !value.is_nan() {
                weighted_sum += weight * value;
                weight_sum += weight;
            }
        }
    }

    if weight_sum > 0.0 {
        weighted_sum / weight_sum
    } else {
        center
    }
}

/// 3x3 binomial smoothing with edge replication.
///
/// NaN cells are passed through unchanged and never contribute to their
/// neighbours.
pub fn binomial_smoother(data: ArrayView2<f64>) -> Array2<f64> {
    binomial_smoother_with_border(data, BorderMode::default())
}

pub fn binomial_smoother_with_border(data: ArrayView2<f64>, mode: BorderMode) -> Array2<f64> {
    let mut out = Array2::from_elem(data.dim(), f64::NAN);
    out.axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(row, mut out_row)| {
            for (col, cell) in out_row.iter_mut().enumerate() {
                *cell = smooth_cell(&data, row, col, mode);
            }
        });
    out
}

#[derive(Debug, Clone, Copy)]
pub struct SmoothOptions {
    pub border: BorderMode,
    /// Tile edge in pixels.
    pub tile_size: usize,
}

impl Default for SmoothOptions {
    fn default() -> Self {
        Self {
            border: BorderMode::default(),
            tile_size: 1024,
        }
    }
}

/// Smooth one band of `source` tile by tile.
///
/// Each tile is read with one pixel of padding, so the result is identical
/// to smoothing the whole band at once.
pub fn smooth_band<S: RasterSource + ?Sized>(
    source: &S,
    band: usize,
    options: SmoothOptions,
) -> Result<Array2<f64>> {
    check_band(band, source.band_count())?;
    let grid = source.grid()?;
    grid.validate()?;

    let tiles = Tiling::new(grid.size_x, grid.size_y, options.tile_size)?.with_halo(1);
    info!(
        "Smoothing band {} ({}x{}, {} tiles, border {:?})",
        band,
        grid.size_x,
        grid.size_y,
        tiles.len(),
        options.border
    );

    let mut out = Array2::from_elem((grid.size_y, grid.size_x), f64::NAN);
    for tile in tiles.iter() {
        let padded = source.read_masked(band, tile.halo.offset(), tile.halo.size())?;
        let smoothed = binomial_smoother_with_border(padded.view(), options.border);
        let (core_rows, core_cols) = tile.core_in_halo();
        debug!("Smoothed tile {:?}", tile.core);
        out.slice_mut(s![tile.core.rows(), tile.core.cols()])
            .assign(&smoothed.slice(s![core_rows, core_cols]));
    }
    Ok(out)
}
