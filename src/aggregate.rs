//! Aggregation of high resolution pixels into low resolution pixel groups.

use crate::crs::same_projection;
use crate::error::{DisaggError, Result};
use crate::grid::GridDescriptor;
use crate::raster::RasterSource;
use crate::tiles::Tiling;
use log::{debug, info};
use ndarray::{s, Array2, Array3, ArrayView2, Zip};
use rayon::prelude::*;

/// Relative tolerance when deciding that a pixel size ratio is a whole number.
const RATIO_TOLERANCE: f64 = 1e-6;
/// Allowed origin offset, as a fraction of a high resolution pixel.
const ORIGIN_TOLERANCE: f64 = 0.01;

/// Number of high resolution pixels tiling one low resolution pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelGroup {
    pub rows: usize,
    pub cols: usize,
}

impl PixelGroup {
    /// Ratio between two co-registered grids.
    ///
    /// Fails unless both grids are valid, share projection and upper-left
    /// corner, and the low resolution pixel is a whole multiple of the high
    /// resolution pixel on both axes.
    pub fn between(high: &GridDescriptor, low: &GridDescriptor) -> Result<Self> {
        high.validate()?;
        low.validate()?;

        if !same_projection(&high.projection, &low.projection) {
            return Err(DisaggError::ProjectionMismatch);
        }

        let dx = low.origin_x() - high.origin_x();
        let dy = low.origin_y() - high.origin_y();
        let (high_x, high_y) = high.pixel_size();
        if dx.abs() > ORIGIN_TOLERANCE * high_x || dy.abs() > ORIGIN_TOLERANCE * high_y {
            return Err(DisaggError::OriginMismatch { dx, dy });
        }

        Ok(Self {
            rows: whole_ratio(low.pixel_height() / high.pixel_height(), "y")?,
            cols: whole_ratio(low.pixel_width() / high.pixel_width(), "x")?,
        })
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn whole_ratio(ratio: f64, axis: &'static str) -> Result<usize> {
    let rounded = ratio.round();
    if !ratio.is_finite() || rounded < 1.0 || (ratio - rounded).abs() > RATIO_TOLERANCE * rounded
    {
        return Err(DisaggError::MisalignedGrids { axis, ratio });
    }
    Ok(rounded as usize)
}

/// Per low resolution pixel statistics, shaped `(rows, cols, bands)`.
#[derive(Debug, Clone)]
pub struct AggregatedStats {
    pub grid: GridDescriptor,
    pub mean: Array3<f64>,
    pub std: Array3<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions {
    /// Tile edge in low resolution pixels.
    pub tile_size: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self { tile_size: 256 }
    }
}

/// Mean and population standard deviation of the non-NaN samples.
/// Both are NaN when every sample is missing.
pub fn nan_mean_std(block: ArrayView2<f64>) -> (f64, f64) {
    let (count, sum) = block
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0usize, 0.0), |(n, s), &v| (n + 1, s + v));
    if count == 0 {
        return (f64::NAN, f64::NAN);
    }
    let mean = sum / count as f64;
    let sq_dev: f64 = block
        .iter()
        .filter(|v| !v.is_nan())
        .map(|&v| (v - mean) * (v - mean))
        .sum();
    (mean, (sq_dev / count as f64).sqrt())
}

/// Block mean and standard deviation of `data` for groups of `group` pixels.
///
/// The output has `rows / group.rows` rows and `cols / group.cols` columns;
/// trailing samples that do not fill a whole group are ignored.
pub fn block_statistics(data: ArrayView2<f64>, group: PixelGroup) -> (Array2<f64>, Array2<f64>) {
    let stats = Zip::from(data.exact_chunks((group.rows, group.cols))).map_collect(nan_mean_std);
    (stats.mapv(|(m, _)| m), stats.mapv(|(_, s)| s))
}

/// Aggregate every band of `high` onto the co-registered `low` grid.
///
/// The grids must already be aligned (see [`crate::align`]); the check runs
/// before any pixel is read. All-missing groups come out as NaN.
pub fn resample_high_res_to_low_res<S: RasterSource + ?Sized>(
    high: &S,
    low: &GridDescriptor,
    options: AggregateOptions,
) -> Result<AggregatedStats> {
    let high_grid = high.grid()?;
    let group = PixelGroup::between(&high_grid, low)?;

    let needed_x = group.cols * low.size_x;
    let needed_y = group.rows * low.size_y;
    if needed_x > high_grid.size_x || needed_y > high_grid.size_y {
        return Err(DisaggError::WindowOutOfBounds {
            needed_x,
            needed_y,
            size_x: high_grid.size_x,
            size_y: high_grid.size_y,
        });
    }

    let bands = high.band_count();
    let tiles = Tiling::new(low.size_x, low.size_y, options.tile_size)?;
    info!(
        "Aggregating {} band(s) into {}x{} low resolution pixels of {}x{} ({} tiles)",
        bands,
        low.size_x,
        low.size_y,
        group.cols,
        group.rows,
        tiles.len()
    );

    let shape = (low.size_y, low.size_x, bands);
    let mut mean = Array3::from_elem(shape, f64::NAN);
    let mut std = Array3::from_elem(shape, f64::NAN);

    for tile in tiles.iter() {
        let window = tile.core.scaled(group.cols, group.rows);
        debug!(
            "Reading high resolution window {:?} of size {:?}",
            window.offset(),
            window.size()
        );

        let windows = (0..bands)
            .map(|band| high.read_masked(band, window.offset(), window.size()))
            .collect::<Result<Vec<_>>>()?;
        let stats: Vec<(Array2<f64>, Array2<f64>)> = windows
            .par_iter()
            .map(|window| block_statistics(window.view(), group))
            .collect();

        let (rows, cols) = (tile.core.rows(), tile.core.cols());
        for (band, (band_mean, band_std)) in stats.iter().enumerate() {
            mean.slice_mut(s![rows.clone(), cols.clone(), band])
                .assign(band_mean);
            std.slice_mut(s![rows.clone(), cols.clone(), band])
                .assign(band_std);
        }
    }

    Ok(AggregatedStats {
        grid: low.clone(),
        mean,
        std,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::RasterField;
    use ndarray::{arr2, Array2};

    fn high_grid(size_x: usize, size_y: usize) -> GridDescriptor {
        GridDescriptor::north_up("EPSG:32633", (400_000.0, 5_000_000.0), 10.0, 10.0, size_x, size_y)
    }

    fn low_grid(group: PixelGroup, size_x: usize, size_y: usize) -> GridDescriptor {
        GridDescriptor::north_up(
            "EPSG:32633",
            (400_000.0, 5_000_000.0),
            10.0 * group.cols as f64,
            10.0 * group.rows as f64,
            size_x,
            size_y,
        )
    }

    fn naive_stats(values: &[f64]) -> (f64, f64) {
        let valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if valid.is_empty() {
            return (f64::NAN, f64::NAN);
        }
        let n = valid.len() as f64;
        let mean = valid.iter().sum::<f64>() / n;
        let var = valid.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        (mean, var.sqrt())
    }

    #[test]
    fn test_nan_mean_std_population() {
        let block = arr2(&[[2.0, 4.0], [4.0, 4.0], [5.0, 5.0], [7.0, 9.0]]);
        let (mean, std) = nan_mean_std(block.view());
        assert!((mean - 5.0).abs() < 1e-12);
        assert!((std - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_nan_mean_std_all_missing() {
        let block = Array2::from_elem((3, 3), f64::NAN);
        let (mean, std) = nan_mean_std(block.view());
        assert!(mean.is_nan());
        assert!(std.is_nan());
    }

    #[test]
    fn test_block_statistics_layout() {
        let data = arr2(&[
            [1.0, 1.0, 5.0, 7.0],
            [1.0, 1.0, 5.0, 7.0],
            [0.0, 2.0, 9.0, 9.0],
            [4.0, 6.0, 9.0, 9.0],
        ]);
        let (mean, std) = block_statistics(data.view(), PixelGroup { rows: 2, cols: 2 });
        assert_eq!(mean, arr2(&[[1.0, 6.0], [3.0, 9.0]]));
        assert_eq!(std[[0, 0]], 0.0);
        assert!((std[[0, 1]] - 1.0).abs() < 1e-12);
        assert!((std[[1, 0]] - 5.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_matches_naive_reference() {
        let group = PixelGroup { rows: 3, cols: 4 };
        let (low_rows, low_cols) = (5, 7);
        let band0 = Array2::from_shape_fn((15, 28), |(r, c)| ((r * 31 + c * 17) % 23) as f64 * 0.5);
        let band1 = Array2::from_shape_fn((15, 28), |(r, c)| (r as f64).sin() * 100.0 + c as f64);
        let data = ndarray::stack(ndarray::Axis(2), &[band0.view(), band1.view()]).unwrap();
        let high = RasterField::new(high_grid(28, 15), data, None).unwrap();

        let stats = resample_high_res_to_low_res(
            &high,
            &low_grid(group, low_cols, low_rows),
            AggregateOptions::default(),
        )
        .unwrap();
        assert_eq!(stats.mean.dim(), (low_rows, low_cols, 2));

        for (b, band) in [&band0, &band1].iter().enumerate() {
            for r in 0..low_rows {
                for c in 0..low_cols {
                    let mut values = Vec::new();
                    for y in r * group.rows..(r + 1) * group.rows {
                        for x in c * group.cols..(c + 1) * group.cols {
                            values.push(band[[y, x]]);
                        }
                    }
                    let (mean, std) = naive_stats(&values);
                    assert!((stats.mean[[r, c, b]] - mean).abs() < 1e-9);
                    assert!((stats.std[[r, c, b]] - std).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_no_data_excluded() {
        let group = PixelGroup { rows: 2, cols: 2 };
        let band = arr2(&[
            [1.0, 3.0, -1.0, -1.0],
            [-1.0, 5.0, -1.0, -1.0],
        ]);
        let high = RasterField::from_band(high_grid(4, 2), band, Some(-1.0)).unwrap();
        let stats =
            resample_high_res_to_low_res(&high, &low_grid(group, 2, 1), AggregateOptions::default())
                .unwrap();

        let (mean, std) = naive_stats(&[1.0, 3.0, 5.0]);
        assert!((stats.mean[[0, 0, 0]] - mean).abs() < 1e-12);
        assert!((stats.std[[0, 0, 0]] - std).abs() < 1e-12);
        assert!(stats.mean[[0, 1, 0]].is_nan());
        assert!(stats.std[[0, 1, 0]].is_nan());
    }

    #[test]
    fn test_tiled_matches_single_tile() {
        let group = PixelGroup { rows: 2, cols: 3 };
        let band = Array2::from_shape_fn((22, 33), |(r, c)| {
            if (r + c) % 7 == 0 {
                f64::NAN
            } else {
                (r * c) as f64
            }
        });
        let high = RasterField::from_band(high_grid(33, 22), band, None).unwrap();
        let low = low_grid(group, 11, 11);

        let whole =
            resample_high_res_to_low_res(&high, &low, AggregateOptions { tile_size: 64 }).unwrap();
        let tiled =
            resample_high_res_to_low_res(&high, &low, AggregateOptions { tile_size: 4 }).unwrap();
        for (a, b) in whole.mean.iter().zip(tiled.mean.iter()) {
            assert!(a == b || (a.is_nan() && b.is_nan()));
        }
        for (a, b) in whole.std.iter().zip(tiled.std.iter()) {
            assert!(a == b || (a.is_nan() && b.is_nan()));
        }
    }

    #[test]
    fn test_partial_edge_is_cropped() {
        let group = PixelGroup { rows: 2, cols: 2 };
        let band = Array2::from_elem((5, 5), 3.0);
        let high = RasterField::from_band(high_grid(5, 5), band, None).unwrap();
        let stats =
            resample_high_res_to_low_res(&high, &low_grid(group, 2, 2), AggregateOptions::default())
                .unwrap();
        assert!(stats.mean.iter().all(|&v| v == 3.0));
        assert!(stats.std.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_non_integer_ratio_rejected() {
        let high = high_grid(30, 30);
        let low =
            GridDescriptor::north_up("EPSG:32633", (400_000.0, 5_000_000.0), 25.0, 20.0, 10, 10);
        assert!(matches!(
            PixelGroup::between(&high, &low),
            Err(DisaggError::MisalignedGrids { axis: "x", .. })
        ));
    }

    #[test]
    fn test_origin_mismatch_rejected() {
        let high = high_grid(30, 30);
        let low =
            GridDescriptor::north_up("EPSG:32633", (400_005.0, 5_000_000.0), 20.0, 20.0, 10, 10);
        assert!(matches!(
            PixelGroup::between(&high, &low),
            Err(DisaggError::OriginMismatch { .. })
        ));
    }

    #[test]
    fn test_projection_mismatch_rejected() {
        let high = high_grid(30, 30);
        let mut low = low_grid(PixelGroup { rows: 2, cols: 2 }, 10, 10);
        low.projection = String::new();
        assert!(matches!(
            PixelGroup::between(&high, &low),
            Err(DisaggError::ProjectionMismatch)
        ));
    }

    #[test]
    fn test_low_grid_larger_than_high_rejected() {
        let group = PixelGroup { rows: 2, cols: 2 };
        let high = RasterField::from_band(high_grid(4, 4), Array2::zeros((4, 4)), None).unwrap();
        assert!(matches!(
            resample_high_res_to_low_res(
                &high,
                &low_grid(group, 3, 2),
                AggregateOptions::default()
            ),
            Err(DisaggError::WindowOutOfBounds { needed_x: 6, .. })
        ));
    }

    #[test]
    fn test_ratio_tolerates_float_noise() {
        let high = GridDescriptor::north_up("", (0.0, 0.0), 0.1, 0.1, 30, 30);
        let low = GridDescriptor::north_up("", (0.0, 0.0), 0.1 * 3.0, 0.30000000000000004, 10, 10);
        assert_eq!(
            PixelGroup::between(&high, &low).unwrap(),
            PixelGroup { rows: 3, cols: 3 }
        );
    }
}
