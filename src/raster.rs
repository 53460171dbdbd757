//! Readable rasters and the in-memory raster field.
//!
//! No-data handling is decided here, once: every value equal to a band's
//! declared no-data value is replaced by NaN when it is read through
//! [`RasterSource::read_masked`] or stored in a [`RasterField`]. Everything
//! downstream treats NaN as the only missing marker.

use crate::error::{DisaggError, Result};
use crate::grid::GridDescriptor;
use ndarray::{s, Array2, Array3, ArrayView2, Axis};

/// A georeferenced raster that can be read window by window.
///
/// Bands are 0-based. Offsets and sizes are `(x, y)` pairs in pixels, as in GDAL.
pub trait RasterSource {
    fn grid(&self) -> Result<GridDescriptor>;

    fn band_count(&self) -> usize;

    fn no_data_value(&self, band: usize) -> Result<Option<f64>>;

    /// Raw samples of a window, shaped `(rows, cols)`.
    fn read_window(
        &self,
        band: usize,
        offset: (usize, usize),
        size: (usize, usize),
    ) -> Result<Array2<f64>>;

    /// Like [`read_window`](Self::read_window) with no-data replaced by NaN.
    fn read_masked(
        &self,
        band: usize,
        offset: (usize, usize),
        size: (usize, usize),
    ) -> Result<Array2<f64>> {
        let mut data = self.read_window(band, offset, size)?;
        mask_no_data(&mut data, self.no_data_value(band)?);
        Ok(data)
    }
}

/// Replace every sample equal to `no_data` with NaN.
///
/// A NaN no-data value needs no work: those samples are already NaN.
pub fn mask_no_data<D: ndarray::Dimension>(
    data: &mut ndarray::Array<f64, D>,
    no_data: Option<f64>,
) {
    if let Some(nd) = no_data.filter(|v| !v.is_nan()) {
        data.mapv_inplace(|v| if v == nd { f64::NAN } else { v });
    }
}

pub(crate) fn check_band(band: usize, band_count: usize) -> Result<()> {
    if band >= band_count {
        return Err(DisaggError::BandOutOfRange(band, band_count));
    }
    Ok(())
}

pub(crate) fn check_window(
    raster_size: (usize, usize),
    offset: (usize, usize),
    size: (usize, usize),
) -> Result<()> {
    let (size_x, size_y) = raster_size;
    if offset.0 + size.0 > size_x || offset.1 + size.1 > size_y {
        return Err(DisaggError::WindowOutOfBounds {
            needed_x: offset.0 + size.0,
            needed_y: offset.1 + size.1,
            size_x,
            size_y,
        });
    }
    Ok(())
}

/// In-memory banded raster, shaped `(rows, cols, bands)`.
#[derive(Debug, Clone)]
pub struct RasterField {
    grid: GridDescriptor,
    data: Array3<f64>,
}

impl RasterField {
    /// Build a field, canonicalising `no_data` to NaN.
    pub fn new(grid: GridDescriptor, mut data: Array3<f64>, no_data: Option<f64>) -> Result<Self> {
        grid.validate()?;
        let (rows, cols, bands) = data.dim();
        if rows != grid.size_y || cols != grid.size_x || bands == 0 {
            return Err(DisaggError::InvalidDimensions(cols, rows));
        }
        mask_no_data(&mut data, no_data);
        Ok(Self { grid, data })
    }

    /// Single-band field.
    pub fn from_band(
        grid: GridDescriptor,
        band: Array2<f64>,
        no_data: Option<f64>,
    ) -> Result<Self> {
        Self::new(grid, band.insert_axis(Axis(2)), no_data)
    }

    /// Read every band of `source` into memory.
    pub fn from_source<S: RasterSource + ?Sized>(source: &S) -> Result<Self> {
        let grid = source.grid()?;
        grid.validate()?;
        let size = (grid.size_x, grid.size_y);
        let bands = (0..source.band_count())
            .map(|band| source.read_masked(band, (0, 0), size))
            .collect::<Result<Vec<_>>>()?;
        let views: Vec<ArrayView2<f64>> = bands.iter().map(|b| b.view()).collect();
        let data = ndarray::stack(Axis(2), &views)?;
        Self::new(grid, data, None)
    }

    pub fn descriptor(&self) -> &GridDescriptor {
        &self.grid
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn band(&self, band: usize) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(2), band)
    }
}

impl RasterSource for RasterField {
    fn grid(&self) -> Result<GridDescriptor> {
        Ok(self.grid.clone())
    }

    fn band_count(&self) -> usize {
        self.data.dim().2
    }

    fn no_data_value(&self, band: usize) -> Result<Option<f64>> {
        check_band(band, self.band_count())?;
        Ok(None)
    }

    fn read_window(
        &self,
        band: usize,
        offset: (usize, usize),
        size: (usize, usize),
    ) -> Result<Array2<f64>> {
        check_band(band, self.band_count())?;
        check_window((self.grid.size_x, self.grid.size_y), offset, size)?;
        let (x, y) = offset;
        let (w, h) = size;
        Ok(self.data.slice(s![y..y + h, x..x + w, band]).to_owned())
    }
}
