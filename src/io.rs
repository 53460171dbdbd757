use crate::error::{DisaggError, Result};
use crate::format::OutputFormat;
use crate::grid::GridDescriptor;
use crate::raster::{check_band, check_window, RasterSource};
use gdal::cpl::CslStringList;
use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager, Metadata};
use log::{debug, info};
use ndarray::{Array2, ArrayView3, Axis};
use std::path::Path;

/// Open a raster for reading.
pub fn open_raster<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    info!("Opening raster: {}", path.as_ref().display());
    Ok(Dataset::open(path)?)
}

impl RasterSource for Dataset {
    fn grid(&self) -> Result<GridDescriptor> {
        let (size_x, size_y) = self.raster_size();
        if size_x == 0 || size_y == 0 {
            return Err(DisaggError::InvalidDimensions(size_x, size_y));
        }
        Ok(GridDescriptor::new(
            self.projection(),
            self.geo_transform()?,
            size_x,
            size_y,
        ))
    }

    fn band_count(&self) -> usize {
        self.raster_count() as usize
    }

    fn no_data_value(&self, band: usize) -> Result<Option<f64>> {
        check_band(band, self.band_count())?;
        Ok(self.rasterband(band + 1)?.no_data_value())
    }

    fn read_window(
        &self,
        band: usize,
        offset: (usize, usize),
        size: (usize, usize),
    ) -> Result<Array2<f64>> {
        check_band(band, self.band_count())?;
        check_window(self.raster_size(), offset, size)?;

        let rasterband = self.rasterband(band + 1)?;
        let buffer = rasterband.read_as::<f64>(
            (offset.0 as isize, offset.1 as isize),
            size,
            size,
            None,
        )?;
        let data_vec: Vec<f64> = buffer.into_iter().collect();
        Ok(Array2::from_shape_vec((size.1, size.0), data_vec)?)
    }
}

/// Write a `(rows, cols, bands)` array as a float32 raster.
///
/// The container is picked from `destination` (see [`OutputFormat`]); `MEM`
/// keeps the dataset in memory. `compression` only applies to GeoTIFF.
/// `field_names`, when given, become band descriptions, and with the
/// `netcdf` feature also the names of the netCDF variables.
pub fn save_img(
    data: ArrayView3<f64>,
    geotransform: &[f64; 6],
    projection: &str,
    destination: &str,
    no_data: f64,
    field_names: &[String],
    compression: &str,
) -> Result<Dataset> {
    let format = OutputFormat::from_destination(destination);
    let (rows, cols, bands) = data.dim();
    debug!(
        "Creating {} dataset {} ({}x{}, {} bands)",
        format.driver_name(),
        destination,
        cols,
        rows,
        bands
    );

    let driver = DriverManager::get_driver_by_name(format.driver_name())?;
    let options = format.creation_options(compression)?;
    let path = if format.is_persisted() { destination } else { "" };

    let mut dataset = if options.is_empty() {
        driver.create_with_band_type::<f32, _>(path, cols, rows, bands)?
    } else {
        let mut gdal_options = CslStringList::new();
        for opt in options {
            gdal_options.add_string(&opt)?;
        }
        driver.create_with_band_type_with_options::<f32, _>(path, cols, rows, bands, &gdal_options)?
    };

    dataset.set_projection(projection)?;
    dataset.set_geo_transform(geotransform)?;

    for (i, band_data) in data.axis_iter(Axis(2)).enumerate() {
        let mut raster_band = dataset.rasterband(i + 1)?;
        let values: Vec<f32> = band_data.iter().map(|&v| v as f32).collect();
        let mut buffer = Buffer::new((cols, rows), values);
        raster_band.write((0, 0), (cols, rows), &mut buffer)?;
        raster_band.set_no_data_value(Some(no_data))?;
        if let Some(name) = field_names.get(i) {
            raster_band.set_description(name)?;
        }
    }

    #[cfg(feature = "netcdf")]
    if format == OutputFormat::NetCdf && !field_names.is_empty() {
        drop(dataset);
        let names = &field_names[..field_names.len().min(bands)];
        crate::netcdf_names::rename_band_variables(destination, names)?;
        dataset = Dataset::open(destination)?;
    }

    if format.is_persisted() {
        info!("Saved {}", destination);
    }
    Ok(dataset)
}

/// Single-band convenience wrapper around [`save_img`].
pub fn save_band(
    data: &Array2<f64>,
    grid: &GridDescriptor,
    destination: &str,
    no_data: f64,
    compression: &str,
) -> Result<Dataset> {
    save_img(
        data.view().insert_axis(Axis(2)),
        &grid.geotransform,
        &grid.projection,
        destination,
        no_data,
        &[],
        compression,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::DEFAULT_COMPRESSION;
    use crate::raster::RasterField;
    use ndarray::Array3;

    fn grid() -> GridDescriptor {
        GridDescriptor::north_up("", (500_000.0, 4_000_000.0), 30.0, 30.0, 4, 3)
    }

    #[test]
    fn test_memory_round_trip() {
        let data = Array3::from_shape_fn((3, 4, 2), |(r, c, b)| (b * 100 + r * 10 + c) as f64);
        let grid = grid();
        let geotransform = grid.geotransform;
        let ds = save_img(data.view(), &geotransform, "", "MEM", -9999.0, &[], "NONE").unwrap();

        assert_eq!(ds.band_count(), 2);
        assert_eq!(ds.grid().unwrap().geotransform, grid.geotransform);
        assert_eq!(ds.no_data_value(1).unwrap(), Some(-9999.0));
        let field = RasterField::from_source(&ds).unwrap();
        assert_eq!(field.data(), &data);
    }

    #[test]
    fn test_read_masked_replaces_no_data() {
        let mut band = Array2::from_elem((3, 4), 1.5);
        band[[1, 2]] = -9999.0;
        let ds = save_band(&band, &grid(), "MEM", -9999.0, DEFAULT_COMPRESSION).unwrap();
        let window = ds.read_masked(0, (1, 1), (3, 2)).unwrap();
        assert_eq!(window.dim(), (2, 3));
        assert!(window[[0, 1]].is_nan());
        assert_eq!(window[[1, 2]], 1.5);
    }

    #[test]
    fn test_read_window_out_of_bounds() {
        let band = Array2::zeros((3, 4));
        let ds = save_band(&band, &grid(), "MEM", 0.0, DEFAULT_COMPRESSION).unwrap();
        assert!(matches!(
            ds.read_window(0, (2, 0), (3, 1)),
            Err(DisaggError::WindowOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_geotiff_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.tif");
        let destination = path.to_str().unwrap();
        let data = Array3::from_elem((3, 4, 1), 2.0);
        let names = vec!["mean_1".to_string()];
        let geotransform = grid().geotransform;
        let ds =
            save_img(data.view(), &geotransform, "", destination, f64::NAN, &names, "LZW").unwrap();
        drop(ds);

        assert!(path.exists());
        let reopened = open_raster(&path).unwrap();
        assert_eq!(reopened.band_count(), 1);
        assert_eq!(reopened.rasterband(1).unwrap().description().unwrap(), "mean_1");
        let values = reopened.read_window(0, (0, 0), (4, 3)).unwrap();
        assert!(values.iter().all(|&v| v == 2.0));
    }

    #[cfg(feature = "netcdf")]
    #[test]
    fn test_netcdf_variables_take_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.nc");
        let destination = path.to_str().unwrap();
        let wkt = gdal::spatial_ref::SpatialRef::from_epsg(32633)
            .unwrap()
            .to_wkt()
            .unwrap();
        let data = Array3::from_shape_fn((3, 4, 2), |(r, c, b)| (b * 10 + r + c) as f64);
        let names = vec!["mean_1".to_string(), "mean_2".to_string()];
        let ds = save_img(
            data.view(),
            &grid().geotransform,
            &wkt,
            destination,
            f64::NAN,
            &names,
            DEFAULT_COMPRESSION,
        )
        .unwrap();
        drop(ds);

        for (b, name) in names.iter().enumerate() {
            let variable = Dataset::open(format!("NETCDF:\"{}\":{}", destination, name)).unwrap();
            let values = variable.read_window(0, (0, 0), (4, 3)).unwrap();
            assert_eq!(values[[2, 3]], (b * 10 + 5) as f64);
        }
        assert!(Dataset::open(format!("NETCDF:\"{}\":Band1", destination)).is_err());
    }
}
