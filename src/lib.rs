// Library exports for testing and reuse

pub mod aggregate;
pub mod align;
pub mod cli;
pub mod coords;
pub mod crs;
pub mod error;
pub mod format;
pub mod grid;
pub mod raster;
pub mod smooth;
pub mod tiles;
pub mod warp;

#[cfg(feature = "gdal")]
pub mod gdal_warp;
#[cfg(feature = "gdal")]
pub mod io;
#[cfg(feature = "netcdf")]
pub mod netcdf_names;

// Re-export commonly used types
pub use aggregate::{resample_high_res_to_low_res, AggregateOptions, AggregatedStats, PixelGroup};
pub use align::{plan_alignment, reproject_subset_low_res, resample_to_template, AlignedGrid};
pub use coords::{pixel_to_point, point_to_pixel, PixelCoordinate, Point};
pub use error::{DisaggError, Result};
pub use grid::{Extent, GridDescriptor};
pub use raster::{RasterField, RasterSource};
pub use smooth::{binomial_smoother, BorderMode};
pub use warp::{Resampling, WarpRequest, Warper};
