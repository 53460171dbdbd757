//! Contract with the external reprojection engine.

use crate::error::Result;
use crate::grid::Extent;
use crate::raster::RasterSource;
use clap::ValueEnum;
use std::fmt;

/// Resampling algorithm requested from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Resampling {
    Nearest,
    #[default]
    Bilinear,
    Cubic,
    Average,
}

impl Resampling {
    /// Name understood by `gdalwarp -r`.
    pub fn as_gdal_str(&self) -> &'static str {
        match self {
            Resampling::Nearest => "near",
            Resampling::Bilinear => "bilinear",
            Resampling::Cubic => "cubic",
            Resampling::Average => "average",
        }
    }
}

impl fmt::Display for Resampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_gdal_str())
    }
}

/// One reprojection call. Unset resolution or bounds leave the choice to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpRequest {
    pub target_projection: String,
    /// Positive pixel size `(x, y)`.
    pub resolution: Option<(f64, f64)>,
    pub bounds: Option<Extent>,
    pub resampling: Resampling,
}

impl WarpRequest {
    pub fn to_projection(target_projection: impl Into<String>, resampling: Resampling) -> Self {
        Self {
            target_projection: target_projection.into(),
            resolution: None,
            bounds: None,
            resampling,
        }
    }

    pub fn with_resolution(mut self, x: f64, y: f64) -> Self {
        self.resolution = Some((x.abs(), y.abs()));
        self
    }

    pub fn with_bounds(mut self, bounds: Extent) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

/// Reprojection engine. Errors are returned as produced by the engine.
pub trait Warper {
    type Raster: RasterSource;

    fn warp(&self, source: &Self::Raster, request: &WarpRequest) -> Result<Self::Raster>;
}
