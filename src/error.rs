use thiserror::Error;

#[derive(Error, Debug)]
pub enum DisaggError {
    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("Array shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("String contains an interior NUL byte: {0}")]
    InvalidString(#[from] std::ffi::NulError),

    #[error("Raster has invalid dimensions: {0}x{1}")]
    InvalidDimensions(usize, usize),

    #[error("Pixel size is invalid: {0} (width must be positive, height negative)")]
    InvalidPixelSize(f64),

    #[error("Rotated geotransforms are not supported (rotation terms {0}, {1})")]
    RotatedGrid(f64, f64),

    #[error("Geotransform contains non-finite coefficients: {0:?}")]
    NonFiniteTransform([f64; 6]),

    #[error("Low/high resolution pixel size ratio along {axis} is not a positive integer: {ratio}")]
    MisalignedGrids { axis: &'static str, ratio: f64 },

    #[error("Rasters are not in the same projection")]
    ProjectionMismatch,

    #[error("Raster origins differ by ({dx}, {dy}) projection units")]
    OriginMismatch { dx: f64, dy: f64 },

    #[error("Window of {needed_x}x{needed_y} pixels exceeds raster of {size_x}x{size_y}")]
    WindowOutOfBounds {
        needed_x: usize,
        needed_y: usize,
        size_x: usize,
        size_y: usize,
    },

    #[error("Band {0} out of range (raster has {1} bands)")]
    BandOutOfRange(usize, usize),

    #[cfg(feature = "netcdf")]
    #[error("netCDF error: {0}")]
    NetCdf(String),

    #[error("Resampling failed: {0}")]
    ResamplingFailed(String),

    #[error("Invalid tile size: {0} (must be positive)")]
    InvalidTileSize(usize),

    #[error("Invalid compression type: {0}")]
    InvalidCompression(String),
}

impl DisaggError {
    /// True for the errors raised when a grid's geometry itself is unusable.
    pub fn is_invalid_geometry(&self) -> bool {
        matches!(
            self,
            DisaggError::InvalidDimensions(..)
                | DisaggError::InvalidPixelSize(_)
                | DisaggError::RotatedGrid(..)
                | DisaggError::NonFiniteTransform(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DisaggError>;
