//! Georeferencing of north-up, axis-aligned rasters.

use crate::error::{DisaggError, Result};

/// Spatial extent in projection units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Extent {
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Whether `other` lies inside this extent, allowing `tolerance` units of slack on every side.
    pub fn contains(&self, other: &Extent, tolerance: f64) -> bool {
        other.west >= self.west - tolerance
            && other.east <= self.east + tolerance
            && other.south >= self.south - tolerance
            && other.north <= self.north + tolerance
    }

    /// Bounds in the `[west, south, east, north]` order used by warp requests.
    pub fn as_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }
}

/// Affine geotransform, size and projection of a raster.
///
/// The geotransform follows the GDAL layout:
/// `[origin_x, pixel_width, row_rotation, origin_y, column_rotation, pixel_height]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridDescriptor {
    pub projection: String,
    pub geotransform: [f64; 6],
    pub size_x: usize,
    pub size_y: usize,
}

impl GridDescriptor {
    pub fn new(
        projection: impl Into<String>,
        geotransform: [f64; 6],
        size_x: usize,
        size_y: usize,
    ) -> Self {
        Self {
            projection: projection.into(),
            geotransform,
            size_x,
            size_y,
        }
    }

    /// North-up grid anchored at its upper-left corner. `pixel_height` is the
    /// positive height of a pixel; it is stored negated.
    pub fn north_up(
        projection: impl Into<String>,
        upper_left: (f64, f64),
        pixel_width: f64,
        pixel_height: f64,
        size_x: usize,
        size_y: usize,
    ) -> Self {
        Self::new(
            projection,
            [upper_left.0, pixel_width, 0.0, upper_left.1, 0.0, -pixel_height],
            size_x,
            size_y,
        )
    }

    pub fn origin_x(&self) -> f64 {
        self.geotransform[0]
    }

    pub fn origin_y(&self) -> f64 {
        self.geotransform[3]
    }

    pub fn pixel_width(&self) -> f64 {
        self.geotransform[1]
    }

    /// Signed pixel height (negative for north-up grids).
    pub fn pixel_height(&self) -> f64 {
        self.geotransform[5]
    }

    /// Absolute pixel size as `(x, y)`.
    pub fn pixel_size(&self) -> (f64, f64) {
        (self.pixel_width().abs(), self.pixel_height().abs())
    }

    pub fn extent(&self) -> Extent {
        let gt = &self.geotransform;
        Extent {
            west: gt[0],
            south: gt[3] + gt[5] * self.size_y as f64,
            east: gt[0] + gt[1] * self.size_x as f64,
            north: gt[3],
        }
    }

    /// Rejects grids the alignment and aggregation code cannot handle.
    pub fn validate(&self) -> Result<()> {
        if self.geotransform.iter().any(|v| !v.is_finite()) {
            return Err(DisaggError::NonFiniteTransform(self.geotransform));
        }
        if self.size_x == 0 || self.size_y == 0 {
            return Err(DisaggError::InvalidDimensions(self.size_x, self.size_y));
        }
        if self.geotransform[2] != 0.0 || self.geotransform[4] != 0.0 {
            return Err(DisaggError::RotatedGrid(
                self.geotransform[2],
                self.geotransform[4],
            ));
        }
        if self.pixel_width() <= 0.0 {
            return Err(DisaggError::InvalidPixelSize(self.pixel_width()));
        }
        if self.pixel_height() >= 0.0 {
            return Err(DisaggError::InvalidPixelSize(self.pixel_height()));
        }
        Ok(())
    }
}
