//! Conversion between projected coordinates and pixel indices.

use crate::grid::GridDescriptor;

/// 0-based `(col, row)` index counted from the grid's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelCoordinate {
    pub col: i64,
    pub row: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Inverse affine transform. Floors both indices, or ceils them when
/// `round_up` is set so an upper/right bound covers every touched pixel.
///
/// Values beyond the `i64` range saturate and NaN maps to 0.
pub fn point_to_pixel(point: Point, grid: &GridDescriptor, round_up: bool) -> PixelCoordinate {
    let gt = &grid.geotransform;
    let px = (point.x - gt[0]) / gt[1];
    let py = (point.y - gt[3]) / gt[5];
    let (px, py) = if round_up {
        (px.ceil(), py.ceil())
    } else {
        (px.floor(), py.floor())
    };
    PixelCoordinate {
        col: px as i64,
        row: py as i64,
    }
}

/// Forward affine transform to the pixel's upper-left corner.
pub fn pixel_to_point(pixel: PixelCoordinate, grid: &GridDescriptor) -> Point {
    let gt = &grid.geotransform;
    Point {
        x: pixel.col as f64 * gt[1] + gt[0],
        y: pixel.row as f64 * gt[5] + gt[3],
    }
}
