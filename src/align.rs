//! Alignment of a low resolution raster onto a high resolution grid.

use crate::aggregate::PixelGroup;
use crate::error::{DisaggError, Result};
use crate::grid::GridDescriptor;
use crate::raster::RasterSource;
use crate::warp::{Resampling, WarpRequest, Warper};
use log::{debug, info};

/// Low resolution grid expressed on the high resolution grid's lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedGrid {
    pub grid: GridDescriptor,
    /// High resolution pixels per low resolution pixel.
    pub ratio: PixelGroup,
}

fn axis_ratio(natural: f64, reference: f64, axis: &'static str) -> Result<usize> {
    if !natural.is_finite() || natural <= 0.0 {
        return Err(DisaggError::InvalidPixelSize(natural));
    }
    // ties go to the even multiple: 2.5 -> 2, 3.5 -> 4
    let ratio = (natural / reference).round_ties_even().max(1.0);
    debug!(
        "{} axis: native {:.6} / reference {:.6} -> ratio {}",
        axis, natural, reference, ratio
    );
    Ok(ratio as usize)
}

/// Choose the aligned low resolution grid.
///
/// `natural` is the low resolution raster after a nearest-neighbour
/// reprojection into `reference`'s projection. Its pixel size is rounded to
/// the nearest whole multiple of the reference pixel size, independently
/// per axis, and the grid starts at the reference upper-left corner with
/// only as many whole pixels as fit inside the reference footprint.
pub fn plan_alignment(
    reference: &GridDescriptor,
    natural: &GridDescriptor,
) -> Result<AlignedGrid> {
    reference.validate()?;
    let (ref_x, ref_y) = reference.pixel_size();
    let (nat_x, nat_y) = natural.pixel_size();

    let ratio = PixelGroup {
        cols: axis_ratio(nat_x, ref_x, "x")?,
        rows: axis_ratio(nat_y, ref_y, "y")?,
    };

    // floor(size * ref / (ratio * ref)) without the floating point round trip
    let size_x = reference.size_x / ratio.cols;
    let size_y = reference.size_y / ratio.rows;
    if size_x == 0 || size_y == 0 {
        return Err(DisaggError::InvalidDimensions(size_x, size_y));
    }

    let grid = GridDescriptor::north_up(
        reference.projection.clone(),
        (reference.origin_x(), reference.origin_y()),
        ratio.cols as f64 * ref_x,
        ratio.rows as f64 * ref_y,
        size_x,
        size_y,
    );

    Ok(AlignedGrid { grid, ratio })
}

/// Reproject `low` into `high`'s projection and subset it to `high`'s extent,
/// on a pixel size that is a whole multiple of `high`'s.
pub fn reproject_subset_low_res<W: Warper>(
    engine: &W,
    high: &GridDescriptor,
    low: &W::Raster,
    resampling: Resampling,
) -> Result<(W::Raster, AlignedGrid)> {
    high.validate()?;

    let discovery = engine.warp(
        low,
        &WarpRequest::to_projection(high.projection.clone(), Resampling::Nearest),
    )?;
    let natural = discovery.grid()?;
    drop(discovery);

    let aligned = plan_alignment(high, &natural)?;
    let (pixel_x, pixel_y) = aligned.grid.pixel_size();
    info!(
        "Aligned low resolution grid: {}x{} pixels of {:.6} x {:.6} ({}x{} pixel groups)",
        aligned.grid.size_x,
        aligned.grid.size_y,
        pixel_x,
        pixel_y,
        aligned.ratio.cols,
        aligned.ratio.rows
    );

    let request = WarpRequest::to_projection(high.projection.clone(), resampling)
        .with_resolution(pixel_x, pixel_y)
        .with_bounds(aligned.grid.extent());
    let out = engine.warp(low, &request)?;
    Ok((out, aligned))
}

/// Warp `source` onto `template`'s projection, resolution and extent.
pub fn resample_to_template<W: Warper>(
    engine: &W,
    source: &W::Raster,
    template: &GridDescriptor,
    resampling: Resampling,
) -> Result<W::Raster> {
    template.validate()?;
    let (pixel_x, pixel_y) = template.pixel_size();
    let request = WarpRequest::to_projection(template.projection.clone(), resampling)
        .with_resolution(pixel_x, pixel_y)
        .with_bounds(template.extent());
    debug!("Resampling onto template extent {:?}", template.extent());
    engine.warp(source, &request)
}

/// Whether `inner`'s footprint lies within `outer`'s, up to 1% of an `outer` pixel.
pub fn footprint_within(inner: &GridDescriptor, outer: &GridDescriptor) -> bool {
    let (px, py) = outer.pixel_size();
    outer.extent().contains(&inner.extent(), 0.01 * px.min(py))
}
