#[cfg(feature = "gdal")]
use gdal::spatial_ref::SpatialRef;
use log::warn;

/// Whether two projection definitions describe the same CRS.
///
/// Identical strings always match, including two empty ones. Otherwise both
/// definitions are parsed and compared as spatial references when GDAL is
/// available.
pub fn same_projection(a: &str, b: &str) -> bool {
    if a.trim() == b.trim() {
        return true;
    }
    if a.trim().is_empty() || b.trim().is_empty() {
        warn!("One raster has no projection, treating projections as different");
        return false;
    }
    parsed_equal(a, b)
}

#[cfg(feature = "gdal")]
fn parsed_equal(a: &str, b: &str) -> bool {
    let parse = |definition: &str| match SpatialRef::from_definition(definition) {
        Ok(sr) => Some(sr),
        Err(e) => {
            warn!("Failed to parse projection definition: {}", e);
            None
        }
    };
    match (parse(a), parse(b)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

#[cfg(not(feature = "gdal"))]
fn parsed_equal(_a: &str, _b: &str) -> bool {
    false
}
