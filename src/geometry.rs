use std::f64::consts::PI;

use crate::data::{LocalCoords, MapCoords};
use crate::errors::{Error, Result};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Ray-casting test with latitude as y and longitude as x.
///
/// A point lying exactly on a vertex's horizontal line may be counted on either side,
/// as with the classic algorithm.
pub fn point_in_polygon(point: &MapCoords, polygon: &[MapCoords]) -> Result<bool> {
    if polygon.len() < 3 {
        return Err(Error::invalid_input(format!(
            "Point-in-polygon needs at least 3 vertices, got {}",
            polygon.len()
        )));
    }
    Ok(ray_cast(point, polygon))
}

pub(crate) fn ray_cast(point: &MapCoords, polygon: &[MapCoords]) -> bool {
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for (i, vi) in polygon.iter().enumerate() {
        let vj = &polygon[j];
        if (vi.lat > point.lat) != (vj.lat > point.lat)
            && point.lon < (vj.lon - vi.lon) * (point.lat - vi.lat) / (vj.lat - vi.lat) + vi.lon
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Equirectangular projection around `origin`. Only accurate for extents of a few km.
///
/// The cosine term uses the origin's latitude, not the point's.
pub fn project(point: &MapCoords, origin: &MapCoords) -> LocalCoords {
    let x = EARTH_RADIUS_M * (point.lon - origin.lon) * PI / 180.0 * (origin.lat * PI / 180.0).cos();
    let y = EARTH_RADIUS_M * (point.lat - origin.lat) * PI / 180.0;
    LocalCoords { x, y }
}
