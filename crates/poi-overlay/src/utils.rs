//! Utility functions for coordinate conversions and validation

use crate::types::GeoCoord;
use geo::Point;

/// Web Mercator bounds in meters (EPSG:3857)
pub const EARTH_MERCATOR_MAX: f64 = 20037508.34;
pub const EARTH_MERCATOR_MIN: f64 = -20037508.34;
pub const EARTH_SIZE_METERS: f64 = EARTH_MERCATOR_MAX - EARTH_MERCATOR_MIN;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Edge length of one map tile in pixels. Zoom level `z` spans `TILE_SIZE * 2^z` pixels.
pub const TILE_SIZE: f64 = 256.0;

const LON_TO_X_FACTOR: f64 = EARTH_MERCATOR_MAX / 180.0;
const Y_FACTOR: f64 = EARTH_MERCATOR_MAX / std::f64::consts::PI;

/// Convert WGS84 (lat, lon) to Web Mercator (x, y) in meters
///
/// Latitude is clamped to the range Web Mercator can represent.
#[inline(always)]
pub fn wgs84_to_mercator(lat: f64, lon: f64) -> Point<f64> {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = lon * LON_TO_X_FACTOR;
    let lat_rad = lat.to_radians();
    let y = (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() * Y_FACTOR;
    Point::new(x, y)
}

/// Absolute pixel position of a coordinate in the tile pyramid at `zoom`.
///
/// The origin is the top-left corner of the world (180°W, ~85°N), y grows southwards.
pub fn world_pixel(coord: GeoCoord, zoom: f64) -> (f64, f64) {
    let mercator = wgs84_to_mercator(coord.y(), coord.x());
    let world_size = TILE_SIZE * 2f64.powf(zoom);
    let x = (mercator.x() - EARTH_MERCATOR_MIN) / EARTH_SIZE_METERS * world_size;
    let y = (EARTH_MERCATOR_MAX - mercator.y()) / EARTH_SIZE_METERS * world_size;
    (x, y)
}

/// Whether a coordinate is finite and within latitude/longitude ranges
#[inline]
pub fn is_valid_coord(coord: GeoCoord) -> bool {
    let (lon, lat) = (coord.x(), coord.y());
    lat.is_finite() && lon.is_finite() && lat.abs() <= 90.0 && lon.abs() <= 180.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::lat_lon;

    #[test]
    fn test_wgs84_to_mercator_origin() {
        let point = wgs84_to_mercator(0.0, 0.0);
        assert!((point.x() - 0.0).abs() < 0.01);
        assert!((point.y() - 0.0).abs() < 0.01);
    }

    #[test]
    fn test_polar_latitudes_are_clamped() {
        let pole = wgs84_to_mercator(90.0, 0.0);
        let edge = wgs84_to_mercator(MAX_LATITUDE, 0.0);
        assert!(pole.y().is_finite());
        assert_eq!(pole.y(), edge.y());
        assert!((edge.y() - EARTH_MERCATOR_MAX).abs() < 1.0);
    }

    #[test]
    fn test_world_pixel_center_and_corners() {
        let (x, y) = world_pixel(lat_lon(0.0, 0.0), 0.0);
        assert!((x - 128.0).abs() < 1e-6);
        assert!((y - 128.0).abs() < 1e-6);

        let (x, _) = world_pixel(lat_lon(0.0, -180.0), 1.0);
        assert!(x.abs() < 1e-6);

        // One zoom level doubles every distance
        let (x1, y1) = world_pixel(lat_lon(10.0, 20.0), 3.0);
        let (x2, y2) = world_pixel(lat_lon(10.0, 20.0), 4.0);
        assert!((x2 - 2.0 * x1).abs() < 1e-6);
        assert!((y2 - 2.0 * y1).abs() < 1e-6);
    }

    #[test]
    fn test_is_valid_coord() {
        assert!(is_valid_coord(lat_lon(-6.92, 107.61)));
        assert!(is_valid_coord(lat_lon(90.0, -180.0)));
        assert!(!is_valid_coord(lat_lon(91.0, 0.0)));
        assert!(!is_valid_coord(lat_lon(0.0, 180.5)));
        assert!(!is_valid_coord(lat_lon(f64::NAN, 0.0)));
        assert!(!is_valid_coord(lat_lon(0.0, f64::INFINITY)));
    }
}
