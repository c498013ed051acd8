//! Geographic and screen-space value types shared by every component

use geo::{Coord, Rect};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate. `x` is longitude, `y` is latitude.
pub type GeoCoord = geo::Point<f64>;

/// Build a [`GeoCoord`] from latitude and longitude (in that order).
#[inline]
pub fn lat_lon(lat: f64, lon: f64) -> GeoCoord {
    geo::Point::new(lon, lat)
}

/// Container-local pixel position (origin at the top-left corner of the map widget)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PixelPosition {
    pub x: f32,
    pub y: f32,
}

impl PixelPosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Bounding region that grows one coordinate at a time.
///
/// Starts empty; the first [`extend`](GeoBounds::extend) makes it a degenerate
/// rectangle around that coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeoBounds {
    rect: Option<Rect<f64>>,
}

impl GeoBounds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow the bounds so they include `coord`
    pub fn extend(&mut self, coord: GeoCoord) {
        let c = Coord {
            x: coord.x(),
            y: coord.y(),
        };
        self.rect = Some(match self.rect {
            None => Rect::new(c, c),
            Some(rect) => Rect::new(
                Coord {
                    x: rect.min().x.min(c.x),
                    y: rect.min().y.min(c.y),
                },
                Coord {
                    x: rect.max().x.max(c.x),
                    y: rect.max().y.max(c.y),
                },
            ),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.rect.is_none()
    }

    pub fn rect(&self) -> Option<Rect<f64>> {
        self.rect
    }

    pub fn center(&self) -> Option<GeoCoord> {
        self.rect.map(|r| r.center().into())
    }

    /// Latitude and longitude extents in degrees, as (lat_span, lon_span)
    pub fn span(&self) -> Option<(f64, f64)> {
        self.rect.map(|r| (r.height(), r.width()))
    }

    /// True when every extended coordinate was the same point
    pub fn is_degenerate(&self) -> bool {
        matches!(self.span(), Some((lat, lon)) if lat == 0.0 && lon == 0.0)
    }
}

impl FromIterator<GeoCoord> for GeoBounds {
    fn from_iter<I: IntoIterator<Item = GeoCoord>>(iter: I) -> Self {
        let mut bounds = GeoBounds::new();
        for coord in iter {
            bounds.extend(coord);
        }
        bounds
    }
}
