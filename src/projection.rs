//! Fixed Web-Mercator projection for the regional base map.
//!
//! The base map is a single static image rendered at tile zoom 5 and centered
//! on California/Nevada. Every event is projected once at load and stored
//! relative to the map center so that `(0, 0)` is the middle of the image.

use std::f64::consts::PI;

/// Tile zoom level the base map image was rendered at.
pub const MAP_IMAGE_ZOOM: i32 = 5;

/// Latitude of the base map center (degrees).
pub const CENTER_LAT: f64 = 37.5;

/// Longitude of the base map center (degrees).
pub const CENTER_LON: f64 = -119.0;

/// A point in content space (map image pixels, origin at the image center).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Pixels per radian at the map's tile zoom.
#[must_use]
pub fn scale_factor() -> f64 {
    (256.0 / PI) * f64::from(2_i32.pow(MAP_IMAGE_ZOOM.unsigned_abs()))
}

/// Absolute Web-Mercator x for a longitude (degrees).
#[must_use]
pub fn lon_to_image(lon: f64) -> f64 {
    scale_factor() * (lon.to_radians() + PI)
}

/// Absolute Web-Mercator y for a latitude (degrees).
///
/// Diverges as latitude approaches ±90°; the regional map never gets there.
#[must_use]
pub fn lat_to_image(lat: f64) -> f64 {
    scale_factor() * (PI - (PI / 4.0 + lat.to_radians() / 2.0).tan().ln())
}

/// Projection anchored at a reference center.
#[derive(Debug, Clone, Copy)]
pub struct MapProjection {
    origin: Point,
}

impl MapProjection {
    /// Create a projection whose origin is the given center.
    #[must_use]
    pub fn centered_on(lat: f64, lon: f64) -> Self {
        Self {
            origin: Point::new(lon_to_image(lon), lat_to_image(lat)),
        }
    }

    /// Project a coordinate into content space relative to the center.
    #[must_use]
    pub fn project(&self, lat: f64, lon: f64) -> Point {
        Point::new(
            lon_to_image(lon) - self.origin.x,
            lat_to_image(lat) - self.origin.y,
        )
    }
}

impl Default for MapProjection {
    fn default() -> Self {
        Self::centered_on(CENTER_LAT, CENTER_LON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_center_projects_to_origin() {
        let projection = MapProjection::default();
        let p = projection.project(CENTER_LAT, CENTER_LON);
        assert!(p.x.abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
    }

    #[test]
    fn test_axis_orientation() {
        let projection = MapProjection::default();
        // San Francisco sits west and north of the map center
        let sf = projection.project(37.733_795, -122.446_747);
        assert!(sf.x < 0.0);
        assert!(sf.y < 0.0);

        // Los Angeles sits east of SF and south of center
        let la = projection.project(34.05, -118.24);
        assert!(la.x > sf.x);
        assert!(la.y > 0.0);
    }

    #[test]
    fn test_longitude_scale() {
        // One degree of longitude is a constant number of pixels
        let projection = MapProjection::default();
        let a = projection.project(CENTER_LAT, -120.0);
        let b = projection.project(CENTER_LAT, -119.0);
        let expected = scale_factor() * 1.0_f64.to_radians();
        assert!((b.x - a.x - expected).abs() < 1e-9);
        // 256 px per tile * 32 tiles / 360 degrees
        assert!((expected - 256.0 * 32.0 / 360.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_project_is_deterministic(lat in -80.0f64..80.0, lon in -180.0f64..180.0) {
            let projection = MapProjection::default();
            let a = projection.project(lat, lon);
            let b = projection.project(lat, lon);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_any_center_is_origin(lat in -80.0f64..80.0, lon in -180.0f64..180.0) {
            let projection = MapProjection::centered_on(lat, lon);
            let p = projection.project(lat, lon);
            prop_assert!(p.x.abs() < 1e-6 && p.y.abs() < 1e-6);
        }
    }
}
