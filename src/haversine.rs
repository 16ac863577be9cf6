//! Great-circle distance between geographic points.
//!
//! Uses a spherical Earth; accurate to roughly 0.3% which is plenty for
//! comparing a vehicle position against a planned route.

use serde::{Deserialize, Serialize};

/// Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A bare latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both components are finite numbers.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<[f64; 2]> for Point {
    fn from([latitude, longitude]: [f64; 2]) -> Self {
        Self::new(latitude, longitude)
    }
}

/// Calculate haversine distance between two points in meters.
pub fn haversine_distance(from: Point, to: Point) -> f64 {
    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Total length of a path in meters.
pub fn path_length(points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_distance(pair[0], pair[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_same_point() {
        let p = Point::new(-6.2, 106.8);
        assert_eq!(haversine_distance(p, p), 0.0);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Jakarta (-6.2088, 106.8456) to Bandung (-6.9175, 107.6191)
        // Actual distance ~116 km
        let dist = haversine_distance(Point::new(-6.2088, 106.8456), Point::new(-6.9175, 107.6191));
        assert!(dist > 110_000.0 && dist < 125_000.0, "Jakarta to Bandung should be ~116km, got {}", dist);
    }

    #[test]
    fn test_one_degree_of_longitude_on_equator() {
        let dist = haversine_distance(Point::new(0.0, 0.0), Point::new(0.0, 1.0));
        // 2 * pi * R / 360
        assert!((dist - 111_194.93).abs() < 1.0, "got {}", dist);
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = Point::new(36.1, -115.1);
        let b = Point::new(36.2, -115.3);
        assert_eq!(haversine_distance(a, b), haversine_distance(b, a));
    }

    #[test]
    fn test_path_length() {
        let path = vec![Point::new(0.0, 0.0), Point::new(0.0, 1.0), Point::new(0.0, 2.0)];
        let direct = haversine_distance(path[0], path[2]);
        assert!((path_length(&path) - direct).abs() < 1e-6);
        assert_eq!(path_length(&path[..1]), 0.0);
        assert_eq!(path_length(&[]), 0.0);
    }

    #[test]
    fn test_point_validity() {
        assert!(Point::new(1.0, 2.0).is_valid());
        assert!(!Point::new(f64::NAN, 2.0).is_valid());
        assert!(!Point::new(1.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_point_conversions() {
        assert_eq!(Point::from((1.5, 2.5)), Point::new(1.5, 2.5));
        assert_eq!(Point::from([1.5, 2.5]), Point::new(1.5, 2.5));
    }
}
