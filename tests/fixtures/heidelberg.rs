//! Real Heidelberg locations for realistic test fixtures.
//!
//! Heidelberg is the region bundled with the OpenRouteService docker image,
//! so these locations are routable against a local container.

use fleet_geometry::haversine::Point;
use fleet_geometry::polyline::Coordinate;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn point(&self) -> Point {
        Point::new(self.lat, self.lng)
    }
}

pub const HAUPTBAHNHOF: Location = Location::new("Heidelberg Hauptbahnhof", 49.4037, 8.6756);
pub const BISMARCKPLATZ: Location = Location::new("Bismarckplatz", 49.4093, 8.6934);
pub const UNIVERSITAETSPLATZ: Location = Location::new("Universitätsplatz", 49.4106, 8.7063);
pub const NEUENHEIMER_FELD: Location = Location::new("Neuenheimer Feld", 49.4180, 8.6700);
pub const ROHRBACH: Location = Location::new("Rohrbach", 49.3853, 8.6849);
pub const KIRCHHEIM: Location = Location::new("Kirchheim", 49.3822, 8.6663);

pub fn depots() -> Vec<Location> {
    vec![HAUPTBAHNHOF, ROHRBACH, KIRCHHEIM]
}

/// Planned route from the main station along Kurfürsten-Anlage and
/// Hauptstraße to Universitätsplatz, with elevations in meters.
pub fn delivery_route() -> Vec<Coordinate> {
    vec![
        Coordinate::new(49.40370, 8.67560, 110.4),
        Coordinate::new(49.40512, 8.68021, 111.0),
        Coordinate::new(49.40655, 8.68490, 111.8),
        Coordinate::new(49.40801, 8.68952, 112.3),
        Coordinate::new(49.40930, 8.69340, 113.1),
        Coordinate::new(49.40985, 8.69812, 114.6),
        Coordinate::new(49.41021, 8.70237, 116.2),
        Coordinate::new(49.41060, 8.70630, 117.9),
    ]
}

pub fn delivery_route_points() -> Vec<Point> {
    delivery_route().iter().map(Coordinate::point).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_in_heidelberg_area() {
        for loc in depots() {
            assert!(loc.lat > 49.35 && loc.lat < 49.45, "{} lat out of range: {}", loc.name, loc.lat);
            assert!(loc.lng > 8.60 && loc.lng < 8.75, "{} lng out of range: {}", loc.name, loc.lng);
        }
    }
}
