//! Distance from a point to a route.
//!
//! Segment projection happens in an equirectangular approximation: each
//! point's longitude is scaled by the cosine of its own latitude, the query
//! point is projected onto the segment in that plane, and the distance to the
//! closest point is then measured with the haversine formula. This is only
//! locally accurate. Routes crossing the antimeridian or passing close to a
//! pole get wrong answers.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::haversine::{Point, haversine_distance};

/// Nearest point on a route for a query position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteMatch {
    /// Meters.
    pub distance: f64,
    pub reference_point: Point,
    /// Index of the segment's first point; 0 for a single-point route.
    pub segment_index: usize,
}

/// Closest point on the segment `start`-`end` and the distance to it.
pub fn closest_on_segment(point: Point, start: Point, end: Point) -> (f64, Point) {
    if start == end {
        return (haversine_distance(point, start), start);
    }

    let (x1, y1) = planar(start);
    let (x2, y2) = planar(end);
    let (x, y) = planar(point);

    let dx = x2 - x1;
    let dy = y2 - y1;
    let length_squared = dx * dx + dy * dy;

    let t = if length_squared != 0.0 {
        ((x - x1) * dx + (y - y1) * dy) / length_squared
    } else {
        0.0
    };

    let candidate = if t < 0.0 {
        start
    } else if t > 1.0 {
        end
    } else {
        let closest_lat = x1 + t * dx;
        let closest_scaled_lng = y1 + t * dy;
        Point::new(closest_lat, closest_scaled_lng / closest_lat.to_radians().cos())
    };

    // Scaling absolute longitudes skews the plane away from the prime
    // meridian, so the candidate may be farther than the other endpoint.
    // Never report more than the nearer endpoint.
    let mut best = (haversine_distance(point, candidate), candidate);
    for endpoint in [start, end] {
        let distance = haversine_distance(point, endpoint);
        if distance < best.0 {
            best = (distance, endpoint);
        }
    }
    best
}

/// Shortest distance in meters from `point` to the segment `start`-`end`.
pub fn distance_to_segment(point: Point, start: Point, end: Point) -> f64 {
    closest_on_segment(point, start, end).0
}

/// Nearest point on `route`, or `None` when there is no meaningful answer
/// (empty route, malformed point, or every segment failed numerically).
pub fn nearest_on_polyline(point: Point, route: &[Point]) -> Option<RouteMatch> {
    if !point.is_valid() {
        debug!(?point, "invalid query point");
        return None;
    }

    match route {
        [] => None,
        [only] => {
            let distance = haversine_distance(point, *only);
            distance.is_finite().then_some(RouteMatch {
                distance,
                reference_point: *only,
                segment_index: 0,
            })
        }
        _ => {
            let mut best: Option<RouteMatch> = None;
            for (segment_index, pair) in route.windows(2).enumerate() {
                let (distance, reference_point) = closest_on_segment(point, pair[0], pair[1]);
                if !distance.is_finite() {
                    debug!(segment_index, "skipping segment with non-finite distance");
                    continue;
                }
                if best.is_none_or(|current| distance < current.distance) {
                    best = Some(RouteMatch {
                        distance,
                        reference_point,
                        segment_index,
                    });
                }
            }
            best
        }
    }
}

/// Shortest distance in meters from `point` to `route`.
///
/// Returns `f64::INFINITY` for an empty route or a malformed point, so the
/// result can be compared against a threshold without special cases.
pub fn distance_to_polyline(point: Point, route: &[Point]) -> f64 {
    nearest_on_polyline(point, route)
        .map(|found| found.distance)
        .unwrap_or(f64::INFINITY)
}

/// Distances from many positions to the same route, computed in parallel.
pub fn distances_to_polyline(points: &[Point], route: &[Point]) -> Vec<f64> {
    points
        .par_iter()
        .map(|point| distance_to_polyline(*point, route))
        .collect()
}

fn planar(point: Point) -> (f64, f64) {
    (point.latitude, point.longitude * point.latitude.to_radians().cos())
}
