//! Route deviation detection.
//!
//! A live position fix is compared against the geometry of the vehicle's
//! active route plan. Fixes at or beyond the threshold are recorded and
//! announced to management and to the driver.

use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::haversine::Point;
use crate::polyline::{DecodeError, Polyline};
use crate::push::NotificationRequest;
use crate::route_distance::nearest_on_polyline;
use crate::traits::{ActiveRouteSource, DeviationStore, NotificationSender};

/// Distance from the planned route that counts as a deviation.
pub const DEFAULT_THRESHOLD_METERS: f64 = 35.0;

/// Role that receives every deviation alert.
pub const MANAGEMENT_ROLE: &str = "management";

#[derive(Debug, Clone)]
pub struct DeviationConfig {
    pub threshold_meters: f64,
}

impl Default for DeviationConfig {
    fn default() -> Self {
        Self {
            threshold_meters: DEFAULT_THRESHOLD_METERS,
        }
    }
}

/// A GPS fix reported by a vehicle tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub mac_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Unix seconds.
    pub timestamp: i64,
}

impl PositionFix {
    pub fn point(&self) -> Point {
        Point::new(self.latitude, self.longitude)
    }
}

/// The route plan a vehicle is driving, with its encoded geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveRoute {
    pub route_plan_id: u64,
    pub truck_id: u64,
    pub mac_id: String,
    pub driver_id: u64,
    pub driver_name: Option<String>,
    pub plate_number: Option<String>,
    pub geometry: String,
}

impl ActiveRoute {
    fn plate_or_mac(&self) -> &str {
        self.plate_number
            .as_deref()
            .filter(|plate| !plate.is_empty())
            .unwrap_or(&self.mac_id)
    }

    fn driver_label(&self) -> String {
        match self.driver_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Driver #{}", self.driver_id),
        }
    }
}

/// A recorded deviation from a planned route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDeviation {
    pub truck_id: u64,
    pub mac_id: String,
    pub route_plan_id: u64,
    pub driver_id: u64,
    pub latitude: f64,
    pub longitude: f64,
    /// Closest point on the route.
    pub ref_latitude: f64,
    pub ref_longitude: f64,
    /// Meters from the route.
    pub distance: f64,
    pub segment_index: usize,
    /// Unix seconds of the fix.
    pub timestamp: i64,
}

/// Compares `fix` against the decoded `route_points` of `route`.
///
/// Returns a deviation when the fix is at least `threshold_meters` from the
/// route. An empty route or an invalid fix never deviates.
pub fn detect(
    config: &DeviationConfig,
    fix: &PositionFix,
    route: &ActiveRoute,
    route_points: &[Point],
) -> Option<RouteDeviation> {
    let found = nearest_on_polyline(fix.point(), route_points)?;
    if found.distance < config.threshold_meters {
        return None;
    }

    Some(RouteDeviation {
        truck_id: route.truck_id,
        mac_id: fix.mac_id.clone(),
        route_plan_id: route.route_plan_id,
        driver_id: route.driver_id,
        latitude: fix.latitude,
        longitude: fix.longitude,
        ref_latitude: found.reference_point.latitude,
        ref_longitude: found.reference_point.longitude,
        distance: found.distance,
        segment_index: found.segment_index,
        timestamp: fix.timestamp,
    })
}

/// Builds the push notification announcing `deviation`.
pub fn deviation_alert(deviation: &RouteDeviation, route: &ActiveRoute) -> NotificationRequest {
    NotificationRequest {
        title: "Route Deviation Alert".to_string(),
        message: format!(
            "Vehicle {} operated by {} is deviating from its planned route by {:.0} meters.",
            route.plate_or_mac(),
            route.driver_label(),
            deviation.distance
        ),
        url: Some(format!("/management/dashboard?truck={}", deviation.mac_id)),
        target_roles: vec![MANAGEMENT_ROLE.to_string()],
        target_user_ids: vec![deviation.driver_id],
    }
}

#[derive(Debug)]
pub enum MonitorError<E> {
    /// The active route's geometry could not be decoded.
    Geometry { route_plan_id: u64, source: DecodeError },
    /// The deviation could not be persisted.
    Store(E),
}

impl<E: fmt::Display> fmt::Display for MonitorError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::Geometry {
                route_plan_id,
                source,
            } => write!(f, "route plan {} has invalid geometry: {}", route_plan_id, source),
            MonitorError::Store(err) => write!(f, "failed to save route deviation: {}", err),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for MonitorError<E> {}

/// Checks position fixes against active routes, saving and announcing
/// deviations.
#[derive(Debug, Clone)]
pub struct DeviationMonitor<S, D, N> {
    config: DeviationConfig,
    routes: S,
    store: D,
    notifier: N,
}

impl<S, D, N> DeviationMonitor<S, D, N>
where
    S: ActiveRouteSource,
    D: DeviationStore,
    N: NotificationSender,
{
    pub fn new(config: DeviationConfig, routes: S, store: D, notifier: N) -> Self {
        Self {
            config,
            routes,
            store,
            notifier,
        }
    }

    pub fn config(&self) -> &DeviationConfig {
        &self.config
    }

    /// Processes one fix.
    ///
    /// A failure to send the alert is logged and does not fail the call;
    /// the deviation has already been saved by then.
    pub fn process(&self, fix: &PositionFix) -> Result<Option<RouteDeviation>, MonitorError<D::Error>> {
        let Some(route) = self.routes.active_route_for(&fix.mac_id) else {
            debug!(mac_id = %fix.mac_id, "no active route plan");
            return Ok(None);
        };

        let geometry = Polyline::decode(&route.geometry).map_err(|source| {
            warn!(route_plan_id = route.route_plan_id, error = %source, "failed to decode route geometry");
            MonitorError::Geometry {
                route_plan_id: route.route_plan_id,
                source,
            }
        })?;
        if geometry.is_empty() {
            debug!(route_plan_id = route.route_plan_id, "empty route geometry");
            return Ok(None);
        }

        let Some(deviation) = detect(&self.config, fix, &route, &geometry.route_points()) else {
            return Ok(None);
        };

        self.store.save(&deviation).map_err(MonitorError::Store)?;
        info!(
            mac_id = %deviation.mac_id,
            truck_id = deviation.truck_id,
            distance = deviation.distance,
            "route deviation detected"
        );

        let alert = deviation_alert(&deviation, &route);
        if let Err(err) = self.notifier.send(&alert) {
            warn!(mac_id = %deviation.mac_id, error = %err, "failed to send deviation alert");
        }

        Ok(Some(deviation))
    }

    /// Processes a batch of fixes in parallel, preserving input order.
    pub fn process_all(&self, fixes: &[PositionFix]) -> Vec<Result<Option<RouteDeviation>, MonitorError<D::Error>>>
    where
        S: Sync,
        D: Sync,
        N: Sync,
        D::Error: Send,
    {
        fixes.par_iter().map(|fix| self.process(fix)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> ActiveRoute {
        ActiveRoute {
            route_plan_id: 7,
            truck_id: 3,
            mac_id: "AA:BB".to_string(),
            driver_id: 12,
            driver_name: Some("Budi".to_string()),
            plate_number: Some("B 1234 XY".to_string()),
            geometry: String::new(),
        }
    }

    fn fix(latitude: f64, longitude: f64) -> PositionFix {
        PositionFix {
            mac_id: "AA:BB".to_string(),
            latitude,
            longitude,
            timestamp: 1_700_000_000,
        }
    }

    fn equator() -> Vec<Point> {
        vec![Point::new(0.0, 0.0), Point::new(0.0, 1.0)]
    }

    #[test]
    fn test_within_threshold_is_not_a_deviation() {
        // ~11 m north of the route
        let result = detect(&DeviationConfig::default(), &fix(0.0001, 0.5), &route(), &equator());
        assert!(result.is_none());
    }

    #[test]
    fn test_beyond_threshold_is_a_deviation() {
        // ~111 m north of the route
        let deviation = detect(&DeviationConfig::default(), &fix(0.001, 0.5), &route(), &equator()).unwrap();
        assert!((deviation.distance - 111.19).abs() < 0.1);
        assert_eq!(deviation.segment_index, 0);
        assert_eq!(deviation.route_plan_id, 7);
        assert_eq!(deviation.driver_id, 12);
        assert!(deviation.ref_latitude.abs() < 1e-12);
        assert!((deviation.ref_longitude - 0.5).abs() < 1e-9);
        assert_eq!(deviation.timestamp, 1_700_000_000);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let single = vec![Point::new(0.0, 0.0)];
        let f = fix(0.001, 0.0);
        let distance = crate::haversine::haversine_distance(f.point(), single[0]);
        let config = DeviationConfig {
            threshold_meters: distance,
        };
        assert!(detect(&config, &f, &route(), &single).is_some());
    }

    #[test]
    fn test_empty_route_never_deviates() {
        assert!(detect(&DeviationConfig::default(), &fix(10.0, 10.0), &route(), &[]).is_none());
    }

    #[test]
    fn test_alert_message() {
        let deviation = detect(&DeviationConfig::default(), &fix(0.001, 0.5), &route(), &equator()).unwrap();
        let alert = deviation_alert(&deviation, &route());
        assert_eq!(alert.title, "Route Deviation Alert");
        assert_eq!(
            alert.message,
            "Vehicle B 1234 XY operated by Budi is deviating from its planned route by 111 meters."
        );
        assert_eq!(alert.url.as_deref(), Some("/management/dashboard?truck=AA:BB"));
        assert_eq!(alert.target_roles, vec!["management".to_string()]);
        assert_eq!(alert.target_user_ids, vec![12]);
    }

    #[test]
    fn test_alert_fallbacks() {
        let mut r = route();
        r.plate_number = Some(String::new());
        r.driver_name = None;
        let deviation = detect(&DeviationConfig::default(), &fix(0.001, 0.5), &r, &equator()).unwrap();
        let alert = deviation_alert(&deviation, &r);
        assert!(alert.message.starts_with("Vehicle AA:BB operated by Driver #12 "));
    }

    #[test]
    fn test_deviation_json_field_names() {
        let deviation = detect(&DeviationConfig::default(), &fix(0.001, 0.5), &route(), &equator()).unwrap();
        let json = serde_json::to_value(&deviation).unwrap();
        assert!(json.get("ref_latitude").is_some());
        assert!(json.get("segment_index").is_some());
        assert_eq!(json["mac_id"], "AA:BB");
    }
}
