//! Seams between the geometry core and the services around it.
//!
//! Concrete apps implement these for their own storage and transport; the
//! crate ships HTTP implementations for directions and push notifications.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::deviation::{ActiveRoute, RouteDeviation};
use crate::haversine::Point;
use crate::polyline::Polyline;
use crate::push::NotificationRequest;

/// A route computed by a directions service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directions {
    pub geometry: Polyline,
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
}

/// Computes a route through an ordered list of waypoints.
pub trait DirectionsProvider {
    type Error: fmt::Display;

    fn directions_for(&self, waypoints: &[Point]) -> Result<Directions, Self::Error>;
}

/// Looks up the route plan a vehicle is currently driving.
pub trait ActiveRouteSource {
    /// `None` when the vehicle has no active route plan.
    fn active_route_for(&self, mac_id: &str) -> Option<ActiveRoute>;
}

/// Persists detected deviations.
pub trait DeviationStore {
    type Error: fmt::Display;

    fn save(&self, deviation: &RouteDeviation) -> Result<(), Self::Error>;
}

/// Delivers a notification request to the push service.
pub trait NotificationSender {
    type Error: fmt::Display;

    fn send(&self, request: &NotificationRequest) -> Result<(), Self::Error>;
}

impl<T: ActiveRouteSource + ?Sized> ActiveRouteSource for &T {
    fn active_route_for(&self, mac_id: &str) -> Option<ActiveRoute> {
        (**self).active_route_for(mac_id)
    }
}

impl<T: DeviationStore + ?Sized> DeviationStore for &T {
    type Error = T::Error;

    fn save(&self, deviation: &RouteDeviation) -> Result<(), Self::Error> {
        (**self).save(deviation)
    }
}

impl<T: NotificationSender + ?Sized> NotificationSender for &T {
    type Error = T::Error;

    fn send(&self, request: &NotificationRequest) -> Result<(), Self::Error> {
        (**self).send(request)
    }
}
