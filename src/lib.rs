//! fleet-geometry
//!
//! Route geometry for fleet monitoring: elevation-aware polyline decoding,
//! distance from a live position to a planned route, and route deviation
//! alerts.

pub mod traits;
pub mod haversine;
pub mod polyline;
pub mod route_distance;
pub mod deviation;
pub mod openrouteservice;
pub mod push;
pub mod notification;
pub mod palette;
