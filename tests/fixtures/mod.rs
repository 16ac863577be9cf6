//! Test fixtures for fleet-geometry.
//!
//! Provides realistic test data including:
//! - Real Heidelberg locations (from OpenStreetMap)
//! - A planned delivery route through the city centre with elevations
//!
//! Each test binary uses a different subset of these.

#[allow(dead_code)]
pub mod heidelberg;
