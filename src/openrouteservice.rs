//! OpenRouteService HTTP adapter for route directions.
//!
//! Requests elevation so the returned geometry carries the three-channel
//! polyline encoding understood by [`crate::polyline`].

use std::env;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::haversine::Point;
use crate::polyline::{DecodeError, Polyline};
use crate::traits::{Directions, DirectionsProvider};

const PUBLIC_API_URL: &str = "https://api.openrouteservice.org";

#[derive(Debug, Clone)]
pub struct OrsConfig {
    pub base_url: String,
    pub profile: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for OrsConfig {
    fn default() -> Self {
        Self {
            base_url: format!("{}/v2", PUBLIC_API_URL),
            profile: "driving-hgv".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl OrsConfig {
    /// Reads `ORS_API_KEY`, `ORS_BASE_URL` and `ORS_PROFILE`, falling back to
    /// the public API defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("ORS_BASE_URL").unwrap_or(defaults.base_url),
            profile: env::var("ORS_PROFILE").unwrap_or(defaults.profile),
            api_key: env::var("ORS_API_KEY").ok().filter(|key| !key.is_empty()),
            timeout_secs: defaults.timeout_secs,
        }
    }

    /// The hosted API rejects unauthenticated requests; self-hosted
    /// instances accept them.
    pub fn is_public_api(&self) -> bool {
        self.base_url.starts_with(PUBLIC_API_URL)
    }

    pub fn directions_url(&self) -> String {
        format!(
            "{}/directions/{}/json",
            self.base_url.trim_end_matches('/'),
            self.profile
        )
    }
}

#[derive(Debug)]
pub enum DirectionsError {
    MissingApiKey,
    TooFewWaypoints(usize),
    Http(reqwest::Error),
    Status { status: u16, body: String },
    NoRoute,
    Decode(DecodeError),
}

impl fmt::Display for DirectionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectionsError::MissingApiKey => f.write_str("no API key configured"),
            DirectionsError::TooFewWaypoints(count) => {
                write!(f, "at least two waypoints are required, got {}", count)
            }
            DirectionsError::Http(err) => write!(f, "directions request failed: {}", err),
            DirectionsError::Status { status, body } => {
                write!(f, "directions service returned status {}: {}", status, body)
            }
            DirectionsError::NoRoute => f.write_str("response contains no route"),
            DirectionsError::Decode(err) => write!(f, "invalid route geometry: {}", err),
        }
    }
}

impl std::error::Error for DirectionsError {}

impl From<reqwest::Error> for DirectionsError {
    fn from(err: reqwest::Error) -> Self {
        DirectionsError::Http(err)
    }
}

impl From<DecodeError> for DirectionsError {
    fn from(err: DecodeError) -> Self {
        DirectionsError::Decode(err)
    }
}

#[derive(Debug, Clone)]
pub struct OrsClient {
    config: OrsConfig,
    client: reqwest::blocking::Client,
}

impl OrsClient {
    pub fn new(config: OrsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OrsConfig {
        &self.config
    }
}

impl DirectionsProvider for OrsClient {
    type Error = DirectionsError;

    fn directions_for(&self, waypoints: &[Point]) -> Result<Directions, DirectionsError> {
        if waypoints.len() < 2 {
            return Err(DirectionsError::TooFewWaypoints(waypoints.len()));
        }
        if self.config.api_key.is_none() && self.config.is_public_api() {
            return Err(DirectionsError::MissingApiKey);
        }

        let body = DirectionsRequest::new(waypoints);
        let mut builder = self.client.post(self.config.directions_url()).json(&body);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.header(reqwest::header::AUTHORIZATION, api_key.as_str());
        }
        let response = builder.send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(DirectionsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let directions = parse_response(response.json::<DirectionsResponse>()?)?;
        debug!(
            waypoints = waypoints.len(),
            points = directions.geometry.len(),
            distance = directions.distance,
            "directions received"
        );
        Ok(directions)
    }
}

/// Request body for `POST /directions/{profile}/json`.
#[derive(Debug, Clone, Serialize)]
pub struct DirectionsRequest {
    /// `[longitude, latitude]` pairs.
    pub coordinates: Vec<[f64; 2]>,
    pub elevation: bool,
    pub instructions: bool,
}

impl DirectionsRequest {
    pub fn new(waypoints: &[Point]) -> Self {
        Self {
            coordinates: waypoints
                .iter()
                .map(|point| [point.longitude, point.latitude])
                .collect(),
            elevation: true,
            instructions: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<RouteBody>,
}

#[derive(Debug, Deserialize)]
struct RouteBody {
    #[serde(default)]
    summary: Summary,
    geometry: String,
}

#[derive(Debug, Default, Deserialize)]
struct Summary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

/// Takes the first route of a directions response.
pub fn parse_response(response: DirectionsResponse) -> Result<Directions, DirectionsError> {
    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or(DirectionsError::NoRoute)?;

    Ok(Directions {
        geometry: Polyline::decode(&route.geometry)?,
        distance: route.summary.distance,
        duration: route.summary.duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> DirectionsResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_request_body_is_lng_lat() {
        let body = DirectionsRequest::new(&[Point::new(-6.2, 106.8), Point::new(-6.3, 106.9)]);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["coordinates"][0][0], 106.8);
        assert_eq!(json["coordinates"][0][1], -6.2);
        assert_eq!(json["elevation"], true);
    }

    #[test]
    fn test_parse_first_route() {
        let directions = parse_response(response(
            r#"{"routes":[{"summary":{"distance":245.3,"duration":40.1},"geometry":"_p~iF~ps|Uo}@_ulLnnqCo}@"}]}"#,
        ))
        .unwrap();
        assert_eq!(directions.geometry.len(), 2);
        assert_eq!(directions.distance, 245.3);
        assert_eq!(directions.duration, 40.1);
    }

    #[test]
    fn test_parse_missing_summary() {
        let directions = parse_response(response(r#"{"routes":[{"geometry":""}]}"#)).unwrap();
        assert!(directions.geometry.is_empty());
        assert_eq!(directions.distance, 0.0);
    }

    #[test]
    fn test_parse_no_route() {
        let err = parse_response(response(r#"{"routes":[]}"#)).unwrap_err();
        assert!(matches!(err, DirectionsError::NoRoute));
    }

    #[test]
    fn test_parse_bad_geometry() {
        let err = parse_response(response(r#"{"routes":[{"geometry":"_p~iF"}]}"#)).unwrap_err();
        assert!(matches!(err, DirectionsError::Decode(_)));
    }

    #[test]
    fn test_directions_url() {
        let config = OrsConfig {
            base_url: "http://localhost:8080/ors/v2/".to_string(),
            profile: "driving-car".to_string(),
            ..OrsConfig::default()
        };
        assert_eq!(config.directions_url(), "http://localhost:8080/ors/v2/directions/driving-car/json");
    }

    #[test]
    fn test_rejects_before_network() {
        let client = OrsClient::new(OrsConfig::default()).unwrap();
        let one = [Point::new(0.0, 0.0)];
        assert!(matches!(client.directions_for(&one), Err(DirectionsError::TooFewWaypoints(1))));

        let two = [Point::new(0.0, 0.0), Point::new(0.0, 1.0)];
        assert!(matches!(client.directions_for(&two), Err(DirectionsError::MissingApiKey)));
    }
}
