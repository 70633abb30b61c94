//! OSRM-backed directions provider.
//!
//! Talks to an OSRM-compatible routing endpoint using the `foot` profile
//! and decodes the JSON response into provider candidates. Instruction
//! text is composed from each step's maneuver and road name, since OSRM
//! returns structured maneuvers rather than prose.

use serde::Deserialize;

use crate::coord::GeoPoint;

use super::http::AsyncHttpClient;
use super::provider::{
    CandidateRoute, CandidateStep, DirectionsError, DirectionsProvider, DirectionsResponse,
};

/// Public OSRM demo endpoint.
pub const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

/// Walking directions via an OSRM-compatible HTTP service.
pub struct OsrmDirections<C: AsyncHttpClient> {
    client: C,
    base_url: String,
}

impl<C: AsyncHttpClient> OsrmDirections<C> {
    /// Provider against the public demo endpoint.
    pub fn new(client: C) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    /// Provider against a self-hosted endpoint.
    pub fn with_base_url(client: C, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    fn route_url(&self, origin: GeoPoint, destination: GeoPoint) -> String {
        // OSRM takes lon,lat pairs.
        format!(
            "{}/route/v1/foot/{:.6},{:.6};{:.6},{:.6}?alternatives=false&steps=true&geometries=geojson&overview=full",
            self.base_url,
            origin.longitude,
            origin.latitude,
            destination.longitude,
            destination.latitude,
        )
    }
}

impl<C: AsyncHttpClient> DirectionsProvider for OsrmDirections<C> {
    async fn walking_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<DirectionsResponse, DirectionsError> {
        let url = self.route_url(origin, destination);
        tracing::debug!(url = %url, "requesting walking route");

        let body = self.client.get(&url).await?;
        let response: OsrmResponse = serde_json::from_slice(&body)
            .map_err(|e| DirectionsError::InvalidResponse(e.to_string()))?;

        match response.code.as_str() {
            "Ok" => Ok(DirectionsResponse {
                routes: response.routes.into_iter().map(convert_route).collect(),
            }),
            "NoRoute" | "NoSegment" => Err(DirectionsError::NoRoute),
            other => Err(DirectionsError::InvalidResponse(format!(
                "OSRM status {other}"
            ))),
        }
    }

    fn name(&self) -> &str {
        "osrm"
    }
}

fn convert_route(route: OsrmRoute) -> CandidateRoute {
    let polyline = route
        .geometry
        .coordinates
        .into_iter()
        .map(|[longitude, latitude]| GeoPoint {
            latitude,
            longitude,
        })
        .collect();

    let steps = route
        .legs
        .into_iter()
        .flat_map(|leg| leg.steps)
        .map(|step| CandidateStep {
            instruction: step_instruction(&step),
            distance_meters: step.distance,
        })
        .collect();

    CandidateRoute {
        polyline,
        distance_meters: route.distance,
        duration_seconds: route.duration,
        steps,
    }
}

/// Compose instruction text from a step's maneuver and road name.
fn step_instruction(step: &OsrmStep) -> String {
    let name = step.name.trim();
    match step.maneuver.kind.as_str() {
        "depart" => {
            if name.is_empty() {
                "Head out".into()
            } else {
                format!("Head out on {name}")
            }
        }
        "arrive" => "Arrive at your destination".into(),
        "turn" | "end of road" | "fork" => match (step.maneuver.modifier.as_deref(), name) {
            (Some(modifier), "") => format!("Turn {modifier}"),
            (Some(modifier), name) => format!("Turn {modifier} onto {name}"),
            (None, "") => String::new(),
            (None, name) => format!("Continue onto {name}"),
        },
        _ => {
            if name.is_empty() {
                String::new()
            } else {
                format!("Continue onto {name}")
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    #[serde(default)]
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Default, Deserialize)]
struct OsrmStep {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    maneuver: OsrmManeuver,
}

#[derive(Debug, Default, Deserialize)]
struct OsrmManeuver {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    modifier: Option<String>,
}
