//! Directions provider abstraction.
//!
//! A provider turns an (origin, destination) pair into candidate walking
//! routes. The external service is an opaque collaborator behind
//! [`DirectionsProvider`]; [`super::osrm::OsrmDirections`] is the bundled
//! implementation. The engine consumes only the first candidate.

use std::future::Future;

use thiserror::Error;

use crate::coord::GeoPoint;

/// Errors from a directions provider.
#[derive(Debug, Error)]
pub enum DirectionsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The provider answered but the payload could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The provider found no walking route between the points.
    #[error("No walking route found")]
    NoRoute,
}

/// One raw route step as returned by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateStep {
    /// Instruction text; may be empty.
    pub instruction: String,
    /// Segment distance in meters.
    pub distance_meters: f64,
}

/// One candidate route as returned by the provider, before
/// normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRoute {
    pub polyline: Vec<GeoPoint>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub steps: Vec<CandidateStep>,
}

/// Provider response: candidate routes in provider preference order.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsResponse {
    pub routes: Vec<CandidateRoute>,
}

/// Async walking-directions provider.
pub trait DirectionsProvider: Send + Sync {
    /// Request walking routes from `origin` to `destination`.
    fn walking_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> impl Future<Output = Result<DirectionsResponse, DirectionsError>> + Send;

    /// Provider name for logging.
    fn name(&self) -> &str;
}
