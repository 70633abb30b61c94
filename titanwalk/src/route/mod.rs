//! Route computation.
//!
//! Turns a (position, destination) pair into a normalized
//! [`RouteSnapshot`] by delegating to an external walking-directions
//! provider:
//!
//! - [`DirectionsProvider`] - provider abstraction (first candidate wins)
//! - [`OsrmDirections`] - bundled OSRM-compatible implementation
//! - [`AsyncHttpClient`] / [`ReqwestClient`] - injectable HTTP transport
//! - [`RouteCoordinator`] - accessibility gate, normalization, stale-result
//!   guard, recomputation

mod coordinator;
mod http;
mod osrm;
mod provider;
mod types;

pub use coordinator::RouteCoordinator;
pub use http::{AsyncHttpClient, ReqwestClient};
pub use osrm::{OsrmDirections, DEFAULT_BASE_URL};
pub use provider::{
    CandidateRoute, CandidateStep, DirectionsError, DirectionsProvider, DirectionsResponse,
};
pub use types::{DistanceUnit, RouteSnapshot, RouteStep};
