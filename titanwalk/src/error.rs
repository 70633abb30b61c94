//! Engine failure taxonomy.
//!
//! Every fallible operation in the engine surfaces one of these variants to
//! its caller. None of them are fatal - the engine remains usable after any
//! of them. The `Display` strings are the human-readable messages handed to
//! the notification sink; the presentation layer renders them verbatim.

use thiserror::Error;

use crate::route::DirectionsError;

/// Errors returned by the navigation engine and its components.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Credential check failed; the session stays anonymous.
    #[error("Invalid username or password")]
    Unauthorized,

    /// Authenticated but in the wrong operating mode, or not authenticated
    /// at all, for a privileged action.
    #[error("You do not have permission to perform this action")]
    Forbidden,

    /// The target of a lookup or mutation does not exist.
    #[error("{target} not found")]
    NotFound { target: String },

    /// Policy block: the destination exists but is closed to
    /// non-privileged sessions. Not a system fault.
    #[error("{0} is currently closed and inaccessible")]
    DestinationClosed(String),

    /// The position tracker has no fix to use as a route origin.
    #[error("Unable to determine your current location. Please check your location permissions and try again")]
    PositionUnavailable,

    /// The directions provider call failed. No automatic retry is made;
    /// the remedy is to re-issue the request.
    #[error("Unable to calculate a walking route")]
    RouteUnavailable(#[source] DirectionsError),
}

impl EngineError {
    pub(crate) fn not_found(target: impl Into<String>) -> Self {
        Self::NotFound {
            target: target.into(),
        }
    }
}

impl From<DirectionsError> for EngineError {
    fn from(e: DirectionsError) -> Self {
        Self::RouteUnavailable(e)
    }
}
