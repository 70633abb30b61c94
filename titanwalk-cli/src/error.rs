//! CLI error handling with user-friendly messages.

use std::fmt;

use titanwalk::coord::CoordError;
use titanwalk::route::DirectionsError;
use titanwalk::EngineError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Malformed coordinate or path argument.
    InvalidArgument(String),
    /// Engine operation failed.
    Engine(EngineError),
    /// HTTP client could not be created.
    HttpClient(DirectionsError),
    /// No position fix arrived before the deadline.
    NoPositionFix,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            Self::Engine(e) => write!(f, "{e}"),
            Self::HttpClient(e) => write!(f, "Failed to create HTTP client: {e}"),
            Self::NoPositionFix => write!(f, "No position fix received from the position source"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(e) => Some(e),
            Self::HttpClient(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}
