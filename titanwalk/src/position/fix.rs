//! Position fix type and source failure modes.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::coord::GeoPoint;

/// A single observer position report.
///
/// Only the latest fix is retained; a superseded fix is used once for the
/// recompute-threshold decision and then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionFix {
    pub point: GeoPoint,
    pub timestamp: DateTime<Utc>,
}

impl PositionFix {
    /// A fix stamped with the current wall-clock time.
    pub fn new(point: GeoPoint) -> Self {
        Self {
            point,
            timestamp: Utc::now(),
        }
    }

    /// A fix with an explicit timestamp, for replayed sources.
    pub fn at(point: GeoPoint, timestamp: DateTime<Utc>) -> Self {
        Self { point, timestamp }
    }
}

/// Failures reported by a position source.
///
/// These are delivered in-band on the subscription channel; the tracker
/// reports them onward and leaves the last known fix untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    /// The operating environment denied access to position data.
    #[error("Location permission denied")]
    PermissionDenied,

    /// The source failed to produce a fix.
    #[error("Position source failed: {0}")]
    SourceFailed(String),
}
