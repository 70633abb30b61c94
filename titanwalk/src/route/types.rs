//! Normalized route snapshot types.

use std::fmt;

use crate::coord::GeoPoint;

use super::provider::CandidateRoute;

/// Feet per meter, for distance normalization.
const FEET_PER_METER: f64 = 3.28084;

/// Unit used for distances published to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceUnit {
    Meters,
    /// The observed system's display unit.
    #[default]
    Feet,
}

impl DistanceUnit {
    /// Convert a provider distance (always meters) into this unit.
    pub fn from_meters(&self, meters: f64) -> f64 {
        match self {
            Self::Meters => meters,
            Self::Feet => meters * FEET_PER_METER,
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Meters => write!(f, "meters"),
            Self::Feet => write!(f, "feet"),
        }
    }
}

/// One turn-by-turn instruction with its segment distance in the
/// snapshot's unit.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStep {
    pub instruction: String,
    pub distance: f64,
}

/// Immutable, normalized route result published after every successful
/// (re)computation. Absent entirely when no route is active.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSnapshot {
    /// Route geometry, origin first.
    pub polyline: Vec<GeoPoint>,
    /// Total distance in `unit`.
    pub distance: f64,
    /// Unit of `distance` and of each step's distance.
    pub unit: DistanceUnit,
    /// Expected travel time in minutes.
    pub duration_minutes: f64,
    /// Steps with empty instruction text filtered out.
    pub steps: Vec<RouteStep>,
}

impl RouteSnapshot {
    /// Normalize a provider candidate: convert distances to `unit`,
    /// duration to minutes, and drop steps without instruction text.
    pub fn from_candidate(candidate: CandidateRoute, unit: DistanceUnit) -> Self {
        let steps = candidate
            .steps
            .into_iter()
            .filter(|s| !s.instruction.is_empty())
            .map(|s| RouteStep {
                instruction: s.instruction,
                distance: unit.from_meters(s.distance_meters),
            })
            .collect();

        Self {
            polyline: candidate.polyline,
            distance: unit.from_meters(candidate.distance_meters),
            unit,
            duration_minutes: candidate.duration_seconds / 60.0,
            steps,
        }
    }
}
