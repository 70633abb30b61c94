//! Engine configuration.

use crate::position::DEFAULT_RECOMPUTE_THRESHOLD_M;
use crate::route::DistanceUnit;

/// Configuration for [`super::NavigationEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Movement required before an active route is recomputed, in meters.
    pub recompute_threshold_meters: f64,

    /// Unit for distances in published route snapshots.
    pub distance_unit: DistanceUnit,

    /// Capacity of the published-event broadcast channel.
    pub event_capacity: usize,

    /// Capacity of the tracker-to-engine signal channel.
    pub signal_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            recompute_threshold_meters: DEFAULT_RECOMPUTE_THRESHOLD_M,
            distance_unit: DistanceUnit::default(),
            event_capacity: 64,
            signal_capacity: 32,
        }
    }
}
