//! Observer position tracking.
//!
//! This module maintains the continuously updating observer position and
//! decides when an active route must be recomputed:
//!
//! - [`PositionSource`] - push-based fix stream (the platform location
//!   service, or a scripted replay)
//! - [`PositionTracker`] - latest-fix state, at-most-one-active
//!   subscription, and the recompute hysteresis rule
//! - [`PositionFix`] / [`PositionError`] - fix snapshot and source
//!   failure modes

mod fix;
mod source;
mod tracker;

pub use fix::{PositionError, PositionFix};
pub use source::{FixResult, FixedSource, PositionSource, ScriptedSource};
pub use tracker::{
    PositionTracker, TrackerConfig, TrackerSignal, DEFAULT_RECOMPUTE_THRESHOLD_M,
};
