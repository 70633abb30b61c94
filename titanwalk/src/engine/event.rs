//! Published engine state changes.

use crate::position::PositionFix;
use crate::route::RouteSnapshot;

/// Events broadcast by the engine for the presentation layer to render
/// from. The engine never renders anything itself; failure text arrives
/// as [`EngineEvent::Notice`] for display.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The location set changed (created, removed, or toggled).
    LocationsChanged,

    /// A new observer position fix arrived.
    PositionUpdated(PositionFix),

    /// A route was (re)computed, or cleared when `None`.
    RouteUpdated(Option<RouteSnapshot>),

    /// Human-readable failure or status message for the notification
    /// sink.
    Notice(String),
}
