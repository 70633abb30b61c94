//! Route coordinator - orchestrates route computation and recomputation.
//!
//! The coordinator owns the published route snapshot and the recorded
//! destination. It enforces the accessibility rule before any provider
//! call for non-privileged requests, consumes only the first provider
//! candidate, and guards shared state against late-arriving results: a
//! generation counter advances on every new selection and on clear, and a
//! provider result is applied only if its generation is still current.
//! Stale results are dropped silently, never reported as errors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::coord::GeoPoint;
use crate::error::EngineError;
use crate::position::PositionTracker;
use crate::registry::{LocationId, LocationRegistry};

use super::provider::{DirectionsError, DirectionsProvider};
use super::types::{DistanceUnit, RouteSnapshot};

/// Destination recorded for recomputation.
#[derive(Debug, Clone, Copy)]
struct ActiveDestination {
    id: Option<LocationId>,
    point: GeoPoint,
}

/// Mediates route requests to the directions provider and owns the
/// resulting snapshot.
pub struct RouteCoordinator<P: DirectionsProvider> {
    provider: P,
    registry: Arc<LocationRegistry>,
    tracker: Arc<PositionTracker>,
    unit: DistanceUnit,
    active: RwLock<Option<ActiveDestination>>,
    snapshot: RwLock<Option<RouteSnapshot>>,
    generation: AtomicU64,
}

impl<P: DirectionsProvider> RouteCoordinator<P> {
    pub fn new(
        provider: P,
        registry: Arc<LocationRegistry>,
        tracker: Arc<PositionTracker>,
        unit: DistanceUnit,
    ) -> Self {
        Self {
            provider,
            registry,
            tracker,
            unit,
            active: RwLock::new(None),
            snapshot: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Request a route to a registered location.
    ///
    /// Non-privileged requests are refused with `DestinationClosed`
    /// before any provider call when the location is closed. Returns
    /// `Ok(None)` when a newer selection superseded this one mid-flight.
    pub async fn request_route_to_location(
        &self,
        id: LocationId,
        privileged: bool,
    ) -> Result<Option<RouteSnapshot>, EngineError> {
        let location = self
            .registry
            .get(id)
            .ok_or_else(|| EngineError::not_found(format!("location {id}")))?;
        if !privileged && !location.accessible {
            return Err(EngineError::DestinationClosed(location.name));
        }

        let origin = self.origin()?;
        let generation = self.begin_request();
        self.compute(
            generation,
            origin,
            ActiveDestination {
                id: Some(id),
                point: location.position,
            },
        )
        .await
    }

    /// Request a route to a raw coordinate (privileged ad-hoc flows; the
    /// façade gates on session privilege). No accessibility rule applies
    /// because there is no registered location to consult.
    pub async fn request_route_to_point(
        &self,
        point: GeoPoint,
    ) -> Result<Option<RouteSnapshot>, EngineError> {
        let origin = self.origin()?;
        let generation = self.begin_request();
        self.compute(generation, origin, ActiveDestination { id: None, point })
            .await
    }

    /// Recompute the active route from a new position. A no-op when no
    /// destination is recorded; `Ok(None)` also covers results dropped
    /// because a newer selection or a clear happened mid-flight.
    pub async fn recompute(
        &self,
        current: GeoPoint,
    ) -> Result<Option<RouteSnapshot>, EngineError> {
        let destination = match *self.active.read().unwrap() {
            Some(destination) => destination,
            None => return Ok(None),
        };
        let generation = self.generation.load(Ordering::Acquire);
        self.compute(generation, current, destination).await
    }

    /// Discard the snapshot and recorded destination, and invalidate any
    /// in-flight request. The caller also stops the position tracker if
    /// tracking is no longer needed.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        *self.active.write().unwrap() = None;
        *self.snapshot.write().unwrap() = None;
        tracing::debug!("route cleared");
    }

    /// Invalidate in-flight requests without discarding the published
    /// snapshot. Used when position tracking stops.
    pub(crate) fn invalidate_inflight(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Currently published snapshot, if a route is active.
    pub fn snapshot(&self) -> Option<RouteSnapshot> {
        self.snapshot.read().unwrap().clone()
    }

    /// Id of the recorded destination, when it is a registered location.
    pub fn destination_id(&self) -> Option<LocationId> {
        self.active.read().unwrap().and_then(|d| d.id)
    }

    fn origin(&self) -> Result<GeoPoint, EngineError> {
        self.tracker
            .latest()
            .map(|fix| fix.point)
            .ok_or(EngineError::PositionUnavailable)
    }

    fn begin_request(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Steps 3-5 of a route request: provider call, first-candidate
    /// normalization, publish. The result is applied only if `generation`
    /// is still current when the provider answers.
    async fn compute(
        &self,
        generation: u64,
        origin: GeoPoint,
        destination: ActiveDestination,
    ) -> Result<Option<RouteSnapshot>, EngineError> {
        let response = self
            .provider
            .walking_route(origin, destination.point)
            .await?;

        // First candidate wins; the provider's preference order is the
        // contract.
        let candidate = response
            .routes
            .into_iter()
            .next()
            .ok_or(EngineError::RouteUnavailable(DirectionsError::NoRoute))?;
        let snapshot = RouteSnapshot::from_candidate(candidate, self.unit);

        if self.generation.load(Ordering::Acquire) != generation {
            tracing::debug!(provider = self.provider.name(), "discarding stale route result");
            return Ok(None);
        }

        tracing::info!(
            provider = self.provider.name(),
            distance = snapshot.distance,
            unit = %snapshot.unit,
            duration_minutes = snapshot.duration_minutes,
            "route published"
        );
        self.tracker.set_baseline(origin);
        *self.active.write().unwrap() = Some(destination);
        *self.snapshot.write().unwrap() = Some(snapshot.clone());
        Ok(Some(snapshot))
    }
}
