//! Navigation engine façade.
//!
//! The only entry point the presentation layer uses. The engine composes
//! the registry, access authority, position tracker, and route
//! coordinator, sequences them, and owns the published observable state.
//! It is constructed explicitly and passed by handle - there are no
//! ambient singletons.
//!
//! # Live recomputation
//!
//! [`start`](NavigationEngine::start) spawns the engine loop: a single
//! consumer of tracker signals. Every fix is republished as
//! [`EngineEvent::PositionUpdated`]; fixes that moved beyond the
//! hysteresis threshold additionally drive
//! [`RouteCoordinator::recompute`]. Because the loop is the only
//! consumer, position updates are processed strictly in arrival order,
//! and the coordinator's generation guard drops results that a newer
//! selection or a clear has made stale.

use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::auth::{AccessAuthority, CredentialVerifier, Credentials, OperatingMode};
use crate::campus::SeedLocation;
use crate::coord::GeoPoint;
use crate::error::EngineError;
use crate::position::{PositionFix, PositionSource, PositionTracker, TrackerConfig, TrackerSignal};
use crate::registry::{Category, Location, LocationId, LocationRegistry};
use crate::route::{DirectionsProvider, RouteCoordinator, RouteSnapshot};

use super::config::EngineConfig;
use super::event::EngineEvent;

/// A privileged mutation of the location set.
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Add a location. Created closed: locations added through the
    /// create mode must be opened explicitly.
    Create {
        name: String,
        position: GeoPoint,
        category: Category,
    },
    /// Flip a location's accessibility flag.
    ToggleAccessible(LocationId),
    /// Remove a location. Removing an absent id succeeds as a no-op.
    Remove(LocationId),
}

impl Mutation {
    /// The operating mode this action family requires.
    fn required_mode(&self) -> OperatingMode {
        match self {
            Self::Create { .. } => OperatingMode::Create,
            Self::ToggleAccessible(_) => OperatingMode::Edit,
            Self::Remove(_) => OperatingMode::Delete,
        }
    }
}

/// Result of a successful [`NavigationEngine::mutate`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Created(LocationId),
    Toggled { accessible: bool },
    Removed,
}

struct EngineLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Façade over the navigation and accessibility state engine.
pub struct NavigationEngine<P, S>
where
    P: DirectionsProvider + 'static,
    S: PositionSource,
{
    registry: Arc<LocationRegistry>,
    authority: AccessAuthority,
    tracker: Arc<PositionTracker>,
    coordinator: Arc<RouteCoordinator<P>>,
    source: S,
    events: broadcast::Sender<EngineEvent>,
    engine_loop: Mutex<Option<EngineLoop>>,
    config: EngineConfig,
}

impl<P, S> NavigationEngine<P, S>
where
    P: DirectionsProvider + 'static,
    S: PositionSource,
{
    /// Construct the engine with its collaborators and seed the location
    /// registry. Seeded locations start accessible.
    pub fn new(
        config: EngineConfig,
        verifier: Box<dyn CredentialVerifier>,
        provider: P,
        source: S,
        seed: &[SeedLocation],
    ) -> Self {
        let registry = Arc::new(LocationRegistry::new());
        registry.seed(seed);

        let tracker = Arc::new(PositionTracker::new(TrackerConfig {
            recompute_threshold_meters: config.recompute_threshold_meters,
        }));
        let coordinator = Arc::new(RouteCoordinator::new(
            provider,
            Arc::clone(&registry),
            Arc::clone(&tracker),
            config.distance_unit,
        ));
        let (events, _) = broadcast::channel(config.event_capacity);

        Self {
            registry,
            authority: AccessAuthority::new(verifier),
            tracker,
            coordinator,
            source,
            events,
            engine_loop: Mutex::new(None),
            config,
        }
    }

    /// Start position tracking and the engine loop. A no-op while
    /// already running; after a stop (or when the position source ended)
    /// it starts a fresh subscription.
    pub fn start(&self) {
        let mut engine_loop = self.engine_loop.lock().unwrap();
        if engine_loop.as_ref().is_some_and(|l| !l.handle.is_finished()) {
            return;
        }

        let (signals_tx, mut signals_rx) = mpsc::channel(self.config.signal_capacity);
        self.tracker.start(&self.source, signals_tx);

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let coordinator = Arc::clone(&self.coordinator);
        let events = self.events.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    signal = signals_rx.recv() => match signal {
                        None => break,
                        Some(TrackerSignal::Fix { fix, recompute_due }) => {
                            let _ = events.send(EngineEvent::PositionUpdated(fix.clone()));
                            if recompute_due {
                                match coordinator.recompute(fix.point).await {
                                    Ok(Some(snapshot)) => {
                                        let _ = events
                                            .send(EngineEvent::RouteUpdated(Some(snapshot)));
                                    }
                                    // No active destination, or a stale
                                    // result that was dropped.
                                    Ok(None) => {}
                                    Err(e) => {
                                        let _ = events.send(EngineEvent::Notice(e.to_string()));
                                    }
                                }
                            }
                        }
                        Some(TrackerSignal::SourceError(e)) => {
                            let _ = events.send(EngineEvent::Notice(e.to_string()));
                        }
                    }
                }
            }
            tracing::debug!("engine loop ended");
        });

        *engine_loop = Some(EngineLoop { cancel, handle });
    }

    /// Stop the engine loop and position tracking, and drop the effect
    /// of any in-flight recompute on shared state.
    pub fn stop(&self) {
        if let Some(engine_loop) = self.engine_loop.lock().unwrap().take() {
            engine_loop.cancel.cancel();
        }
        self.tracker.stop();
        self.coordinator.invalidate_inflight();
    }

    /// Authenticate as a privileged operator.
    pub fn login(&self, credentials: Credentials) -> Result<(), EngineError> {
        self.authority
            .authenticate(credentials)
            .map_err(|e| self.notify_err(e))
    }

    /// Return to an anonymous session.
    pub fn logout(&self) {
        self.authority.logout();
    }

    /// Switch the privileged operating mode.
    pub fn set_mode(&self, mode: OperatingMode) -> Result<(), EngineError> {
        self.authority.set_mode(mode).map_err(|e| self.notify_err(e))
    }

    pub fn is_authenticated(&self) -> bool {
        self.authority.authorize()
    }

    pub fn mode(&self) -> Option<OperatingMode> {
        self.authority.mode()
    }

    pub fn actor(&self) -> Option<String> {
        self.authority.actor()
    }

    /// Select a registered location as the destination: enforce the
    /// accessibility rule for the current session, request a route, and
    /// on success keep position tracking live so the route follows the
    /// observer.
    pub async fn select_destination(&self, id: LocationId) -> Result<(), EngineError> {
        let privileged = self.authority.authorize();
        match self
            .coordinator
            .request_route_to_location(id, privileged)
            .await
        {
            Ok(Some(snapshot)) => {
                self.start();
                let _ = self.events.send(EngineEvent::RouteUpdated(Some(snapshot)));
                Ok(())
            }
            // Superseded mid-flight by a newer selection; the newer state
            // has already been published.
            Ok(None) => Ok(()),
            Err(e) => Err(self.notify_err(e)),
        }
    }

    /// Route to a raw coordinate. Privileged sessions only - anonymous
    /// destinations always go through the accessibility-checked id path.
    pub async fn select_point(&self, point: GeoPoint) -> Result<(), EngineError> {
        if !self.authority.authorize() {
            return Err(self.notify_err(EngineError::Forbidden));
        }
        match self.coordinator.request_route_to_point(point).await {
            Ok(Some(snapshot)) => {
                self.start();
                let _ = self.events.send(EngineEvent::RouteUpdated(Some(snapshot)));
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => Err(self.notify_err(e)),
        }
    }

    /// Apply a privileged mutation. Requires an authenticated session in
    /// the mode matching the action family; fails with `Forbidden`
    /// otherwise.
    pub fn mutate(&self, mutation: Mutation) -> Result<MutationOutcome, EngineError> {
        if !self.authority.authorize() {
            return Err(self.notify_err(EngineError::Forbidden));
        }
        if self.authority.mode() != Some(mutation.required_mode()) {
            return Err(self.notify_err(EngineError::Forbidden));
        }

        let outcome = match mutation {
            Mutation::Create {
                name,
                position,
                category,
            } => {
                let id = self.registry.create(name, position, category, false);
                MutationOutcome::Created(id)
            }
            Mutation::ToggleAccessible(id) => {
                let accessible = self
                    .registry
                    .toggle_accessible(id)
                    .map_err(|e| self.notify_err(e))?;
                MutationOutcome::Toggled { accessible }
            }
            Mutation::Remove(id) => {
                self.registry.remove(id);
                MutationOutcome::Removed
            }
        };

        let _ = self.events.send(EngineEvent::LocationsChanged);
        Ok(outcome)
    }

    /// Case-insensitive substring search over the privilege-appropriate
    /// location list. Distinguishes a name that matches nothing from one
    /// that matches only a closed location, so the caller can render the
    /// more specific message.
    pub fn search_by_name(&self, query: &str) -> Result<Location, EngineError> {
        let privileged = self.authority.authorize();
        let needle = query.to_lowercase();

        let pool = if privileged {
            self.registry.list()
        } else {
            self.registry.list_accessible()
        };
        if let Some(location) = pool
            .into_iter()
            .find(|l| l.name.to_lowercase().contains(&needle))
        {
            return Ok(location);
        }

        if !privileged {
            if let Some(closed) = self
                .registry
                .list()
                .into_iter()
                .find(|l| !l.accessible && l.name.to_lowercase().contains(&needle))
            {
                return Err(self.notify_err(EngineError::DestinationClosed(closed.name)));
            }
        }

        Err(self.notify_err(EngineError::not_found(format!("Building '{query}'"))))
    }

    /// Discard the active route and halt recomputation. Also stops
    /// position tracking - re-selecting a destination restarts it.
    pub fn clear_route(&self) {
        self.coordinator.clear();
        self.tracker.stop();
        let _ = self.events.send(EngineEvent::RouteUpdated(None));
    }

    /// Locations visible to the current session: the full set for
    /// privileged sessions, accessible-only otherwise.
    pub fn locations(&self) -> Vec<Location> {
        if self.authority.authorize() {
            self.registry.list()
        } else {
            self.registry.list_accessible()
        }
    }

    /// Snapshot of a single location, regardless of accessibility.
    pub fn location(&self, id: LocationId) -> Option<Location> {
        self.registry.get(id)
    }

    /// Currently published route, if any.
    pub fn route(&self) -> Option<RouteSnapshot> {
        self.coordinator.snapshot()
    }

    /// Latest observer position fix, if any.
    pub fn position(&self) -> Option<PositionFix> {
        self.tracker.latest()
    }

    /// Subscribe to published state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Forward a failure message to the notification sink and hand the
    /// typed error back to the caller.
    fn notify_err(&self, e: EngineError) -> EngineError {
        let _ = self.events.send(EngineEvent::Notice(e.to_string()));
        e
    }
}

impl<P, S> Drop for NavigationEngine<P, S>
where
    P: DirectionsProvider + 'static,
    S: PositionSource,
{
    fn drop(&mut self) {
        if let Some(engine_loop) = self.engine_loop.lock().unwrap().take() {
            engine_loop.cancel.cancel();
        }
        self.tracker.stop();
    }
}
