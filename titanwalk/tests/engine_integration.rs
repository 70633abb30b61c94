//! Integration tests for the navigation engine façade.
//!
//! These tests drive the complete flows the presentation layer uses:
//! search → destination selection → live recomputation, privileged
//! mutation gating, and the accessibility policy for anonymous sessions.
//! The directions provider is a mock so provider-call counts can be
//! asserted; positions come from scripted sources.
//!
//! Run with: `cargo test --test engine_integration`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::timeout;

use titanwalk::auth::{Credentials, OperatingMode, StaticVerifier};
use titanwalk::campus::CAMPUS_SEED;
use titanwalk::coord::GeoPoint;
use titanwalk::engine::{EngineConfig, EngineEvent, Mutation, MutationOutcome, NavigationEngine};
use titanwalk::position::{FixedSource, PositionSource, ScriptedSource};
use titanwalk::registry::Category;
use titanwalk::route::{
    CandidateRoute, CandidateStep, DirectionsError, DirectionsProvider, DirectionsResponse,
};
use titanwalk::EngineError;

// ============================================================================
// Test Helpers
// ============================================================================

/// A point on the campus quad, used as the observer's starting position.
const QUAD: GeoPoint = GeoPoint {
    latitude: 33.8800,
    longitude: -117.8850,
};

/// A point offset north of QUAD by roughly `meters`.
fn north_of_quad(meters: f64) -> GeoPoint {
    GeoPoint {
        latitude: QUAD.latitude + meters / 111_320.0,
        longitude: QUAD.longitude,
    }
}

/// Mock directions provider: counts calls and returns a fixed candidate
/// whose polyline runs from the requested origin to the destination.
#[derive(Clone)]
struct MockDirections {
    calls: Arc<AtomicUsize>,
    delay: Duration,
    fail: bool,
}

impl MockDirections {
    fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
            fail: false,
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DirectionsProvider for MockDirections {
    async fn walking_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<DirectionsResponse, DirectionsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(DirectionsError::Http("connection refused".into()));
        }
        Ok(DirectionsResponse {
            routes: vec![CandidateRoute {
                polyline: vec![origin, destination],
                distance_meters: 180.0,
                duration_seconds: 132.0,
                steps: vec![
                    CandidateStep {
                        instruction: "Head north".into(),
                        distance_meters: 180.0,
                    },
                    CandidateStep {
                        instruction: String::new(),
                        distance_meters: 0.0,
                    },
                ],
            }],
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Engine seeded with the campus set, a mock provider, and the given
/// position source.
fn create_engine<S: PositionSource>(
    provider: MockDirections,
    source: S,
) -> NavigationEngine<MockDirections, S> {
    NavigationEngine::new(
        EngineConfig::default(),
        Box::new(StaticVerifier::default()),
        provider,
        source,
        &CAMPUS_SEED,
    )
}

fn admin_credentials() -> Credentials {
    Credentials::new("Admin", "password123")
}

/// Wait for the next position fix event, skipping unrelated events.
async fn wait_for_fix(events: &mut broadcast::Receiver<EngineEvent>) {
    loop {
        match timeout(Duration::from_secs(2), events.recv()).await {
            Ok(Ok(EngineEvent::PositionUpdated(_))) => return,
            Ok(Ok(_)) => continue,
            other => panic!("timed out waiting for position update: {other:?}"),
        }
    }
}

// ============================================================================
// Accessibility defaults and mutation gating
// ============================================================================

/// Seeded locations start open; locations created through the create
/// mode start closed.
#[tokio::test]
async fn test_accessibility_default_differs_by_creation_path() {
    let engine = create_engine(MockDirections::new(), FixedSource::new(QUAD));

    assert!(engine.locations().iter().all(|l| l.accessible));

    engine.login(admin_credentials()).unwrap();
    let outcome = engine
        .mutate(Mutation::Create {
            name: "New Building".into(),
            position: GeoPoint {
                latitude: 33.88,
                longitude: -117.88,
            },
            category: Category::Outside,
        })
        .unwrap();

    let MutationOutcome::Created(id) = outcome else {
        panic!("expected creation outcome, got {outcome:?}");
    };
    let created = engine.location(id).unwrap();
    assert!(!created.accessible);
    assert_eq!(created.category, Category::Outside);
}

#[tokio::test]
async fn test_toggle_is_its_own_inverse() {
    let engine = create_engine(MockDirections::new(), FixedSource::new(QUAD));
    engine.login(admin_credentials()).unwrap();
    engine.set_mode(OperatingMode::Edit).unwrap();

    let library = engine.search_by_name("Pollak Library").unwrap();
    assert!(library.accessible);

    engine
        .mutate(Mutation::ToggleAccessible(library.id))
        .unwrap();
    assert!(!engine.location(library.id).unwrap().accessible);

    engine
        .mutate(Mutation::ToggleAccessible(library.id))
        .unwrap();
    assert!(engine.location(library.id).unwrap().accessible);
}

#[tokio::test]
async fn test_anonymous_session_cannot_mutate() {
    let engine = create_engine(MockDirections::new(), FixedSource::new(QUAD));

    // A failed login leaves the session anonymous.
    let result = engine.login(Credentials::new("Admin", "nope"));
    assert!(matches!(result, Err(EngineError::Unauthorized)));
    assert!(!engine.is_authenticated());

    let library = engine.search_by_name("Library").unwrap();
    let result = engine.mutate(Mutation::ToggleAccessible(library.id));
    assert!(matches!(result, Err(EngineError::Forbidden)));
    assert!(engine.location(library.id).unwrap().accessible);
}

/// Authenticated but in the wrong mode: mutations are refused per action
/// family.
#[tokio::test]
async fn test_mode_mismatch_is_forbidden() {
    let engine = create_engine(MockDirections::new(), FixedSource::new(QUAD));
    engine.login(admin_credentials()).unwrap();
    // Login enters create mode, so edit and delete actions are refused.
    assert_eq!(engine.mode(), Some(OperatingMode::Create));

    let library = engine.search_by_name("Library").unwrap();
    assert!(matches!(
        engine.mutate(Mutation::ToggleAccessible(library.id)),
        Err(EngineError::Forbidden)
    ));
    assert!(matches!(
        engine.mutate(Mutation::Remove(library.id)),
        Err(EngineError::Forbidden)
    ));

    engine.set_mode(OperatingMode::Delete).unwrap();
    assert_eq!(
        engine.mutate(Mutation::Remove(library.id)).unwrap(),
        MutationOutcome::Removed
    );
    // Removing an absent id stays a no-op.
    assert_eq!(
        engine.mutate(Mutation::Remove(library.id)).unwrap(),
        MutationOutcome::Removed
    );
}

#[tokio::test]
async fn test_logout_revokes_privileges() {
    let engine = create_engine(MockDirections::new(), FixedSource::new(QUAD));
    engine.login(admin_credentials()).unwrap();
    engine.set_mode(OperatingMode::Edit).unwrap();
    engine.logout();

    assert!(!engine.is_authenticated());
    assert_eq!(engine.mode(), None);
    let library = engine.search_by_name("Library").unwrap();
    assert!(matches!(
        engine.mutate(Mutation::ToggleAccessible(library.id)),
        Err(EngineError::Forbidden)
    ));
}

// ============================================================================
// Search and destination selection
// ============================================================================

/// Anonymous search finds an accessible seed location and a route can be
/// requested to it.
#[tokio::test]
async fn test_search_and_route_to_seed_location() {
    let provider = MockDirections::new();
    let engine = create_engine(provider.clone(), FixedSource::new(QUAD));
    let mut events = engine.subscribe();

    engine.start();
    wait_for_fix(&mut events).await;

    let library = engine.search_by_name("Library").unwrap();
    assert_eq!(library.name, "Pollak Library");

    engine.select_destination(library.id).await.unwrap();
    assert_eq!(provider.call_count(), 1);

    let route = engine.route().expect("route should be published");
    assert_eq!(route.polyline.last().unwrap(), &library.position);
    // 180 m normalized to the default display unit (feet), duration to
    // minutes.
    assert!((route.distance - 590.5512).abs() < 0.001);
    assert!((route.duration_minutes - 2.2).abs() < 1e-9);
    // The empty-instruction step is filtered out.
    assert_eq!(route.steps.len(), 1);
}

#[tokio::test]
async fn test_search_is_case_insensitive_substring() {
    let engine = create_engine(MockDirections::new(), FixedSource::new(QUAD));

    assert_eq!(
        engine.search_by_name("pollak").unwrap().name,
        "Pollak Library"
    );
    assert_eq!(
        engine.search_by_name("LIBRARY").unwrap().name,
        "Pollak Library"
    );
    assert!(matches!(
        engine.search_by_name("Aquatics Center"),
        Err(EngineError::NotFound { .. })
    ));
}

/// A location toggled closed by an edit-mode session is rejected for
/// anonymous selection with no provider call.
#[tokio::test]
async fn test_closed_destination_rejected_without_provider_call() {
    let provider = MockDirections::new();
    let engine = create_engine(provider.clone(), FixedSource::new(QUAD));
    let mut events = engine.subscribe();
    engine.start();
    wait_for_fix(&mut events).await;

    let library = engine.search_by_name("Pollak Library").unwrap();

    engine.login(admin_credentials()).unwrap();
    engine.set_mode(OperatingMode::Edit).unwrap();
    engine
        .mutate(Mutation::ToggleAccessible(library.id))
        .unwrap();
    engine.logout();

    let result = engine.select_destination(library.id).await;
    assert!(
        matches!(result, Err(EngineError::DestinationClosed(ref name)) if name == "Pollak Library")
    );
    assert_eq!(provider.call_count(), 0);
    assert!(engine.route().is_none());
}

/// Privileged sessions may still route to closed locations.
#[tokio::test]
async fn test_privileged_session_routes_to_closed_location() {
    let provider = MockDirections::new();
    let engine = create_engine(provider.clone(), FixedSource::new(QUAD));
    let mut events = engine.subscribe();
    engine.start();
    wait_for_fix(&mut events).await;

    let library = engine.search_by_name("Pollak Library").unwrap();
    engine.login(admin_credentials()).unwrap();
    engine.set_mode(OperatingMode::Edit).unwrap();
    engine
        .mutate(Mutation::ToggleAccessible(library.id))
        .unwrap();

    engine.select_destination(library.id).await.unwrap();
    assert_eq!(provider.call_count(), 1);
}

/// A location created through the create mode is closed, so anonymous
/// search cannot resolve it as reachable even on an exact name match.
#[tokio::test]
async fn test_created_location_invisible_to_anonymous_search() {
    let engine = create_engine(MockDirections::new(), FixedSource::new(QUAD));

    engine.login(admin_credentials()).unwrap();
    engine
        .mutate(Mutation::Create {
            name: "New Building".into(),
            position: GeoPoint {
                latitude: 33.88,
                longitude: -117.88,
            },
            category: Category::Outside,
        })
        .unwrap();

    // The privileged session sees it.
    assert!(engine.search_by_name("New Building").is_ok());

    engine.logout();
    let result = engine.search_by_name("New Building");
    assert!(
        matches!(result, Err(EngineError::DestinationClosed(ref name)) if name == "New Building")
    );
}

#[tokio::test]
async fn test_select_without_position_fails() {
    let provider = MockDirections::new();
    // Engine never started: no fix has arrived.
    let engine = create_engine(provider.clone(), FixedSource::new(QUAD));

    let library = engine.search_by_name("Library").unwrap();
    let result = engine.select_destination(library.id).await;
    assert!(matches!(result, Err(EngineError::PositionUnavailable)));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_select_point_requires_privilege() {
    let engine = create_engine(MockDirections::new(), FixedSource::new(QUAD));
    let mut events = engine.subscribe();
    engine.start();
    wait_for_fix(&mut events).await;

    let result = engine.select_point(north_of_quad(50.0)).await;
    assert!(matches!(result, Err(EngineError::Forbidden)));

    engine.login(admin_credentials()).unwrap();
    engine.select_point(north_of_quad(50.0)).await.unwrap();
    assert!(engine.route().is_some());
}

#[tokio::test]
async fn test_provider_failure_surfaces_and_engine_stays_usable() {
    let provider = MockDirections::failing();
    let engine = create_engine(provider.clone(), FixedSource::new(QUAD));
    let mut events = engine.subscribe();
    engine.start();
    wait_for_fix(&mut events).await;

    let library = engine.search_by_name("Library").unwrap();
    let result = engine.select_destination(library.id).await;
    assert!(matches!(result, Err(EngineError::RouteUnavailable(_))));
    // One attempt, no automatic retry.
    assert_eq!(provider.call_count(), 1);

    // The engine remains usable after the failure.
    assert_eq!(
        engine.search_by_name("Library").unwrap().name,
        "Pollak Library"
    );
}

// ============================================================================
// Live recomputation
// ============================================================================

/// Position updates at 0 m, 4 m, and 12 m from the route origin: the 4 m
/// jitter is absorbed, the 12 m movement recomputes. Exactly one
/// recomputation on top of the initial request.
#[tokio::test]
async fn test_recompute_fires_once_for_jitter_then_movement() {
    let provider = MockDirections::new();
    let source = ScriptedSource::new(
        vec![QUAD, north_of_quad(4.0), north_of_quad(12.0)],
        Duration::from_millis(150),
    );
    let engine = create_engine(provider.clone(), source);
    let mut events = engine.subscribe();

    engine.start();
    wait_for_fix(&mut events).await;

    let library = engine.search_by_name("Library").unwrap();
    engine.select_destination(library.id).await.unwrap();
    assert_eq!(provider.call_count(), 1);

    // Remaining two fixes arrive; only the 12 m one recomputes.
    wait_for_fix(&mut events).await;
    wait_for_fix(&mut events).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(provider.call_count(), 2);
    let route = engine.route().expect("route still active");
    assert_eq!(route.polyline.first().unwrap(), &north_of_quad(12.0));
}

#[tokio::test]
async fn test_clear_route_resets_published_state() {
    let provider = MockDirections::new();
    let engine = create_engine(provider.clone(), FixedSource::new(QUAD));
    let mut events = engine.subscribe();
    engine.start();
    wait_for_fix(&mut events).await;

    let library = engine.search_by_name("Library").unwrap();
    engine.select_destination(library.id).await.unwrap();
    assert!(engine.route().is_some());

    engine.clear_route();
    assert!(engine.route().is_none());

    // A RouteUpdated(None) is published for the UI to drop the polyline.
    loop {
        match timeout(Duration::from_secs(2), events.recv()).await {
            Ok(Ok(EngineEvent::RouteUpdated(None))) => break,
            Ok(Ok(_)) => continue,
            other => panic!("expected cleared-route event, got {other:?}"),
        }
    }
}

/// A directions result that lands after the route was cleared must not
/// resurrect the route.
#[tokio::test]
async fn test_stale_route_result_is_dropped_after_clear() {
    let provider = MockDirections::slow(Duration::from_millis(150));
    let engine = Arc::new(create_engine(provider.clone(), FixedSource::new(QUAD)));
    let mut events = engine.subscribe();
    engine.start();
    wait_for_fix(&mut events).await;

    let library = engine.search_by_name("Library").unwrap();
    let selection = {
        let engine = Arc::clone(&engine);
        let id = library.id;
        tokio::spawn(async move { engine.select_destination(id).await })
    };

    tokio::time::sleep(Duration::from_millis(30)).await;
    engine.clear_route();

    // The in-flight request completes without error and without effect.
    selection.await.unwrap().unwrap();
    assert!(engine.route().is_none());
}

// ============================================================================
// Notification sink
// ============================================================================

#[tokio::test]
async fn test_failures_are_forwarded_as_notices() {
    let engine = create_engine(MockDirections::new(), FixedSource::new(QUAD));
    let mut events = engine.subscribe();

    let _ = engine.search_by_name("Aquatics Center");

    loop {
        match timeout(Duration::from_secs(2), events.recv()).await {
            Ok(Ok(EngineEvent::Notice(message))) => {
                assert_eq!(message, "Building 'Aquatics Center' not found");
                break;
            }
            Ok(Ok(_)) => continue,
            other => panic!("expected notice event, got {other:?}"),
        }
    }
}
