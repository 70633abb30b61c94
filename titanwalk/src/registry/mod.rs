//! Location registry - the authoritative set of navigable locations.
//!
//! The registry exclusively owns the canonical `Location` records. Every
//! other component holds ids or cloned snapshots, never a second mutable
//! copy, so cached values cannot diverge from the source of truth. All
//! mutation funnels through the methods here; each one emits a
//! [`RegistryEvent`] on a broadcast channel as a pure data-change signal
//! for observers to re-render from.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tokio::sync::broadcast;

use crate::campus::SeedLocation;
use crate::coord::GeoPoint;
use crate::error::EngineError;

/// Capacity of the change-notification channel.
const EVENT_CAPACITY: usize = 32;

/// Opaque, process-unique location identifier. Assigned at creation and
/// never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(u64);

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Presentation category for a location. No behavioral effect in the
/// engine; carried for annotation styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    Unclassified,
    Outside,
    Inside,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unclassified => write!(f, "unclassified"),
            Self::Outside => write!(f, "outside"),
            Self::Inside => write!(f, "inside"),
        }
    }
}

/// A navigable point of interest.
///
/// `id`, `name`, and `position` are immutable after creation; only
/// `accessible` changes, and only through [`LocationRegistry::toggle_accessible`].
#[derive(Debug, Clone)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub position: GeoPoint,
    pub category: Category,
    pub accessible: bool,
}

/// Data-change notification emitted on every registry mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    Added(LocationId),
    Removed(LocationId),
    AccessibilityChanged(LocationId, bool),
}

/// Authoritative registry of navigable locations.
pub struct LocationRegistry {
    locations: RwLock<Vec<Location>>,
    next_id: AtomicU64,
    events: broadcast::Sender<RegistryEvent>,
}

impl LocationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            locations: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            events,
        }
    }

    /// Install the seed set. Seeded locations start accessible, unlike
    /// locations created through the create operating mode.
    pub fn seed(&self, entries: &[SeedLocation]) {
        for entry in entries {
            self.create(
                entry.name.to_string(),
                entry.position,
                Category::Unclassified,
                true,
            );
        }
    }

    /// Insert a new location and return its id. Names are not unique.
    pub fn create(
        &self,
        name: String,
        position: GeoPoint,
        category: Category,
        accessible: bool,
    ) -> LocationId {
        let id = LocationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let location = Location {
            id,
            name,
            position,
            category,
            accessible,
        };
        self.locations.write().unwrap().push(location);
        let _ = self.events.send(RegistryEvent::Added(id));
        id
    }

    /// Remove a location. Removing an absent id is a no-op, not an error.
    pub fn remove(&self, id: LocationId) {
        let mut locations = self.locations.write().unwrap();
        let before = locations.len();
        locations.retain(|l| l.id != id);
        if locations.len() != before {
            let _ = self.events.send(RegistryEvent::Removed(id));
        }
    }

    /// Flip a location's accessibility flag and return the new state.
    pub fn toggle_accessible(&self, id: LocationId) -> Result<bool, EngineError> {
        let mut locations = self.locations.write().unwrap();
        let location = locations
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| EngineError::not_found(format!("location {id}")))?;
        location.accessible = !location.accessible;
        let state = location.accessible;
        drop(locations);
        let _ = self
            .events
            .send(RegistryEvent::AccessibilityChanged(id, state));
        Ok(state)
    }

    /// Snapshot of a single location.
    pub fn get(&self, id: LocationId) -> Option<Location> {
        self.locations
            .read()
            .unwrap()
            .iter()
            .find(|l| l.id == id)
            .cloned()
    }

    /// Snapshot of all locations in insertion order.
    pub fn list(&self) -> Vec<Location> {
        self.locations.read().unwrap().clone()
    }

    /// Snapshot of accessible locations in insertion order.
    pub fn list_accessible(&self) -> Vec<Location> {
        self.locations
            .read()
            .unwrap()
            .iter()
            .filter(|l| l.accessible)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.locations.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to data-change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }
}

impl Default for LocationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campus::CAMPUS_SEED;

    fn point(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint {
            latitude,
            longitude,
        }
    }

    #[test]
    fn test_create_assigns_unique_ids() {
        let registry = LocationRegistry::new();
        let a = registry.create("A".into(), point(33.88, -117.88), Category::Outside, false);
        let b = registry.create("A".into(), point(33.88, -117.88), Category::Outside, false);
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let registry = LocationRegistry::new();
        registry.create("First".into(), point(33.88, -117.88), Category::Inside, true);
        registry.create("Second".into(), point(33.88, -117.88), Category::Inside, true);
        registry.create("Third".into(), point(33.88, -117.88), Category::Inside, true);

        let names: Vec<String> = registry.list().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_seed_locations_start_accessible() {
        let registry = LocationRegistry::new();
        registry.seed(&CAMPUS_SEED);

        assert_eq!(registry.len(), CAMPUS_SEED.len());
        assert!(registry.list().iter().all(|l| l.accessible));
        assert_eq!(registry.list_accessible().len(), CAMPUS_SEED.len());
    }

    #[test]
    fn test_toggle_is_its_own_inverse() {
        let registry = LocationRegistry::new();
        let id = registry.create("Hall".into(), point(33.88, -117.88), Category::Inside, true);

        assert_eq!(registry.toggle_accessible(id).unwrap(), false);
        assert_eq!(registry.toggle_accessible(id).unwrap(), true);
        assert!(registry.get(id).unwrap().accessible);
    }

    #[test]
    fn test_toggle_unknown_id_is_not_found() {
        let registry = LocationRegistry::new();
        let id = registry.create("Hall".into(), point(33.88, -117.88), Category::Inside, true);
        registry.remove(id);

        let result = registry.toggle_accessible(id);
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn test_remove_absent_id_is_noop() {
        let registry = LocationRegistry::new();
        let id = registry.create("Hall".into(), point(33.88, -117.88), Category::Inside, true);
        registry.remove(id);
        registry.remove(id); // second removal must not panic or error
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_accessible_filters_closed() {
        let registry = LocationRegistry::new();
        let open = registry.create("Open".into(), point(33.88, -117.88), Category::Inside, true);
        registry.create("Closed".into(), point(33.88, -117.88), Category::Inside, false);

        let accessible = registry.list_accessible();
        assert_eq!(accessible.len(), 1);
        assert_eq!(accessible[0].id, open);
    }

    #[test]
    fn test_mutations_emit_events() {
        let registry = LocationRegistry::new();
        let mut events = registry.subscribe();

        let id = registry.create("Hall".into(), point(33.88, -117.88), Category::Inside, true);
        registry.toggle_accessible(id).unwrap();
        registry.remove(id);

        assert_eq!(events.try_recv().unwrap(), RegistryEvent::Added(id));
        assert_eq!(
            events.try_recv().unwrap(),
            RegistryEvent::AccessibilityChanged(id, false)
        );
        assert_eq!(events.try_recv().unwrap(), RegistryEvent::Removed(id));
    }

    #[test]
    fn test_removal_of_absent_id_emits_nothing() {
        let registry = LocationRegistry::new();
        let id = registry.create("Hall".into(), point(33.88, -117.88), Category::Inside, true);
        registry.remove(id);

        let mut events = registry.subscribe();
        registry.remove(id);
        assert!(events.try_recv().is_err());
    }
}
