//! Position tracker - live position state and route-refresh timing.
//!
//! The tracker owns the latest observer fix and the recompute baseline.
//! Every incoming fix is republished unconditionally on a broadcast
//! channel (for "you are here" rendering); a recompute signal is raised
//! only when the fix has moved beyond the hysteresis threshold from the
//! baseline, which keeps GPS jitter from triggering a storm of directions
//! requests while staying responsive to real movement.
//!
//! At most one subscription is active at a time: starting while running
//! cancels the previous subscription task before spawning the new one.

use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::coord::GeoPoint;

use super::fix::{PositionError, PositionFix};
use super::source::PositionSource;

/// Movement required before an active route is recalculated, in meters.
/// The boundary is exclusive: movement of exactly the threshold does not
/// trigger.
pub const DEFAULT_RECOMPUTE_THRESHOLD_M: f64 = 10.0;

/// Capacity of the fix republish channel.
const FIX_CAPACITY: usize = 32;

/// Tracker configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Recompute hysteresis threshold in meters.
    pub recompute_threshold_meters: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            recompute_threshold_meters: DEFAULT_RECOMPUTE_THRESHOLD_M,
        }
    }
}

/// Signal raised by the tracker task toward the engine loop.
#[derive(Debug, Clone)]
pub enum TrackerSignal {
    /// A fix arrived. `recompute_due` is true when movement from the
    /// baseline exceeded the threshold (or no baseline existed yet); the
    /// baseline has already advanced in that case.
    Fix {
        fix: PositionFix,
        recompute_due: bool,
    },
    /// The source reported a failure. The last known fix is unchanged.
    SourceError(PositionError),
}

/// State shared with the subscription task.
struct Shared {
    latest: RwLock<Option<PositionFix>>,
    baseline: Mutex<Option<GeoPoint>>,
}

struct Subscription {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Live position state and recompute-threshold decisions.
pub struct PositionTracker {
    shared: Arc<Shared>,
    fixes: broadcast::Sender<PositionFix>,
    subscription: Mutex<Option<Subscription>>,
    config: TrackerConfig,
}

impl PositionTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let (fixes, _) = broadcast::channel(FIX_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                latest: RwLock::new(None),
                baseline: Mutex::new(None),
            }),
            fixes,
            subscription: Mutex::new(None),
            config,
        }
    }

    /// Begin consuming the source. Idempotent: an already-running
    /// subscription is cancelled first, so at most one is active.
    ///
    /// Signals are delivered in arrival order on `signals`; the tracker
    /// task ends when the source channel closes, the signal receiver is
    /// dropped, or [`stop`](Self::stop) is called.
    pub fn start(&self, source: &dyn PositionSource, signals: mpsc::Sender<TrackerSignal>) {
        let mut subscription = self.subscription.lock().unwrap();
        if let Some(previous) = subscription.take() {
            tracing::debug!("cancelling previous position subscription");
            previous.cancel.cancel();
            // No overlap with the replacement subscription.
            previous.handle.abort();
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let mut rx = source.subscribe();
        let shared = Arc::clone(&self.shared);
        let fixes = self.fixes.clone();
        let threshold = self.config.recompute_threshold_meters;

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    item = rx.recv() => match item {
                        None => break,
                        Some(Ok(fix)) => {
                            *shared.latest.write().unwrap() = Some(fix.clone());
                            let _ = fixes.send(fix.clone());

                            let recompute_due = {
                                let mut baseline = shared.baseline.lock().unwrap();
                                let due = exceeds_threshold(
                                    baseline.as_ref(),
                                    &fix.point,
                                    threshold,
                                );
                                if due {
                                    *baseline = Some(fix.point);
                                }
                                due
                            };

                            if signals
                                .send(TrackerSignal::Fix { fix, recompute_due })
                                .await
                                .is_err()
                            {
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "position source reported an error");
                            if signals.send(TrackerSignal::SourceError(e)).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
            tracing::debug!("position subscription ended");
        });

        *subscription = Some(Subscription { cancel, handle });
    }

    /// Cancel the subscription. Safe to call when not running.
    pub fn stop(&self) {
        if let Some(subscription) = self.subscription.lock().unwrap().take() {
            subscription.cancel.cancel();
        }
    }

    /// True while a subscription task is alive.
    pub fn is_running(&self) -> bool {
        self.subscription
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|s| !s.handle.is_finished())
    }

    /// Whether a fix at `point` would trigger recomputation against the
    /// current baseline. Read-only: the baseline does not advance.
    pub fn should_recompute(&self, point: &GeoPoint) -> bool {
        exceeds_threshold(
            self.shared.baseline.lock().unwrap().as_ref(),
            point,
            self.config.recompute_threshold_meters,
        )
    }

    /// Latest fix, if any has arrived.
    pub fn latest(&self) -> Option<PositionFix> {
        self.shared.latest.read().unwrap().clone()
    }

    /// Subscribe to the unconditional fix republish stream.
    pub fn subscribe(&self) -> broadcast::Receiver<PositionFix> {
        self.fixes.subscribe()
    }

    /// Reset the recompute baseline, anchoring the hysteresis window at
    /// the origin a route was just computed from.
    pub(crate) fn set_baseline(&self, point: GeoPoint) {
        *self.shared.baseline.lock().unwrap() = Some(point);
    }
}

/// First fix always triggers; afterwards only movement strictly beyond
/// the threshold does.
fn exceeds_threshold(baseline: Option<&GeoPoint>, point: &GeoPoint, threshold: f64) -> bool {
    match baseline {
        None => true,
        Some(baseline) => baseline.distance_meters(point) > threshold,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::position::source::ScriptedSource;

    const BASE: GeoPoint = GeoPoint {
        latitude: 33.8800,
        longitude: -117.8850,
    };

    /// A point offset north of BASE by roughly `meters`.
    fn north_of_base(meters: f64) -> GeoPoint {
        GeoPoint {
            latitude: BASE.latitude + meters / 111_320.0,
            longitude: BASE.longitude,
        }
    }

    #[test]
    fn test_first_fix_always_triggers() {
        assert!(exceeds_threshold(None, &BASE, 10.0));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let under = north_of_base(4.0);
        let over = north_of_base(12.0);

        assert!(!exceeds_threshold(Some(&BASE), &under, 10.0));
        assert!(exceeds_threshold(Some(&BASE), &over, 10.0));

        // Movement of exactly the threshold distance does not trigger.
        let moved = north_of_base(10.0);
        let exact = BASE.distance_meters(&moved);
        assert!(!exceeds_threshold(Some(&BASE), &moved, exact));
    }

    #[tokio::test]
    async fn test_hysteresis_over_update_sequence() {
        // Updates at 0 m, 4 m, and 12 m from the baseline: the first fix
        // triggers (no baseline), 4 m is absorbed, 12 m triggers again.
        let source = ScriptedSource::new(
            vec![BASE, north_of_base(4.0), north_of_base(12.0)],
            Duration::ZERO,
        );
        let tracker = PositionTracker::new(TrackerConfig::default());
        let (tx, mut rx) = mpsc::channel(8);

        tracker.start(&source, tx);

        let mut flags = Vec::new();
        while let Some(signal) = rx.recv().await {
            if let TrackerSignal::Fix { recompute_due, .. } = signal {
                flags.push(recompute_due);
            }
        }
        assert_eq!(flags, vec![true, false, true]);
    }

    #[tokio::test]
    async fn test_latest_fix_survives_source_error() {
        let source = ScriptedSource::with_results(
            vec![
                Ok(PositionFix::new(BASE)),
                Err(PositionError::SourceFailed("gps dropout".into())),
            ],
            Duration::ZERO,
        );
        let tracker = PositionTracker::new(TrackerConfig::default());
        let (tx, mut rx) = mpsc::channel(8);

        tracker.start(&source, tx);

        assert!(matches!(
            rx.recv().await,
            Some(TrackerSignal::Fix { .. })
        ));
        assert!(matches!(
            rx.recv().await,
            Some(TrackerSignal::SourceError(PositionError::SourceFailed(_)))
        ));
        assert_eq!(tracker.latest().unwrap().point, BASE);
    }

    #[tokio::test]
    async fn test_restart_cancels_previous_subscription() {
        // A slow first source is replaced mid-stream; only the second
        // source's fixes may arrive on the new channel.
        let slow = ScriptedSource::new(
            vec![north_of_base(100.0); 8],
            Duration::from_millis(200),
        );
        let fast = ScriptedSource::new(vec![BASE], Duration::ZERO);
        let tracker = PositionTracker::new(TrackerConfig::default());

        let (tx1, mut rx1) = mpsc::channel(8);
        tracker.start(&slow, tx1);

        let (tx2, mut rx2) = mpsc::channel(8);
        tracker.start(&fast, tx2);

        // Old channel closes without delivering the slow fixes.
        let fix = rx2.recv().await;
        assert!(matches!(fix, Some(TrackerSignal::Fix { .. })));
        assert!(rx1.recv().await.is_none());
        assert_eq!(tracker.latest().unwrap().point, BASE);
    }

    #[tokio::test]
    async fn test_stop_is_safe_when_not_running() {
        let tracker = PositionTracker::new(TrackerConfig::default());
        tracker.stop();
        assert!(!tracker.is_running());
        assert!(tracker.latest().is_none());
    }

    #[tokio::test]
    async fn test_fix_republish_is_unconditional() {
        // Both the 0 m and the 4 m fix are republished even though only
        // the first triggers recomputation.
        let source = ScriptedSource::new(vec![BASE, north_of_base(4.0)], Duration::ZERO);
        let tracker = PositionTracker::new(TrackerConfig::default());
        let mut fixes = tracker.subscribe();
        let (tx, mut signals) = mpsc::channel(8);

        tracker.start(&source, tx);
        while signals.recv().await.is_some() {}

        assert_eq!(fixes.recv().await.unwrap().point, BASE);
        assert_eq!(fixes.recv().await.unwrap().point, north_of_base(4.0));
    }
}
