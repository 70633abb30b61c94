//! Position source abstraction and bundled implementations.
//!
//! A source is a push-based stream of fixes delivered over an mpsc
//! channel; the platform location service is an opaque collaborator
//! behind this trait. Failures arrive in-band as `Err` items so a source
//! can keep delivering after a transient fault.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::coord::GeoPoint;

use super::fix::{PositionError, PositionFix};

/// Item type delivered on a position subscription.
pub type FixResult = Result<PositionFix, PositionError>;

/// A push-based stream of observer position fixes.
pub trait PositionSource: Send + Sync {
    /// Open a subscription. Fixes arrive on the returned channel in
    /// delivery order; the channel closes when the source ends.
    fn subscribe(&self) -> mpsc::Receiver<FixResult>;
}

/// Source that replays a fixed script of fixes with a delay between
/// items. Used by tests and the CLI walk simulation.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    items: Vec<FixResult>,
    interval: Duration,
}

impl ScriptedSource {
    /// Replay the given points as successful fixes.
    pub fn new(points: Vec<GeoPoint>, interval: Duration) -> Self {
        Self {
            items: points.into_iter().map(|p| Ok(PositionFix::new(p))).collect(),
            interval,
        }
    }

    /// Replay raw results, including source errors.
    pub fn with_results(items: Vec<FixResult>, interval: Duration) -> Self {
        Self { items, interval }
    }
}

impl PositionSource for ScriptedSource {
    fn subscribe(&self) -> mpsc::Receiver<FixResult> {
        let (tx, rx) = mpsc::channel(self.items.len().max(1));
        let items = self.items.clone();
        let interval = self.interval;
        tokio::spawn(async move {
            for item in items {
                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });
        rx
    }
}

/// Source that reports a single static position and then ends. Used by
/// the CLI for one-shot route requests from a known point.
#[derive(Debug, Clone, Copy)]
pub struct FixedSource {
    point: GeoPoint,
}

impl FixedSource {
    pub fn new(point: GeoPoint) -> Self {
        Self { point }
    }
}

impl PositionSource for FixedSource {
    fn subscribe(&self) -> mpsc::Receiver<FixResult> {
        let (tx, rx) = mpsc::channel(1);
        let fix = PositionFix::new(self.point);
        tokio::spawn(async move {
            let _ = tx.send(Ok(fix)).await;
        });
        rx
    }
}
