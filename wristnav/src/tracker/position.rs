//! Position samples and the subscription interface that delivers them.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// Default position timeout (5 seconds).
pub const DEFAULT_WATCH_TIMEOUT: Duration = Duration::from_secs(5);

/// A single position fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Horizontal accuracy radius in meters.
    pub accuracy: f64,
}

impl PositionSample {
    /// Create a new position sample.
    pub fn new(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
        }
    }
}

/// Errors from the position provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    /// Location access is not permitted.
    #[error("Position permission denied")]
    PermissionDenied,

    /// No fix could be obtained.
    #[error("Position unavailable: {0}")]
    Unavailable(String),

    /// No fix arrived within the configured timeout.
    #[error("Position timed out")]
    Timeout,
}

/// Options passed to the position provider when subscribing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOptions {
    /// Ask for GPS-grade fixes.
    pub enable_high_accuracy: bool,
    /// Maximum wait for a fix.
    pub timeout: Duration,
    /// Maximum age of a cached fix; zero forces a fresh one.
    pub maximum_age: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: DEFAULT_WATCH_TIMEOUT,
            maximum_age: Duration::ZERO,
        }
    }
}

/// Identifies one active subscription.
pub type SubscriptionId = u64;

/// Item delivered on a subscription stream.
pub type PositionEvent = Result<PositionSample, PositionError>;

/// An active position subscription.
///
/// The stream ends when the provider drops its sender, normally after
/// [`PositionSource::unsubscribe`].
#[derive(Debug)]
pub struct PositionSubscription {
    /// Handle to pass to [`PositionSource::unsubscribe`].
    pub id: SubscriptionId,
    /// Samples and errors in delivery order.
    pub events: mpsc::UnboundedReceiver<PositionEvent>,
}

/// Live position provider.
pub trait PositionSource: Send + Sync {
    /// Start receiving position events.
    fn subscribe(&self, options: &WatchOptions) -> Result<PositionSubscription, PositionError>;

    /// Stop a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// In-process position source fanning published events out to subscribers.
///
/// Used for replaying recorded tracks and in tests.
#[derive(Debug, Default)]
pub struct PositionBroadcaster {
    next_id: AtomicU64,
    subscribers: Mutex<BTreeMap<SubscriptionId, mpsc::UnboundedSender<PositionEvent>>>,
}

impl PositionBroadcaster {
    /// Create a broadcaster with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a sample to every subscriber.
    ///
    /// Returns the number of subscribers reached.
    pub fn publish(&self, sample: PositionSample) -> usize {
        self.publish_event(Ok(sample))
    }

    /// Deliver a provider error to every subscriber.
    pub fn publish_error(&self, error: PositionError) -> usize {
        self.publish_event(Err(error))
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    fn publish_event(&self, event: PositionEvent) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|_, tx| tx.send(event.clone()).is_ok());
        subscribers.len()
    }
}

impl PositionSource for PositionBroadcaster {
    fn subscribe(&self, options: &WatchOptions) -> Result<PositionSubscription, PositionError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, events) = mpsc::unbounded_channel();
        self.subscribers.lock().insert(id, tx);
        debug!(
            id,
            high_accuracy = options.enable_high_accuracy,
            timeout_ms = options.timeout.as_millis() as u64,
            "Position subscription added"
        );
        Ok(PositionSubscription { id, events })
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if self.subscribers.lock().remove(&id).is_some() {
            debug!(id, "Position subscription removed");
        }
    }
}
