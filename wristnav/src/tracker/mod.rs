//! Live step tracking.
//!
//! While the traveller follows a bike or walking route, position samples are
//! matched against the route's waypoints and every forward step change is
//! pushed to the watch as a CURRENT update.
//!
//! # State Machine
//!
//! ```text
//! Stopped --start(step_positions)--> Tracking
//! Tracking --start(step_positions)--> Tracking   (previous subscription replaced)
//! Tracking --stop()-----------------> Stopped
//! Stopped --stop()------------------> Stopped    (no-op)
//! ```
//!
//! # Policies
//!
//! - The current step only moves forward; samples that do not advance it are
//!   ignored.
//! - A sample that cannot be matched, or a provider error on the stream, is
//!   skipped. Tracking never stops because of a bad sample.
//! - CURRENT updates are retried once, then dropped.
//!
//! # Example
//!
//! ```ignore
//! use wristnav::tracker::{StepTracker, WatchOptions};
//!
//! let tracker = StepTracker::new(source, matcher, sink, WatchOptions::default());
//! tracker.start(route.step_positions.clone())?;
//! // ... samples arrive, CURRENT updates flow ...
//! tracker.stop();
//! ```

mod delivery;
mod matcher;
mod position;

pub use delivery::{send_current_step, StepDelivery};
pub use matcher::{MatchError, StepMatcher};
pub use position::{
    PositionBroadcaster, PositionError, PositionEvent, PositionSample, PositionSource,
    PositionSubscription, SubscriptionId, WatchOptions, DEFAULT_WATCH_TIMEOUT,
};

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::route::GeoPoint;
use crate::transport::MessageSink;

/// Observable tracker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// No position subscription is active.
    Stopped,
    /// A position subscription feeds CURRENT updates.
    Tracking,
}

/// Bookkeeping for the running subscription.
struct ActiveTracking {
    subscription_id: SubscriptionId,
    cancellation: CancellationToken,
    current_step: Arc<AtomicU32>,
}

/// Owns the position subscription and the current-step state.
///
/// At most one subscription is active at any time. Dropping the tracker
/// stops it.
pub struct StepTracker {
    source: Arc<dyn PositionSource>,
    matcher: Arc<dyn StepMatcher>,
    sink: Arc<dyn MessageSink>,
    options: WatchOptions,
    active: Mutex<Option<ActiveTracking>>,
}

impl StepTracker {
    /// Create a stopped tracker.
    pub fn new(
        source: Arc<dyn PositionSource>,
        matcher: Arc<dyn StepMatcher>,
        sink: Arc<dyn MessageSink>,
        options: WatchOptions,
    ) -> Self {
        Self {
            source,
            matcher,
            sink,
            options,
            active: Mutex::new(None),
        }
    }

    /// Start tracking a route, replacing any running subscription.
    ///
    /// The previous subscription is cancelled before the new one is created.
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the subscription cannot be created; the
    /// tracker is then stopped.
    pub fn start(&self, step_positions: Vec<GeoPoint>) -> Result<(), PositionError> {
        let mut active = self.active.lock();

        if let Some(previous) = active.take() {
            self.release(previous);
        }

        let subscription = self.source.subscribe(&self.options)?;
        let cancellation = CancellationToken::new();
        let current_step = Arc::new(AtomicU32::new(0));

        info!(
            subscription = subscription.id,
            waypoints = step_positions.len(),
            "Current step updates started"
        );

        let worker = TrackingWorker {
            step_positions,
            current_step: Arc::clone(&current_step),
            matcher: Arc::clone(&self.matcher),
            sink: Arc::clone(&self.sink),
        };
        tokio::spawn(worker.run(subscription.events, cancellation.clone()));

        *active = Some(ActiveTracking {
            subscription_id: subscription.id,
            cancellation,
            current_step,
        });
        Ok(())
    }

    /// Stop tracking.
    ///
    /// Unsubscribes synchronously. Returns `false` if nothing was running.
    pub fn stop(&self) -> bool {
        let previous = self.active.lock().take();
        match previous {
            Some(active) => {
                self.release(active);
                true
            }
            None => {
                debug!("Current step updates already stopped");
                false
            }
        }
    }

    /// Current state.
    pub fn state(&self) -> TrackerState {
        if self.active.lock().is_some() {
            TrackerState::Tracking
        } else {
            TrackerState::Stopped
        }
    }

    /// Last step index sent (or 0 before the first update), while tracking.
    pub fn current_step(&self) -> Option<u32> {
        self.active
            .lock()
            .as_ref()
            .map(|active| active.current_step.load(Ordering::SeqCst))
    }

    fn release(&self, active: ActiveTracking) {
        active.cancellation.cancel();
        self.source.unsubscribe(active.subscription_id);
        info!(
            subscription = active.subscription_id,
            last_step = active.current_step.load(Ordering::SeqCst),
            "Current step updates stopped"
        );
    }
}

impl Drop for StepTracker {
    fn drop(&mut self) {
        if let Some(active) = self.active.get_mut().take() {
            self.release(active);
        }
    }
}

/// Background task consuming one subscription.
struct TrackingWorker {
    step_positions: Vec<GeoPoint>,
    current_step: Arc<AtomicU32>,
    matcher: Arc<dyn StepMatcher>,
    sink: Arc<dyn MessageSink>,
}

impl TrackingWorker {
    async fn run(
        self,
        mut events: mpsc::UnboundedReceiver<PositionEvent>,
        cancellation: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;

                _ = cancellation.cancelled() => break,

                event = events.recv() => {
                    let Some(event) = event else {
                        debug!("Position stream ended");
                        break;
                    };

                    match event {
                        Ok(sample) => {
                            // An update for a cancelled route must not reach the watch.
                            tokio::select! {
                                biased;
                                _ = cancellation.cancelled() => break,
                                _ = self.process(sample) => {}
                            }
                        }
                        Err(e) => debug!(error = %e, "Position error ignored"),
                    }
                }
            }
        }

        debug!("Step tracking worker exited");
    }

    /// Match a sample and send an update on forward progress.
    ///
    /// Returns the new step if the sample advanced it.
    async fn process(&self, sample: PositionSample) -> Option<u32> {
        let current = self.current_step.load(Ordering::SeqCst);

        match self
            .matcher
            .match_step(&self.step_positions, &sample, current)
        {
            Ok(Some(step)) if step > current => {
                self.current_step.store(step, Ordering::SeqCst);
                send_current_step(self.sink.as_ref(), step).await;
                Some(step)
            }
            Ok(_) => None,
            Err(e) => {
                trace!(error = %e, "Position sample skipped");
                None
            }
        }
    }
}
