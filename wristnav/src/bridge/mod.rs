//! The companion bridge.
//!
//! `Bridge` is the application context: it owns the message number counter,
//! the tracking slot and the collaborators, and turns each inbound SEARCH into
//! a route transfer followed (for bike and walking routes) by live step
//! updates.
//!
//! # Request Lifecycle
//!
//! ```text
//! SEARCH "1Brockhofweg 9"
//!   │
//!   ├─ accept ──── parse ─► allocate message number ─► stop tracking ─► resolve named address
//!   │                       (arrival order)            (always)
//!   │
//!   └─ complete ── route lookup ─► transfer ─► start tracking
//!                                             (found, bike/walk, not superseded)
//! ```
//!
//! `accept` is synchronous so numbering and the tracking reset follow arrival
//! order even when completions run concurrently. Allocate-and-stop in
//! `accept` and check-and-start in `complete` run under one lock, so a
//! superseded completion can never start tracking after a newer search has
//! reset it. Two searches may still transfer at the same time; their
//! messages are not serialized.
//!
//! # Example
//!
//! ```ignore
//! use wristnav::bridge::Bridge;
//!
//! let bridge = Arc::new(Bridge::builder(sink, lookup, positions).config(&config).build());
//! let report = bridge.handle_search("1Brockhofweg 9").await?;
//! println!("request {} -> {:?}", report.message_number, report.outcome);
//! ```

mod builder;

pub use builder::BridgeBuilder;

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec::{InboundMessage, MessageNumber};
use crate::request::{normalize_address, MessageNumberAllocator, NamedAddressProvider, SearchRequest};
use crate::route::{GeoPoint, LookupError, RouteLookup, RouteType};
use crate::tracker::{PositionError, PositionSource, StepTracker, TrackerState};
use crate::transfer::{TransferOutcome, TransferSequencer, TransmissionSession};
use crate::transport::MessageSink;

/// Errors for inbound messages that cannot start a search.
///
/// No message number is allocated for these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The message has no SEARCH field, or it is empty.
    #[error("Inbound message has no search text")]
    MissingSearch,
}

/// What happened to live tracking after a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingDecision {
    /// A new position subscription feeds CURRENT updates.
    Started,
    /// Car, train and unknown routes are not tracked.
    NotTrackable,
    /// The routing backend found no route.
    RouteUnavailable,
    /// A newer search arrived while this one was in progress.
    Superseded,
    /// The position source refused the subscription.
    Failed(PositionError),
}

/// A search that has been numbered but not yet looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedSearch {
    /// Number allocated on arrival.
    pub message_number: MessageNumber,
    /// Selected travel mode.
    pub route_type: RouteType,
    /// Address after named-address substitution.
    pub address: String,
}

/// Result of one search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    /// Number allocated on arrival.
    pub message_number: MessageNumber,
    /// Selected travel mode.
    pub route_type: RouteType,
    /// Address sent to the routing backend.
    pub address: String,
    /// How the transfer ended.
    pub outcome: TransferOutcome,
    /// Whether tracking was started.
    pub tracking: TrackingDecision,
}

/// Companion bridge between the watch and the routing backend.
pub struct Bridge {
    allocator: MessageNumberAllocator,
    sequencer: TransferSequencer,
    tracker: StepTracker,
    lookup: Arc<dyn RouteLookup>,
    addresses: Arc<dyn NamedAddressProvider>,
    /// Serializes numbering and tracking transitions.
    transition: Mutex<()>,
}

impl Bridge {
    /// Start building a bridge from its required collaborators.
    pub fn builder(
        sink: Arc<dyn MessageSink>,
        lookup: Arc<dyn RouteLookup>,
        source: Arc<dyn PositionSource>,
    ) -> BridgeBuilder {
        BridgeBuilder::new(sink, lookup, source)
    }

    /// Handle one inbound message from the watch.
    ///
    /// Only the SEARCH field starts a search; other fields are ignored.
    pub async fn handle_inbound(&self, message: &InboundMessage) -> Result<SearchReport, BridgeError> {
        let text = message.search_text().ok_or(BridgeError::MissingSearch)?;
        self.handle_search(text).await
    }

    /// Handle a raw SEARCH value such as `"1Brockhofweg 9"`.
    pub async fn handle_search(&self, search: &str) -> Result<SearchReport, BridgeError> {
        let accepted = self.accept(search)?;
        Ok(self.complete(accepted).await)
    }

    /// Number a search and reset tracking.
    ///
    /// Runs synchronously so that numbers reflect arrival order. Tracking is
    /// stopped unconditionally, whether or not the new route will be tracked.
    pub fn accept(&self, search: &str) -> Result<AcceptedSearch, BridgeError> {
        let request = SearchRequest::parse(search).map_err(|_| BridgeError::MissingSearch)?;

        let message_number = {
            let _transition = self.transition.lock();
            let message_number = self.allocator.allocate();
            self.tracker.stop();
            message_number
        };
        info!(
            message_number,
            route_type = %request.route_type,
            "Search request accepted"
        );

        let address = normalize_address(&request.address, self.addresses.as_ref());

        Ok(AcceptedSearch {
            message_number,
            route_type: request.route_type,
            address,
        })
    }

    /// Look up the route, transfer it and start tracking if appropriate.
    ///
    /// Never fails: every error ends in a status message, a log line or a
    /// [`TrackingDecision`].
    pub async fn complete(&self, accepted: AcceptedSearch) -> SearchReport {
        let AcceptedSearch {
            message_number,
            route_type,
            address,
        } = accepted;

        debug!(message_number, address = %address, "Looking up route");

        let (session, route) = match self.lookup.lookup_route(route_type, &address).await {
            Ok(route) => {
                debug!(
                    message_number,
                    distance = route.distance,
                    time = route.time,
                    steps = route.step_list.len(),
                    "Route found"
                );
                (TransmissionSession::found(message_number, &route), Some(route))
            }
            Err(e) => {
                match &e {
                    LookupError::Backend(_) => warn!(message_number, error = %e, "Route lookup failed"),
                    _ => info!(message_number, error = %e, "No route found"),
                }
                (TransmissionSession::not_found(message_number), None)
            }
        };

        let outcome = self.sequencer.transmit(&session).await;

        // A found route is tracked whatever the transfer outcome.
        let tracking = match route {
            None => TrackingDecision::RouteUnavailable,
            Some(_) if !route_type.is_trackable() => TrackingDecision::NotTrackable,
            Some(route) => self.start_tracking(message_number, route.step_positions),
        };

        SearchReport {
            message_number,
            route_type,
            address,
            outcome,
            tracking,
        }
    }

    /// Serve inbound messages until `shutdown` is cancelled or the channel
    /// closes.
    ///
    /// Each accepted search completes on its own task, so a slow lookup does
    /// not hold up the next request. Tracking is stopped on exit.
    pub async fn run(
        self: Arc<Self>,
        mut inbound: mpsc::Receiver<InboundMessage>,
        shutdown: CancellationToken,
    ) {
        info!("Bridge started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    debug!("Bridge shutdown requested");
                    break;
                }

                message = inbound.recv() => {
                    let Some(message) = message else {
                        debug!("Inbound channel closed");
                        break;
                    };

                    let Some(text) = message.search_text() else {
                        debug!("Ignoring inbound message without search text");
                        continue;
                    };

                    match self.accept(text) {
                        Ok(accepted) => {
                            let bridge = Arc::clone(&self);
                            tokio::spawn(async move {
                                bridge.complete(accepted).await;
                            });
                        }
                        Err(e) => debug!(error = %e, "Ignoring inbound message"),
                    }
                }
            }
        }

        self.shutdown();
        info!("Bridge stopped");
    }

    /// Stop live tracking. Safe to call repeatedly.
    pub fn shutdown(&self) -> bool {
        self.tracker.stop()
    }

    /// Current tracking state.
    pub fn tracker_state(&self) -> TrackerState {
        self.tracker.state()
    }

    /// Last step index sent while tracking.
    pub fn current_step(&self) -> Option<u32> {
        self.tracker.current_step()
    }

    /// Number the next accepted search will receive.
    pub fn next_message_number(&self) -> MessageNumber {
        self.allocator.peek()
    }

    /// Start tracking unless a newer search has been accepted.
    fn start_tracking(
        &self,
        message_number: MessageNumber,
        step_positions: Vec<GeoPoint>,
    ) -> TrackingDecision {
        let _transition = self.transition.lock();

        if self.allocator.peek() != message_number.wrapping_add(1) {
            debug!(message_number, "Newer search arrived, not tracking this route");
            return TrackingDecision::Superseded;
        }

        match self.tracker.start(step_positions) {
            Ok(()) => TrackingDecision::Started,
            Err(e) => {
                warn!(message_number, error = %e, "Could not start current step updates");
                TrackingDecision::Failed(e)
            }
        }
    }
}
