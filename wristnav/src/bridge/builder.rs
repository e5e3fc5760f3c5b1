//! Builder for [`Bridge`].

use std::sync::Arc;

use parking_lot::Mutex;

use crate::codec::MessageNumber;
use crate::config::BridgeConfig;
use crate::matching::NearestWaypointMatcher;
use crate::request::{MessageNumberAllocator, NamedAddress, NamedAddressProvider};
use crate::route::RouteLookup;
use crate::tracker::{PositionSource, StepMatcher, StepTracker, WatchOptions};
use crate::transfer::TransferSequencer;
use crate::transport::MessageSink;

use super::Bridge;

/// Assembles a [`Bridge`] from its collaborators.
///
/// The sink, routing backend and position source are required. Everything
/// else has a default: the [`NearestWaypointMatcher`], no named addresses,
/// default watch options and message numbers starting at 0.
pub struct BridgeBuilder {
    sink: Arc<dyn MessageSink>,
    lookup: Arc<dyn RouteLookup>,
    source: Arc<dyn PositionSource>,
    matcher: Option<Arc<dyn StepMatcher>>,
    addresses: Arc<dyn NamedAddressProvider>,
    options: WatchOptions,
    first_message_number: MessageNumber,
}

impl BridgeBuilder {
    pub(super) fn new(
        sink: Arc<dyn MessageSink>,
        lookup: Arc<dyn RouteLookup>,
        source: Arc<dyn PositionSource>,
    ) -> Self {
        Self {
            sink,
            lookup,
            source,
            matcher: None,
            addresses: Arc::new(Vec::<NamedAddress>::new()),
            options: WatchOptions::default(),
            first_message_number: 0,
        }
    }

    /// Use a custom step matcher.
    pub fn matcher(mut self, matcher: Arc<dyn StepMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Use a named address provider.
    pub fn named_addresses(mut self, addresses: Arc<dyn NamedAddressProvider>) -> Self {
        self.addresses = addresses;
        self
    }

    /// Options for position subscriptions.
    pub fn watch_options(mut self, options: WatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Take named addresses and watch options from a loaded configuration.
    pub fn config(self, config: &BridgeConfig) -> Self {
        let options = config.tracking.watch_options();
        self.named_addresses(Arc::new(config.clone()))
            .watch_options(options)
    }

    /// First message number to hand out.
    pub fn first_message_number(mut self, first: MessageNumber) -> Self {
        self.first_message_number = first;
        self
    }

    /// Build the bridge. Tracking starts out stopped.
    pub fn build(self) -> Bridge {
        let matcher: Arc<dyn StepMatcher> = match self.matcher {
            Some(matcher) => matcher,
            None => Arc::new(NearestWaypointMatcher::new()),
        };

        Bridge {
            allocator: MessageNumberAllocator::starting_at(self.first_message_number),
            sequencer: TransferSequencer::new(Arc::clone(&self.sink)),
            tracker: StepTracker::new(self.source, matcher, self.sink, self.options),
            lookup: self.lookup,
            addresses: self.addresses,
            transition: Mutex::new(()),
        }
    }
}
