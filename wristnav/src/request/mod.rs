//! Inbound search request handling.
//!
//! Parses the SEARCH field, resolves named addresses and hands out message
//! numbers. Message numbers are allocated in arrival order, before the route
//! lookup starts, so a late completion from an older request can always be
//! told apart from the newest one.
//!
//! # SEARCH Format
//!
//! ```text
//! "1Brockhofweg 9"
//!  │└────────────── address text (free form)
//!  └─────────────── route type selector: 0 car, 1 bike, 2 train, 3 walk
//! ```

mod named;

pub use named::{normalize_address, NamedAddress, NamedAddressProvider};

use std::sync::atomic::{AtomicU32, Ordering};

use thiserror::Error;

use crate::codec::MessageNumber;
use crate::route::RouteType;

/// Errors raised when an inbound message cannot start a search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The message has no SEARCH field, or it is empty.
    #[error("Message carries no search text")]
    MissingSearch,
}

/// A parsed SEARCH value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Selected travel mode.
    pub route_type: RouteType,
    /// Address text as typed on the watch.
    pub address: String,
}

impl SearchRequest {
    /// Split a SEARCH value into route type and address.
    ///
    /// Unknown selectors are kept (see [`RouteType::Unknown`]); only an empty
    /// value is rejected.
    pub fn parse(search: &str) -> Result<Self, RequestError> {
        let mut chars = search.chars();
        let selector = chars.next().ok_or(RequestError::MissingSearch)?;
        Ok(Self {
            route_type: RouteType::from_selector(selector),
            address: chars.as_str().to_string(),
        })
    }
}

/// Process-wide monotonic message number source.
///
/// The first request gets 0. Safe to share between tasks.
#[derive(Debug, Default)]
pub struct MessageNumberAllocator {
    next: AtomicU32,
}

impl MessageNumberAllocator {
    /// Create an allocator starting at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an allocator starting at `first`.
    pub fn starting_at(first: MessageNumber) -> Self {
        Self {
            next: AtomicU32::new(first),
        }
    }

    /// Take the next message number.
    pub fn allocate(&self) -> MessageNumber {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// The number the next request will receive.
    pub fn peek(&self) -> MessageNumber {
        self.next.load(Ordering::SeqCst)
    }
}
