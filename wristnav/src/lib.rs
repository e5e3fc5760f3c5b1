//! Wristnav - route transfer and live step tracking for wearables
//!
//! This library is the phone-side companion of a navigation watch app. It
//! receives a search from the watch, asks a routing backend for a route,
//! streams the route to the watch as a sequence of small acknowledged
//! messages, and then pushes "current step" updates while the traveller
//! follows a bike or walking route.
//!
//! # Architecture
//!
//! ```text
//!                 ┌────────────────────── Bridge ──────────────────────┐
//! SEARCH ────────►│ request ──► route lookup ──► transfer ──► tracker  │
//!                 │ (number)    (RouteLookup)    (FSM)        (stream) │
//!                 └───────────────────────────────┬──────────────┬─────┘
//!                                                 ▼              ▼
//!                                          MessageSink ◄── CURRENT updates
//! ```
//!
//! - [`codec`]: status codes, icon characters and message fields
//! - [`transfer`]: the overview / steps / status handshake
//! - [`request`]: SEARCH parsing, named addresses and message numbers
//! - [`tracker`]: position subscription and forward-only step updates
//! - [`bridge`]: the application context tying them together

pub mod bridge;
pub mod codec;
pub mod config;
pub mod logging;
pub mod matching;
pub mod request;
pub mod route;
pub mod tracker;
pub mod transfer;
pub mod transport;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
