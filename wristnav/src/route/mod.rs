//! Route data model and the routing backend interface.
//!
//! The routing backend turns an address into distance, duration, step
//! instructions and waypoints. Its internals live outside this crate; the
//! bridge only depends on the [`RouteLookup`] trait.
//!
//! # Example
//!
//! ```ignore
//! use wristnav::route::{RouteLookup, RouteType};
//!
//! let route = lookup.lookup_route(RouteType::Bike, "Brockhofweg 9").await?;
//! println!("{} steps over {} m", route.step_list.len(), route.distance);
//! ```

use std::fmt;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Travel mode selected on the watch.
///
/// The first character of a SEARCH value selects the mode. Unknown selectors
/// are kept as-is and handed to the routing backend, which decides what to do
/// with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteType {
    /// Selector `'0'`.
    Car,
    /// Selector `'1'`.
    Bike,
    /// Selector `'2'`.
    Train,
    /// Selector `'3'`.
    Walk,
    /// Any other selector character.
    Unknown(char),
}

impl RouteType {
    /// Map a selector character to a route type.
    pub fn from_selector(selector: char) -> Self {
        match selector {
            '0' => RouteType::Car,
            '1' => RouteType::Bike,
            '2' => RouteType::Train,
            '3' => RouteType::Walk,
            other => RouteType::Unknown(other),
        }
    }

    /// The selector character for this route type.
    pub fn selector(&self) -> char {
        match self {
            RouteType::Car => '0',
            RouteType::Bike => '1',
            RouteType::Train => '2',
            RouteType::Walk => '3',
            RouteType::Unknown(c) => *c,
        }
    }

    /// Check if live step tracking runs for this route type.
    pub fn is_trackable(&self) -> bool {
        matches!(self, RouteType::Bike | RouteType::Walk)
    }

    /// Short name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteType::Car => "car",
            RouteType::Bike => "bike",
            RouteType::Train => "train",
            RouteType::Walk => "walk",
            RouteType::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteType::Unknown(c) => write!(f, "unknown({:?})", c),
            other => f.write_str(other.as_str()),
        }
    }
}

/// A geographic waypoint in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new waypoint.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A route returned by the routing backend.
///
/// Immutable once produced. `step_icons` carries one icon character per step,
/// already padded or truncated to the watch's display width by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    /// Route distance.
    pub distance: u32,
    /// Route duration.
    pub time: u32,
    /// Step instructions in travel order.
    pub step_list: Vec<String>,
    /// Icon string, see [`crate::codec::StepIcon`].
    pub step_icons: String,
    /// Waypoints used to match live positions to steps.
    #[serde(default)]
    pub step_positions: Vec<GeoPoint>,
}

/// Errors reported by the routing backend.
///
/// Every variant ends the request with a route-not-found status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// No route exists to the address.
    #[error("No route found to '{0}'")]
    NotFound(String),

    /// The backend does not support the requested route type.
    #[error("Unsupported route type selector {0:?}")]
    UnsupportedRouteType(char),

    /// The backend failed (network, geocoding, parsing...).
    #[error("Routing backend error: {0}")]
    Backend(String),
}

/// Routing backend interface.
///
/// Uses boxed futures so the bridge can hold `Arc<dyn RouteLookup>`.
pub trait RouteLookup: Send + Sync {
    /// Compute a route to `address` for the given travel mode.
    ///
    /// Completes exactly once.
    fn lookup_route<'a>(
        &'a self,
        route_type: RouteType,
        address: &'a str,
    ) -> BoxFuture<'a, Result<RouteResult, LookupError>>;
}
