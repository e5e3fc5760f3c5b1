//! File-backed collaborators for local runs.
//!
//! A route fixture is either a single route, answered for any address:
//!
//! ```json
//! { "distance": 2500, "time": 540, "step_list": ["Head north"], "step_icons": "b",
//!   "step_positions": [{ "latitude": 53.5, "longitude": 10.0 }] }
//! ```
//!
//! or a map from address to route, where unknown addresses are not found:
//!
//! ```json
//! { "routes": { "Brockhofweg 9": { ... }, "1 Main St": { ... } } }
//! ```
//!
//! Position fixtures are a JSON array of `{ latitude, longitude, accuracy }`.

use std::collections::HashMap;
use std::path::Path;

use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::debug;
use wristnav::route::{LookupError, RouteLookup, RouteResult, RouteType};
use wristnav::tracker::PositionSample;

use crate::error::CliError;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RouteFixture {
    Table { routes: HashMap<String, RouteResult> },
    Single(RouteResult),
}

/// Routing backend answering from a JSON fixture.
#[derive(Debug, Clone)]
pub struct JsonRouteLookup {
    routes: HashMap<String, RouteResult>,
    fallback: Option<RouteResult>,
}

impl JsonRouteLookup {
    /// Load a fixture file.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = read(path)?;
        Self::parse(&text).map_err(|message| CliError::Fixture {
            path: path.to_path_buf(),
            message,
        })
    }

    fn parse(text: &str) -> Result<Self, String> {
        let fixture: RouteFixture = serde_json::from_str(text).map_err(|e| e.to_string())?;
        Ok(match fixture {
            RouteFixture::Table { routes } => Self {
                routes,
                fallback: None,
            },
            RouteFixture::Single(route) => Self {
                routes: HashMap::new(),
                fallback: Some(route),
            },
        })
    }
}

impl RouteLookup for JsonRouteLookup {
    fn lookup_route<'a>(
        &'a self,
        route_type: RouteType,
        address: &'a str,
    ) -> BoxFuture<'a, Result<RouteResult, LookupError>> {
        Box::pin(async move {
            debug!(route_type = %route_type, address, "Fixture lookup");
            self.routes
                .get(address)
                .or(self.fallback.as_ref())
                .cloned()
                .ok_or_else(|| LookupError::NotFound(address.to_string()))
        })
    }
}

/// Load a recorded track.
pub fn load_positions(path: &Path) -> Result<Vec<PositionSample>, CliError> {
    let text = read(path)?;
    serde_json::from_str(&text).map_err(|e| CliError::Fixture {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError::Fixture {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SINGLE: &str = r#"{
        "distance": 2500,
        "time": 540,
        "step_list": ["Head north", "Turn right"],
        "step_icons": "bc"
    }"#;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn test_single_route_answers_any_address() {
        let lookup = JsonRouteLookup::parse(SINGLE).unwrap();
        let route = block_on(lookup.lookup_route(RouteType::Walk, "anywhere")).unwrap();
        assert_eq!(route.distance, 2500);
        assert_eq!(route.step_list.len(), 2);
        assert!(route.step_positions.is_empty());
    }

    #[test]
    fn test_table_misses_are_not_found() {
        let text = format!(r#"{{ "routes": {{ "Brockhofweg 9": {} }} }}"#, SINGLE);
        let lookup = JsonRouteLookup::parse(&text).unwrap();

        assert!(block_on(lookup.lookup_route(RouteType::Bike, "Brockhofweg 9")).is_ok());
        assert_eq!(
            block_on(lookup.lookup_route(RouteType::Bike, "Elsewhere")),
            Err(LookupError::NotFound("Elsewhere".to_string()))
        );
    }

    #[test]
    fn test_invalid_fixture() {
        assert!(JsonRouteLookup::parse(r#"{ "distance": "far" }"#).is_err());
    }

    #[test]
    fn test_load_positions() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("track.json");
        std::fs::write(
            &path,
            r#"[{ "latitude": 53.5, "longitude": 10.0, "accuracy": 5.0 }]"#,
        )
        .unwrap();

        let samples = load_positions(&path).unwrap();
        assert_eq!(samples, vec![PositionSample::new(53.5, 10.0, 5.0)]);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load_positions(Path::new("/nonexistent/track.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/track.json"));
    }
}
