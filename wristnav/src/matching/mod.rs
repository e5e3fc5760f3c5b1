//! Default step matcher based on waypoint proximity.
//!
//! Each step of a route starts at a waypoint. A sample is matched to the
//! furthest waypoint at or after the current step whose great-circle
//! distance is within the sample's accuracy plus an arrival radius.
//!
//! # Design
//!
//! - Waypoints before the current step are never considered, so the result
//!   never moves backwards
//! - When several waypoints are in reach (short steps, poor fix) the
//!   furthest one wins
//! - Samples with poor accuracy make no determination

use crate::route::GeoPoint;
use crate::tracker::{MatchError, PositionSample, StepMatcher};

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Default distance from a waypoint that counts as "reached" (25 m).
pub const DEFAULT_ARRIVAL_RADIUS_M: f64 = 25.0;

/// Default worst accuracy still used for matching (100 m).
pub const DEFAULT_MAX_ACCURACY_M: f64 = 100.0;

/// Configuration for [`NearestWaypointMatcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherConfig {
    /// Distance from a waypoint that counts as reaching it.
    pub arrival_radius_m: f64,
    /// Samples less accurate than this are ignored.
    pub max_accuracy_m: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            arrival_radius_m: DEFAULT_ARRIVAL_RADIUS_M,
            max_accuracy_m: DEFAULT_MAX_ACCURACY_M,
        }
    }
}

/// Matches samples to the furthest reachable step waypoint.
#[derive(Debug, Clone, Default)]
pub struct NearestWaypointMatcher {
    config: MatcherConfig,
}

impl NearestWaypointMatcher {
    /// Create a matcher with default radii.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a matcher with custom radii.
    pub fn with_config(config: MatcherConfig) -> Self {
        Self { config }
    }
}

impl StepMatcher for NearestWaypointMatcher {
    fn match_step(
        &self,
        step_positions: &[GeoPoint],
        sample: &PositionSample,
        last_index: u32,
    ) -> Result<Option<u32>, MatchError> {
        validate_sample(sample)?;

        if step_positions.is_empty() {
            return Err(MatchError::NoWaypoints);
        }

        if sample.accuracy > self.config.max_accuracy_m {
            return Ok(None);
        }

        let here = GeoPoint::new(sample.latitude, sample.longitude);
        let reach = sample.accuracy + self.config.arrival_radius_m;

        // Step indices are u32 on the wire; waypoints past that range are unreachable.
        let furthest = (0..=u32::MAX)
            .zip(step_positions)
            .skip(last_index as usize)
            .filter(|(_, waypoint)| haversine_m(&here, waypoint) <= reach)
            .map(|(index, _)| index)
            .last();

        Ok(furthest)
    }
}

fn validate_sample(sample: &PositionSample) -> Result<(), MatchError> {
    if !sample.latitude.is_finite() || !(-90.0..=90.0).contains(&sample.latitude) {
        return Err(MatchError::InvalidSample(format!(
            "latitude {}",
            sample.latitude
        )));
    }
    if !sample.longitude.is_finite() || !(-180.0..=180.0).contains(&sample.longitude) {
        return Err(MatchError::InvalidSample(format!(
            "longitude {}",
            sample.longitude
        )));
    }
    if !sample.accuracy.is_finite() || sample.accuracy < 0.0 {
        return Err(MatchError::InvalidSample(format!(
            "accuracy {}",
            sample.accuracy
        )));
    }
    Ok(())
}

/// Great-circle distance between two points in meters.
pub fn haversine_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Waypoints ~111 m apart heading north from Hamburg.
    fn route() -> Vec<GeoPoint> {
        (0..5)
            .map(|i| GeoPoint::new(53.5 + i as f64 * 0.001, 10.0))
            .collect()
    }

    #[test]
    fn test_distance_one_millidegree_latitude() {
        let d = haversine_m(&GeoPoint::new(53.5, 10.0), &GeoPoint::new(53.501, 10.0));
        assert!((d - 111.2).abs() < 0.5, "got {}", d);
    }

    #[test]
    fn test_distance_is_symmetric_and_zero_on_self() {
        let a = GeoPoint::new(48.137, 11.575);
        let b = GeoPoint::new(52.52, 13.405);
        assert_eq!(haversine_m(&a, &a), 0.0);
        assert!((haversine_m(&a, &b) - haversine_m(&b, &a)).abs() < 1e-6);
        // Munich to Berlin is roughly 504 km
        assert!((haversine_m(&a, &b) / 1000.0 - 504.0).abs() < 5.0);
    }

    #[test]
    fn test_distance_across_antimeridian() {
        let d = haversine_m(&GeoPoint::new(0.0, 179.9995), &GeoPoint::new(0.0, -179.9995));
        assert!(d < 200.0, "got {}", d);
    }

    #[test]
    fn test_matches_nearby_waypoint() {
        let matcher = NearestWaypointMatcher::new();
        let sample = PositionSample::new(53.5021, 10.0, 5.0);
        assert_eq!(matcher.match_step(&route(), &sample, 0), Ok(Some(2)));
    }

    #[test]
    fn test_no_determination_between_waypoints() {
        let matcher = NearestWaypointMatcher::new();
        let sample = PositionSample::new(53.5005, 10.0, 5.0);
        assert_eq!(matcher.match_step(&route(), &sample, 0), Ok(None));
    }

    #[test]
    fn test_never_matches_before_last_index() {
        let matcher = NearestWaypointMatcher::new();
        let sample = PositionSample::new(53.501, 10.0, 5.0);
        assert_eq!(matcher.match_step(&route(), &sample, 3), Ok(None));
    }

    #[test]
    fn test_accuracy_widens_reach() {
        let matcher = NearestWaypointMatcher::new();
        // ~33 m from waypoint 1
        let sample = PositionSample::new(53.5013, 10.0, 40.0);
        assert_eq!(matcher.match_step(&route(), &sample, 1), Ok(Some(1)));

        let precise = PositionSample::new(53.5013, 10.0, 2.0);
        assert_eq!(matcher.match_step(&route(), &precise, 1), Ok(None));
    }

    #[test]
    fn test_poor_accuracy_is_ignored() {
        let matcher = NearestWaypointMatcher::new();
        let sample = PositionSample::new(53.502, 10.0, 500.0);
        assert_eq!(matcher.match_step(&route(), &sample, 0), Ok(None));
    }

    #[test]
    fn test_invalid_samples() {
        let matcher = NearestWaypointMatcher::new();
        let bad = [
            PositionSample::new(f64::NAN, 10.0, 5.0),
            PositionSample::new(91.0, 10.0, 5.0),
            PositionSample::new(53.5, f64::INFINITY, 5.0),
            PositionSample::new(53.5, 10.0, -1.0),
        ];
        for sample in bad {
            assert!(matches!(
                matcher.match_step(&route(), &sample, 0),
                Err(MatchError::InvalidSample(_))
            ));
        }
    }

    #[test]
    fn test_empty_route() {
        let matcher = NearestWaypointMatcher::new();
        let sample = PositionSample::new(53.5, 10.0, 5.0);
        assert_eq!(
            matcher.match_step(&[], &sample, 0),
            Err(MatchError::NoWaypoints)
        );
    }

    #[test]
    fn test_custom_config() {
        let matcher = NearestWaypointMatcher::with_config(MatcherConfig {
            arrival_radius_m: 200.0,
            max_accuracy_m: 10.0,
        });
        // Waypoints 0 to 2 are all within reach; the furthest wins
        let sample = PositionSample::new(53.501, 10.0, 5.0);
        assert_eq!(matcher.match_step(&route(), &sample, 0), Ok(Some(2)));

        let sloppy = PositionSample::new(53.501, 10.0, 20.0);
        assert_eq!(matcher.match_step(&route(), &sloppy, 0), Ok(None));
    }
}
