//! Mapping position samples onto route steps.

use thiserror::Error;

use crate::route::GeoPoint;

use super::PositionSample;

/// Errors raised while matching a sample to a step.
///
/// The tracker skips the sample on any of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    /// The sample carries unusable values.
    #[error("Invalid position sample: {0}")]
    InvalidSample(String),

    /// The route has no waypoints to match against.
    #[error("Route has no step positions")]
    NoWaypoints,

    /// Matcher-specific failure.
    #[error("Step matching failed: {0}")]
    Failed(String),
}

/// Maps a position sample to a step index.
///
/// Implementations must be pure: the result depends only on the arguments.
/// `Ok(None)` means the sample does not determine a step.
pub trait StepMatcher: Send + Sync {
    /// Find the step for `sample`, given the last known step index.
    fn match_step(
        &self,
        step_positions: &[GeoPoint],
        sample: &PositionSample,
        last_index: u32,
    ) -> Result<Option<u32>, MatchError>;
}

impl<F> StepMatcher for F
where
    F: Fn(&[GeoPoint], &PositionSample, u32) -> Result<Option<u32>, MatchError> + Send + Sync,
{
    fn match_step(
        &self,
        step_positions: &[GeoPoint],
        sample: &PositionSample,
        last_index: u32,
    ) -> Result<Option<u32>, MatchError> {
        self(step_positions, sample, last_index)
    }
}
