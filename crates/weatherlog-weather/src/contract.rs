//! Capabilities the ingestion cycle consumes.
//!
//! The real implementations live in [`crate::geocode`] and
//! [`crate::provider`]; fixed-data doubles live in [`crate::mock`].

use async_trait::async_trait;

use crate::types::{Coordinates, Observation, WeatherError};

/// Maps a place name to coordinates.
#[async_trait]
pub trait CoordinateResolver: Send + Sync {
    /// # Errors
    /// Returns `WeatherError::ResolutionFailed` when the service is
    /// unreachable, answers with a non-success status, or has no match.
    async fn resolve(&self, place: &str) -> Result<Coordinates, WeatherError>;
}

/// Maps coordinates to the current temperature observation.
#[async_trait]
pub trait ObservationProvider: Send + Sync {
    /// # Errors
    /// Returns `WeatherError::ProviderUnavailable` on network, status or
    /// decode failures and `WeatherError::MalformedResponse` when required
    /// fields are missing.
    async fn current_temperature(&self, coords: Coordinates)
        -> Result<Observation, WeatherError>;
}
