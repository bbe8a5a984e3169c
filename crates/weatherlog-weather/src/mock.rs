//! Fixed-data doubles for the weather collaborators.
//!
//! Used by the ingestion and supervisor tests in place of the Open-Meteo
//! clients. Each double counts its calls so tests can assert which stages ran.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::contract::{CoordinateResolver, ObservationProvider};
use crate::types::{Coordinates, Observation, WeatherError};

/// Resolver that answers every place with the same result
#[derive(Debug)]
pub struct StaticResolver {
    result: Result<Coordinates, WeatherError>,
    calls: AtomicUsize,
}

impl StaticResolver {
    pub fn new(coords: Coordinates) -> Self {
        Self {
            result: Ok(coords),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: Err(WeatherError::resolution_failed("geocoding service unreachable")),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CoordinateResolver for StaticResolver {
    async fn resolve(&self, _place: &str) -> Result<Coordinates, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Provider that answers every coordinate pair with the same result,
/// optionally after a delay
#[derive(Debug)]
pub struct StaticProvider {
    result: Result<Observation, WeatherError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new(observation: Observation) -> Self {
        Self {
            result: Ok(observation),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: WeatherError) -> Self {
        Self {
            result: Err(error),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObservationProvider for StaticProvider {
    async fn current_temperature(
        &self,
        _coords: Coordinates,
    ) -> Result<Observation, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[tokio::test]
    async fn test_static_resolver_counts_calls() {
        let resolver = StaticResolver::new(Coordinates::new(55.75, 37.62));
        assert_eq!(resolver.resolve("Moscow").await.unwrap().latitude, 55.75);
        assert_eq!(resolver.resolve("Anywhere").await.unwrap().longitude, 37.62);
        assert_eq!(resolver.calls(), 2);
    }

    #[tokio::test]
    async fn test_failing_doubles() {
        assert!(StaticResolver::failing().resolve("Moscow").await.is_err());

        let provider = StaticProvider::failing(WeatherError::malformed("no time"));
        let result = provider.current_temperature(Coordinates::new(0.0, 0.0)).await;
        assert!(matches!(result, Err(WeatherError::MalformedResponse(_))));
        assert_eq!(provider.calls(), 1);
    }
}
