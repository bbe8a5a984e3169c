//! Forward geocoding: convert a place name to coordinates.
//! Uses the Open-Meteo geocoding API - free, no API key required.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

use crate::contract::CoordinateResolver;
use crate::types::{describe_request_error, Coordinates, WeatherError};

const USER_AGENT: &str = concat!("weatherlog/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    latitude: f64,
    longitude: f64,
}

/// Open-Meteo backed [`CoordinateResolver`]
#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    client: Client,
    base_url: String,
}

impl OpenMeteoGeocoder {
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| WeatherError::ClientSetup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CoordinateResolver for OpenMeteoGeocoder {
    #[instrument(skip(self), level = "debug")]
    async fn resolve(&self, place: &str) -> Result<Coordinates, WeatherError> {
        let url = format!(
            "{}/v1/search?name={}&count=1&language=en&format=json",
            self.base_url,
            urlencoding::encode(place)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WeatherError::resolution_failed(describe_request_error(&e)))?;

        if !response.status().is_success() {
            return Err(WeatherError::resolution_failed(format!(
                "geocoding returned status {}",
                response.status()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::resolution_failed(describe_request_error(&e)))?;

        let first = body
            .results
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::resolution_failed(format!("no match for {:?}", place)))?;

        let coords = Coordinates::new(first.latitude, first.longitude);
        tracing::debug!("Resolved {} to {}", place, coords);
        Ok(coords)
    }
}
