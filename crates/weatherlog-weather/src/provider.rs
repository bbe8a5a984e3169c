//! Current-temperature provider backed by the Open-Meteo forecast API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

use crate::contract::ObservationProvider;
use crate::types::{describe_request_error, Coordinates, Observation, WeatherError};

/// Raw forecast body. Every field is optional so that a missing value is
/// reported as a malformed response rather than a decode failure.
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    utc_offset_seconds: Option<i32>,
    current: Option<CurrentBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    time: Option<String>,
    temperature_2m: Option<f64>,
}

impl TryFrom<ForecastResponse> for Observation {
    type Error = WeatherError;

    fn try_from(body: ForecastResponse) -> Result<Self, Self::Error> {
        let current = body
            .current
            .ok_or_else(|| WeatherError::malformed("missing `current` block"))?;
        let time = current
            .time
            .ok_or_else(|| WeatherError::malformed("missing `current.time`"))?;
        let temperature = current
            .temperature_2m
            .ok_or_else(|| WeatherError::malformed("missing `current.temperature_2m`"))?;

        Ok(Observation {
            observed_at: time,
            utc_offset_seconds: body.utc_offset_seconds,
            temperature_celsius: temperature,
        })
    }
}

/// Open-Meteo backed [`ObservationProvider`]
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    client: Client,
    base_url: String,
    timezone: Option<String>,
}

impl OpenMeteoProvider {
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::ClientSetup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timezone: None,
        })
    }

    /// Ask the provider to report local times in the given IANA zone
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }
}

#[async_trait]
impl ObservationProvider for OpenMeteoProvider {
    #[instrument(skip(self), level = "debug")]
    async fn current_temperature(
        &self,
        coords: Coordinates,
    ) -> Result<Observation, WeatherError> {
        let mut url = format!(
            "{}/v1/forecast?latitude={}&longitude={}&current=temperature_2m",
            self.base_url, coords.latitude, coords.longitude
        );
        if let Some(tz) = &self.timezone {
            url.push_str(&format!("&timezone={}", urlencoding::encode(tz)));
        }

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WeatherError::provider_unavailable(describe_request_error(&e)))?;

        if !response.status().is_success() {
            return Err(WeatherError::provider_unavailable(format!(
                "forecast returned status {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| WeatherError::provider_unavailable(describe_request_error(&e)))?;

        let body: ForecastResponse = serde_json::from_str(&text)
            .map_err(|e| WeatherError::provider_unavailable(format!("undecodable body: {}", e)))?;

        Observation::try_from(body)
    }
}
