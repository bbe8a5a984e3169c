use serde::{Deserialize, Serialize};

/// Geographic position returned by a coordinate resolver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Current conditions as reported by an observation provider.
///
/// `observed_at` is left in the provider's native format; parsing and
/// timezone normalization belong to the ingestion cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub observed_at: String,
    /// Offset of `observed_at` from UTC, when the provider reports one
    pub utc_offset_seconds: Option<i32>,
    pub temperature_celsius: f64,
}

impl Observation {
    pub fn new(observed_at: impl Into<String>, temperature_celsius: f64) -> Self {
        Self {
            observed_at: observed_at.into(),
            utc_offset_seconds: None,
            temperature_celsius,
        }
    }

    pub fn with_utc_offset(mut self, seconds: i32) -> Self {
        self.utc_offset_seconds = Some(seconds);
        self
    }
}

/// Errors from the remote weather collaborators
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeatherError {
    #[error("Coordinate resolution failed: {0}")]
    ResolutionFailed(String),
    #[error("Observation provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),
}

impl WeatherError {
    pub fn resolution_failed(message: impl Into<String>) -> Self {
        Self::ResolutionFailed(message.into())
    }

    pub fn provider_unavailable(message: impl Into<String>) -> Self {
        Self::ProviderUnavailable(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }
}

/// Short classification of a reqwest failure for log lines
pub(crate) fn describe_request_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else if error.is_decode() {
        format!("undecodable body: {}", error)
    } else if let Some(status) = error.status() {
        format!("status {}: {}", status, error)
    } else {
        error.to_string()
    }
}
