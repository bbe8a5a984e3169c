//! Process-level error types for weatherlog.
//!
//! Library crates keep their own error enums (`WeatherError`, `StoreError`,
//! `CycleError`); this module covers bootstrap and supervision failures and
//! holds the fixed response bodies used by the query endpoint.

use thiserror::Error;

/// Top-level application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to bind query endpoint on {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("{task} task terminated unexpectedly: {reason}")]
    TaskTerminated { task: &'static str, reason: String },
}

impl AppError {
    pub fn task_terminated(task: &'static str, reason: impl Into<String>) -> Self {
        Self::TaskTerminated {
            task,
            reason: reason.into(),
        }
    }
}

/// Generic body returned for any internal failure on the query path.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Body returned when no reading exists for the requested place.
pub const NO_DATA_MESSAGE: &str = "No data for this place";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}
