use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "WEATHERLOG_CONFIG";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Join all errors into one line for startup failures
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file holding the readings table
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

fn default_database_path() -> PathBuf {
    default_config_dir().join("readings.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the query endpoint listens on
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address.parse().map_err(|e| {
            ConfigError::Invalid(format!("server.bind_address {:?}: {}", self.bind_address, e))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Places polled by the ingestion loop, one independent cycle each
    #[serde(default = "default_places")]
    pub places: Vec<String>,

    /// Poll period in seconds (default: 5 minutes)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// IANA name of the zone every stored timestamp is normalized to
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_places() -> Vec<String> {
    vec!["Moscow".to_string()]
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_timezone() -> String {
    "Europe/Moscow".to_string()
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            places: default_places(),
            poll_interval_secs: default_poll_interval_secs(),
            timezone: default_timezone(),
        }
    }
}

impl IngestConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Parse the configured canonical timezone
    pub fn canonical_timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError::Invalid(format!("ingest.timezone: {}", e)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Base URL of the Open-Meteo geocoding API
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    /// Base URL of the Open-Meteo forecast API
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,

    /// Per-request timeout for both providers
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com".to_string()
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            geocoding_url: default_geocoding_url(),
            forecast_url: default_forecast_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ProvidersConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("weatherlog")
}

impl Config {
    /// Load configuration from `WEATHERLOG_CONFIG` or the default location,
    /// creating a default file if none exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::info!("No config at {}, writing defaults", config_path.display());
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.ingest.places.is_empty() {
            result.add_error("ingest.places", "At least one place must be configured");
        }
        for (i, place) in self.ingest.places.iter().enumerate() {
            if place.trim().is_empty() {
                result.add_error(format!("ingest.places[{}]", i), "Place name cannot be blank");
            }
        }

        if self.ingest.poll_interval_secs == 0 {
            result.add_error(
                "ingest.poll_interval_secs",
                "Poll interval must be greater than 0",
            );
        } else if self.ingest.poll_interval_secs > 24 * 60 * 60 {
            result.add_warning(
                "ingest.poll_interval_secs",
                "Poll interval is more than 24 hours",
            );
        }

        if let Err(e) = self.ingest.canonical_timezone() {
            result.add_error("ingest.timezone", e.to_string());
        }

        if let Err(e) = self.server.socket_addr() {
            result.add_error("server.bind_address", e.to_string());
        }

        self.validate_url(
            &self.providers.geocoding_url,
            "providers.geocoding_url",
            &mut result,
        );
        self.validate_url(
            &self.providers.forecast_url,
            "providers.forecast_url",
            &mut result,
        );

        if self.providers.request_timeout_secs == 0 {
            result.add_error(
                "providers.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the given path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| default_config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_default_poll_interval_is_five_minutes() {
        let config = Config::default();
        assert_eq!(config.ingest.poll_interval(), Duration::from_secs(300));
        assert_eq!(config.ingest.canonical_timezone().unwrap(), chrono_tz::Europe::Moscow);
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.providers.forecast_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "providers.forecast_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.providers.geocoding_url = "ftp://localhost:8080".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_empty_places() {
        let mut config = Config::default();
        config.ingest.places.clear();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "ingest.places"));
    }

    #[test]
    fn test_blank_place() {
        let mut config = Config::default();
        config.ingest.places.push("   ".to_string());
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "ingest.places[1]"));
    }

    #[test]
    fn test_unknown_timezone() {
        let mut config = Config::default();
        config.ingest.timezone = "Mars/Olympus_Mons".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "ingest.timezone"));
    }

    #[test]
    fn test_zero_interval_is_error_long_interval_is_warning() {
        let mut config = Config::default();
        config.ingest.poll_interval_secs = 0;
        assert!(!config.validate().is_valid());

        config.ingest.poll_interval_secs = 2 * 24 * 60 * 60;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "ingest.poll_interval_secs"));
    }

    #[test]
    fn test_bad_bind_address() {
        let mut config = Config::default();
        config.server.bind_address = "localhost".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "server.bind_address"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [ingest]
            places = ["Berlin", "Paris"]
            "#,
        )
        .unwrap();
        assert_eq!(config.ingest.places, vec!["Berlin", "Paris"]);
        assert_eq!(config.ingest.poll_interval_secs, 300);
        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
    }

    #[test]
    fn test_load_from_writes_defaults_then_reads_them_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = Config::load_from(&path).unwrap();
        assert!(path.exists());

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.ingest.places, created.ingest.places);
        assert_eq!(loaded.database.path, created.database.path);
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
