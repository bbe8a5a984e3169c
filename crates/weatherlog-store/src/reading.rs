use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One persisted temperature observation.
///
/// `observed_at` is the provider's measurement time, already normalized to
/// the canonical timezone by the ingestion cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub place: String,
    pub observed_at: DateTime<FixedOffset>,
    pub temperature_celsius: f64,
}

impl Reading {
    pub fn new(
        place: impl Into<String>,
        observed_at: DateTime<FixedOffset>,
        temperature_celsius: f64,
    ) -> Self {
        Self {
            place: place.into(),
            observed_at,
            temperature_celsius,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_reading_serialization_keeps_offset() {
        let observed_at = DateTime::parse_from_rfc3339("2024-01-01T12:00:00+03:00").unwrap();
        let reading = Reading::new("Moscow", observed_at, -5.3);

        let json = serde_json::to_string(&reading).unwrap();
        assert!(json.contains("\"2024-01-01T12:00:00+03:00\""));
        assert!(json.contains("-5.3"));
    }
}
