//! Latest-reading lookup behind the query endpoint.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use weatherlog_store::{Reading, ReadingStore, StoreError};

/// Response body for a found reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedReading {
    pub name: String,
    pub timestamp: DateTime<FixedOffset>,
    pub temperature: f64,
}

impl From<Reading> for RenderedReading {
    fn from(reading: Reading) -> Self {
        Self {
            name: reading.place,
            timestamp: reading.observed_at,
            temperature: reading.temperature_celsius,
        }
    }
}

#[derive(Debug)]
pub enum QueryOutcome {
    Found(RenderedReading),
    NotFound,
    /// The cause has already been logged and is not carried further
    InternalError,
}

#[derive(Debug, Clone)]
pub struct QueryService {
    store: ReadingStore,
}

impl QueryService {
    pub fn new(store: ReadingStore) -> Self {
        Self { store }
    }

    pub async fn handle(&self, place: &str) -> QueryOutcome {
        tracing::info!("Requested place: {}", place);

        if place.trim().is_empty() {
            return QueryOutcome::NotFound;
        }

        match self.store.latest(place).await {
            Ok(reading) => QueryOutcome::Found(reading.into()),
            Err(StoreError::NotFound(_)) => QueryOutcome::NotFound,
            Err(e) => {
                tracing::error!("Failed to read latest reading for {}: {}", place, e);
                QueryOutcome::InternalError
            }
        }
    }
}
