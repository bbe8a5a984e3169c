use thiserror::Error;
use weatherlog_store::StoreError;
use weatherlog_weather::WeatherError;

use crate::timestamp::TimestampError;

/// Stages of one ingestion cycle, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    Resolving,
    Fetching,
    Parsing,
    Persisting,
}

impl CycleStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolving => "resolving",
            Self::Fetching => "fetching",
            Self::Parsing => "parsing",
            Self::Persisting => "persisting",
        }
    }
}

impl std::fmt::Display for CycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a cycle ended without storing a reading. Never escalated past the cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("resolving coordinates: {0}")]
    Resolve(#[source] WeatherError),

    #[error("fetching observation: {0}")]
    Fetch(#[source] WeatherError),

    #[error("parsing observation time: {0}")]
    Timestamp(#[from] TimestampError),

    #[error("persisting reading: {0}")]
    Persist(#[from] StoreError),
}

impl CycleError {
    pub fn stage(&self) -> CycleStage {
        match self {
            Self::Resolve(_) => CycleStage::Resolving,
            Self::Fetch(_) => CycleStage::Fetching,
            Self::Timestamp(_) => CycleStage::Parsing,
            Self::Persist(_) => CycleStage::Persisting,
        }
    }
}
