//! Timer-driven ingestion of temperature readings.

pub mod error;
pub mod orchestrator;
pub mod timestamp;

pub use error::{CycleError, CycleStage};
pub use orchestrator::{CycleOutcome, Orchestrator};
pub use timestamp::{normalize, TimestampError, OBSERVATION_TIME_FORMAT};
