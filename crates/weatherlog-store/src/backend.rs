//! Reading storage backend trait and error types.
//!
//! This module defines the `ReadingBackend` trait that abstracts over the
//! storage implementation, so the query path can be exercised against a
//! backend that fails on demand.

use thiserror::Error;

use crate::reading::Reading;

/// Errors that can occur during reading store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No reading has been stored for the place.
    #[error("No reading for place: {0}")]
    NotFound(String),

    /// Connectivity, constraint or query failure.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl StoreError {
    pub fn not_found(place: impl Into<String>) -> Self {
        Self::NotFound(place.into())
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(e: r2d2::Error) -> Self {
        Self::Persistence(format!("no pooled connection: {}", e))
    }
}

/// Result type for reading store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Append-only storage for readings.
///
/// Rows are never updated or deleted. Implementations are shared by the
/// ingestion writer and every query reader at once, without a lock around
/// them.
pub trait ReadingBackend: Send + Sync {
    /// Append a reading.
    ///
    /// # Errors
    /// Returns `StoreError::Persistence` on connectivity or constraint failure.
    fn insert(&self, reading: &Reading) -> StoreResult<()>;

    /// The reading with the greatest `observed_at` for `place`.
    ///
    /// Rows sharing the same `observed_at` resolve to the most recently
    /// inserted one.
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` when no row exists for the place.
    fn latest(&self, place: &str) -> StoreResult<Reading>;

    /// Number of stored readings for `place`.
    fn count(&self, place: &str) -> StoreResult<usize>;
}
