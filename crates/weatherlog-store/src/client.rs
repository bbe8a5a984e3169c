//! Shared async handle to the reading store.
//!
//! `ReadingStore` is created once by the supervisor and cloned into the
//! ingestion loop and the query service. Blocking SQLite calls run on the
//! tokio blocking pool; concurrency is left to the backend's connection pool.

use std::path::Path;
use std::sync::Arc;

use crate::backend::{ReadingBackend, StoreError, StoreResult};
use crate::reading::Reading;
use crate::sqlite::SqliteReadingStore;

#[derive(Clone)]
pub struct ReadingStore {
    backend: Arc<dyn ReadingBackend>,
}

impl ReadingStore {
    /// Wrap any backend.
    pub fn new(backend: impl ReadingBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Open a file-backed SQLite store.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self::new(SqliteReadingStore::open(path)?))
    }

    /// Create an in-memory SQLite store.
    pub fn in_memory() -> anyhow::Result<Self> {
        Ok(Self::new(SqliteReadingStore::in_memory()?))
    }

    /// Append a reading.
    pub async fn insert(&self, reading: Reading) -> StoreResult<()> {
        self.with_backend(move |backend| backend.insert(&reading)).await
    }

    /// Latest reading for `place`.
    pub async fn latest(&self, place: &str) -> StoreResult<Reading> {
        let place = place.to_string();
        self.with_backend(move |backend| backend.latest(&place)).await
    }

    pub async fn count(&self, place: &str) -> StoreResult<usize> {
        let place = place.to_string();
        self.with_backend(move |backend| backend.count(&place)).await
    }

    async fn with_backend<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(&dyn ReadingBackend) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || op(backend.as_ref()))
            .await
            .map_err(|e| StoreError::persistence(format!("store task failed: {}", e)))?
    }
}

impl std::fmt::Debug for ReadingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadingStore").finish_non_exhaustive()
    }
}
