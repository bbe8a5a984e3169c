//! SQLite-based reading storage implementation.
//!
//! File-backed stores run in WAL journal mode behind an `r2d2` pool, so query
//! readers proceed in parallel with each other and with the ingestion writer.

use chrono::DateTime;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;

use crate::backend::{ReadingBackend, StoreError, StoreResult};
use crate::reading::Reading;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_CONNECTIONS: u32 = 8;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS readings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        place TEXT NOT NULL CHECK (length(place) > 0),
        observed_at TEXT NOT NULL,
        observed_at_ms INTEGER NOT NULL,
        temperature_celsius REAL NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_readings_place_observed
        ON readings(place, observed_at_ms DESC);
"#;

/// SQLite-based reading storage.
pub struct SqliteReadingStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteReadingStore {
    /// Open the database at `path`, creating the file and schema if needed.
    ///
    /// Fails if the database cannot be reached, so a misconfigured store is
    /// caught at startup rather than on the first tick.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // Journal mode is stored in the file; set it once before pooling.
        {
            let conn = Connection::open(path)?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            let mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            tracing::debug!("Reading store journal mode: {}", mode);
            conn.execute_batch(SCHEMA)?;
        }

        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.busy_timeout(BUSY_TIMEOUT));
        let pool = Pool::builder()
            .max_size(MAX_CONNECTIONS)
            .min_idle(Some(1))
            .build(manager)?;

        let store = Self { pool };
        store.ping()?;
        tracing::info!(
            "Opened reading store at {} (pool of {})",
            path.display(),
            MAX_CONNECTIONS
        );
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    ///
    /// An in-memory database belongs to a single connection, so the pool
    /// holds exactly one and never recycles it.
    pub fn in_memory() -> anyhow::Result<Self> {
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(SqliteConnectionManager::memory())?;
        pool.get()?.execute_batch(SCHEMA)?;
        Ok(Self { pool })
    }

    /// Round-trip a trivial query.
    pub fn ping(&self) -> StoreResult<()> {
        self.pool
            .get()?
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Convert a database row to a Reading.
    fn row_to_reading(row: &rusqlite::Row) -> rusqlite::Result<Reading> {
        let place: String = row.get(0)?;
        let observed_at_str: String = row.get(1)?;
        let temperature_celsius: f64 = row.get(2)?;

        let observed_at = DateTime::parse_from_rfc3339(&observed_at_str)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

        Ok(Reading {
            place,
            observed_at,
            temperature_celsius,
        })
    }

    #[cfg(test)]
    fn execute_raw(&self, sql: &str) -> StoreResult<()> {
        self.pool.get()?.execute_batch(sql)?;
        Ok(())
    }
}

impl ReadingBackend for SqliteReadingStore {
    fn insert(&self, reading: &Reading) -> StoreResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO readings (place, observed_at, observed_at_ms, temperature_celsius)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                reading.place,
                reading.observed_at.to_rfc3339(),
                reading.observed_at.timestamp_millis(),
                reading.temperature_celsius,
            ],
        )?;

        tracing::debug!(
            "Stored reading #{} for {}",
            conn.last_insert_rowid(),
            reading.place
        );
        Ok(())
    }

    fn latest(&self, place: &str) -> StoreResult<Reading> {
        self.pool
            .get()?
            .query_row(
                "SELECT place, observed_at, temperature_celsius
                 FROM readings
                 WHERE place = ?1
                 ORDER BY observed_at_ms DESC, id DESC
                 LIMIT 1",
                params![place],
                Self::row_to_reading,
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found(place))
    }

    fn count(&self, place: &str) -> StoreResult<usize> {
        let count: i64 = self.pool.get()?.query_row(
            "SELECT COUNT(*) FROM readings WHERE place = ?1",
            params![place],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use chrono::FixedOffset;

    fn create_test_store() -> SqliteReadingStore {
        SqliteReadingStore::in_memory().expect("Failed to create in-memory store")
    }

    fn at(ts: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(ts).unwrap()
    }

    #[test]
    fn test_insert_and_latest() {
        let store = create_test_store();

        let reading = Reading::new("Moscow", at("2024-01-01T12:00:00+03:00"), -5.3);
        store.insert(&reading).unwrap();

        let latest = store.latest("Moscow").unwrap();
        assert_eq!(latest, reading);
        assert_eq!(latest.observed_at.offset().local_minus_utc(), 3 * 3600);
    }

    #[test]
    fn test_latest_picks_max_observed_at_not_insert_order() {
        let store = create_test_store();

        store
            .insert(&Reading::new("Moscow", at("2024-01-01T12:00:00+03:00"), -5.0))
            .unwrap();
        store
            .insert(&Reading::new("Moscow", at("2024-01-01T12:10:00+03:00"), -4.0))
            .unwrap();
        // Inserted last but observed earliest
        store
            .insert(&Reading::new("Moscow", at("2024-01-01T11:55:00+03:00"), -6.0))
            .unwrap();

        let latest = store.latest("Moscow").unwrap();
        assert_eq!(latest.temperature_celsius, -4.0);
        assert_eq!(latest.observed_at, at("2024-01-01T12:10:00+03:00"));
    }

    #[test]
    fn test_latest_compares_instants_across_offsets() {
        let store = create_test_store();

        // 10:00Z vs 12:30+03:00 (09:30Z)
        store
            .insert(&Reading::new("Moscow", at("2024-01-01T10:00:00+00:00"), 1.0))
            .unwrap();
        store
            .insert(&Reading::new("Moscow", at("2024-01-01T12:30:00+03:00"), 2.0))
            .unwrap();

        assert_eq!(store.latest("Moscow").unwrap().temperature_celsius, 1.0);
    }

    #[test]
    fn test_latest_tie_break_is_deterministic() {
        let store = create_test_store();
        let ts = at("2024-01-01T12:00:00+03:00");

        store.insert(&Reading::new("Moscow", ts, 1.0)).unwrap();
        store.insert(&Reading::new("Moscow", ts, 2.0)).unwrap();

        for _ in 0..3 {
            assert_eq!(store.latest("Moscow").unwrap().temperature_celsius, 2.0);
        }
    }

    #[test]
    fn test_latest_is_scoped_to_place() {
        let store = create_test_store();

        store
            .insert(&Reading::new("Moscow", at("2024-01-01T12:00:00+03:00"), -5.3))
            .unwrap();
        store
            .insert(&Reading::new("Sochi", at("2024-01-01T13:00:00+03:00"), 8.1))
            .unwrap();

        assert_eq!(store.latest("Moscow").unwrap().place, "Moscow");
        assert_eq!(store.latest("Sochi").unwrap().temperature_celsius, 8.1);
    }

    #[test]
    fn test_latest_unknown_place() {
        let store = create_test_store();

        let result = store.latest("Atlantis");
        assert!(matches!(result, Err(StoreError::NotFound(p)) if p == "Atlantis"));
    }

    #[test]
    fn test_empty_place_violates_constraint() {
        let store = create_test_store();

        let result = store.insert(&Reading::new("", at("2024-01-01T12:00:00+03:00"), 0.0));
        assert!(matches!(result, Err(StoreError::Persistence(_))));
        assert_eq!(store.count("").unwrap(), 0);
    }

    #[test]
    fn test_missing_table_is_persistence_error() {
        let store = create_test_store();
        store.execute_raw("DROP TABLE readings").unwrap();

        assert!(matches!(store.latest("Moscow"), Err(StoreError::Persistence(_))));
    }

    #[test]
    fn test_count() {
        let store = create_test_store();
        assert_eq!(store.count("Moscow").unwrap(), 0);

        store
            .insert(&Reading::new("Moscow", at("2024-01-01T12:00:00+03:00"), -5.3))
            .unwrap();
        store
            .insert(&Reading::new("Moscow", at("2024-01-01T12:05:00+03:00"), -5.1))
            .unwrap();
        assert_eq!(store.count("Moscow").unwrap(), 2);
    }

    #[test]
    fn test_open_file_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("readings.db");

        {
            let store = SqliteReadingStore::open(&path).unwrap();
            store
                .insert(&Reading::new("Moscow", at("2024-01-01T12:00:00+03:00"), -5.3))
                .unwrap();
        }

        let reopened = SqliteReadingStore::open(&path).unwrap();
        assert_eq!(reopened.latest("Moscow").unwrap().temperature_celsius, -5.3);
    }

    #[test]
    fn test_file_store_reads_and_writes_beside_open_read_transaction() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteReadingStore::open(dir.path().join("readings.db")).unwrap();
        store
            .insert(&Reading::new("Moscow", at("2024-01-01T12:00:00+03:00"), -5.3))
            .unwrap();

        // A slow reader parked inside a transaction on its own connection
        let held = store.pool.get().unwrap();
        held.execute_batch("BEGIN").unwrap();
        let seen: i64 = held
            .query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(seen, 1);

        store
            .insert(&Reading::new("Moscow", at("2024-01-01T12:05:00+03:00"), -5.1))
            .unwrap();
        assert_eq!(store.latest("Moscow").unwrap().temperature_celsius, -5.1);

        let still_seen: i64 = held
            .query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(still_seen, 1);
        held.execute_batch("COMMIT").unwrap();
    }

    #[test]
    fn test_file_store_uses_wal_journal() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteReadingStore::open(dir.path().join("readings.db")).unwrap();

        let mode: String = store
            .pool
            .get()
            .unwrap()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
