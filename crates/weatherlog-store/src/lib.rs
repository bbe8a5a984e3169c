//! Append-only reading log for weatherlog.
//!
//! Readings are written once per successful ingestion cycle and never
//! changed; the current reading for a place is derived on every query.

pub mod backend;
pub mod client;
pub mod reading;
pub mod sqlite;

pub use backend::{ReadingBackend, StoreError, StoreResult};
pub use client::ReadingStore;
pub use reading::Reading;
pub use sqlite::SqliteReadingStore;
