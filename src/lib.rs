//! weatherlog: periodic temperature ingestion with a latest-reading endpoint.

pub mod supervisor;

pub use supervisor::{Running, Supervisor};
