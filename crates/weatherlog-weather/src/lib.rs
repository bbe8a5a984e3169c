//! Remote weather collaborators for weatherlog
//!
//! Resolves place names to coordinates and fetches current temperatures via
//! the Open-Meteo APIs, behind the [`CoordinateResolver`] and
//! [`ObservationProvider`] capabilities.

pub mod contract;
pub mod geocode;
pub mod mock;
pub mod provider;
pub mod types;

pub use contract::{CoordinateResolver, ObservationProvider};
pub use geocode::OpenMeteoGeocoder;
pub use provider::OpenMeteoProvider;
pub use types::*;
