//! HTTP query endpoint for weatherlog.
//!
//! Serves the latest stored reading per place as JSON.

pub mod routes;
pub mod service;

pub use routes::routes;
pub use service::{QueryOutcome, QueryService, RenderedReading};

use std::future::Future;
use std::net::SocketAddr;

use weatherlog_core::AppError;

/// Bind the query endpoint on `addr`.
///
/// Returns the bound address (useful with port 0) and the server future,
/// which completes once `shutdown` resolves and in-flight requests finish.
///
/// # Errors
/// Returns `AppError::Bind` if the address is unavailable.
pub fn bind(
    service: QueryService,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = ()> + Send + 'static), AppError> {
    let (bound, server) = warp::serve(routes(service))
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .map_err(|e| AppError::Bind {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;

    tracing::info!("Query endpoint listening on {}", bound);
    Ok((bound, server))
}
