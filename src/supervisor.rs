//! Process supervisor.
//!
//! Owns the reading store handle, injects it into the ingestion loop and the
//! query endpoint, runs both as separate tokio tasks and waits on both. Either
//! task ending before shutdown was requested is fatal to the process.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use weatherlog_core::{AppError, Config};
use weatherlog_ingest::Orchestrator;
use weatherlog_server::QueryService;
use weatherlog_store::ReadingStore;
use weatherlog_weather::{
    CoordinateResolver, ObservationProvider, OpenMeteoGeocoder, OpenMeteoProvider,
};

pub struct Supervisor {
    config: Config,
    store: ReadingStore,
    resolver: Arc<dyn CoordinateResolver>,
    provider: Arc<dyn ObservationProvider>,
}

impl Supervisor {
    /// Build the production wiring: SQLite file store and Open-Meteo clients.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let timezone = config.ingest.canonical_timezone()?;
        let store = ReadingStore::open(&config.database.path).with_context(|| {
            format!(
                "Failed to open reading store at {}",
                config.database.path.display()
            )
        })?;

        let timeout = config.providers.request_timeout();
        let resolver = OpenMeteoGeocoder::new(&config.providers.geocoding_url, timeout)?;
        let provider = OpenMeteoProvider::new(&config.providers.forecast_url, timeout)?
            .with_timezone(timezone.name());

        Ok(Self::with_parts(
            config,
            store,
            Arc::new(resolver),
            Arc::new(provider),
        ))
    }

    pub fn with_parts(
        config: Config,
        store: ReadingStore,
        resolver: Arc<dyn CoordinateResolver>,
        provider: Arc<dyn ObservationProvider>,
    ) -> Self {
        Self {
            config,
            store,
            resolver,
            provider,
        }
    }

    /// Bind the query endpoint and spawn both tasks.
    ///
    /// # Errors
    /// Fails if the configuration is invalid or the address cannot be bound;
    /// nothing is left running in that case.
    pub fn start(self, shutdown: CancellationToken) -> Result<Running, AppError> {
        let timezone = self.config.ingest.canonical_timezone()?;
        let addr = self.config.server.socket_addr()?;

        let server_shutdown = shutdown.clone();
        let (addr, server) = weatherlog_server::bind(
            QueryService::new(self.store.clone()),
            addr,
            async move { server_shutdown.cancelled().await },
        )?;
        let server = tokio::spawn(server);

        let orchestrator = Arc::new(Orchestrator::new(
            self.resolver,
            self.provider,
            self.store,
            timezone,
        ));
        let ingest = tokio::spawn(orchestrator.run(
            self.config.ingest.places.clone(),
            self.config.ingest.poll_interval(),
            shutdown.clone(),
        ));

        tracing::info!(
            "Started ingestion for {:?} and query endpoint on {}",
            self.config.ingest.places,
            addr
        );

        Ok(Running {
            addr,
            ingest,
            server,
            shutdown,
        })
    }
}

/// Both tasks, started
pub struct Running {
    addr: SocketAddr,
    ingest: JoinHandle<anyhow::Result<()>>,
    server: JoinHandle<()>,
    shutdown: CancellationToken,
}

impl Running {
    /// Address the query endpoint is bound to
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait until both tasks have finished.
    ///
    /// # Errors
    /// Returns `AppError::TaskTerminated` if either task stopped on its own;
    /// the other task is shut down first.
    pub async fn wait(self) -> Result<(), AppError> {
        let Running {
            mut ingest,
            mut server,
            shutdown,
            ..
        } = self;

        let result = tokio::select! {
            joined = &mut ingest => {
                let requested = shutdown.is_cancelled();
                shutdown.cancel();
                let ingest_result = task_result("ingestion", joined, requested);
                let server_result = task_result("query", server.await.map(Ok), true);
                ingest_result.and(server_result)
            }
            joined = &mut server => {
                let requested = shutdown.is_cancelled();
                shutdown.cancel();
                let server_result = task_result("query", joined.map(Ok), requested);
                let ingest_result = task_result("ingestion", ingest.await, true);
                server_result.and(ingest_result)
            }
        };

        if let Err(e) = &result {
            tracing::error!("{}", e);
        }
        result
    }
}

fn task_result(
    task: &'static str,
    joined: Result<anyhow::Result<()>, JoinError>,
    shutdown_requested: bool,
) -> Result<(), AppError> {
    match joined {
        Ok(Ok(())) if shutdown_requested => {
            tracing::info!("{} task stopped", task);
            Ok(())
        }
        Ok(Ok(())) => Err(AppError::task_terminated(
            task,
            "exited before shutdown was requested",
        )),
        Ok(Err(e)) => Err(AppError::task_terminated(task, format!("{:#}", e))),
        Err(e) => Err(AppError::task_terminated(task, e.to_string())),
    }
}
