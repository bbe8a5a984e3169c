//! Periodic fetch-transform-persist cycle.
//!
//! Each configured place gets its own timer loop. A cycle runs
//! resolve → fetch → parse → persist in order; a failure at any stage ends
//! that cycle only and is logged. The next tick is the only retry.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use parking_lot::Mutex;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use weatherlog_store::{Reading, ReadingStore};
use weatherlog_weather::{CoordinateResolver, ObservationProvider};

use crate::error::CycleError;
use crate::timestamp;

/// Result of one call to [`Orchestrator::run_cycle`]
#[derive(Debug)]
pub enum CycleOutcome {
    /// Exactly one new reading was written
    Stored(Reading),
    /// A stage failed; nothing was written
    Skipped(CycleError),
    /// Another cycle for the same place was still running
    InFlight,
}

impl CycleOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored(_))
    }
}

type InFlightSet = Arc<Mutex<HashSet<String>>>;

/// Marks a place as busy for the lifetime of the guard.
struct InFlightGuard {
    set: InFlightSet,
    place: String,
}

impl InFlightGuard {
    fn acquire(set: &InFlightSet, place: &str) -> Option<Self> {
        if set.lock().insert(place.to_string()) {
            Some(Self {
                set: Arc::clone(set),
                place: place.to_string(),
            })
        } else {
            None
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.place);
    }
}

pub struct Orchestrator {
    resolver: Arc<dyn CoordinateResolver>,
    provider: Arc<dyn ObservationProvider>,
    store: ReadingStore,
    timezone: Tz,
    in_flight: InFlightSet,
}

impl Orchestrator {
    pub fn new(
        resolver: Arc<dyn CoordinateResolver>,
        provider: Arc<dyn ObservationProvider>,
        store: ReadingStore,
        timezone: Tz,
    ) -> Self {
        Self {
            resolver,
            provider,
            store,
            timezone,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Run one cycle for `place` unless one is already in flight.
    #[instrument(skip(self), level = "info")]
    pub async fn run_cycle(&self, place: &str) -> CycleOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, place) else {
            tracing::debug!("Cycle for {} still in flight, not starting another", place);
            return CycleOutcome::InFlight;
        };

        match self.ingest(place).await {
            Ok(reading) => {
                tracing::info!(
                    "{} updated data for {}: {} °C",
                    reading.observed_at,
                    reading.place,
                    reading.temperature_celsius
                );
                CycleOutcome::Stored(reading)
            }
            Err(e) => {
                tracing::warn!(stage = %e.stage(), "Skipping cycle for {}: {}", place, e);
                CycleOutcome::Skipped(e)
            }
        }
    }

    async fn ingest(&self, place: &str) -> Result<Reading, CycleError> {
        let coords = self
            .resolver
            .resolve(place)
            .await
            .map_err(CycleError::Resolve)?;

        let observation = self
            .provider
            .current_temperature(coords)
            .await
            .map_err(CycleError::Fetch)?;

        let observed_at = timestamp::normalize(
            &observation.observed_at,
            observation.utc_offset_seconds,
            self.timezone,
        )?;

        let reading = Reading::new(place, observed_at, observation.temperature_celsius);
        self.store.insert(reading.clone()).await?;
        Ok(reading)
    }

    /// Poll every place on its own timer until `shutdown` is cancelled.
    ///
    /// The first cycle for each place starts immediately. A tick that comes
    /// due while a cycle is running fires once that cycle finishes.
    ///
    /// # Errors
    /// Fails if no places are given, the period is zero, or a polling loop
    /// dies.
    pub async fn run(
        self: Arc<Self>,
        places: Vec<String>,
        period: Duration,
        shutdown: CancellationToken,
    ) -> anyhow::Result<()> {
        if places.is_empty() {
            anyhow::bail!("no places configured for ingestion");
        }
        if period.is_zero() {
            anyhow::bail!("poll period must be greater than zero");
        }

        let mut loops = JoinSet::new();
        for place in places {
            let this = Arc::clone(&self);
            let token = shutdown.clone();
            loops.spawn(async move { this.poll_place(place, period, token).await });
        }

        while let Some(joined) = loops.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Polling loop failed: {}", e);
                return Err(anyhow::anyhow!("polling loop failed: {}", e));
            }
        }

        tracing::info!("Ingestion stopped");
        Ok(())
    }

    async fn poll_place(&self, place: String, period: Duration, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!("Polling {} every {:?}", place, period);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.run_cycle(&place).await;
                }
            }
        }

        tracing::debug!("Stopped polling {}", place);
    }
}
