//! Weather ingestion: the append-only observation sink, CSV import, and
//! the external provider fetch contract.

pub mod domain;
pub mod importer;
pub mod provider;
pub mod router;
pub mod store;

pub use domain::{ObservationId, WeatherDataInput, WeatherObservation};
pub use importer::{WeatherCsvImporter, WeatherImportError};
pub use provider::{
    collect_farm_readings, FetchSummary, ProviderError, ProviderReading, WeatherProvider,
};
pub use router::weather_router;
pub use store::{WeatherStore, WeatherStoreError};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::workflows::claims::domain::FarmId;

/// Append-only sink for farm weather readings.
pub struct WeatherIngestSink<S> {
    store: Arc<S>,
}

static OBSERVATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_observation_id() -> ObservationId {
    let id = OBSERVATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ObservationId(format!("obs-{id:06}"))
}

/// Error raised by the ingestion sink.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("farm_id is required on every observation")]
    MissingFarmId,
    #[error(transparent)]
    Store(#[from] WeatherStoreError),
}

impl<S: WeatherStore> WeatherIngestSink<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Append a batch of readings stamped at `now`. An empty batch is a
    /// no-op returning 0. A batch with any blank farm id fails before
    /// anything persists; otherwise the whole batch commits atomically.
    pub fn ingest(
        &self,
        inputs: Vec<WeatherDataInput>,
        now: DateTime<Utc>,
    ) -> Result<usize, IngestError> {
        if inputs.is_empty() {
            return Ok(0);
        }

        if inputs
            .iter()
            .any(|input| input.farm_id.0.trim().is_empty())
        {
            return Err(IngestError::MissingFarmId);
        }

        let rows = inputs
            .into_iter()
            .map(|input| WeatherObservation {
                id: next_observation_id(),
                farm_id: input.farm_id,
                timestamp: now,
                rainfall_mm: input.rainfall_mm,
                temperature_c: input.temperature_c,
                humidity: input.humidity,
            })
            .collect();

        Ok(self.store.append_batch(rows)?)
    }

    /// Most-recent-first read-through for the presentation layer.
    pub fn recent(
        &self,
        farm_id: Option<&FarmId>,
        limit: usize,
    ) -> Result<Vec<WeatherObservation>, IngestError> {
        Ok(self.store.recent(farm_id, limit)?)
    }
}
