use chrono::{DateTime, Utc};

use super::domain::WeatherObservation;
use crate::workflows::claims::domain::FarmId;

/// Append-only storage abstraction for weather history.
pub trait WeatherStore: Send + Sync {
    /// Append a batch atomically: either every row persists or none do.
    fn append_batch(
        &self,
        observations: Vec<WeatherObservation>,
    ) -> Result<usize, WeatherStoreError>;

    /// One farm's observations with `from <= timestamp <= until`.
    fn for_farm_between(
        &self,
        farm_id: &FarmId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<WeatherObservation>, WeatherStoreError>;

    /// Most-recent-first listing, optionally narrowed to one farm.
    fn recent(
        &self,
        farm_id: Option<&FarmId>,
        limit: usize,
    ) -> Result<Vec<WeatherObservation>, WeatherStoreError>;
}

/// Error enumeration for weather storage failures.
#[derive(Debug, thiserror::Error)]
pub enum WeatherStoreError {
    #[error("weather store unavailable: {0}")]
    Unavailable(String),
}
