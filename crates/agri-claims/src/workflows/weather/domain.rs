use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::claims::domain::FarmId;

/// Identifier wrapper for stored observations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObservationId(pub String);

/// One immutable reading appended per farm per ingestion event.
///
/// Readings the provider did not supply stay `None`; aggregation drops
/// them instead of treating them as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub id: ObservationId,
    pub farm_id: FarmId,
    pub timestamp: DateTime<Utc>,
    pub rainfall_mm: Option<f64>,
    pub temperature_c: Option<f64>,
    pub humidity: Option<f64>,
}

/// Normalized ingestion payload, the same shape regardless of whether it
/// came from a provider fetch, a CSV upload, or a manual insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherDataInput {
    pub farm_id: FarmId,
    #[serde(default)]
    pub rainfall_mm: Option<f64>,
    #[serde(default)]
    pub temperature_c: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
}
