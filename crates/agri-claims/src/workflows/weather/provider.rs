use serde::Serialize;
use tracing::warn;

use super::domain::WeatherDataInput;
use crate::workflows::claims::domain::FarmProfile;

/// Normalized current-conditions reading every provider adapter produces,
/// whatever the upstream payload looks like.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderReading {
    pub temperature_c: f64,
    pub humidity: f64,
    pub rainfall_mm: f64,
}

/// Error raised by a provider adapter for a single location.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("weather provider request failed: {0}")]
    Request(String),
    #[error("weather provider timed out")]
    Timeout,
}

/// Adapter over an external conditions source. Implementations resolve the
/// location string themselves and must bound each request with a timeout so
/// one slow location cannot stall a fetch pass.
pub trait WeatherProvider: Send + Sync {
    fn current(&self, location: &str) -> Result<ProviderReading, ProviderError>;
}

/// Per-pass tally of the farm fetch loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchSummary {
    pub fetched: u32,
    pub skipped_no_location: u32,
    pub failed: u32,
}

/// Fetch current conditions for every farm, preferring the district over
/// the free-form location. One farm's failure never aborts the others;
/// failures are logged and tallied.
pub fn collect_farm_readings<P: WeatherProvider>(
    provider: &P,
    farms: &[FarmProfile],
) -> (Vec<WeatherDataInput>, FetchSummary) {
    let mut inputs = Vec::new();
    let mut summary = FetchSummary::default();

    for farm in farms {
        let Some(location) = farm.district.as_deref().or(farm.location.as_deref()) else {
            summary.skipped_no_location += 1;
            continue;
        };

        match provider.current(location) {
            Ok(reading) => {
                inputs.push(WeatherDataInput {
                    farm_id: farm.id.clone(),
                    rainfall_mm: Some(reading.rainfall_mm),
                    temperature_c: Some(reading.temperature_c),
                    humidity: Some(reading.humidity),
                });
                summary.fetched += 1;
            }
            Err(error) => {
                warn!(farm = %farm.id.0, %location, error = %error, "weather fetch failed for farm");
                summary.failed += 1;
            }
        }
    }

    (inputs, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::claims::domain::FarmId;

    struct FlakyProvider;

    impl WeatherProvider for FlakyProvider {
        fn current(&self, location: &str) -> Result<ProviderReading, ProviderError> {
            if location == "Nalanda" {
                return Err(ProviderError::Request("upstream 503".to_string()));
            }
            Ok(ProviderReading {
                temperature_c: 33.0,
                humidity: 62.0,
                rainfall_mm: 1.2,
            })
        }
    }

    fn farm(id: &str, location: Option<&str>, district: Option<&str>) -> FarmProfile {
        FarmProfile {
            id: FarmId(id.to_string()),
            farm_name: format!("{id} acres"),
            location: location.map(str::to_string),
            district: district.map(str::to_string),
            crop_type: "Paddy".to_string(),
            season: "Kharif".to_string(),
        }
    }

    #[test]
    fn one_failing_farm_does_not_abort_the_pass() {
        let farms = vec![
            farm("farm-1", Some("Patna"), None),
            farm("farm-2", None, Some("Nalanda")),
            farm("farm-3", Some("Gaya"), Some("Gaya")),
        ];

        let (inputs, summary) = collect_farm_readings(&FlakyProvider, &farms);
        assert_eq!(inputs.len(), 2);
        assert_eq!(summary.fetched, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped_no_location, 0);
    }

    #[test]
    fn farms_without_any_location_are_skipped() {
        let farms = vec![farm("farm-1", None, None)];

        let (inputs, summary) = collect_farm_readings(&FlakyProvider, &farms);
        assert!(inputs.is_empty());
        assert_eq!(summary.skipped_no_location, 1);
    }

    #[test]
    fn district_wins_over_location() {
        let farms = vec![farm("farm-1", Some("Patna"), Some("Nalanda"))];

        let (inputs, summary) = collect_farm_readings(&FlakyProvider, &farms);
        assert!(inputs.is_empty());
        assert_eq!(summary.failed, 1);
    }
}
