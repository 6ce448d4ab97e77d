use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::domain::WeatherDataInput;
use crate::workflows::claims::domain::FarmId;

/// Error raised while reading a weather export.
#[derive(Debug, thiserror::Error)]
pub enum WeatherImportError {
    #[error("failed to read weather export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid weather CSV data: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct RawObservationRow {
    farm_id: String,
    #[serde(default)]
    rainfall_mm: Option<String>,
    #[serde(default)]
    temperature_c: Option<String>,
    #[serde(default)]
    humidity: Option<String>,
}

/// Reads `farm_id,rainfall_mm,temperature_c,humidity` exports into
/// ingestion inputs. Blank or unparseable readings are treated as absent
/// rather than failing the row; station exports routinely leave gaps.
pub struct WeatherCsvImporter;

impl WeatherCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<WeatherDataInput>, WeatherImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<WeatherDataInput>, WeatherImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut inputs = Vec::new();
        for row in csv_reader.deserialize::<RawObservationRow>() {
            let row = row?;
            inputs.push(WeatherDataInput {
                farm_id: FarmId(row.farm_id),
                rainfall_mm: parse_metric(row.rainfall_mm.as_deref()),
                temperature_c: parse_metric(row.temperature_c.as_deref()),
                humidity: parse_metric(row.humidity.as_deref()),
            });
        }

        Ok(inputs)
    }
}

fn parse_metric(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse().ok())
}
