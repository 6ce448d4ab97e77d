use super::super::domain::AutomationConfig;
use crate::workflows::weather::WeatherObservation;

/// Rolling aggregates over a trigger window. Readings the provider never
/// supplied are dropped before aggregation, so an all-null metric stays
/// `None` and can never breach.
pub(crate) struct WeatherAggregates {
    pub samples: usize,
    pub rainfall_avg: Option<f64>,
    pub temperature_max: Option<f64>,
}

impl WeatherAggregates {
    pub(crate) fn over(observations: &[WeatherObservation]) -> Self {
        let rainfall: Vec<f64> = observations
            .iter()
            .filter_map(|obs| obs.rainfall_mm)
            .collect();
        let rainfall_avg = if rainfall.is_empty() {
            None
        } else {
            Some(rainfall.iter().sum::<f64>() / rainfall.len() as f64)
        };

        let temperature_max = observations
            .iter()
            .filter_map(|obs| obs.temperature_c)
            .fold(None, |peak: Option<f64>, temp| {
                Some(peak.map_or(temp, |p| p.max(temp)))
            });

        Self {
            samples: observations.len(),
            rainfall_avg,
            temperature_max,
        }
    }
}

/// A single threshold crossing, carrying the measured value and the limit.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ThresholdBreach {
    LowRainfall { average: f64, minimum: f64 },
    HighTemperature { peak: f64, maximum: f64 },
}

impl ThresholdBreach {
    fn describe(&self, window_days: u16) -> String {
        match self {
            ThresholdBreach::LowRainfall { average, minimum } => format!(
                "{window_days}-day average rainfall {average:.1}mm below the {minimum:.1}mm threshold"
            ),
            ThresholdBreach::HighTemperature { peak, maximum } => format!(
                "peak temperature {peak:.1}C above the {maximum:.1}C threshold over {window_days} days"
            ),
        }
    }
}

/// Compare aggregates against a product's thresholds. OR semantics: every
/// crossed threshold is reported, any single one is enough to trigger.
pub(crate) fn assess(
    config: &AutomationConfig,
    aggregates: &WeatherAggregates,
) -> Vec<ThresholdBreach> {
    let mut breaches = Vec::new();

    if let Some(average) = aggregates.rainfall_avg {
        if average < config.min_rainfall_7day_avg {
            breaches.push(ThresholdBreach::LowRainfall {
                average,
                minimum: config.min_rainfall_7day_avg,
            });
        }
    }

    if let Some(peak) = aggregates.temperature_max {
        if peak > config.max_temperature {
            breaches.push(ThresholdBreach::HighTemperature {
                peak,
                maximum: config.max_temperature,
            });
        }
    }

    breaches
}

pub(crate) fn breach_reason(breaches: &[ThresholdBreach], window_days: u16) -> String {
    breaches
        .iter()
        .map(|breach| breach.describe(window_days))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Payout for a breach: the configured fraction of the cover, never more
/// than the cover itself.
pub(crate) fn claim_amount(coverage_amount: f64, trigger_percentage: f64) -> f64 {
    (coverage_amount * trigger_percentage).min(coverage_amount)
}
