mod rules;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use super::domain::{PolicyProduct, UserPolicy};
use crate::workflows::weather::WeatherObservation;

/// Length of the trailing window aggregated before each trigger decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerWindow {
    pub days: u16,
}

impl TriggerWindow {
    pub fn duration(self) -> Duration {
        Duration::days(i64::from(self.days))
    }
}

impl Default for TriggerWindow {
    fn default() -> Self {
        Self { days: 7 }
    }
}

/// Claim request emitted when a policy's thresholds are breached.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerDecision {
    pub reason: String,
    pub amount_claimed: f64,
}

/// Outcome of one automation pass, surfaced to operators. Not persisted;
/// each run's report belongs to the caller that invoked the pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutomationResult {
    pub success: bool,
    pub claims_created: u32,
    pub timestamp: DateTime<Utc>,
}

/// Stateless evaluator applying per-product thresholds to a farm's recent
/// weather history.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutomationEngine {
    window: TriggerWindow,
}

impl AutomationEngine {
    pub fn new(window: TriggerWindow) -> Self {
        Self { window }
    }

    pub fn window(&self) -> TriggerWindow {
        self.window
    }

    /// Whether an automation pass may consider this policy at all: the
    /// product's automation is enabled, no claim is in flight, and the
    /// cover is active on the evaluation date.
    pub fn policy_eligible(policy: &UserPolicy, product: &PolicyProduct, as_of: NaiveDate) -> bool {
        product.automation_enabled()
            && !policy.claim_status.in_flight()
            && policy.start_date <= as_of
            && as_of <= policy.end_date
    }

    /// Decide whether the window's observations breach the product's
    /// thresholds. `None` when automation is off, the window holds no
    /// observations, or no threshold is crossed.
    pub fn decide(
        &self,
        policy: &UserPolicy,
        product: &PolicyProduct,
        observations: &[WeatherObservation],
    ) -> Option<TriggerDecision> {
        let config = product
            .automation_config
            .as_ref()
            .filter(|config| config.enabled)?;

        let aggregates = rules::WeatherAggregates::over(observations);
        if aggregates.samples == 0 {
            return None;
        }

        let breaches = rules::assess(config, &aggregates);
        if breaches.is_empty() {
            return None;
        }

        Some(TriggerDecision {
            reason: rules::breach_reason(&breaches, self.window.days),
            amount_claimed: rules::claim_amount(policy.coverage_amount, config.trigger_percentage),
        })
    }
}
