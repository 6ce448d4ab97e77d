use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use agri_claims::config::AppConfig;
use agri_claims::workflows::claims::{
    AutomationConfig, AutomationEngine, Claim, ClaimId, ClaimQuery, ClaimRepository, ClaimStatus,
    ClaimUpdate, FarmId, FarmProfile, PaymentStatus, PolicyClaimStatus, PolicyId, PolicyProduct,
    PolicyRepository, ProductId, RepositoryError, TriggerWindow, UserPolicy,
};
use agri_claims::workflows::weather::{
    WeatherObservation, WeatherStore, WeatherStoreError,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct InsuranceState {
    products: HashMap<ProductId, PolicyProduct>,
    policies: HashMap<PolicyId, UserPolicy>,
    claims: Vec<Claim>,
    farms: Vec<FarmProfile>,
}

/// One mutex guards the catalog, policies, and claims together so the two
/// cross-table writes (claim insert + policy mirror, transition CAS +
/// policy mirror) stay atomic.
#[derive(Default, Clone)]
pub(crate) struct InMemoryInsuranceRepository {
    state: Arc<Mutex<InsuranceState>>,
}

impl InMemoryInsuranceRepository {
    pub(crate) fn seed_farm(&self, farm: FarmProfile) {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        state.farms.push(farm);
    }

    pub(crate) fn seed_product(&self, product: PolicyProduct) {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        state.products.insert(product.id.clone(), product);
    }

    pub(crate) fn seed_policy(&self, policy: UserPolicy) {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        state.policies.insert(policy.id.clone(), policy);
    }
}

impl PolicyRepository for InMemoryInsuranceRepository {
    fn products(&self) -> Result<Vec<PolicyProduct>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.products.values().cloned().collect())
    }

    fn product(&self, id: &ProductId) -> Result<Option<PolicyProduct>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.products.get(id).cloned())
    }

    fn upsert_product(&self, product: PolicyProduct) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        state.products.insert(product.id.clone(), product);
        Ok(())
    }

    fn remove_product(&self, id: &ProductId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        state
            .products
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn farms(&self) -> Result<Vec<FarmProfile>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.farms.clone())
    }

    fn policies(&self) -> Result<Vec<UserPolicy>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        let mut policies: Vec<UserPolicy> = state.policies.values().cloned().collect();
        policies.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(policies)
    }

    fn policy(&self, id: &PolicyId) -> Result<Option<UserPolicy>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.policies.get(id).cloned())
    }
}

impl ClaimRepository for InMemoryInsuranceRepository {
    fn create_triggered(&self, claim: Claim) -> Result<Claim, RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        let policy = state
            .policies
            .get_mut(&claim.policy_id)
            .ok_or(RepositoryError::NotFound)?;
        if policy.claim_status.in_flight() {
            return Err(RepositoryError::Conflict);
        }
        policy.claim_status = PolicyClaimStatus::Pending;
        state.claims.push(claim.clone());
        Ok(claim)
    }

    fn claim(&self, id: &ClaimId) -> Result<Option<Claim>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.claims.iter().find(|claim| claim.id == *id).cloned())
    }

    fn claims(&self, query: &ClaimQuery) -> Result<Vec<Claim>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        let mut matched: Vec<Claim> = state
            .claims
            .iter()
            .filter(|claim| {
                query
                    .policy_id
                    .as_ref()
                    .map_or(true, |policy| claim.policy_id == *policy)
                    && query.status.map_or(true, |status| claim.status == status)
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.triggered_at.cmp(&a.triggered_at));
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    fn apply_transition(
        &self,
        id: &ClaimId,
        expected: ClaimStatus,
        update: ClaimUpdate,
    ) -> Result<Claim, RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        let position = state
            .claims
            .iter()
            .position(|claim| claim.id == *id)
            .ok_or(RepositoryError::NotFound)?;

        if state.claims[position].status != expected {
            return Err(RepositoryError::Conflict);
        }

        update.apply_to(&mut state.claims[position]);
        let updated = state.claims[position].clone();

        if let Some(policy) = state.policies.get_mut(&updated.policy_id) {
            policy.claim_status = updated.status.policy_status();
        }

        Ok(updated)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryWeatherStore {
    rows: Arc<Mutex<Vec<WeatherObservation>>>,
}

impl WeatherStore for InMemoryWeatherStore {
    fn append_batch(
        &self,
        observations: Vec<WeatherObservation>,
    ) -> Result<usize, WeatherStoreError> {
        let mut rows = self.rows.lock().expect("weather mutex poisoned");
        let count = observations.len();
        rows.extend(observations);
        Ok(count)
    }

    fn for_farm_between(
        &self,
        farm_id: &FarmId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<WeatherObservation>, WeatherStoreError> {
        let rows = self.rows.lock().expect("weather mutex poisoned");
        Ok(rows
            .iter()
            .filter(|obs| {
                obs.farm_id == *farm_id && obs.timestamp >= from && obs.timestamp <= until
            })
            .cloned()
            .collect())
    }

    fn recent(
        &self,
        farm_id: Option<&FarmId>,
        limit: usize,
    ) -> Result<Vec<WeatherObservation>, WeatherStoreError> {
        let rows = self.rows.lock().expect("weather mutex poisoned");
        let mut matched: Vec<WeatherObservation> = rows
            .iter()
            .filter(|obs| farm_id.map_or(true, |farm| obs.farm_id == *farm))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matched.truncate(limit);
        Ok(matched)
    }
}

pub(crate) fn engine_from_config(config: &AppConfig) -> AutomationEngine {
    AutomationEngine::new(TriggerWindow {
        days: config.automation.trigger_window_days,
    })
}

/// Seed a small catalog so the serve and demo paths start with data the
/// dashboard can show.
pub(crate) fn seed_reference_data(repository: &InMemoryInsuranceRepository) {
    repository.seed_farm(FarmProfile {
        id: FarmId("farm-0001".to_string()),
        farm_name: "Ganga View Paddy Fields".to_string(),
        location: Some("Hajipur".to_string()),
        district: Some("Vaishali".to_string()),
        crop_type: "Paddy".to_string(),
        season: "Kharif".to_string(),
    });
    repository.seed_farm(FarmProfile {
        id: FarmId("farm-0002".to_string()),
        farm_name: "Sone Valley Wheat Estate".to_string(),
        location: Some("Dehri".to_string()),
        district: Some("Rohtas".to_string()),
        crop_type: "Wheat".to_string(),
        season: "Rabi".to_string(),
    });

    repository.seed_product(PolicyProduct {
        id: ProductId("prod-paddy-kharif".to_string()),
        name: "Kharif Paddy Shield".to_string(),
        crop_type: "Paddy".to_string(),
        season: "Kharif".to_string(),
        base_premium: 2_500.0,
        coverage_amount: 100_000.0,
        duration_months: 6,
        automation_config: Some(AutomationConfig {
            enabled: true,
            min_rainfall_7day_avg: 10.0,
            max_temperature: 42.0,
            trigger_percentage: 0.25,
        }),
    });
    repository.seed_product(PolicyProduct {
        id: ProductId("prod-wheat-rabi".to_string()),
        name: "Rabi Wheat Cover".to_string(),
        crop_type: "Wheat".to_string(),
        season: "Rabi".to_string(),
        base_premium: 1_800.0,
        coverage_amount: 75_000.0,
        duration_months: 5,
        automation_config: None,
    });

    repository.seed_policy(UserPolicy {
        id: PolicyId("pol-0001".to_string()),
        user_id: "farmer-0001".to_string(),
        farm_id: FarmId("farm-0001".to_string()),
        product_id: ProductId("prod-paddy-kharif".to_string()),
        premium_amount: 2_500.0,
        coverage_amount: 100_000.0,
        purchase_date: seed_date(2025, 6, 1),
        start_date: seed_date(2025, 6, 1),
        end_date: seed_date(2025, 12, 1),
        payment_status: PaymentStatus::Paid,
        claim_status: PolicyClaimStatus::None,
    });
    repository.seed_policy(UserPolicy {
        id: PolicyId("pol-0002".to_string()),
        user_id: "farmer-0002".to_string(),
        farm_id: FarmId("farm-0002".to_string()),
        product_id: ProductId("prod-wheat-rabi".to_string()),
        premium_amount: 1_800.0,
        coverage_amount: 75_000.0,
        purchase_date: seed_date(2025, 6, 15),
        start_date: seed_date(2025, 7, 1),
        end_date: seed_date(2025, 12, 1),
        payment_status: PaymentStatus::Paid,
        claim_status: PolicyClaimStatus::None,
    });
}

fn seed_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid seed date")
}

pub(crate) fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(|date| {
            Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight exists"))
        })
        .map_err(|err| format!("failed to parse '{raw}' as RFC3339 or YYYY-MM-DD ({err})"))
}
