use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::claims::automation::{AutomationEngine, TriggerWindow};
use crate::workflows::claims::domain::{
    AutomationConfig, Claim, ClaimId, ClaimStatus, FarmId, FarmProfile, PaymentStatus,
    PolicyClaimStatus, PolicyId, PolicyProduct, ProductId, ReviewerContext, ReviewerRole,
    UserPolicy,
};
use crate::workflows::claims::lifecycle::ClaimUpdate;
use crate::workflows::claims::repository::{
    ClaimQuery, ClaimRepository, PolicyRepository, RepositoryError,
};
use crate::workflows::claims::service::ClaimsService;
use crate::workflows::weather::{
    ObservationId, WeatherObservation, WeatherStore, WeatherStoreError,
};

#[derive(Default)]
struct InsuranceState {
    products: HashMap<ProductId, PolicyProduct>,
    policies: HashMap<PolicyId, UserPolicy>,
    claims: Vec<Claim>,
    farms: Vec<FarmProfile>,
}

#[derive(Default, Clone)]
pub(super) struct MemoryInsuranceRepository {
    state: Arc<Mutex<InsuranceState>>,
}

impl MemoryInsuranceRepository {
    pub(super) fn seed_product(&self, product: PolicyProduct) {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        state.products.insert(product.id.clone(), product);
    }

    pub(super) fn seed_policy(&self, policy: UserPolicy) {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        state.policies.insert(policy.id.clone(), policy);
    }

    pub(super) fn policy_claim_status(&self, id: &PolicyId) -> PolicyClaimStatus {
        let state = self.state.lock().expect("repository mutex poisoned");
        state
            .policies
            .get(id)
            .map(|policy| policy.claim_status)
            .expect("policy seeded")
    }

    pub(super) fn claims_for(&self, id: &PolicyId) -> Vec<Claim> {
        let state = self.state.lock().expect("repository mutex poisoned");
        state
            .claims
            .iter()
            .filter(|claim| claim.policy_id == *id)
            .cloned()
            .collect()
    }
}

impl PolicyRepository for MemoryInsuranceRepository {
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

impl ClaimRepository for MemoryInsuranceRepository {
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
pub(super) struct MemoryWeatherStore {
    rows: Arc<Mutex<Vec<WeatherObservation>>>,
}

impl WeatherStore for MemoryWeatherStore {
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

/// Repository double that fails every call, for upstream-outage paths.
pub(super) struct UnavailableRepository;

impl PolicyRepository for UnavailableRepository {
    fn products(&self) -> Result<Vec<PolicyProduct>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn product(&self, _id: &ProductId) -> Result<Option<PolicyProduct>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn upsert_product(&self, _product: PolicyProduct) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove_product(&self, _id: &ProductId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn farms(&self) -> Result<Vec<FarmProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn policies(&self) -> Result<Vec<UserPolicy>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn policy(&self, _id: &PolicyId) -> Result<Option<UserPolicy>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl ClaimRepository for UnavailableRepository {
    fn create_triggered(&self, _claim: Claim) -> Result<Claim, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn claim(&self, _id: &ClaimId) -> Result<Option<Claim>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn claims(&self, _query: &ClaimQuery) -> Result<Vec<Claim>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn apply_transition(
        &self,
        _id: &ClaimId,
        _expected: ClaimStatus,
        _update: ClaimUpdate,
    ) -> Result<Claim, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn pass_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 6, 0, 0)
        .single()
        .expect("valid pass time")
}

pub(super) fn automation_config(
    min_rainfall: f64,
    max_temperature: f64,
    trigger_percentage: f64,
) -> AutomationConfig {
    AutomationConfig {
        enabled: true,
        min_rainfall_7day_avg: min_rainfall,
        max_temperature,
        trigger_percentage,
    }
}

pub(super) fn product(id: &str, config: Option<AutomationConfig>) -> PolicyProduct {
    PolicyProduct {
        id: ProductId(id.to_string()),
        name: format!("{id} cover"),
        crop_type: "Paddy".to_string(),
        season: "Kharif".to_string(),
        base_premium: 2_500.0,
        coverage_amount: 100_000.0,
        duration_months: 6,
        automation_config: config,
    }
}

pub(super) fn policy(id: &str, farm: &str, product: &str) -> UserPolicy {
    UserPolicy {
        id: PolicyId(id.to_string()),
        user_id: "farmer-1".to_string(),
        farm_id: FarmId(farm.to_string()),
        product_id: ProductId(product.to_string()),
        premium_amount: 2_500.0,
        coverage_amount: 100_000.0,
        purchase_date: NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"),
        start_date: NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"),
        end_date: NaiveDate::from_ymd_opt(2025, 12, 1).expect("valid date"),
        payment_status: PaymentStatus::Paid,
        claim_status: PolicyClaimStatus::None,
    }
}

/// Seed `values` as one observation per day counting back from the pass
/// time; `None` entries model readings the provider never supplied.
pub(super) fn seed_weather(
    store: &MemoryWeatherStore,
    farm: &str,
    values: &[(Option<f64>, Option<f64>)],
) {
    let rows = values
        .iter()
        .enumerate()
        .map(|(offset, (rainfall_mm, temperature_c))| WeatherObservation {
            id: ObservationId(format!("obs-{farm}-{offset}")),
            farm_id: FarmId(farm.to_string()),
            timestamp: pass_time() - Duration::days(offset as i64),
            rainfall_mm: *rainfall_mm,
            temperature_c: *temperature_c,
            humidity: Some(60.0),
        })
        .collect();
    store.append_batch(rows).expect("seed weather");
}

pub(super) fn reviewer() -> ReviewerContext {
    ReviewerContext::new("insurer-1", ReviewerRole::Insurer)
}

pub(super) fn farmer() -> ReviewerContext {
    ReviewerContext::new("farmer-9", ReviewerRole::Farmer)
}

pub(super) fn build_service() -> (
    Arc<ClaimsService<MemoryInsuranceRepository, MemoryWeatherStore>>,
    MemoryInsuranceRepository,
    MemoryWeatherStore,
) {
    let repository = MemoryInsuranceRepository::default();
    let weather = MemoryWeatherStore::default();
    let service = Arc::new(ClaimsService::new(
        Arc::new(repository.clone()),
        Arc::new(weather.clone()),
        AutomationEngine::new(TriggerWindow::default()),
    ));
    (service, repository, weather)
}

/// Seed one enabled product + active policy whose farm has had a dry week:
/// rainfall averages 5mm against a 10mm threshold.
pub(super) fn build_drought_scenario() -> (
    Arc<ClaimsService<MemoryInsuranceRepository, MemoryWeatherStore>>,
    MemoryInsuranceRepository,
    MemoryWeatherStore,
) {
    let (service, repository, weather) = build_service();
    repository.seed_product(product("prod-1", Some(automation_config(10.0, 45.0, 0.25))));
    repository.seed_policy(policy("pol-1", "farm-1", "prod-1"));
    seed_weather(
        &weather,
        "farm-1",
        &[(Some(5.0), Some(30.0)); 7],
    );
    (service, repository, weather)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
