use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::automation::{AutomationEngine, AutomationResult};
use super::domain::{
    Claim, ClaimId, ClaimStatus, FarmProfile, PolicyId, PolicyProduct, ProductId, ReviewerContext,
    UserPolicy,
};
use super::lifecycle::{self, ClaimTransitionError, TransitionRequest};
use super::repository::{ClaimQuery, ClaimRepository, PolicyRepository, RepositoryError};
use crate::workflows::weather::{WeatherStore, WeatherStoreError};

/// Service composing the policy catalog, claim store, weather history, and
/// trigger engine.
pub struct ClaimsService<R, W> {
    repository: Arc<R>,
    weather: Arc<W>,
    engine: AutomationEngine,
}

static CLAIM_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_claim_id() -> ClaimId {
    let id = CLAIM_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ClaimId(format!("clm-{id:06}"))
}

struct PassAbort {
    claims_created: u32,
    source: ClaimServiceError,
}

impl<R, W> ClaimsService<R, W>
where
    R: PolicyRepository + ClaimRepository + 'static,
    W: WeatherStore + 'static,
{
    pub fn new(repository: Arc<R>, weather: Arc<W>, engine: AutomationEngine) -> Self {
        Self {
            repository,
            weather,
            engine,
        }
    }

    pub fn engine(&self) -> &AutomationEngine {
        &self.engine
    }

    /// Run one automation pass over every eligible policy. Failures never
    /// escape as errors: the report carries `success = false` along with
    /// however many claims committed before the pass stopped, and those
    /// claims stand.
    pub fn run_automation(&self, now: DateTime<Utc>) -> AutomationResult {
        match self.evaluate_pass(now) {
            Ok(claims_created) => {
                info!(claims_created, "automation pass completed");
                AutomationResult {
                    success: true,
                    claims_created,
                    timestamp: now,
                }
            }
            Err(PassAbort {
                claims_created,
                source,
            }) => {
                warn!(error = %source, claims_created, "automation pass aborted");
                AutomationResult {
                    success: false,
                    claims_created,
                    timestamp: now,
                }
            }
        }
    }

    fn evaluate_pass(&self, now: DateTime<Utc>) -> Result<u32, PassAbort> {
        let as_of = now.date_naive();
        let since = now - self.engine.window().duration();

        let policies = self.repository.policies().map_err(|source| PassAbort {
            claims_created: 0,
            source: ClaimServiceError::Repository(source),
        })?;

        let mut claims_created = 0u32;
        for policy in policies {
            let product = match self.repository.product(&policy.product_id) {
                Ok(Some(product)) => product,
                Ok(None) => continue,
                Err(source) => {
                    return Err(PassAbort {
                        claims_created,
                        source: ClaimServiceError::Repository(source),
                    })
                }
            };

            if !AutomationEngine::policy_eligible(&policy, &product, as_of) {
                continue;
            }

            let observations = match self.weather.for_farm_between(&policy.farm_id, since, now) {
                Ok(observations) => observations,
                Err(source) => {
                    return Err(PassAbort {
                        claims_created,
                        source: ClaimServiceError::Weather(source),
                    })
                }
            };

            let Some(decision) = self.engine.decide(&policy, &product, &observations) else {
                continue;
            };

            let claim = Claim {
                id: next_claim_id(),
                policy_id: policy.id.clone(),
                triggered_at: now,
                reason: decision.reason,
                amount_claimed: decision.amount_claimed,
                status: ClaimStatus::Pending,
                reviewed_by: None,
                rejection_reason: None,
                payout_reference_id: None,
            };

            match self.repository.create_triggered(claim) {
                Ok(created) => {
                    claims_created += 1;
                    info!(
                        claim = %created.id.0,
                        policy = %policy.id.0,
                        amount = created.amount_claimed,
                        "weather thresholds breached, claim raised"
                    );
                }
                // Another pass claimed this policy between the eligibility
                // read and the insert; skip it.
                Err(RepositoryError::Conflict) => continue,
                Err(source) => {
                    return Err(PassAbort {
                        claims_created,
                        source: ClaimServiceError::Repository(source),
                    })
                }
            }
        }

        Ok(claims_created)
    }

    /// Advance a claim through the review lifecycle. The prior status read
    /// here is re-validated by the repository inside its critical section;
    /// a lost race surfaces as `ConcurrencyConflict` and the caller retries
    /// from fresh state.
    pub fn transition(
        &self,
        ctx: &ReviewerContext,
        claim_id: &ClaimId,
        request: &TransitionRequest,
        now: DateTime<Utc>,
    ) -> Result<Claim, ClaimServiceError> {
        let claim = self
            .repository
            .claim(claim_id)
            .map_err(ClaimServiceError::Repository)?
            .ok_or(ClaimServiceError::NotFound)?;

        let update = lifecycle::plan_transition(&claim, ctx, request, now)?;

        match self.repository.apply_transition(claim_id, claim.status, update) {
            Ok(updated) => Ok(updated),
            Err(RepositoryError::Conflict) => Err(ClaimServiceError::ConcurrencyConflict),
            Err(RepositoryError::NotFound) => Err(ClaimServiceError::NotFound),
            Err(source) => Err(ClaimServiceError::Repository(source)),
        }
    }

    pub fn claim(&self, id: &ClaimId) -> Result<Claim, ClaimServiceError> {
        self.repository
            .claim(id)
            .map_err(ClaimServiceError::Repository)?
            .ok_or(ClaimServiceError::NotFound)
    }

    pub fn claims(&self, query: &ClaimQuery) -> Result<Vec<Claim>, ClaimServiceError> {
        self.repository
            .claims(query)
            .map_err(ClaimServiceError::Repository)
    }

    pub fn farms(&self) -> Result<Vec<FarmProfile>, ClaimServiceError> {
        self.repository
            .farms()
            .map_err(ClaimServiceError::Repository)
    }

    pub fn policies(&self) -> Result<Vec<UserPolicy>, ClaimServiceError> {
        self.repository
            .policies()
            .map_err(ClaimServiceError::Repository)
    }

    pub fn policy(&self, id: &PolicyId) -> Result<UserPolicy, ClaimServiceError> {
        self.repository
            .policy(id)
            .map_err(ClaimServiceError::Repository)?
            .ok_or(ClaimServiceError::NotFound)
    }

    pub fn products(&self) -> Result<Vec<PolicyProduct>, ClaimServiceError> {
        self.repository
            .products()
            .map_err(ClaimServiceError::Repository)
    }

    /// Catalog mutations are restricted to insurer/admin users.
    pub fn upsert_product(
        &self,
        ctx: &ReviewerContext,
        product: PolicyProduct,
    ) -> Result<(), ClaimServiceError> {
        if !ctx.role.can_review() {
            return Err(ClaimServiceError::CatalogAccessDenied(ctx.role.label()));
        }
        self.repository
            .upsert_product(product)
            .map_err(ClaimServiceError::Repository)
    }

    pub fn remove_product(
        &self,
        ctx: &ReviewerContext,
        id: &ProductId,
    ) -> Result<(), ClaimServiceError> {
        if !ctx.role.can_review() {
            return Err(ClaimServiceError::CatalogAccessDenied(ctx.role.label()));
        }
        self.repository
            .remove_product(id)
            .map_err(ClaimServiceError::Repository)
    }
}

/// Error raised by the claims service.
#[derive(Debug, thiserror::Error)]
pub enum ClaimServiceError {
    #[error("claim not found")]
    NotFound,
    #[error(transparent)]
    Transition(#[from] ClaimTransitionError),
    #[error("claim changed while the transition was in flight; re-read and retry")]
    ConcurrencyConflict,
    #[error("{0} role may not manage the policy catalog")]
    CatalogAccessDenied(&'static str),
    #[error(transparent)]
    Repository(RepositoryError),
    #[error(transparent)]
    Weather(WeatherStoreError),
}
