//! Weather-triggered claim automation: the policy catalog, threshold
//! evaluation, and the claim review lifecycle.

pub mod automation;
pub mod domain;
pub mod lifecycle;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use automation::{AutomationEngine, AutomationResult, TriggerDecision, TriggerWindow};
pub use domain::{
    AutomationConfig, Claim, ClaimId, ClaimStatus, FarmId, FarmProfile, PaymentStatus,
    PolicyClaimStatus, PolicyId, PolicyProduct, ProductId, ReviewerContext, ReviewerId,
    ReviewerRole, UserPolicy,
};
pub use lifecycle::{plan_transition, ClaimTransitionError, ClaimUpdate, TransitionRequest};
pub use repository::{ClaimQuery, ClaimRepository, PolicyRepository, RepositoryError};
pub use router::claims_router;
pub use service::{ClaimServiceError, ClaimsService};
