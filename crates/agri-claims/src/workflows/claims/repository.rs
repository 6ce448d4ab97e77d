use super::domain::{
    Claim, ClaimId, ClaimStatus, FarmProfile, PolicyId, PolicyProduct, ProductId, UserPolicy,
};
use super::lifecycle::ClaimUpdate;

/// Storage abstraction over the policy catalog, farm reference data, and
/// purchased policies.
pub trait PolicyRepository: Send + Sync {
    fn products(&self) -> Result<Vec<PolicyProduct>, RepositoryError>;
    fn product(&self, id: &ProductId) -> Result<Option<PolicyProduct>, RepositoryError>;
    fn upsert_product(&self, product: PolicyProduct) -> Result<(), RepositoryError>;
    fn remove_product(&self, id: &ProductId) -> Result<(), RepositoryError>;
    fn farms(&self) -> Result<Vec<FarmProfile>, RepositoryError>;
    fn policies(&self) -> Result<Vec<UserPolicy>, RepositoryError>;
    fn policy(&self, id: &PolicyId) -> Result<Option<UserPolicy>, RepositoryError>;
}

/// Storage abstraction for claims. The two mutating calls each cover a
/// claim row and its policy mirror in one atomic write.
pub trait ClaimRepository: Send + Sync {
    /// Insert a freshly triggered claim and flip the owning policy's
    /// `claim_status` to `Pending` in the same write. Implementations must
    /// refuse with `Conflict` when the policy already carries an in-flight
    /// claim, re-checked inside their critical section.
    fn create_triggered(&self, claim: Claim) -> Result<Claim, RepositoryError>;

    fn claim(&self, id: &ClaimId) -> Result<Option<Claim>, RepositoryError>;

    /// Most-recent-first listing, narrowed by the query filters.
    fn claims(&self, query: &ClaimQuery) -> Result<Vec<Claim>, RepositoryError>;

    /// Apply a validated transition. `expected` is the status the caller
    /// read; implementations re-check it inside the same critical section
    /// as the write and return `Conflict` when it no longer matches. The
    /// owning policy's `claim_status` mirror updates in the same write.
    fn apply_transition(
        &self,
        id: &ClaimId,
        expected: ClaimStatus,
        update: ClaimUpdate,
    ) -> Result<Claim, RepositoryError>;
}

/// Filters for claim listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimQuery {
    pub policy_id: Option<PolicyId>,
    pub status: Option<ClaimStatus>,
    pub limit: Option<usize>,
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("conflicting concurrent write")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
