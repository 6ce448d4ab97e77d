use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::domain::{Claim, ClaimStatus, ReviewerContext, ReviewerId};

/// Error raised when a requested transition violates the state machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimTransitionError {
    #[error("cannot move a {from} claim to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
    #[error("a rejection reason is required to reject a claim")]
    MissingRejectionReason,
    #[error("claim review requires an insurer or admin reviewer")]
    ReviewerNotAuthorized,
}

/// A reviewer's request to advance a claim.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransitionRequest {
    pub new_status: ClaimStatus,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub payout_reference_id: Option<String>,
}

impl TransitionRequest {
    pub fn to(new_status: ClaimStatus) -> Self {
        Self {
            new_status,
            rejection_reason: None,
            payout_reference_id: None,
        }
    }

    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            new_status: ClaimStatus::Rejected,
            rejection_reason: Some(reason.into()),
            payout_reference_id: None,
        }
    }
}

/// Field updates produced by a validated transition. Only populated fields
/// overwrite the stored claim.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimUpdate {
    pub status: ClaimStatus,
    pub reviewed_by: Option<ReviewerId>,
    pub rejection_reason: Option<String>,
    pub payout_reference_id: Option<String>,
}

impl ClaimUpdate {
    pub fn apply_to(&self, claim: &mut Claim) {
        claim.status = self.status;
        if self.reviewed_by.is_some() {
            claim.reviewed_by = self.reviewed_by.clone();
        }
        if self.rejection_reason.is_some() {
            claim.rejection_reason = self.rejection_reason.clone();
        }
        if self.payout_reference_id.is_some() {
            claim.payout_reference_id = self.payout_reference_id.clone();
        }
    }
}

static PAYOUT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Opaque payout token. Uniqueness comes from the process-wide sequence;
/// the timestamp prefix is cosmetic.
fn next_payout_reference(now: DateTime<Utc>) -> String {
    let seq = PAYOUT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("PAY-{}-{seq:04}", now.timestamp_millis())
}

/// Validate a requested transition against the current claim state and
/// produce the resulting field updates. Pure: nothing is mutated here.
///
/// Allowed paths: Pending -> Approved -> Paid, and Pending -> Rejected.
pub fn plan_transition(
    claim: &Claim,
    ctx: &ReviewerContext,
    request: &TransitionRequest,
    now: DateTime<Utc>,
) -> Result<ClaimUpdate, ClaimTransitionError> {
    if !ctx.role.can_review() {
        return Err(ClaimTransitionError::ReviewerNotAuthorized);
    }

    match (claim.status, request.new_status) {
        (ClaimStatus::Pending, ClaimStatus::Approved) => Ok(ClaimUpdate {
            status: ClaimStatus::Approved,
            reviewed_by: Some(ctx.reviewer_id.clone()),
            rejection_reason: None,
            payout_reference_id: None,
        }),
        (ClaimStatus::Pending, ClaimStatus::Rejected) => {
            let reason = request
                .rejection_reason
                .as_deref()
                .map(str::trim)
                .filter(|reason| !reason.is_empty())
                .ok_or(ClaimTransitionError::MissingRejectionReason)?;

            Ok(ClaimUpdate {
                status: ClaimStatus::Rejected,
                reviewed_by: Some(ctx.reviewer_id.clone()),
                rejection_reason: Some(reason.to_string()),
                payout_reference_id: None,
            })
        }
        (ClaimStatus::Approved, ClaimStatus::Paid) => {
            let reference = request
                .payout_reference_id
                .as_deref()
                .map(str::trim)
                .filter(|reference| !reference.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| next_payout_reference(now));

            Ok(ClaimUpdate {
                status: ClaimStatus::Paid,
                reviewed_by: None,
                rejection_reason: None,
                payout_reference_id: Some(reference),
            })
        }
        (from, to) => Err(ClaimTransitionError::InvalidTransition {
            from: from.label(),
            to: to.label(),
        }),
    }
}
