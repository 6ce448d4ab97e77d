use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for catalog products.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

/// Identifier wrapper for a farmer's purchased policy instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyId(pub String);

/// Identifier wrapper for farm profiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FarmId(pub String);

/// Identifier wrapper for claims.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimId(pub String);

/// Identifier wrapper for reviewing users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewerId(pub String);

/// Per-product thresholds consumed by the trigger engine.
///
/// `trigger_percentage` is a fraction of the coverage amount (0.25 pays out
/// a quarter of the cover).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationConfig {
    pub enabled: bool,
    pub min_rainfall_7day_avg: f64,
    pub max_temperature: f64,
    pub trigger_percentage: f64,
}

/// An insurance product definition in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyProduct {
    pub id: ProductId,
    pub name: String,
    pub crop_type: String,
    pub season: String,
    pub base_premium: f64,
    pub coverage_amount: f64,
    pub duration_months: u8,
    pub automation_config: Option<AutomationConfig>,
}

impl PolicyProduct {
    /// Whether automated triggering is switched on for this product.
    pub fn automation_enabled(&self) -> bool {
        self.automation_config
            .as_ref()
            .map(|config| config.enabled)
            .unwrap_or(false)
    }
}

/// Farm reference data used to link policies to weather history and to
/// geocode provider fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmProfile {
    pub id: FarmId,
    pub farm_name: String,
    pub location: Option<String>,
    pub district: Option<String>,
    pub crop_type: String,
    pub season: String,
}

/// Premium payment state of a purchased policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Failed",
        }
    }
}

/// Claim state surfaced on the policy row, in the portal's vocabulary.
///
/// `Pending` and `ClaimInitiated` mark the policy as carrying an unresolved
/// claim; the evaluator skips such policies until the claim settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyClaimStatus {
    None,
    Pending,
    #[serde(rename = "Claim Initiated")]
    ClaimInitiated,
    #[serde(rename = "Claim Paid")]
    ClaimPaid,
    #[serde(rename = "Claim Rejected")]
    ClaimRejected,
}

impl PolicyClaimStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PolicyClaimStatus::None => "None",
            PolicyClaimStatus::Pending => "Pending",
            PolicyClaimStatus::ClaimInitiated => "Claim Initiated",
            PolicyClaimStatus::ClaimPaid => "Claim Paid",
            PolicyClaimStatus::ClaimRejected => "Claim Rejected",
        }
    }

    /// True while an unresolved claim blocks re-triggering.
    pub const fn in_flight(self) -> bool {
        matches!(
            self,
            PolicyClaimStatus::Pending | PolicyClaimStatus::ClaimInitiated
        )
    }
}

/// A farmer's purchased instance of a catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPolicy {
    pub id: PolicyId,
    pub user_id: String,
    pub farm_id: FarmId,
    pub product_id: ProductId,
    pub premium_amount: f64,
    pub coverage_amount: f64,
    pub purchase_date: NaiveDate,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub payment_status: PaymentStatus,
    pub claim_status: PolicyClaimStatus,
}

/// Review state of an individual claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl ClaimStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ClaimStatus::Pending => "Pending",
            ClaimStatus::Approved => "Approved",
            ClaimStatus::Rejected => "Rejected",
            ClaimStatus::Paid => "Paid",
        }
    }

    /// The policy-row mirror of this claim state.
    pub const fn policy_status(self) -> PolicyClaimStatus {
        match self {
            ClaimStatus::Pending => PolicyClaimStatus::Pending,
            ClaimStatus::Approved => PolicyClaimStatus::ClaimInitiated,
            ClaimStatus::Paid => PolicyClaimStatus::ClaimPaid,
            ClaimStatus::Rejected => PolicyClaimStatus::ClaimRejected,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ClaimStatus::Rejected | ClaimStatus::Paid)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(ClaimStatus::Pending),
            "approved" => Some(ClaimStatus::Approved),
            "rejected" => Some(ClaimStatus::Rejected),
            "paid" => Some(ClaimStatus::Paid),
            _ => None,
        }
    }
}

/// A claim raised against a policy by the automation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub policy_id: PolicyId,
    pub triggered_at: DateTime<Utc>,
    pub reason: String,
    pub amount_claimed: f64,
    pub status: ClaimStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<ReviewerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout_reference_id: Option<String>,
}

/// Role of the authenticated user acting on the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewerRole {
    Farmer,
    Insurer,
    Admin,
}

impl ReviewerRole {
    pub const fn label(self) -> &'static str {
        match self {
            ReviewerRole::Farmer => "farmer",
            ReviewerRole::Insurer => "insurer",
            ReviewerRole::Admin => "admin",
        }
    }

    /// Only insurer and admin users may review claims or edit the catalog.
    pub const fn can_review(self) -> bool {
        matches!(self, ReviewerRole::Insurer | ReviewerRole::Admin)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "farmer" => Some(ReviewerRole::Farmer),
            "insurer" => Some(ReviewerRole::Insurer),
            "admin" => Some(ReviewerRole::Admin),
            _ => None,
        }
    }
}

/// Request-scoped identity passed into every mutating operation. The core
/// trusts the id; authentication happens upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerContext {
    pub reviewer_id: ReviewerId,
    pub role: ReviewerRole,
}

impl ReviewerContext {
    pub fn new(reviewer_id: impl Into<String>, role: ReviewerRole) -> Self {
        Self {
            reviewer_id: ReviewerId(reviewer_id.into()),
            role,
        }
    }
}
