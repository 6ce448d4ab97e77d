use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ClaimId, ClaimStatus, PolicyId, ReviewerContext, ReviewerId, ReviewerRole};
use super::lifecycle::{ClaimTransitionError, TransitionRequest};
use super::repository::{ClaimQuery, ClaimRepository, PolicyRepository};
use super::service::{ClaimServiceError, ClaimsService};
use crate::workflows::weather::WeatherStore;

/// Router builder exposing the automation trigger, claim review, and
/// policy read endpoints.
pub fn claims_router<R, W>(service: Arc<ClaimsService<R, W>>) -> Router
where
    R: PolicyRepository + ClaimRepository + 'static,
    W: WeatherStore + 'static,
{
    Router::new()
        .route("/api/v1/automation/run", post(run_automation_handler::<R, W>))
        .route("/api/v1/claims", get(list_claims_handler::<R, W>))
        .route(
            "/api/v1/claims/:claim_id/transition",
            post(transition_handler::<R, W>),
        )
        .route("/api/v1/policies", get(list_policies_handler::<R, W>))
        .route("/api/v1/policies/:policy_id", get(policy_handler::<R, W>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AutomationRunRequest {
    /// Evaluation instant; defaults to the current time. Operators pin it
    /// to re-run a pass over a known window.
    #[serde(default)]
    as_of: Option<DateTime<Utc>>,
}

pub(crate) async fn run_automation_handler<R, W>(
    State(service): State<Arc<ClaimsService<R, W>>>,
    payload: Option<axum::Json<AutomationRunRequest>>,
) -> Response
where
    R: PolicyRepository + ClaimRepository + 'static,
    W: WeatherStore + 'static,
{
    let now = payload
        .and_then(|axum::Json(request)| request.as_of)
        .unwrap_or_else(Utc::now);
    let result = service.run_automation(now);
    (StatusCode::OK, axum::Json(result)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClaimListParams {
    status: Option<String>,
    policy_id: Option<String>,
    limit: Option<usize>,
}

pub(crate) async fn list_claims_handler<R, W>(
    State(service): State<Arc<ClaimsService<R, W>>>,
    Query(params): Query<ClaimListParams>,
) -> Response
where
    R: PolicyRepository + ClaimRepository + 'static,
    W: WeatherStore + 'static,
{
    let status = match params.status.as_deref() {
        Some(raw) => match ClaimStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                let payload = json!({ "error": format!("unknown claim status '{raw}'") });
                return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
            }
        },
        None => None,
    };

    let query = ClaimQuery {
        policy_id: params.policy_id.map(PolicyId),
        status,
        limit: params.limit,
    };

    match service.claims(&query) {
        Ok(claims) => (StatusCode::OK, axum::Json(claims)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn transition_handler<R, W>(
    State(service): State<Arc<ClaimsService<R, W>>>,
    Path(claim_id): Path<String>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<TransitionRequest>,
) -> Response
where
    R: PolicyRepository + ClaimRepository + 'static,
    W: WeatherStore + 'static,
{
    let ctx = match reviewer_context(&headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };

    let id = ClaimId(claim_id);
    match service.transition(&ctx, &id, &request, Utc::now()) {
        Ok(claim) => (StatusCode::OK, axum::Json(claim)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn list_policies_handler<R, W>(
    State(service): State<Arc<ClaimsService<R, W>>>,
) -> Response
where
    R: PolicyRepository + ClaimRepository + 'static,
    W: WeatherStore + 'static,
{
    match service.policies() {
        Ok(policies) => (StatusCode::OK, axum::Json(policies)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn policy_handler<R, W>(
    State(service): State<Arc<ClaimsService<R, W>>>,
    Path(policy_id): Path<String>,
) -> Response
where
    R: PolicyRepository + ClaimRepository + 'static,
    W: WeatherStore + 'static,
{
    let id = PolicyId(policy_id);
    match service.policy(&id) {
        Ok(policy) => (StatusCode::OK, axum::Json(policy)).into_response(),
        Err(ClaimServiceError::NotFound) => {
            let payload = json!({ "error": "policy not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

/// Reviewer identity arrives from the upstream identity provider as plain
/// headers; the core trusts the id but refuses requests without one.
fn reviewer_context(headers: &HeaderMap) -> Result<ReviewerContext, Response> {
    let reviewer_id = headers
        .get("x-reviewer-id")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            let payload = json!({ "error": "x-reviewer-id header is required" });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        })?;

    let role = headers
        .get("x-reviewer-role")
        .and_then(|value| value.to_str().ok())
        .and_then(ReviewerRole::parse)
        .ok_or_else(|| {
            let payload =
                json!({ "error": "x-reviewer-role header must be farmer, insurer, or admin" });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        })?;

    Ok(ReviewerContext {
        reviewer_id: ReviewerId(reviewer_id.to_string()),
        role,
    })
}

fn service_error_response(error: ClaimServiceError) -> Response {
    let status = match &error {
        ClaimServiceError::NotFound => StatusCode::NOT_FOUND,
        ClaimServiceError::Transition(ClaimTransitionError::InvalidTransition { .. }) => {
            StatusCode::CONFLICT
        }
        ClaimServiceError::Transition(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ClaimServiceError::ConcurrencyConflict => StatusCode::CONFLICT,
        ClaimServiceError::CatalogAccessDenied(_) => StatusCode::FORBIDDEN,
        ClaimServiceError::Repository(_) | ClaimServiceError::Weather(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
