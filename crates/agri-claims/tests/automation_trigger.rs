use agri_claims::workflows::claims::{
    plan_transition, AutomationConfig, AutomationEngine, Claim, ClaimId, ClaimStatus, FarmId,
    PaymentStatus, PolicyClaimStatus, PolicyId, PolicyProduct, ProductId, ReviewerContext,
    ReviewerRole, TransitionRequest, TriggerWindow,
};
use agri_claims::workflows::weather::{ObservationId, WeatherObservation};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

fn pass_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 6, 0, 0)
        .single()
        .expect("valid pass time")
}

fn dry_week(farm: &str) -> Vec<WeatherObservation> {
    (0..7)
        .map(|offset| WeatherObservation {
            id: ObservationId(format!("obs-{offset}")),
            farm_id: FarmId(farm.to_string()),
            timestamp: pass_time() - Duration::days(offset),
            rainfall_mm: Some(5.0),
            temperature_c: Some(31.0),
            humidity: Some(55.0),
        })
        .collect()
}

fn paddy_product() -> PolicyProduct {
    PolicyProduct {
        id: ProductId("prod-paddy".to_string()),
        name: "Kharif Paddy Shield".to_string(),
        crop_type: "Paddy".to_string(),
        season: "Kharif".to_string(),
        base_premium: 2_500.0,
        coverage_amount: 100_000.0,
        duration_months: 6,
        automation_config: Some(AutomationConfig {
            enabled: true,
            min_rainfall_7day_avg: 10.0,
            max_temperature: 45.0,
            trigger_percentage: 0.25,
        }),
    }
}

fn active_policy() -> agri_claims::workflows::claims::UserPolicy {
    agri_claims::workflows::claims::UserPolicy {
        id: PolicyId("pol-1".to_string()),
        user_id: "farmer-1".to_string(),
        farm_id: FarmId("farm-1".to_string()),
        product_id: ProductId("prod-paddy".to_string()),
        premium_amount: 2_500.0,
        coverage_amount: 100_000.0,
        purchase_date: NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"),
        start_date: NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"),
        end_date: NaiveDate::from_ymd_opt(2025, 12, 1).expect("valid date"),
        payment_status: PaymentStatus::Paid,
        claim_status: PolicyClaimStatus::None,
    }
}

#[test]
fn dry_week_breaches_the_rainfall_threshold() {
    let engine = AutomationEngine::new(TriggerWindow::default());
    let decision = engine
        .decide(&active_policy(), &paddy_product(), &dry_week("farm-1"))
        .expect("thresholds breached");

    assert!(decision.reason.contains("rainfall 5.0mm"));
    assert_eq!(decision.amount_claimed, 25_000.0);
}

#[test]
fn healthy_week_does_not_trigger() {
    let engine = AutomationEngine::new(TriggerWindow::default());
    let mut observations = dry_week("farm-1");
    for obs in &mut observations {
        obs.rainfall_mm = Some(14.0);
    }

    assert!(engine
        .decide(&active_policy(), &paddy_product(), &observations)
        .is_none());
}

#[test]
fn in_flight_policy_is_ineligible_until_resolved() {
    let product = paddy_product();
    let mut policy = active_policy();
    let as_of = pass_time().date_naive();

    assert!(AutomationEngine::policy_eligible(&policy, &product, as_of));

    policy.claim_status = PolicyClaimStatus::Pending;
    assert!(!AutomationEngine::policy_eligible(&policy, &product, as_of));

    policy.claim_status = PolicyClaimStatus::ClaimRejected;
    assert!(AutomationEngine::policy_eligible(&policy, &product, as_of));
}

#[test]
fn triggered_claim_walks_the_full_review_lifecycle() {
    let engine = AutomationEngine::new(TriggerWindow::default());
    let policy = active_policy();
    let decision = engine
        .decide(&policy, &paddy_product(), &dry_week("farm-1"))
        .expect("thresholds breached");

    let mut claim = Claim {
        id: ClaimId("clm-000001".to_string()),
        policy_id: policy.id.clone(),
        triggered_at: pass_time(),
        reason: decision.reason,
        amount_claimed: decision.amount_claimed,
        status: ClaimStatus::Pending,
        reviewed_by: None,
        rejection_reason: None,
        payout_reference_id: None,
    };

    let reviewer = ReviewerContext::new("insurer-1", ReviewerRole::Insurer);

    let approval = plan_transition(
        &claim,
        &reviewer,
        &TransitionRequest::to(ClaimStatus::Approved),
        pass_time(),
    )
    .expect("approval allowed");
    approval.apply_to(&mut claim);
    assert_eq!(claim.status.policy_status(), PolicyClaimStatus::ClaimInitiated);

    let payment = plan_transition(
        &claim,
        &reviewer,
        &TransitionRequest::to(ClaimStatus::Paid),
        pass_time() + Duration::hours(2),
    )
    .expect("payment allowed");
    payment.apply_to(&mut claim);

    assert_eq!(claim.status, ClaimStatus::Paid);
    assert!(claim
        .payout_reference_id
        .as_deref()
        .expect("payout reference set")
        .starts_with("PAY-"));
    assert_eq!(claim.status.policy_status(), PolicyClaimStatus::ClaimPaid);
}
