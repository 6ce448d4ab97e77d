use crate::infra::{parse_datetime, InMemoryInsuranceRepository, InMemoryWeatherStore};
use agri_claims::error::AppError;
use agri_claims::workflows::claims::{
    AutomationConfig, AutomationEngine, AutomationResult, Claim, ClaimQuery, ClaimStatus,
    ClaimsService, FarmId, FarmProfile, PaymentStatus, PolicyClaimStatus, PolicyId, PolicyProduct,
    ProductId, ReviewerContext, ReviewerRole, TransitionRequest, UserPolicy,
};
use agri_claims::workflows::weather::{
    collect_farm_readings, FetchSummary, ProviderError, ProviderReading, WeatherCsvImporter,
    WeatherDataInput, WeatherIngestSink, WeatherProvider,
};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct AutomationRunArgs {
    /// Evaluation instant (YYYY-MM-DD or RFC3339). Defaults to now.
    #[arg(long, value_parser = parse_datetime)]
    pub(crate) as_of: Option<DateTime<Utc>>,
    /// Optional weather CSV export to ingest before the pass
    #[arg(long)]
    pub(crate) weather_csv: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation instant (YYYY-MM-DD or RFC3339). Defaults to now.
    #[arg(long, value_parser = parse_datetime)]
    pub(crate) as_of: Option<DateTime<Utc>>,
    /// Stop after the automation pass instead of walking a claim to payout
    #[arg(long)]
    pub(crate) skip_review: bool,
}

type DemoService = ClaimsService<InMemoryInsuranceRepository, InMemoryWeatherStore>;

struct DemoStack {
    service: Arc<DemoService>,
    sink: WeatherIngestSink<InMemoryWeatherStore>,
}

/// Stand-in provider reporting a dry spell for every location, so the
/// walkthrough reliably breaches the rainfall threshold.
struct DrySpellProvider;

impl WeatherProvider for DrySpellProvider {
    fn current(&self, _location: &str) -> Result<ProviderReading, ProviderError> {
        Ok(ProviderReading {
            temperature_c: 31.0,
            humidity: 58.0,
            rainfall_mm: 3.0,
        })
    }
}

/// Seed a catalog and one active policy bracketing `as_of`, so a pass at
/// that instant has something to evaluate.
fn build_demo_stack(as_of: DateTime<Utc>) -> DemoStack {
    let repository = InMemoryInsuranceRepository::default();
    let weather = InMemoryWeatherStore::default();

    repository.seed_farm(FarmProfile {
        id: FarmId("farm-demo".to_string()),
        farm_name: "Ganga View Paddy Fields".to_string(),
        location: Some("Hajipur".to_string()),
        district: Some("Vaishali".to_string()),
        crop_type: "Paddy".to_string(),
        season: "Kharif".to_string(),
    });
    repository.seed_product(PolicyProduct {
        id: ProductId("prod-demo".to_string()),
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

    let cover_start = as_of.date_naive() - Duration::days(60);
    let cover_end = as_of.date_naive() + Duration::days(120);
    repository.seed_policy(UserPolicy {
        id: PolicyId("pol-demo".to_string()),
        user_id: "farmer-demo".to_string(),
        farm_id: FarmId("farm-demo".to_string()),
        product_id: ProductId("prod-demo".to_string()),
        premium_amount: 2_500.0,
        coverage_amount: 100_000.0,
        purchase_date: cover_start,
        start_date: cover_start,
        end_date: cover_end,
        payment_status: PaymentStatus::Paid,
        claim_status: PolicyClaimStatus::None,
    });

    let service = Arc::new(ClaimsService::new(
        Arc::new(repository),
        Arc::new(weather.clone()),
        AutomationEngine::default(),
    ));
    let sink = WeatherIngestSink::new(Arc::new(weather));

    DemoStack { service, sink }
}

enum DemoDataSource {
    Csv(usize),
    Provider(FetchSummary),
}

/// Gather readings either from a CSV export or from the stand-in provider
/// loop over the seeded farms.
fn gather_inputs(
    stack: &DemoStack,
    weather_csv: Option<PathBuf>,
) -> Result<(Vec<WeatherDataInput>, DemoDataSource), AppError> {
    match weather_csv {
        Some(path) => {
            let inputs = WeatherCsvImporter::from_path(path)?;
            let count = inputs.len();
            Ok((inputs, DemoDataSource::Csv(count)))
        }
        None => {
            let farms = stack.service.farms()?;
            let (inputs, summary) = collect_farm_readings(&DrySpellProvider, &farms);
            Ok((inputs, DemoDataSource::Provider(summary)))
        }
    }
}

pub(crate) fn run_automation_pass(args: AutomationRunArgs) -> Result<(), AppError> {
    let AutomationRunArgs { as_of, weather_csv } = args;
    let as_of = as_of.unwrap_or_else(Utc::now);

    let stack = build_demo_stack(as_of);
    let (inputs, data_source) = gather_inputs(&stack, weather_csv)?;
    let inserted = stack.sink.ingest(inputs, as_of)?;

    let result = stack.service.run_automation(as_of);
    let claims = stack.service.claims(&ClaimQuery::default())?;
    render_pass(&result, &claims, inserted, &data_source);

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { as_of, skip_review } = args;
    let as_of = as_of.unwrap_or_else(Utc::now);

    let stack = build_demo_stack(as_of);
    let (inputs, data_source) = gather_inputs(&stack, None)?;
    let inserted = stack.sink.ingest(inputs, as_of)?;

    let result = stack.service.run_automation(as_of);
    let claims = stack.service.claims(&ClaimQuery::default())?;
    render_pass(&result, &claims, inserted, &data_source);

    if skip_review {
        return Ok(());
    }

    let Some(claim) = claims.first() else {
        println!("\nNo claim to review; thresholds were not breached.");
        return Ok(());
    };

    let reviewer = ReviewerContext::new("insurer-demo", ReviewerRole::Insurer);
    println!("\nReview walkthrough");

    let approved = stack.service.transition(
        &reviewer,
        &claim.id,
        &TransitionRequest::to(ClaimStatus::Approved),
        as_of + Duration::hours(1),
    )?;
    println!("- {} approved by {}", approved.id.0, reviewer.reviewer_id.0);

    let paid = stack.service.transition(
        &reviewer,
        &claim.id,
        &TransitionRequest::to(ClaimStatus::Paid),
        as_of + Duration::hours(2),
    )?;
    println!(
        "- {} paid, reference {}",
        paid.id.0,
        paid.payout_reference_id.as_deref().unwrap_or("-")
    );

    let policy = stack.service.policy(&paid.policy_id)?;
    println!(
        "- policy {} now reads '{}'",
        policy.id.0,
        policy.claim_status.label()
    );

    Ok(())
}

fn render_pass(
    result: &AutomationResult,
    claims: &[Claim],
    inserted: usize,
    data_source: &DemoDataSource,
) {
    println!("Weather-triggered claims automation");
    match data_source {
        DemoDataSource::Csv(rows) => {
            println!("Data source: CSV import ({rows} rows, {inserted} observations stored)");
        }
        DemoDataSource::Provider(summary) => {
            println!(
                "Data source: provider fetch ({} fetched, {} skipped, {} failed)",
                summary.fetched, summary.skipped_no_location, summary.failed
            );
        }
    }

    println!("\nRun report");
    println!("- evaluated at: {}", result.timestamp);
    println!("- success: {}", result.success);
    println!("- claims created: {}", result.claims_created);

    if claims.is_empty() {
        println!("\nClaims: none");
    } else {
        println!("\nClaims");
        for claim in claims {
            println!(
                "- {} | policy {} | {} | {:.2} | {}",
                claim.id.0,
                claim.policy_id.0,
                claim.status.label(),
                claim.amount_claimed,
                claim.reason
            );
        }
    }
}
