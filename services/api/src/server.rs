use crate::cli::ServeArgs;
use crate::infra::{
    engine_from_config, seed_reference_data, AppState, InMemoryInsuranceRepository,
    InMemoryWeatherStore,
};
use crate::routes::app_router;
use agri_claims::config::AppConfig;
use agri_claims::error::AppError;
use agri_claims::telemetry;
use agri_claims::workflows::claims::ClaimsService;
use agri_claims::workflows::weather::WeatherIngestSink;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = InMemoryInsuranceRepository::default();
    seed_reference_data(&repository);
    let weather = InMemoryWeatherStore::default();

    let service = Arc::new(ClaimsService::new(
        Arc::new(repository),
        Arc::new(weather.clone()),
        engine_from_config(&config),
    ));
    let sink = Arc::new(WeatherIngestSink::new(Arc::new(weather)));

    let app = app_router(service, sink)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "claims automation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
