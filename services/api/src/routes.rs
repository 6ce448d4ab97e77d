use crate::infra::{AppState, InMemoryInsuranceRepository, InMemoryWeatherStore};
use agri_claims::error::AppError;
use agri_claims::workflows::claims::{claims_router, ClaimsService};
use agri_claims::workflows::weather::{weather_router, WeatherCsvImporter, WeatherIngestSink};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub(crate) type Service = ClaimsService<InMemoryInsuranceRepository, InMemoryWeatherStore>;
pub(crate) type Sink = WeatherIngestSink<InMemoryWeatherStore>;

#[derive(Debug, Deserialize)]
pub(crate) struct WeatherImportRequest {
    pub(crate) csv: String,
}

pub(crate) fn app_router(service: Arc<Service>, sink: Arc<Sink>) -> axum::Router {
    claims_router(service)
        .merge(weather_router(sink.clone()))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/weather/import",
            axum::routing::post(weather_import_endpoint).with_state(sink),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Accepts an inline station CSV export and appends it through the sink.
pub(crate) async fn weather_import_endpoint(
    axum::extract::State(sink): axum::extract::State<Arc<Sink>>,
    Json(payload): Json<WeatherImportRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let inputs = WeatherCsvImporter::from_reader(std::io::Cursor::new(payload.csv.into_bytes()))?;
    let inserted_count = sink.ingest(inputs, Utc::now())?;
    Ok(Json(json!({ "inserted_count": inserted_count })))
}
