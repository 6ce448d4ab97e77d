use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::WeatherDataInput;
use super::store::WeatherStore;
use super::{IngestError, WeatherIngestSink};
use crate::workflows::claims::domain::FarmId;

/// Router builder exposing observation ingestion and recent-history reads.
pub fn weather_router<S>(sink: Arc<WeatherIngestSink<S>>) -> Router
where
    S: WeatherStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/weather/observations",
            get(list_observations_handler::<S>).post(ingest_one_handler::<S>),
        )
        .route(
            "/api/v1/weather/observations/bulk",
            post(ingest_bulk_handler::<S>),
        )
        .with_state(sink)
}

pub(crate) async fn ingest_one_handler<S>(
    State(sink): State<Arc<WeatherIngestSink<S>>>,
    axum::Json(input): axum::Json<WeatherDataInput>,
) -> Response
where
    S: WeatherStore + 'static,
{
    ingest_response(sink.ingest(vec![input], Utc::now()))
}

pub(crate) async fn ingest_bulk_handler<S>(
    State(sink): State<Arc<WeatherIngestSink<S>>>,
    axum::Json(inputs): axum::Json<Vec<WeatherDataInput>>,
) -> Response
where
    S: WeatherStore + 'static,
{
    ingest_response(sink.ingest(inputs, Utc::now()))
}

fn ingest_response(result: Result<usize, IngestError>) -> Response {
    match result {
        Ok(inserted_count) => {
            let payload = json!({ "inserted_count": inserted_count });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error @ IngestError::MissingFarmId) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ObservationListParams {
    farm_id: Option<String>,
    limit: Option<usize>,
}

pub(crate) async fn list_observations_handler<S>(
    State(sink): State<Arc<WeatherIngestSink<S>>>,
    Query(params): Query<ObservationListParams>,
) -> Response
where
    S: WeatherStore + 'static,
{
    let farm_id = params.farm_id.map(FarmId);
    // Per-farm reads default to a tighter page than the all-farms feed.
    let limit = params
        .limit
        .unwrap_or(if farm_id.is_some() { 20 } else { 50 });

    match sink.recent(farm_id.as_ref(), limit) {
        Ok(observations) => (StatusCode::OK, axum::Json(observations)).into_response(),
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
