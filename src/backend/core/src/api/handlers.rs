//! API request handlers with proper error propagation.
//!
//! All event handlers return `Result<impl IntoResponse, CephasError>` so that
//! errors become HTTP status codes through `CephasError`'s `IntoResponse`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use super::{ApiResponse, AppState};
use crate::db::{NearPoint, TimeRange};
use crate::error::CephasError;
use crate::events::EventKey;
use crate::validation::{valid_time, validate_for_create, validate_for_update};

// ═══════════════════════════════════════════════════════════════════════════════
// Health and Metrics
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn healthcheck(State(state): State<AppState>) -> Response {
    match state.store.ping().await {
        Ok(()) => Json(json!({"status": "ok"})).into_response(),
        Err(e) => {
            warn!(backend = state.store.backend(), error = %e, "Healthcheck ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "degraded"})),
            )
                .into_response()
        }
    }
}

pub async fn prometheus_metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Some(body) => (
            [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Metrics are disabled").into_response(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Event Handlers
// ═══════════════════════════════════════════════════════════════════════════════

/// Unwrap a JSON body that must be an object.
fn json_object(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, CephasError> {
    let Json(value) = body?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(CephasError::invalid_input("Request body must be a JSON object")),
    }
}

pub async fn create_event(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, CephasError> {
    let input = json_object(body)?;
    let event = validate_for_create(&input).map_err(|errors| {
        warn!(errors = %errors, "Invalid create data");
        CephasError::from(errors)
    })?;

    let key = state.store.insert(event).await?;
    info!(key = %key, "Event created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(json!({"create": true, "key": key}))),
    ))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, CephasError> {
    let key = EventKey::from(key);
    let record = state
        .store
        .find_by_key(&key)
        .await?
        .ok_or_else(|| CephasError::event_not_found(key.as_str()))?;

    Ok(Json(ApiResponse::success(record)))
}

pub async fn update_event(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, CephasError> {
    let input = json_object(body)?;
    let patch = validate_for_update(&input).map_err(|errors| {
        warn!(key = %key, errors = %errors, "Invalid update data");
        CephasError::from(errors)
    })?;

    let key = EventKey::from(key);
    let record = state
        .store
        .update(&key, patch)
        .await?
        .ok_or_else(|| CephasError::event_not_found(key.as_str()))?;

    Ok(Json(ApiResponse::success(record)))
}

/// Always answers `{status: "ok"}`; the deleted record is never returned.
pub async fn delete_event(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, CephasError> {
    state.store.soft_delete(&EventKey::from(key)).await?;
    Ok(Json(ApiResponse::success(json!({"status": "ok"}))))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Find Handlers
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct FindInTimeRequest {
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Deserialize)]
pub struct FindInSpaceRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(alias = "maxDistance")]
    pub max_distance: f64,
}

#[derive(Debug, Deserialize)]
pub struct FindInSpaceTimeRequest {
    #[serde(flatten)]
    pub time: FindInTimeRequest,
    #[serde(flatten)]
    pub space: FindInSpaceRequest,
}

fn parse_time(field: &'static str, value: &str) -> Result<chrono::DateTime<chrono::Utc>, CephasError> {
    valid_time(value).ok_or_else(|| {
        CephasError::invalid_input(format!("{} is not a valid timestamp", field))
            .with_context("field", field)
    })
}

impl FindInTimeRequest {
    pub fn time_range(&self) -> Result<TimeRange, CephasError> {
        Ok(TimeRange::new(
            parse_time("start_time", &self.start_time)?,
            parse_time("end_time", &self.end_time)?,
        ))
    }
}

impl FindInSpaceRequest {
    pub fn near_point(&self) -> Result<NearPoint, CephasError> {
        let near = NearPoint::new(self.latitude, self.longitude, self.max_distance);
        if near.is_valid() {
            Ok(near)
        } else {
            Err(CephasError::invalid_input(
                "latitude, longitude or max_distance is out of range",
            ))
        }
    }
}

pub async fn find_in_time(
    State(state): State<AppState>,
    body: Result<Json<FindInTimeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, CephasError> {
    let Json(request) = body?;
    let records = state.store.find_in_time_range(request.time_range()?).await?;
    Ok(Json(ApiResponse::success(records)))
}

pub async fn find_in_space(
    State(state): State<AppState>,
    body: Result<Json<FindInSpaceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, CephasError> {
    let Json(request) = body?;
    let records = state.store.find_near_point(request.near_point()?).await?;
    Ok(Json(ApiResponse::success(records)))
}

pub async fn find_in_space_time(
    State(state): State<AppState>,
    body: Result<Json<FindInSpaceTimeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, CephasError> {
    let Json(request) = body?;
    let records = state
        .store
        .find_in_time_range_near_point(request.time.time_range()?, request.space.near_point()?)
        .await?;
    Ok(Json(ApiResponse::success(records)))
}
