//! HTTP API for Cephas.
//!
//! Unversioned endpoints:
//! - `GET /cephas/healthcheck`
//! - `GET /metrics`
//!
//! Event endpoints live under [`v1::V1_PREFIX`] and require
//! `Content-Type: application/json`. Successful calls answer with the
//! [`ApiResponse`] envelope; failures with [`crate::error::ErrorResponse`].

mod handlers;
pub mod middleware;
pub mod v1;

use axum::{middleware as axum_middleware, routing::get, Router};
use serde::{Deserialize, Serialize};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::db::EventStore;
use crate::telemetry::MetricsRegistry;

pub use handlers::{FindInSpaceRequest, FindInSpaceTimeRequest, FindInTimeRequest};

/// Service health endpoint.
pub const HEALTHCHECK_PATH: &str = "/cephas/healthcheck";

/// Prometheus scrape endpoint.
pub const METRICS_PATH: &str = "/metrics";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: EventStore,
    pub metrics: MetricsRegistry,
}

impl AppState {
    pub fn new(store: EventStore, metrics: MetricsRegistry) -> Self {
        Self { store, metrics }
    }

    /// State over a fresh in-memory store with metrics disabled.
    pub fn in_memory() -> Self {
        Self::new(EventStore::in_memory(), MetricsRegistry::disabled())
    }
}

/// Build the API router.
///
/// ```rust,ignore
/// let app = build_router(AppState::new(store, telemetry.metrics));
/// axum::serve(listener, app).await?;
/// ```
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(HEALTHCHECK_PATH, get(handlers::healthcheck))
        .route(METRICS_PATH, get(handlers::prometheus_metrics))
        .nest(v1::V1_PREFIX, v1::v1_router())
        .route_layer(axum_middleware::from_fn(middleware::track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// API response wrapper.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }
}
