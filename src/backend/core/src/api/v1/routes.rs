//! V1 API routes.

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::api::{handlers, middleware, AppState};

/// V1 API prefix.
pub const V1_PREFIX: &str = "/cephas/api/v1.0";

/// Build the V1 API router.
///
/// # Endpoints
///
/// ## Events
/// - `POST /create-event` - Validate and store a new event
/// - `GET /get-event/:key` - Fetch a visible event
/// - `PUT /update-event/:key` - Apply a partial update
/// - `DELETE /delete-event/:key` - Soft-delete an event
///
/// ## Queries
/// - `POST /find/in-time` - Events beginning in `[start_time, end_time)`
/// - `POST /find/in-space` - Events within `max_distance` metres, nearest first
/// - `POST /find/in-space-time` - Both predicates
pub fn v1_router() -> Router<AppState> {
    Router::new()
        .route("/create-event", post(handlers::create_event))
        .route("/get-event/:key", get(handlers::get_event))
        .route("/update-event/:key", put(handlers::update_event))
        .route("/delete-event/:key", delete(handlers::delete_event))
        .route("/find/in-time", post(handlers::find_in_time))
        .route("/find/in-space", post(handlers::find_in_space))
        .route("/find/in-space-time", post(handlers::find_in_space_time))
        .route_layer(axum_middleware::from_fn(middleware::require_json_content_type))
}

/// V1 API route constants for use in clients and documentation.
pub mod paths {
    pub const CREATE_EVENT: &str = "/cephas/api/v1.0/create-event";
    pub const GET_EVENT: &str = "/cephas/api/v1.0/get-event/:key";
    pub const UPDATE_EVENT: &str = "/cephas/api/v1.0/update-event/:key";
    pub const DELETE_EVENT: &str = "/cephas/api/v1.0/delete-event/:key";

    pub const FIND_IN_TIME: &str = "/cephas/api/v1.0/find/in-time";
    pub const FIND_IN_SPACE: &str = "/cephas/api/v1.0/find/in-space";
    pub const FIND_IN_SPACE_TIME: &str = "/cephas/api/v1.0/find/in-space-time";

    /// Concrete path for a templated route.
    pub fn with_key(template: &str, key: &str) -> String {
        template.replace(":key", key)
    }
}
