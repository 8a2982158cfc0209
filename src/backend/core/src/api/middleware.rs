//! API middleware for content-type enforcement and request metrics.

use axum::{
    extract::{MatchedPath, Request},
    http::{header::CONTENT_TYPE, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;

use crate::error::CephasError;
use crate::telemetry::RequestDurationHistogram;

/// Whether the `Content-Type` header names `application/json`, parameters allowed.
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}

/// Reject any request without `Content-Type: application/json`, whatever the method.
pub async fn require_json_content_type(req: Request, next: Next) -> Response {
    if !is_json_content_type(req.headers()) {
        let found = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());
        return CephasError::unsupported_content_type(found).into_response();
    }
    next.run(req).await
}

/// Record count and latency per matched route.
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    RequestDurationHistogram::record(
        method.as_str(),
        &route,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(content_type: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn test_json_content_type_accepted() {
        assert!(is_json_content_type(&headers(Some("application/json"))));
        assert!(is_json_content_type(&headers(Some("application/json; charset=utf-8"))));
        assert!(is_json_content_type(&headers(Some("Application/JSON"))));
    }

    #[test]
    fn test_other_content_types_rejected() {
        assert!(!is_json_content_type(&headers(None)));
        assert!(!is_json_content_type(&headers(Some("text/plain"))));
        assert!(!is_json_content_type(&headers(Some("application/jsonp"))));
    }
}
