//! Error handling for Cephas Core.
//!
//! This module provides:
//! - Machine-readable error codes with HTTP status mapping
//! - User-facing messages kept apart from internal detail
//! - Error logging with tracing integration
//! - Metrics integration for error tracking
//!
//! # Usage
//!
//! ```rust,ignore
//! use cephas_core::error::{CephasError, Result};
//!
//! fn lookup(key: &str) -> Result<EventRecord> {
//!     find(key)?.ok_or_else(|| CephasError::event_not_found(key))
//! }
//! ```

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

use crate::db::StoreError;

// ═══════════════════════════════════════════════════════════════════════════════
// Result Type Alias
// ═══════════════════════════════════════════════════════════════════════════════

/// A specialized Result type for Cephas operations.
pub type Result<T> = std::result::Result<T, CephasError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Error Codes
// ═══════════════════════════════════════════════════════════════════════════════

/// Machine-readable error codes for API responses.
///
/// These codes are stable and can be used by clients for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Storage Errors
    StorageError,
    StorageUnavailable,
    EventNotFound,

    // Serialization Errors
    InvalidJson,

    // Request Errors
    ValidationError,
    InvalidInput,
    UnsupportedContentType,

    // Configuration Errors
    ConfigurationError,
    MissingConfiguration,
    InvalidConfiguration,

    // Internal Errors
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error.
    pub const fn numeric_code(&self) -> u32 {
        match self {
            Self::StorageError => 2000,
            Self::StorageUnavailable => 2001,
            Self::EventNotFound => 2004,

            Self::InvalidJson => 2202,

            Self::ValidationError => 4100,
            Self::InvalidInput => 4101,
            Self::UnsupportedContentType => 4104,

            Self::ConfigurationError => 5000,
            Self::MissingConfiguration => 5001,
            Self::InvalidConfiguration => 5002,

            Self::InternalError => 9000,
        }
    }

    /// Get the HTTP status code for this error.
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::EventNotFound => StatusCode::NOT_FOUND,

            Self::ValidationError
            | Self::InvalidInput
            | Self::InvalidJson
            | Self::UnsupportedContentType => StatusCode::BAD_REQUEST,

            Self::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            Self::StorageError
            | Self::ConfigurationError
            | Self::MissingConfiguration
            | Self::InvalidConfiguration
            | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error category for grouping.
    pub const fn category(&self) -> &'static str {
        match self.numeric_code() {
            2000..=2099 => "storage",
            2200..=2299 => "serialization",
            4100..=4199 => "request",
            5000..=5099 => "configuration",
            9000..=9099 => "internal",
            _ => "unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Severity
// ═══════════════════════════════════════════════════════════════════════════════

/// Severity level for errors (affects logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Caller errors (bad input, unknown keys)
    Low,
    /// Backing store trouble
    High,
    /// Errors that stop the service from working at all
    Critical,
}

impl ErrorSeverity {
    /// Get severity based on error code.
    pub const fn from_code(code: &ErrorCode) -> Self {
        match code {
            ErrorCode::ValidationError
            | ErrorCode::InvalidInput
            | ErrorCode::InvalidJson
            | ErrorCode::UnsupportedContentType
            | ErrorCode::EventNotFound => Self::Low,

            ErrorCode::StorageError => Self::High,

            ErrorCode::StorageUnavailable
            | ErrorCode::ConfigurationError
            | ErrorCode::MissingConfiguration
            | ErrorCode::InvalidConfiguration
            | ErrorCode::InternalError => Self::Critical,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Details
// ═══════════════════════════════════════════════════════════════════════════════

/// Additional structured details about an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Additional context key-value pairs
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,

    /// Related entity ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    /// Related entity type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,

}

impl ErrorDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    fn is_empty(&self) -> bool {
        self.context.is_empty() && self.entity_id.is_none()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Main Error Type
// ═══════════════════════════════════════════════════════════════════════════════

/// The main error type for Cephas Core.
#[derive(Error, Debug)]
pub struct CephasError {
    /// Machine-readable error code
    code: ErrorCode,

    /// User-friendly error message (safe to expose to clients)
    user_message: Cow<'static, str>,

    /// Detailed internal message (for logging only)
    internal_message: Option<String>,

    /// Additional structured details
    details: ErrorDetails,

    /// The source error that caused this error
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl fmt::Display for CephasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.user_message)?;
        if let Some(ref internal) = self.internal_message {
            write!(f, " (internal: {})", internal)?;
        }
        Ok(())
    }
}

impl CephasError {
    // ─────────────────────────────────────────────────────────────────────────
    // Constructors
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a new error with code and user message.
    pub fn new(code: ErrorCode, user_message: impl Into<Cow<'static, str>>) -> Self {
        let error = Self {
            code,
            user_message: user_message.into(),
            internal_message: None,
            details: ErrorDetails::default(),
            source: None,
        };
        error.record_metrics();
        error
    }

    /// Create an error with both user and internal messages.
    pub fn with_internal(
        code: ErrorCode,
        user_message: impl Into<Cow<'static, str>>,
        internal_message: impl Into<String>,
    ) -> Self {
        let mut error = Self::new(code, user_message);
        error.internal_message = Some(internal_message.into());
        error
    }

    /// Create an internal error (500).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_internal(ErrorCode::InternalError, "An internal error occurred", message)
    }

    /// No visible event has this key.
    pub fn event_not_found(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(ErrorCode::EventNotFound, crate::db::NO_RESULT)
            .with_details(ErrorDetails::new().with_entity("event", key))
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Request body is not usable input.
    pub fn invalid_input(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn unsupported_content_type(found: Option<&str>) -> Self {
        Self::new(
            ErrorCode::UnsupportedContentType,
            "Content-Type must be application/json",
        )
        .with_context("content_type", found)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::with_internal(
            ErrorCode::ConfigurationError,
            "Configuration error occurred",
            message,
        )
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builder Methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Add error details.
    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = details;
        self
    }

    /// Add context to details.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.details.context.insert(key.into(), v);
        }
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn internal_message(&self) -> Option<&str> {
        self.internal_message.as_deref()
    }

    pub fn details(&self) -> &ErrorDetails {
        &self.details
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::from_code(&self.code)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Logging
    // ─────────────────────────────────────────────────────────────────────────

    /// Log this error with appropriate severity.
    pub fn log(&self) {
        let code = self.code.to_string();
        let category = self.code.category();
        let status = self.http_status().as_u16();

        match self.severity() {
            ErrorSeverity::Critical => {
                error!(
                    error_code = %code,
                    category = category,
                    http_status = status,
                    user_message = %self.user_message,
                    internal_message = ?self.internal_message,
                    source = ?self.source,
                    "Critical error"
                );
            }
            ErrorSeverity::High => {
                error!(
                    error_code = %code,
                    category = category,
                    http_status = status,
                    user_message = %self.user_message,
                    internal_message = ?self.internal_message,
                    "High severity error"
                );
            }
            ErrorSeverity::Low => {
                warn!(
                    error_code = %code,
                    category = category,
                    http_status = status,
                    user_message = %self.user_message,
                    details = ?self.details.context,
                    "Request rejected"
                );
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Metrics
    // ─────────────────────────────────────────────────────────────────────────

    fn record_metrics(&self) {
        counter!(
            "cephas_errors_total",
            "code" => self.code.to_string(),
            "category" => self.code.category().to_string(),
            "severity" => format!("{:?}", self.severity()),
        )
        .increment(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// API Response
// ═══════════════════════════════════════════════════════════════════════════════

/// Error response for API clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false for errors
    pub success: bool,

    pub error: ErrorInfo,
}

/// Detailed error information for API responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,

    pub numeric_code: u32,

    /// User-friendly error message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,

    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl From<&CephasError> for ErrorResponse {
    fn from(error: &CephasError) -> Self {
        Self {
            success: false,
            error: ErrorInfo {
                code: error.code,
                numeric_code: error.code.numeric_code(),
                message: error.user_message.to_string(),
                details: if error.details.is_empty() {
                    None
                } else {
                    Some(error.details.clone())
                },
                timestamp: chrono::Utc::now(),
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Axum Integration
// ═══════════════════════════════════════════════════════════════════════════════

impl IntoResponse for CephasError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.http_status();
        let response = ErrorResponse::from(&self);

        (status, Json(response)).into_response()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// From Implementations for Common Error Types
// ═══════════════════════════════════════════════════════════════════════════════

impl From<StoreError> for CephasError {
    fn from(error: StoreError) -> Self {
        let internal = match std::error::Error::source(&error) {
            Some(source) => format!("{} operation failed: {}", error.operation(), source),
            None => format!("{} operation failed", error.operation()),
        };
        Self::with_internal(ErrorCode::StorageError, error.to_string(), internal).with_source(error)
    }
}

impl From<JsonRejection> for CephasError {
    fn from(rejection: JsonRejection) -> Self {
        let code = match rejection {
            JsonRejection::MissingJsonContentType(_) => ErrorCode::UnsupportedContentType,
            JsonRejection::JsonDataError(_) => ErrorCode::InvalidInput,
            _ => ErrorCode::InvalidJson,
        };

        Self::with_internal(code, "Request body is not valid JSON", rejection.body_text())
    }
}

impl From<config::ConfigError> for CephasError {
    fn from(error: config::ConfigError) -> Self {
        let (code, user_msg) = match &error {
            config::ConfigError::NotFound(_) => (
                ErrorCode::MissingConfiguration,
                "Required configuration not found",
            ),
            config::ConfigError::PathParse(_) | config::ConfigError::FileParse { .. } => (
                ErrorCode::InvalidConfiguration,
                "Configuration file is invalid",
            ),
            _ => (ErrorCode::ConfigurationError, "Configuration error occurred"),
        };

        Self::with_internal(code, user_msg, error.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CollectionError;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::EventNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::ValidationError.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::UnsupportedContentType.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::StorageError.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ErrorCode::StorageUnavailable.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_error_code_categories() {
        assert_eq!(ErrorCode::StorageError.category(), "storage");
        assert_eq!(ErrorCode::InvalidJson.category(), "serialization");
        assert_eq!(ErrorCode::ValidationError.category(), "request");
        assert_eq!(ErrorCode::InvalidConfiguration.category(), "configuration");
        assert_eq!(ErrorCode::InternalError.category(), "internal");
    }

    #[test]
    fn test_error_context() {
        let error = CephasError::validation("Invalid event data")
            .with_context("field", "description")
            .with_context("reason", "Invalid");

        assert!(error.details().context.contains_key("field"));
        assert!(error.details().context.contains_key("reason"));
    }

    #[test]
    fn test_event_not_found() {
        let error = CephasError::event_not_found("abc-123");
        assert_eq!(error.code(), ErrorCode::EventNotFound);
        assert_eq!(error.user_message(), "No matching result");
        assert_eq!(error.details().entity_id.as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_store_error_keeps_sentinel_message() {
        let error: CephasError =
            StoreError::Update(CollectionError::Unavailable("connection reset".into())).into();
        assert_eq!(error.code(), ErrorCode::StorageError);
        assert_eq!(error.user_message(), "An error occurred during update");
        assert!(error.internal_message().unwrap().contains("connection reset"));
    }

    #[test]
    fn test_error_response_serialization() {
        let error = CephasError::validation("Invalid event data");
        let response = ErrorResponse::from(&error);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["numeric_code"], 4100);
        assert!(json["error"].get("details").is_none());
    }

    #[test]
    fn test_error_severity() {
        assert_eq!(ErrorSeverity::from_code(&ErrorCode::ValidationError), ErrorSeverity::Low);
        assert_eq!(ErrorSeverity::from_code(&ErrorCode::StorageError), ErrorSeverity::High);
        assert_eq!(
            ErrorSeverity::from_code(&ErrorCode::StorageUnavailable),
            ErrorSeverity::Critical
        );
    }

    #[test]
    fn test_not_found_details_carry_only_the_entity() {
        let response = ErrorResponse::from(&CephasError::event_not_found("abc-123"));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json["error"]["details"],
            serde_json::json!({"entity_id": "abc-123", "entity_type": "event"})
        );
    }

    #[test]
    fn test_json_codes_map_to_bad_request() {
        for code in [ErrorCode::InvalidJson, ErrorCode::InvalidInput] {
            assert_eq!(code.http_status(), StatusCode::BAD_REQUEST);
            assert_eq!(ErrorSeverity::from_code(&code), ErrorSeverity::Low);
        }
        assert_eq!(ErrorCode::InvalidJson.numeric_code(), 2202);
    }

    #[test]
    fn test_error_display() {
        let error = CephasError::with_internal(
            ErrorCode::StorageError,
            "An error occurred during search",
            "Connection refused: localhost:27017",
        );

        let display = format!("{}", error);
        assert!(display.contains("StorageError"));
        assert!(display.contains("An error occurred during search"));
        assert!(display.contains("Connection refused"));
    }
}
