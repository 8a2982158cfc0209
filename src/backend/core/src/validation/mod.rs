//! Event input validation.
//!
//! Turns an untrusted JSON object into a typed event, or into a per-field error
//! report. There is no I/O here.
//!
//! - **Rules** (`rules`): one rule per attribute
//!   - `Timestamp`: ISO-8601, normalized to UTC
//!   - `PointCoordinates`: `[longitude, latitude]`, finite and in range
//!   - `PointType`: the literal `"point"`, any letter case
//!   - `Description`: trimmed, at most 1024 characters, limited character set
//!
//! - **Validators** (`validator`): `validate_for_create` requires every
//!   mandatory attribute and generates the event key; `validate_for_update`
//!   checks only the attributes present and requires at least one.
//!
//! - **Errors** (`error`): `ValidationErrors` maps a field path such as
//!   `location.coordinates` to `Missing`, `Invalid`, or (for `update_fields`)
//!   `None`.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use cephas_core::validation::{validate_for_create, ValidationErrorKind};
//! use serde_json::json;
//!
//! let input = json!({
//!     "begin_timestamp": "2020-11-10T09:00:00.000Z",
//!     "location": {"type": "Point", "coordinates": [-117.923667, 33.809173]},
//! });
//!
//! let errors = validate_for_create(input.as_object().unwrap()).unwrap_err();
//! assert_eq!(errors.get("description"), Some(ValidationErrorKind::Missing));
//! ```

pub mod error;
pub mod rules;
pub mod validator;

pub use error::{
    OutcomeBuilder, ValidationErrorKind, ValidationErrors, ValidationResult, UPDATE_FIELDS,
};
pub use rules::{
    valid_description, valid_point_coords, valid_time, Description, FieldRule, PointCoordinates,
    PointType, Timestamp, DESCRIPTION_MAX_LENGTH,
};
pub use validator::{validate_for_create, validate_for_update, RecordValidator, MUTABLE_FIELDS};

/// Prelude for commonly used validation types.
pub mod prelude {
    pub use super::{
        validate_for_create, validate_for_update, ValidationErrorKind, ValidationErrors,
        ValidationResult,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Integration with Cephas Error System
// ═══════════════════════════════════════════════════════════════════════════════

use crate::error::CephasError;

impl From<ValidationErrors> for CephasError {
    fn from(errors: ValidationErrors) -> Self {
        let message = if errors.is_empty() {
            "Invalid event data".to_string()
        } else {
            format!("Invalid event data: {}", errors)
        };

        CephasError::validation(message).with_context("field_errors", errors.to_message_map())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
