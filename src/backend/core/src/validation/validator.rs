//! Event validators for creation and partial update.
//!
//! This module provides:
//! - `RecordValidator` for reading fields out of one JSON object
//! - `validate_for_create` producing a keyed `NewEvent`
//! - `validate_for_update` producing an `EventPatch`

use serde_json::{Map, Value};

use crate::events::{EventPatch, GeoPoint, NewEvent};
use crate::validation::error::{OutcomeBuilder, ValidationResult};
use crate::validation::rules::{Description, FieldRule, PointCoordinates, PointType, Timestamp};

/// Attributes an update may change.
pub const MUTABLE_FIELDS: [&str; 4] = ["begin_timestamp", "end_timestamp", "location", "description"];

// ═══════════════════════════════════════════════════════════════════════════════
// Record Validator
// ═══════════════════════════════════════════════════════════════════════════════

/// Reads fields from a JSON object, recording each failure as it goes.
///
/// Every field is checked independently, so one pass reports all failures.
///
/// # Example
///
/// ```rust,ignore
/// let mut record = RecordValidator::new(&input);
/// let begin = record.required("begin_timestamp", &Timestamp);
/// let end = record.optional("end_timestamp", &Timestamp);
/// let outcome = record.finish();
/// ```
pub struct RecordValidator<'a> {
    input: &'a Map<String, Value>,
    outcome: OutcomeBuilder,
}

impl<'a> RecordValidator<'a> {
    pub fn new(input: &'a Map<String, Value>) -> Self {
        Self {
            input,
            outcome: OutcomeBuilder::new(),
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.input.contains_key(field)
    }

    /// A field that must be present: absence is `Missing`, failure `Invalid`.
    pub fn required<R: FieldRule>(&mut self, field: &str, rule: &R) -> Option<R::Output> {
        let input = self.input;
        match input.get(field) {
            Some(value) => self.apply(field, value, rule),
            None => {
                self.outcome.missing(field);
                None
            }
        }
    }

    /// A field that may be absent; only a present value is checked.
    pub fn optional<R: FieldRule>(&mut self, field: &str, rule: &R) -> Option<R::Output> {
        let input = self.input;
        let value = input.get(field)?;
        self.apply(field, value, rule)
    }

    /// A required nested object, validated by `inner` under the `field.` prefix.
    pub fn required_object<T>(
        &mut self,
        field: &str,
        inner: impl FnOnce(&mut RecordValidator<'a>) -> Option<T>,
    ) -> Option<T> {
        let input = self.input;
        match input.get(field) {
            Some(value) => self.apply_object(field, value, inner),
            None => {
                self.outcome.missing(field);
                None
            }
        }
    }

    /// An optional nested object.
    pub fn optional_object<T>(
        &mut self,
        field: &str,
        inner: impl FnOnce(&mut RecordValidator<'a>) -> Option<T>,
    ) -> Option<T> {
        let input = self.input;
        let value = input.get(field)?;
        self.apply_object(field, value, inner)
    }

    pub fn finish(self) -> OutcomeBuilder {
        self.outcome
    }

    fn apply<R: FieldRule>(&mut self, field: &str, value: &Value, rule: &R) -> Option<R::Output> {
        let parsed = rule.parse(value);
        if parsed.is_none() {
            self.outcome.invalid(field);
        }
        parsed
    }

    fn apply_object<T>(
        &mut self,
        field: &str,
        value: &'a Value,
        inner: impl FnOnce(&mut RecordValidator<'a>) -> Option<T>,
    ) -> Option<T> {
        let Some(object) = value.as_object() else {
            self.outcome.invalid(field);
            return None;
        };
        let mut nested = RecordValidator::new(object);
        let parsed = inner(&mut nested);
        self.outcome.nest(field, nested.finish());
        parsed
    }
}

/// `location` object: `type` and `coordinates` are checked independently.
fn location(record: &mut RecordValidator<'_>) -> Option<GeoPoint> {
    let kind = record.required("type", &PointType);
    let point = record.required("coordinates", &PointCoordinates);
    kind.and(point)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Event Validators
// ═══════════════════════════════════════════════════════════════════════════════

/// Validate a creation request and attach a fresh key on success.
pub fn validate_for_create(input: &Map<String, Value>) -> ValidationResult<NewEvent> {
    let mut record = RecordValidator::new(input);

    let begin = record.required("begin_timestamp", &Timestamp);
    let end = record.optional("end_timestamp", &Timestamp);
    let point = record.required_object("location", location);
    let description = record.required("description", &Description);

    let outcome = record.finish();
    match (begin, point, description) {
        (Some(begin), Some(point), Some(description)) if outcome.is_valid() => {
            Ok(NewEvent::new(begin, end, point, description))
        }
        _ => Err(outcome.into_errors()),
    }
}

/// Validate a partial update. Fields that are absent stay unset.
pub fn validate_for_update(input: &Map<String, Value>) -> ValidationResult<EventPatch> {
    let mut record = RecordValidator::new(input);

    if !MUTABLE_FIELDS.iter().any(|field| record.contains(field)) {
        let mut outcome = record.finish();
        outcome.no_update_fields();
        return Err(outcome.into_errors());
    }

    let begin = record.optional("begin_timestamp", &Timestamp);
    let end = record.optional("end_timestamp", &Timestamp);
    let point = record.optional_object("location", location);
    let description = record.optional("description", &Description);

    record.finish().result()?;
    Ok(EventPatch::new(begin, end, point, description))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
