//! Field-level validation errors.
//!
//! Each failing field path (e.g. `location.coordinates`) maps to exactly one
//! [`ValidationErrorKind`]. Several fields may fail in the same pass.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// Validation Error Types
// ═══════════════════════════════════════════════════════════════════════════════

/// Field path reported when an update carries no mutable field.
pub const UPDATE_FIELDS: &str = "update_fields";

/// The kind of validation error recorded for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// A required field is absent.
    Missing,
    /// A field is present but does not parse.
    Invalid,
    /// An update names none of the mutable fields.
    #[serde(rename = "None")]
    NoUpdateFields,
}

impl ValidationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "Missing",
            Self::Invalid => "Invalid",
            Self::NoUpdateFields => "None",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Validation Errors Collection
// ═══════════════════════════════════════════════════════════════════════════════

/// Validation errors keyed by field path, in stable (sorted) order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, ValidationErrorKind>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Record `kind` for `field`, replacing any earlier entry.
    pub fn add(&mut self, field: impl Into<String>, kind: ValidationErrorKind) {
        self.errors.insert(field.into(), kind);
    }

    pub fn get(&self, field: &str) -> Option<ValidationErrorKind> {
        self.errors.get(field).copied()
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Merge errors with a field prefix (for nested objects).
    pub fn merge_with_prefix(&mut self, prefix: &str, other: ValidationErrors) {
        for (field, kind) in other.errors {
            let prefixed = if field.is_empty() {
                prefix.to_string()
            } else {
                format!("{}.{}", prefix, field)
            };
            self.errors.insert(prefixed, kind);
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &String> {
        self.errors.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ValidationErrorKind)> {
        self.errors.iter()
    }

    /// Field path to error label, as sent to clients.
    pub fn to_message_map(&self) -> BTreeMap<String, String> {
        self.errors
            .iter()
            .map(|(field, kind)| (field.clone(), kind.to_string()))
            .collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .errors
            .iter()
            .map(|(field, kind)| format!("{}: {}", field, kind))
            .collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = (String, ValidationErrorKind);
    type IntoIter = std::collections::btree_map::IntoIter<String, ValidationErrorKind>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Validation Result Type
// ═══════════════════════════════════════════════════════════════════════════════

/// Result type for validation operations.
pub type ValidationResult<T> = std::result::Result<T, ValidationErrors>;

// ═══════════════════════════════════════════════════════════════════════════════
// Outcome Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Accumulates field failures during one validation pass.
///
/// The outcome is valid exactly when no failure has been recorded.
#[derive(Debug, Default)]
pub struct OutcomeBuilder {
    errors: ValidationErrors,
}

impl OutcomeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn missing(&mut self, field: impl Into<String>) -> &mut Self {
        self.errors.add(field, ValidationErrorKind::Missing);
        self
    }

    pub fn invalid(&mut self, field: impl Into<String>) -> &mut Self {
        self.errors.add(field, ValidationErrorKind::Invalid);
        self
    }

    pub fn no_update_fields(&mut self) -> &mut Self {
        self.errors.add(UPDATE_FIELDS, ValidationErrorKind::NoUpdateFields);
        self
    }

    /// Fold a nested object's outcome in under `prefix`.
    pub fn nest(&mut self, prefix: &str, nested: OutcomeBuilder) -> &mut Self {
        self.errors.merge_with_prefix(prefix, nested.errors);
        self
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }

    /// `Ok(())` if nothing failed, the collected errors otherwise.
    pub fn result(self) -> ValidationResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
