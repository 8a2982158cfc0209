//! Space-time event types.
//!
//! This module provides:
//! - `EventKey` for addressing stored events
//! - `NewEvent` and `EventPatch`, only obtainable from a successful validation
//! - `EventDocument`, the stored shape
//! - `EventRecord`, the rendered shape returned to callers

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::point::GeoPoint;

// =============================================================================
// Event Keys
// =============================================================================

/// Opaque, immutable identifier of an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventKey(String);

impl EventKey {
    /// Generate a fresh UUID v4 key.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for EventKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EventKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for EventKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Validated Inputs
// =============================================================================

/// A fully validated event ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    key: EventKey,
    begin_timestamp: DateTime<Utc>,
    end_timestamp: Option<DateTime<Utc>>,
    location: GeoPoint,
    description: String,
}

impl NewEvent {
    pub(crate) fn new(
        begin_timestamp: DateTime<Utc>,
        end_timestamp: Option<DateTime<Utc>>,
        location: GeoPoint,
        description: String,
    ) -> Self {
        Self {
            key: EventKey::generate(),
            begin_timestamp,
            end_timestamp,
            location,
            description,
        }
    }

    pub fn key(&self) -> &EventKey {
        &self.key
    }

    pub fn begin_timestamp(&self) -> DateTime<Utc> {
        self.begin_timestamp
    }

    pub fn end_timestamp(&self) -> Option<DateTime<Utc>> {
        self.end_timestamp
    }

    pub fn location(&self) -> GeoPoint {
        self.location
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Stored form of this event: not deleted, never updated.
    pub fn into_document(self) -> EventDocument {
        EventDocument {
            key: self.key,
            deleted: false,
            begin_timestamp: self.begin_timestamp,
            end_timestamp: self.end_timestamp,
            location: self.location,
            description: self.description,
            last_updated: None,
        }
    }
}

/// A validated partial update. At least one field is always set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    begin_timestamp: Option<DateTime<Utc>>,
    end_timestamp: Option<DateTime<Utc>>,
    location: Option<GeoPoint>,
    description: Option<String>,
}

impl EventPatch {
    pub(crate) fn new(
        begin_timestamp: Option<DateTime<Utc>>,
        end_timestamp: Option<DateTime<Utc>>,
        location: Option<GeoPoint>,
        description: Option<String>,
    ) -> Self {
        Self {
            begin_timestamp,
            end_timestamp,
            location,
            description,
        }
    }

    pub fn begin_timestamp(&self) -> Option<DateTime<Utc>> {
        self.begin_timestamp
    }

    pub fn end_timestamp(&self) -> Option<DateTime<Utc>> {
        self.end_timestamp
    }

    pub fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.begin_timestamp.is_none()
            && self.end_timestamp.is_none()
            && self.location.is_none()
            && self.description.is_none()
    }

    /// Names of the fields this patch sets.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(4);
        if self.begin_timestamp.is_some() {
            names.push("begin_timestamp");
        }
        if self.end_timestamp.is_some() {
            names.push("end_timestamp");
        }
        if self.location.is_some() {
            names.push("location");
        }
        if self.description.is_some() {
            names.push("description");
        }
        names
    }
}

// =============================================================================
// Stored and Rendered Shapes
// =============================================================================

/// An event as held by a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDocument {
    pub key: EventKey,
    pub deleted: bool,
    pub begin_timestamp: DateTime<Utc>,
    pub end_timestamp: Option<DateTime<Utc>>,
    pub location: GeoPoint,
    pub description: String,
    pub last_updated: Option<DateTime<Utc>>,
}

impl EventDocument {
    /// Render for callers, dropping storage-only fields.
    pub fn render(&self) -> EventRecord {
        EventRecord {
            key: self.key.as_str().to_string(),
            begin_timestamp: render_timestamp(&self.begin_timestamp),
            end_timestamp: self.end_timestamp.as_ref().map(render_timestamp),
            location: self.location,
            description: self.description.clone(),
            deleted: self.deleted,
        }
    }
}

/// The payload returned by every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub key: String,
    pub begin_timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<String>,
    pub location: GeoPoint,
    pub description: String,
    pub deleted: bool,
}

/// RFC 3339, UTC, `Z` suffix, fractional seconds only when present.
pub fn render_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
