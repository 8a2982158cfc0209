//! Backend-neutral filters and updates over event documents.

use chrono::{DateTime, Utc};

use crate::events::{EventDocument, EventKey, EventPatch, GeoPoint};

// ═══════════════════════════════════════════════════════════════════════════════
// Predicates
// ═══════════════════════════════════════════════════════════════════════════════

/// Half-open interval `[start, end)` on `begin_timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        *timestamp >= self.start && *timestamp < self.end
    }
}

/// Proximity predicate: within `max_distance` metres of a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub max_distance: f64,
}

impl NearPoint {
    pub fn new(latitude: f64, longitude: f64, max_distance: f64) -> Self {
        Self {
            latitude,
            longitude,
            max_distance,
        }
    }

    /// Centre in stored order, `[longitude, latitude]`.
    pub fn coordinates(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// The centre as a point, if the coordinates are in range.
    pub fn center(&self) -> Option<GeoPoint> {
        let [longitude, latitude] = self.coordinates();
        GeoPoint::new(longitude, latitude)
    }

    /// A usable centre and a non-negative, finite radius.
    pub fn is_valid(&self) -> bool {
        self.center().is_some() && self.max_distance.is_finite() && self.max_distance >= 0.0
    }

    /// Distance from the centre in metres, `None` for an unusable centre.
    pub fn distance_to(&self, point: &GeoPoint) -> Option<f64> {
        self.center().map(|center| center.distance_meters(point))
    }
}

/// Conjunction of optional predicates over stored documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub key: Option<EventKey>,
    pub deleted: Option<bool>,
    pub begin_within: Option<TimeRange>,
    pub near: Option<NearPoint>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_key(key: EventKey) -> Self {
        Self {
            key: Some(key),
            ..Self::default()
        }
    }

    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.begin_within = Some(range);
        self
    }

    pub fn with_near(mut self, near: NearPoint) -> Self {
        self.near = Some(near);
        self
    }

    pub fn with_deleted(mut self, deleted: bool) -> Self {
        self.deleted = Some(deleted);
        self
    }

    /// Evaluate every set predicate against `document`.
    pub fn matches(&self, document: &EventDocument) -> bool {
        if let Some(key) = &self.key {
            if &document.key != key {
                return false;
            }
        }
        if let Some(deleted) = self.deleted {
            if document.deleted != deleted {
                return false;
            }
        }
        if let Some(range) = &self.begin_within {
            if !range.contains(&document.begin_timestamp) {
                return false;
            }
        }
        if let Some(near) = &self.near {
            match near.distance_to(&document.location) {
                Some(distance) if distance <= near.max_distance => {}
                _ => return false,
            }
        }
        true
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Updates
// ═══════════════════════════════════════════════════════════════════════════════

/// Partial `$set` over a document. Unset fields keep their stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub begin_timestamp: Option<DateTime<Utc>>,
    pub end_timestamp: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
    pub description: Option<String>,
    pub deleted: Option<bool>,
    pub last_updated: DateTime<Utc>,
}

impl FieldUpdate {
    pub fn from_patch(patch: &EventPatch, now: DateTime<Utc>) -> Self {
        Self {
            begin_timestamp: patch.begin_timestamp(),
            end_timestamp: patch.end_timestamp(),
            location: patch.location(),
            description: patch.description().map(str::to_string),
            deleted: None,
            last_updated: now,
        }
    }

    pub fn soft_delete(now: DateTime<Utc>) -> Self {
        Self {
            begin_timestamp: None,
            end_timestamp: None,
            location: None,
            description: None,
            deleted: Some(true),
            last_updated: now,
        }
    }

    pub fn apply(&self, document: &mut EventDocument) {
        if let Some(begin) = self.begin_timestamp {
            document.begin_timestamp = begin;
        }
        if let Some(end) = self.end_timestamp {
            document.end_timestamp = Some(end);
        }
        if let Some(location) = self.location {
            document.location = location;
        }
        if let Some(description) = &self.description {
            document.description = description.clone();
        }
        if let Some(deleted) = self.deleted {
            document.deleted = deleted;
        }
        document.last_updated = Some(self.last_updated);
    }
}
