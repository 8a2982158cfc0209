//! GeoJSON point locations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geo::haversine_distance_meters;

/// GeoJSON geometry type written for every stored and rendered location.
pub const POINT_TYPE: &str = "Point";

/// A structurally valid geographic point.
///
/// Coordinates follow the GeoJSON order `(longitude, latitude)`. Construction
/// goes through [`GeoPoint::new`], so a `GeoPoint` always holds finite values
/// inside the WGS84 ranges.
///
/// ```json
/// { "type": "Point", "coordinates": [-117.923667, 33.809173] }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GeoJsonPoint", into = "GeoJsonPoint")]
pub struct GeoPoint {
    longitude: f64,
    latitude: f64,
}

impl GeoPoint {
    /// Build a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(longitude: f64, latitude: f64) -> Option<Self> {
        if !longitude.is_finite() || !latitude.is_finite() {
            return None;
        }
        if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
            return None;
        }
        Some(Self { longitude, latitude })
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Coordinates in stored order: `[longitude, latitude]`.
    pub fn coordinates(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// Great-circle distance to `other` in metres.
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        haversine_distance_meters(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.longitude, self.latitude)
    }
}

/// Wire form of a [`GeoPoint`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeoJsonPoint {
    #[serde(rename = "type")]
    kind: String,
    coordinates: [f64; 2],
}

impl From<GeoPoint> for GeoJsonPoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            kind: POINT_TYPE.to_string(),
            coordinates: point.coordinates(),
        }
    }
}

impl TryFrom<GeoJsonPoint> for GeoPoint {
    type Error = String;

    fn try_from(value: GeoJsonPoint) -> Result<Self, Self::Error> {
        if !value.kind.eq_ignore_ascii_case(POINT_TYPE) {
            return Err(format!("unsupported geometry type: {}", value.kind));
        }
        let [longitude, latitude] = value.coordinates;
        GeoPoint::new(longitude, latitude)
            .ok_or_else(|| format!("coordinates out of range: [{}, {}]", longitude, latitude))
    }
}
