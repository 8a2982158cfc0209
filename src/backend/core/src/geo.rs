//! Great-circle distance helpers used by the in-process collection.

use std::f64::consts::PI;

/// Mean Earth radius, matching the spherical model of 2dsphere indexes.
pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

/// Haversine distance between two lat/lng points in metres.
pub fn haversine_distance_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let to_rad = |deg: f64| deg * PI / 180.0;

    let dlat = to_rad(lat2 - lat1);
    let dlng = to_rad(lng2 - lng1);

    let a = (dlat / 2.0).sin().powi(2)
        + to_rad(lat1).cos() * to_rad(lat2).cos() * (dlng / 2.0).sin().powi(2);

    // Rounding can push `a` a hair above 1 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();
    EARTH_RADIUS_METERS * c
}
