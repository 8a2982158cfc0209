//! Field rules for event attributes.
//!
//! Each rule parses one raw JSON value and yields the typed value on success.
//! `None` always means the value is present but unusable; absence is handled by
//! the caller so that it can be reported as `Missing` instead.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

use crate::events::{GeoPoint, POINT_TYPE};

// ═══════════════════════════════════════════════════════════════════════════════
// Constants and Pre-compiled Patterns
// ═══════════════════════════════════════════════════════════════════════════════

/// Longest description accepted, counted in characters after trimming.
pub const DESCRIPTION_MAX_LENGTH: usize = 1024;

/// Description allow-list, anchored for a full-string match.
static DESCRIPTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9 ,.'!?]*$").expect("Invalid description regex")
});

/// ISO-8601 extended format: `2020-11-10T09:00:00.000+02:00` down to `2020-11-10`.
static ISO_EXTENDED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<year>\d{4})-(?P<month>\d{2})-(?P<day>\d{2})",
        r"(?:[Tt ](?P<hour>\d{2})(?::(?P<minute>\d{2})(?::(?P<second>\d{2})(?:[.,](?P<fraction>\d{1,9}))?)?)?",
        r"(?P<offset>[Zz]|[+-]\d{2}(?::?\d{2})?)?)?$",
    ))
    .expect("Invalid ISO-8601 extended regex")
});

/// ISO-8601 basic format: `20201110T090000Z` down to `20201110`.
static ISO_BASIC_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<year>\d{4})(?P<month>\d{2})(?P<day>\d{2})",
        r"(?:[Tt](?P<hour>\d{2})(?:(?P<minute>\d{2})(?:(?P<second>\d{2})(?:[.,](?P<fraction>\d{1,9}))?)?)?",
        r"(?P<offset>[Zz]|[+-]\d{2}(?::?\d{2})?)?)?$",
    ))
    .expect("Invalid ISO-8601 basic regex")
});

// ═══════════════════════════════════════════════════════════════════════════════
// Field Rule Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// A rule that turns a raw JSON value into a typed field.
pub trait FieldRule {
    type Output;

    /// Parse the value, returning `None` when it is invalid.
    fn parse(&self, value: &Value) -> Option<Self::Output>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Timestamp Rule
// ═══════════════════════════════════════════════════════════════════════════════

/// ISO-8601 timestamp string, normalized to UTC.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp;

impl FieldRule for Timestamp {
    type Output = DateTime<Utc>;

    fn parse(&self, value: &Value) -> Option<Self::Output> {
        value.as_str().and_then(valid_time)
    }
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts the extended and basic formats at hour, minute, second or
/// fractional precision, each with an optional `Z` or numeric offset. A
/// timestamp without an offset is taken as UTC; a bare date is midnight UTC.
pub fn valid_time(input: &str) -> Option<DateTime<Utc>> {
    let parts = ISO_EXTENDED_REGEX
        .captures(input)
        .or_else(|| ISO_BASIC_REGEX.captures(input))?;

    let date = NaiveDate::from_ymd_opt(
        number(&parts, "year")? as i32,
        number(&parts, "month")?,
        number(&parts, "day")?,
    )?;
    let time = NaiveTime::from_hms_nano_opt(
        number(&parts, "hour").unwrap_or(0),
        number(&parts, "minute").unwrap_or(0),
        number(&parts, "second").unwrap_or(0),
        parts.name("fraction").map_or(Some(0), |m| nanoseconds(m.as_str()))?,
    )?;
    let offset = match parts.name("offset") {
        Some(designator) => utc_offset(designator.as_str())?,
        None => FixedOffset::east_opt(0)?,
    };

    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|local| local.with_timezone(&Utc))
}

fn number(parts: &Captures<'_>, name: &str) -> Option<u32> {
    parts.name(name)?.as_str().parse().ok()
}

/// Right-pad a fractional second to nanoseconds.
fn nanoseconds(fraction: &str) -> Option<u32> {
    format!("{:0<9}", fraction).parse().ok()
}

/// `Z`, `±HH`, `±HHMM` or `±HH:MM`.
fn utc_offset(designator: &str) -> Option<FixedOffset> {
    if designator.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }

    let (sign, digits) = designator.split_at(1);
    let digits = digits.replace(':', "");
    let hours: i32 = digits.get(..2)?.parse().ok()?;
    let minutes: i32 = match digits.get(2..) {
        Some("") | None => 0,
        Some(rest) => rest.parse().ok()?,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }

    let seconds = hours * 3600 + minutes * 60;
    FixedOffset::east_opt(if sign == "-" { -seconds } else { seconds })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Point Rules
// ═══════════════════════════════════════════════════════════════════════════════

/// `[longitude, latitude]` array forming a valid point.
#[derive(Debug, Clone, Copy)]
pub struct PointCoordinates;

impl FieldRule for PointCoordinates {
    type Output = GeoPoint;

    fn parse(&self, value: &Value) -> Option<Self::Output> {
        valid_point_coords(value)
    }
}

/// Validate a GeoJSON point coordinate pair.
pub fn valid_point_coords(value: &Value) -> Option<GeoPoint> {
    match value.as_array()?.as_slice() {
        [Value::Number(longitude), Value::Number(latitude)] => {
            GeoPoint::new(longitude.as_f64()?, latitude.as_f64()?)
        }
        _ => None,
    }
}

/// The geometry type literal, `"point"` in any letter case.
#[derive(Debug, Clone, Copy)]
pub struct PointType;

impl FieldRule for PointType {
    type Output = ();

    fn parse(&self, value: &Value) -> Option<Self::Output> {
        value
            .as_str()
            .filter(|kind| kind.eq_ignore_ascii_case(POINT_TYPE))
            .map(|_| ())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Description Rule
// ═══════════════════════════════════════════════════════════════════════════════

/// Trimmed free text within the length limit and character allow-list.
#[derive(Debug, Clone, Copy)]
pub struct Description;

impl FieldRule for Description {
    type Output = String;

    fn parse(&self, value: &Value) -> Option<Self::Output> {
        value.as_str().and_then(valid_description)
    }
}

/// Trim and validate a description.
pub fn valid_description(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.chars().count() > DESCRIPTION_MAX_LENGTH {
        return None;
    }
    DESCRIPTION_REGEX
        .is_match(trimmed)
        .then(|| trimmed.to_string())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_time_rfc3339_variants() {
        let expected = Utc.with_ymd_and_hms(2020, 11, 10, 9, 0, 0).unwrap();
        assert_eq!(valid_time("2020-11-10T09:00:00Z"), Some(expected));
        assert_eq!(valid_time("2020-11-10T09:00:00.000Z"), Some(expected));
        assert_eq!(valid_time("2020-11-10T11:00:00+02:00"), Some(expected));
        assert_eq!(valid_time("2020-11-10 09:00:00Z"), Some(expected));
    }

    #[test]
    fn test_time_reduced_precision_with_offset() {
        let expected = Utc.with_ymd_and_hms(2020, 11, 10, 9, 0, 0).unwrap();
        assert_eq!(valid_time("2020-11-10T09:00Z"), Some(expected));
        assert_eq!(valid_time("2020-11-10T11:00+02:00"), Some(expected));
        assert_eq!(valid_time("2020-11-10T09Z"), Some(expected));
        assert_eq!(valid_time("2020-11-10T09"), Some(expected));
        assert_eq!(valid_time("2020-11-10T04:30-0430"), Some(expected));
        assert_eq!(valid_time("2020-11-10T12+03"), Some(expected));
    }

    #[test]
    fn test_time_basic_format() {
        let expected = Utc.with_ymd_and_hms(2020, 11, 10, 9, 0, 0).unwrap();
        assert_eq!(valid_time("20201110T090000Z"), Some(expected));
        assert_eq!(valid_time("20201110T110000+0200"), Some(expected));
        assert_eq!(valid_time("20201110T0900"), Some(expected));
        assert_eq!(valid_time("20201110T09"), Some(expected));
        assert_eq!(
            valid_time("20201110"),
            Some(Utc.with_ymd_and_hms(2020, 11, 10, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_time_fractional_seconds() {
        let parsed = valid_time("2020-11-10T09:00:00.25Z").unwrap();
        assert_eq!(parsed.timestamp_subsec_millis(), 250);
        let parsed = valid_time("2020-11-10T09:00:00,123456Z").unwrap();
        assert_eq!(parsed.timestamp_subsec_micros(), 123_456);
    }

    #[test]
    fn test_time_naive_forms_are_utc() {
        assert_eq!(
            valid_time("2020-11-10T09:30:15"),
            Some(Utc.with_ymd_and_hms(2020, 11, 10, 9, 30, 15).unwrap())
        );
        assert_eq!(
            valid_time("2020-11-10T09:30"),
            Some(Utc.with_ymd_and_hms(2020, 11, 10, 9, 30, 0).unwrap())
        );
        assert_eq!(
            valid_time("2020-11-10"),
            Some(Utc.with_ymd_and_hms(2020, 11, 10, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_time_rejects_garbage() {
        assert!(valid_time("").is_none());
        assert!(valid_time("yesterday").is_none());
        assert!(valid_time("2020-13-01").is_none());
        assert!(valid_time("2020-02-30T00:00:00Z").is_none());
        assert!(valid_time("2020-11-10T25:00:00Z").is_none());
        assert!(valid_time("2020-11-10T09:00:00+25:00").is_none());
        assert!(valid_time("2020-1110").is_none());
        assert!(valid_time("2020-11-10Z").is_none());
        assert!(valid_time("2020-11-10T09:00:00 Z").is_none());
    }

    #[test]
    fn test_timestamp_rule_rejects_non_strings() {
        assert!(Timestamp.parse(&json!(1605000000)).is_none());
        assert!(Timestamp.parse(&Value::Null).is_none());
        assert!(Timestamp.parse(&json!("2020-11-10")).is_some());
    }

    #[test]
    fn test_point_coords() {
        let point = valid_point_coords(&json!([-117.923667, 33.809173])).unwrap();
        assert_eq!(point.longitude(), -117.923667);
        assert_eq!(point.latitude(), 33.809173);
        assert!(valid_point_coords(&json!([0, 0])).is_some());
    }

    #[test]
    fn test_point_coords_rejects_bad_shapes() {
        assert!(valid_point_coords(&json!([1.0])).is_none());
        assert!(valid_point_coords(&json!([1.0, 2.0, 3.0])).is_none());
        assert!(valid_point_coords(&json!(["1.0", 2.0])).is_none());
        assert!(valid_point_coords(&json!([true, false])).is_none());
        assert!(valid_point_coords(&json!({"lon": 1.0, "lat": 2.0})).is_none());
        assert!(valid_point_coords(&json!("1.0,2.0")).is_none());
    }

    #[test]
    fn test_point_coords_rejects_out_of_range() {
        assert!(valid_point_coords(&json!([181.0, 0.0])).is_none());
        assert!(valid_point_coords(&json!([0.0, 91.0])).is_none());
    }

    #[test]
    fn test_point_type_is_case_insensitive() {
        assert!(PointType.parse(&json!("Point")).is_some());
        assert!(PointType.parse(&json!("POINT")).is_some());
        assert!(PointType.parse(&json!("point")).is_some());
        assert!(PointType.parse(&json!("Polygon")).is_none());
        assert!(PointType.parse(&json!(1)).is_none());
    }

    #[test]
    fn test_description_trims() {
        assert_eq!(valid_description("  Hello, world!  "), Some("Hello, world!".to_string()));
        assert_eq!(valid_description("   "), Some(String::new()));
    }

    #[test]
    fn test_description_length_boundary() {
        let at_limit = "a".repeat(DESCRIPTION_MAX_LENGTH);
        let over_limit = "a".repeat(DESCRIPTION_MAX_LENGTH + 1);
        assert!(valid_description(&at_limit).is_some());
        assert!(valid_description(&over_limit).is_none());
        assert!(valid_description(&format!("  {}  ", at_limit)).is_some());
    }

    #[test]
    fn test_description_allow_list() {
        assert!(valid_description("It's fine. Really? Yes!").is_some());
        assert!(valid_description("a;b").is_none());
        assert!(valid_description("***").is_none());
        assert!(valid_description("line\nbreak").is_none());
        assert!(valid_description("caf\u{e9}").is_none());
    }

    #[test]
    fn test_description_rule_rejects_non_strings() {
        assert!(Description.parse(&json!(42)).is_none());
        assert!(Description.parse(&json!(["a"])).is_none());
    }
}
