//! Order date normalization and the UTC day windows used by sales analytics.
//!
//! Orders reach the store from clients that do not agree on a date format,
//! so `orderDate` is normalized to a `DateTime<Utc>` as soon as it is
//! deserialized. Accepted shapes:
//!
//! - RFC 3339 (`2024-01-05T10:30:00Z`, `2024-01-05T10:30:00+02:00`)
//! - naive date-time, read as UTC (`2024-01-05T10:30:00`, `2024-01-05 10:30:00.250`)
//! - bare calendar date, read as UTC midnight (`2024-01-05`)
//! - integer milliseconds since the Unix epoch
//! - `null`, which means the order has no date
//!
//! Dates are stored back as RFC 3339, so only years 0000 through 9999 are
//! accepted; anything outside that range could not be read again.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

use crate::analytics_error::AnalyticsError;

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

const WINDOW_DAY_FORMAT: &str = "%Y-%m-%d";

const STORABLE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Normalizes a textual order date to UTC.
pub fn normalize_order_date(raw: &str) -> Option<DateTime<Utc>> {
    parse_order_date(raw.trim()).filter(is_storable)
}

/// True when the date survives an RFC 3339 write and read.
pub fn is_storable(date: &DateTime<Utc>) -> bool {
    STORABLE_YEARS.contains(&date.year())
}

fn parse_order_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(raw, WINDOW_DAY_FORMAT)
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| Utc.from_utc_datetime(&midnight))
}

/// Serde hook for `Order::order_date`.
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<JsonValue>::deserialize(deserializer)? {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(raw)) => normalize_order_date(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("unrecognized orderDate: {raw:?}"))),
        Some(JsonValue::Number(millis)) => millis
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .filter(is_storable)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("orderDate out of range: {millis}"))),
        Some(other) => Err(D::Error::custom(format!(
            "orderDate must be a string or epoch milliseconds, got {other}"
        ))),
    }
}

/// Strict `YYYY-MM-DD` parse for analytics window bounds.
pub fn parse_window_day(raw: &str) -> Result<NaiveDate, AnalyticsError> {
    NaiveDate::parse_from_str(raw.trim(), WINDOW_DAY_FORMAT).map_err(|e| {
        AnalyticsError::validation(format!(
            "Invalid date {raw:?}, expected YYYY-MM-DD: {e}"
        ))
    })
}

/// Inclusive window `[start 00:00:00Z, end 23:59:59Z]`.
///
/// An inverted range is returned as-is; it simply matches nothing.
pub fn day_window(start: NaiveDate, end: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), AnalyticsError> {
    let from = start
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| AnalyticsError::validation(format!("No midnight for {start}")))?;
    let to = end
        .and_hms_opt(23, 59, 59)
        .ok_or_else(|| AnalyticsError::validation(format!("No end of day for {end}")))?;

    Ok((Utc.from_utc_datetime(&from), Utc.from_utc_datetime(&to)))
}
