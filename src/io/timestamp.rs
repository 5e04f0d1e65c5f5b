use crate::types::{ShadowError, ShadowResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Offset-free layouts accepted for capture times, all read as UTC
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    // EXIF DateTimeOriginal
    "%Y:%m:%d %H:%M:%S",
];

/// Resolve a capture-time string to a UTC instant.
///
/// Accepts RFC 3339 (any offset), ISO-8601 without offset, `YYYY-MM-DD HH:MM[:SS]`
/// and EXIF `YYYY:MM:DD HH:MM:SS`. Strings without an offset are taken as UTC.
pub fn parse_capture_time(time_str: &str) -> ShadowResult<DateTime<Utc>> {
    let trimmed = time_str.trim();
    if trimmed.is_empty() {
        return Err(ShadowError::InvalidTimestamp("empty capture time".to_string()));
    }

    if let Ok(time) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(time.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    log::warn!("Could not resolve capture time '{}'", trimmed);
    Err(ShadowError::InvalidTimestamp(format!(
        "'{}' is not a recognised UTC timestamp",
        trimmed
    )))
}

/// Resolve separate date and time fields (UTC) to an instant
pub fn resolve_capture_fields(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> ShadowResult<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| {
            ShadowError::InvalidTimestamp(format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02} is not a valid date/time",
                year, month, day, hour, minute, second
            ))
        })
}
