//! Strict event timestamp parsing.
//!
//! Accepted shape is `YYYY-MM-DDTHH:MM:SS±ZZZZ`: no fractional seconds and
//! a numeric UTC offset. `Z` is read as `+0000` and `±HH:MM` as `±HHMM`.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;

/// `strftime` pattern of a normalized event timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

#[allow(clippy::expect_used)]
static TIMESTAMP_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(Z|[+-][0-9]{2}:?[0-9]{2})$")
        .expect("timestamp pattern is a valid regex")
});

/// Returned when a timestamp does not match [`TIMESTAMP_FORMAT`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("timestamp {0:?} does not match {TIMESTAMP_FORMAT}")]
pub struct InvalidTimestamp(pub String);

/// Parses an event timestamp, keeping its original UTC offset.
///
/// # Errors
///
/// Returns [`InvalidTimestamp`] when the string does not have the exact
/// shape or does not name a real calendar instant (e.g. month 13).
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, InvalidTimestamp> {
    let invalid = || InvalidTimestamp(value.to_string());

    let offset = TIMESTAMP_SHAPE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .ok_or_else(invalid)?;

    let normalized_offset = match offset.as_str() {
        "Z" => "+0000".to_string(),
        other => other.replace(':', ""),
    };
    let local = value.get(..offset.start()).ok_or_else(invalid)?;
    let normalized = format!("{local}{normalized_offset}");

    DateTime::parse_from_str(&normalized, TIMESTAMP_FORMAT).map_err(|_| invalid())
}
