//! Match-event submission validation.
//!
//! Pure: no I/O, and deterministic apart from id generation. Fields are
//! checked in declaration order and only the first violation is reported.

use serde_json::{Map, Value};

use super::timestamp::{TIMESTAMP_FORMAT, parse_timestamp};
use super::{EventId, EventType, MatchEvent};
use crate::error::ValidationError;

const FIELD_REQUIRED: &str = "Field required";
const NOT_A_STRING: &str = "Input should be a valid string";
const EMPTY_FIELD: &str = "Field must not be empty";
const CONTAINS_NUL: &str = "Field must not contain NUL characters";
const EVENT_ID_TOO_LONG: &str = "Event id must be at most 128 characters";
const EVENT_ID_CHARSET: &str = "Event id may only contain letters, digits, '-' and '_'";

/// Longest accepted event id, in bytes.
pub const EVENT_ID_MAX_LEN: usize = 128;

/// Parses and validates a raw submission body into a [`MatchEvent`].
///
/// A missing `event_id` is replaced with a freshly generated one.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming the first field that is missing,
/// not a string, contains NUL, or breaks its own rule: an identifier-safe
/// `event_id` of at most [`EVENT_ID_MAX_LEN`] bytes, a digit-only
/// `match_id`, a supported `event_type`, a non-empty `team`/`player` and
/// the exact timestamp format.
pub fn validate(raw: &[u8]) -> Result<MatchEvent, ValidationError> {
    let body: Value = serde_json::from_slice(raw)
        .map_err(|e| ValidationError::new("body", format!("Invalid JSON: {e}")))?;
    let Value::Object(fields) = body else {
        return Err(ValidationError::new(
            "body",
            "Input should be a valid dictionary",
        ));
    };

    let event_id = match fields.get("event_id") {
        None | Some(Value::Null) => EventId::generate(),
        Some(_) => {
            let id = non_empty(&fields, "event_id")?;
            check_event_id(id)?;
            EventId::from(id)
        }
    };

    let match_id = string_field(&fields, "match_id")?;
    if match_id.is_empty() || !match_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new(
            "match_id",
            "All characters in the Match id must be integers",
        ));
    }

    let raw_type = string_field(&fields, "event_type")?;
    let event_type: EventType = raw_type.parse().map_err(|_| {
        let supported: Vec<&str> = EventType::ALL.iter().map(EventType::as_str).collect();
        ValidationError::new(
            "event_type",
            format!(
                "Invalid event_type: {raw_type}. Must be one of {}",
                supported.join(", ")
            ),
        )
    })?;

    let team = non_empty(&fields, "team")?;
    let player = non_empty(&fields, "player")?;

    let timestamp = string_field(&fields, "timestamp")?;
    if parse_timestamp(timestamp).is_err() {
        return Err(ValidationError::new(
            "timestamp",
            format!("Timestamp must be in format '{TIMESTAMP_FORMAT}'"),
        ));
    }

    Ok(MatchEvent {
        event_id,
        match_id: match_id.to_string(),
        event_type,
        team: team.to_string(),
        player: player.to_string(),
        timestamp: timestamp.to_string(),
    })
}

/// Checks that `id` can serve as a store key and an archive object name.
///
/// # Errors
///
/// Returns a [`ValidationError`] on field `event_id` if the id is empty,
/// longer than [`EVENT_ID_MAX_LEN`] bytes, or holds anything other than
/// ASCII letters, digits, `-` and `_`.
pub fn check_event_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::new("event_id", EMPTY_FIELD));
    }
    if id.len() > EVENT_ID_MAX_LEN {
        return Err(ValidationError::new("event_id", EVENT_ID_TOO_LONG));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::new("event_id", EVENT_ID_CHARSET));
    }
    Ok(())
}

/// Re-checks an already decoded event against the rules its stored form
/// depends on: the event id rules and no NUL in any text field.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming the first offending field.
pub fn check_storable(event: &MatchEvent) -> Result<(), ValidationError> {
    check_event_id(event.event_id.as_str())?;
    let fields = [
        ("match_id", event.match_id.as_str()),
        ("team", event.team.as_str()),
        ("player", event.player.as_str()),
        ("timestamp", event.timestamp.as_str()),
    ];
    for (name, value) in fields {
        reject_nul(name, value)?;
    }
    Ok(())
}

fn reject_nul(name: &str, value: &str) -> Result<(), ValidationError> {
    if value.contains('\0') {
        return Err(ValidationError::new(name, CONTAINS_NUL));
    }
    Ok(())
}

fn string_field<'a>(
    fields: &'a Map<String, Value>,
    name: &str,
) -> Result<&'a str, ValidationError> {
    match fields.get(name) {
        None => Err(ValidationError::new(name, FIELD_REQUIRED)),
        Some(Value::String(s)) => {
            reject_nul(name, s)?;
            Ok(s)
        }
        Some(_) => Err(ValidationError::new(name, NOT_A_STRING)),
    }
}

fn non_empty<'a>(
    fields: &'a Map<String, Value>,
    name: &str,
) -> Result<&'a str, ValidationError> {
    let value = string_field(fields, name)?;
    if value.is_empty() {
        return Err(ValidationError::new(name, EMPTY_FIELD));
    }
    Ok(value)
}
