//! Opaque match-event identifier.
//!
//! [`EventId`] is a newtype over the string form of the identifier so that
//! event ids cannot be confused with match ids or other free-form strings.
//! Ids supplied by clients are kept verbatim; generated ids are UUID v4.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier of a match event.
///
/// Assigned once at validation time and never reassigned. It is the
/// primary key of the keyed store and the idempotency key for upserts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Generates a fresh random identifier (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<EventId> for String {
    fn from(id: EventId) -> Self {
        id.0
    }
}
