//! Match events and the records derived from them.
//!
//! A [`MatchEvent`] is created by the validator and then travels by value
//! through the log, the enricher and the storage writer. It ends up as a
//! [`StoredItem`] in the keyed store and as one element of an archived
//! batch.

use serde::{Deserialize, Serialize};

use super::{EventId, EventType};

/// A validated match event.
///
/// Immutable once validated. Its JSON encoding is the canonical log record
/// value and the element type of archived batches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvent {
    /// Identifier assigned at validation time.
    pub event_id: EventId,
    /// Match identifier, decimal digits only.
    pub match_id: String,
    /// Kind of event.
    pub event_type: EventType,
    /// Team the event is attributed to.
    pub team: String,
    /// Player the event is attributed to.
    pub player: String,
    /// Timestamp as submitted, `YYYY-MM-DDTHH:MM:SS±ZZZZ`.
    pub timestamp: String,
}

impl MatchEvent {
    /// Encodes the event as canonical JSON text.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes an event from its canonical JSON text.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if `text` is not a serialized event.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Data derived for one event during enrichment.
///
/// Never persisted on its own; merged into the [`StoredItem`] at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    /// Season label, `"YYYY-YYYY"`.
    pub season: String,
}

/// Keyed-store representation: event fields plus enrichment fields.
///
/// Keyed by `event_id`; writing the same item again is a no-op on the
/// logical state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredItem {
    /// The original event fields.
    #[serde(flatten)]
    pub event: MatchEvent,
    /// Season from enrichment, absent when no enrichment was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
}

impl StoredItem {
    /// Merges an event with its (optional) enrichment record.
    #[must_use]
    pub fn merge(event: MatchEvent, enrichment: Option<&EnrichmentRecord>) -> Self {
        Self {
            event,
            season: enrichment.map(|record| record.season.clone()),
        }
    }

    /// Returns the primary key of this item.
    #[must_use]
    pub fn key(&self) -> &EventId {
        &self.event.event_id
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn sample() -> MatchEvent {
        MatchEvent {
            event_id: EventId::from("evt-1"),
            match_id: "000001".to_string(),
            event_type: EventType::Goal,
            team: "Team A".to_string(),
            player: "Player 1".to_string(),
            timestamp: "2024-02-15T13:30:00+0000".to_string(),
        }
    }

    #[test]
    fn json_round_trip_is_field_for_field() {
        let event = sample();
        let Ok(json) = event.to_json() else {
            panic!("serialization failed");
        };
        let Ok(decoded) = MatchEvent::from_json(&json) else {
            panic!("deserialization failed");
        };
        assert_eq!(decoded, event);
    }

    #[test]
    fn stored_item_is_flat_union() {
        let item = StoredItem::merge(
            sample(),
            Some(&EnrichmentRecord {
                season: "2023-2024".to_string(),
            }),
        );
        let value = serde_json::to_value(&item).unwrap_or_default();
        assert_eq!(value["event_id"], "evt-1");
        assert_eq!(value["event_type"], "goal");
        assert_eq!(value["season"], "2023-2024");
        assert_eq!(value.as_object().map(serde_json::Map::len), Some(7));
    }

    #[test]
    fn stored_item_without_enrichment_omits_season() {
        let item = StoredItem::merge(sample(), None);
        let value = serde_json::to_value(&item).unwrap_or_default();
        assert!(value.get("season").is_none());
        assert_eq!(item.key().as_str(), "evt-1");
    }
}
