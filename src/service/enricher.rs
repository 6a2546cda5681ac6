//! Batch enrichment stage.
//!
//! All-or-nothing: any malformed or unstorable payload, or an unparseable
//! timestamp, fails the whole batch and nothing partial is returned.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{
    EnrichmentRecord, EventId, MatchEvent, check_storable, derive_season, parse_timestamp,
};
use crate::error::EnrichmentError;

/// Input handed from the consumer: serialized events in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichInput {
    /// One canonical JSON match event per element.
    pub match_events: Vec<String>,
}

/// Output handed to the storage stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichOutput {
    /// Decoded events, same order as the input.
    pub match_events: Vec<MatchEvent>,
    /// One enrichment record per event, keyed by its id.
    pub enriched_data: BTreeMap<EventId, EnrichmentRecord>,
}

/// Decodes every payload and derives its season.
///
/// # Errors
///
/// Returns [`EnrichmentError::Malformed`] for the first payload that is not
/// a serialized event, [`EnrichmentError::Unstorable`] for the first event
/// whose id or text fields cannot be stored, and
/// [`EnrichmentError::Timestamp`] for the first
/// event whose timestamp cannot be parsed.
pub fn enrich(input: &EnrichInput) -> Result<EnrichOutput, EnrichmentError> {
    let match_events = input
        .match_events
        .iter()
        .enumerate()
        .map(|(index, payload)| {
            let event = MatchEvent::from_json(payload)
                .map_err(|source| EnrichmentError::Malformed { index, source })?;
            check_storable(&event).map_err(|source| EnrichmentError::Unstorable { index, source })?;
            Ok(event)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut enriched_data = BTreeMap::new();
    for event in &match_events {
        let timestamp =
            parse_timestamp(&event.timestamp).map_err(|_| EnrichmentError::Timestamp {
                event_id: event.event_id.clone(),
                timestamp: event.timestamp.clone(),
            })?;
        let record = EnrichmentRecord {
            season: derive_season(&timestamp),
        };
        tracing::debug!(
            event_id = %event.event_id,
            season = %record.season,
            "enriched match event"
        );
        enriched_data.insert(event.event_id.clone(), record);
    }

    Ok(EnrichOutput {
        match_events,
        enriched_data,
    })
}
