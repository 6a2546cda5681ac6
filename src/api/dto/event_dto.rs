//! Match-event ingest and count DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::service::EventCount;

/// Message returned for every accepted submission.
pub const INGESTED_OK: &str = "Match event ingested OK";

/// Submission body for `POST /matches/event`.
///
/// Documentation only: the handler validates the raw body itself so it can
/// report the first violated rule.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MatchEventRequest {
    /// Optional client-supplied id; generated when absent.
    #[schema(example = "3f0c2b0e-5d3b-4c3e-9a59-8f1d0c7e2a11")]
    pub event_id: Option<String>,
    /// Match identifier, digits only.
    #[schema(example = "000001")]
    pub match_id: String,
    /// One of `goal`, `pass`, `foul`.
    #[schema(example = "goal")]
    pub event_type: String,
    /// Team name.
    #[schema(example = "Team A")]
    pub team: String,
    /// Player name.
    #[schema(example = "Player 1")]
    pub player: String,
    /// `YYYY-MM-DDTHH:MM:SS±ZZZZ`.
    #[schema(example = "2024-02-15T13:30:00+0000")]
    pub timestamp: String,
}

/// Response to an accepted submission.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngestResponse {
    /// Always [`INGESTED_OK`].
    pub message: String,
    /// Id of the accepted event.
    pub event_id: String,
}

/// Response of `GET /matches/{match_id}/{kind}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventCountResponse {
    /// Match the count is for.
    pub match_id: String,
    /// Normalized event type.
    pub event_type: String,
    /// Number of stored events.
    pub count: u64,
}

impl From<EventCount> for EventCountResponse {
    fn from(count: EventCount) -> Self {
        Self {
            match_id: count.match_id,
            event_type: count.event_type,
            count: count.count,
        }
    }
}
