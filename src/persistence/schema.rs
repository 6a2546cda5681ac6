//! Keyed store database schema.

/// SQL to create the match events table and its count index.
///
/// `event_id` is the primary key used for upserts; the composite index
/// serves the `(match_id, event_type)` count queries.
pub const CREATE_MATCH_EVENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS match_events (
    event_id    TEXT PRIMARY KEY,
    match_id    TEXT NOT NULL,
    event_type  TEXT NOT NULL,
    team        TEXT NOT NULL,
    player      TEXT NOT NULL,
    timestamp   TEXT NOT NULL,
    season      TEXT,
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS match_events_match_id_event_type_idx
    ON match_events (match_id, event_type);
";

/// Upsert of one stored item. Re-applying the same item leaves the row
/// unchanged apart from `updated_at`.
pub const UPSERT_MATCH_EVENT: &str = r"
INSERT INTO match_events (event_id, match_id, event_type, team, player, timestamp, season)
VALUES ($1, $2, $3, $4, $5, $6, $7)
ON CONFLICT (event_id) DO UPDATE SET
    match_id   = EXCLUDED.match_id,
    event_type = EXCLUDED.event_type,
    team       = EXCLUDED.team,
    player     = EXCLUDED.player,
    timestamp  = EXCLUDED.timestamp,
    season     = EXCLUDED.season,
    updated_at = NOW()
";
