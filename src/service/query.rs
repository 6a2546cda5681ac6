//! Aggregate count queries over the keyed store.

use std::sync::Arc;

use serde::Serialize;

use crate::error::QueryError;
use crate::persistence::EventStore;

/// Count of stored events of one kind for one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventCount {
    /// Match the count is for.
    pub match_id: String,
    /// Normalized event kind.
    pub event_type: String,
    /// Number of stored events.
    pub count: u64,
}

/// Maps the plural path tokens onto event type names.
///
/// Only `goals` and `passes` are aliased; anything else is passed through
/// and simply counts zero when no such type is stored.
#[must_use]
pub fn normalize_event_kind(kind: &str) -> &str {
    match kind {
        "goals" => "goal",
        "passes" => "pass",
        other => other,
    }
}

/// Answers count queries from the keyed store's `(match_id, event_type)` index.
#[derive(Debug, Clone)]
pub struct QueryAggregator {
    store: Arc<dyn EventStore>,
}

impl QueryAggregator {
    /// Creates an aggregator reading from `store`.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Counts events of `kind` stored for `match_id`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidInput`] if `match_id` is empty or not
    /// all digits, or `kind` is empty, and [`QueryError::Backend`] if the
    /// store cannot answer.
    pub async fn count(&self, match_id: &str, kind: &str) -> Result<EventCount, QueryError> {
        if match_id.is_empty() || !match_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(QueryError::InvalidInput(format!(
                "match_id {match_id:?} must be a non-empty string of digits"
            )));
        }
        if kind.is_empty() {
            return Err(QueryError::InvalidInput("event kind must not be empty".to_string()));
        }

        let event_type = normalize_event_kind(kind);
        let count = self
            .store
            .count_by_match_and_type(match_id, event_type)
            .await
            .inspect_err(|e| {
                tracing::error!(match_id, event_type, error = %e, "count query failed");
            })?;

        tracing::info!(match_id, event_type, count, "counted match events");
        Ok(EventCount {
            match_id: match_id.to_string(),
            event_type: event_type.to_string(),
            count,
        })
    }
}
