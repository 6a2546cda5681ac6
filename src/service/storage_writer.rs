//! Dual-destination storage stage.
//!
//! Writes go to the keyed store first and the archive second. They are not
//! transactional: if the archive write fails after the upserts succeeded,
//! the batch is queryable but not archived until it is redelivered and
//! stored again. Nothing is rolled back.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::{EnrichmentRecord, EventId, MatchEvent, StoredItem};
use crate::error::StorageError;
use crate::persistence::{ArchiveStore, EventStore};

/// Summary of one storage execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreOutcome {
    /// Number of items upserted into the keyed store.
    pub items_written: usize,
    /// Archive key of the raw batch, `None` for an empty batch.
    pub archive_key: Option<String>,
}

/// Returns the archive object key for a batch whose first event is `first`.
#[must_use]
pub fn archive_key(first: &EventId) -> String {
    format!("match_events_{first}.json")
}

/// Persists enriched events and archives the raw batch.
#[derive(Debug, Clone)]
pub struct StorageWriter {
    store: Arc<dyn EventStore>,
    archive: Arc<dyn ArchiveStore>,
}

impl StorageWriter {
    /// Creates a writer over the given stores.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>, archive: Arc<dyn ArchiveStore>) -> Self {
        Self { store, archive }
    }

    /// Upserts every event merged with its enrichment, then archives the
    /// un-enriched batch under [`archive_key`] of its first event.
    ///
    /// An empty batch is a no-op. Applying the same batch twice leaves the
    /// keyed store in the same state as applying it once.
    ///
    /// # Errors
    ///
    /// Returns the first [`StorageError`] from either write. A keyed-store
    /// failure skips the archive write.
    pub async fn store(
        &self,
        events: &[MatchEvent],
        enriched_data: &BTreeMap<EventId, EnrichmentRecord>,
    ) -> Result<StoreOutcome, StorageError> {
        let Some(first) = events.first() else {
            tracing::info!("empty batch, nothing to store");
            return Ok(StoreOutcome::default());
        };

        let items: Vec<StoredItem> = events
            .iter()
            .map(|event| StoredItem::merge(event.clone(), enriched_data.get(&event.event_id)))
            .collect();

        let items_written = self.store.upsert_batch(&items).await.inspect_err(|e| {
            tracing::error!(error = %e, "failed to write match events to keyed store");
        })?;

        let key = archive_key(&first.event_id);
        let body = serde_json::to_vec(events)?;
        self.archive
            .put_object(&key, body)
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, key = %key, "failed to archive match events");
            })?;

        tracing::info!(items_written, key = %key, "stored match event batch");
        Ok(StoreOutcome {
            items_written,
            archive_key: Some(key),
        })
    }
}
