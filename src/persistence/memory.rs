//! In-process keyed event store.
//!
//! Backs local runs and tests. The map is behind a [`tokio::sync::RwLock`]
//! so concurrent readers never block each other.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::EventStore;
use crate::domain::{EventId, StoredItem};
use crate::error::StorageError;

/// Map of stored items keyed by event id.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    items: RwLock<HashMap<EventId, StoredItem>>,
}

impl MemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored items.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Returns `true` if nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Returns a copy of every stored item, ordered by event id.
    pub async fn snapshot(&self) -> Vec<StoredItem> {
        let mut items: Vec<StoredItem> = self.items.read().await.values().cloned().collect();
        items.sort_by(|a, b| a.key().cmp(b.key()));
        items
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn upsert(&self, item: &StoredItem) -> Result<(), StorageError> {
        self.items
            .write()
            .await
            .insert(item.key().clone(), item.clone());
        Ok(())
    }

    async fn get(&self, event_id: &EventId) -> Result<Option<StoredItem>, StorageError> {
        Ok(self.items.read().await.get(event_id).cloned())
    }

    async fn count_by_match_and_type(
        &self,
        match_id: &str,
        event_type: &str,
    ) -> Result<u64, StorageError> {
        let items = self.items.read().await;
        let count = items
            .values()
            .filter(|item| {
                item.event.match_id == match_id && item.event.event_type.as_str() == event_type
            })
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}
