//! Persistence layer: keyed event store and raw-batch archive.
//!
//! Both stores are capability traits so the pipeline never depends on a
//! concrete backend. Writes to the keyed store are idempotent upserts keyed
//! by event id; the archive is a write-once blob store.

pub mod archive;
pub mod memory;
pub mod postgres;
pub mod schema;

use std::fmt;

use async_trait::async_trait;

use crate::domain::{EventId, StoredItem};
use crate::error::StorageError;

pub use archive::{FilesystemArchiveStore, MemoryArchiveStore, S3ArchiveStore};
pub use memory::MemoryEventStore;
pub use postgres::PostgresEventStore;

/// Keyed store of enriched match events.
///
/// Items are keyed by `event_id` and indexed by `(match_id, event_type)`.
#[async_trait]
pub trait EventStore: Send + Sync + fmt::Debug {
    /// Inserts or replaces the item stored under its `event_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::KeyedStore`] if the write fails.
    async fn upsert(&self, item: &StoredItem) -> Result<(), StorageError>;

    /// Upserts every item in order, stopping at the first failure.
    ///
    /// Items are independent: there is no transaction across them, so a
    /// failure leaves the earlier items written.
    ///
    /// # Errors
    ///
    /// Returns the first [`StorageError`] encountered.
    async fn upsert_batch(&self, items: &[StoredItem]) -> Result<usize, StorageError> {
        for item in items {
            self.upsert(item).await?;
        }
        Ok(items.len())
    }

    /// Point lookup by event id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::KeyedStore`] if the read fails.
    async fn get(&self, event_id: &EventId) -> Result<Option<StoredItem>, StorageError>;

    /// Counts items with the given `match_id` and `event_type`.
    ///
    /// `event_type` is matched verbatim, so unknown kinds count zero.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::KeyedStore`] if the query fails.
    async fn count_by_match_and_type(
        &self,
        match_id: &str,
        event_type: &str,
    ) -> Result<u64, StorageError>;
}

/// Write-once blob store for archived batches.
#[async_trait]
pub trait ArchiveStore: Send + Sync + fmt::Debug {
    /// Stores `body` under `key`, replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Archive`] if the write fails.
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError>;
}
