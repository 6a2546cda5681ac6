//! Event log capability: producer sessions and batch sources.
//!
//! The pipeline only needs at-least-once delivery of opaque payloads
//! grouped into batches. [`LogConnector`] opens a short-lived producer
//! session per publish; [`BatchSource`] hands the consumer groups of
//! records in the trigger format below and is told when a batch has been
//! fully processed.
//!
//! ```json
//! { "records": { "match_events-0": [
//!     { "topic": "match_events", "partition": 0, "offset": 12,
//!       "timestamp": 1718000000000, "value": "eyJldmVudF9pZCI6..." } ] } }
//! ```

pub mod kafka;
pub mod memory;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

pub use kafka::{KafkaBatchSource, KafkaConnector, ensure_topic};
pub use memory::{MemoryLog, MemoryLogSource};

/// Delivery acknowledgment for a published record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    /// Topic the record was written to.
    pub topic: String,
    /// Partition chosen by the log.
    pub partition: i32,
    /// Offset of the record within the partition.
    pub offset: i64,
}

/// Opens producer sessions against the log.
#[async_trait]
pub trait LogConnector: Send + Sync + fmt::Debug {
    /// Acquires a new producer session.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`] if the log cannot be reached.
    async fn connect(&self) -> Result<Box<dyn LogSession>, TransportError>;
}

/// A scoped producer session.
///
/// Callers must [`close`](LogSession::close) the session on every path;
/// implementations also release their resources on drop so a cancelled
/// publish does not leak a connection.
#[async_trait]
pub trait LogSession: Send {
    /// Sends `payload` to `topic` and waits for the acknowledgment.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] on rejection or when the bounded wait
    /// expires.
    async fn send(&mut self, topic: &str, payload: &str) -> Result<Ack, TransportError>;

    /// Releases the session.
    async fn close(self: Box<Self>);
}

/// One raw record as delivered to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerRecord {
    /// Source topic.
    pub topic: String,
    /// Source partition.
    pub partition: i32,
    /// Offset within the partition.
    pub offset: i64,
    /// Log append time in epoch milliseconds.
    pub timestamp: i64,
    /// Base64-encoded record value.
    pub value: String,
}

impl ConsumerRecord {
    /// Builds a record, base64-encoding the raw `value` bytes.
    #[must_use]
    pub fn encode(topic: &str, partition: i32, offset: i64, timestamp: i64, value: &[u8]) -> Self {
        Self {
            topic: topic.to_string(),
            partition,
            offset,
            timestamp,
            value: STANDARD.encode(value),
        }
    }

    /// Grouping key of this record's partition, `"{topic}-{partition}"`.
    #[must_use]
    pub fn partition_key(&self) -> String {
        format!("{}-{}", self.topic, self.partition)
    }
}

/// A batch of raw records grouped by partition.
///
/// Record order within each group is the log order of that partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerPayload {
    /// Records keyed by partition grouping key.
    pub records: BTreeMap<String, Vec<ConsumerRecord>>,
}

impl TriggerPayload {
    /// Appends a record to its partition group.
    pub fn push(&mut self, record: ConsumerRecord) {
        self.records
            .entry(record.partition_key())
            .or_default()
            .push(record);
    }

    /// Total number of records across all partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    /// Returns `true` if the batch holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Source of record batches for the consumer loop.
#[async_trait]
pub trait BatchSource: Send + fmt::Debug {
    /// Waits for the next batch. `None` means nothing arrived in time.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Receive`] if polling the log fails.
    async fn next_batch(&mut self) -> Result<Option<TriggerPayload>, TransportError>;

    /// Marks the last returned batch as processed.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Commit`] if offsets cannot be committed.
    async fn commit(&mut self) -> Result<(), TransportError>;
}
