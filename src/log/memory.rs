//! In-process partitioned log.
//!
//! [`MemoryLog`] stands in for the broker in local runs and tests. Records
//! are spread round-robin over a fixed number of partitions (no keys), and
//! [`MemoryLogSource`] redelivers everything after the last committed
//! position, which gives the same at-least-once behavior as a consumer
//! group with manual commits.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Notify, RwLock};

use super::{Ack, BatchSource, ConsumerRecord, LogConnector, LogSession, TriggerPayload};
use crate::error::TransportError;

#[derive(Debug)]
struct LoggedRecord {
    timestamp: i64,
    value: Vec<u8>,
}

#[derive(Debug)]
struct Inner {
    partitions: usize,
    topics: RwLock<HashMap<String, Vec<Vec<LoggedRecord>>>>,
    next_partition: AtomicUsize,
    open_sessions: AtomicUsize,
    available: AtomicBool,
    appended: Notify,
}

/// Shared handle to an in-memory log. Cloning shares the same records.
#[derive(Debug, Clone)]
pub struct MemoryLog {
    inner: Arc<Inner>,
}

impl MemoryLog {
    /// Creates an empty log with `partitions` partitions per topic (at least one).
    #[must_use]
    pub fn new(partitions: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                partitions: partitions.max(1),
                topics: RwLock::new(HashMap::new()),
                next_partition: AtomicUsize::new(0),
                open_sessions: AtomicUsize::new(0),
                available: AtomicBool::new(true),
                appended: Notify::new(),
            }),
        }
    }

    /// Simulates the log going down (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    /// Number of producer sessions currently open.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.inner.open_sessions.load(Ordering::SeqCst)
    }

    /// Total number of records stored for `topic`.
    pub async fn len(&self, topic: &str) -> usize {
        self.inner
            .topics
            .read()
            .await
            .get(topic)
            .map_or(0, |partitions| partitions.iter().map(Vec::len).sum())
    }

    fn is_available(&self) -> bool {
        self.inner.available.load(Ordering::SeqCst)
    }

    async fn append(&self, topic: &str, payload: &str) -> Ack {
        let partition =
            self.inner.next_partition.fetch_add(1, Ordering::SeqCst) % self.inner.partitions;
        let mut topics = self.inner.topics.write().await;
        let partitions = topics
            .entry(topic.to_string())
            .or_insert_with(|| (0..self.inner.partitions).map(|_| Vec::new()).collect());

        let mut offset = 0;
        if let Some(records) = partitions.get_mut(partition) {
            offset = records.len();
            records.push(LoggedRecord {
                timestamp: Utc::now().timestamp_millis(),
                value: payload.as_bytes().to_vec(),
            });
        }
        drop(topics);
        self.inner.appended.notify_waiters();

        Ack {
            topic: topic.to_string(),
            partition: i32::try_from(partition).unwrap_or(i32::MAX),
            offset: i64::try_from(offset).unwrap_or(i64::MAX),
        }
    }

    /// Reads up to `max` records of `topic`, starting at `positions`
    /// (partition → next offset), partition by partition.
    async fn read_from(
        &self,
        topic: &str,
        positions: &BTreeMap<usize, usize>,
        max: usize,
    ) -> Vec<(usize, usize, ConsumerRecord)> {
        let topics = self.inner.topics.read().await;
        let Some(partitions) = topics.get(topic) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for (partition, records) in partitions.iter().enumerate() {
            let start = positions.get(&partition).copied().unwrap_or(0);
            for (offset, record) in records.iter().enumerate().skip(start) {
                if out.len() >= max {
                    return out;
                }
                let encoded = ConsumerRecord::encode(
                    topic,
                    i32::try_from(partition).unwrap_or(i32::MAX),
                    i64::try_from(offset).unwrap_or(i64::MAX),
                    record.timestamp,
                    &record.value,
                );
                out.push((partition, offset, encoded));
            }
        }
        out
    }
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self::new(1)
    }
}

#[async_trait]
impl LogConnector for MemoryLog {
    async fn connect(&self) -> Result<Box<dyn LogSession>, TransportError> {
        if !self.is_available() {
            return Err(TransportError::Connect("memory log unavailable".to_string()));
        }
        self.inner.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            log: self.clone(),
            released: false,
        }))
    }
}

/// Producer session on a [`MemoryLog`].
#[derive(Debug)]
struct MemorySession {
    log: MemoryLog,
    released: bool,
}

impl MemorySession {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.log.inner.open_sessions.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl LogSession for MemorySession {
    async fn send(&mut self, topic: &str, payload: &str) -> Result<Ack, TransportError> {
        if !self.log.is_available() {
            return Err(TransportError::Send("memory log unavailable".to_string()));
        }
        Ok(self.log.append(topic, payload).await)
    }

    async fn close(mut self: Box<Self>) {
        self.release();
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Batch source reading one topic of a [`MemoryLog`].
#[derive(Debug)]
pub struct MemoryLogSource {
    log: MemoryLog,
    topic: String,
    batch_size: usize,
    batch_wait: Duration,
    committed: BTreeMap<usize, usize>,
    pending: BTreeMap<usize, usize>,
}

impl MemoryLogSource {
    /// Creates a source starting at the beginning of `topic`.
    #[must_use]
    pub fn new(
        log: MemoryLog,
        topic: impl Into<String>,
        batch_size: usize,
        batch_wait: Duration,
    ) -> Self {
        Self {
            log,
            topic: topic.into(),
            batch_size: batch_size.max(1),
            batch_wait,
            committed: BTreeMap::new(),
            pending: BTreeMap::new(),
        }
    }

    async fn collect(&mut self) -> Option<TriggerPayload> {
        let records = self
            .log
            .read_from(&self.topic, &self.committed, self.batch_size)
            .await;
        if records.is_empty() {
            return None;
        }

        self.pending = self.committed.clone();
        let mut batch = TriggerPayload::default();
        for (partition, offset, record) in records {
            self.pending.insert(partition, offset + 1);
            batch.push(record);
        }
        Some(batch)
    }
}

#[async_trait]
impl BatchSource for MemoryLogSource {
    async fn next_batch(&mut self) -> Result<Option<TriggerPayload>, TransportError> {
        let inner = Arc::clone(&self.log.inner);
        let appended = inner.appended.notified();
        if let Some(batch) = self.collect().await {
            return Ok(Some(batch));
        }
        let _ = tokio::time::timeout(self.batch_wait, appended).await;
        Ok(self.collect().await)
    }

    async fn commit(&mut self) -> Result<(), TransportError> {
        if !self.pending.is_empty() {
            self.committed = std::mem::take(&mut self.pending);
        }
        Ok(())
    }
}
