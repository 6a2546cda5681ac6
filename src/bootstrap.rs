//! Wires concrete backends from a [`PipelineConfig`].
//!
//! Everything is built once at startup and shared through `Arc`s; the
//! stages themselves never read configuration.

use std::sync::Arc;

use anyhow::Context;

use crate::app_state::AppState;
use crate::config::{ArchiveBackend, LogBackend, PipelineConfig, StoreBackend};
use crate::log::{
    BatchSource, KafkaBatchSource, KafkaConnector, LogConnector, MemoryLog, MemoryLogSource,
    ensure_topic,
};
use crate::persistence::{
    ArchiveStore, EventStore, FilesystemArchiveStore, MemoryArchiveStore, MemoryEventStore,
    PostgresEventStore, S3ArchiveStore,
};
use crate::service::{BatchConsumer, Publisher, QueryAggregator, StorageWriter, Workflow};

/// Log handle selected by configuration.
#[derive(Debug, Clone)]
pub enum LogHandle {
    /// Kafka brokers; each consumer opens its own group member.
    Kafka(KafkaConnector),
    /// In-process log shared by the publisher and the consumer.
    Memory(MemoryLog),
}

impl LogHandle {
    /// Returns the producer side of the log.
    #[must_use]
    pub fn connector(&self) -> Arc<dyn LogConnector> {
        match self {
            Self::Kafka(kafka) => Arc::new(kafka.clone()),
            Self::Memory(memory) => Arc::new(memory.clone()),
        }
    }
}

/// Every external dependency of the pipeline.
#[derive(Debug, Clone)]
pub struct Backends {
    /// The event log.
    pub log: LogHandle,
    /// Keyed event store.
    pub store: Arc<dyn EventStore>,
    /// Raw-batch archive.
    pub archive: Arc<dyn ArchiveStore>,
}

impl Backends {
    /// Connects every backend named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the Kafka topic cannot be provisioned, the
    /// database cannot be reached or its schema cannot be created.
    pub async fn connect(config: &PipelineConfig) -> anyhow::Result<Self> {
        let log = match config.log_backend {
            LogBackend::Kafka => {
                if config.kafka.create_topic {
                    ensure_topic(&config.kafka, &config.topic)
                        .await
                        .context("failed to provision Kafka topic")?;
                }
                LogHandle::Kafka(KafkaConnector::new(config.kafka.clone()))
            }
            LogBackend::Memory => LogHandle::Memory(MemoryLog::new(config.memory_log_partitions)),
        };

        let store: Arc<dyn EventStore> = match config.store_backend {
            StoreBackend::Postgres => {
                let store = PostgresEventStore::connect(
                    &config.database_url,
                    config.database_max_connections,
                    config.database_min_connections,
                    config.database_connect_timeout,
                )
                .await
                .context("failed to connect to PostgreSQL")?;
                store
                    .ensure_schema()
                    .await
                    .context("failed to create match_events schema")?;
                Arc::new(store)
            }
            StoreBackend::Memory => Arc::new(MemoryEventStore::new()),
        };

        let archive: Arc<dyn ArchiveStore> = match config.archive_backend {
            ArchiveBackend::S3 => {
                Arc::new(S3ArchiveStore::from_env(config.s3_bucket_name.clone()).await)
            }
            ArchiveBackend::Filesystem => {
                Arc::new(FilesystemArchiveStore::new(config.archive_dir.clone()))
            }
            ArchiveBackend::Memory => Arc::new(MemoryArchiveStore::new()),
        };

        tracing::info!(
            log = ?config.log_backend,
            store = ?config.store_backend,
            archive = ?config.archive_backend,
            "backends ready"
        );
        Ok(Self { log, store, archive })
    }

    /// Builds the HTTP state: publisher (unless disabled) and query stage.
    #[must_use]
    pub fn app_state(&self, config: &PipelineConfig) -> AppState {
        let publisher = config
            .publish_enabled
            .then(|| Arc::new(Publisher::new(self.log.connector(), config.topic.clone())));
        AppState {
            publisher,
            query: Arc::new(QueryAggregator::new(Arc::clone(&self.store))),
        }
    }

    /// Builds the consumer with its in-process workflow.
    #[must_use]
    pub fn batch_consumer(&self) -> BatchConsumer {
        let writer = StorageWriter::new(Arc::clone(&self.store), Arc::clone(&self.archive));
        BatchConsumer::new(Arc::new(Workflow::new(writer)))
    }

    /// Opens a batch source on the configured topic.
    ///
    /// # Errors
    ///
    /// Returns an error if the Kafka consumer cannot be created or subscribed.
    pub fn batch_source(&self, config: &PipelineConfig) -> anyhow::Result<Box<dyn BatchSource>> {
        let source: Box<dyn BatchSource> = match &self.log {
            LogHandle::Kafka(_) => Box::new(
                KafkaBatchSource::new(
                    &config.kafka,
                    &config.topic,
                    config.consumer_batch_size,
                    config.consumer_batch_wait,
                )
                .context("failed to start Kafka consumer")?,
            ),
            LogHandle::Memory(log) => Box::new(MemoryLogSource::new(
                log.clone(),
                config.topic.clone(),
                config.consumer_batch_size,
                config.consumer_batch_wait,
            )),
        };
        Ok(source)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::validate;

    fn config(publish: &str) -> PipelineConfig {
        let publish = publish.to_string();
        let Ok(config) = PipelineConfig::from_lookup(move |key| {
            (key == "PUBLISH_ENABLED").then(|| publish.clone())
        }) else {
            panic!("config rejected");
        };
        config
    }

    #[tokio::test]
    async fn memory_backends_share_one_log() {
        let config = config("true");
        let Ok(backends) = Backends::connect(&config).await else {
            panic!("memory backends failed");
        };
        let state = backends.app_state(&config);
        let Some(publisher) = state.publisher else {
            panic!("publisher missing");
        };
        let Ok(event) = validate(
            br#"{"match_id":"7","event_type":"foul","team":"A","player":"B","timestamp":"2024-07-01T00:00:00Z"}"#,
        ) else {
            panic!("event rejected");
        };
        assert!(publisher.publish(&event).await.is_ok());

        let Ok(mut source) = backends.batch_source(&config) else {
            panic!("no batch source");
        };
        let Ok(Some(batch)) = source.next_batch().await else {
            panic!("published event not visible to the consumer");
        };
        let Ok(execution) = backends.batch_consumer().consume(&batch).await else {
            panic!("consume failed");
        };
        assert_eq!(execution.outcome.items_written, 1);

        let Ok(count) = state.query.count("7", "foul").await else {
            panic!("query failed");
        };
        assert_eq!(count.count, 1);
    }

    #[tokio::test]
    async fn disabled_publishing_leaves_no_publisher() {
        let config = config("false");
        let Ok(backends) = Backends::connect(&config).await else {
            panic!("memory backends failed");
        };
        assert!(backends.app_state(&config).publisher.is_none());
    }
}
