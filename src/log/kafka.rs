//! Kafka-backed log: per-publish producer sessions and a batching consumer.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use rdkafka::{ClientConfig, Message};
use tracing::{debug, info, warn};

use super::{Ack, BatchSource, ConsumerRecord, LogConnector, LogSession, TriggerPayload};
use crate::config::KafkaConfig;
use crate::error::TransportError;

const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

fn base_client_config(config: &KafkaConfig) -> ClientConfig {
    let mut client_config = ClientConfig::new();
    client_config
        .set("bootstrap.servers", &config.hosts)
        .set("statistics.interval.ms", "10000");

    if config.tls {
        client_config
            .set("security.protocol", "ssl")
            .set("enable.ssl.certificate.verification", "false");
    };
    client_config
}

/// Creates `topic` with the configured partitions and replication factor.
///
/// A topic that already exists is left untouched.
///
/// # Errors
///
/// Returns [`TransportError::Connect`] if the admin client cannot be
/// created or the brokers refuse to create the topic.
pub async fn ensure_topic(config: &KafkaConfig, topic: &str) -> Result<(), TransportError> {
    let admin: AdminClient<DefaultClientContext> = base_client_config(config)
        .create()
        .map_err(|e| TransportError::Connect(e.to_string()))?;

    let new_topic = NewTopic::new(
        topic,
        config.topic_partitions,
        TopicReplication::Fixed(config.topic_replication_factor),
    );
    let results = admin
        .create_topics(&[new_topic], &AdminOptions::new())
        .await
        .map_err(|e| TransportError::Connect(e.to_string()))?;

    for result in results {
        match result {
            Ok(name) => info!(
                topic = %name,
                partitions = config.topic_partitions,
                "created Kafka topic"
            ),
            Err((name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                debug!(topic = %name, "Kafka topic already exists");
            }
            Err((name, code)) => {
                return Err(TransportError::Connect(format!(
                    "failed to create topic {name}: {code}"
                )));
            }
        }
    }
    Ok(())
}

/// Opens a fresh Kafka producer for every publish.
#[derive(Debug, Clone)]
pub struct KafkaConnector {
    config: KafkaConfig,
}

impl KafkaConnector {
    /// Creates a connector for the given brokers.
    #[must_use]
    pub fn new(config: KafkaConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LogConnector for KafkaConnector {
    async fn connect(&self) -> Result<Box<dyn LogSession>, TransportError> {
        let timeout_ms = self.config.producer_timeout.as_millis().to_string();
        let mut client_config = base_client_config(&self.config);
        client_config
            .set("message.timeout.ms", &timeout_ms)
            .set("linger.ms", "0");

        debug!("rdkafka producer configuration: {:?}", client_config);
        let producer: FutureProducer = client_config
            .create()
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        Ok(Box::new(KafkaSession {
            producer,
            timeout: self.config.producer_timeout,
        }))
    }
}

struct KafkaSession {
    producer: FutureProducer,
    timeout: Duration,
}

#[async_trait]
impl LogSession for KafkaSession {
    async fn send(&mut self, topic: &str, payload: &str) -> Result<Ack, TransportError> {
        let record = FutureRecord::<(), str>::to(topic).payload(payload);
        let delivery = self.producer.send(record, Timeout::After(self.timeout));

        match tokio::time::timeout(self.timeout, delivery).await {
            Err(_)
            | Ok(Err((KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut), _))) => {
                Err(TransportError::Timeout(self.timeout))
            }
            Ok(Err((err, _))) => Err(TransportError::Send(err.to_string())),
            Ok(Ok((partition, offset))) => Ok(Ack {
                topic: topic.to_string(),
                partition,
                offset,
            }),
        }
    }

    async fn close(self: Box<Self>) {
        let producer = self.producer.clone();
        let flushed =
            tokio::task::spawn_blocking(move || producer.flush(Timeout::After(CLOSE_FLUSH_TIMEOUT)))
                .await;
        match flushed {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "failed to flush producer on close"),
            Err(e) => warn!(error = %e, "producer flush task failed"),
        }
    }
}

/// Consumes a topic with manual commits, grouping messages into batches.
///
/// Offsets are committed only after [`BatchSource::commit`], so a batch
/// that fails downstream is delivered again after a restart or rebalance.
pub struct KafkaBatchSource {
    consumer: StreamConsumer,
    batch_size: usize,
    batch_wait: Duration,
}

impl fmt::Debug for KafkaBatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KafkaBatchSource")
            .field("batch_size", &self.batch_size)
            .field("batch_wait", &self.batch_wait)
            .finish_non_exhaustive()
    }
}

impl KafkaBatchSource {
    /// Subscribes a new consumer to `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`] if the consumer cannot be created
    /// or subscribed.
    pub fn new(
        config: &KafkaConfig,
        topic: &str,
        batch_size: usize,
        batch_wait: Duration,
    ) -> Result<Self, TransportError> {
        let mut client_config = base_client_config(config);
        client_config
            .set("group.id", &config.consumer_group)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest");

        let consumer: StreamConsumer = client_config
            .create()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        consumer
            .subscribe(&[topic])
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        info!(topic, group = %config.consumer_group, "subscribed to Kafka topic");

        Ok(Self {
            consumer,
            batch_size: batch_size.max(1),
            batch_wait,
        })
    }
}

#[async_trait]
impl BatchSource for KafkaBatchSource {
    async fn next_batch(&mut self) -> Result<Option<TriggerPayload>, TransportError> {
        let deadline = tokio::time::Instant::now() + self.batch_wait;
        let mut batch = TriggerPayload::default();

        while batch.len() < self.batch_size {
            let message = match tokio::time::timeout_at(deadline, self.consumer.recv()).await {
                Err(_) => break,
                Ok(Err(e)) => return Err(TransportError::Receive(e.to_string())),
                Ok(Ok(message)) => message,
            };
            batch.push(ConsumerRecord::encode(
                message.topic(),
                message.partition(),
                message.offset(),
                message.timestamp().to_millis().unwrap_or_default(),
                message.payload().unwrap_or_default(),
            ));
        }

        Ok((!batch.is_empty()).then_some(batch))
    }

    async fn commit(&mut self) -> Result<(), TransportError> {
        self.consumer
            .commit_consumer_state(CommitMode::Async)
            .map_err(|e| TransportError::Commit(e.to_string()))
    }
}
