//! Publishes validated match events to the log.

use std::sync::Arc;

use crate::domain::MatchEvent;
use crate::error::TransportError;
use crate::log::{Ack, LogConnector};

/// Serializes events and hands them to the log, one session per publish.
///
/// No partition key is set, so placement is left to the log. Failures are
/// returned as-is; there is no internal retry.
#[derive(Debug, Clone)]
pub struct Publisher {
    connector: Arc<dyn LogConnector>,
    topic: String,
}

impl Publisher {
    /// Creates a publisher writing to `topic`.
    #[must_use]
    pub fn new(connector: Arc<dyn LogConnector>, topic: impl Into<String>) -> Self {
        Self {
            connector,
            topic: topic.into(),
        }
    }

    /// Publishes `event` and returns the log acknowledgment.
    ///
    /// The session is closed whether the send succeeds or fails; if this
    /// future is dropped mid-send the session is released on drop.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if serialization, connection or
    /// delivery fails.
    pub async fn publish(&self, event: &MatchEvent) -> Result<Ack, TransportError> {
        let payload = event.to_json()?;

        let mut session = self.connector.connect().await?;
        let sent = session.send(&self.topic, &payload).await;
        session.close().await;

        match &sent {
            Ok(ack) => tracing::info!(
                event_id = %event.event_id,
                topic = %ack.topic,
                partition = ack.partition,
                offset = ack.offset,
                "published match event"
            ),
            Err(e) => tracing::error!(
                event_id = %event.event_id,
                topic = %self.topic,
                error = %e,
                "failed to publish match event"
            ),
        }
        sent
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use base64::Engine;

    use super::*;
    use crate::domain::{EventId, EventType};
    use crate::log::{BatchSource, MemoryLog, MemoryLogSource};

    fn event() -> MatchEvent {
        MatchEvent {
            event_id: EventId::from("evt-42"),
            match_id: "000001".to_string(),
            event_type: EventType::Pass,
            team: "Team A".to_string(),
            player: "Player 2".to_string(),
            timestamp: "2024-10-15T16:30:00+0000".to_string(),
        }
    }

    #[tokio::test]
    async fn publish_writes_canonical_json_and_acks() {
        let log = MemoryLog::default();
        let publisher = Publisher::new(Arc::new(log.clone()), "match_events");

        let Ok(ack) = publisher.publish(&event()).await else {
            panic!("publish failed");
        };
        assert_eq!(ack.topic, "match_events");
        assert_eq!(ack.offset, 0);
        assert_eq!(log.open_sessions(), 0);

        let mut source =
            MemoryLogSource::new(log, "match_events", 10, std::time::Duration::from_millis(10));
        let Ok(Some(batch)) = source.next_batch().await else {
            panic!("nothing published");
        };
        let expected = event().to_json().unwrap_or_default();
        let values: Vec<String> = batch
            .records
            .values()
            .flatten()
            .map(|r| r.value.clone())
            .collect();
        assert_eq!(values.len(), 1);
        let decoded = values
            .first()
            .and_then(|v| base64::engine::general_purpose::STANDARD.decode(v).ok())
            .and_then(|bytes| String::from_utf8(bytes).ok());
        assert_eq!(decoded, Some(expected));
    }

    #[tokio::test]
    async fn transport_failure_is_surfaced_and_session_released() {
        let log = MemoryLog::default();
        let publisher = Publisher::new(Arc::new(log.clone()), "match_events");

        log.set_available(false);
        assert!(matches!(
            publisher.publish(&event()).await,
            Err(TransportError::Connect(_))
        ));
        assert_eq!(log.open_sessions(), 0);
        assert_eq!(log.len("match_events").await, 0);
    }
}
