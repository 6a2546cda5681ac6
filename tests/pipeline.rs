//! End-to-end pipeline run against the in-memory backends.

#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use match_pipeline::api::build_router;
use match_pipeline::app_state::AppState;
use match_pipeline::domain::EventId;
use match_pipeline::log::{BatchSource, MemoryLog, MemoryLogSource};
use match_pipeline::persistence::{ArchiveStore, EventStore, MemoryArchiveStore, MemoryEventStore};
use match_pipeline::service::{
    BatchConsumer, Publisher, QueryAggregator, StorageWriter, Workflow,
};

const TOPIC: &str = "match_events";

struct Harness {
    log: MemoryLog,
    store: Arc<MemoryEventStore>,
    archive: Arc<MemoryArchiveStore>,
    state: AppState,
    consumer: BatchConsumer,
}

impl Harness {
    fn new() -> Self {
        let log = MemoryLog::new(2);
        let store = Arc::new(MemoryEventStore::new());
        let archive = Arc::new(MemoryArchiveStore::new());

        let state = AppState {
            publisher: Some(Arc::new(Publisher::new(Arc::new(log.clone()), TOPIC))),
            query: Arc::new(QueryAggregator::new(Arc::clone(&store) as Arc<dyn EventStore>)),
        };
        let writer = StorageWriter::new(
            Arc::clone(&store) as Arc<dyn EventStore>,
            Arc::clone(&archive) as Arc<dyn ArchiveStore>,
        );
        let consumer = BatchConsumer::new(Arc::new(Workflow::new(writer)));

        Self {
            log,
            store,
            archive,
            state,
            consumer,
        }
    }

    fn source(&self) -> MemoryLogSource {
        MemoryLogSource::new(self.log.clone(), TOPIC, 100, Duration::from_millis(20))
    }

    async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let Ok(response) = build_router()
            .with_state(self.state.clone())
            .oneshot(request)
            .await
        else {
            panic!("router failed");
        };
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("unreadable body");
        };
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn submit(&self, body: &Value) -> (StatusCode, Value) {
        let Ok(request) = Request::builder()
            .method("POST")
            .uri("/matches/event")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
        else {
            panic!("bad request");
        };
        self.call(request).await
    }

    async fn count(&self, match_id: &str, kind: &str) -> (StatusCode, Value) {
        let Ok(request) = Request::builder()
            .uri(format!("/matches/{match_id}/{kind}"))
            .body(Body::empty())
        else {
            panic!("bad request");
        };
        self.call(request).await
    }

    async fn drain(&self, source: &mut MemoryLogSource) {
        let Ok(Some(batch)) = source.next_batch().await else {
            panic!("no batch available");
        };
        let Ok(_) = self.consumer.consume(&batch).await else {
            panic!("batch failed");
        };
        let Ok(()) = source.commit().await else {
            panic!("commit failed");
        };
    }
}

fn goal(timestamp: &str) -> Value {
    json!({
        "match_id": "000001",
        "event_type": "goal",
        "team": "Team A",
        "player": "Player 1",
        "timestamp": timestamp
    })
}

#[tokio::test]
async fn submitted_goal_is_enriched_stored_archived_and_counted() {
    let harness = Harness::new();

    let (status, body) = harness.submit(&goal("2024-02-15T13:30:00Z")).await;
    assert_eq!(status, StatusCode::OK);
    let Some(event_id) = body["event_id"].as_str().map(EventId::from) else {
        panic!("no event id returned");
    };

    let mut source = harness.source();
    harness.drain(&mut source).await;

    let Ok(Some(item)) = harness.store.get(&event_id).await else {
        panic!("event not stored");
    };
    assert_eq!(item.season.as_deref(), Some("2023-2024"));
    assert_eq!(item.event.match_id, "000001");

    let key = format!("match_events_{event_id}.json");
    assert_eq!(harness.archive.keys().await, vec![key]);

    let (status, body) = harness.count("000001", "goals").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "match_id": "000001", "event_type": "goal", "count": 1 })
    );
}

#[tokio::test]
async fn redelivered_batch_does_not_double_count() {
    let harness = Harness::new();
    for timestamp in ["2024-02-15T13:30:00+0000", "2024-10-15T16:30:00+0000"] {
        let (status, _) = harness.submit(&goal(timestamp)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let mut first = harness.source();
    let Ok(Some(batch)) = first.next_batch().await else {
        panic!("no batch available");
    };
    assert!(harness.consumer.consume(&batch).await.is_ok());
    // Not committed: a second consumer sees the same records again.
    let mut second = harness.source();
    harness.drain(&mut second).await;

    assert_eq!(harness.store.len().await, 2);
    let (_, body) = harness.count("000001", "goal").await;
    assert_eq!(body["count"], 2);

    let seasons: Vec<Option<String>> = harness
        .store
        .snapshot()
        .await
        .into_iter()
        .map(|item| item.season)
        .collect();
    assert!(seasons.contains(&Some("2023-2024".to_string())));
    assert!(seasons.contains(&Some("2024-2025".to_string())));
}

#[tokio::test]
async fn rejected_submission_never_reaches_the_store() {
    let harness = Harness::new();
    let (status, body) = harness.submit(&goal("02-2024-15T13:30:00Z")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["description"],
        "Timestamp must be in format '%Y-%m-%dT%H:%M:%S%z'"
    );
    assert_eq!(harness.log.len(TOPIC).await, 0);
    assert!(harness.store.is_empty().await);
}
