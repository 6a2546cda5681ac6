//! REST API layer: route handlers, DTOs, and router composition.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the match-event API.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        handlers::events::ingest_event,
        handlers::query::count_events,
        handlers::system::health_handler,
    ),
    components(schemas(
        dto::MatchEventRequest,
        dto::IngestResponse,
        dto::EventCountResponse,
        handlers::system::HealthResponse,
        crate::error::ErrorResponse,
    )),
    tags(
        (name = "Events", description = "Match-event ingest and counts"),
        (name = "System", description = "Service status"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .merge(handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::log::MemoryLog;
    use crate::persistence::{EventStore, MemoryEventStore};
    use crate::service::{Publisher, QueryAggregator};

    fn state(log: Option<&MemoryLog>, store: Arc<MemoryEventStore>) -> AppState {
        AppState {
            publisher: log
                .map(|log| Arc::new(Publisher::new(Arc::new(log.clone()), "match_events"))),
            query: Arc::new(QueryAggregator::new(store as Arc<dyn EventStore>)),
        }
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
        let Ok(response) = build_router().with_state(state).oneshot(request).await else {
            panic!("router failed");
        };
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("unreadable body");
        };
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_event(body: &Value) -> Request<Body> {
        let Ok(request) = Request::builder()
            .method("POST")
            .uri("/matches/event")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
        else {
            panic!("bad request");
        };
        request
    }

    fn get(uri: &str) -> Request<Body> {
        let Ok(request) = Request::builder().uri(uri).body(Body::empty()) else {
            panic!("bad request");
        };
        request
    }

    fn submission() -> Value {
        json!({
            "match_id": "000001",
            "event_type": "goal",
            "team": "Team A",
            "player": "Player 1",
            "timestamp": "2024-02-15T13:30:00Z"
        })
    }

    #[tokio::test]
    async fn ingest_publishes_and_returns_event_id() {
        let log = MemoryLog::default();
        let (status, body) = send(
            state(Some(&log), Arc::new(MemoryEventStore::new())),
            post_event(&submission()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Match event ingested OK");
        assert!(body["event_id"].as_str().is_some_and(|id| !id.is_empty()));
        assert_eq!(log.len("match_events").await, 1);
    }

    #[tokio::test]
    async fn ingest_rejects_with_first_violation() {
        let log = MemoryLog::default();
        let mut bad = submission();
        bad["match_id"] = json!("12a");
        bad["timestamp"] = json!("02-2024-15T13:30:00Z");

        let (status, body) =
            send(state(Some(&log), Arc::new(MemoryEventStore::new())), post_event(&bad)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "message": "Invalid input data",
                "description": "All characters in the Match id must be integers"
            })
        );
        assert_eq!(log.len("match_events").await, 0);
    }

    #[tokio::test]
    async fn ingest_rejects_path_like_event_id() {
        let log = MemoryLog::default();
        let mut event = submission();
        event["event_id"] = json!("/../x");

        let (status, body) =
            send(state(Some(&log), Arc::new(MemoryEventStore::new())), post_event(&event)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["description"],
            "Event id may only contain letters, digits, '-' and '_'"
        );
        assert_eq!(log.len("match_events").await, 0);
    }

    #[tokio::test]
    async fn ingest_without_publisher_only_validates() {
        let mut event = submission();
        event["event_id"] = json!("client-id");
        let (status, body) =
            send(state(None, Arc::new(MemoryEventStore::new())), post_event(&event)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event_id"], "client-id");
    }

    #[tokio::test]
    async fn ingest_reports_publish_failure() {
        let log = MemoryLog::default();
        log.set_available(false);
        let (status, body) = send(
            state(Some(&log), Arc::new(MemoryEventStore::new())),
            post_event(&submission()),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn count_route_normalizes_kind() {
        let (status, body) = send(
            state(None, Arc::new(MemoryEventStore::new())),
            get("/matches/000001/goals"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "match_id": "000001", "event_type": "goal", "count": 0 })
        );
    }

    #[tokio::test]
    async fn count_route_rejects_non_digit_match() {
        let (status, body) = send(
            state(None, Arc::new(MemoryEventStore::new())),
            get("/matches/abc/goals"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "message": "Invalid input parameters" }));
    }

    #[tokio::test]
    async fn count_route_rejects_missing_kind() {
        let (status, body) = send(
            state(None, Arc::new(MemoryEventStore::new())),
            get("/matches/000001/"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "message": "Invalid input parameters" }));
    }

    #[tokio::test]
    async fn health_reports_publishing_mode() {
        let (status, body) =
            send(state(None, Arc::new(MemoryEventStore::new())), get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["publishing"], false);
    }

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/matches/event"));
        assert!(paths.iter().any(|p| p.as_str() == "/matches/{match_id}/{kind}"));
        assert!(paths.iter().any(|p| p.as_str() == "/health"));
    }
}
