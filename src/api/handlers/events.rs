//! Match-event ingest handler.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{INGESTED_OK, IngestResponse, MatchEventRequest};
use crate::app_state::AppState;
use crate::domain::validate;
use crate::error::{ApiError, ErrorResponse};

/// `POST /matches/event` — Validate and publish a match event.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] for a rejected submission and
/// [`ApiError::Publish`] if the log does not acknowledge the event.
#[utoipa::path(
    post,
    path = "/matches/event",
    tag = "Events",
    summary = "Ingest a match event",
    description = "Validates the submission and publishes it to the event log. A missing `event_id` is generated.",
    request_body = MatchEventRequest,
    responses(
        (status = 200, description = "Event accepted", body = IngestResponse),
        (status = 400, description = "Submission failed validation", body = ErrorResponse),
        (status = 500, description = "Publishing failed", body = ErrorResponse),
    )
)]
pub async fn ingest_event(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let event = validate(&body)?;

    match &state.publisher {
        Some(publisher) => {
            publisher.publish(&event).await?;
        }
        None => tracing::info!(event_id = %event.event_id, "publishing disabled, event not sent"),
    }

    Ok((
        StatusCode::OK,
        Json(IngestResponse {
            message: INGESTED_OK.to_string(),
            event_id: event.event_id.into(),
        }),
    ))
}

/// Ingest routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/matches/event", post(ingest_event))
}
