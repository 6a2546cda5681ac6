//! Aggregate count handler.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::EventCountResponse;
use crate::app_state::AppState;
use crate::error::{ApiError, ErrorResponse, QueryError};

/// `GET /matches/{match_id}/{kind}` — Count events of one kind in a match.
///
/// # Errors
///
/// Returns [`ApiError::Query`] for bad parameters or a failed backend.
#[utoipa::path(
    get,
    path = "/matches/{match_id}/{kind}",
    tag = "Events",
    summary = "Count match events",
    description = "Counts stored events of one kind for a match. `goals` and `passes` are accepted as aliases of `goal` and `pass`.",
    params(
        ("match_id" = String, Path, description = "Match identifier, digits only"),
        ("kind" = String, Path, description = "Event kind, e.g. `goals`"),
    ),
    responses(
        (status = 200, description = "Event count", body = EventCountResponse),
        (status = 400, description = "Invalid input parameters", body = ErrorResponse),
        (status = 500, description = "Query backend failed", body = ErrorResponse),
    )
)]
pub async fn count_events(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path((match_id, kind)) = path.map_err(|e| QueryError::InvalidInput(e.body_text()))?;
    let count = state.query.count(&match_id, &kind).await?;
    Ok((StatusCode::OK, Json(EventCountResponse::from(count))))
}

/// `GET /matches/{match_id}/` — The event kind is missing.
///
/// # Errors
///
/// Always returns [`ApiError::Query`] with [`QueryError::InvalidInput`].
pub async fn missing_kind(Path(match_id): Path<String>) -> Result<StatusCode, ApiError> {
    Err(QueryError::InvalidInput(format!("no event kind given for match {match_id:?}")).into())
}

/// Query routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/matches/{match_id}/{kind}", get(count_events))
        .route("/matches/{match_id}/", get(missing_kind))
}
