//! Error types for every pipeline stage, plus the HTTP-facing [`ApiError`].
//!
//! Client-caused failures ([`ValidationError`], bad query parameters) map to
//! `400 Bad Request` with a structured JSON body. Everything else is fatal
//! for the invocation that hit it and is surfaced unchanged; retry policy
//! belongs to whatever drives the pipeline.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::EventId;

/// Structured JSON error response body.
///
/// ```json
/// { "message": "Invalid input data", "description": "Field required" }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Short error category.
    pub message: String,
    /// First violated rule, when there is one to report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A single rejected field of a match-event submission.
///
/// Only the first violation encountered is ever reported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Name of the offending field (`body` when the payload itself is bad).
    pub field: String,
    /// Human-readable description of the violated rule.
    pub message: String,
}

impl ValidationError {
    /// Creates a new validation error for `field`.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure talking to the event log, on either the publish or consume side.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Could not establish a producer or consumer session.
    #[error("failed to connect to log: {0}")]
    Connect(String),

    /// The log rejected or failed to deliver a message.
    #[error("failed to send to log: {0}")]
    Send(String),

    /// Delivery was not acknowledged within the bounded wait.
    #[error("log delivery timed out after {0:?}")]
    Timeout(Duration),

    /// Failure while polling the log for records.
    #[error("failed to receive from log: {0}")]
    Receive(String),

    /// Committing consumed offsets failed.
    #[error("failed to commit offsets: {0}")]
    Commit(String),

    /// A record value could not be decoded into UTF-8 text.
    #[error("cannot decode record {partition_key}@{offset}: {reason}")]
    Decode {
        /// Partition grouping key of the record.
        partition_key: String,
        /// Offset of the record within its partition.
        offset: i64,
        /// Why decoding failed.
        reason: String,
    },

    /// The event could not be serialized for the log.
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure of the enrichment stage. Always fatal for the whole batch.
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    /// A payload in the batch is not a valid serialized match event.
    #[error("match event #{index} is malformed: {source}")]
    Malformed {
        /// Position of the payload within the batch.
        index: usize,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A decoded event breaks a rule its stored form depends on.
    #[error("match event #{index} cannot be stored: {source}")]
    Unstorable {
        /// Position of the payload within the batch.
        index: usize,
        /// The violated rule.
        source: ValidationError,
    },

    /// A stored timestamp could not be re-parsed.
    #[error("event {event_id} has unparseable timestamp {timestamp:?}")]
    Timestamp {
        /// Event carrying the bad timestamp.
        event_id: EventId,
        /// The raw timestamp value.
        timestamp: String,
    },
}

/// Failure of the keyed store or the archive store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The keyed store rejected a read or write.
    #[error("keyed store error: {0}")]
    KeyedStore(String),

    /// The archive (blob) store rejected a write.
    #[error("archive store error: {0}")]
    Archive(String),

    /// The batch could not be serialized for archival.
    #[error("failed to serialize archive batch: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        Self::KeyedStore(err.to_string())
    }
}

/// Failure of an aggregate count query.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// `match_id` or the event kind is missing or malformed.
    #[error("invalid input parameters: {0}")]
    InvalidInput(String),

    /// The keyed store failed to answer.
    #[error("query backend failed: {0}")]
    Backend(#[from] StorageError),
}

/// Failure of one orchestrated execution (enrich, then store).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The enrichment stage failed.
    #[error(transparent)]
    Enrichment(#[from] EnrichmentError),

    /// The storage stage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failure of one batch consumption.
#[derive(Debug, thiserror::Error)]
pub enum ConsumeError {
    /// The batch could not be read or decoded.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The downstream execution failed, so the whole batch failed.
    #[error("execution failed: {0}")]
    Execution(#[from] PipelineError),
}

/// Errors returned by the HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Submission failed schema validation.
    #[error("invalid input data: {0}")]
    Validation(#[from] ValidationError),

    /// Publishing the validated event failed.
    #[error("publish failed: {0}")]
    Publish(#[from] TransportError),

    /// Count query failed.
    #[error("query failed: {0}")]
    Query(#[from] QueryError),
}

impl ApiError {
    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Query(QueryError::InvalidInput(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Publish(_) | Self::Query(QueryError::Backend(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            Self::Validation(err) => ErrorResponse {
                message: "Invalid input data".to_string(),
                description: Some(err.message.clone()),
            },
            Self::Query(QueryError::InvalidInput(_)) => ErrorResponse {
                message: "Invalid input parameters".to_string(),
                description: None,
            },
            Self::Publish(_) | Self::Query(QueryError::Backend(_)) => ErrorResponse {
                message: "Internal server error".to_string(),
                description: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::info!(error = %self, "request rejected");
        }
        let mut response = axum::Json(self.body()).into_response();
        *response.status_mut() = status;
        response
    }
}
