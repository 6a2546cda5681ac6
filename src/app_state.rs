//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::{Publisher, QueryAggregator};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Publisher for ingested events. `None` when publishing is disabled,
    /// in which case ingest only validates.
    pub publisher: Option<Arc<Publisher>>,
    /// Count queries over the keyed store.
    pub query: Arc<QueryAggregator>,
}
