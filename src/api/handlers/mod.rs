//! REST endpoint handlers organized by resource.

pub mod events;
pub mod query;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes the match-event routes.
pub fn routes() -> Router<AppState> {
    Router::new().merge(events::routes()).merge(query::routes())
}
