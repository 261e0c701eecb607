//! API endpoints.

mod blog;
mod identity;
mod meta;
mod votings;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/meta", meta::router())
        .nest("/identity", identity::router())
        .nest("/votings", votings::router())
        .nest("/blog", blog::router())
}
