//! Blog publishing endpoints.

use axum::{Json, Router, extract::State, routing::post};
use tally_core::PublishSummary;

use crate::{extractors::AdminAuth, middleware::AppState, response::JobFailure};

/// Publish every scheduled post that is due (operator or cron).
async fn publish_scheduled(
    _admin: AdminAuth,
    State(state): State<AppState>,
) -> Result<Json<PublishSummary>, JobFailure> {
    state.publisher.run_sweep().await.map(Json).map_err(JobFailure)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/publish-scheduled", post(publish_scheduled))
}
