//! Voter identity endpoint.

use axum::{Json, Router, routing::post};
use serde::Serialize;
use tally_common::{AppError, AppResult, ClientSignals, fingerprint};

use crate::middleware::AppState;

/// Derived voter identity.
#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub user_identifier: String,
}

/// Derive a voter identifier from client signals.
async fn identify(Json(signals): Json<ClientSignals>) -> AppResult<Json<IdentityResponse>> {
    if signals.user_agent.trim().is_empty() {
        return Err(AppError::BadRequest("user_agent is required".to_string()));
    }

    Ok(Json(IdentityResponse {
        user_identifier: fingerprint(&signals),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(identify))
}
