//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tally_common::AppError;

/// Acknowledgement of a completed action.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    /// Create a success response.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

impl IntoResponse for ActionResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// `201 Created` with a JSON body.
#[derive(Debug)]
pub struct Created<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

/// Failure body for cron-style endpoints, which report
/// `{"success": false, "error": ...}` instead of the usual error shape.
#[derive(Debug)]
pub struct JobFailure(pub AppError);

impl IntoResponse for JobFailure {
    fn into_response(self) -> Response {
        let err = self.0;
        tracing::error!(error = %err, "Job failed");

        let body = Json(serde_json::json!({
            "success": false,
            "error": err.public_message(),
        }));
        (err.status_code(), body).into_response()
    }
}
