//! Voting endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use axum_extra::{TypedHeader, headers::UserAgent};
use serde::Deserialize;
use tally_common::{AppError, AppResult};
use tally_core::{
    CreateVotingInput, ReconcileReport, SubmitVoteInput, VotingDetail, VotingResults,
};
use tally_db::entities::voting::{self, VotingStatus};

use crate::{
    extractors::AdminAuth,
    middleware::AppState,
    response::{ActionResponse, Created},
};

/// Vote submission request.
#[derive(Debug, Deserialize)]
pub struct SubmitVoteRequest {
    #[serde(default)]
    pub voting_id: String,
    #[serde(default)]
    pub option_ids: Vec<String>,
    #[serde(default)]
    pub user_identifier: String,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
}

/// Submit a vote.
async fn submit(
    State(state): State<AppState>,
    user_agent: Option<TypedHeader<UserAgent>>,
    Json(req): Json<SubmitVoteRequest>,
) -> AppResult<ActionResponse> {
    if req.voting_id.trim().is_empty() || req.user_identifier.trim().is_empty() {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    }

    state
        .submission_service
        .submit(SubmitVoteInput {
            voting_id: req.voting_id,
            option_ids: req.option_ids,
            user_identifier: req.user_identifier,
            user_email: req.user_email,
            user_name: req.user_name,
            user_agent: user_agent.map(|TypedHeader(ua)| ua.as_str().to_string()),
        })
        .await?;

    Ok(ActionResponse::ok("Vote submitted successfully"))
}

/// Results query.
#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    #[serde(default)]
    pub voting_id: String,
    pub user_identifier: Option<String>,
}

/// Get aggregated results of a voting.
async fn results(
    State(state): State<AppState>,
    Query(query): Query<ResultsQuery>,
) -> AppResult<Json<VotingResults>> {
    if query.voting_id.trim().is_empty() {
        return Err(AppError::BadRequest("voting_id is required".to_string()));
    }

    let user_identifier = query
        .user_identifier
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let results = state
        .results_service
        .get_results(&query.voting_id, user_identifier)
        .await?;

    Ok(Json(results))
}

/// Listing query.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<VotingStatus>,
}

/// List public votings.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<voting::Model>>> {
    let votings = state.admin_service.list_public(query.status).await?;
    Ok(Json(votings))
}

/// Show a voting by slug.
async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<VotingDetail>> {
    let detail = state.admin_service.get_public_by_slug(&slug).await?;
    Ok(Json(detail))
}

/// Create a voting (operator only).
async fn create(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Json(input): Json<CreateVotingInput>,
) -> AppResult<Created<VotingDetail>> {
    let detail = state.admin_service.create(input).await?;
    Ok(Created(detail))
}

/// Status change request.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: VotingStatus,
}

/// Change a voting's status (operator only).
async fn set_status(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetStatusRequest>,
) -> AppResult<Json<voting::Model>> {
    let voting = state.admin_service.set_status(&id, req.status).await?;
    Ok(Json(voting))
}

/// Recompute a voting's counters from its responses (operator only).
async fn reconcile(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ReconcileReport>> {
    let report = state.reconciler.reconcile(&id).await?;
    Ok(Json(report))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/submit", post(submit))
        .route("/results", get(results))
        .route("/{id}", get(show))
        .route("/{id}/status", post(set_status))
        .route("/{id}/reconcile", post(reconcile))
}
