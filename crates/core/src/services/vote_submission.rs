//! Vote submission service.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tally_common::AppError;
use tally_db::repositories::{
    NewSubmission, VotingOptionRepository, VotingRepository, VotingResponseRepository,
};
use thiserror::Error;

use super::voting_validator::{self, Ballot, VoteRejection};

/// Client message for persistence failures.
const SUBMIT_FAILED: &str = "Failed to submit vote";

/// Input for submitting a vote.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitVoteInput {
    pub voting_id: String,
    pub option_ids: Vec<String>,
    pub user_identifier: String,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    /// Filled from the request headers, never from the body.
    #[serde(skip)]
    pub user_agent: Option<String>,
}

/// Accepted submission.
#[derive(Debug, Clone, Serialize)]
pub struct VoteReceipt {
    pub submission_id: String,
    pub voting_id: String,
    pub option_count: i32,
}

/// Why a submission did not go through.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Rejected(#[from] VoteRejection),

    #[error("Voting not found")]
    NotFound,

    #[error("vote persistence failed: {0}")]
    Failed(String),
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Rejected(rejection) => rejection.into(),
            SubmitError::NotFound => Self::NotFound("Voting not found".to_string()),
            SubmitError::Failed(detail) => Self::OperationFailed {
                public: SUBMIT_FAILED,
                detail,
            },
        }
    }
}

/// Validates and records votes.
#[derive(Clone)]
pub struct VoteSubmissionService {
    voting_repo: VotingRepository,
    option_repo: VotingOptionRepository,
    response_repo: VotingResponseRepository,
}

impl VoteSubmissionService {
    /// Create a new vote submission service.
    #[must_use]
    pub const fn new(
        voting_repo: VotingRepository,
        option_repo: VotingOptionRepository,
        response_repo: VotingResponseRepository,
    ) -> Self {
        Self {
            voting_repo,
            option_repo,
            response_repo,
        }
    }

    /// Submit a vote.
    ///
    /// The duplicate pre-check only gives voters a friendly early answer;
    /// the unique index on submissions is what actually rejects a second
    /// vote that races past it.
    pub async fn submit(&self, input: SubmitVoteInput) -> Result<VoteReceipt, SubmitError> {
        let now = Utc::now();

        let voting = self
            .voting_repo
            .find_by_id(&input.voting_id)
            .await
            .map_err(storage_failure)?
            .ok_or(SubmitError::NotFound)?;

        let user_name = normalized(input.user_name.as_deref());
        let user_email = normalized(input.user_email.as_deref());

        let already_voted = self
            .response_repo
            .has_submitted(&voting.id, &input.user_identifier)
            .await
            .map_err(storage_failure)?;
        let options = self
            .option_repo
            .find_by_voting(&voting.id)
            .await
            .map_err(storage_failure)?;

        voting_validator::validate(
            &voting,
            &options,
            &Ballot {
                option_ids: &input.option_ids,
                user_email: user_email.as_deref(),
                user_name: user_name.as_deref(),
            },
            already_voted,
            now,
        )?;

        let metadata = json!({
            "user_agent": input.user_agent.as_deref().unwrap_or("unknown"),
            "submitted_at": now.to_rfc3339(),
        });

        let submission = self
            .response_repo
            .record_submission(NewSubmission {
                voting_id: voting.id.clone(),
                option_ids: input.option_ids,
                user_identifier: input.user_identifier,
                user_id: None,
                user_email,
                user_name,
                metadata,
                submitted_at: now,
            })
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => {
                    tracing::info!(voting_id = %voting.id, "Duplicate vote lost the race");
                    SubmitError::Rejected(VoteRejection::DuplicateVote)
                }
                other => storage_failure(other),
            })?;

        tracing::info!(
            voting_id = %voting.id,
            submission_id = %submission.id,
            options = submission.option_count,
            "Vote submitted"
        );

        Ok(VoteReceipt {
            submission_id: submission.id,
            voting_id: submission.voting_id,
            option_count: submission.option_count,
        })
    }
}

fn storage_failure(err: AppError) -> SubmitError {
    tracing::error!(error = %err, "Vote submission failed");
    SubmitError::Failed(err.to_string())
}

fn normalized(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
