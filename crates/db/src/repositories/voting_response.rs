//! Voting response repository.
//!
//! Owns the transactional write of a vote submission.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use serde_json::Value as JsonValue;
use tally_common::{AppError, AppResult, IdGenerator};

use super::is_unique_violation;
use crate::entities::{
    Voting, VotingOption, VotingResponse, VotingSubmission, voting, voting_option,
    voting_response, voting_submission,
};

/// A validated submission ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    /// Target voting.
    pub voting_id: String,
    /// Selected options; distinct and owned by the voting.
    pub option_ids: Vec<String>,
    /// Pseudo-anonymous voter fingerprint.
    pub user_identifier: String,
    /// Platform account, when known.
    pub user_id: Option<String>,
    /// Voter email.
    pub user_email: Option<String>,
    /// Voter display name.
    pub user_name: Option<String>,
    /// Stored on every row of the submission.
    pub metadata: JsonValue,
    /// Timestamp shared by the submission and its responses.
    pub submitted_at: DateTime<Utc>,
}

/// Number of response rows for one option.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct OptionVoteCount {
    /// Option ID.
    pub option_id: String,
    /// Response rows selecting the option.
    pub votes: i64,
}

/// Repository for vote submissions and their response rows.
#[derive(Clone)]
pub struct VotingResponseRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl VotingResponseRepository {
    /// Create a new voting response repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Whether a voter already has a recorded submission for a voting.
    pub async fn has_submitted(&self, voting_id: &str, user_identifier: &str) -> AppResult<bool> {
        let count = VotingSubmission::find()
            .filter(voting_submission::Column::VotingId.eq(voting_id))
            .filter(voting_submission::Column::UserIdentifier.eq(user_identifier))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Response rows of one voter for a voting.
    pub async fn find_by_voting_and_identifier(
        &self,
        voting_id: &str,
        user_identifier: &str,
    ) -> AppResult<Vec<voting_response::Model>> {
        VotingResponse::find()
            .filter(voting_response::Column::VotingId.eq(voting_id))
            .filter(voting_response::Column::UserIdentifier.eq(user_identifier))
            .order_by_asc(voting_response::Column::VotedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count response rows per option of a voting.
    ///
    /// Options without responses are absent from the result.
    pub async fn count_by_option(&self, voting_id: &str) -> AppResult<Vec<OptionVoteCount>> {
        VotingResponse::find()
            .select_only()
            .column(voting_response::Column::OptionId)
            .column_as(voting_response::Column::Id.count(), "votes")
            .filter(voting_response::Column::VotingId.eq(voting_id))
            .group_by(voting_response::Column::OptionId)
            .into_model::<OptionVoteCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Persist a submission atomically.
    ///
    /// Bumps the voting total by the number of options, inserts the
    /// submission row and one response row per option, then bumps each
    /// option counter by one. A unique violation on the submission means another
    /// request for the same voter won the race and is reported as
    /// [`AppError::Conflict`].
    pub async fn record_submission(
        &self,
        input: NewSubmission,
    ) -> AppResult<voting_submission::Model> {
        let selected = i32::try_from(input.option_ids.len())
            .map_err(|_| AppError::BadRequest("Too many options selected".to_string()))?;
        let submitted_at = input.submitted_at.into();

        let submission = voting_submission::Model {
            id: self.id_gen.generate(),
            voting_id: input.voting_id.clone(),
            user_identifier: input.user_identifier.clone(),
            user_id: input.user_id.clone(),
            user_email: input.user_email.clone(),
            user_name: input.user_name.clone(),
            option_count: selected,
            metadata: input.metadata.clone(),
            submitted_at,
        };

        let responses: Vec<voting_response::ActiveModel> = input
            .option_ids
            .iter()
            .map(|option_id| voting_response::ActiveModel {
                id: Set(self.id_gen.generate()),
                voting_id: Set(input.voting_id.clone()),
                option_id: Set(option_id.clone()),
                submission_id: Set(submission.id.clone()),
                user_id: Set(input.user_id.clone()),
                user_identifier: Set(input.user_identifier.clone()),
                user_email: Set(input.user_email.clone()),
                user_name: Set(input.user_name.clone()),
                voted_at: Set(submitted_at),
                metadata: Set(input.metadata.clone()),
            })
            .collect();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // The total goes first so the voting row lock is taken before any
        // other row; counter recounts lock the same row.
        Voting::update_many()
            .col_expr(
                voting::Column::TotalVotes,
                Expr::col(voting::Column::TotalVotes).add(selected),
            )
            .filter(voting::Column::Id.eq(input.voting_id.as_str()))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let active: voting_submission::ActiveModel = submission.clone().into();
        VotingSubmission::insert(active.reset_all())
            .exec_without_returning(&txn)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Submission already recorded".to_string())
                } else {
                    AppError::Database(e.to_string())
                }
            })?;

        VotingResponse::insert_many(responses)
            .exec_without_returning(&txn)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Submission already recorded".to_string())
                } else {
                    AppError::Database(e.to_string())
                }
            })?;

        let updated = VotingOption::update_many()
            .col_expr(
                voting_option::Column::VoteCount,
                Expr::col(voting_option::Column::VoteCount).add(1),
            )
            .filter(voting_option::Column::Id.is_in(input.option_ids.iter().cloned()))
            .filter(voting_option::Column::VotingId.eq(input.voting_id.as_str()))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Dropping the transaction rolls back the rows inserted above
        if updated.rows_affected != u64::from(selected.unsigned_abs()) {
            return Err(AppError::Database(format!(
                "expected {selected} option counters to change, {} did",
                updated.rows_affected
            )));
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(
            voting_id = %submission.voting_id,
            submission_id = %submission.id,
            options = selected,
            "Recorded vote submission"
        );

        Ok(submission)
    }
}
