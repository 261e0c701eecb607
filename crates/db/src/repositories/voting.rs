//! Voting repository.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use tally_common::{AppError, AppResult};

use super::{is_unique_violation, voting_response::OptionVoteCount};
use crate::entities::{
    Voting, VotingOption, VotingResponse,
    voting::{self, VotingStatus},
    voting_option, voting_response,
};

/// Repository for voting definitions.
#[derive(Clone)]
pub struct VotingRepository {
    db: Arc<DatabaseConnection>,
}

impl VotingRepository {
    /// Create a new voting repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a voting by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<voting::Model>> {
        Voting::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a voting by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<voting::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Voting not found".to_string()))
    }

    /// Find a voting by its slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<voting::Model>> {
        Voting::find()
            .filter(voting::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a slug is already taken.
    pub async fn slug_exists(&self, slug: &str) -> AppResult<bool> {
        let count = Voting::find()
            .filter(voting::Column::Slug.eq(slug))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// List votings in any of the given statuses, newest first.
    pub async fn list_by_statuses(
        &self,
        statuses: &[VotingStatus],
    ) -> AppResult<Vec<voting::Model>> {
        Voting::find()
            .filter(voting::Column::Status.is_in(statuses.iter().copied()))
            .order_by_desc(voting::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a voting together with its options in one transaction.
    pub async fn create_with_options(
        &self,
        voting: voting::ActiveModel,
        options: Vec<voting_option::ActiveModel>,
    ) -> AppResult<(voting::Model, Vec<voting_option::Model>)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let voting = voting.insert(&txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Slug is already in use".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })?;

        let mut inserted = Vec::with_capacity(options.len());
        for option in options {
            let option = option
                .insert(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            inserted.push(option);
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((voting, inserted))
    }

    /// Update a voting.
    pub async fn update(&self, model: voting::ActiveModel) -> AppResult<voting::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Change the status of a voting.
    ///
    /// The first activation stamps `published_at`.
    pub async fn update_status(&self, id: &str, status: VotingStatus) -> AppResult<voting::Model> {
        let voting = self.get_by_id(id).await?;
        let now = Utc::now();
        let first_activation = status == VotingStatus::Active && voting.published_at.is_none();

        let mut active: voting::ActiveModel = voting.into();
        active.status = Set(status);
        active.updated_at = Set(Some(now.into()));
        if first_activation {
            active.published_at = Set(Some(now.into()));
        }
        self.update(active).await
    }

    /// Recompute the counters of a voting and its options from the
    /// response rows.
    ///
    /// Runs in one transaction holding the voting row lock. Submissions take
    /// that lock before touching any counter, so no vote can commit between
    /// the count and the write. Counters are only written when they drifted,
    /// and the write itself counts the responses again in the database.
    pub async fn recount(&self, voting_id: &str) -> AppResult<CounterRecount> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let voting = Voting::find_by_id(voting_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound("Voting not found".to_string()))?;

        let options = VotingOption::find()
            .filter(voting_option::Column::VotingId.eq(voting_id))
            .order_by_asc(voting_option::Column::DisplayOrder)
            .all(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let actual: HashMap<String, i64> = VotingResponse::find()
            .select_only()
            .column(voting_response::Column::OptionId)
            .column_as(voting_response::Column::Id.count(), "votes")
            .filter(voting_response::Column::VotingId.eq(voting_id))
            .group_by(voting_response::Column::OptionId)
            .into_model::<OptionVoteCount>()
            .all(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|c| (c.option_id, c.votes))
            .collect();

        let options: Vec<OptionRecount> = options
            .into_iter()
            .map(|option| {
                let votes = actual.get(&option.id).copied().unwrap_or(0);
                OptionRecount {
                    recorded: option.vote_count,
                    actual: i32::try_from(votes).unwrap_or(i32::MAX),
                    option_id: option.id,
                }
            })
            .collect();
        let recount = CounterRecount {
            recorded_total: voting.total_votes,
            actual_total: i32::try_from(actual.values().sum::<i64>()).unwrap_or(i32::MAX),
            options,
        };

        if recount.has_drifted() {
            let now = Utc::now();
            VotingOption::update_many()
                .col_expr(
                    voting_option::Column::VoteCount,
                    Expr::cust(
                        "(SELECT COUNT(*) FROM voting_responses \
                         WHERE voting_responses.option_id = voting_options.id)",
                    ),
                )
                .col_expr(voting_option::Column::UpdatedAt, Expr::value(now))
                .filter(voting_option::Column::VotingId.eq(voting_id))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            Voting::update_many()
                .col_expr(
                    voting::Column::TotalVotes,
                    Expr::cust(
                        "(SELECT COUNT(*) FROM voting_responses \
                         WHERE voting_responses.voting_id = votings.id)",
                    ),
                )
                .col_expr(voting::Column::UpdatedAt, Expr::value(now))
                .filter(voting::Column::Id.eq(voting_id))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(recount)
    }
}

/// Stored and counted votes of one option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRecount {
    /// Option ID.
    pub option_id: String,
    /// Value of `vote_count` before the recount.
    pub recorded: i32,
    /// Response rows selecting the option.
    pub actual: i32,
}

/// Counters of a voting as read under its row lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterRecount {
    /// Value of `total_votes` before the recount.
    pub recorded_total: i32,
    /// Response rows of the voting.
    pub actual_total: i32,
    /// Options in display order.
    pub options: Vec<OptionRecount>,
}

impl CounterRecount {
    /// Whether any stored counter disagreed with the response rows.
    #[must_use]
    pub fn has_drifted(&self) -> bool {
        self.recorded_total != self.actual_total
            || self.options.iter().any(|o| o.recorded != o.actual)
    }
}
