//! Voting option repository.

use std::sync::Arc;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tally_common::{AppError, AppResult};

use crate::entities::{VotingOption, voting_option};

/// Repository for voting options.
#[derive(Clone)]
pub struct VotingOptionRepository {
    db: Arc<DatabaseConnection>,
}

impl VotingOptionRepository {
    /// Create a new voting option repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Options of a voting in display order.
    pub async fn find_by_voting(&self, voting_id: &str) -> AppResult<Vec<voting_option::Model>> {
        VotingOption::find()
            .filter(voting_option::Column::VotingId.eq(voting_id))
            .order_by_asc(voting_option::Column::DisplayOrder)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
