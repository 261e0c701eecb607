//! Article notification repository.

use std::sync::Arc;

use sea_orm::{DatabaseConnection, EntityTrait, sea_query::OnConflict};
use tally_common::{AppError, AppResult};

use crate::entities::{ArticleNotification, article_notification};

/// Repository for the article notification sink.
#[derive(Clone)]
pub struct ArticleNotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl ArticleNotificationRepository {
    /// Create a new article notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert notifications, skipping posts that already have one.
    ///
    /// Returns the number of rows actually inserted.
    pub async fn insert_many_skip_existing(
        &self,
        notifications: Vec<article_notification::ActiveModel>,
    ) -> AppResult<u64> {
        if notifications.is_empty() {
            return Ok(0);
        }

        ArticleNotification::insert_many(notifications)
            .on_conflict(
                OnConflict::column(article_notification::Column::PostId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
