//! Blog post repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, sea_query::Expr,
};
use tally_common::{AppError, AppResult};

use crate::entities::{
    BlogPost,
    blog_post::{self, BlogPostStatus},
};

/// Repository for blog post publication state.
#[derive(Clone)]
pub struct BlogPostRepository {
    db: Arc<DatabaseConnection>,
}

impl BlogPostRepository {
    /// Create a new blog post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Scheduled posts whose `scheduled_at` is at or before `now`.
    pub async fn find_due_scheduled(
        &self,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<blog_post::Model>> {
        BlogPost::find()
            .filter(blog_post::Column::Status.eq(BlogPostStatus::Scheduled))
            .filter(blog_post::Column::ScheduledAt.lte(now))
            .order_by_asc(blog_post::Column::ScheduledAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark the given posts as published in one statement.
    ///
    /// `published_at` takes the post's own `scheduled_at`. Rows that are no
    /// longer `scheduled` are left alone, so a concurrent sweep cannot
    /// publish a post twice. Returns the rows this call actually changed.
    pub async fn publish_batch(
        &self,
        ids: &[String],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<blog_post::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        BlogPost::update_many()
            .col_expr(
                blog_post::Column::Status,
                Expr::value(BlogPostStatus::Published),
            )
            .col_expr(
                blog_post::Column::PublishedAt,
                Expr::col(blog_post::Column::ScheduledAt).into(),
            )
            .col_expr(blog_post::Column::UpdatedAt, Expr::value(now))
            .filter(blog_post::Column::Id.is_in(ids.iter().cloned()))
            .filter(blog_post::Column::Status.eq(BlogPostStatus::Scheduled))
            .exec_with_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
