//! Scheduled content publisher.
//!
//! Promotes blog posts whose publish time has passed and raises article
//! notifications for the ones that asked for it. Publishing is the primary
//! effect: a failed status update fails the whole sweep, while a failed
//! notification insert is only logged.

use chrono::Utc;
use sea_orm::Set;
use serde::Serialize;
use tally_common::{AppError, AppResult, IdGenerator};
use tally_db::entities::{article_notification, blog_post};
use tally_db::repositories::{ArticleNotificationRepository, BlogPostRepository};
use url::Url;

/// Result of one publish sweep.
#[derive(Debug, Clone, Serialize)]
pub struct PublishSummary {
    pub success: bool,
    pub message: String,
    pub published: u64,
    /// Titles of the posts this sweep published.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<String>>,
}

/// Service that publishes due scheduled posts.
#[derive(Clone)]
pub struct ScheduledPublisherService {
    post_repo: BlogPostRepository,
    notification_repo: ArticleNotificationRepository,
    site_url: Url,
    id_gen: IdGenerator,
}

impl ScheduledPublisherService {
    /// Create a new publisher.
    ///
    /// `site_url` is the public root that article links are built on.
    pub fn new(
        post_repo: BlogPostRepository,
        notification_repo: ArticleNotificationRepository,
        site_url: &str,
    ) -> AppResult<Self> {
        let mut site_url = Url::parse(site_url)
            .map_err(|e| AppError::Config(format!("Invalid server url {site_url}: {e}")))?;
        if !site_url.path().ends_with('/') {
            let path = format!("{}/", site_url.path());
            site_url.set_path(&path);
        }

        Ok(Self {
            post_repo,
            notification_repo,
            site_url,
            id_gen: IdGenerator::new(),
        })
    }

    /// Public link to a post.
    pub fn article_url(&self, slug: &str) -> AppResult<String> {
        self.site_url
            .join(&format!("blog/{slug}"))
            .map(String::from)
            .map_err(|e| AppError::Internal(format!("Cannot build article url: {e}")))
    }

    /// Publish every scheduled post that is due.
    ///
    /// Safe to run repeatedly or concurrently: the status update only
    /// touches rows still marked `scheduled` and a post can carry at most
    /// one notification.
    pub async fn run_sweep(&self) -> AppResult<PublishSummary> {
        let now = Utc::now();
        let due = self.post_repo.find_due_scheduled(now).await?;

        if due.is_empty() {
            tracing::debug!("No scheduled posts due");
            return Ok(PublishSummary {
                success: true,
                message: "No posts to publish".to_string(),
                published: 0,
                posts: None,
            });
        }

        let ids: Vec<String> = due.iter().map(|p| p.id.clone()).collect();
        // Only rows this sweep flipped count; anything unscheduled or already
        // taken by another sweep since the select is skipped.
        let published = self.post_repo.publish_batch(&ids, now).await?;

        tracing::info!(
            due = due.len(),
            published = published.len(),
            "Published scheduled posts"
        );

        let flagged: Vec<&blog_post::Model> =
            published.iter().filter(|p| p.send_notification).collect();
        if !flagged.is_empty() {
            if let Err(e) = self.notify(&flagged).await {
                tracing::error!(
                    error = %e,
                    posts = flagged.len(),
                    "Failed to create article notifications"
                );
            }
        }

        let count = published.len() as u64;
        Ok(PublishSummary {
            success: true,
            message: format!("Published {count} post(s)"),
            published: count,
            posts: Some(published.into_iter().map(|p| p.title).collect()),
        })
    }

    async fn notify(&self, posts: &[&blog_post::Model]) -> AppResult<u64> {
        let now = Utc::now();
        let mut notifications = Vec::with_capacity(posts.len());

        for post in posts {
            notifications.push(article_notification::ActiveModel {
                id: Set(self.id_gen.generate()),
                post_id: Set(post.id.clone()),
                title: Set(post.title.clone()),
                excerpt: Set(post.excerpt.clone()),
                image_url: Set(post.featured_image.clone()),
                category: Set(post.category.clone()),
                url: Set(self.article_url(&post.slug)?),
                created_at: Set(now.into()),
            });
        }

        let inserted = self
            .notification_repo
            .insert_many_skip_existing(notifications)
            .await?;
        tracing::debug!(inserted, "Created article notifications");

        Ok(inserted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{
        DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult, RuntimeErr,
    };
    use std::sync::Arc;
    use tally_db::entities::blog_post::BlogPostStatus;

    fn due_post(id: &str, send_notification: bool) -> blog_post::Model {
        blog_post::Model {
            id: id.to_string(),
            title: format!("Post {id}"),
            slug: format!("post-{id}"),
            excerpt: Some("Short summary".to_string()),
            content: "Body".to_string(),
            featured_image: Some("https://cdn.example.com/cover.png".to_string()),
            category: Some("product".to_string()),
            status: BlogPostStatus::Scheduled,
            scheduled_at: Some((Utc::now() - Duration::minutes(1)).into()),
            published_at: None,
            send_notification,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn published(mut post: blog_post::Model) -> blog_post::Model {
        post.status = BlogPostStatus::Published;
        post.published_at = post.scheduled_at;
        post
    }

    fn exec_ok(rows: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: rows,
        }
    }

    fn publisher(db: Arc<DatabaseConnection>) -> ScheduledPublisherService {
        ScheduledPublisherService::new(
            BlogPostRepository::new(db.clone()),
            ArticleNotificationRepository::new(db),
            "https://example.com",
        )
        .unwrap()
    }

    #[test]
    fn test_article_url() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = publisher(db);
        assert_eq!(
            service.article_url("hello-world").unwrap(),
            "https://example.com/blog/hello-world"
        );

        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let nested = ScheduledPublisherService::new(
            BlogPostRepository::new(db.clone()),
            ArticleNotificationRepository::new(db),
            "https://example.com/site",
        )
        .unwrap();
        assert_eq!(
            nested.article_url("hello-world").unwrap(),
            "https://example.com/site/blog/hello-world"
        );
    }

    #[test]
    fn test_invalid_site_url() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let result = ScheduledPublisherService::new(
            BlogPostRepository::new(db.clone()),
            ArticleNotificationRepository::new(db),
            "not a url",
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_sweep_without_due_posts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<blog_post::Model>::new()])
                .append_query_results([Vec::<blog_post::Model>::new()])
                .into_connection(),
        );
        let service = publisher(db);

        // Running twice with nothing due changes nothing
        for _ in 0..2 {
            let summary = service.run_sweep().await.unwrap();
            assert!(summary.success);
            assert_eq!(summary.published, 0);
            assert_eq!(summary.message, "No posts to publish");
            assert!(summary.posts.is_none());
        }
    }

    #[tokio::test]
    async fn test_sweep_publishes_and_notifies_flagged_posts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[due_post("p1", true), due_post("p2", false)]])
                .append_query_results([[
                    published(due_post("p1", true)),
                    published(due_post("p2", false)),
                ]])
                .append_exec_results([exec_ok(1)])
                .into_connection(),
        );

        let summary = publisher(db.clone()).run_sweep().await.unwrap();
        assert!(summary.success);
        assert_eq!(summary.published, 2);
        assert_eq!(
            summary.posts,
            Some(vec!["Post p1".to_string(), "Post p2".to_string()])
        );

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        assert_eq!(log.len(), 3);
        let insert = format!("{:?}", log[2]);
        assert!(insert.contains("article_notifications"));
        assert!(insert.contains("https://example.com/blog/post-p1"));
        assert!(!insert.contains("post-p2"));
    }

    #[tokio::test]
    async fn test_status_update_failure_fails_sweep_without_notifications() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[due_post("p1", true)]])
                .append_query_errors([DbErr::Query(RuntimeErr::Internal(
                    "connection reset".to_string(),
                ))])
                .into_connection(),
        );

        let result = publisher(db.clone()).run_sweep().await;
        assert!(matches!(result, Err(AppError::Database(_))));

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        assert!(log
            .iter()
            .all(|t| !format!("{t:?}").contains("article_notifications")));
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_sweep() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[due_post("p1", true)]])
                .append_query_results([[published(due_post("p1", true))]])
                .append_exec_errors([DbErr::Exec(RuntimeErr::Internal(
                    "relation does not exist".to_string(),
                ))])
                .into_connection(),
        );

        let summary = publisher(db).run_sweep().await.unwrap();
        assert!(summary.success);
        assert_eq!(summary.published, 1);
    }

    #[tokio::test]
    async fn test_sweep_skips_posts_unscheduled_after_select() {
        // The post was due when selected but the update changed no rows
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[due_post("p1", true)]])
                .append_query_results([Vec::<blog_post::Model>::new()])
                .into_connection(),
        );

        let summary = publisher(db.clone()).run_sweep().await.unwrap();
        assert!(summary.success);
        assert_eq!(summary.published, 0);
        assert_eq!(summary.message, "Published 0 post(s)");
        assert_eq!(summary.posts, Some(Vec::new()));

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        assert_eq!(log.len(), 2);
        assert!(log
            .iter()
            .all(|t| !format!("{t:?}").contains("article_notifications")));
    }

    #[tokio::test]
    async fn test_sweep_notifies_only_posts_it_published() {
        // p2 was published by a concurrent sweep in between
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[due_post("p1", true), due_post("p2", true)]])
                .append_query_results([[published(due_post("p1", true))]])
                .append_exec_results([exec_ok(1)])
                .into_connection(),
        );

        let summary = publisher(db.clone()).run_sweep().await.unwrap();
        assert_eq!(summary.published, 1);
        assert_eq!(summary.posts, Some(vec!["Post p1".to_string()]));

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        let insert = format!("{:?}", log[2]);
        assert!(insert.contains("https://example.com/blog/post-p1"));
        assert!(!insert.contains("post-p2"));
    }
}
