//! Application state shared by all handlers.

#![allow(missing_docs)]

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tally_common::{AppResult, Config};
use tally_core::{
    ResultsService, ScheduledPublisherService, VoteCountReconciler, VoteSubmissionService,
    VotingAdminService,
};
use tally_db::repositories::{
    ArticleNotificationRepository, BlogPostRepository, VotingOptionRepository, VotingRepository,
    VotingResponseRepository,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub submission_service: VoteSubmissionService,
    pub results_service: ResultsService,
    pub admin_service: VotingAdminService,
    pub reconciler: VoteCountReconciler,
    pub publisher: ScheduledPublisherService,
    /// Bearer token for operator endpoints; `None` refuses them all.
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    pub fn new(db: Arc<DatabaseConnection>, config: &Config) -> AppResult<Self> {
        let voting_repo = VotingRepository::new(db.clone());
        let option_repo = VotingOptionRepository::new(db.clone());
        let response_repo = VotingResponseRepository::new(db.clone());
        let post_repo = BlogPostRepository::new(db.clone());
        let notification_repo = ArticleNotificationRepository::new(db);

        let publisher =
            ScheduledPublisherService::new(post_repo, notification_repo, &config.server.url)?;

        let admin_token = config
            .admin
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Arc::from);
        if admin_token.is_none() {
            tracing::warn!("admin.token is not set, operator endpoints are disabled");
        }

        Ok(Self {
            submission_service: VoteSubmissionService::new(
                voting_repo.clone(),
                option_repo.clone(),
                response_repo.clone(),
            ),
            results_service: ResultsService::new(
                voting_repo.clone(),
                option_repo.clone(),
                response_repo,
            ),
            admin_service: VotingAdminService::new(voting_repo.clone(), option_repo),
            reconciler: VoteCountReconciler::new(voting_repo),
            publisher,
            admin_token,
        })
    }
}
