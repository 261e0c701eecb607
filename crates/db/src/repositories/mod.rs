//! Repository layer for database operations.

mod article_notification;
mod blog_post;
mod voting;
mod voting_option;
mod voting_response;

pub use article_notification::ArticleNotificationRepository;
pub use blog_post::BlogPostRepository;
pub use voting::{CounterRecount, OptionRecount, VotingRepository};
pub use voting_option::VotingOptionRepository;
pub use voting_response::{NewSubmission, OptionVoteCount, VotingResponseRepository};

use sea_orm::{DbErr, SqlErr};

/// Whether a database error is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
