//! Database entities.

pub mod article_notification;
pub mod blog_post;
pub mod voting;
pub mod voting_option;
pub mod voting_response;
pub mod voting_submission;

pub use article_notification::Entity as ArticleNotification;
pub use blog_post::Entity as BlogPost;
pub use voting::Entity as Voting;
pub use voting_option::Entity as VotingOption;
pub use voting_response::Entity as VotingResponse;
pub use voting_submission::Entity as VotingSubmission;
