//! Business logic services.

#![allow(missing_docs)]

pub mod scheduled_publisher;
pub mod vote_reconciler;
pub mod vote_submission;
pub mod voting_admin;
pub mod voting_results;
pub mod voting_validator;

pub use scheduled_publisher::{PublishSummary, ScheduledPublisherService};
pub use vote_reconciler::{OptionDrift, ReconcileReport, ReconcileSummary, VoteCountReconciler};
pub use vote_submission::{SubmitError, SubmitVoteInput, VoteReceipt, VoteSubmissionService};
pub use voting_admin::{CreateOptionInput, CreateVotingInput, VotingAdminService, VotingDetail};
pub use voting_results::{OptionWithStats, ResultsService, VotingResults};
pub use voting_validator::{Ballot, VoteRejection};
