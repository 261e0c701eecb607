//! Periodic jobs for tally.
//!
//! Runs the scheduled-post publish sweep and vote counter reconciliation
//! on fixed intervals inside the server process. Deployments that prefer
//! an external cron disable this and call the HTTP endpoint instead.

pub mod executor;
pub mod scheduler;

pub use executor::CoreJobExecutor;
pub use scheduler::{JobError, JobExecutor, ScheduledJob, SchedulerConfig, run_job, run_scheduler};
