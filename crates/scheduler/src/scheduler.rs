//! Interval-driven job runner.

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tally_common::config::SchedulerSettings;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// Error type returned by job executors.
pub type JobError = Box<dyn std::error::Error + Send + Sync>;

/// Scheduled job types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledJob {
    /// Publish blog posts whose scheduled time has passed.
    PublishScheduledPosts,
    /// Recompute vote counters from responses.
    ReconcileVoteCounts,
}

impl ScheduledJob {
    /// Name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PublishScheduledPosts => "publish_scheduled_posts",
            Self::ReconcileVoteCounts => "reconcile_vote_counts",
        }
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval for the publish sweep (default: 5 minutes).
    pub publish_interval: Duration,
    /// Interval for counter reconciliation (default: daily).
    pub reconcile_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from(&SchedulerSettings::default())
    }
}

impl From<&SchedulerSettings> for SchedulerConfig {
    fn from(settings: &SchedulerSettings) -> Self {
        Self {
            publish_interval: Duration::from_secs(settings.publish_interval_secs.max(1)),
            reconcile_interval: Duration::from_secs(settings.reconcile_interval_secs.max(1)),
        }
    }
}

/// Job executor trait for scheduled jobs.
#[async_trait::async_trait]
pub trait JobExecutor: Send + Sync {
    /// Publish due scheduled posts. Returns the number published.
    async fn publish_scheduled_posts(&self) -> Result<u64, JobError>;

    /// Reconcile vote counters. Returns the number of votings corrected.
    async fn reconcile_vote_counts(&self) -> Result<u64, JobError>;
}

/// Run a single job once.
pub async fn run_job<E: JobExecutor + ?Sized>(
    executor: &E,
    job: ScheduledJob,
) -> Result<u64, JobError> {
    match job {
        ScheduledJob::PublishScheduledPosts => executor.publish_scheduled_posts().await,
        ScheduledJob::ReconcileVoteCounts => executor.reconcile_vote_counts().await,
    }
}

/// Spawn one task per periodic job.
///
/// Each task runs its job immediately and then once per interval. A run
/// that overruns its interval delays the next one instead of bunching up.
pub fn run_scheduler<E: JobExecutor + 'static>(
    config: SchedulerConfig,
    executor: Arc<E>,
) -> Vec<JoinHandle<()>> {
    tracing::info!(
        publish_interval_secs = config.publish_interval.as_secs(),
        reconcile_interval_secs = config.reconcile_interval.as_secs(),
        "Starting scheduler"
    );

    vec![
        spawn_periodic(
            ScheduledJob::PublishScheduledPosts,
            config.publish_interval,
            executor.clone(),
        ),
        spawn_periodic(
            ScheduledJob::ReconcileVoteCounts,
            config.reconcile_interval,
            executor,
        ),
    ]
}

fn spawn_periodic<E: JobExecutor + 'static>(
    job: ScheduledJob,
    period: Duration,
    executor: Arc<E>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match run_job(executor.as_ref(), job).await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(job = job.name(), count, "Scheduled job finished");
                    } else {
                        tracing::debug!(job = job.name(), "Scheduled job had nothing to do");
                    }
                }
                Err(e) => {
                    tracing::error!(job = job.name(), error = %e, "Scheduled job failed");
                }
            }
        }
    })
}
