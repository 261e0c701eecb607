//! Job executor backed by the core services.

use tally_core::{ScheduledPublisherService, VoteCountReconciler};

use crate::scheduler::{JobError, JobExecutor};

/// Runs scheduled jobs against the database through the core services.
#[derive(Clone)]
pub struct CoreJobExecutor {
    publisher: ScheduledPublisherService,
    reconciler: VoteCountReconciler,
}

impl CoreJobExecutor {
    /// Create a new executor.
    #[must_use]
    pub const fn new(publisher: ScheduledPublisherService, reconciler: VoteCountReconciler) -> Self {
        Self {
            publisher,
            reconciler,
        }
    }
}

#[async_trait::async_trait]
impl JobExecutor for CoreJobExecutor {
    async fn publish_scheduled_posts(&self) -> Result<u64, JobError> {
        let summary = self.publisher.run_sweep().await?;
        Ok(summary.published)
    }

    async fn reconcile_vote_counts(&self) -> Result<u64, JobError> {
        let summary = self.reconciler.reconcile_open().await?;
        if summary.failed > 0 {
            tracing::warn!(failed = summary.failed, "Some votings could not be reconciled");
        }
        Ok(summary.corrected as u64)
    }
}
