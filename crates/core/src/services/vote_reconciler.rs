//! Vote counter reconciliation.
//!
//! Recomputes `vote_count` and `total_votes` from the response rows and
//! writes them back when they drifted. The count and the write happen under
//! the voting row lock, so a vote arriving mid-pass is never erased.

use serde::Serialize;
use tally_common::AppResult;
use tally_db::entities::voting::VotingStatus;
use tally_db::repositories::VotingRepository;

/// An option whose stored counter did not match its responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionDrift {
    pub option_id: String,
    pub recorded: i32,
    pub actual: i32,
}

/// Outcome of reconciling one voting.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub voting_id: String,
    pub recorded_total: i32,
    pub actual_total: i32,
    pub drifted: Vec<OptionDrift>,
    /// Whether corrected counters were written.
    pub corrected: bool,
}

/// Outcome of a reconciliation pass over many votings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileSummary {
    pub checked: usize,
    pub corrected: usize,
    pub failed: usize,
}

/// Keeps denormalized vote counters honest.
#[derive(Clone)]
pub struct VoteCountReconciler {
    voting_repo: VotingRepository,
}

impl VoteCountReconciler {
    /// Create a new reconciler.
    #[must_use]
    pub const fn new(voting_repo: VotingRepository) -> Self {
        Self { voting_repo }
    }

    /// Reconcile a single voting.
    pub async fn reconcile(&self, voting_id: &str) -> AppResult<ReconcileReport> {
        let recount = self.voting_repo.recount(voting_id).await?;
        let corrected = recount.has_drifted();

        let drifted: Vec<OptionDrift> = recount
            .options
            .into_iter()
            .filter(|o| o.recorded != o.actual)
            .map(|o| OptionDrift {
                option_id: o.option_id,
                recorded: o.recorded,
                actual: o.actual,
            })
            .collect();

        if corrected {
            tracing::warn!(
                voting_id = %voting_id,
                recorded_total = recount.recorded_total,
                actual_total = recount.actual_total,
                drifted_options = drifted.len(),
                "Corrected drifted vote counters"
            );
        }

        Ok(ReconcileReport {
            voting_id: voting_id.to_string(),
            recorded_total: recount.recorded_total,
            actual_total: recount.actual_total,
            drifted,
            corrected,
        })
    }

    /// Reconcile every voting that can hold votes.
    ///
    /// A failure on one voting is logged and does not stop the pass.
    pub async fn reconcile_open(&self) -> AppResult<ReconcileSummary> {
        let votings = self
            .voting_repo
            .list_by_statuses(&[VotingStatus::Active, VotingStatus::Closed])
            .await?;

        let mut summary = ReconcileSummary::default();
        for voting in votings {
            summary.checked += 1;
            match self.reconcile(&voting.id).await {
                Ok(report) if report.corrected => summary.corrected += 1,
                Ok(_) => {}
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(voting_id = %voting.id, error = %e, "Reconciliation failed");
                }
            }
        }

        tracing::info!(
            checked = summary.checked,
            corrected = summary.corrected,
            failed = summary.failed,
            "Vote counter reconciliation finished"
        );

        Ok(summary)
    }
}
