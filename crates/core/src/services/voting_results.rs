//! Voting results service.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tally_common::{AppError, AppResult};
use tally_db::entities::{
    voting::{self, VotingStatus},
    voting_option,
};
use tally_db::repositories::{VotingOptionRepository, VotingRepository, VotingResponseRepository};

/// An option with its share of the votes.
#[derive(Debug, Clone, Serialize)]
pub struct OptionWithStats {
    #[serde(flatten)]
    pub option: voting_option::Model,
    /// Rounded independently per option, so a voting's percentages need
    /// not add up to exactly 100.
    pub percentage: u32,
}

/// Aggregated results of a voting.
#[derive(Debug, Clone, Serialize)]
pub struct VotingResults {
    pub voting: voting::Model,
    pub options: Vec<OptionWithStats>,
    pub total_votes: i64,
    /// False while a voting that hides its results is still open. Counts
    /// and percentages are then reported as zero.
    pub results_visible: bool,
    pub user_voted: bool,
    pub user_choices: Vec<String>,
}

/// Read side of the voting subsystem.
#[derive(Clone)]
pub struct ResultsService {
    voting_repo: VotingRepository,
    option_repo: VotingOptionRepository,
    response_repo: VotingResponseRepository,
}

impl ResultsService {
    /// Create a new results service.
    #[must_use]
    pub const fn new(
        voting_repo: VotingRepository,
        option_repo: VotingOptionRepository,
        response_repo: VotingResponseRepository,
    ) -> Self {
        Self {
            voting_repo,
            option_repo,
            response_repo,
        }
    }

    /// Results of a voting, optionally with one voter's own choices.
    ///
    /// Drafts are reported as missing. A voting with `show_results` off
    /// keeps its counts to itself until it is closed; the voter's own
    /// choices are still returned.
    ///
    /// The denormalized counters are used as long as they agree with each
    /// other. When they do not, counts are recomputed from the response
    /// rows for this read only.
    pub async fn get_results(
        &self,
        voting_id: &str,
        user_identifier: Option<&str>,
    ) -> AppResult<VotingResults> {
        let mut voting = self.voting_repo.get_by_id(voting_id).await?;
        if voting.status == VotingStatus::Draft {
            return Err(AppError::NotFound("Voting not found".to_string()));
        }
        let results_visible = voting.show_results || voting.status == VotingStatus::Closed;
        let mut options = self.option_repo.find_by_voting(voting_id).await?;

        let counted: i64 = options.iter().map(|o| i64::from(o.vote_count)).sum();
        if !results_visible {
            voting.total_votes = 0;
            for option in &mut options {
                option.vote_count = 0;
            }
        } else if counted != i64::from(voting.total_votes) {
            tracing::warn!(
                voting_id = %voting.id,
                total_votes = voting.total_votes,
                option_sum = counted,
                "Vote counters disagree, recounting responses"
            );

            let actual: HashMap<String, i64> = self
                .response_repo
                .count_by_option(voting_id)
                .await?
                .into_iter()
                .map(|c| (c.option_id, c.votes))
                .collect();

            for option in &mut options {
                let votes = actual.get(&option.id).copied().unwrap_or(0);
                option.vote_count = i32::try_from(votes).unwrap_or(i32::MAX);
            }
            let total: i64 = actual.values().sum();
            voting.total_votes = i32::try_from(total).unwrap_or(i32::MAX);
        }

        let total_votes = i64::from(voting.total_votes);

        let (user_voted, user_choices) = match user_identifier {
            Some(identifier) => {
                let responses = self
                    .response_repo
                    .find_by_voting_and_identifier(voting_id, identifier)
                    .await?;
                let chosen: HashSet<&str> =
                    responses.iter().map(|r| r.option_id.as_str()).collect();
                let choices = options
                    .iter()
                    .filter(|o| chosen.contains(o.id.as_str()))
                    .map(|o| o.id.clone())
                    .collect();
                (!responses.is_empty(), choices)
            }
            None => (false, Vec::new()),
        };

        let options = options
            .into_iter()
            .map(|option| OptionWithStats {
                percentage: percentage(i64::from(option.vote_count), total_votes),
                option,
            })
            .collect();

        Ok(VotingResults {
            voting,
            options,
            total_votes,
            results_visible,
            user_voted,
            user_choices,
        })
    }
}

/// `round(votes / total * 100)`, or 0 without votes.
#[must_use]
pub fn percentage(votes: i64, total: i64) -> u32 {
    if total <= 0 {
        return 0;
    }
    (votes as f64 / total as f64 * 100.0).round() as u32
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;
    use tally_db::entities::{voting::VotingType, voting_response};

    fn voting(total_votes: i32) -> voting::Model {
        voting::Model {
            id: "v1".to_string(),
            title: "Preferred meeting length".to_string(),
            description: None,
            slug: "meeting-length".to_string(),
            status: VotingStatus::Active,
            voting_type: VotingType::Single,
            max_selections: None,
            start_date: None,
            end_date: None,
            show_results: true,
            require_login: false,
            allow_anonymous: true,
            total_votes,
            created_at: Utc::now().into(),
            updated_at: None,
            published_at: None,
        }
    }

    fn option(id: &str, order: i32, vote_count: i32) -> voting_option::Model {
        voting_option::Model {
            id: id.to_string(),
            voting_id: "v1".to_string(),
            option_text: id.to_string(),
            display_order: order,
            image_url: None,
            vote_count,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn response(option_id: &str, who: &str) -> voting_response::Model {
        voting_response::Model {
            id: format!("r-{option_id}"),
            voting_id: "v1".to_string(),
            option_id: option_id.to_string(),
            submission_id: "s1".to_string(),
            user_id: None,
            user_identifier: who.to_string(),
            user_email: None,
            user_name: None,
            voted_at: Utc::now().into(),
            metadata: serde_json::json!({}),
        }
    }

    fn service(db: DatabaseConnection) -> ResultsService {
        let db = Arc::new(db);
        ResultsService::new(
            VotingRepository::new(db.clone()),
            VotingOptionRepository::new(db.clone()),
            VotingResponseRepository::new(db),
        )
    }

    fn percentages(results: &VotingResults) -> Vec<(String, u32)> {
        results
            .options
            .iter()
            .map(|o| (o.option.id.clone(), o.percentage))
            .collect()
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(3, 4), 75);
        assert_eq!(percentage(1, 4), 25);
        assert_eq!(percentage(0, 4), 0);
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(2, 3), 67);
    }

    #[test]
    fn test_independent_rounding_may_not_sum_to_hundred() {
        let shares: Vec<u32> = (0..3).map(|_| percentage(1, 3)).collect();
        assert_eq!(shares, vec![33, 33, 33]);
        assert_eq!(shares.iter().sum::<u32>(), 99);
    }

    #[tokio::test]
    async fn test_results_from_counters() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[voting(4)]])
            .append_query_results([[option("A", 1, 3), option("B", 2, 1), option("C", 3, 0)]])
            .into_connection();

        let results = service(db).get_results("v1", None).await.unwrap();
        assert!(results.results_visible);
        assert_eq!(results.total_votes, 4);
        assert_eq!(
            percentages(&results),
            vec![
                ("A".to_string(), 75),
                ("B".to_string(), 25),
                ("C".to_string(), 0)
            ]
        );
        assert!(!results.user_voted);
        assert!(results.user_choices.is_empty());
    }

    #[tokio::test]
    async fn test_results_with_voter_choices() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[voting(1)]])
            .append_query_results([[option("optA", 1, 1), option("optB", 2, 0)]])
            .append_query_results([[response("optA", "userX")]])
            .into_connection();

        let results = service(db).get_results("v1", Some("userX")).await.unwrap();
        assert!(results.user_voted);
        assert_eq!(results.user_choices, vec!["optA".to_string()]);
    }

    #[tokio::test]
    async fn test_stale_counters_are_recounted() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[voting(7)]])
            .append_query_results([[option("A", 1, 5), option("B", 2, 0)]])
            .append_query_results([[
                maplit::btreemap! {
                    "option_id" => sea_orm::Value::String(Some(Box::new("A".to_string()))),
                    "votes" => sea_orm::Value::BigInt(Some(1)),
                },
                maplit::btreemap! {
                    "option_id" => sea_orm::Value::String(Some(Box::new("B".to_string()))),
                    "votes" => sea_orm::Value::BigInt(Some(1)),
                },
            ]])
            .into_connection();

        let results = service(db).get_results("v1", None).await.unwrap();
        assert_eq!(results.total_votes, 2);
        assert_eq!(results.voting.total_votes, 2);
        assert_eq!(
            percentages(&results),
            vec![("A".to_string(), 50), ("B".to_string(), 50)]
        );
    }

    #[tokio::test]
    async fn test_missing_voting() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<voting::Model>::new()])
            .into_connection();

        let result = service(db).get_results("nope", None).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_draft_voting_is_not_found() {
        let mut draft = voting(4);
        draft.status = VotingStatus::Draft;

        // Only the voting lookup is queued: options must not be read
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[draft]])
            .into_connection();

        match service(db).get_results("v1", None).await {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "Voting not found"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_hidden_results_keep_voter_choices() {
        let mut hidden = voting(4);
        hidden.show_results = false;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[hidden]])
            .append_query_results([[option("optA", 1, 3), option("optB", 2, 1)]])
            .append_query_results([[response("optA", "userX")]])
            .into_connection();

        let results = service(db).get_results("v1", Some("userX")).await.unwrap();
        assert!(!results.results_visible);
        assert_eq!(results.total_votes, 0);
        assert_eq!(results.voting.total_votes, 0);
        assert!(results.options.iter().all(|o| o.option.vote_count == 0));
        assert!(results.options.iter().all(|o| o.percentage == 0));
        assert!(results.user_voted);
        assert_eq!(results.user_choices, vec!["optA".to_string()]);
    }

    #[tokio::test]
    async fn test_hidden_results_shown_once_closed() {
        let mut closed = voting(4);
        closed.show_results = false;
        closed.status = VotingStatus::Closed;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[closed]])
            .append_query_results([[option("A", 1, 3), option("B", 2, 1)]])
            .into_connection();

        let results = service(db).get_results("v1", None).await.unwrap();
        assert!(results.results_visible);
        assert_eq!(results.total_votes, 4);
        assert_eq!(
            percentages(&results),
            vec![("A".to_string(), 75), ("B".to_string(), 25)]
        );
    }
}
