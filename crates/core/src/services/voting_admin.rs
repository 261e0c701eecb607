//! Voting administration and public lookup.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tally_common::{AppError, AppResult, IdGenerator};
use tally_db::entities::{
    voting::{self, VotingStatus, VotingType},
    voting_option,
};
use tally_db::repositories::{VotingOptionRepository, VotingRepository};
use validator::Validate;

/// Lowercase words separated by single hyphens.
#[allow(clippy::unwrap_used)]
static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

/// Maximum number of options per voting.
const MAX_OPTIONS: usize = 50;

/// Input for one option of a new voting.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOptionInput {
    #[validate(length(min = 1, max = 512))]
    pub option_text: String,
    #[validate(length(max = 1024))]
    pub image_url: Option<String>,
}

/// Input for creating a voting.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVotingInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(max = 4096))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub slug: String,
    #[serde(default = "default_voting_type")]
    pub voting_type: VotingType,
    #[validate(range(min = 1))]
    pub max_selections: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub show_results: bool,
    #[serde(default)]
    pub require_login: bool,
    #[serde(default = "default_true")]
    pub allow_anonymous: bool,
    #[validate(length(min = 2), nested)]
    pub options: Vec<CreateOptionInput>,
}

const fn default_voting_type() -> VotingType {
    VotingType::Single
}

const fn default_true() -> bool {
    true
}

/// A voting with its options in display order.
#[derive(Debug, Clone, Serialize)]
pub struct VotingDetail {
    pub voting: voting::Model,
    pub options: Vec<voting_option::Model>,
}

/// Service for creating, listing and transitioning votings.
#[derive(Clone)]
pub struct VotingAdminService {
    voting_repo: VotingRepository,
    option_repo: VotingOptionRepository,
    id_gen: IdGenerator,
}

impl VotingAdminService {
    /// Create a new voting admin service.
    #[must_use]
    pub const fn new(voting_repo: VotingRepository, option_repo: VotingOptionRepository) -> Self {
        Self {
            voting_repo,
            option_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a voting in `draft` status together with its options.
    pub async fn create(&self, input: CreateVotingInput) -> AppResult<VotingDetail> {
        input.validate()?;

        if !SLUG_RE.is_match(&input.slug) {
            return Err(AppError::Validation(
                "Slug may only contain lowercase letters, digits and hyphens".to_string(),
            ));
        }
        if input.options.len() > MAX_OPTIONS {
            return Err(AppError::Validation(format!(
                "A voting cannot have more than {MAX_OPTIONS} options"
            )));
        }
        if let (Some(start), Some(end)) = (input.start_date, input.end_date) {
            if end <= start {
                return Err(AppError::Validation(
                    "End date must be after start date".to_string(),
                ));
            }
        }
        if input.voting_type == VotingType::Single && input.max_selections.is_some() {
            return Err(AppError::Validation(
                "max_selections only applies to multiple choice votings".to_string(),
            ));
        }

        if self.voting_repo.slug_exists(&input.slug).await? {
            return Err(AppError::Conflict("Slug is already in use".to_string()));
        }

        let now = Utc::now();
        let voting_id = self.id_gen.generate();

        let voting = voting::ActiveModel {
            id: Set(voting_id.clone()),
            title: Set(input.title.trim().to_string()),
            description: Set(input.description),
            slug: Set(input.slug),
            status: Set(VotingStatus::Draft),
            voting_type: Set(input.voting_type),
            max_selections: Set(input.max_selections),
            start_date: Set(input.start_date.map(Into::into)),
            end_date: Set(input.end_date.map(Into::into)),
            show_results: Set(input.show_results),
            require_login: Set(input.require_login),
            allow_anonymous: Set(input.allow_anonymous),
            total_votes: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(None),
            published_at: Set(None),
        };

        let options = input
            .options
            .into_iter()
            .zip(1..)
            .map(|(option, display_order)| voting_option::ActiveModel {
                id: Set(self.id_gen.generate()),
                voting_id: Set(voting_id.clone()),
                option_text: Set(option.option_text.trim().to_string()),
                display_order: Set(display_order),
                image_url: Set(option.image_url),
                vote_count: Set(0),
                created_at: Set(now.into()),
                updated_at: Set(None),
            })
            .collect();

        let (voting, options) = self.voting_repo.create_with_options(voting, options).await?;
        tracing::info!(voting_id = %voting.id, slug = %voting.slug, "Created voting");

        Ok(VotingDetail { voting, options })
    }

    /// Move a voting to another status.
    ///
    /// Votings may be reopened, but never sent back to `draft` once they
    /// have been published.
    pub async fn set_status(&self, id: &str, status: VotingStatus) -> AppResult<voting::Model> {
        let current = self.voting_repo.get_by_id(id).await?;
        if status == VotingStatus::Draft && current.published_at.is_some() {
            return Err(AppError::BadRequest(
                "A published voting cannot return to draft".to_string(),
            ));
        }

        let updated = self.voting_repo.update_status(id, status).await?;
        tracing::info!(voting_id = %id, status = ?status, "Changed voting status");
        Ok(updated)
    }

    /// Public listing; drafts are never included.
    pub async fn list_public(&self, status: Option<VotingStatus>) -> AppResult<Vec<voting::Model>> {
        let statuses: &[VotingStatus] = match status {
            Some(VotingStatus::Draft) => return Ok(Vec::new()),
            Some(VotingStatus::Active) => &[VotingStatus::Active],
            Some(VotingStatus::Closed) => &[VotingStatus::Closed],
            None => &[VotingStatus::Active, VotingStatus::Closed],
        };
        self.voting_repo.list_by_statuses(statuses).await
    }

    /// Public lookup by slug; drafts are reported as missing.
    pub async fn get_public_by_slug(&self, slug: &str) -> AppResult<VotingDetail> {
        let voting = self
            .voting_repo
            .find_by_slug(slug)
            .await?
            .filter(|v| v.status != VotingStatus::Draft)
            .ok_or_else(|| AppError::NotFound("Voting not found".to_string()))?;
        let options = self.option_repo.find_by_voting(&voting.id).await?;

        Ok(VotingDetail { voting, options })
    }
}
