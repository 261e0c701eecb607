//! Vote validation rules.
//!
//! Everything here is pure: the caller supplies the voting, its options,
//! whether the voter already has a submission, and the current time.
//! [`validate`] runs the checks in a fixed order and stops at the first
//! failure, so a voter always sees the most fundamental problem first.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tally_common::AppError;
use tally_db::entities::{
    voting::{self, VotingStatus, VotingType},
    voting_option,
};
use thiserror::Error;

/// Loose `local@domain.tld` shape check.
#[allow(clippy::unwrap_used)]
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Why a submission was refused.
///
/// The display text is shown to voters verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteRejection {
    #[error("Voting is not active")]
    NotActive,

    #[error("Voting has not started yet")]
    NotStarted,

    #[error("Voting has ended")]
    Ended,

    #[error("Nama dan email wajib diisi")]
    MissingIdentity,

    #[error("Format email tidak valid")]
    InvalidEmail,

    #[error("Anda sudah pernah vote sebelumnya")]
    DuplicateVote,

    #[error("Single choice voting allows only one option")]
    InvalidSelectionCount,

    #[error("Please select at least one option")]
    EmptySelection,

    #[error("Maximum {max} selections allowed")]
    TooManySelections { max: i32 },

    #[error("Invalid option selected")]
    UnknownOption,

    #[error("Each option can only be selected once")]
    RepeatedOption,
}

impl VoteRejection {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotActive => "NOT_ACTIVE",
            Self::NotStarted => "NOT_STARTED",
            Self::Ended => "ENDED",
            Self::MissingIdentity => "MISSING_IDENTITY",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::DuplicateVote => "DUPLICATE_VOTE",
            Self::InvalidSelectionCount => "INVALID_SELECTION_COUNT",
            Self::EmptySelection => "EMPTY_SELECTION",
            Self::TooManySelections { .. } => "TOO_MANY_SELECTIONS",
            Self::UnknownOption => "UNKNOWN_OPTION",
            Self::RepeatedOption => "REPEATED_OPTION",
        }
    }
}

impl From<VoteRejection> for AppError {
    fn from(rejection: VoteRejection) -> Self {
        Self::Rejected {
            code: rejection.code(),
            message: rejection.to_string(),
        }
    }
}

/// The voter-supplied part of a submission.
#[derive(Debug, Clone, Copy)]
pub struct Ballot<'a> {
    pub option_ids: &'a [String],
    pub user_email: Option<&'a str>,
    pub user_name: Option<&'a str>,
}

/// Run every rule in order: window, identity, duplicate, selection.
pub fn validate(
    voting: &voting::Model,
    options: &[voting_option::Model],
    ballot: &Ballot<'_>,
    already_voted: bool,
    now: DateTime<Utc>,
) -> Result<(), VoteRejection> {
    check_open(voting, now)?;
    check_identity(voting, ballot.user_name, ballot.user_email)?;
    if already_voted {
        return Err(VoteRejection::DuplicateVote);
    }
    check_selection(voting, options, ballot.option_ids)
}

/// Status and time window.
fn check_open(voting: &voting::Model, now: DateTime<Utc>) -> Result<(), VoteRejection> {
    if voting.status != VotingStatus::Active {
        return Err(VoteRejection::NotActive);
    }

    if voting
        .start_date
        .is_some_and(|start| start.with_timezone(&Utc) > now)
    {
        return Err(VoteRejection::NotStarted);
    }

    if voting
        .end_date
        .is_some_and(|end| end.with_timezone(&Utc) < now)
    {
        return Err(VoteRejection::Ended);
    }

    Ok(())
}

/// Name and email, required only when the voting does not allow anonymous
/// submissions.
fn check_identity(
    voting: &voting::Model,
    user_name: Option<&str>,
    user_email: Option<&str>,
) -> Result<(), VoteRejection> {
    if voting.allow_anonymous {
        return Ok(());
    }

    let name = user_name.map(str::trim).unwrap_or_default();
    let email = user_email.map(str::trim).unwrap_or_default();

    if name.is_empty() || email.is_empty() {
        return Err(VoteRejection::MissingIdentity);
    }

    if !EMAIL_RE.is_match(email) {
        return Err(VoteRejection::InvalidEmail);
    }

    Ok(())
}

/// Selection count against the voting type, then option ownership.
fn check_selection(
    voting: &voting::Model,
    options: &[voting_option::Model],
    option_ids: &[String],
) -> Result<(), VoteRejection> {
    match voting.voting_type {
        VotingType::Single => {
            if option_ids.len() != 1 {
                return Err(VoteRejection::InvalidSelectionCount);
            }
        }
        VotingType::Multiple => {
            if option_ids.is_empty() {
                return Err(VoteRejection::EmptySelection);
            }
            if let Some(max) = voting.max_selections {
                if option_ids.len() > usize::try_from(max).unwrap_or(0) {
                    return Err(VoteRejection::TooManySelections { max });
                }
            }
        }
    }

    let owned: HashSet<&str> = options
        .iter()
        .filter(|o| o.voting_id == voting.id)
        .map(|o| o.id.as_str())
        .collect();
    let mut seen = HashSet::with_capacity(option_ids.len());

    for id in option_ids {
        if !owned.contains(id.as_str()) {
            return Err(VoteRejection::UnknownOption);
        }
        if !seen.insert(id.as_str()) {
            return Err(VoteRejection::RepeatedOption);
        }
    }

    Ok(())
}
