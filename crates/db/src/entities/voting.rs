//! Voting (poll definition) entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a voting.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum VotingStatus {
    /// Being prepared, not visible to voters.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Accepting votes (subject to the start/end window).
    #[sea_orm(string_value = "active")]
    Active,
    /// No longer accepting votes.
    #[sea_orm(string_value = "closed")]
    Closed,
}

/// Selection mode of a voting.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum VotingType {
    /// Exactly one option per submission.
    #[sea_orm(string_value = "single")]
    Single,
    /// One or more options per submission, optionally capped.
    #[sea_orm(string_value = "multiple")]
    Multiple,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "votings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Human-readable URL slug
    #[sea_orm(unique)]
    pub slug: String,

    pub status: VotingStatus,

    pub voting_type: VotingType,

    /// Cap on selections; only consulted for multiple-choice votings
    #[sea_orm(nullable)]
    pub max_selections: Option<i32>,

    #[sea_orm(nullable)]
    pub start_date: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub end_date: Option<DateTimeWithTimeZone>,

    /// Whether results are public before the voting closes
    pub show_results: bool,

    pub require_login: bool,

    /// Whether a submission may omit name and email
    pub allow_anonymous: bool,

    /// Denormalized count of response rows
    #[sea_orm(default_value = 0)]
    pub total_votes: i32,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub published_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::voting_option::Entity")]
    Options,
    #[sea_orm(has_many = "super::voting_response::Entity")]
    Responses,
    #[sea_orm(has_many = "super::voting_submission::Entity")]
    Submissions,
}

impl Related<super::voting_option::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Options.def()
    }
}

impl Related<super::voting_response::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Responses.def()
    }
}

impl Related<super::voting_submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
