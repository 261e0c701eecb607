//! Voting submission entity.
//!
//! One row per accepted vote event. The unique index on
//! `(voting_id, user_identifier)` is what ultimately prevents a voter from
//! submitting twice when two requests race past the application check.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "voting_submissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub voting_id: String,

    /// Pseudo-anonymous fingerprint of the submitter
    pub user_identifier: String,

    #[sea_orm(nullable)]
    pub user_id: Option<String>,

    #[sea_orm(nullable)]
    pub user_email: Option<String>,

    #[sea_orm(nullable)]
    pub user_name: Option<String>,

    /// Number of options selected in this submission
    pub option_count: i32,

    #[sea_orm(column_type = "JsonBinary")]
    pub metadata: JsonValue,

    pub submitted_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::voting::Entity",
        from = "Column::VotingId",
        to = "super::voting::Column::Id",
        on_delete = "Cascade"
    )]
    Voting,
    #[sea_orm(has_many = "super::voting_response::Entity")]
    Responses,
}

impl Related<super::voting::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Voting.def()
    }
}

impl Related<super::voting_response::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Responses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
