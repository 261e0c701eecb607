//! Voting response entity: one selected option of one submission.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "voting_responses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub voting_id: String,

    #[sea_orm(indexed)]
    pub option_id: String,

    /// Submission event this row belongs to
    pub submission_id: String,

    #[sea_orm(nullable)]
    pub user_id: Option<String>,

    #[sea_orm(indexed)]
    pub user_identifier: String,

    #[sea_orm(nullable)]
    pub user_email: Option<String>,

    #[sea_orm(nullable)]
    pub user_name: Option<String>,

    pub voted_at: DateTimeWithTimeZone,

    /// Free-form submission context (user agent, submission timestamp)
    #[sea_orm(column_type = "JsonBinary")]
    pub metadata: JsonValue,
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
    #[sea_orm(
        belongs_to = "super::voting_option::Entity",
        from = "Column::OptionId",
        to = "super::voting_option::Column::Id",
        on_delete = "Cascade"
    )]
    VotingOption,
    #[sea_orm(
        belongs_to = "super::voting_submission::Entity",
        from = "Column::SubmissionId",
        to = "super::voting_submission::Column::Id",
        on_delete = "Cascade"
    )]
    Submission,
}

impl Related<super::voting::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Voting.def()
    }
}

impl Related<super::voting_option::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VotingOption.def()
    }
}

impl Related<super::voting_submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
