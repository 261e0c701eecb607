//! Blog post entity.
//!
//! Posts are authored elsewhere; this service only promotes scheduled posts
//! to published.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Publication status of a blog post.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum BlogPostStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Waiting for `scheduled_at` to pass.
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    #[sea_orm(string_value = "published")]
    Published,
    #[sea_orm(string_value = "archived")]
    Archived,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blog_posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    #[sea_orm(unique)]
    pub slug: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub excerpt: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    #[sea_orm(nullable)]
    pub featured_image: Option<String>,

    #[sea_orm(nullable)]
    pub category: Option<String>,

    pub status: BlogPostStatus,

    /// When a scheduled post becomes due
    #[sea_orm(nullable)]
    pub scheduled_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub published_at: Option<DateTimeWithTimeZone>,

    /// Whether publishing should raise an article notification
    pub send_notification: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::article_notification::Entity")]
    Notifications,
}

impl Related<super::article_notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
