//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250601_000001_create_votings_table;
mod m20250601_000002_create_voting_options_table;
mod m20250601_000003_create_voting_submissions_table;
mod m20250601_000004_create_voting_responses_table;
mod m20250601_000005_create_blog_posts_table;
mod m20250601_000006_create_article_notifications_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_votings_table::Migration),
            Box::new(m20250601_000002_create_voting_options_table::Migration),
            Box::new(m20250601_000003_create_voting_submissions_table::Migration),
            Box::new(m20250601_000004_create_voting_responses_table::Migration),
            Box::new(m20250601_000005_create_blog_posts_table::Migration),
            Box::new(m20250601_000006_create_article_notifications_table::Migration),
        ]
    }
}
