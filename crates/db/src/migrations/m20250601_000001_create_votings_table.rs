//! Create `votings` table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Votings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Votings::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Votings::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Votings::Description).text())
                    .col(
                        ColumnDef::new(Votings::Slug)
                            .string_len(128)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Votings::Status)
                            .string_len(16)
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Votings::VotingType)
                            .string_len(16)
                            .not_null()
                            .default("single"),
                    )
                    .col(ColumnDef::new(Votings::MaxSelections).integer())
                    .col(ColumnDef::new(Votings::StartDate).timestamp_with_time_zone())
                    .col(ColumnDef::new(Votings::EndDate).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Votings::ShowResults)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Votings::RequireLogin)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Votings::AllowAnonymous)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Votings::TotalVotes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Votings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Votings::UpdatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Votings::PublishedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index on status for listing public votings
        manager
            .create_index(
                Index::create()
                    .name("idx_votings_status")
                    .table(Votings::Table)
                    .col(Votings::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Votings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Votings {
    Table,
    Id,
    Title,
    Description,
    Slug,
    Status,
    VotingType,
    MaxSelections,
    StartDate,
    EndDate,
    ShowResults,
    RequireLogin,
    AllowAnonymous,
    TotalVotes,
    CreatedAt,
    UpdatedAt,
    PublishedAt,
}
