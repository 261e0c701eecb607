//! Create `voting_options` table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VotingOptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VotingOptions::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VotingOptions::VotingId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VotingOptions::OptionText)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VotingOptions::DisplayOrder)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VotingOptions::ImageUrl).string_len(1024))
                    .col(
                        ColumnDef::new(VotingOptions::VoteCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VotingOptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(VotingOptions::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_voting_options_voting")
                            .from(VotingOptions::Table, VotingOptions::VotingId)
                            .to(Votings::Table, Votings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Display order is unique within a voting
        manager
            .create_index(
                Index::create()
                    .name("idx_voting_options_voting_id_display_order")
                    .table(VotingOptions::Table)
                    .col(VotingOptions::VotingId)
                    .col(VotingOptions::DisplayOrder)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VotingOptions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum VotingOptions {
    Table,
    Id,
    VotingId,
    OptionText,
    DisplayOrder,
    ImageUrl,
    VoteCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Votings {
    Table,
    Id,
}
