//! Create `voting_submissions` table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VotingSubmissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VotingSubmissions::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VotingSubmissions::VotingId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VotingSubmissions::UserIdentifier)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(VotingSubmissions::UserId).string_len(64))
                    .col(ColumnDef::new(VotingSubmissions::UserEmail).string_len(320))
                    .col(ColumnDef::new(VotingSubmissions::UserName).string_len(256))
                    .col(
                        ColumnDef::new(VotingSubmissions::OptionCount)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VotingSubmissions::Metadata)
                            .json_binary()
                            .not_null()
                            .default("{}"),
                    )
                    .col(
                        ColumnDef::new(VotingSubmissions::SubmittedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_voting_submissions_voting")
                            .from(VotingSubmissions::Table, VotingSubmissions::VotingId)
                            .to(Votings::Table, Votings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One submission per voter per voting; losing a concurrent race fails here
        manager
            .create_index(
                Index::create()
                    .name("idx_voting_submissions_voting_id_user_identifier")
                    .table(VotingSubmissions::Table)
                    .col(VotingSubmissions::VotingId)
                    .col(VotingSubmissions::UserIdentifier)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VotingSubmissions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum VotingSubmissions {
    Table,
    Id,
    VotingId,
    UserIdentifier,
    UserId,
    UserEmail,
    UserName,
    OptionCount,
    Metadata,
    SubmittedAt,
}

#[derive(Iden)]
enum Votings {
    Table,
    Id,
}
