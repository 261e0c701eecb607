//! Create `voting_responses` table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VotingResponses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VotingResponses::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VotingResponses::VotingId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VotingResponses::OptionId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VotingResponses::SubmissionId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(VotingResponses::UserId).string_len(64))
                    .col(
                        ColumnDef::new(VotingResponses::UserIdentifier)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(VotingResponses::UserEmail).string_len(320))
                    .col(ColumnDef::new(VotingResponses::UserName).string_len(256))
                    .col(
                        ColumnDef::new(VotingResponses::VotedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(VotingResponses::Metadata)
                            .json_binary()
                            .not_null()
                            .default("{}"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_voting_responses_voting")
                            .from(VotingResponses::Table, VotingResponses::VotingId)
                            .to(Votings::Table, Votings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_voting_responses_option")
                            .from(VotingResponses::Table, VotingResponses::OptionId)
                            .to(VotingOptions::Table, VotingOptions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_voting_responses_submission")
                            .from(VotingResponses::Table, VotingResponses::SubmissionId)
                            .to(VotingSubmissions::Table, VotingSubmissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Lookup of a voter's own choices
        manager
            .create_index(
                Index::create()
                    .name("idx_voting_responses_voting_id_user_identifier")
                    .table(VotingResponses::Table)
                    .col(VotingResponses::VotingId)
                    .col(VotingResponses::UserIdentifier)
                    .to_owned(),
            )
            .await?;

        // An option is recorded at most once per voter
        manager
            .create_index(
                Index::create()
                    .name("idx_voting_responses_voting_option_user_identifier")
                    .table(VotingResponses::Table)
                    .col(VotingResponses::VotingId)
                    .col(VotingResponses::OptionId)
                    .col(VotingResponses::UserIdentifier)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Recounting per option
        manager
            .create_index(
                Index::create()
                    .name("idx_voting_responses_option_id")
                    .table(VotingResponses::Table)
                    .col(VotingResponses::OptionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VotingResponses::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum VotingResponses {
    Table,
    Id,
    VotingId,
    OptionId,
    SubmissionId,
    UserId,
    UserIdentifier,
    UserEmail,
    UserName,
    VotedAt,
    Metadata,
}

#[derive(Iden)]
enum Votings {
    Table,
    Id,
}

#[derive(Iden)]
enum VotingOptions {
    Table,
    Id,
}

#[derive(Iden)]
enum VotingSubmissions {
    Table,
    Id,
}
