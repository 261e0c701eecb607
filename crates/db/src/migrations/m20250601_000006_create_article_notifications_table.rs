//! Create `article_notifications` table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ArticleNotifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ArticleNotifications::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ArticleNotifications::PostId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ArticleNotifications::Title)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ArticleNotifications::Excerpt).text())
                    .col(ColumnDef::new(ArticleNotifications::ImageUrl).string_len(1024))
                    .col(ColumnDef::new(ArticleNotifications::Category).string_len(128))
                    .col(
                        ColumnDef::new(ArticleNotifications::Url)
                            .string_len(1024)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArticleNotifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_article_notifications_post")
                            .from(ArticleNotifications::Table, ArticleNotifications::PostId)
                            .to(BlogPosts::Table, BlogPosts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ArticleNotifications::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ArticleNotifications {
    Table,
    Id,
    PostId,
    Title,
    Excerpt,
    ImageUrl,
    Category,
    Url,
    CreatedAt,
}

#[derive(Iden)]
enum BlogPosts {
    Table,
    Id,
}
