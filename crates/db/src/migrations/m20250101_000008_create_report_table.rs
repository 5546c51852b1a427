//! Create the post report table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ForumReport::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ForumReport::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ForumReport::ReporterId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ForumReport::PostId).string_len(32).not_null())
                    .col(ColumnDef::new(ForumReport::TopicId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(ForumReport::TargetUserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ForumReport::Reason).text().not_null())
                    .col(
                        ColumnDef::new(ForumReport::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(ForumReport::Resolution).string_len(32))
                    .col(ColumnDef::new(ForumReport::ResolvedBy).string_len(32))
                    .col(ColumnDef::new(ForumReport::ResolutionNote).text())
                    .col(
                        ColumnDef::new(ForumReport::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(ForumReport::ResolvedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_report_reporter")
                            .from(ForumReport::Table, ForumReport::ReporterId)
                            .to(ForumUser::Table, ForumUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_report_post")
                            .from(ForumReport::Table, ForumReport::PostId)
                            .to(ForumPost::Table, ForumPost::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (status, created_at) for the pending queue
        manager
            .create_index(
                Index::create()
                    .name("idx_forum_report_status_created_at")
                    .table(ForumReport::Table)
                    .col(ForumReport::Status)
                    .col(ForumReport::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: (post_id, reporter_id) for the duplicate check
        manager
            .create_index(
                Index::create()
                    .name("idx_forum_report_post_reporter")
                    .table(ForumReport::Table)
                    .col(ForumReport::PostId)
                    .col(ForumReport::ReporterId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ForumReport::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ForumReport {
    Table,
    Id,
    ReporterId,
    PostId,
    TopicId,
    TargetUserId,
    Reason,
    Status,
    Resolution,
    ResolvedBy,
    ResolutionNote,
    CreatedAt,
    ResolvedAt,
}

#[derive(Iden)]
enum ForumUser {
    Table,
    Id,
}

#[derive(Iden)]
enum ForumPost {
    Table,
    Id,
}
