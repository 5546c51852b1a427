//! Create moderation log, warning and ban tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ModerationLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ModerationLog::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ModerationLog::ModeratorId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ModerationLog::Action).string_len(32).not_null())
                    .col(
                        ColumnDef::new(ModerationLog::TargetType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ModerationLog::TargetId).string_len(32).not_null())
                    .col(ColumnDef::new(ModerationLog::Reason).text())
                    .col(ColumnDef::new(ModerationLog::Details).text())
                    .col(
                        ColumnDef::new(ModerationLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: created_at (audit listing, newest first)
        manager
            .create_index(
                Index::create()
                    .name("idx_moderation_log_created_at")
                    .table(ModerationLog::Table)
                    .col(ModerationLog::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserWarning::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserWarning::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserWarning::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(UserWarning::ModeratorId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserWarning::Reason).text().not_null())
                    .col(
                        ColumnDef::new(UserWarning::Points)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(UserWarning::ExpiresAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(UserWarning::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(UserWarning::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_warning_user")
                            .from(UserWarning::Table, UserWarning::UserId)
                            .to(ForumUser::Table, ForumUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserBan::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserBan::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserBan::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(UserBan::BannedBy).string_len(32).not_null())
                    .col(ColumnDef::new(UserBan::Reason).text().not_null())
                    .col(ColumnDef::new(UserBan::BanType).string_len(16).not_null())
                    .col(ColumnDef::new(UserBan::ExpiresAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(UserBan::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(UserBan::LiftedBy).string_len(32))
                    .col(ColumnDef::new(UserBan::LiftedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(UserBan::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_ban_user")
                            .from(UserBan::Table, UserBan::UserId)
                            .to(ForumUser::Table, ForumUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, is_active) for the active-ban check
        manager
            .create_index(
                Index::create()
                    .name("idx_user_ban_user_active")
                    .table(UserBan::Table)
                    .col(UserBan::UserId)
                    .col(UserBan::IsActive)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserBan::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserWarning::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ModerationLog::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ModerationLog {
    Table,
    Id,
    ModeratorId,
    Action,
    TargetType,
    TargetId,
    Reason,
    Details,
    CreatedAt,
}

#[derive(Iden)]
enum UserWarning {
    Table,
    Id,
    UserId,
    ModeratorId,
    Reason,
    Points,
    ExpiresAt,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum UserBan {
    Table,
    Id,
    UserId,
    BannedBy,
    Reason,
    BanType,
    ExpiresAt,
    IsActive,
    LiftedBy,
    LiftedAt,
    CreatedAt,
}

#[derive(Iden)]
enum ForumUser {
    Table,
    Id,
}
