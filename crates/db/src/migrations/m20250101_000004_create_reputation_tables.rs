//! Create post vote, reputation ledger and badge tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PostVote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostVote::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PostVote::PostId).string_len(32).not_null())
                    .col(ColumnDef::new(PostVote::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(PostVote::VoteType).string_len(8).not_null())
                    .col(
                        ColumnDef::new(PostVote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_vote_post")
                            .from(PostVote::Table, PostVote::PostId)
                            .to(ForumPost::Table, ForumPost::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_vote_user")
                            .from(PostVote::Table, PostVote::UserId)
                            .to(ForumUser::Table, ForumUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique: one vote per (post, voter)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_vote_post_user")
                    .table(PostVote::Table)
                    .col(PostVote::PostId)
                    .col(PostVote::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReputationLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReputationLog::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReputationLog::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(ReputationLog::Action).string_len(32).not_null())
                    .col(ColumnDef::new(ReputationLog::Points).integer().not_null())
                    .col(ColumnDef::new(ReputationLog::Reason).string_len(512))
                    .col(ColumnDef::new(ReputationLog::RelatedId).string_len(32))
                    .col(
                        ColumnDef::new(ReputationLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reputation_log_user")
                            .from(ReputationLog::Table, ReputationLog::UserId)
                            .to(ForumUser::Table, ForumUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, created_at) for history
        manager
            .create_index(
                Index::create()
                    .name("idx_reputation_log_user_created")
                    .table(ReputationLog::Table)
                    .col(ReputationLog::UserId)
                    .col(ReputationLog::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserBadge::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserBadge::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserBadge::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(UserBadge::BadgeType).string_len(64).not_null())
                    .col(ColumnDef::new(UserBadge::Name).string_len(128).not_null())
                    .col(ColumnDef::new(UserBadge::Description).text())
                    .col(
                        ColumnDef::new(UserBadge::EarnedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_badge_user")
                            .from(UserBadge::Table, UserBadge::UserId)
                            .to(ForumUser::Table, ForumUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique: a badge is awarded once
        manager
            .create_index(
                Index::create()
                    .name("idx_user_badge_user_type")
                    .table(UserBadge::Table)
                    .col(UserBadge::UserId)
                    .col(UserBadge::BadgeType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserBadge::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ReputationLog::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PostVote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PostVote {
    Table,
    Id,
    PostId,
    UserId,
    VoteType,
    CreatedAt,
}

#[derive(Iden)]
enum ReputationLog {
    Table,
    Id,
    UserId,
    Action,
    Points,
    Reason,
    RelatedId,
    CreatedAt,
}

#[derive(Iden)]
enum UserBadge {
    Table,
    Id,
    UserId,
    BadgeType,
    Name,
    Description,
    EarnedAt,
}

#[derive(Iden)]
enum ForumPost {
    Table,
    Id,
}

#[derive(Iden)]
enum ForumUser {
    Table,
    Id,
}
