//! Create category, forum and forum permission tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ForumCategory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ForumCategory::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ForumCategory::Name).string_len(256).not_null())
                    .col(ColumnDef::new(ForumCategory::Description).text())
                    .col(
                        ColumnDef::new(ForumCategory::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ForumCategory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Forum::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Forum::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Forum::CategoryId).string_len(32).not_null())
                    .col(ColumnDef::new(Forum::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Forum::Description).text())
                    .col(
                        ColumnDef::new(Forum::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Forum::IsLocked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Forum::TopicsCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Forum::PostsCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Forum::LastPostId).string_len(32))
                    .col(ColumnDef::new(Forum::LastPostTopicId).string_len(32))
                    .col(ColumnDef::new(Forum::LastPostUserId).string_len(32))
                    .col(ColumnDef::new(Forum::LastPostAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Forum::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_category")
                            .from(Forum::Table, Forum::CategoryId)
                            .to(ForumCategory::Table, ForumCategory::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_forum_category_id")
                    .table(Forum::Table)
                    .col(Forum::CategoryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ForumPermission::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ForumPermission::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ForumPermission::ForumId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ForumPermission::GroupId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ForumPermission::CanView)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ForumPermission::CanPostTopics)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ForumPermission::CanPostReplies)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ForumPermission::CanEditOwn)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ForumPermission::CanDeleteOwn)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_permission_forum")
                            .from(ForumPermission::Table, ForumPermission::ForumId)
                            .to(Forum::Table, Forum::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_permission_group")
                            .from(ForumPermission::Table, ForumPermission::GroupId)
                            .to(UserGroup::Table, UserGroup::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique: one grant row per (forum, group)
        manager
            .create_index(
                Index::create()
                    .name("idx_forum_permission_forum_group")
                    .table(ForumPermission::Table)
                    .col(ForumPermission::ForumId)
                    .col(ForumPermission::GroupId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ForumPermission::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Forum::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ForumCategory::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ForumCategory {
    Table,
    Id,
    Name,
    Description,
    DisplayOrder,
    CreatedAt,
}

#[derive(Iden)]
enum Forum {
    Table,
    Id,
    CategoryId,
    Name,
    Description,
    DisplayOrder,
    IsLocked,
    TopicsCount,
    PostsCount,
    LastPostId,
    LastPostTopicId,
    LastPostUserId,
    LastPostAt,
    CreatedAt,
}

#[derive(Iden)]
enum ForumPermission {
    Table,
    Id,
    ForumId,
    GroupId,
    CanView,
    CanPostTopics,
    CanPostReplies,
    CanEditOwn,
    CanDeleteOwn,
}

#[derive(Iden)]
enum UserGroup {
    Table,
    Id,
}
